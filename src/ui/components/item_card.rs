use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget, Wrap};

use crate::engine::due::Mastery;
use crate::item::{Reviewable, ReviewableItem, SentenceData, WordData};
use crate::ui::theme::{Theme, ThemeColors};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CardView {
    /// The text to recall, with pronunciation hints.
    Front,
    /// Front plus meaning and examples.
    Back,
    /// Meaning only; the learner supplies the text.
    Prompt,
    /// Everything, for search results and the collection detail pane.
    Full,
}

pub struct ItemCard<'a> {
    pub item: &'a ReviewableItem,
    pub view: CardView,
    pub title: &'a str,
    pub theme: &'a Theme,
}

impl<'a> ItemCard<'a> {
    pub fn new(item: &'a ReviewableItem, view: CardView, theme: &'a Theme) -> Self {
        Self {
            item,
            view,
            title: "",
            theme,
        }
    }

    pub fn title(mut self, title: &'a str) -> Self {
        self.title = title;
        self
    }
}

fn field<'l>(colors: &ThemeColors, label: &'l str, value: &'l str) -> Option<Line<'l>> {
    if value.trim().is_empty() {
        return None;
    }
    Some(Line::from(vec![
        Span::styled(format!("{label}: "), Style::default().fg(colors.muted())),
        Span::styled(value, Style::default().fg(colors.fg())),
    ]))
}

fn list_field<'l>(colors: &ThemeColors, label: &'l str, values: &[String]) -> Option<Line<'l>> {
    if values.is_empty() {
        return None;
    }
    Some(Line::from(vec![
        Span::styled(format!("{label}: "), Style::default().fg(colors.muted())),
        Span::styled(values.join(", "), Style::default().fg(colors.fg())),
    ]))
}

fn headline<'l>(colors: &ThemeColors, text: &'l str) -> Line<'l> {
    Line::from(Span::styled(
        text,
        Style::default()
            .fg(colors.accent())
            .add_modifier(Modifier::BOLD),
    ))
}

fn word_lines<'l>(colors: &ThemeColors, w: &'l WordData, view: CardView) -> Vec<Line<'l>> {
    let mut lines = Vec::new();
    if view == CardView::Prompt {
        lines.push(headline(colors, &w.meaning_vi));
        lines.extend(field(colors, "Definition", &w.definition_en));
        return lines;
    }

    lines.push(headline(colors, &w.word));
    let hints: Vec<&str> = [w.ipa.as_str(), w.part_of_speech.as_str(), w.syllables.as_str()]
        .into_iter()
        .filter(|s| !s.trim().is_empty())
        .collect();
    if !hints.is_empty() {
        lines.push(Line::from(Span::styled(
            hints.join("  ·  "),
            Style::default().fg(colors.muted()),
        )));
    }
    if view == CardView::Front {
        return lines;
    }

    lines.push(Line::from(""));
    lines.extend(field(colors, "Meaning", &w.meaning_vi));
    lines.extend(field(colors, "Definition", &w.definition_en));
    lines.extend(field(colors, "Example", &w.example_en));
    lines.extend(field(colors, "  ", &w.example_vi));
    if view == CardView::Full {
        lines.extend(field(colors, "B2 example", &w.example_b2_en));
        lines.extend(field(colors, "  ", &w.example_b2_vi));
        lines.extend(field(colors, "Spelling", &w.spelling_tip));
        lines.extend(field(colors, "Root", &w.root_word));
        lines.extend(list_field(colors, "Synonyms", &w.synonyms));
        lines.extend(list_field(colors, "Antonyms", &w.antonyms));
        lines.extend(list_field(colors, "Word family", &w.word_family));
        lines.extend(list_field(colors, "Collocations", &w.collocations));
    }
    lines.extend(field(colors, "Mnemonic", &w.mnemonic));
    lines
}

fn sentence_lines<'l>(colors: &ThemeColors, s: &'l SentenceData, view: CardView) -> Vec<Line<'l>> {
    let mut lines = Vec::new();
    if view == CardView::Prompt {
        lines.push(headline(colors, &s.meaning_vi));
        return lines;
    }

    lines.push(headline(colors, &s.sentence));
    if view == CardView::Front {
        return lines;
    }

    lines.push(Line::from(""));
    lines.extend(field(colors, "Meaning", &s.meaning_vi));
    lines.extend(field(colors, "Grammar", &s.grammar_breakdown));
    lines.extend(field(colors, "Usage", &s.usage_context));
    if view == CardView::Full {
        if s.naturalness_score > 0.0 {
            lines.push(Line::from(vec![
                Span::styled("Naturalness: ", Style::default().fg(colors.muted())),
                Span::styled(
                    format!("{:.0}", s.naturalness_score),
                    Style::default().fg(colors.fg()),
                ),
            ]));
        }
        for similar in &s.similar_sentences {
            lines.push(Line::from(vec![
                Span::styled("• ", Style::default().fg(colors.accent())),
                Span::styled(similar.en.as_str(), Style::default().fg(colors.fg())),
                Span::styled(
                    format!("  ({})", similar.vi),
                    Style::default().fg(colors.muted()),
                ),
            ]));
        }
    }
    lines
}

impl Widget for ItemCard<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let mastery = Mastery::from_level(self.item.srs_level());
        let title = if self.title.is_empty() {
            format!(" {} · {} ", self.item.kind().as_str(), mastery.label())
        } else {
            format!(" {} ", self.title)
        };
        let block = Block::bordered()
            .title(title)
            .border_style(Style::default().fg(colors.border_focused()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let lines = match self.item {
            ReviewableItem::Word(w) => word_lines(colors, w, self.view),
            ReviewableItem::Sentence(s) => sentence_lines(colors, s, self.view),
        };
        let alignment = match self.view {
            CardView::Front | CardView::Prompt => Alignment::Center,
            CardView::Back | CardView::Full => Alignment::Left,
        };
        Paragraph::new(lines)
            .alignment(alignment)
            .wrap(Wrap { trim: false })
            .render(inner, buf);
    }
}
