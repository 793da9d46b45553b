use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget, Wrap};

use crate::session::study::OptionMark;
use crate::ui::theme::Theme;

pub struct QuizOptions<'a> {
    pub options: &'a [String],
    pub marks: Vec<OptionMark>,
    pub theme: &'a Theme,
}

impl<'a> QuizOptions<'a> {
    pub fn new(options: &'a [String], marks: Vec<OptionMark>, theme: &'a Theme) -> Self {
        Self {
            options,
            marks,
            theme,
        }
    }
}

impl Widget for QuizOptions<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .title(" Choose ")
            .border_style(Style::default().fg(colors.border()));
        let inner = block.inner(area);
        block.render(area, buf);

        let lines: Vec<Line> = self
            .options
            .iter()
            .enumerate()
            .map(|(i, option)| {
                let mark = self.marks.get(i).copied().unwrap_or(OptionMark::Unanswered);
                let (prefix, style) = match mark {
                    OptionMark::Unanswered => (" ", Style::default().fg(colors.fg())),
                    OptionMark::Correct => (
                        "✓",
                        Style::default()
                            .fg(colors.success())
                            .add_modifier(Modifier::BOLD),
                    ),
                    OptionMark::Incorrect => ("✗", Style::default().fg(colors.error())),
                    OptionMark::Unselected => (" ", Style::default().fg(colors.muted())),
                };
                Line::from(vec![
                    Span::styled(
                        format!(" {prefix} [{}] ", i + 1),
                        Style::default().fg(colors.accent()),
                    ),
                    Span::styled(option.as_str(), style),
                ])
            })
            .collect();

        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .render(inner, buf);
    }
}
