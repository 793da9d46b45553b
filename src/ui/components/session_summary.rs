use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::session::queue::SessionStats;
use crate::ui::theme::Theme;

/// End-of-session view. With no stats it reads as "nothing due".
pub struct SessionSummary<'a> {
    pub stats: Option<SessionStats>,
    pub theme: &'a Theme,
}

impl<'a> SessionSummary<'a> {
    pub fn new(stats: Option<SessionStats>, theme: &'a Theme) -> Self {
        Self { stats, theme }
    }
}

impl Widget for SessionSummary<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let title = if self.stats.is_some() {
            " Session Complete "
        } else {
            " All Caught Up "
        };
        let block = Block::bordered()
            .title(title)
            .border_style(Style::default().fg(colors.accent()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Length(2),
                Constraint::Length(2),
                Constraint::Min(0),
                Constraint::Length(2),
            ])
            .split(inner);

        let Some(stats) = self.stats else {
            Paragraph::new(Line::from(Span::styled(
                "Nothing is due for review right now.",
                Style::default().fg(colors.fg()),
            )))
            .alignment(Alignment::Center)
            .render(layout[1], buf);
            Paragraph::new(Line::from(Span::styled(
                "  [Enter/Esc] Back to collection",
                Style::default().fg(colors.accent()),
            )))
            .render(layout[4], buf);
            return;
        };

        let reviewed_line = Line::from(vec![
            Span::styled("  Reviewed:  ", Style::default().fg(colors.fg())),
            Span::styled(
                stats.reviewed.to_string(),
                Style::default()
                    .fg(colors.accent())
                    .add_modifier(Modifier::BOLD),
            ),
        ]);
        Paragraph::new(reviewed_line).render(layout[1], buf);

        let forgotten_line = Line::from(vec![
            Span::styled("  Forgotten: ", Style::default().fg(colors.fg())),
            Span::styled(
                stats.forgotten.to_string(),
                Style::default().fg(if stats.forgotten == 0 {
                    colors.success()
                } else {
                    colors.error()
                }),
            ),
        ]);
        Paragraph::new(forgotten_line).render(layout[2], buf);

        Paragraph::new(Line::from(Span::styled(
            "  [Enter/Esc] Back to collection",
            Style::default().fg(colors.accent()),
        )))
        .render(layout[4], buf);
    }
}
