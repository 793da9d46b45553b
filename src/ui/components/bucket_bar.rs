use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::engine::due::{BUCKET_COUNT, LevelBucket};
use crate::ui::theme::Theme;

/// One box per level bucket with its item count. The active filter is highlighted.
pub struct BucketBar<'a> {
    pub buckets: &'a [LevelBucket; BUCKET_COUNT],
    pub selected: Option<usize>,
    pub theme: &'a Theme,
}

impl<'a> BucketBar<'a> {
    pub fn new(
        buckets: &'a [LevelBucket; BUCKET_COUNT],
        selected: Option<usize>,
        theme: &'a Theme,
    ) -> Self {
        Self {
            buckets,
            selected,
            theme,
        }
    }
}

impl Widget for BucketBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let cells = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, BUCKET_COUNT as u32); BUCKET_COUNT])
            .split(area);

        for (bucket, cell) in self.buckets.iter().zip(cells.iter()) {
            let active = self.selected == Some(bucket.index);
            let border = if active {
                colors.border_focused()
            } else {
                colors.border()
            };
            let label = if bucket.index + 1 == BUCKET_COUNT {
                format!(" {}+ ", bucket.label())
            } else {
                format!(" {} ", bucket.label())
            };
            let block = Block::bordered()
                .title(label)
                .border_style(Style::default().fg(border));
            let inner = block.inner(*cell);
            block.render(*cell, buf);

            let count_style = Style::default()
                .fg(if bucket.count == 0 {
                    colors.muted()
                } else {
                    colors.accent()
                })
                .add_modifier(if active {
                    Modifier::BOLD
                } else {
                    Modifier::empty()
                });
            Paragraph::new(Line::from(Span::styled(
                format!(" {}", bucket.count),
                count_style,
            )))
            .render(inner, buf);
        }
    }
}
