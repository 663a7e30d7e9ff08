//! Yes/no confirmation popup for destructive actions

use ratatui::{
    layout::{Alignment, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::admin_tui::ui::{centered_rect, Styles};

#[derive(Debug, Clone)]
pub struct ConfirmDialog {
    pub title: String,
    pub message: String,
}

impl ConfirmDialog {
    pub fn delete(noun: &str, key: &str) -> Self {
        Self {
            title: format!("Delete {}", noun),
            message: format!("Delete {} '{}'? This cannot be undone.", noun.to_lowercase(), key),
        }
    }

    pub fn draw(&self, f: &mut Frame, area: Rect) {
        let popup = centered_rect(50, 25, area);
        f.render_widget(Clear, popup);

        let text = vec![
            Line::from(""),
            Line::from(self.message.as_str()),
            Line::from(""),
            Line::from(vec![
                Span::styled("y", Styles::error()),
                Span::raw(" delete   "),
                Span::styled("n/Esc", Styles::info()),
                Span::raw(" cancel"),
            ]),
        ];
        let paragraph = Paragraph::new(text)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .title(Span::styled(format!(" {} ", self.title), Styles::error()))
                    .borders(Borders::ALL)
                    .border_style(Styles::error()),
            );
        f.render_widget(paragraph, popup);
    }
}
