//! Create/edit form drawn as a popup over the current screen

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::admin_tui::components::form_field::{render_field, FIELD_HEIGHT};
use crate::admin_tui::ui::{centered_rect, Styles};
use crate::forms::FormModal;

/// First field index to draw so the focused field stays visible
fn window_start(current: usize, total: usize, visible: usize) -> usize {
    if visible == 0 || total <= visible {
        return 0;
    }
    current.saturating_sub(visible - 1).min(total - visible)
}

pub fn draw(f: &mut Frame, area: Rect, modal: &FormModal) {
    let popup = centered_rect(70, 90, area);
    f.render_widget(Clear, popup);

    let border = if modal.is_submitting() {
        Styles::inactive_border()
    } else {
        Styles::active_border()
    };
    let block = Block::default()
        .title(Span::styled(format!(" {} ", modal.title()), Styles::title()))
        .borders(Borders::ALL)
        .border_style(border);
    let inner = block.inner(popup);
    f.render_widget(block, popup);

    let banner_height = if modal.error().is_some() { 2 } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(banner_height),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(inner);

    if let Some(error) = modal.error() {
        let banner = Paragraph::new(Line::from(Span::styled(format!("⚠ {}", error), Styles::error())))
            .wrap(Wrap { trim: true });
        f.render_widget(banner, chunks[0]);
    }

    let fields = &modal.form.fields;
    let visible = (chunks[1].height / FIELD_HEIGHT) as usize;
    let start = window_start(modal.form.current_field, fields.len(), visible);
    for (slot, field) in fields.iter().skip(start).take(visible).enumerate() {
        let rect = Rect {
            x: chunks[1].x,
            y: chunks[1].y + slot as u16 * FIELD_HEIGHT,
            width: chunks[1].width,
            height: FIELD_HEIGHT,
        };
        render_field(f, rect, field);
    }

    let footer = if modal.is_submitting() {
        Line::from(Span::styled("Saving...", Styles::warning()))
    } else {
        Line::from(vec![
            Span::styled("Tab/Shift+Tab", Styles::info()),
            Span::raw(" field  "),
            Span::styled("←/→", Styles::info()),
            Span::raw(" cursor or option  "),
            Span::styled("Space", Styles::info()),
            Span::raw(" toggle  "),
            Span::styled("Enter", Styles::info()),
            Span::raw(" save  "),
            Span::styled("Esc", Styles::info()),
            Span::raw(" cancel"),
        ])
    };
    f.render_widget(Paragraph::new(footer), chunks[2]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::FormKind;
    use ratatui::{backend::TestBackend, Terminal};

    #[test]
    fn test_window_keeps_focus_visible() {
        assert_eq!(window_start(0, 10, 4), 0);
        assert_eq!(window_start(5, 10, 4), 2);
        assert_eq!(window_start(9, 10, 4), 6);
        assert_eq!(window_start(3, 3, 4), 0);
    }

    #[test]
    fn test_draws_title_and_errors() {
        let mut modal = FormModal::create(FormKind::Discount);
        modal.apply_pairs(&["discount_percent=150"]).unwrap();
        assert!(modal.prepare().is_err());

        let mut terminal = Terminal::new(TestBackend::new(100, 40)).unwrap();
        terminal
            .draw(|f| {
                let area = f.size();
                draw(f, area, &modal)
            })
            .unwrap();
        let text: String = terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(text.contains("New Discount"));
        assert!(text.contains("Please select a station"));
    }
}
