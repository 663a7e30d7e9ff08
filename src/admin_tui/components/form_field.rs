//! Drawing and key handling for form fields

use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::admin_tui::traits::FormHandler;
use crate::admin_tui::ui::Styles;
use crate::forms::{FieldKind, FormField, FormModal};

/// Rows a field occupies: a bordered input box
pub const FIELD_HEIGHT: u16 = 3;

/// Draw one field as a bordered input box; errors go into the bottom border
pub fn render_field(f: &mut Frame, area: Rect, field: &FormField) {
    let border_style = if field.validation_error.is_some() {
        Styles::error()
    } else if field.is_focused {
        Styles::active_border()
    } else {
        Styles::inactive_border()
    };

    let mut block = Block::default()
        .title(field.label.as_str())
        .borders(Borders::ALL)
        .border_style(border_style);
    if let Some(error) = &field.validation_error {
        block = block.title_bottom(Line::from(Span::styled(error.as_str(), Styles::error())));
    }

    let line = match &field.kind {
        FieldKind::Choice(_) => Line::from(vec![
            Span::styled("◀ ", Styles::inactive()),
            Span::styled(field.value.as_str(), Styles::default()),
            Span::styled(" ▶", Styles::inactive()),
        ]),
        FieldKind::Toggle => {
            let on = field.value == "true";
            Line::from(Span::styled(
                if on { "[x] Yes" } else { "[ ] No" },
                if on { Styles::success() } else { Styles::inactive() },
            ))
        }
        _ if field.value.is_empty() => Line::from(Span::styled(field.placeholder.as_str(), Styles::inactive())),
        _ => Line::from(field.value.as_str()),
    };

    f.render_widget(Paragraph::new(line).block(block), area);

    if field.is_focused && field.is_typed() {
        let before: String = field.value.chars().take(field.cursor_position).collect();
        let cursor_x = area.x + 1 + UnicodeWidthStr::width(before.as_str()) as u16;
        if cursor_x < area.x + area.width.saturating_sub(1) {
            f.set_cursor(cursor_x, area.y + 1);
        }
    }
}

impl FormHandler for FormModal {
    fn next_field(&mut self) {
        FormModal::next_field(self);
    }

    fn previous_field(&mut self) {
        FormModal::previous_field(self);
    }

    fn input_char(&mut self, c: char) {
        // Space flips toggles, other typed characters are ignored there
        let toggle = matches!(
            self.form.fields.get(self.form.current_field).map(|f| &f.kind),
            Some(FieldKind::Toggle)
        );
        if toggle {
            if c == ' ' {
                self.cycle_current(true);
            }
            return;
        }
        self.handle_char(c);
    }

    fn backspace(&mut self) {
        self.handle_backspace();
    }

    fn delete(&mut self) {
        self.handle_delete();
    }

    fn left(&mut self) {
        if self.is_submitting() {
            return;
        }
        if let Some(field) = self.form.current_field_mut() {
            if field.is_typed() {
                field.move_cursor_left();
            } else {
                field.cycle(false);
            }
        }
    }

    fn right(&mut self) {
        if self.is_submitting() {
            return;
        }
        if let Some(field) = self.form.current_field_mut() {
            if field.is_typed() {
                field.move_cursor_right();
            } else {
                field.cycle(true);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::FormKind;

    #[test]
    fn test_arrows_cycle_choices_and_move_cursor_in_text() {
        let mut modal = FormModal::create(FormKind::LateFee);
        FormHandler::input_char(&mut modal, 'A');
        FormHandler::input_char(&mut modal, 'c');
        FormHandler::left(&mut modal);
        FormHandler::input_char(&mut modal, 'b');
        assert_eq!(modal.values()["name"], "Abc");

        FormHandler::next_field(&mut modal);
        assert_eq!(modal.values()["fee_type"], "multiplier");
        FormHandler::right(&mut modal);
        assert_eq!(modal.values()["fee_type"], "flat_rate");
        FormHandler::left(&mut modal);
        assert_eq!(modal.values()["fee_type"], "multiplier");
    }

    #[test]
    fn test_space_flips_toggle() {
        let mut modal = FormModal::create(FormKind::Package);
        let toggle = modal
            .form
            .fields
            .iter()
            .position(|f| f.key == "is_active")
            .unwrap();
        modal.form.set_current_field(toggle);
        FormHandler::input_char(&mut modal, 'x');
        assert_eq!(modal.values()["is_active"], "true");
        FormHandler::input_char(&mut modal, ' ');
        assert_eq!(modal.values()["is_active"], "false");
    }
}
