//! Editable form fields

use std::collections::BTreeMap;

/// Flat field map, keyed by API field name
pub type FormValues = BTreeMap<String, String>;

/// Type of form field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Text,
    Number,
    Date,
    /// Fixed option list, cycled with arrow keys
    Choice(Vec<String>),
    /// `true` / `false`
    Toggle,
    /// Free-form JSON
    Json,
}

/// Individual form field
#[derive(Debug, Clone)]
pub struct FormField {
    pub key: String,
    pub label: String,
    pub value: String,
    pub placeholder: String,
    pub kind: FieldKind,
    pub is_focused: bool,
    /// Cursor position in characters
    pub cursor_position: usize,
    pub validation_error: Option<String>,
}

impl FormField {
    pub fn new(key: &str, label: &str, kind: FieldKind) -> Self {
        let value = match &kind {
            FieldKind::Choice(options) => options.first().cloned().unwrap_or_default(),
            FieldKind::Toggle => "true".to_string(),
            _ => String::new(),
        };
        let cursor_position = value.chars().count();
        Self {
            key: key.to_string(),
            label: label.to_string(),
            value,
            placeholder: String::new(),
            kind,
            is_focused: false,
            cursor_position,
            validation_error: None,
        }
    }

    pub fn text(key: &str, label: &str) -> Self {
        Self::new(key, label, FieldKind::Text)
    }

    pub fn number(key: &str, label: &str) -> Self {
        Self::new(key, label, FieldKind::Number)
    }

    pub fn date(key: &str, label: &str) -> Self {
        Self::new(key, label, FieldKind::Date).with_placeholder("YYYY-MM-DD")
    }

    pub fn choice(key: &str, label: &str, options: &[&str]) -> Self {
        Self::new(
            key,
            label,
            FieldKind::Choice(options.iter().map(|o| o.to_string()).collect()),
        )
    }

    pub fn toggle(key: &str, label: &str) -> Self {
        Self::new(key, label, FieldKind::Toggle)
    }

    pub fn json(key: &str, label: &str) -> Self {
        Self::new(key, label, FieldKind::Json).with_placeholder("{}")
    }

    pub fn with_placeholder(mut self, placeholder: &str) -> Self {
        self.placeholder = placeholder.to_string();
        self
    }

    pub fn with_value(mut self, value: &str) -> Self {
        self.set_value(value);
        self
    }

    pub fn set_value(&mut self, value: &str) {
        self.value = value.to_string();
        self.cursor_position = self.value.chars().count();
        self.validation_error = None;
    }

    /// Choice and toggle fields only change through [`FormField::cycle`]
    pub fn is_typed(&self) -> bool {
        !matches!(self.kind, FieldKind::Choice(_) | FieldKind::Toggle)
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.value
            .char_indices()
            .nth(char_index)
            .map(|(i, _)| i)
            .unwrap_or(self.value.len())
    }

    pub fn insert_char(&mut self, c: char) {
        if !self.is_typed() {
            return;
        }
        let at = self.byte_index(self.cursor_position);
        self.value.insert(at, c);
        self.cursor_position += 1;
        self.validation_error = None;
    }

    pub fn delete_char(&mut self) {
        if self.is_typed() && self.cursor_position > 0 {
            self.cursor_position -= 1;
            let at = self.byte_index(self.cursor_position);
            self.value.remove(at);
            self.validation_error = None;
        }
    }

    pub fn delete_char_forward(&mut self) {
        if self.is_typed() && self.cursor_position < self.value.chars().count() {
            let at = self.byte_index(self.cursor_position);
            self.value.remove(at);
            self.validation_error = None;
        }
    }

    pub fn move_cursor_left(&mut self) {
        if self.cursor_position > 0 {
            self.cursor_position -= 1;
        }
    }

    pub fn move_cursor_right(&mut self) {
        if self.cursor_position < self.value.chars().count() {
            self.cursor_position += 1;
        }
    }

    pub fn move_cursor_to_start(&mut self) {
        self.cursor_position = 0;
    }

    pub fn move_cursor_to_end(&mut self) {
        self.cursor_position = self.value.chars().count();
    }

    pub fn clear(&mut self) {
        if self.is_typed() {
            self.value.clear();
            self.cursor_position = 0;
        }
        self.validation_error = None;
    }

    pub fn is_empty(&self) -> bool {
        self.value.trim().is_empty()
    }

    /// Step through the options of a choice or toggle field
    pub fn cycle(&mut self, forward: bool) {
        let next = match &self.kind {
            FieldKind::Toggle => {
                if self.value == "true" {
                    "false".to_string()
                } else {
                    "true".to_string()
                }
            }
            FieldKind::Choice(options) if !options.is_empty() => {
                let current = options.iter().position(|o| *o == self.value).unwrap_or(0);
                let index = if forward {
                    (current + 1) % options.len()
                } else if current == 0 {
                    options.len() - 1
                } else {
                    current - 1
                };
                options[index].clone()
            }
            _ => return,
        };
        self.set_value(&next);
    }
}

/// Form container that manages multiple fields
#[derive(Debug, Clone)]
pub struct Form {
    pub fields: Vec<FormField>,
    pub current_field: usize,
}

impl Form {
    pub fn new(fields: Vec<FormField>) -> Self {
        let mut form = Self {
            fields,
            current_field: 0,
        };
        form.update_focus();
        form
    }

    fn update_focus(&mut self) {
        for (i, field) in self.fields.iter_mut().enumerate() {
            field.is_focused = i == self.current_field;
        }
    }

    pub fn set_current_field(&mut self, index: usize) {
        if index < self.fields.len() {
            self.current_field = index;
            self.update_focus();
        }
    }

    pub fn next_field(&mut self) {
        if !self.fields.is_empty() {
            self.set_current_field((self.current_field + 1) % self.fields.len());
        }
    }

    pub fn previous_field(&mut self) {
        if !self.fields.is_empty() {
            let index = if self.current_field == 0 {
                self.fields.len() - 1
            } else {
                self.current_field - 1
            };
            self.set_current_field(index);
        }
    }

    pub fn field(&self, key: &str) -> Option<&FormField> {
        self.fields.iter().find(|f| f.key == key)
    }

    pub fn field_mut(&mut self, key: &str) -> Option<&mut FormField> {
        self.fields.iter_mut().find(|f| f.key == key)
    }

    pub fn current_field_mut(&mut self) -> Option<&mut FormField> {
        self.fields.get_mut(self.current_field)
    }

    pub fn values(&self) -> FormValues {
        self.fields
            .iter()
            .map(|f| (f.key.clone(), f.value.clone()))
            .collect()
    }

    /// Copy matching keys from `values`; unknown keys are ignored
    pub fn fill(&mut self, values: &FormValues) {
        for field in &mut self.fields {
            if let Some(value) = values.get(&field.key) {
                field.set_value(value);
            }
        }
    }

    pub fn clear_errors(&mut self) {
        for field in &mut self.fields {
            field.validation_error = None;
        }
    }

    /// Attach per-field messages; returns how many matched a field
    pub fn apply_errors<'a, I>(&mut self, errors: I) -> usize
    where
        I: IntoIterator<Item = (&'a str, String)>,
    {
        let mut matched = 0;
        for (key, message) in errors {
            if let Some(field) = self.field_mut(key) {
                field.validation_error = Some(message);
                matched += 1;
            }
        }
        matched
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typing_respects_cursor_and_multibyte() {
        let mut field = FormField::text("name", "Name").with_value("Cafe");
        field.insert_char('é');
        field.move_cursor_to_start();
        field.insert_char('>');
        assert_eq!(field.value, ">Cafeé");

        field.move_cursor_to_end();
        field.delete_char();
        assert_eq!(field.value, ">Cafe");
        field.move_cursor_to_start();
        field.delete_char_forward();
        assert_eq!(field.value, "Cafe");
    }

    #[test]
    fn test_choice_and_toggle_cycle() {
        let mut fee = FormField::choice("fee_type", "Fee Type", &["multiplier", "flat_rate", "compound"]);
        assert_eq!(fee.value, "multiplier");
        fee.insert_char('x');
        assert_eq!(fee.value, "multiplier");
        fee.cycle(false);
        assert_eq!(fee.value, "compound");
        fee.cycle(true);
        assert_eq!(fee.value, "multiplier");

        let mut active = FormField::toggle("is_active", "Active");
        active.cycle(true);
        assert_eq!(active.value, "false");
    }

    #[test]
    fn test_form_navigation_and_errors() {
        let mut form = Form::new(vec![
            FormField::text("name", "Name"),
            FormField::number("price", "Price"),
        ]);
        assert!(form.fields[0].is_focused);
        form.previous_field();
        assert_eq!(form.current_field, 1);
        assert!(form.fields[1].is_focused && !form.fields[0].is_focused);

        let matched = form.apply_errors(vec![
            ("price", "Price cannot be negative".to_string()),
            ("unknown", "ignored".to_string()),
        ]);
        assert_eq!(matched, 1);
        assert!(form.field("price").unwrap().validation_error.is_some());

        let mut values = FormValues::new();
        values.insert("name".into(), "Day Pass".into());
        form.fill(&values);
        assert_eq!(form.values().get("name").map(String::as_str), Some("Day Pass"));
    }
}
