//! Shared behaviour for admin TUI screens

use crate::forms::FormModal;
use crate::resources::Resource;

/// What a screen asks the app to do after handling a key
#[derive(Debug, Clone)]
pub enum ScreenAction {
    /// Open the list screen for a resource
    OpenList(Resource),
    /// Open the detail view of one record
    OpenDetail { resource: Resource, key: String },
    /// Show a create/edit form over the current screen
    OpenForm(FormModal),
    /// Ask for confirmation before deleting `key`
    ConfirmDelete { key: String },
    /// Refetch the current list page
    Fetch,
    /// Reload the record on the detail screen
    Reload,
    /// Go back to previous screen
    NavigateBack,
    /// Quit the application
    Quit,
    /// Set status message
    SetStatus(String),
    /// Set error message
    SetError(String),
    /// No action taken
    None,
}

/// Screens with a selectable list of rows
pub trait Navigable {
    fn get_selected_index(&self) -> Option<usize>;

    fn set_selected_index(&mut self, index: Option<usize>);

    fn get_item_count(&self) -> usize;

    fn navigate_up(&mut self) {
        let count = self.get_item_count();
        if count == 0 {
            return;
        }
        let i = match self.get_selected_index() {
            Some(0) | None => count - 1,
            Some(i) => i.min(count) - 1,
        };
        self.set_selected_index(Some(i));
    }

    fn navigate_down(&mut self) {
        let count = self.get_item_count();
        if count == 0 {
            return;
        }
        let i = match self.get_selected_index() {
            Some(i) => (i + 1) % count,
            None => 0,
        };
        self.set_selected_index(Some(i));
    }

    fn navigate_to_first(&mut self) {
        if self.get_item_count() > 0 {
            self.set_selected_index(Some(0));
        }
    }

    fn navigate_to_last(&mut self) {
        let count = self.get_item_count();
        if count > 0 {
            self.set_selected_index(Some(count - 1));
        }
    }

    /// Keep the selection inside the list after the rows changed
    fn clamp_selection(&mut self) {
        let count = self.get_item_count();
        match self.get_selected_index() {
            _ if count == 0 => self.set_selected_index(None),
            Some(i) if i >= count => self.set_selected_index(Some(count - 1)),
            None => self.set_selected_index(Some(0)),
            _ => {}
        }
    }
}

/// Screens with vertically scrolling text
pub trait Scrollable {
    fn get_scroll_offset(&self) -> usize;

    fn set_scroll_offset(&mut self, offset: usize);

    fn calculate_max_scroll(&self) -> usize;

    fn scroll_up(&mut self, amount: usize) {
        let offset = self.get_scroll_offset().saturating_sub(amount);
        self.set_scroll_offset(offset);
    }

    fn scroll_down(&mut self, amount: usize) {
        let offset = (self.get_scroll_offset() + amount).min(self.calculate_max_scroll());
        self.set_scroll_offset(offset);
    }

    fn scroll_to_top(&mut self) {
        self.set_scroll_offset(0);
    }
}

/// Keyboard editing of a multi-field form
pub trait FormHandler {
    fn next_field(&mut self);

    fn previous_field(&mut self);

    fn input_char(&mut self, c: char);

    fn backspace(&mut self);

    fn delete(&mut self);

    /// Left/Right: move the cursor in text fields, cycle choice fields
    fn left(&mut self);

    fn right(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Rows {
        count: usize,
        selected: Option<usize>,
    }

    impl Navigable for Rows {
        fn get_selected_index(&self) -> Option<usize> {
            self.selected
        }

        fn set_selected_index(&mut self, index: Option<usize>) {
            self.selected = index;
        }

        fn get_item_count(&self) -> usize {
            self.count
        }
    }

    #[test]
    fn test_navigation_wraps() {
        let mut rows = Rows { count: 3, selected: Some(0) };
        rows.navigate_up();
        assert_eq!(rows.selected, Some(2));
        rows.navigate_down();
        assert_eq!(rows.selected, Some(0));
    }

    #[test]
    fn test_clamp_after_shrink() {
        let mut rows = Rows { count: 2, selected: Some(7) };
        rows.clamp_selection();
        assert_eq!(rows.selected, Some(1));

        rows.count = 0;
        rows.clamp_selection();
        assert_eq!(rows.selected, None);
    }
}
