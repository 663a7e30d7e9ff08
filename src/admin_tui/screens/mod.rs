//! Screen modules for the admin TUI

pub mod confirm;
pub mod detail;
pub mod entity_list;
pub mod form_modal;
pub mod main_menu;

pub use confirm::ConfirmDialog;
pub use detail::DetailScreen;
pub use entity_list::EntityListScreen;
pub use main_menu::MainMenuScreen;
