//! Reusable widgets for the admin TUI screens

pub mod data_table;
pub mod form_field;
pub mod status_display;

pub use data_table::{TableChrome, TableView};
pub use status_display::StatusDisplay;
