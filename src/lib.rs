//! Admin console for a power bank rental network backend
//!
//! The library holds everything the `pb-admin` binary uses: the REST client
//! and envelope handling, the resource catalogue, list state, entity forms
//! and the terminal dashboard.

pub mod admin_tui;
pub mod api;
pub mod cli;
pub mod config;
pub mod export;
pub mod forms;
pub mod listing;
pub mod models;
pub mod resources;
pub mod session;
pub mod table;
