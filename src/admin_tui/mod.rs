//! Terminal dashboard for the rental network admin API
//!
//! A resource menu, one list screen per resource (search, stat cards,
//! pagination, row actions), a record detail view and create/edit forms drawn
//! as popups.

pub mod app;
pub mod components;
pub mod screens;
pub mod traits;
pub mod ui;

use std::io;

use anyhow::Result;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{error, info};

use crate::api::ApiClient;
use crate::config::Config;

pub use app::App;

/// Take over the terminal, run the dashboard and restore the terminal
pub async fn run(config: Config, api: ApiClient) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config, api);
    let result = app.run(&mut terminal).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    match &result {
        Ok(()) => info!("Admin TUI exited successfully"),
        Err(e) => error!("Admin TUI encountered an error: {}", e),
    }
    result
}
