//! Main TUI application state and event loop
//!
//! Key handlers never await. Requests are queued as [`Pending`] work and run
//! between frames, so the loading state is drawn before each request starts.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame, Terminal,
};
use tracing::{debug, info};

use super::components::StatusDisplay;
use super::screens::{form_modal, ConfirmDialog, DetailScreen, EntityListScreen, MainMenuScreen};
use super::traits::{FormHandler, ScreenAction};
use super::ui::centered_rect;
use crate::api::{ApiClient, RequestBody};
use crate::config::Config;
use crate::forms::FormModal;
use crate::listing::{FetchOutcome, FetchTicket};
use crate::resources::{Resource, ResourceHandle};

const TICK_RATE: Duration = Duration::from_millis(100);
const TOAST_TIMEOUT: Duration = Duration::from_secs(4);
const RECENT_MESSAGES: usize = 5;

/// Application screens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    MainMenu,
    List,
    Detail,
}

/// Request work queued by key handlers and timers
#[derive(Debug)]
enum Pending {
    Fetch(FetchTicket),
    Delete,
    LoadDetail,
    Submit(RequestBody),
}

pub struct App {
    pub current_screen: Screen,
    pub config: Config,
    api: ApiClient,

    pub main_menu: MainMenuScreen,
    pub list: Option<EntityListScreen>,
    pub detail: Option<DetailScreen>,

    // Overlays, drawn on top of the current screen
    pub modal: Option<FormModal>,
    pub confirm: Option<ConfirmDialog>,

    pub status: StatusDisplay,
    pub should_quit: bool,
    pub show_help_popup: bool,
    pending: VecDeque<Pending>,
}

impl App {
    pub fn new(config: Config, api: ApiClient) -> Self {
        let mut status = StatusDisplay::new().with_auto_clear(TOAST_TIMEOUT);
        if !api.session().is_authenticated() {
            status.set_warning("Not signed in. Run `pb-admin login --token <TOKEN>` first");
        }

        Self {
            current_screen: Screen::MainMenu,
            main_menu: MainMenuScreen::new(api.base_url(), api.session().is_authenticated()),
            config,
            api,
            list: None,
            detail: None,
            modal: None,
            confirm: None,
            status,
            should_quit: false,
            show_help_popup: false,
            pending: VecDeque::new(),
        }
    }

    /// Run the main application loop
    pub async fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        info!("Admin TUI started against {}", self.api.base_url());

        loop {
            terminal.draw(|f| self.draw(f))?;

            if self.run_next_pending().await {
                continue;
            }

            if crossterm::event::poll(TICK_RATE)? {
                if let Event::Key(key) = crossterm::event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key_event(key, Instant::now());
                    }
                }
            }
            self.tick(Instant::now());

            if self.should_quit {
                break;
            }
        }

        info!("Admin TUI closed");
        Ok(())
    }

    /// Whether any request work is waiting for the next frame
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Timers: search debounce, station auto-refresh, toast expiry
    pub fn tick(&mut self, now: Instant) {
        self.status.tick(chrono::Local::now());

        match self.current_screen {
            Screen::List => {
                if self.list.as_mut().map(|l| l.tick(now)).unwrap_or(false) {
                    self.start_fetch();
                }
            }
            Screen::Detail => {
                if self.detail.as_mut().map(|d| d.tick(now)).unwrap_or(false) {
                    self.pending.push_back(Pending::LoadDetail);
                }
            }
            Screen::MainMenu => {}
        }
    }

    pub fn handle_key_event(&mut self, key: KeyEvent, now: Instant) {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        if self.modal.is_some() {
            self.handle_modal_key(key);
            return;
        }
        if self.confirm.is_some() {
            self.handle_confirm_key(key);
            return;
        }

        let typing = self.current_screen == Screen::List
            && self.list.as_ref().map(|l| l.search_focused).unwrap_or(false);
        match key.code {
            KeyCode::F(1) => {
                self.show_help_popup = !self.show_help_popup;
                return;
            }
            KeyCode::Char('?') if !typing => {
                self.show_help_popup = !self.show_help_popup;
                return;
            }
            KeyCode::Esc if self.show_help_popup => {
                self.show_help_popup = false;
                return;
            }
            _ if self.show_help_popup => return,
            _ => {}
        }

        let action = match self.current_screen {
            Screen::MainMenu => self.main_menu.handle_key_event(key),
            Screen::List => match self.list.as_mut() {
                Some(list) => list.handle_key_event(key, now),
                None => ScreenAction::NavigateBack,
            },
            Screen::Detail => match self.detail.as_mut() {
                Some(detail) => detail.handle_key_event(key),
                None => ScreenAction::NavigateBack,
            },
        };
        self.apply_action(action, now);
    }

    fn apply_action(&mut self, action: ScreenAction, now: Instant) {
        match action {
            ScreenAction::OpenList(resource) => self.open_list(resource, now),
            ScreenAction::OpenDetail { resource, key } => {
                debug!("Opening {} {}", resource, key);
                self.detail = Some(DetailScreen::new(resource, &key, &self.config, now));
                self.navigate_to_screen(Screen::Detail);
                self.pending.push_back(Pending::LoadDetail);
            }
            ScreenAction::OpenForm(modal) => self.modal = Some(modal),
            ScreenAction::ConfirmDelete { key } => {
                if let Some(list) = self.list.as_mut() {
                    let noun = list.resource.form().map(|k| k.noun()).unwrap_or("Record");
                    list.store.request_delete(&key);
                    self.confirm = Some(ConfirmDialog::delete(noun, &key));
                }
            }
            ScreenAction::Fetch => self.start_fetch(),
            ScreenAction::Reload => {
                if let Some(detail) = self.detail.as_mut() {
                    detail.loading = true;
                    self.pending.push_back(Pending::LoadDetail);
                }
            }
            ScreenAction::NavigateBack => self.navigate_back(),
            ScreenAction::Quit => self.should_quit = true,
            ScreenAction::SetStatus(message) => self.status.set_info(message),
            ScreenAction::SetError(message) => self.status.set_error(message),
            ScreenAction::None => {}
        }
    }

    fn open_list(&mut self, resource: Resource, now: Instant) {
        info!("Opening {} list", resource);
        self.list = Some(EntityListScreen::new(resource, self.api.clone(), &self.config, now));
        self.detail = None;
        self.navigate_to_screen(Screen::List);
        self.start_fetch();
    }

    /// Queue a fetch of the current list page
    fn start_fetch(&mut self) {
        if let Some(list) = self.list.as_mut() {
            let ticket = list.store.begin_fetch();
            if let Some(refresh) = list.refresh.as_mut() {
                refresh.begin();
            }
            self.pending.retain(|p| !matches!(p, Pending::Fetch(_)));
            self.pending.push_back(Pending::Fetch(ticket));
        }
    }

    pub fn navigate_to_screen(&mut self, screen: Screen) {
        self.current_screen = screen;
        self.show_help_popup = false;
    }

    fn navigate_back(&mut self) {
        match self.current_screen {
            Screen::Detail => {
                self.detail = None;
                let back = if self.list.is_some() { Screen::List } else { Screen::MainMenu };
                self.navigate_to_screen(back);
            }
            Screen::List => {
                self.list = None;
                self.pending.clear();
                self.navigate_to_screen(Screen::MainMenu);
            }
            Screen::MainMenu => self.should_quit = true,
        }
    }

    fn handle_modal_key(&mut self, key: KeyEvent) {
        let Some(modal) = self.modal.as_mut() else {
            return;
        };
        if modal.is_submitting() {
            return;
        }

        match key.code {
            KeyCode::Esc => {
                debug!("Closed {} without saving", modal.title());
                self.modal = None;
            }
            KeyCode::Tab | KeyCode::Down => FormHandler::next_field(modal),
            KeyCode::BackTab | KeyCode::Up => FormHandler::previous_field(modal),
            KeyCode::Left => modal.left(),
            KeyCode::Right => modal.right(),
            KeyCode::Backspace => modal.backspace(),
            KeyCode::Delete => modal.delete(),
            KeyCode::Char(c) => modal.input_char(c),
            KeyCode::Enter => match modal.begin_submit() {
                Ok(body) => {
                    self.status.set_loading("Saving...");
                    self.pending.push_back(Pending::Submit(body));
                }
                Err(err) => self.status.set_error(err.to_string()),
            },
            _ => {}
        }
    }

    fn handle_confirm_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                self.confirm = None;
                if let Some(key) = self.list.as_ref().and_then(|l| l.store.pending_delete()) {
                    self.status.set_loading(format!("Deleting {}...", key));
                }
                self.pending.push_back(Pending::Delete);
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.confirm = None;
                if let Some(list) = self.list.as_mut() {
                    list.store.cancel_delete();
                }
            }
            _ => {}
        }
    }

    /// Run one queued request. Returns false when the queue was empty.
    pub async fn run_next_pending(&mut self) -> bool {
        let Some(pending) = self.pending.pop_front() else {
            return false;
        };

        match pending {
            Pending::Fetch(ticket) => self.finish_fetch(ticket).await,
            Pending::Delete => self.finish_delete().await,
            Pending::LoadDetail => self.load_detail().await,
            Pending::Submit(body) => self.finish_submit(body).await,
        }
        true
    }

    async fn finish_fetch(&mut self, ticket: FetchTicket) {
        let Some(list) = self.list.as_mut() else {
            return;
        };

        let result = list.handle.list(&ticket.query).await;
        let outcome = list.store.finish_fetch(ticket, result);
        if let Some(refresh) = list.refresh.as_mut() {
            refresh.finish();
        }
        let count = list.store.visible().len();
        list.view.set_row_count(count);

        match outcome {
            FetchOutcome::Loaded { count } => debug!("Loaded {} {} rows", count, list.resource),
            FetchOutcome::Failed { message } => self.status.set_error(message),
            FetchOutcome::Stale => {}
        }
    }

    async fn finish_delete(&mut self) {
        let Some(list) = self.list.as_mut() else {
            return;
        };

        let result = list.store.confirm_delete(&list.handle).await;
        let count = list.store.visible().len();
        list.view.set_row_count(count);

        match result {
            Ok(toast) => self.status.set_success(toast),
            Err(message) => self.status.set_error(message),
        }
    }

    async fn load_detail(&mut self) {
        let Some(detail) = self.detail.as_mut() else {
            return;
        };

        let handle = ResourceHandle::new(self.api.clone(), detail.resource);
        if let Some(refresh) = detail.refresh.as_mut() {
            refresh.begin();
        }
        let result = handle.get(&detail.key).await.map_err(|e| e.user_message());
        if let Some(refresh) = detail.refresh.as_mut() {
            refresh.finish();
        }

        if let Err(message) = &result {
            self.status.set_error(message.clone());
        }
        detail.set_result(result);
    }

    async fn finish_submit(&mut self, body: RequestBody) {
        let Some(modal) = self.modal.as_mut() else {
            return;
        };

        let resource = modal.kind().resource();
        let handle = ResourceHandle::new(self.api.clone(), resource);
        let result = modal.send(&handle, body).await;

        match modal.finish_submit(result) {
            Ok(message) => {
                self.modal = None;
                self.status.set_success(message);
                if self.list.as_ref().map(|l| l.resource) == Some(resource) {
                    self.start_fetch();
                }
                if self.detail.as_ref().map(|d| d.resource) == Some(resource) {
                    self.pending.push_back(Pending::LoadDetail);
                }
            }
            // The modal keeps its values and shows the banner
            Err(err) => self.status.set_error(err.to_string()),
        }
    }

    pub fn draw(&mut self, f: &mut Frame) {
        let size = f.size();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        match (self.current_screen, self.list.as_mut(), self.detail.as_ref()) {
            (Screen::List, Some(list), _) => list.draw(f, chunks[0]),
            (Screen::Detail, _, Some(detail)) => detail.draw(f, chunks[0]),
            _ => self.main_menu.draw(f, chunks[0]),
        }

        let idle = format!(
            "pb-admin - {} | Esc: Back | q: Quit | F1/?: Help",
            self.screen_name()
        );
        self.status.render(f, chunks[1], &idle);

        if let Some(modal) = &self.modal {
            form_modal::draw(f, chunks[0], modal);
        }
        if let Some(confirm) = &self.confirm {
            confirm.draw(f, chunks[0]);
        }
        if self.show_help_popup {
            self.draw_help_popup(f, size);
        }
    }

    fn screen_name(&self) -> String {
        match (self.current_screen, &self.list, &self.detail) {
            (Screen::List, Some(list), _) => list.resource.title().to_string(),
            (Screen::Detail, _, Some(detail)) => format!("{} {}", detail.resource.title(), detail.key),
            _ => "Resources".to_string(),
        }
    }

    fn draw_help_popup(&self, f: &mut Frame, area: Rect) {
        let popup_area = centered_rect(70, 70, area);
        f.render_widget(Clear, popup_area);

        let help_popup = Paragraph::new(self.get_context_help())
            .block(
                Block::default()
                    .title("Help - Context Shortcuts")
                    .borders(Borders::ALL)
                    .style(Style::default().fg(Color::Yellow)),
            )
            .style(Style::default().fg(Color::White));

        f.render_widget(help_popup, popup_area);
    }

    fn get_context_help(&self) -> String {
        let global_help = "Global Shortcuts:\n\
            Esc - Go back\n\
            q - Quit application\n\
            Ctrl+C - Quit from anywhere\n\
            F1 / ? - Toggle this help\n\n";

        let screen_help = match self.current_screen {
            Screen::MainMenu => {
                "Resources:\n\
                ↑/↓ - Navigate resources\n\
                Enter - Open list"
            }
            Screen::List => {
                "List:\n\
                ↑/↓ - Select row\n\
                Enter - Open detail\n\
                / - Search (Enter/Esc to leave the box)\n\
                n - New record\n\
                e - Edit selected row\n\
                x - Delete selected row\n\
                f - Cycle status filter\n\
                r - Refresh\n\
                Page Up/Down or [ ] - Previous/next page"
            }
            Screen::Detail => {
                "Detail:\n\
                ↑/↓ - Scroll\n\
                e - Edit record\n\
                r - Reload"
            }
        };

        let mut help = format!("{}{}", global_help, screen_help);
        let recent = self.status.recent(RECENT_MESSAGES);
        if !recent.is_empty() {
            help.push_str("\n\nRecent messages:\n");
            help.push_str(&recent.join("\n"));
        }
        help
    }
}
