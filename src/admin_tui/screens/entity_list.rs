//! List screen shared by every resource: stat cards, search box, table and
//! pagination footer

use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::admin_tui::components::{TableChrome, TableView};
use crate::admin_tui::traits::{Navigable, ScreenAction};
use crate::admin_tui::ui::Styles;
use crate::api::ApiClient;
use crate::config::Config;
use crate::forms::FormModal;
use crate::listing::timing::AutoRefresh;
use crate::listing::PagedResource;
use crate::models::Record;
use crate::resources::{stat_label, status_tone, Resource, ResourceHandle};
use crate::table::{ClickTarget, DataTable, TableEvent};

const MAX_STAT_CARDS: usize = 4;

pub struct EntityListScreen {
    pub resource: Resource,
    pub handle: ResourceHandle,
    pub store: PagedResource<Record>,
    pub table: DataTable<Record>,
    pub view: TableView,
    pub search_focused: bool,
    pub refresh: Option<AutoRefresh>,
    /// Values the status filter cycles through, captured from the unfiltered rows
    filter_choices: Vec<String>,
    breakpoint: u16,
}

impl EntityListScreen {
    pub fn new(resource: Resource, api: ApiClient, config: &Config, now: Instant) -> Self {
        let refresh = resource
            .auto_refresh()
            .then(|| AutoRefresh::new(config.refresh_interval(), now));
        Self {
            resource,
            handle: ResourceHandle::new(api, resource),
            store: PagedResource::new(resource.listing_options(config)),
            table: resource.table(),
            view: TableView::new(),
            search_focused: false,
            refresh,
            filter_choices: Vec::new(),
            breakpoint: config.listing.mobile_breakpoint,
        }
    }

    pub fn selected_record(&self) -> Option<&Record> {
        let index = self.view.get_selected_index()?;
        self.store.visible().get(index).copied()
    }

    /// Polls the search debounce and the auto-refresh timer.
    /// Returns true when the current page should be fetched.
    pub fn tick(&mut self, now: Instant) -> bool {
        let search_settled = self.store.poll_search(now);
        let refresh_due = self.refresh.as_mut().map(|r| r.due(now)).unwrap_or(false);
        search_settled || refresh_due
    }

    pub fn handle_key_event(&mut self, key: KeyEvent, now: Instant) -> ScreenAction {
        if self.search_focused {
            self.handle_search_key(key, now);
            return ScreenAction::None;
        }

        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.navigate(|v| v.navigate_up()),
            KeyCode::Down | KeyCode::Char('j') => self.navigate(|v| v.navigate_down()),
            KeyCode::Home => self.navigate(|v| v.navigate_to_first()),
            KeyCode::End => self.navigate(|v| v.navigate_to_last()),
            KeyCode::Char('/') => self.search_focused = true,
            KeyCode::PageDown | KeyCode::Char(']') => {
                if self.store.next_page() {
                    return ScreenAction::Fetch;
                }
            }
            KeyCode::PageUp | KeyCode::Char('[') => {
                if self.store.previous_page() {
                    return ScreenAction::Fetch;
                }
            }
            KeyCode::Char('r') => return ScreenAction::Fetch,
            KeyCode::Char('f') => return self.cycle_status_filter(),
            KeyCode::Char('n') => {
                return match self.resource.form() {
                    Some(kind) => ScreenAction::OpenForm(FormModal::create(kind)),
                    None => ScreenAction::SetError(format!("{} are read-only", self.resource.title())),
                }
            }
            KeyCode::Enter => return self.click(ClickTarget::Row),
            KeyCode::Char(c @ ('e' | 'x')) => return self.click(ClickTarget::Action(c)),
            KeyCode::Esc => return ScreenAction::NavigateBack,
            KeyCode::Char('q') => return ScreenAction::Quit,
            _ => {}
        }
        ScreenAction::None
    }

    fn handle_search_key(&mut self, key: KeyEvent, now: Instant) {
        let mut text = self.store.search().to_string();
        match key.code {
            KeyCode::Esc | KeyCode::Enter | KeyCode::Tab => {
                self.search_focused = false;
                return;
            }
            KeyCode::Char(c) => text.push(c),
            KeyCode::Backspace => {
                text.pop();
            }
            _ => return,
        }
        self.store.set_search(&text, now);
        let count = self.store.visible().len();
        self.view.set_row_count(count);
    }

    /// Step the status filter: off, then each status seen on screen, then off again
    fn cycle_status_filter(&mut self) -> ScreenAction {
        let Some(field) = self.resource.status_field() else {
            return ScreenAction::SetError(format!("{} have no status to filter on", self.resource.title()));
        };

        if self.store.filter(field).is_none() {
            self.filter_choices = self
                .store
                .stat_counts(field)
                .1
                .into_iter()
                .map(|(value, _)| value)
                .filter(|value| value != "unknown")
                .collect();
        }
        let next = match self.store.filter(field) {
            None => self.filter_choices.first().cloned(),
            Some(current) => self
                .filter_choices
                .iter()
                .position(|c| c == current)
                .and_then(|i| self.filter_choices.get(i + 1))
                .cloned(),
        };

        if !self.store.set_filter(field, next.as_deref()) {
            return ScreenAction::None;
        }
        let count = self.store.visible().len();
        self.view.set_row_count(count);
        ScreenAction::Fetch
    }

    fn navigate(&mut self, step: impl FnOnce(&mut TableView)) {
        let count = self.store.visible().len();
        self.view.set_row_count(count);
        step(&mut self.view);
    }

    /// Route a key press through the table's click dispatch
    fn click(&self, target: ClickTarget) -> ScreenAction {
        let rows = self.store.visible();
        let Some(index) = self.view.get_selected_index() else {
            return ScreenAction::None;
        };

        let events = self.table.dispatch(rows.len(), index, target);
        let Some(event) = events.first() else {
            if let ClickTarget::Action(_) = target {
                return ScreenAction::SetError(format!(
                    "That action is not available for {}",
                    self.resource.title()
                ));
            }
            return ScreenAction::None;
        };

        let Some(record) = rows.get(index).copied() else {
            return ScreenAction::None;
        };
        let Some(key) = self.resource.row_key(record) else {
            return ScreenAction::SetError(format!("Row has no {}", self.resource.key_field()));
        };

        match event {
            TableEvent::RowClicked(_) => ScreenAction::OpenDetail {
                resource: self.resource,
                key,
            },
            TableEvent::Action { key: 'e', .. } => match self.resource.form() {
                Some(kind) => ScreenAction::OpenForm(FormModal::edit(kind, &key, record)),
                None => ScreenAction::None,
            },
            TableEvent::Action { key: 'x', .. } => ScreenAction::ConfirmDelete { key },
            TableEvent::Action { .. } => ScreenAction::None,
        }
    }

    pub fn draw(&mut self, f: &mut Frame, area: Rect) {
        let has_stats = self.resource.status_field().is_some();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(if has_stats { 3 } else { 0 }),
                Constraint::Length(3),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(area);

        if has_stats {
            self.draw_stats(f, chunks[0]);
        }
        self.draw_search(f, chunks[1]);

        let title = format!(" {} ({}) ", self.resource.title(), self.resource.path());
        let tone_column = self
            .table
            .columns()
            .iter()
            .position(|c| Some(c.accessor.as_str()) == self.resource.status_field());
        let chrome = TableChrome {
            title: &title,
            focused: !self.search_focused,
            loading: self.store.is_loading(),
            breakpoint: self.breakpoint,
            tone_column,
        };
        let rows = self.store.visible();
        self.view.draw(f, chunks[2], &self.table, &rows, &chrome);

        self.draw_footer(f, chunks[3]);
    }

    fn draw_stats(&self, f: &mut Frame, area: Rect) {
        let Some(field) = self.resource.status_field() else {
            return;
        };
        let (total, counts) = self.store.stat_counts(field);

        let mut cards = vec![("Total".to_string(), total, Styles::title())];
        for (value, count) in counts.into_iter().take(MAX_STAT_CARDS) {
            let label = stat_label(field, &value);
            cards.push((label, count, Styles::tone(status_tone(&value))));
        }

        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(vec![Constraint::Ratio(1, cards.len() as u32); cards.len()])
            .split(area);

        for ((label, count, style), chunk) in cards.into_iter().zip(chunks.iter()) {
            let card = Paragraph::new(Line::from(Span::styled(count.to_string(), style))).block(
                Block::default()
                    .title(label)
                    .borders(Borders::ALL)
                    .border_style(Styles::inactive_border()),
            );
            f.render_widget(card, *chunk);
        }
    }

    fn draw_search(&self, f: &mut Frame, area: Rect) {
        let scope = if self.store.options().server_search {
            "server search".to_string()
        } else {
            self.resource.search_fields().join(", ")
        };
        let mut title = format!("Search ({})", scope);
        if let Some(value) = self
            .resource
            .status_field()
            .and_then(|field| self.store.filter(field).map(|v| stat_label(field, v)))
        {
            title.push_str(&format!(" · filter: {}", value));
        }
        if self.store.search_pending() {
            title.push_str(" · searching...");
        }
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(if self.search_focused {
                Styles::active_border()
            } else {
                Styles::inactive_border()
            });

        let search = self.store.search();
        let line = if search.is_empty() && !self.search_focused {
            Line::from(Span::styled("Press / to search", Styles::inactive()))
        } else {
            Line::from(search)
        };
        f.render_widget(Paragraph::new(line).block(block), area);

        if self.search_focused {
            let x = area.x + 1 + UnicodeWidthStr::width(search) as u16;
            if x < area.x + area.width.saturating_sub(1) {
                f.set_cursor(x, area.y + 1);
            }
        }
    }

    fn draw_footer(&self, f: &mut Frame, area: Rect) {
        let mut spans = Vec::new();

        match self.store.pagination() {
            Some(cursor) => spans.push(Span::styled(cursor.summary(), Styles::info())),
            None => spans.push(Span::styled(
                format!("{} records", self.store.visible().len()),
                Styles::info(),
            )),
        }
        if let Some(refresh) = &self.refresh {
            spans.push(Span::styled(
                format!("  · auto-refresh in {}s", refresh.time_until_due(Instant::now()).as_secs()),
                Styles::inactive(),
            ));
        }
        if let Some(key) = self.store.delete_loading_id() {
            spans.push(Span::styled(format!("  · deleting {}", key), Styles::warning()));
        }
        if let Some(error) = self.store.error() {
            spans.push(Span::styled(format!("  ⚠ {}", error), Styles::error()));
        }

        f.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ListPage;
    use crate::listing::PaginationCursor;
    use crate::session::Session;
    use crossterm::event::KeyModifiers;
    use serde_json::json;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn screen(resource: Resource) -> EntityListScreen {
        let api = ApiClient::with_base_url("http://127.0.0.1:9", Session::Unauthenticated).unwrap();
        EntityListScreen::new(resource, api, &Config::default(), Instant::now())
    }

    fn load(screen: &mut EntityListScreen, rows: Vec<serde_json::Value>, pagination: Option<PaginationCursor>) {
        let ticket = screen.store.begin_fetch();
        let page = ListPage {
            items: rows.into_iter().map(Record).collect(),
            pagination,
            message: None,
        };
        screen.store.finish_fetch(ticket, Ok(page));
        let count = screen.store.visible().len();
        screen.view.set_row_count(count);
    }

    #[test]
    fn test_keys_map_to_row_actions() {
        let mut list = screen(Resource::Discounts);
        load(&mut list, vec![json!({ "id": "d1", "discount_percent": "10", "status": "active" })], None);

        assert!(matches!(
            list.handle_key_event(key(KeyCode::Enter), Instant::now()),
            ScreenAction::OpenDetail { key, .. } if key == "d1"
        ));
        assert!(matches!(
            list.handle_key_event(key(KeyCode::Char('x')), Instant::now()),
            ScreenAction::ConfirmDelete { key } if key == "d1"
        ));
        match list.handle_key_event(key(KeyCode::Char('e')), Instant::now()) {
            ScreenAction::OpenForm(modal) => assert_eq!(modal.title(), "Edit Discount d1"),
            other => panic!("unexpected action: {:?}", other),
        }
    }

    #[test]
    fn test_read_only_resource_refuses_edit_and_create() {
        let mut list = screen(Resource::Transactions);
        load(&mut list, vec![json!({ "id": "t1", "amount": "50" })], None);
        assert!(matches!(
            list.handle_key_event(key(KeyCode::Char('e')), Instant::now()),
            ScreenAction::SetError(_)
        ));
        assert!(matches!(
            list.handle_key_event(key(KeyCode::Char('n')), Instant::now()),
            ScreenAction::SetError(_)
        ));
    }

    #[test]
    fn test_local_search_typing_filters_rows() {
        let mut list = screen(Resource::Stations);
        load(
            &mut list,
            vec![
                json!({ "serial_number": "PB-1", "station_name": "Airport" }),
                json!({ "serial_number": "PB-2", "station_name": "Durbar Marg" }),
            ],
            None,
        );

        let now = Instant::now();
        list.handle_key_event(key(KeyCode::Char('/')), now);
        for c in "durbar".chars() {
            list.handle_key_event(key(KeyCode::Char(c)), now);
        }
        assert_eq!(list.store.visible().len(), 1);
        assert_eq!(list.selected_record().and_then(|r| r.text("serial_number")), Some("PB-2".into()));

        // Typing never triggers a fetch for locally searched resources
        assert!(!list.store.poll_search(now + std::time::Duration::from_secs(5)));
    }

    #[test]
    fn test_page_keys_respect_bounds() {
        let mut list = screen(Resource::Packages);
        load(
            &mut list,
            vec![json!({ "id": 1, "name": "1 Hour" })],
            Some(PaginationCursor::from_count(1, 20, 45)),
        );

        assert!(matches!(list.handle_key_event(key(KeyCode::PageUp), Instant::now()), ScreenAction::None));
        assert!(matches!(list.handle_key_event(key(KeyCode::PageDown), Instant::now()), ScreenAction::Fetch));
        assert_eq!(list.store.page(), 2);
    }

    #[test]
    fn test_enter_on_row_without_key_reports_error() {
        let mut list = screen(Resource::Stations);
        load(&mut list, vec![json!({ "station_name": "Airport", "status": "active" })], None);

        match list.handle_key_event(key(KeyCode::Enter), Instant::now()) {
            ScreenAction::SetError(message) => assert_eq!(message, "Row has no serial_number"),
            other => panic!("unexpected action: {:?}", other),
        }
    }

    #[test]
    fn test_status_filter_cycles_and_refetches() {
        let mut list = screen(Resource::Discounts);
        load(
            &mut list,
            vec![
                json!({ "id": "d1", "status": "active" }),
                json!({ "id": "d2", "status": "expired" }),
                json!({ "id": "d3", "status": "active" }),
            ],
            None,
        );

        let now = Instant::now();
        assert!(matches!(list.handle_key_event(key(KeyCode::Char('f')), now), ScreenAction::Fetch));
        assert_eq!(list.store.filter("status"), Some("active"));
        assert_eq!(list.store.query().filters.get("status").map(String::as_str), Some("active"));
        assert_eq!(list.store.visible().len(), 2);

        assert!(matches!(list.handle_key_event(key(KeyCode::Char('f')), now), ScreenAction::Fetch));
        assert_eq!(list.store.filter("status"), Some("expired"));

        assert!(matches!(list.handle_key_event(key(KeyCode::Char('f')), now), ScreenAction::Fetch));
        assert_eq!(list.store.filter("status"), None);
        assert_eq!(list.store.visible().len(), 3);
    }

    #[test]
    fn test_stations_refresh_on_interval() {
        let start = Instant::now();
        let mut list = screen(Resource::Stations);
        let interval = Config::default().refresh_interval();
        assert!(!list.tick(start));
        assert!(list.tick(start + interval + std::time::Duration::from_secs(1)));

        let mut packages = screen(Resource::Packages);
        assert!(!packages.tick(start + interval * 3));
    }
}
