//! Resource picker shown at start-up

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::admin_tui::traits::{Navigable, ScreenAction};
use crate::admin_tui::ui::Styles;
use crate::resources::Resource;

/// Main menu screen state
pub struct MainMenuScreen {
    pub menu_state: ListState,
    pub resources: Vec<Resource>,
    pub api_url: String,
    pub signed_in: bool,
}

impl MainMenuScreen {
    pub fn new(api_url: &str, signed_in: bool) -> Self {
        let mut menu_state = ListState::default();
        menu_state.select(Some(0));
        Self {
            menu_state,
            resources: Resource::ALL.to_vec(),
            api_url: api_url.to_string(),
            signed_in,
        }
    }

    pub fn selected_resource(&self) -> Option<Resource> {
        self.menu_state
            .selected()
            .and_then(|i| self.resources.get(i))
            .copied()
    }

    pub fn handle_key_event(&mut self, key: KeyEvent) -> ScreenAction {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.navigate_up(),
            KeyCode::Down | KeyCode::Char('j') => self.navigate_down(),
            KeyCode::Home => self.navigate_to_first(),
            KeyCode::End => self.navigate_to_last(),
            KeyCode::Enter => {
                if let Some(resource) = self.selected_resource() {
                    return ScreenAction::OpenList(resource);
                }
            }
            KeyCode::Char('q') | KeyCode::Esc => return ScreenAction::Quit,
            _ => {}
        }
        ScreenAction::None
    }

    pub fn draw(&mut self, f: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Title
                Constraint::Min(0),    // Menu
                Constraint::Length(4), // Instructions
            ])
            .split(area);

        self.draw_title(f, chunks[0]);
        self.draw_menu(f, chunks[1]);
        self.draw_instructions(f, chunks[2]);
    }

    fn draw_title(&self, f: &mut Frame, area: Rect) {
        let session = if self.signed_in {
            Span::styled("signed in", Styles::success())
        } else {
            Span::styled("not signed in (run `pb-admin login`)", Styles::error())
        };
        let title = Paragraph::new(Line::from(vec![
            Span::styled("Power Bank Admin", Styles::title()),
            Span::raw("  "),
            Span::styled(self.api_url.as_str(), Styles::info()),
            Span::raw("  "),
            session,
        ]))
        .block(Block::default().borders(Borders::ALL));
        f.render_widget(title, area);
    }

    fn draw_menu(&mut self, f: &mut Frame, area: Rect) {
        let selected = self.menu_state.selected();
        let items: Vec<ListItem> = self
            .resources
            .iter()
            .enumerate()
            .map(|(i, resource)| {
                let style = if Some(i) == selected {
                    Styles::selected()
                } else {
                    Style::default()
                };
                let mut flags = Vec::new();
                if resource.form().is_some() {
                    flags.push("editable");
                }
                if resource.paginated() {
                    flags.push("paged");
                }
                if resource.auto_refresh() {
                    flags.push("live");
                }
                ListItem::new(Line::from(vec![
                    Span::styled(format!("{:<22}", resource.title()), style.add_modifier(Modifier::BOLD)),
                    Span::styled(format!("{:<32}", resource.path()), Styles::inactive()),
                    Span::styled(flags.join(", "), Styles::info()),
                ]))
            })
            .collect();

        let menu = List::new(items)
            .block(
                Block::default()
                    .title("Resources")
                    .borders(Borders::ALL)
                    .border_style(Styles::active_border()),
            )
            .highlight_style(Styles::selected());

        f.render_stateful_widget(menu, area, &mut self.menu_state);
    }

    fn draw_instructions(&self, f: &mut Frame, area: Rect) {
        let bold = Style::default().add_modifier(Modifier::BOLD);
        let instructions = vec![Line::from(vec![
            Span::styled("Navigation: ", Styles::info()),
            Span::raw("↑/↓ to move, "),
            Span::styled("Enter", bold),
            Span::raw(" to open, "),
            Span::styled("F1/?", bold),
            Span::raw(" for help, "),
            Span::styled("q", bold),
            Span::raw(" to quit"),
        ])];

        let paragraph = Paragraph::new(instructions).block(
            Block::default()
                .title("Instructions")
                .borders(Borders::ALL)
                .border_style(Styles::inactive_border()),
        );
        f.render_widget(paragraph, area);
    }
}

impl Navigable for MainMenuScreen {
    fn get_selected_index(&self) -> Option<usize> {
        self.menu_state.selected()
    }

    fn set_selected_index(&mut self, index: Option<usize>) {
        self.menu_state.select(index);
    }

    fn get_item_count(&self) -> usize {
        self.resources.len()
    }
}
