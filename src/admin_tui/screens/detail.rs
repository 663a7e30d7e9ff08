//! Read-only view of a single record

use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use serde_json::Value;

use crate::admin_tui::traits::{Scrollable, ScreenAction};
use crate::admin_tui::ui::Styles;
use crate::config::Config;
use crate::forms::FormModal;
use crate::listing::timing::AutoRefresh;
use crate::models::{display_value, Record};
use crate::resources::{format_timestamp, status_label, status_tone, Resource};
use crate::table::MISSING_CELL;

pub struct DetailScreen {
    pub resource: Resource,
    pub key: String,
    pub record: Option<Record>,
    pub loading: bool,
    pub error: Option<String>,
    pub refresh: Option<AutoRefresh>,
    lines: Vec<(String, String)>,
    scroll: usize,
}

impl DetailScreen {
    pub fn new(resource: Resource, key: &str, config: &Config, now: Instant) -> Self {
        Self {
            resource,
            key: key.to_string(),
            record: None,
            loading: true,
            error: None,
            refresh: resource
                .auto_refresh()
                .then(|| AutoRefresh::new(config.refresh_interval(), now)),
            lines: Vec::new(),
            scroll: 0,
        }
    }

    /// Apply a load result; a failure keeps the last record on screen
    pub fn set_result(&mut self, result: Result<Record, String>) {
        self.loading = false;
        match result {
            Ok(record) => {
                self.lines = detail_lines(&record);
                self.record = Some(record);
                self.error = None;
                let max = self.calculate_max_scroll();
                if self.scroll > max {
                    self.scroll = max;
                }
            }
            Err(message) => self.error = Some(message),
        }
    }

    /// True when the auto-refresh timer asks for a reload
    pub fn tick(&mut self, now: Instant) -> bool {
        self.refresh.as_mut().map(|r| r.due(now)).unwrap_or(false)
    }

    pub fn handle_key_event(&mut self, key: KeyEvent) -> ScreenAction {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.scroll_up(1),
            KeyCode::Down | KeyCode::Char('j') => self.scroll_down(1),
            KeyCode::PageUp => self.scroll_up(10),
            KeyCode::PageDown => self.scroll_down(10),
            KeyCode::Home => self.scroll_to_top(),
            KeyCode::Char('r') => return ScreenAction::Reload,
            KeyCode::Char('e') => {
                return match (self.resource.form(), &self.record) {
                    (Some(kind), Some(record)) => ScreenAction::OpenForm(FormModal::edit(kind, &self.key, record)),
                    (None, _) => ScreenAction::SetError(format!("{} are read-only", self.resource.title())),
                    (_, None) => ScreenAction::None,
                };
            }
            KeyCode::Esc | KeyCode::Backspace => return ScreenAction::NavigateBack,
            KeyCode::Char('q') => return ScreenAction::Quit,
            _ => {}
        }
        ScreenAction::None
    }

    pub fn draw(&self, f: &mut Frame, area: Rect) {
        let title = format!(" {} · {} ", self.resource.title(), self.key);
        let block = Block::default()
            .title(Span::styled(title, Styles::title()))
            .borders(Borders::ALL)
            .border_style(Styles::active_border());

        let mut text: Vec<Line> = Vec::new();
        if let Some(error) = &self.error {
            text.push(Line::from(Span::styled(format!("⚠ {}", error), Styles::error())));
            text.push(Line::from(""));
        }
        if self.record.is_none() {
            let message = if self.loading { "Loading..." } else { "Record not available" };
            text.push(Line::from(Span::styled(message, Styles::inactive())));
        }

        let label_width = self.lines.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
        for (label, value) in self.lines.iter().skip(self.scroll) {
            let style = if label == "status" {
                Styles::tone(status_tone(value))
            } else {
                Styles::default()
            };
            let shown = if label == "status" { status_label(value) } else { value.clone() };
            text.push(Line::from(vec![
                Span::styled(format!("{:<width$}  ", label, width = label_width), Styles::info()),
                Span::styled(shown, style),
            ]));
        }

        let paragraph = Paragraph::new(text).block(block).wrap(Wrap { trim: false });
        f.render_widget(paragraph, area);
    }
}

impl Scrollable for DetailScreen {
    fn get_scroll_offset(&self) -> usize {
        self.scroll
    }

    fn set_scroll_offset(&mut self, offset: usize) {
        self.scroll = offset;
    }

    fn calculate_max_scroll(&self) -> usize {
        self.lines.len().saturating_sub(1)
    }
}

fn looks_like_timestamp(key: &str) -> bool {
    key.ends_with("_at") || key.ends_with("_date") || key.starts_with("valid_")
}

fn render_value(key: &str, value: &Value) -> String {
    match value {
        Value::Array(_) => value.to_string(),
        _ => match display_value(value) {
            Some(text) if looks_like_timestamp(key) => format_timestamp(&text),
            Some(text) => text,
            None => MISSING_CELL.to_string(),
        },
    }
}

/// Label/value pairs in record order; nested objects are flattened one level
pub fn detail_lines(record: &Record) -> Vec<(String, String)> {
    let Some(object) = record.as_value().as_object() else {
        return vec![("value".to_string(), record.as_value().to_string())];
    };

    let mut lines = Vec::new();
    for (key, value) in object {
        match value {
            Value::Object(inner) if !inner.is_empty() => {
                for (inner_key, inner_value) in inner {
                    let label = format!("{}.{}", key, inner_key);
                    lines.push((label, render_value(inner_key, inner_value)));
                }
            }
            _ => lines.push((key.clone(), render_value(key, value))),
        }
    }
    lines
}
