//! Status bar and toast messages

use ratatui::{
    layout::Rect,
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::admin_tui::ui::Styles;

#[derive(Debug, Clone, PartialEq)]
pub enum StatusType {
    Info,
    Success,
    Warning,
    Error,
    Loading,
}

#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub message: String,
    pub status_type: StatusType,
    pub timestamp: chrono::DateTime<chrono::Local>,
}

impl StatusMessage {
    pub fn new(message: String, status_type: StatusType) -> Self {
        Self {
            message,
            status_type,
            timestamp: chrono::Local::now(),
        }
    }
}

/// Current toast plus a short history. Success and info toasts clear
/// themselves after `auto_clear_timeout`; errors stay until replaced.
pub struct StatusDisplay {
    pub current_message: Option<StatusMessage>,
    pub message_history: Vec<StatusMessage>,
    pub max_history: usize,
    pub auto_clear_timeout: Option<std::time::Duration>,
}

impl Default for StatusDisplay {
    fn default() -> Self {
        Self {
            current_message: None,
            message_history: Vec::new(),
            max_history: 50,
            auto_clear_timeout: None,
        }
    }
}

impl StatusDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_auto_clear(mut self, timeout: std::time::Duration) -> Self {
        self.auto_clear_timeout = Some(timeout);
        self
    }

    pub fn set_message(&mut self, message: StatusMessage) {
        self.archive_current();
        self.current_message = Some(message);
    }

    pub fn set_info(&mut self, message: impl Into<String>) {
        self.set_message(StatusMessage::new(message.into(), StatusType::Info));
    }

    pub fn set_success(&mut self, message: impl Into<String>) {
        self.set_message(StatusMessage::new(message.into(), StatusType::Success));
    }

    pub fn set_warning(&mut self, message: impl Into<String>) {
        self.set_message(StatusMessage::new(message.into(), StatusType::Warning));
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.set_message(StatusMessage::new(message.into(), StatusType::Error));
    }

    pub fn set_loading(&mut self, message: impl Into<String>) {
        self.set_message(StatusMessage::new(message.into(), StatusType::Loading));
    }

    pub fn clear(&mut self) {
        self.archive_current();
    }

    fn archive_current(&mut self) {
        if let Some(current) = self.current_message.take() {
            self.message_history.push(current);
            if self.message_history.len() > self.max_history {
                self.message_history.remove(0);
            }
        }
    }

    pub fn get_current(&self) -> Option<&StatusMessage> {
        self.current_message.as_ref()
    }

    pub fn get_history(&self) -> &[StatusMessage] {
        &self.message_history
    }

    /// Newest first, current message included; loading notices are left out
    pub fn recent(&self, count: usize) -> Vec<String> {
        self.get_history()
            .iter()
            .chain(self.current_message.iter())
            .rev()
            .filter(|m| m.status_type != StatusType::Loading)
            .take(count)
            .map(Self::format_message)
            .collect()
    }

    pub fn should_auto_clear(&self, now: chrono::DateTime<chrono::Local>) -> bool {
        let (Some(timeout), Some(message)) = (self.auto_clear_timeout, &self.current_message) else {
            return false;
        };
        if matches!(message.status_type, StatusType::Error | StatusType::Loading) {
            return false;
        }
        now.signed_duration_since(message.timestamp)
            .to_std()
            .map(|elapsed| elapsed > timeout)
            .unwrap_or(false)
    }

    /// Clear an expired toast; returns true when something changed
    pub fn tick(&mut self, now: chrono::DateTime<chrono::Local>) -> bool {
        if self.should_auto_clear(now) {
            self.clear();
            return true;
        }
        false
    }

    /// Render the current message, or `idle` when there is none
    pub fn render(&self, f: &mut Frame, area: Rect, idle: &str) {
        let (content, style) = match &self.current_message {
            Some(message) => {
                let style = match message.status_type {
                    StatusType::Info => Styles::info(),
                    StatusType::Success => Styles::success(),
                    StatusType::Warning | StatusType::Loading => Styles::warning(),
                    StatusType::Error => Styles::error(),
                };
                (Self::format_message(message), style)
            }
            None => (idle.to_string(), Styles::inactive()),
        };

        let paragraph = Paragraph::new(content).style(style).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Styles::inactive_border()),
        );
        f.render_widget(paragraph, area);
    }

    fn format_message(message: &StatusMessage) -> String {
        let prefix = match message.status_type {
            StatusType::Info => "ℹ",
            StatusType::Success => "✓",
            StatusType::Warning => "⚠",
            StatusType::Error => "✗",
            StatusType::Loading => "⟳",
        };
        format!(
            "{} [{}] {}",
            prefix,
            message.timestamp.format("%H:%M:%S"),
            message.message
        )
    }
}
