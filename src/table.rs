//! Column-configurable table model shared by every list view
//!
//! A [`DataTable`] turns rows into display strings; drawing is left to the TUI
//! component. Rendering here is pure so the contract can be tested without a
//! terminal.

use std::borrow::Borrow;

use serde_json::Value;

use crate::models::{display_value, Record};

/// Placeholder for missing or null values
pub const MISSING_CELL: &str = "-";

/// Anything a column can read by accessor name
pub trait TableRow {
    fn field(&self, accessor: &str) -> Option<&Value>;
}

impl TableRow for Record {
    fn field(&self, accessor: &str) -> Option<&Value> {
        self.get(accessor)
    }
}

impl TableRow for Value {
    fn field(&self, accessor: &str) -> Option<&Value> {
        self.as_object()?.get(accessor)
    }
}

type RenderFn<T> = Box<dyn Fn(Option<&Value>, &T, usize) -> String>;
type CardFn<T> = Box<dyn Fn(&T) -> Vec<String>>;

/// One column: header, accessor and an optional render function.
///
/// The accessor does not have to exist on the row. When a render function is
/// set it owns the cell and receives `None` for a missing accessor.
pub struct Column<T> {
    pub header: String,
    pub accessor: String,
    pub width: Option<u16>,
    render: Option<RenderFn<T>>,
}

impl<T: TableRow> Column<T> {
    pub fn new(header: &str, accessor: &str) -> Self {
        Self {
            header: header.to_string(),
            accessor: accessor.to_string(),
            width: None,
            render: None,
        }
    }

    pub fn with_render<F>(mut self, render: F) -> Self
    where
        F: Fn(Option<&Value>, &T, usize) -> String + 'static,
    {
        self.render = Some(Box::new(render));
        self
    }

    pub fn with_width(mut self, width: u16) -> Self {
        self.width = Some(width);
        self
    }

    pub fn has_render(&self) -> bool {
        self.render.is_some()
    }

    /// Cell content for `row` at position `index`
    pub fn cell(&self, row: &T, index: usize) -> String {
        let value = row.field(&self.accessor);
        match &self.render {
            Some(render) => render(value, row, index),
            None => value
                .and_then(display_value)
                .unwrap_or_else(|| MISSING_CELL.to_string()),
        }
    }
}

/// Button-like action nested inside a row
#[derive(Debug, Clone, PartialEq)]
pub struct RowAction {
    pub key: char,
    pub label: String,
    /// When false, triggering the action also counts as a row click
    pub stops_propagation: bool,
}

impl RowAction {
    pub fn new(key: char, label: &str) -> Self {
        Self {
            key,
            label: label.to_string(),
            stops_propagation: true,
        }
    }

    pub fn propagating(mut self) -> Self {
        self.stops_propagation = false;
        self
    }
}

/// Where inside a row a click landed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickTarget {
    Row,
    Cell(usize),
    Action(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableEvent {
    RowClicked(usize),
    Action { key: char, row: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderedRow {
    Cells(Vec<String>),
    /// Single full-width row (empty or loading message)
    Message(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedTable {
    pub headers: Vec<String>,
    pub rows: Vec<RenderedRow>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableLayout {
    Table,
    Cards,
}

pub struct DataTable<T> {
    columns: Vec<Column<T>>,
    actions: Vec<RowAction>,
    row_clickable: bool,
    mobile_card: Option<CardFn<T>>,
    empty_message: String,
    loading_message: String,
}

impl<T: TableRow> DataTable<T> {
    pub fn new(columns: Vec<Column<T>>) -> Self {
        Self {
            columns,
            actions: Vec::new(),
            row_clickable: false,
            mobile_card: None,
            empty_message: "No records found".to_string(),
            loading_message: "Loading...".to_string(),
        }
    }

    pub fn with_actions(mut self, actions: Vec<RowAction>) -> Self {
        self.actions = actions;
        self
    }

    pub fn with_row_click(mut self) -> Self {
        self.row_clickable = true;
        self
    }

    /// Separate renderer for narrow terminals. It is not derived from the
    /// columns, so new columns must be mirrored here by hand.
    pub fn with_mobile_card<F>(mut self, card: F) -> Self
    where
        F: Fn(&T) -> Vec<String> + 'static,
    {
        self.mobile_card = Some(Box::new(card));
        self
    }

    pub fn with_empty_message(mut self, message: &str) -> Self {
        self.empty_message = message.to_string();
        self
    }

    pub fn columns(&self) -> &[Column<T>] {
        &self.columns
    }

    pub fn actions(&self) -> &[RowAction] {
        &self.actions
    }

    pub fn headers(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.header.clone()).collect()
    }

    fn placeholder(&self, loading: bool) -> String {
        if loading {
            self.loading_message.clone()
        } else {
            self.empty_message.clone()
        }
    }

    /// One row per record, one cell per column. Empty data yields exactly one
    /// message row (the loading message while `loading`).
    pub fn render<R: Borrow<T>>(&self, data: &[R], loading: bool) -> RenderedTable {
        let rows = if data.is_empty() {
            vec![RenderedRow::Message(self.placeholder(loading))]
        } else {
            data.iter()
                .enumerate()
                .map(|(index, row)| {
                    RenderedRow::Cells(
                        self.columns
                            .iter()
                            .map(|c| c.cell(row.borrow(), index))
                            .collect(),
                    )
                })
                .collect()
        };

        RenderedTable {
            headers: self.headers(),
            rows,
        }
    }

    /// Card lines per record, or `None` without a mobile renderer
    pub fn render_cards<R: Borrow<T>>(&self, data: &[R], loading: bool) -> Option<Vec<Vec<String>>> {
        let card = self.mobile_card.as_ref()?;
        if data.is_empty() {
            return Some(vec![vec![self.placeholder(loading)]]);
        }
        Some(data.iter().map(|row| card(row.borrow())).collect())
    }

    pub fn layout_for(&self, width: u16, breakpoint: u16) -> TableLayout {
        if width < breakpoint && self.mobile_card.is_some() {
            TableLayout::Cards
        } else {
            TableLayout::Table
        }
    }

    /// Events produced by a click on `row`.
    ///
    /// Actions that stop propagation never produce a row click; a plain click
    /// produces exactly one.
    pub fn dispatch(&self, row_count: usize, row: usize, target: ClickTarget) -> Vec<TableEvent> {
        if row >= row_count {
            return Vec::new();
        }

        let mut events = Vec::new();
        let bubbles = match target {
            ClickTarget::Row | ClickTarget::Cell(_) => true,
            ClickTarget::Action(key) => match self.actions.iter().find(|a| a.key == key) {
                Some(action) => {
                    events.push(TableEvent::Action { key, row });
                    !action.stops_propagation
                }
                None => false,
            },
        };

        if bubbles && self.row_clickable {
            events.push(TableEvent::RowClicked(row));
        }
        events
    }
}
