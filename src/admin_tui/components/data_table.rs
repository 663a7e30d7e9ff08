//! Table component drawing a [`DataTable`] with a row selection

use ratatui::{
    layout::{Alignment, Constraint, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Cell, List, ListItem, ListState, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::admin_tui::traits::Navigable;
use crate::admin_tui::ui::{content_widths, truncate_to_width, Styles};
use crate::models::Record;
use crate::resources::status_tone;
use crate::table::{DataTable, RenderedRow, TableLayout};

const MAX_COLUMN_WIDTH: u16 = 28;

/// Selection and scroll state for one table on screen
#[derive(Debug, Default)]
pub struct TableView {
    table_state: TableState,
    card_state: ListState,
    row_count: usize,
}

/// What to draw besides the rows
pub struct TableChrome<'a> {
    pub title: &'a str,
    pub focused: bool,
    pub loading: bool,
    pub breakpoint: u16,
    /// Column whose cells are coloured by status
    pub tone_column: Option<usize>,
}

impl TableView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of data rows after the last draw or [`TableView::set_row_count`]
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn set_row_count(&mut self, count: usize) {
        self.row_count = count;
        self.clamp_selection();
    }

    pub fn draw(&mut self, f: &mut Frame, area: Rect, table: &DataTable<Record>, rows: &[&Record], chrome: &TableChrome) {
        self.set_row_count(rows.len());

        let block = Block::default()
            .title(Span::styled(chrome.title.to_string(), Styles::title()))
            .borders(Borders::ALL)
            .border_style(if chrome.focused {
                Styles::active_border()
            } else {
                Styles::inactive_border()
            });

        match table.layout_for(area.width, chrome.breakpoint) {
            TableLayout::Cards => {
                let cards = table.render_cards(rows, chrome.loading).unwrap_or_default();
                self.draw_cards(f, area, block, cards, rows.is_empty());
            }
            TableLayout::Table => {
                let rendered = table.render(rows, chrome.loading);
                self.draw_table(f, area, block, rendered.headers, rendered.rows, chrome.tone_column);
            }
        }
    }

    fn draw_table(
        &mut self,
        f: &mut Frame,
        area: Rect,
        block: Block,
        headers: Vec<String>,
        rows: Vec<RenderedRow>,
        tone_column: Option<usize>,
    ) {
        let header = Row::new(headers.iter().map(|h| Cell::from(h.clone()).style(Styles::header())));

        let cells: Vec<Vec<String>> = rows
            .into_iter()
            .filter_map(|row| match row {
                RenderedRow::Cells(cells) => Some(cells),
                RenderedRow::Message(message) => {
                    // Loading / empty placeholder
                    let inner = block.inner(area);
                    f.render_widget(block.clone(), area);
                    let placeholder = Paragraph::new(vec![Line::from(""), Line::from(message)])
                        .style(Styles::inactive())
                        .alignment(Alignment::Center);
                    f.render_widget(placeholder, inner);
                    None
                }
            })
            .collect();
        if cells.is_empty() {
            return;
        }

        let widths = content_widths(&headers, &cells, MAX_COLUMN_WIDTH);
        let body: Vec<Row> = cells
            .into_iter()
            .map(|row| {
                Row::new(row.into_iter().enumerate().map(|(i, text)| {
                    let width = widths.get(i).copied().unwrap_or(MAX_COLUMN_WIDTH) as usize;
                    let style = if Some(i) == tone_column {
                        Styles::tone(status_tone(&text.replace(' ', "_")))
                    } else {
                        Style::default()
                    };
                    Cell::from(truncate_to_width(&text, width)).style(style)
                }))
            })
            .collect();

        let table = Table::new(body, widths.iter().map(|w| Constraint::Length(*w)))
            .header(header)
            .block(block)
            .column_spacing(2)
            .highlight_style(Styles::selected())
            .highlight_symbol("▶ ");

        f.render_stateful_widget(table, area, &mut self.table_state);
    }

    fn draw_cards(&mut self, f: &mut Frame, area: Rect, block: Block, cards: Vec<Vec<String>>, empty: bool) {
        let width = block.inner(area).width.saturating_sub(2) as usize;
        let items: Vec<ListItem> = cards
            .into_iter()
            .map(|lines| {
                let mut text: Vec<Line> = lines
                    .iter()
                    .enumerate()
                    .map(|(i, line)| {
                        let style = if i == 0 && !empty { Styles::title() } else { Style::default() };
                        Line::from(Span::styled(truncate_to_width(line, width), style))
                    })
                    .collect();
                text.push(Line::from(""));
                ListItem::new(text)
            })
            .collect();

        let list = List::new(items).block(block).highlight_style(Styles::selected());
        if empty {
            f.render_widget(list, area);
        } else {
            self.card_state.select(self.table_state.selected());
            f.render_stateful_widget(list, area, &mut self.card_state);
        }
    }
}

impl Navigable for TableView {
    fn get_selected_index(&self) -> Option<usize> {
        self.table_state.selected()
    }

    fn set_selected_index(&mut self, index: Option<usize>) {
        self.table_state.select(index);
        self.card_state.select(index);
    }

    fn get_item_count(&self) -> usize {
        self.row_count
    }
}
