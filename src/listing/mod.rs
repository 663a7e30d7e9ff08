//! Generic paged resource store
//!
//! Every list screen owns one [`PagedResource`]: it holds the rows, the
//! pagination snapshot, search text, loading/error flags and the pending delete,
//! and talks to the backend through a [`ResourceFetcher`].

pub mod cursor;
pub mod filter;
pub mod timing;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::api::envelope::ListPage;
use crate::api::errors::ApiError;
use crate::models::display_value;
use crate::table::TableRow;

pub use cursor::PaginationCursor;
use filter::FilterMemo;
use timing::Debouncer;

/// Backend operations a list screen needs
#[async_trait]
pub trait ResourceFetcher<T>: Send + Sync {
    async fn fetch_page(&self, query: &ListQuery) -> Result<ListPage<T>, ApiError>;

    /// Delete one record; returns the server message when there is one
    async fn delete_item(&self, key: &str) -> Result<Option<String>, ApiError>;
}

/// Parameters of one list request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub page: u32,
    pub page_size: u32,
    pub search: Option<String>,
    pub filters: BTreeMap<String, String>,
}

impl ListQuery {
    pub fn first_page(page_size: u32) -> Self {
        Self {
            page: 1,
            page_size,
            search: None,
            filters: BTreeMap::new(),
        }
    }
}

/// What a failed fetch does to rows already on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPolicy {
    KeepStale,
    Clear,
}

#[derive(Error, Debug)]
#[error("Unknown error policy '{0}' (expected keep-stale or clear)")]
pub struct ParseErrorPolicyError(String);

impl FromStr for ErrorPolicy {
    type Err = ParseErrorPolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "keep-stale" | "keep_stale" | "keep" | "stale" => Ok(ErrorPolicy::KeepStale),
            "clear" => Ok(ErrorPolicy::Clear),
            other => Err(ParseErrorPolicyError(other.to_string())),
        }
    }
}

impl fmt::Display for ErrorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorPolicy::KeepStale => write!(f, "keep-stale"),
            ErrorPolicy::Clear => write!(f, "clear"),
        }
    }
}

/// Store behaviour for one resource
#[derive(Debug, Clone)]
pub struct ListingOptions {
    pub page_size: u32,
    /// Search is sent to the server (debounced) instead of filtered locally
    pub server_search: bool,
    /// Fields matched by the local filter
    pub search_fields: Vec<String>,
    pub error_policy: ErrorPolicy,
    pub debounce: Duration,
}

impl Default for ListingOptions {
    fn default() -> Self {
        Self {
            page_size: 20,
            server_search: false,
            search_fields: vec!["name".to_string(), "status".to_string()],
            error_policy: ErrorPolicy::KeepStale,
            debounce: Duration::from_millis(500),
        }
    }
}

/// Identifies one in-flight fetch; older tickets are discarded on arrival
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    seq: u64,
    pub query: ListQuery,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Loaded { count: usize },
    Failed { message: String },
    /// A newer fetch started after this one; the result was dropped
    Stale,
}

pub struct PagedResource<T> {
    items: Vec<T>,
    loading: bool,
    error: Option<String>,
    search: String,
    debounced_search: String,
    page: u32,
    pagination: Option<PaginationCursor>,
    filters: BTreeMap<String, String>,
    delete_loading_id: Option<String>,
    pending_delete: Option<String>,
    options: ListingOptions,
    debouncer: Debouncer,
    revision: u64,
    seq: u64,
    memo: FilterMemo,
}

impl<T: TableRow> PagedResource<T> {
    pub fn new(options: ListingOptions) -> Self {
        Self {
            items: Vec::new(),
            loading: false,
            error: None,
            search: String::new(),
            debounced_search: String::new(),
            page: 1,
            pagination: None,
            filters: BTreeMap::new(),
            delete_loading_id: None,
            pending_delete: None,
            debouncer: Debouncer::new(options.debounce),
            options,
            revision: 0,
            seq: 0,
            memo: FilterMemo::new(),
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn pagination(&self) -> Option<&PaginationCursor> {
        self.pagination.as_ref()
    }

    pub fn options(&self) -> &ListingOptions {
        &self.options
    }

    pub fn delete_loading_id(&self) -> Option<&str> {
        self.delete_loading_id.as_deref()
    }

    pub fn pending_delete(&self) -> Option<&str> {
        self.pending_delete.as_deref()
    }

    /// Query for the current page/search/filters
    pub fn query(&self) -> ListQuery {
        let search = if self.options.server_search && !self.debounced_search.trim().is_empty() {
            Some(self.debounced_search.trim().to_string())
        } else {
            None
        };

        ListQuery {
            page: self.page,
            page_size: self.options.page_size,
            search,
            filters: self.filters.clone(),
        }
    }

    /// Rows after the local search and filters (identity for server-searched resources)
    pub fn visible(&self) -> Vec<&T> {
        if self.options.server_search {
            return self.items.iter().collect();
        }
        self.memo
            .indices(&self.items, self.revision, &self.options.search_fields, &self.search)
            .into_iter()
            .filter_map(|i| self.items.get(i))
            .filter(|row| self.matches_filters(*row))
            .collect()
    }

    fn matches_filters(&self, row: &T) -> bool {
        self.filters.iter().all(|(key, wanted)| {
            row.field(key)
                .and_then(display_value)
                .map(|v| v.eq_ignore_ascii_case(wanted))
                .unwrap_or(false)
        })
    }

    /// Current value of a filter
    pub fn filter(&self, key: &str) -> Option<&str> {
        self.filters.get(key).map(String::as_str)
    }

    /// A server search is waiting for the debounce to settle
    pub fn search_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// Record a keystroke in the search box.
    ///
    /// Local filtering reacts immediately; server search waits for the debounce.
    pub fn set_search(&mut self, text: &str, now: Instant) {
        self.search = text.to_string();
        if !self.options.server_search {
            return;
        }
        if self.search == self.debounced_search {
            // Back to what is already on screen
            self.debouncer.cancel();
        } else {
            self.debouncer.input(now);
        }
    }

    /// Returns true when a debounced search changed and the first page must be fetched
    pub fn poll_search(&mut self, now: Instant) -> bool {
        if !self.debouncer.fire(now) || self.search == self.debounced_search {
            return false;
        }
        debug!("Search settled on '{}'", self.search);
        self.debounced_search = self.search.clone();
        self.page = 1;
        true
    }

    /// Set or clear (`None`) a filter; returns true when a refetch is needed
    pub fn set_filter(&mut self, key: &str, value: Option<&str>) -> bool {
        let changed = match value {
            Some(v) => self.filters.insert(key.to_string(), v.to_string()).as_deref() != Some(v),
            None => self.filters.remove(key).is_some(),
        };
        if changed {
            self.page = 1;
        }
        changed
    }

    /// Accept a page change inside `1..=total_pages`. Returns false (and leaves
    /// the state untouched) for anything else; no fetch should follow.
    pub fn handle_page_change(&mut self, page: u32) -> bool {
        let in_range = match &self.pagination {
            Some(cursor) => cursor.contains(page),
            None => page == 1,
        };
        if !in_range || page == self.page {
            debug!("Rejected page change to {}", page);
            return false;
        }
        self.page = page;
        true
    }

    pub fn next_page(&mut self) -> bool {
        match self.pagination.as_ref().and_then(PaginationCursor::next_page) {
            Some(page) => self.handle_page_change(page),
            None => false,
        }
    }

    pub fn previous_page(&mut self) -> bool {
        match self.pagination.as_ref().and_then(PaginationCursor::previous_page) {
            Some(page) => self.handle_page_change(page),
            None => false,
        }
    }

    /// Start a fetch for the current query
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.seq += 1;
        self.loading = true;
        FetchTicket {
            seq: self.seq,
            query: self.query(),
        }
    }

    /// Apply a fetch result; results for superseded tickets are dropped
    pub fn finish_fetch(
        &mut self,
        ticket: FetchTicket,
        result: Result<ListPage<T>, ApiError>,
    ) -> FetchOutcome {
        if ticket.seq != self.seq {
            debug!("Dropping stale response for page {}", ticket.query.page);
            return FetchOutcome::Stale;
        }
        self.loading = false;

        match result {
            Ok(page) => {
                let count = page.items.len();
                self.items = page.items;
                self.pagination = page.pagination;
                if let Some(cursor) = &self.pagination {
                    self.page = cursor.current_page;
                }
                self.error = None;
                self.revision += 1;
                FetchOutcome::Loaded { count }
            }
            Err(err) => {
                let message = err.user_message();
                warn!("Fetch failed: {}", err);
                self.error = Some(message.clone());
                if self.options.error_policy == ErrorPolicy::Clear {
                    self.items.clear();
                    self.pagination = None;
                    self.revision += 1;
                }
                FetchOutcome::Failed { message }
            }
        }
    }

    /// Fetch the current page and replace the rows
    pub async fn load<F>(&mut self, fetcher: &F) -> FetchOutcome
    where
        F: ResourceFetcher<T> + ?Sized,
    {
        let ticket = self.begin_fetch();
        let result = fetcher.fetch_page(&ticket.query).await;
        self.finish_fetch(ticket, result)
    }

    /// Ask for confirmation before deleting `key`
    pub fn request_delete(&mut self, key: &str) {
        self.pending_delete = Some(key.to_string());
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    /// Delete the confirmed record, then refetch the current page.
    ///
    /// Returns the toast text on success, the error message otherwise.
    pub async fn confirm_delete<F>(&mut self, fetcher: &F) -> Result<String, String>
    where
        F: ResourceFetcher<T> + ?Sized,
    {
        let Some(key) = self.pending_delete.take() else {
            return Err("Nothing to delete".to_string());
        };

        self.delete_loading_id = Some(key.clone());
        let result = fetcher.delete_item(&key).await;
        self.delete_loading_id = None;

        match result {
            Ok(message) => {
                info!("Deleted {}", key);
                let toast = message.unwrap_or_else(|| "Deleted successfully".to_string());
                if let FetchOutcome::Failed { message } = self.load(fetcher).await {
                    return Ok(format!("{} (refresh failed: {})", toast, message));
                }
                Ok(toast)
            }
            Err(err) => {
                warn!("Delete of {} failed: {}", key, err);
                Err(err.user_message())
            }
        }
    }

    /// Total row count plus per-value counts of `field` (stat cards)
    pub fn stat_counts(&self, field: &str) -> (usize, Vec<(String, usize)>) {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for row in &self.items {
            let value = row
                .field(field)
                .and_then(display_value)
                .unwrap_or_else(|| "unknown".to_string());
            *counts.entry(value).or_default() += 1;
        }
        let total = self
            .pagination
            .as_ref()
            .map(|p| p.total_count as usize)
            .unwrap_or(self.items.len());
        (total, counts.into_iter().collect())
    }
}
