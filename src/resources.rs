//! Catalogue of backend resources
//!
//! Each [`Resource`] knows its endpoint, how it is listed (server pagination,
//! server search or a local search allowlist), how its rows are keyed, how
//! create/update bodies are encoded and which columns the list screen shows.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use crate::api::envelope::{decode_item, decode_list, ListPage};
use crate::api::{ApiClient, ApiError, BodyEncoding, RequestBody};
use crate::config::Config;
use crate::forms::{typed, FormKind};
use crate::listing::{ListQuery, ListingOptions, ResourceFetcher};
use crate::models::{display_value, Partner, Record, RevenueRecord};
use crate::table::{Column, DataTable, RowAction, MISSING_CELL};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Stations,
    Discounts,
    Packages,
    LateFees,
    RentalIssues,
    StationIssues,
    Media,
    Partners,
    Vendors,
    Franchises,
    Revenue,
    PartnerStations,
    Transactions,
    Amenities,
    Achievements,
    Points,
    Referrals,
    Leaderboard,
}

#[derive(Error, Debug)]
#[error("Unknown resource '{0}'. Run `pb-admin resources` to see the list")]
pub struct UnknownResource(String);

impl Resource {
    pub const ALL: [Resource; 18] = [
        Resource::Stations,
        Resource::Discounts,
        Resource::Packages,
        Resource::LateFees,
        Resource::RentalIssues,
        Resource::StationIssues,
        Resource::Media,
        Resource::Partners,
        Resource::Vendors,
        Resource::Franchises,
        Resource::Revenue,
        Resource::PartnerStations,
        Resource::Transactions,
        Resource::Amenities,
        Resource::Achievements,
        Resource::Points,
        Resource::Referrals,
        Resource::Leaderboard,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            Resource::Stations => "stations",
            Resource::Discounts => "discounts",
            Resource::Packages => "packages",
            Resource::LateFees => "late-fees",
            Resource::RentalIssues => "rental-issues",
            Resource::StationIssues => "station-issues",
            Resource::Media => "media",
            Resource::Partners => "partners",
            Resource::Vendors => "vendors",
            Resource::Franchises => "franchises",
            Resource::Revenue => "revenue",
            Resource::PartnerStations => "partner-stations",
            Resource::Transactions => "transactions",
            Resource::Amenities => "amenities",
            Resource::Achievements => "achievements",
            Resource::Points => "points",
            Resource::Referrals => "referrals",
            Resource::Leaderboard => "leaderboard",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Resource::Stations => "Stations",
            Resource::Discounts => "Discounts",
            Resource::Packages => "Rental Packages",
            Resource::LateFees => "Late Fee Configs",
            Resource::RentalIssues => "Rental Issues",
            Resource::StationIssues => "Station Issues",
            Resource::Media => "Media Uploads",
            Resource::Partners => "Partners",
            Resource::Vendors => "Vendors",
            Resource::Franchises => "Franchises",
            Resource::Revenue => "Partner Revenue",
            Resource::PartnerStations => "Station Distributions",
            Resource::Transactions => "Transactions",
            Resource::Amenities => "Amenities",
            Resource::Achievements => "Achievements",
            Resource::Points => "Points History",
            Resource::Referrals => "Referral Analytics",
            Resource::Leaderboard => "User Leaderboard",
        }
    }

    /// Collection endpoint
    pub fn path(self) -> &'static str {
        match self {
            Resource::Stations => "/api/admin/stations",
            Resource::Discounts => "/api/discounts",
            Resource::Packages => "/api/rental-packages",
            Resource::LateFees => "/api/admin/late-fee-configs",
            Resource::RentalIssues => "/api/admin/rentals/issues",
            Resource::StationIssues => "/api/admin/stations/issues",
            Resource::Media => "/api/admin/media/uploads",
            Resource::Partners => "/api/admin/partners",
            Resource::Vendors => "/api/admin/partners/vendor",
            Resource::Franchises => "/api/admin/partners/franchise",
            Resource::Revenue => "/api/admin/partners/revenue-analytics",
            Resource::PartnerStations => "/api/admin/partners/stations",
            Resource::Transactions => "/api/admin/transactions",
            Resource::Amenities => "/api/admin/amenities",
            Resource::Achievements => "/api/admin/achievements",
            Resource::Points => "/api/admin/points/history",
            Resource::Referrals => "/api/admin/referrals/analytics",
            Resource::Leaderboard => "/api/admin/users/leaderboard",
        }
    }

    /// Server-side pagination (`page` / `page_size` are sent)
    pub fn paginated(self) -> bool {
        matches!(
            self,
            Resource::Packages
                | Resource::LateFees
                | Resource::Media
                | Resource::Partners
                | Resource::Vendors
                | Resource::Franchises
                | Resource::Revenue
                | Resource::PartnerStations
                | Resource::Transactions
                | Resource::Points
        )
    }

    /// Search text is sent as `search`; everything else filters locally
    pub fn server_search(self) -> bool {
        matches!(
            self,
            Resource::Partners
                | Resource::Vendors
                | Resource::Franchises
                | Resource::Transactions
                | Resource::Media
                | Resource::Leaderboard
        )
    }

    /// Fields matched by the local search
    pub fn search_fields(self) -> &'static [&'static str] {
        match self {
            Resource::Stations => &["station_name", "serial_number", "address", "status"],
            Resource::Discounts => &["station_name", "package_name", "status"],
            Resource::Packages => &["name", "package_type", "payment_model"],
            Resource::LateFees => &["name", "fee_type"],
            Resource::RentalIssues => &["rental_code", "issue_type", "status"],
            Resource::StationIssues => &["station_name", "issue_type", "priority", "status"],
            Resource::Revenue => &["partner_name", "period"],
            Resource::PartnerStations => &["partner_name", "station_name", "status"],
            Resource::Amenities | Resource::Achievements => &["name", "description"],
            Resource::Points => &["username", "transaction_type", "source"],
            Resource::Referrals => &["referrer_username", "referral_code"],
            _ => &["name", "status"],
        }
    }

    /// Natural identifier used in item paths
    pub fn key_field(self) -> &'static str {
        match self {
            Resource::Stations => "serial_number",
            _ => "id",
        }
    }

    pub fn body_encoding(self) -> BodyEncoding {
        match self {
            Resource::Discounts | Resource::Packages | Resource::Media => BodyEncoding::Multipart,
            _ => BodyEncoding::Json,
        }
    }

    pub fn form(self) -> Option<FormKind> {
        match self {
            Resource::Stations => Some(FormKind::Station),
            Resource::Discounts => Some(FormKind::Discount),
            Resource::Packages => Some(FormKind::Package),
            Resource::LateFees => Some(FormKind::LateFee),
            _ => None,
        }
    }

    pub fn can_delete(self) -> bool {
        matches!(
            self,
            Resource::Stations
                | Resource::Discounts
                | Resource::Packages
                | Resource::LateFees
                | Resource::Media
                | Resource::Amenities
                | Resource::Achievements
        )
    }

    /// Lists that poll on the refresh interval
    pub fn auto_refresh(self) -> bool {
        matches!(self, Resource::Stations)
    }

    /// Field summarised by the stat cards
    pub fn status_field(self) -> Option<&'static str> {
        match self {
            Resource::Packages | Resource::LateFees | Resource::Amenities | Resource::Achievements => {
                Some("is_active")
            }
            Resource::Revenue | Resource::Referrals | Resource::Leaderboard | Resource::Points => None,
            Resource::Media => Some("file_type"),
            _ => Some("status"),
        }
    }

    /// Value of the key field, if the row has one
    pub fn row_key(self, record: &Record) -> Option<String> {
        record
            .text(self.key_field())
            .filter(|key| !key.trim().is_empty())
    }

    /// `<base>/<key>` with the key percent-encoded as one path segment
    pub fn item_path(self, key: &str) -> Result<String, ApiError> {
        let key = key.trim();
        let invalid = || {
            ApiError::InvalidRequest(format!("'{}' is not a valid {} key", key, self.key_field()))
        };
        if key.is_empty() || key.contains('/') || key == "." || key == ".." {
            return Err(invalid());
        }

        let mut url = reqwest::Url::parse("http://localhost").map_err(|_| invalid())?;
        url.set_path(self.path());
        url.path_segments_mut().map_err(|_| invalid())?.push(key);
        Ok(url.path().to_string())
    }

    pub fn listing_options(self, config: &Config) -> ListingOptions {
        ListingOptions {
            page_size: config.listing.page_size,
            server_search: self.server_search(),
            search_fields: self.search_fields().iter().map(|f| f.to_string()).collect(),
            error_policy: config.listing.error_policy,
            debounce: config.search_debounce(),
        }
    }

    /// Row actions offered by the list screen
    pub fn row_actions(self) -> Vec<RowAction> {
        let mut actions = Vec::new();
        if self.form().is_some() {
            actions.push(RowAction::new('e', "Edit"));
        }
        if self.can_delete() {
            actions.push(RowAction::new('x', "Delete"));
        }
        actions
    }

    /// Table definition for the list screen and exports
    pub fn table(self) -> DataTable<Record> {
        let mut columns = self.columns();
        let actions = self.row_actions();
        if !actions.is_empty() {
            columns.push(actions_column(&actions));
        }

        let mut table = DataTable::new(columns)
            .with_actions(actions)
            .with_row_click()
            .with_empty_message(&format!("No {} found", self.title().to_lowercase()));

        match self {
            Resource::Stations => {
                table = table.with_mobile_card(|row: &Record| {
                    vec![
                        text_or_missing(row, "station_name"),
                        format!(
                            "{} · {}",
                            text_or_missing(row, "serial_number"),
                            status_label(&text_or_missing(row, "status"))
                        ),
                        format!("Slots {}", slots(row)),
                    ]
                })
            }
            Resource::Discounts => {
                table = table.with_mobile_card(|row: &Record| {
                    vec![
                        format!(
                            "{} → {}",
                            text_or_missing(row, "station_name"),
                            text_or_missing(row, "package_name")
                        ),
                        format!(
                            "{} off · {}",
                            percent(row.get("discount_percent")),
                            status_label(&text_or_missing(row, "status"))
                        ),
                    ]
                })
            }
            Resource::Packages => {
                table = table.with_mobile_card(|row: &Record| {
                    vec![
                        text_or_missing(row, "name"),
                        format!(
                            "{} min · {}",
                            text_or_missing(row, "duration_minutes"),
                            money(row.get("price"))
                        ),
                    ]
                })
            }
            Resource::Partners | Resource::Vendors | Resource::Franchises => {
                table = table.with_mobile_card(|row: &Record| {
                    let partner: Partner = typed(row);
                    vec![
                        partner.business_name,
                        format!(
                            "{} · {} share · {}",
                            status_label(&partner.partner_type),
                            percent(partner.revenue_share_percent.map(Value::String).as_ref()),
                            status_label(&partner.status)
                        ),
                        partner.contact_phone.unwrap_or_else(|| MISSING_CELL.to_string()),
                    ]
                })
            }
            Resource::Revenue => {
                table = table.with_mobile_card(|row: &Record| {
                    let revenue: RevenueRecord = typed(row);
                    vec![
                        format!(
                            "{} · {}",
                            revenue.partner_name.unwrap_or_else(|| MISSING_CELL.to_string()),
                            revenue.period.unwrap_or_else(|| MISSING_CELL.to_string())
                        ),
                        format!(
                            "Gross {} · Partner {} · Platform {}",
                            money(revenue.gross_revenue.map(Value::String).as_ref()),
                            money(revenue.partner_share.map(Value::String).as_ref()),
                            money(revenue.platform_share.map(Value::String).as_ref())
                        ),
                    ]
                })
            }
            _ => {}
        }
        table
    }

    fn columns(self) -> Vec<Column<Record>> {
        match self {
            Resource::Stations => vec![
                Column::new("Name", "station_name"),
                Column::new("Serial", "serial_number"),
                Column::new("Address", "address").with_width(28),
                Column::new("Slots", "available_slots").with_render(|_, row: &Record, _| slots(row)),
                status_column(),
                timestamp_column("Last Heartbeat", "last_heartbeat"),
            ],
            Resource::Discounts => vec![
                Column::new("Station", "station_name"),
                Column::new("Package", "package_name"),
                Column::new("Discount", "discount_percent").with_render(|v, _: &Record, _| percent(v)),
                Column::new("Usage", "current_usage_count").with_render(|v, row: &Record, _| {
                    format!(
                        "{}/{}",
                        v.and_then(display_value).unwrap_or_else(|| "0".to_string()),
                        text_or_missing(row, "max_total_uses")
                    )
                }),
                timestamp_column("Valid Until", "valid_until"),
                status_column(),
            ],
            Resource::Packages => vec![
                Column::new("Name", "name"),
                Column::new("Duration", "duration_minutes")
                    .with_render(|v, _: &Record, _| suffixed(v, " min")),
                Column::new("Price", "price").with_render(|v, _: &Record, _| money(v)),
                Column::new("Type", "package_type").with_render(|v, _: &Record, _| label_cell(v)),
                Column::new("Payment", "payment_model").with_render(|v, _: &Record, _| label_cell(v)),
                Column::new("Active", "is_active").with_render(|v, _: &Record, _| yes_no(v)),
            ],
            Resource::LateFees => vec![
                Column::new("Name", "name"),
                Column::new("Type", "fee_type").with_render(|v, _: &Record, _| label_cell(v)),
                Column::new("Multiplier", "multiplier").with_render(|v, _: &Record, _| suffixed(v, "x")),
                Column::new("Flat Rate/h", "flat_rate_per_hour").with_render(|v, _: &Record, _| money(v)),
                Column::new("Max Daily", "max_daily_rate").with_render(|v, _: &Record, _| money(v)),
                Column::new("Grace", "grace_period_minutes")
                    .with_render(|v, _: &Record, _| suffixed(v, " min")),
                Column::new("Active", "is_active").with_render(|v, _: &Record, _| yes_no(v)),
            ],
            Resource::RentalIssues => vec![
                Column::new("Rental", "rental_code"),
                Column::new("Issue", "issue_type").with_render(|v, _: &Record, _| label_cell(v)),
                Column::new("Reported By", "reported_by.username"),
                status_column(),
                timestamp_column("Reported", "created_at"),
            ],
            Resource::StationIssues => vec![
                Column::new("Station", "station_name"),
                Column::new("Issue", "issue_type").with_render(|v, _: &Record, _| label_cell(v)),
                Column::new("Priority", "priority").with_render(|v, _: &Record, _| label_cell(v)),
                status_column(),
                timestamp_column("Reported", "created_at"),
            ],
            Resource::Media => vec![
                Column::new("File", "original_name"),
                Column::new("Type", "file_type"),
                Column::new("Size", "file_size").with_render(|v, _: &Record, _| file_size(v)),
                timestamp_column("Uploaded", "created_at"),
            ],
            Resource::Partners | Resource::Vendors | Resource::Franchises => vec![
                Column::new("Business", "business_name"),
                Column::new("Type", "partner_type").with_render(|v, _: &Record, _| label_cell(v)),
                Column::new("Contact", "contact_person"),
                Column::new("Phone", "contact_phone"),
                Column::new("Share", "revenue_share_percent").with_render(|v, _: &Record, _| percent(v)),
                Column::new("Stations", "station_count"),
                status_column(),
            ],
            Resource::Revenue => vec![
                Column::new("Partner", "partner_name"),
                Column::new("Period", "period"),
                Column::new("Gross", "gross_revenue").with_render(|v, _: &Record, _| money(v)),
                Column::new("Partner Share", "partner_share").with_render(|v, _: &Record, _| money(v)),
                Column::new("Platform Share", "platform_share").with_render(|v, _: &Record, _| money(v)),
                Column::new("Rentals", "rental_count"),
            ],
            Resource::PartnerStations => vec![
                Column::new("Partner", "partner_name"),
                Column::new("Station", "station_name"),
                Column::new("Serial", "station_serial"),
                timestamp_column("Assigned", "assigned_at"),
                status_column(),
            ],
            Resource::Transactions => vec![
                Column::new("Transaction", "transaction_id"),
                Column::new("User", "user.username"),
                Column::new("Type", "transaction_type").with_render(|v, _: &Record, _| label_cell(v)),
                Column::new("Amount", "amount").with_render(|v, _: &Record, _| money(v)),
                Column::new("Method", "payment_method").with_render(|v, _: &Record, _| label_cell(v)),
                status_column(),
                timestamp_column("Date", "created_at"),
            ],
            Resource::Amenities => vec![
                Column::new("Name", "name"),
                Column::new("Icon", "icon"),
                Column::new("Description", "description").with_width(32),
                Column::new("Active", "is_active").with_render(|v, _: &Record, _| yes_no(v)),
            ],
            Resource::Achievements => vec![
                Column::new("Name", "name"),
                Column::new("Criteria", "criteria_type").with_render(|v, _: &Record, _| label_cell(v)),
                Column::new("Target", "criteria_value"),
                Column::new("Reward", "reward_value").with_render(|v, _: &Record, _| suffixed(v, " pts")),
                Column::new("Active", "is_active").with_render(|v, _: &Record, _| yes_no(v)),
            ],
            Resource::Points => vec![
                Column::new("User", "username"),
                Column::new("Type", "transaction_type").with_render(|v, _: &Record, _| label_cell(v)),
                Column::new("Points", "points"),
                Column::new("Source", "source").with_render(|v, _: &Record, _| label_cell(v)),
                timestamp_column("Date", "created_at"),
            ],
            Resource::Referrals => vec![
                Column::new("Referrer", "referrer_username"),
                Column::new("Code", "referral_code"),
                Column::new("Referrals", "total_referrals"),
                Column::new("Completed", "completed_referrals"),
                Column::new("Points", "points_awarded"),
            ],
            Resource::Leaderboard => vec![
                Column::new("Rank", "rank").with_width(6),
                Column::new("User", "username"),
                Column::new("Rentals", "total_rentals"),
                Column::new("Points", "total_points"),
            ],
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.slug())
    }
}

impl FromStr for Resource {
    type Err = UnknownResource;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('_', "-");
        Resource::ALL
            .iter()
            .copied()
            .find(|r| r.slug() == wanted)
            .ok_or_else(|| UnknownResource(s.to_string()))
    }
}

/// Colour family of a status value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTone {
    Positive,
    Warning,
    Negative,
    Neutral,
}

pub fn status_tone(value: &str) -> StatusTone {
    match value.trim().to_lowercase().as_str() {
        "active" | "online" | "completed" | "resolved" | "paid" | "success" | "yes" | "true" => {
            StatusTone::Positive
        }
        "maintenance" | "pending" | "in_progress" | "open" | "scheduled" | "partial" => {
            StatusTone::Warning
        }
        "inactive" | "offline" | "expired" | "failed" | "cancelled" | "rejected" | "suspended"
        | "critical" | "no" | "false" => StatusTone::Negative,
        _ => StatusTone::Neutral,
    }
}

/// `in_progress` → `In Progress`
pub fn status_label(value: &str) -> String {
    value
        .split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Stat card title for one value of a resource's status field
pub fn stat_label(field: &str, value: &str) -> String {
    match (field, value) {
        ("is_active", "true") => "Active".to_string(),
        ("is_active", "false") => "Inactive".to_string(),
        _ => status_label(value),
    }
}

fn yes_no(value: Option<&Value>) -> String {
    match value {
        Some(Value::Bool(true)) => "Yes".to_string(),
        Some(Value::Bool(false)) => "No".to_string(),
        other => other.and_then(display_value).unwrap_or_else(|| MISSING_CELL.to_string()),
    }
}

fn text_or_missing(row: &Record, accessor: &str) -> String {
    row.text(accessor).unwrap_or_else(|| MISSING_CELL.to_string())
}

fn slots(row: &Record) -> String {
    format!(
        "{}/{}",
        text_or_missing(row, "available_slots"),
        text_or_missing(row, "total_slots")
    )
}

fn label_cell(value: Option<&Value>) -> String {
    value
        .and_then(display_value)
        .map(|v| status_label(&v))
        .unwrap_or_else(|| MISSING_CELL.to_string())
}

fn suffixed(value: Option<&Value>, suffix: &str) -> String {
    value
        .and_then(display_value)
        .map(|v| format!("{}{}", v, suffix))
        .unwrap_or_else(|| MISSING_CELL.to_string())
}

fn as_number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn money(value: Option<&Value>) -> String {
    as_number(value)
        .map(|n| format!("{:.2}", n))
        .unwrap_or_else(|| MISSING_CELL.to_string())
}

fn percent(value: Option<&Value>) -> String {
    match as_number(value) {
        Some(n) if n.fract() == 0.0 => format!("{:.0}%", n),
        Some(n) => format!("{:.2}%", n),
        None => MISSING_CELL.to_string(),
    }
}

fn file_size(value: Option<&Value>) -> String {
    let Some(bytes) = as_number(value) else {
        return MISSING_CELL.to_string();
    };
    if bytes >= 1024.0 * 1024.0 {
        format!("{:.1} MB", bytes / (1024.0 * 1024.0))
    } else if bytes >= 1024.0 {
        format!("{:.1} KB", bytes / 1024.0)
    } else {
        format!("{} B", bytes)
    }
}

/// RFC 3339 or naive timestamps as `YYYY-MM-DD HH:MM`; anything else verbatim
pub fn format_timestamp(raw: &str) -> String {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return parsed.format("%Y-%m-%d %H:%M").to_string();
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return parsed.format("%Y-%m-%d %H:%M").to_string();
    }
    raw.to_string()
}

fn status_column() -> Column<Record> {
    Column::new("Status", "status").with_render(|v, _: &Record, _| label_cell(v))
}

fn timestamp_column(header: &str, accessor: &str) -> Column<Record> {
    Column::new(header, accessor).with_render(|v, _: &Record, _| {
        v.and_then(display_value)
            .map(|raw| format_timestamp(&raw))
            .unwrap_or_else(|| MISSING_CELL.to_string())
    })
}

/// Synthetic column listing the row action keys
fn actions_column(actions: &[RowAction]) -> Column<Record> {
    let hint = actions
        .iter()
        .map(|a| format!("[{}] {}", a.key, a.label))
        .collect::<Vec<String>>()
        .join(" ");
    Column::new("Actions", "actions").with_render(move |_, _: &Record, _| hint.clone())
}

/// One resource bound to a client
#[derive(Debug, Clone)]
pub struct ResourceHandle {
    api: ApiClient,
    resource: Resource,
}

impl ResourceHandle {
    pub fn new(api: ApiClient, resource: Resource) -> Self {
        Self { api, resource }
    }

    pub fn resource(&self) -> Resource {
        self.resource
    }

    fn query_params(&self, query: &ListQuery) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if self.resource.paginated() {
            params.push(("page".to_string(), query.page.to_string()));
            params.push(("page_size".to_string(), query.page_size.to_string()));
        }
        if let Some(search) = &query.search {
            params.push(("search".to_string(), search.clone()));
        }
        for (key, value) in &query.filters {
            params.push((key.clone(), value.clone()));
        }
        params
    }

    pub async fn list(&self, query: &ListQuery) -> Result<ListPage<Record>, ApiError> {
        let owned = self.query_params(query);
        let params: Vec<(&str, String)> = owned.iter().map(|(k, v)| (k.as_str(), v.clone())).collect();

        debug!("Listing {} page {}", self.resource, query.page);
        let unwrapped = self.api.get(self.resource.path(), &params).await?;
        decode_list(self.resource.path(), unwrapped, query.page, query.page_size)
    }

    pub async fn get(&self, key: &str) -> Result<Record, ApiError> {
        let path = self.resource.item_path(key)?;
        let unwrapped = self.api.get(&path, &[]).await?;
        decode_item(&path, unwrapped)
    }

    /// Returns the server message, if any
    pub async fn create(&self, body: RequestBody) -> Result<Option<String>, ApiError> {
        let unwrapped = self.api.post(self.resource.path(), body).await?;
        info!("Created {} record", self.resource);
        Ok(unwrapped.message)
    }

    pub async fn update(&self, key: &str, body: RequestBody) -> Result<Option<String>, ApiError> {
        let path = self.resource.item_path(key)?;
        let unwrapped = self.api.patch(&path, body).await?;
        info!("Updated {} {}", self.resource, key);
        Ok(unwrapped.message)
    }

    pub async fn delete(&self, key: &str) -> Result<Option<String>, ApiError> {
        let path = self.resource.item_path(key)?;
        let unwrapped = self.api.delete(&path).await?;
        Ok(unwrapped.message)
    }
}

#[async_trait]
impl ResourceFetcher<Record> for ResourceHandle {
    async fn fetch_page(&self, query: &ListQuery) -> Result<ListPage<Record>, ApiError> {
        self.list(query).await
    }

    async fn delete_item(&self, key: &str) -> Result<Option<String>, ApiError> {
        if !self.resource.can_delete() {
            return Err(ApiError::InvalidRequest(format!(
                "{} cannot be deleted",
                self.resource.title()
            )));
        }
        self.delete(key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Session;
    use crate::table::RenderedRow;
    use mockito::Matcher;
    use serde_json::json;

    #[test]
    fn test_slug_round_trip_and_unknown() {
        for resource in Resource::ALL {
            assert_eq!(resource.slug().parse::<Resource>().unwrap(), resource);
        }
        assert_eq!("late_fees".parse::<Resource>().unwrap(), Resource::LateFees);
        assert!("rentals".parse::<Resource>().is_err());
    }

    #[test]
    fn test_station_key_is_serial_number() {
        let record = Record(json!({ "id": 4, "serial_number": "PB-0009" }));
        assert_eq!(Resource::Stations.row_key(&record).as_deref(), Some("PB-0009"));
        assert_eq!(Resource::Discounts.row_key(&record).as_deref(), Some("4"));

        let missing = Record(json!({ "id": 4, "serial_number": "" }));
        assert_eq!(Resource::Stations.row_key(&missing), None);
    }

    #[test]
    fn test_item_path_rejects_bad_keys() {
        assert_eq!(
            Resource::Stations.item_path("PB-1").unwrap(),
            "/api/admin/stations/PB-1"
        );
        assert!(Resource::Discounts.item_path("../users").is_err());
        assert!(Resource::Discounts.item_path("..").is_err());
        assert!(Resource::Discounts.item_path("  ").is_err());
    }

    #[test]
    fn test_item_path_encodes_key() {
        assert_eq!(
            Resource::Stations.item_path("PB 1%2").unwrap(),
            "/api/admin/stations/PB%201%252"
        );
        assert_eq!(
            Resource::Amenities.item_path("a?b#c").unwrap(),
            "/api/admin/amenities/a%3Fb%23c"
        );
    }

    #[test]
    fn test_body_encoding_per_resource() {
        assert_eq!(Resource::Discounts.body_encoding(), BodyEncoding::Multipart);
        assert_eq!(Resource::Packages.body_encoding(), BodyEncoding::Multipart);
        assert_eq!(Resource::LateFees.body_encoding(), BodyEncoding::Json);
        assert_eq!(Resource::Stations.body_encoding(), BodyEncoding::Json);
    }

    #[test]
    fn test_actions_column_without_field() {
        let table = Resource::Discounts.table();
        let rows = vec![Record(json!({
            "id": 1, "station_name": "Mall", "package_name": "1 Hour",
            "discount_percent": "25.00", "current_usage_count": 3, "max_total_uses": 10,
            "valid_until": "2026-12-31T00:00:00Z", "status": "active"
        }))];
        let rendered = table.render(&rows, false);

        assert_eq!(rendered.headers.last().map(String::as_str), Some("Actions"));
        match &rendered.rows[0] {
            RenderedRow::Cells(cells) => {
                assert_eq!(cells[2], "25%");
                assert_eq!(cells[3], "3/10");
                assert_eq!(cells[4], "2026-12-31 00:00");
                assert_eq!(cells[5], "Active");
                assert_eq!(cells[6], "[e] Edit [x] Delete");
            }
            other => panic!("unexpected row: {:?}", other),
        }
    }

    #[test]
    fn test_read_only_resources_have_no_actions() {
        let table = Resource::Revenue.table();
        assert!(table.actions().is_empty());
        assert!(!table.headers().contains(&"Actions".to_string()));
    }

    #[test]
    fn test_partner_and_revenue_cards() {
        let partners = vec![Record(json!({
            "name": "Kathmandu Cafe", "partner_type": "vendor",
            "revenue_share_percent": "12.50", "status": "active", "contact_phone": "9800000000"
        }))];
        let cards = Resource::Vendors.table().render_cards(&partners, false).unwrap();
        assert_eq!(cards[0][0], "Kathmandu Cafe");
        assert_eq!(cards[0][1], "Vendor · 12.50% share · Active");

        let revenue = vec![Record(json!({ "partner_name": "Kathmandu Cafe", "gross_revenue": 1520.5 }))];
        let cards = Resource::Revenue.table().render_cards(&revenue, false).unwrap();
        assert_eq!(cards[0][1], format!("Gross 1520.50 · Partner {} · Platform {}", MISSING_CELL, MISSING_CELL));
    }

    #[test]
    fn test_active_column_and_stat_labels() {
        let rows = vec![Record(json!({ "name": "WiFi", "is_active": false }))];
        let rendered = Resource::Amenities.table().render(&rows, false);
        match &rendered.rows[0] {
            RenderedRow::Cells(cells) => assert_eq!(cells[3], "No"),
            other => panic!("unexpected row {:?}", other),
        }
        assert_eq!(stat_label("is_active", "true"), "Active");
        assert_eq!(stat_label("is_active", "false"), "Inactive");
        assert_eq!(stat_label("status", "in_progress"), "In Progress");
    }

    #[test]
    fn test_listing_options_follow_config() {
        let mut config = Config::default();
        config.listing.search_debounce_ms = 250;
        config.listing.page_size = 50;
        let options = Resource::Partners.listing_options(&config);
        assert_eq!(options.debounce, std::time::Duration::from_millis(250));
        assert_eq!(options.page_size, 50);
        assert!(options.server_search);
    }

    #[test]
    fn test_status_helpers() {
        assert_eq!(status_label("in_progress"), "In Progress");
        assert_eq!(status_label("ACTIVE"), "Active");
        assert_eq!(status_tone("Maintenance"), StatusTone::Warning);
        assert_eq!(status_tone("offline"), StatusTone::Negative);
        assert_eq!(status_tone("weird"), StatusTone::Neutral);
    }

    #[tokio::test]
    async fn test_paginated_list_sends_page_params() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/rental-packages")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("page".into(), "2".into()),
                Matcher::UrlEncoded("page_size".into(), "20".into()),
            ]))
            .with_status(200)
            .with_body(
                json!({
                    "success": true,
                    "message": "Packages retrieved",
                    "data": {
                        "results": [{ "id": 21, "name": "Day Pass" }],
                        "pagination": { "current_page": 2, "total_pages": 2, "total_count": 21, "page_size": 20 }
                    }
                })
                .to_string(),
            )
            .expect(1)
            .create_async()
            .await;

        let api = ApiClient::with_base_url(&server.url(), Session::bearer("tok")).unwrap();
        let handle = ResourceHandle::new(api, Resource::Packages);
        let query = ListQuery {
            page: 2,
            ..ListQuery::first_page(20)
        };
        let page = handle.fetch_page(&query).await.unwrap();

        assert_eq!(page.items[0].text("name").as_deref(), Some("Day Pass"));
        let cursor = page.pagination.unwrap();
        assert!(cursor.has_previous);
        assert!(!cursor.has_next);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_station_detail_by_serial() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/admin/stations/PB-0001")
            .with_status(200)
            .with_body(r#"{"success":true,"data":{"serial_number":"PB-0001","status":"online"}}"#)
            .expect(1)
            .create_async()
            .await;

        let api = ApiClient::with_base_url(&server.url(), Session::bearer("tok")).unwrap();
        let handle = ResourceHandle::new(api, Resource::Stations);
        let record = handle.get("PB-0001").await.unwrap();

        assert_eq!(record.text("status").as_deref(), Some("online"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_detail_key_is_encoded_in_url() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/admin/stations/PB%201%25")
            .with_status(200)
            .with_body(r#"{"success":true,"data":{"serial_number":"PB 1%","status":"offline"}}"#)
            .expect(1)
            .create_async()
            .await;

        let api = ApiClient::with_base_url(&server.url(), Session::bearer("tok")).unwrap();
        let handle = ResourceHandle::new(api, Resource::Stations);
        let record = handle.get("PB 1%").await.unwrap();

        assert_eq!(record.text("serial_number").as_deref(), Some("PB 1%"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_read_only_delete_is_refused_locally() {
        let mut server = mockito::Server::new_async().await;
        let mock = server.mock("DELETE", Matcher::Any).expect(0).create_async().await;

        let api = ApiClient::with_base_url(&server.url(), Session::bearer("tok")).unwrap();
        let handle = ResourceHandle::new(api, Resource::Transactions);
        assert!(handle.delete_item("5").await.is_err());
        mock.assert_async().await;
    }
}
