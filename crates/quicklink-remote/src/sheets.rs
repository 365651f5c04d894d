//! Google Sheets backend: one sheet per record type, header row first.

use std::{collections::HashMap, time::Duration};

use chrono::NaiveDate;
use quicklink_core::{CoreError, DocumentBackend, DocumentStore};
use quicklink_domain::{Category, Collection, PaymentFrequency, Shortcut};
use reqwest::blocking::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::{
    http::{self, build_client, probe_request, send, send_json},
    ConnectionProbe, ConnectionStatus, RemoteError,
};

pub const SHORTCUTS_SHEET: &str = "Shortcuts";
pub const CATEGORIES_SHEET: &str = "Categories";
pub const SHORTCUT_HEADERS: [&str; 7] = [
    "id",
    "name",
    "url",
    "paymentDate",
    "paymentAmount",
    "paymentFrequency",
    "categoryId",
];
pub const CATEGORY_HEADERS: [&str; 2] = ["id", "name"];
const DEFAULT_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];

fn shortcut_aliases(header: &str) -> &'static [&'static str] {
    match header {
        "id" => &["id"],
        "name" => &["name", "title"],
        "url" => &["url"],
        "paymentDate" => &["paymentdate", "payment date"],
        "paymentAmount" => &["paymentamount", "payment amount"],
        "paymentFrequency" => &["paymentfrequency", "payment frequency"],
        "categoryId" => &["categoryid", "category id"],
        _ => &[],
    }
}

fn category_aliases(header: &str) -> &'static [&'static str] {
    match header {
        "id" => &["id"],
        "name" => &["name"],
        _ => &[],
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SheetsSettings {
    pub api_base: String,
    pub spreadsheet_id: String,
    pub access_token: String,
}

impl SheetsSettings {
    pub fn validate(
        spreadsheet_id: Option<&str>,
        access_token: Option<&str>,
    ) -> Result<Self, RemoteError> {
        let id = spreadsheet_id.map(str::trim).unwrap_or_default();
        let token = access_token.map(str::trim).unwrap_or_default();
        if id.is_empty() || token.is_empty() {
            return Err(RemoteError::NotConfigured(
                "Google Sheets (set SHEETS_SPREADSHEET_ID and SHEETS_ACCESS_TOKEN)".into(),
            ));
        }
        Ok(Self {
            api_base: DEFAULT_API_BASE.to_string(),
            spreadsheet_id: id.to_string(),
            access_token: token.to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct BatchGetResponse {
    #[serde(default, rename = "valueRanges")]
    value_ranges: Vec<ValueRange>,
}

#[derive(Debug, Default, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.trim().to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Maps each expected header onto its column, matching aliases case-insensitively.
fn header_index(
    header_row: &[Value],
    expected: &[&str],
    aliases: fn(&str) -> &'static [&'static str],
) -> HashMap<String, usize> {
    let lowered: Vec<String> = header_row
        .iter()
        .map(|cell| cell_text(cell).to_lowercase())
        .collect();
    let mut mapping = HashMap::new();
    for header in expected {
        let candidates = aliases(header);
        if let Some(index) = candidates
            .iter()
            .find_map(|name| lowered.iter().position(|cell| cell == &name.to_lowercase()))
        {
            mapping.insert((*header).to_string(), index);
        }
    }
    mapping
}

/// Turns sheet rows into field maps; a sheet without an `id` header is empty.
fn rows_to_records(
    rows: &[Vec<Value>],
    expected: &[&str],
    aliases: fn(&str) -> &'static [&'static str],
) -> Vec<HashMap<String, String>> {
    let Some((header_row, data)) = rows.split_first() else {
        return Vec::new();
    };
    let mapping = header_index(header_row, expected, aliases);
    if !mapping.contains_key("id") {
        return Vec::new();
    }
    data.iter()
        .map(|row| {
            mapping
                .iter()
                .filter_map(|(header, index)| {
                    let text = row.get(*index).map(cell_text).unwrap_or_default();
                    (!text.is_empty()).then(|| (header.clone(), text))
                })
                .collect::<HashMap<_, _>>()
        })
        .filter(|record| record.contains_key("id"))
        .collect()
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
}

fn record_to_shortcut(mut record: HashMap<String, String>) -> Shortcut {
    let mut take = |key: &str| record.remove(key);
    Shortcut {
        id: take("id").unwrap_or_default(),
        name: take("name").unwrap_or_default(),
        url: take("url").unwrap_or_default(),
        payment_date: take("paymentDate").as_deref().and_then(parse_date),
        payment_amount: take("paymentAmount")
            .and_then(|raw| raw.parse::<f64>().ok())
            .filter(|amount| amount.is_finite()),
        payment_frequency: take("paymentFrequency")
            .and_then(|raw| raw.parse::<PaymentFrequency>().ok()),
        category_id: take("categoryId"),
    }
}

/// Parses the two sheet ranges into a collection.
pub fn collection_from_rows(
    shortcut_rows: &[Vec<Value>],
    category_rows: &[Vec<Value>],
) -> Collection {
    let shortcuts = rows_to_records(shortcut_rows, &SHORTCUT_HEADERS, shortcut_aliases)
        .into_iter()
        .map(record_to_shortcut)
        .collect();
    let categories = rows_to_records(category_rows, &CATEGORY_HEADERS, category_aliases)
        .into_iter()
        .map(|mut record| {
            Category::with_id(
                record.remove("id").unwrap_or_default(),
                record.remove("name").unwrap_or_default(),
            )
        })
        .collect();
    Collection::new(shortcuts, categories)
}

/// Header row followed by one row per record; absent values are empty cells.
pub fn shortcut_rows(shortcuts: &[Shortcut]) -> Vec<Vec<Value>> {
    let mut rows = vec![SHORTCUT_HEADERS.iter().map(|h| json!(h)).collect::<Vec<_>>()];
    for shortcut in shortcuts {
        rows.push(vec![
            json!(shortcut.id),
            json!(shortcut.name),
            json!(shortcut.url),
            json!(shortcut
                .payment_date
                .map(|date| date.format("%Y-%m-%d").to_string())
                .unwrap_or_default()),
            shortcut.payment_amount.map(|amount| json!(amount)).unwrap_or_else(|| json!("")),
            json!(shortcut.payment_frequency.map(|freq| freq.as_str()).unwrap_or_default()),
            json!(shortcut.category_id.clone().unwrap_or_default()),
        ]);
    }
    rows
}

pub fn category_rows(categories: &[Category]) -> Vec<Vec<Value>> {
    let mut rows = vec![CATEGORY_HEADERS.iter().map(|h| json!(h)).collect::<Vec<_>>()];
    rows.extend(
        categories
            .iter()
            .map(|category| vec![json!(category.id), json!(category.name)]),
    );
    rows
}

pub struct SheetsBackend {
    settings: SheetsSettings,
    client: Client,
    probe_timeout: Duration,
}

pub type SheetsStore = DocumentStore<SheetsBackend>;

impl SheetsBackend {
    pub fn new(settings: SheetsSettings, probe_timeout: Duration) -> Result<Self, RemoteError> {
        Ok(Self {
            client: build_client(http::DEFAULT_TIMEOUT)?,
            settings,
            probe_timeout,
        })
    }

    pub fn into_store(self) -> SheetsStore {
        DocumentStore::new(self)
    }

    fn spreadsheet_url(&self, suffix: &str) -> String {
        format!(
            "{}/{}{}",
            self.settings.api_base.trim_end_matches('/'),
            self.settings.spreadsheet_id,
            suffix
        )
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(&self.settings.access_token)
    }
}

impl DocumentBackend for SheetsBackend {
    fn name(&self) -> &str {
        "sheets"
    }

    fn load(&self) -> Result<Collection, CoreError> {
        let request = self
            .authorized(self.client.get(self.spreadsheet_url("/values:batchGet")))
            .query(&[
                ("ranges", SHORTCUTS_SHEET),
                ("ranges", CATEGORIES_SHEET),
                ("valueRenderOption", "UNFORMATTED_VALUE"),
                ("dateTimeRenderOption", "FORMATTED_STRING"),
            ]);
        let response: BatchGetResponse = send_json(request)?;
        let mut ranges = response.value_ranges.into_iter();
        let shortcuts = ranges.next().unwrap_or_default();
        let categories = ranges.next().unwrap_or_default();
        Ok(collection_from_rows(&shortcuts.values, &categories.values))
    }

    fn save(&self, collection: &Collection) -> Result<(), CoreError> {
        send(
            self.authorized(self.client.post(self.spreadsheet_url("/values:batchClear")))
                .json(&json!({ "ranges": [SHORTCUTS_SHEET, CATEGORIES_SHEET] })),
        )?;
        if collection.shortcuts.is_empty() && collection.categories.is_empty() {
            debug!("sheets cleared; nothing to write");
            return Ok(());
        }
        let body = json!({
            "valueInputOption": "USER_ENTERED",
            "data": [
                {
                    "range": format!("{}!A1", SHORTCUTS_SHEET),
                    "values": shortcut_rows(&collection.shortcuts),
                },
                {
                    "range": format!("{}!A1", CATEGORIES_SHEET),
                    "values": category_rows(&collection.categories),
                },
            ]
        });
        send(
            self.authorized(self.client.post(self.spreadsheet_url("/values:batchUpdate")))
                .json(&body),
        )?;
        Ok(())
    }
}

impl ConnectionProbe for SheetsBackend {
    fn probe(&self) -> ConnectionStatus {
        let request = self
            .authorized(self.client.get(self.spreadsheet_url("")))
            .query(&[("fields", "spreadsheetId")]);
        let status = probe_request(request, self.probe_timeout, describe_probe_failure);
        if let Some(error) = &status.error {
            warn!(error = %error, "sheets probe failed");
        }
        status
    }
}

impl ConnectionProbe for SheetsStore {
    fn probe(&self) -> ConnectionStatus {
        self.backend().probe()
    }
}

fn describe_probe_failure(status: u16, _body: &str) -> String {
    match status {
        401 => "access token is invalid or expired".to_string(),
        403 => "access to the spreadsheet is forbidden".to_string(),
        404 => "spreadsheet not found; check SHEETS_SPREADSHEET_ID".to_string(),
        _ => format!("API error: {}", status),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_match_aliases_case_insensitively() {
        let rows = vec![
            vec![
                json!("ID"),
                json!("Title"),
                json!("URL"),
                json!("Payment Amount"),
                json!("Payment Date"),
            ],
            vec![
                json!("s1"),
                json!("Netflix"),
                json!("https://netflix.com"),
                json!(15.49),
                json!("2024-01-22"),
            ],
            vec![json!(""), json!("No id"), json!("https://example.com")],
            vec![json!("s2"), json!("Docs"), json!("https://docs.rs"), json!("free")],
        ];
        let collection = collection_from_rows(&rows, &[]);
        assert_eq!(collection.shortcuts.len(), 2);
        let netflix = &collection.shortcuts[0];
        assert_eq!(netflix.name, "Netflix");
        assert_eq!(netflix.payment_amount, Some(15.49));
        assert_eq!(netflix.payment_date, NaiveDate::from_ymd_opt(2024, 1, 22));
        assert_eq!(collection.shortcuts[1].payment_amount, None);
        assert!(collection.shortcuts[1].category_id.is_none());
    }

    #[test]
    fn sheet_without_id_header_is_empty() {
        let rows = vec![vec![json!("name"), json!("url")], vec![json!("x"), json!("y")]];
        assert!(collection_from_rows(&rows, &[]).shortcuts.is_empty());
        assert!(collection_from_rows(&[], &[]).is_empty());
    }

    #[test]
    fn rows_written_with_header_and_blank_cells() {
        let shortcut = Shortcut::from_draft(
            "s1",
            quicklink_domain::ShortcutDraft::new("Google", "https://google.com"),
        );
        let rows = shortcut_rows(&[shortcut]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][3], json!("paymentDate"));
        assert_eq!(rows[1][4], json!(""));
        let categories = category_rows(&[Category::with_id("c1", "Search")]);
        assert_eq!(categories[1], vec![json!("c1"), json!("Search")]);
    }
}
