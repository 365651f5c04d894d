//! Supabase (PostgREST) backend.

use std::time::Duration;

use chrono::{NaiveDate, Utc};
use once_cell::sync::Lazy;
use quicklink_core::{CoreError, ShortcutStore};
use quicklink_domain::{Category, PaymentFrequency, Shortcut, ShortcutDraft};
use regex::Regex;
use reqwest::blocking::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use crate::{
    http::{self, build_client, probe_request, send, send_json},
    ConnectionProbe, ConnectionStatus, RemoteError,
};

static PROJECT_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https://[a-z0-9]+\.supabase\.co$").expect("valid supabase url regex")
});
static JWT_KEY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^eyJ[A-Za-z0-9_-]+\.[A-Za-z0-9_-]+\.[A-Za-z0-9_.+/=-]*$").expect("valid jwt regex")
});

/// Validated connection details for one Supabase project.
#[derive(Debug, Clone, PartialEq)]
pub struct SupabaseSettings {
    pub url: String,
    pub anon_key: String,
    pub user_id: String,
}

impl SupabaseSettings {
    pub fn validate(
        url: Option<&str>,
        anon_key: Option<&str>,
        user_id: &str,
    ) -> Result<Self, RemoteError> {
        let url = url.map(str::trim).unwrap_or_default();
        let key = anon_key.map(str::trim).unwrap_or_default();
        if url.is_empty() || key.is_empty() {
            return Err(RemoteError::NotConfigured(
                "Supabase (set SUPABASE_URL and SUPABASE_ANON_KEY)".into(),
            ));
        }
        let url = url.trim_end_matches('/');
        if !PROJECT_URL.is_match(url) {
            return Err(RemoteError::Invalid(format!("invalid Supabase URL format: {}", url)));
        }
        if !JWT_KEY.is_match(key) {
            return Err(RemoteError::Invalid("invalid Supabase API key format".into()));
        }
        if user_id.trim().is_empty() {
            return Err(RemoteError::Invalid("user id cannot be empty".into()));
        }
        Ok(Self {
            url: url.to_string(),
            anon_key: key.to_string(),
            user_id: user_id.trim().to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct ShortcutRow {
    id: String,
    name: String,
    url: String,
    #[serde(default)]
    category_id: Option<String>,
    #[serde(default)]
    payment_date: Option<String>,
    #[serde(default)]
    payment_amount: Option<f64>,
    #[serde(default)]
    payment_frequency: Option<String>,
}

#[derive(Debug, Serialize)]
struct ShortcutWrite<'a> {
    name: &'a str,
    url: &'a str,
    category_id: Option<&'a str>,
    payment_date: Option<String>,
    payment_amount: Option<f64>,
    payment_frequency: Option<&'static str>,
    user_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    updated_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CategoryRow {
    id: String,
    name: String,
}

impl ShortcutRow {
    fn into_shortcut(self) -> Shortcut {
        let payment_date = self
            .payment_date
            .as_deref()
            .and_then(|raw| {
                NaiveDate::parse_from_str(raw.get(..10).unwrap_or(raw), "%Y-%m-%d").ok()
            });
        let payment_frequency = self
            .payment_frequency
            .as_deref()
            .and_then(|raw| raw.parse::<PaymentFrequency>().ok());
        Shortcut {
            id: self.id,
            name: self.name,
            url: self.url,
            payment_date,
            payment_amount: self.payment_amount,
            payment_frequency,
            category_id: self.category_id,
        }
    }
}

fn shortcut_write<'a>(
    draft: &'a ShortcutDraft,
    user_id: &'a str,
    touch: bool,
) -> ShortcutWrite<'a> {
    ShortcutWrite {
        name: &draft.name,
        url: &draft.url,
        category_id: draft.category_id.as_deref(),
        payment_date: draft.payment_date.map(|date| date.format("%Y-%m-%d").to_string()),
        payment_amount: draft.payment_amount,
        payment_frequency: draft.payment_frequency.map(|freq| freq.as_str()),
        user_id,
        updated_at: touch.then(|| Utc::now().to_rfc3339()),
    }
}

/// Maps a failed health-check response onto a readable message.
pub fn describe_probe_failure(status: u16, body: &str) -> String {
    match status {
        401 => "API key is invalid".to_string(),
        403 => "API access is forbidden for this key".to_string(),
        _ if status == 404 || body.contains("does not exist") || body.contains("42P01") => {
            "database tables have not been created; run the setup SQL".to_string()
        }
        _ => format!("API error: {}", status),
    }
}

pub struct SupabaseStore {
    settings: SupabaseSettings,
    client: Client,
    probe_timeout: Duration,
}

impl SupabaseStore {
    pub fn new(settings: SupabaseSettings, probe_timeout: Duration) -> Result<Self, RemoteError> {
        Ok(Self {
            client: build_client(http::DEFAULT_TIMEOUT)?,
            settings,
            probe_timeout,
        })
    }

    pub fn settings(&self) -> &SupabaseSettings {
        &self.settings
    }

    fn table(&self, method: reqwest::Method, table: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}/rest/v1/{}", self.settings.url, table))
            .header("apikey", &self.settings.anon_key)
            .bearer_auth(&self.settings.anon_key)
            .query(&[("user_id", format!("eq.{}", self.settings.user_id))])
    }

    fn representation(request: RequestBuilder) -> RequestBuilder {
        request.header("Prefer", "return=representation")
    }
}

impl ShortcutStore for SupabaseStore {
    fn backend_name(&self) -> &str {
        "supabase"
    }

    fn list_shortcuts(&self) -> Result<Vec<Shortcut>, CoreError> {
        let rows: Vec<ShortcutRow> = send_json(
            self.table(reqwest::Method::GET, "shortcuts")
                .query(&[("select", "*"), ("order", "created_at.desc")]),
        )?;
        Ok(rows.into_iter().map(ShortcutRow::into_shortcut).collect())
    }

    fn list_categories(&self) -> Result<Vec<Category>, CoreError> {
        let rows: Vec<CategoryRow> = send_json(
            self.table(reqwest::Method::GET, "categories")
                .query(&[("select", "*"), ("order", "created_at.asc")]),
        )?;
        Ok(rows
            .into_iter()
            .map(|row| Category::with_id(row.id, row.name))
            .collect())
    }

    fn add_shortcut(&self, draft: ShortcutDraft) -> Result<Shortcut, CoreError> {
        let body = shortcut_write(&draft, &self.settings.user_id, false);
        let request = self
            .client
            .post(format!("{}/rest/v1/shortcuts", self.settings.url))
            .header("apikey", &self.settings.anon_key)
            .bearer_auth(&self.settings.anon_key)
            .json(&body);
        let rows: Vec<ShortcutRow> = send_json(Self::representation(request))?;
        let shortcut = rows
            .into_iter()
            .next()
            .map(ShortcutRow::into_shortcut)
            .ok_or_else(|| RemoteError::Decode("insert returned no row".into()))?;
        debug!(id = %shortcut.id, "shortcut inserted in supabase");
        Ok(shortcut)
    }

    fn update_shortcut(&self, shortcut: &Shortcut) -> Result<(), CoreError> {
        let draft = shortcut.to_draft();
        let body = shortcut_write(&draft, &self.settings.user_id, true);
        let request = self
            .table(reqwest::Method::PATCH, "shortcuts")
            .query(&[("id", format!("eq.{}", shortcut.id))])
            .json(&body);
        let rows: Vec<serde_json::Value> = send_json(Self::representation(request))?;
        if rows.is_empty() {
            return Err(CoreError::ShortcutNotFound(shortcut.id.clone()));
        }
        Ok(())
    }

    fn delete_shortcut(&self, id: &str) -> Result<(), CoreError> {
        let request = self
            .table(reqwest::Method::DELETE, "shortcuts")
            .query(&[("id", format!("eq.{}", id))]);
        let rows: Vec<serde_json::Value> = send_json(Self::representation(request))?;
        if rows.is_empty() {
            return Err(CoreError::ShortcutNotFound(id.to_string()));
        }
        Ok(())
    }

    fn add_category(&self, name: &str) -> Result<Category, CoreError> {
        let request = self
            .client
            .post(format!("{}/rest/v1/categories", self.settings.url))
            .header("apikey", &self.settings.anon_key)
            .bearer_auth(&self.settings.anon_key)
            .json(&json!({ "name": name, "user_id": self.settings.user_id }));
        let rows: Vec<CategoryRow> = send_json(Self::representation(request))?;
        rows.into_iter()
            .next()
            .map(|row| Category::with_id(row.id, row.name))
            .ok_or_else(|| RemoteError::Decode("insert returned no row".into()).into())
    }

    fn update_category(&self, id: &str, name: &str) -> Result<(), CoreError> {
        let request = self
            .table(reqwest::Method::PATCH, "categories")
            .query(&[("id", format!("eq.{}", id))])
            .json(&json!({ "name": name, "updated_at": Utc::now().to_rfc3339() }));
        let rows: Vec<serde_json::Value> = send_json(Self::representation(request))?;
        if rows.is_empty() {
            return Err(CoreError::CategoryNotFound(id.to_string()));
        }
        Ok(())
    }

    fn delete_category(&self, id: &str) -> Result<(), CoreError> {
        send(
            self.table(reqwest::Method::PATCH, "shortcuts")
                .query(&[("category_id", format!("eq.{}", id))])
                .json(&json!({ "category_id": null, "updated_at": Utc::now().to_rfc3339() })),
        )?;
        let request = self
            .table(reqwest::Method::DELETE, "categories")
            .query(&[("id", format!("eq.{}", id))]);
        let rows: Vec<serde_json::Value> = send_json(Self::representation(request))?;
        if rows.is_empty() {
            return Err(CoreError::CategoryNotFound(id.to_string()));
        }
        Ok(())
    }
}

impl ConnectionProbe for SupabaseStore {
    fn probe(&self) -> ConnectionStatus {
        let request = self
            .client
            .get(format!("{}/rest/v1/categories", self.settings.url))
            .header("apikey", &self.settings.anon_key)
            .bearer_auth(&self.settings.anon_key)
            .query(&[("select", "id"), ("limit", "1")]);
        let status = probe_request(request, self.probe_timeout, describe_probe_failure);
        if let Some(error) = &status.error {
            warn!(error = %error, "supabase probe failed");
        }
        status
    }
}
