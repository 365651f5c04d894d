use serde::{Deserialize, Serialize};
use std::{fmt, path::PathBuf, str::FromStr};

use crate::ConfigError;

/// Selected persistence backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageMode {
    #[default]
    Local,
    Firebase,
    Sheets,
    Supabase,
    /// Supabase paired with the local store as fallback.
    Hybrid,
}

impl StorageMode {
    pub const ALL: [StorageMode; 5] = [
        StorageMode::Local,
        StorageMode::Firebase,
        StorageMode::Sheets,
        StorageMode::Supabase,
        StorageMode::Hybrid,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StorageMode::Local => "local",
            StorageMode::Firebase => "firebase",
            StorageMode::Sheets => "sheets",
            StorageMode::Supabase => "supabase",
            StorageMode::Hybrid => "hybrid",
        }
    }

    pub fn is_cloud(&self) -> bool {
        !matches!(self, StorageMode::Local)
    }
}

impl fmt::Display for StorageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageMode {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "local" | "localstorage" => Ok(StorageMode::Local),
            "firebase" => Ok(StorageMode::Firebase),
            "sheets" | "googlesheets" | "google-sheets" => Ok(StorageMode::Sheets),
            "supabase" => Ok(StorageMode::Supabase),
            "hybrid" => Ok(StorageMode::Hybrid),
            other => Err(ConfigError::Invalid(format!(
                "unknown storage mode `{}` (expected local, firebase, sheets, supabase or hybrid)",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SupabaseConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anon_key: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FirebaseConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SheetsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spreadsheet_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

/// Stores user-configurable CLI preferences and backend credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage_mode: StorageMode,
    #[serde(default = "Config::default_user_id")]
    pub user_id: String,
    #[serde(default)]
    pub supabase: SupabaseConfig,
    #[serde(default)]
    pub firebase: FirebaseConfig,
    #[serde(default)]
    pub sheets: SheetsConfig,
    #[serde(default = "Config::default_monitor_interval_secs")]
    pub monitor_interval_secs: u64,
    #[serde(default = "Config::default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
    #[serde(default = "Config::default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,
    #[serde(default = "Config::default_backup_retention")]
    pub backup_retention: usize,
    #[serde(default = "Config::default_ui_color_enabled")]
    pub ui_color_enabled: bool,
    #[serde(default)]
    pub plain_output: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    /// Optional custom directory for the local data file. Defaults to `<base>/data`.
    pub data_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_mode: StorageMode::default(),
            user_id: Self::default_user_id(),
            supabase: SupabaseConfig::default(),
            firebase: FirebaseConfig::default(),
            sheets: SheetsConfig::default(),
            monitor_interval_secs: Self::default_monitor_interval_secs(),
            probe_timeout_ms: Self::default_probe_timeout_ms(),
            max_reconnect_attempts: Self::default_max_reconnect_attempts(),
            backup_retention: Self::default_backup_retention(),
            ui_color_enabled: Self::default_ui_color_enabled(),
            plain_output: false,
            data_dir: None,
        }
    }
}

pub const SETTING_KEYS: &[&str] = &[
    "storage_mode",
    "user_id",
    "supabase.url",
    "supabase.anon_key",
    "firebase.database_url",
    "firebase.auth_token",
    "sheets.spreadsheet_id",
    "sheets.access_token",
    "monitor_interval_secs",
    "probe_timeout_ms",
    "max_reconnect_attempts",
    "backup_retention",
    "ui_color_enabled",
    "plain_output",
    "data_dir",
];

impl Config {
    pub fn default_user_id() -> String {
        "local-user".into()
    }

    pub fn default_monitor_interval_secs() -> u64 {
        30
    }

    pub fn default_probe_timeout_ms() -> u64 {
        10_000
    }

    pub fn default_max_reconnect_attempts() -> u32 {
        3
    }

    pub fn default_backup_retention() -> usize {
        5
    }

    pub fn default_ui_color_enabled() -> bool {
        true
    }

    pub fn resolve_data_dir(&self, base: &std::path::Path) -> PathBuf {
        match &self.data_dir {
            Some(path) => path.clone(),
            None => base.join("data"),
        }
    }

    /// Applies environment overrides using `lookup` (normally `std::env::var`).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        if let Some(value) = read("SUPABASE_URL") {
            self.supabase.url = Some(value);
        }
        if let Some(value) = read("SUPABASE_ANON_KEY") {
            self.supabase.anon_key = Some(value);
        }
        if let Some(value) = read("FIREBASE_DATABASE_URL") {
            self.firebase.database_url = Some(value);
        }
        if let Some(value) = read("FIREBASE_AUTH_TOKEN") {
            self.firebase.auth_token = Some(value);
        }
        if let Some(value) = read("SHEETS_SPREADSHEET_ID") {
            self.sheets.spreadsheet_id = Some(value);
        }
        if let Some(value) = read("SHEETS_ACCESS_TOKEN") {
            self.sheets.access_token = Some(value);
        }
        if let Some(value) = read("QUICKLINK_STORAGE_MODE") {
            self.storage_mode = value.parse()?;
        }
        Ok(())
    }

    /// Whether the credentials needed by `mode` are present.
    pub fn is_cloud_configured(&self, mode: StorageMode) -> bool {
        let present =
            |value: &Option<String>| value.as_deref().is_some_and(|v| !v.trim().is_empty());
        match mode {
            StorageMode::Local => true,
            StorageMode::Firebase => present(&self.firebase.database_url),
            StorageMode::Sheets => {
                present(&self.sheets.spreadsheet_id) && present(&self.sheets.access_token)
            }
            StorageMode::Supabase | StorageMode::Hybrid => {
                present(&self.supabase.url) && present(&self.supabase.anon_key)
            }
        }
    }

    /// Updates one setting addressed by its dotted key.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        let optional = |value: &str| {
            if value.is_empty() || value.eq_ignore_ascii_case("none") {
                None
            } else {
                Some(value.to_string())
            }
        };
        match key {
            "storage_mode" => self.storage_mode = value.parse()?,
            "user_id" => {
                if value.is_empty() {
                    return Err(ConfigError::Invalid("user_id cannot be empty".into()));
                }
                self.user_id = value.to_string();
            }
            "supabase.url" => self.supabase.url = optional(value),
            "supabase.anon_key" => self.supabase.anon_key = optional(value),
            "firebase.database_url" => self.firebase.database_url = optional(value),
            "firebase.auth_token" => self.firebase.auth_token = optional(value),
            "sheets.spreadsheet_id" => self.sheets.spreadsheet_id = optional(value),
            "sheets.access_token" => self.sheets.access_token = optional(value),
            "monitor_interval_secs" => self.monitor_interval_secs = parse_positive(key, value)?,
            "probe_timeout_ms" => self.probe_timeout_ms = parse_positive(key, value)?,
            "max_reconnect_attempts" => {
                self.max_reconnect_attempts = parse_number(key, value)?;
            }
            "backup_retention" => {
                self.backup_retention = parse_positive::<u64>(key, value)? as usize;
            }
            "ui_color_enabled" => self.ui_color_enabled = parse_bool(key, value)?,
            "plain_output" => self.plain_output = parse_bool(key, value)?,
            "data_dir" => self.data_dir = optional(value).map(PathBuf::from),
            other => {
                return Err(ConfigError::Invalid(format!(
                    "unknown setting `{}` (known: {})",
                    other,
                    SETTING_KEYS.join(", ")
                )))
            }
        }
        Ok(())
    }

    /// Key/value pairs for display, with secrets masked.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        let text = |value: &Option<String>| value.clone().unwrap_or_else(|| "(unset)".into());
        let secret = |value: &Option<String>| match value {
            Some(v) if !v.is_empty() => mask_secret(v),
            _ => "(unset)".into(),
        };
        vec![
            ("storage_mode", self.storage_mode.to_string()),
            ("user_id", self.user_id.clone()),
            ("supabase.url", text(&self.supabase.url)),
            ("supabase.anon_key", secret(&self.supabase.anon_key)),
            ("firebase.database_url", text(&self.firebase.database_url)),
            ("firebase.auth_token", secret(&self.firebase.auth_token)),
            ("sheets.spreadsheet_id", text(&self.sheets.spreadsheet_id)),
            ("sheets.access_token", secret(&self.sheets.access_token)),
            ("monitor_interval_secs", self.monitor_interval_secs.to_string()),
            ("probe_timeout_ms", self.probe_timeout_ms.to_string()),
            ("max_reconnect_attempts", self.max_reconnect_attempts.to_string()),
            ("backup_retention", self.backup_retention.to_string()),
            ("ui_color_enabled", self.ui_color_enabled.to_string()),
            ("plain_output", self.plain_output.to_string()),
            (
                "data_dir",
                self.data_dir
                    .as_ref()
                    .map(|path| path.display().to_string())
                    .unwrap_or_else(|| "(default)".into()),
            ),
        ]
    }
}

fn mask_secret(value: &str) -> String {
    let visible: String = value.chars().take(6).collect();
    format!("{}…", visible)
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::Invalid(format!("{} expects a number, got `{}`", key, value)))
}

fn parse_positive<T: FromStr + PartialOrd + Default>(
    key: &str,
    value: &str,
) -> Result<T, ConfigError> {
    let parsed: T = parse_number(key, value)?;
    if parsed <= T::default() {
        return Err(ConfigError::Invalid(format!("{} must be greater than zero", key)));
    }
    Ok(parsed)
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Ok(true),
        "false" | "off" | "no" | "0" => Ok(false),
        _ => Err(ConfigError::Invalid(format!("{} expects true or false", key))),
    }
}
