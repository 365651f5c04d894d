//! Firebase Realtime Database backend over its REST interface.

use std::time::Duration;

use quicklink_core::{CoreError, ShortcutStore};
use quicklink_domain::{Category, Shortcut, ShortcutDraft};
use reqwest::blocking::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::{
    http::{self, build_client, probe_request, send, send_json},
    ConnectionProbe, ConnectionStatus, RemoteError,
};

const SHORTCUTS: &str = "shortcuts";
const CATEGORIES: &str = "categories";

#[derive(Debug, Clone, PartialEq)]
pub struct FirebaseSettings {
    pub database_url: String,
    pub auth_token: Option<String>,
}

impl FirebaseSettings {
    pub fn validate(
        database_url: Option<&str>,
        auth_token: Option<&str>,
    ) -> Result<Self, RemoteError> {
        let url = database_url.map(str::trim).unwrap_or_default();
        if url.is_empty() {
            return Err(RemoteError::NotConfigured(
                "Firebase (set FIREBASE_DATABASE_URL)".into(),
            ));
        }
        if !url.starts_with("https://") && !url.starts_with("http://") {
            return Err(RemoteError::Invalid(format!("invalid Firebase database URL: {}", url)));
        }
        Ok(Self {
            database_url: url.trim_end_matches('/').to_string(),
            auth_token: auth_token
                .map(str::trim)
                .filter(|token| !token.is_empty())
                .map(str::to_string),
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CategoryBody {
    name: String,
}

#[derive(Debug, Deserialize)]
struct PushResponse {
    name: String,
}

/// Converts a keyed Firebase object into `(key, value)` pairs; `null` is empty.
fn keyed_entries<T: serde::de::DeserializeOwned>(
    value: Value,
) -> Result<Vec<(String, T)>, RemoteError> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Object(map) => map
            .into_iter()
            .filter(|(_, body)| !body.is_null())
            .map(|(key, body)| {
                serde_json::from_value(body)
                    .map(|parsed| (key, parsed))
                    .map_err(|err| RemoteError::Decode(err.to_string()))
            })
            .collect(),
        other => Err(RemoteError::Decode(format!("expected an object, got {}", other))),
    }
}

pub struct FirebaseStore {
    settings: FirebaseSettings,
    client: Client,
    probe_timeout: Duration,
}

impl FirebaseStore {
    pub fn new(settings: FirebaseSettings, probe_timeout: Duration) -> Result<Self, RemoteError> {
        Ok(Self {
            client: build_client(http::DEFAULT_TIMEOUT)?,
            settings,
            probe_timeout,
        })
    }

    fn node(&self, method: reqwest::Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}.json", self.settings.database_url, path);
        let request = self.client.request(method, url);
        match &self.settings.auth_token {
            Some(token) => request.query(&[("auth", token)]),
            None => request,
        }
    }

    fn exists(&self, path: &str) -> Result<bool, RemoteError> {
        let value: Value = send_json(self.node(reqwest::Method::GET, path))?;
        Ok(!value.is_null())
    }
}

impl ShortcutStore for FirebaseStore {
    fn backend_name(&self) -> &str {
        "firebase"
    }

    fn list_shortcuts(&self) -> Result<Vec<Shortcut>, CoreError> {
        let value: Value = send_json(self.node(reqwest::Method::GET, SHORTCUTS))?;
        let mut shortcuts: Vec<Shortcut> = keyed_entries::<ShortcutDraft>(value)?
            .into_iter()
            .map(|(key, draft)| Shortcut::from_draft(key, draft))
            .collect();
        // push keys sort chronologically; newest first
        shortcuts.reverse();
        Ok(shortcuts)
    }

    fn list_categories(&self) -> Result<Vec<Category>, CoreError> {
        let value: Value = send_json(self.node(reqwest::Method::GET, CATEGORIES))?;
        Ok(keyed_entries::<CategoryBody>(value)?
            .into_iter()
            .map(|(key, body)| Category::with_id(key, body.name))
            .collect())
    }

    fn add_shortcut(&self, draft: ShortcutDraft) -> Result<Shortcut, CoreError> {
        let pushed: PushResponse =
            send_json(self.node(reqwest::Method::POST, SHORTCUTS).json(&draft))?;
        debug!(id = %pushed.name, "shortcut pushed to firebase");
        Ok(Shortcut::from_draft(pushed.name, draft))
    }

    fn update_shortcut(&self, shortcut: &Shortcut) -> Result<(), CoreError> {
        let path = format!("{}/{}", SHORTCUTS, shortcut.id);
        if !self.exists(&path)? {
            return Err(CoreError::ShortcutNotFound(shortcut.id.clone()));
        }
        send(self.node(reqwest::Method::PUT, &path).json(&shortcut.to_draft()))?;
        Ok(())
    }

    fn delete_shortcut(&self, id: &str) -> Result<(), CoreError> {
        let path = format!("{}/{}", SHORTCUTS, id);
        if !self.exists(&path)? {
            return Err(CoreError::ShortcutNotFound(id.to_string()));
        }
        send(self.node(reqwest::Method::DELETE, &path))?;
        Ok(())
    }

    fn add_category(&self, name: &str) -> Result<Category, CoreError> {
        let body = CategoryBody { name: name.to_string() };
        let pushed: PushResponse =
            send_json(self.node(reqwest::Method::POST, CATEGORIES).json(&body))?;
        Ok(Category::with_id(pushed.name, body.name))
    }

    fn update_category(&self, id: &str, name: &str) -> Result<(), CoreError> {
        let path = format!("{}/{}", CATEGORIES, id);
        if !self.exists(&path)? {
            return Err(CoreError::CategoryNotFound(id.to_string()));
        }
        send(self.node(reqwest::Method::PUT, &path).json(&json!({ "name": name })))?;
        Ok(())
    }

    fn delete_category(&self, id: &str) -> Result<(), CoreError> {
        let path = format!("{}/{}", CATEGORIES, id);
        if !self.exists(&path)? {
            return Err(CoreError::CategoryNotFound(id.to_string()));
        }
        // one multi-location update clears references and removes the category
        let mut updates = Map::new();
        for shortcut in self.list_shortcuts()? {
            if shortcut.category_id.as_deref() == Some(id) {
                updates.insert(format!("{}/{}/categoryId", SHORTCUTS, shortcut.id), Value::Null);
            }
        }
        updates.insert(path, Value::Null);
        let root = format!("{}/.json", self.settings.database_url);
        let request = self.client.patch(root).json(&Value::Object(updates));
        let request = match &self.settings.auth_token {
            Some(token) => request.query(&[("auth", token)]),
            None => request,
        };
        send(request)?;
        Ok(())
    }
}

impl ConnectionProbe for FirebaseStore {
    fn probe(&self) -> ConnectionStatus {
        let status = probe_request(
            self.node(reqwest::Method::GET, ".info/connected"),
            self.probe_timeout,
            describe_probe_failure,
        );
        if let Some(error) = &status.error {
            warn!(error = %error, "firebase probe failed");
        }
        status
    }
}

fn describe_probe_failure(status: u16, _body: &str) -> String {
    match status {
        401 | 403 => "permission denied; check the database rules or auth token".to_string(),
        404 => "database not found; check FIREBASE_DATABASE_URL".to_string(),
        _ => format!("API error: {}", status),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyed_objects_become_entries() {
        let value = json!({
            "-Nb1": { "name": "Search" },
            "-Nb2": null,
            "-Nb3": { "name": "Music" }
        });
        let entries = keyed_entries::<CategoryBody>(value).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].0, "-Nb1");
        assert_eq!(entries[1].1.name, "Music");
        assert!(keyed_entries::<CategoryBody>(Value::Null).unwrap().is_empty());
        assert!(keyed_entries::<CategoryBody>(json!([1, 2])).is_err());
    }

    #[test]
    fn settings_require_database_url() {
        assert!(matches!(
            FirebaseSettings::validate(None, None),
            Err(RemoteError::NotConfigured(_))
        ));
        let settings =
            FirebaseSettings::validate(Some("https://demo.firebaseio.com/"), Some(" ")).unwrap();
        assert_eq!(settings.database_url, "https://demo.firebaseio.com");
        assert!(settings.auth_token.is_none());
    }
}
