use chrono::{DateTime, Utc};
use quicklink_core::ShortcutStore;
use serde::Serialize;
use std::fmt;

/// Where requests are currently served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionMode {
    Cloud,
    Local,
    Offline,
}

impl fmt::Display for ConnectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConnectionMode::Cloud => "cloud",
            ConnectionMode::Local => "local",
            ConnectionMode::Offline => "offline",
        };
        f.write_str(label)
    }
}

/// Outcome of the most recent connection check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectionStatus {
    pub connected: bool,
    pub last_checked: DateTime<Utc>,
    pub latency_ms: Option<u64>,
    pub error: Option<String>,
    pub mode: ConnectionMode,
}

impl ConnectionStatus {
    pub fn unchecked() -> Self {
        Self {
            connected: false,
            last_checked: Utc::now(),
            latency_ms: None,
            error: None,
            mode: ConnectionMode::Offline,
        }
    }

    pub fn online(latency_ms: u64) -> Self {
        Self {
            connected: true,
            last_checked: Utc::now(),
            latency_ms: Some(latency_ms),
            error: None,
            mode: ConnectionMode::Cloud,
        }
    }

    /// A failed check; requests continue against the local store.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            connected: false,
            last_checked: Utc::now(),
            latency_ms: None,
            error: Some(error.into()),
            mode: ConnectionMode::Local,
        }
    }
}

/// Health check implemented by every cloud backend.
pub trait ConnectionProbe: Send + Sync {
    fn probe(&self) -> ConnectionStatus;
}

/// A cloud backend: a store that can also be probed.
pub trait CloudStore: ShortcutStore + ConnectionProbe {
    fn as_store(&self) -> &dyn ShortcutStore;
}

impl<T: ShortcutStore + ConnectionProbe> CloudStore for T {
    fn as_store(&self) -> &dyn ShortcutStore {
        self
    }
}
