//! Builds the active store from the configured storage mode.

use std::{
    path::Path,
    sync::{mpsc::Receiver, Arc},
    time::Duration,
};

use quicklink_config::{Config, StorageMode};
use quicklink_core::{CoreError, ShortcutStore, SyncPlanner, SyncReport};
use quicklink_remote::{
    CloudStore, ConnectionMode, ConnectionProbe, ConnectionStatus, FirebaseSettings,
    FirebaseStore, HybridOptions, HybridStore, MonitorHandle, RemoteError, SheetsBackend,
    SheetsSettings, StorageInfo, SupabaseSettings, SupabaseStore,
};
use quicklink_storage_json::{open_store, JsonShortcutStore};
use tracing::{info, warn};

/// Cloud store seen both as a plain store and as something that can be probed.
#[derive(Clone)]
struct CloudPair {
    store: Arc<dyn ShortcutStore>,
    probe: Arc<dyn CloudStore>,
}

impl CloudPair {
    fn new<T: ShortcutStore + ConnectionProbe + 'static>(store: T) -> Self {
        let store = Arc::new(store);
        Self {
            store: store.clone(),
            probe: store,
        }
    }
}

enum ActiveStore {
    Local,
    Cloud(CloudPair),
    Hybrid {
        store: Arc<HybridStore>,
        updates: Receiver<StorageInfo>,
        monitor: Option<MonitorHandle>,
    },
}

/// The store the shell talks to, plus the local store kept for backups and fallback.
pub struct Storage {
    requested: StorageMode,
    local: Arc<JsonShortcutStore>,
    active: ActiveStore,
}

impl Storage {
    /// Opens storage for `config`. A cloud mode that cannot be configured falls back
    /// to local storage; the returned notice explains why.
    pub fn open(
        config: &Config,
        base_dir: &Path,
        with_monitor: bool,
    ) -> Result<(Self, Option<String>), CoreError> {
        let data_dir = config.resolve_data_dir(base_dir);
        let local = Arc::new(open_store(&data_dir, Some(config.backup_retention))?);
        let requested = config.storage_mode;

        let cloud = match connect(config) {
            Ok(cloud) => cloud,
            Err(err) => {
                warn!(mode = %requested, error = %err, "cloud storage unavailable; using local");
                let notice =
                    format!("{} storage unavailable ({}); using local storage.", requested, err);
                return Ok((
                    Self {
                        requested,
                        local,
                        active: ActiveStore::Local,
                    },
                    Some(notice),
                ));
            }
        };

        let (active, notice) = match cloud {
            None => (ActiveStore::Local, None),
            Some(pair) if requested == StorageMode::Hybrid => {
                let fallback: Arc<dyn ShortcutStore> = local.clone();
                let options = HybridOptions {
                    max_reconnect_attempts: config.max_reconnect_attempts,
                    ..HybridOptions::default()
                };
                let store = Arc::new(HybridStore::new(pair.probe, fallback, options));
                let updates = store.subscribe();
                let status = store.initialize();
                // the initial snapshot is reported here, not as a mode change
                while updates.try_recv().is_ok() {}
                let notice = (status.mode != ConnectionMode::Cloud).then(|| {
                    format!(
                        "{} unreachable ({}); working from local storage.",
                        status.cloud_backend,
                        status.last_error.as_deref().unwrap_or("no response")
                    )
                });
                let interval = Duration::from_secs(config.monitor_interval_secs);
                let monitor = with_monitor.then(|| store.spawn_monitor(interval));
                (
                    ActiveStore::Hybrid {
                        store,
                        updates,
                        monitor,
                    },
                    notice,
                )
            }
            Some(pair) => (ActiveStore::Cloud(pair), None),
        };
        info!(mode = %requested, "storage opened");
        Ok((
            Self {
                requested,
                local,
                active,
            },
            notice,
        ))
    }

    pub fn requested(&self) -> StorageMode {
        self.requested
    }

    /// The store commands read from and write to.
    pub fn active(&self) -> Arc<dyn ShortcutStore> {
        match &self.active {
            ActiveStore::Local => self.local.clone(),
            ActiveStore::Cloud(pair) => pair.store.clone(),
            ActiveStore::Hybrid { store, .. } => store.clone(),
        }
    }

    pub fn local(&self) -> &JsonShortcutStore {
        &self.local
    }

    pub fn hybrid(&self) -> Option<&HybridStore> {
        match &self.active {
            ActiveStore::Hybrid { store, .. } => Some(store),
            _ => None,
        }
    }

    pub fn is_monitoring(&self) -> bool {
        matches!(&self.active, ActiveStore::Hybrid { monitor: Some(_), .. })
    }

    /// Short label for the prompt: backend name plus the hybrid mode when relevant.
    pub fn label(&self) -> String {
        match &self.active {
            ActiveStore::Local => "local".to_string(),
            ActiveStore::Cloud(pair) => pair.store.backend_name().to_string(),
            ActiveStore::Hybrid { store, .. } => match store.mode() {
                ConnectionMode::Cloud => format!("hybrid:{}", store.cloud().backend_name()),
                mode => format!("hybrid:{}", mode),
            },
        }
    }

    /// Mode changes published by the hybrid store since the last call.
    pub fn drain_updates(&self) -> Vec<StorageInfo> {
        match &self.active {
            ActiveStore::Hybrid { updates, .. } => updates.try_iter().collect(),
            _ => Vec::new(),
        }
    }

    /// Probes the cloud backend, switching hybrid mode as a side effect.
    pub fn check(&self) -> Option<ConnectionStatus> {
        match &self.active {
            ActiveStore::Local => None,
            ActiveStore::Cloud(pair) => Some(pair.probe.probe()),
            ActiveStore::Hybrid { store, .. } => {
                let info = store.check_and_switch();
                Some(ConnectionStatus {
                    connected: info.connected,
                    last_checked: info.last_checked,
                    latency_ms: info.latency_ms,
                    error: info.last_error,
                    mode: info.mode,
                })
            }
        }
    }

    /// Stops using the cloud. Direct cloud modes drop to the local store for the
    /// rest of the session; hybrid storage pins its local mode.
    pub fn use_local(&mut self) -> bool {
        match &self.active {
            ActiveStore::Local => false,
            ActiveStore::Cloud(_) => {
                self.active = ActiveStore::Local;
                true
            }
            ActiveStore::Hybrid { store, .. } => {
                store.force_local();
                true
            }
        }
    }

    /// Tries to return to the cloud; `None` when no cloud backend is configured.
    pub fn reconnect(&self) -> Option<bool> {
        match &self.active {
            ActiveStore::Local => None,
            ActiveStore::Cloud(pair) => Some(pair.probe.probe().connected),
            ActiveStore::Hybrid { store, .. } => {
                store.allow_cloud();
                Some(store.attempt_reconnection())
            }
        }
    }

    /// Uploads local records missing from the cloud backend.
    pub fn sync_to_cloud(&self) -> Result<Option<SyncReport>, CoreError> {
        match &self.active {
            ActiveStore::Local => Ok(None),
            ActiveStore::Cloud(pair) => {
                let local = self.local.load_collection()?;
                let remote = pair.store.load_collection()?;
                SyncPlanner::plan(&local, &remote)
                    .apply(pair.store.as_ref())
                    .map(Some)
            }
            ActiveStore::Hybrid { store, .. } => store.sync_local_to_cloud().map(Some),
        }
    }
}

/// The configured cloud backend, or `None` for local mode.
fn connect(config: &Config) -> Result<Option<CloudPair>, RemoteError> {
    let timeout = Duration::from_millis(config.probe_timeout_ms);
    let pair = match config.storage_mode {
        StorageMode::Local => return Ok(None),
        StorageMode::Firebase => {
            let settings = FirebaseSettings::validate(
                config.firebase.database_url.as_deref(),
                config.firebase.auth_token.as_deref(),
            )?;
            CloudPair::new(FirebaseStore::new(settings, timeout)?)
        }
        StorageMode::Sheets => {
            let settings = SheetsSettings::validate(
                config.sheets.spreadsheet_id.as_deref(),
                config.sheets.access_token.as_deref(),
            )?;
            CloudPair::new(SheetsBackend::new(settings, timeout)?.into_store())
        }
        StorageMode::Supabase | StorageMode::Hybrid => {
            let settings = SupabaseSettings::validate(
                config.supabase.url.as_deref(),
                config.supabase.anon_key.as_deref(),
                &config.user_id,
            )?;
            CloudPair::new(SupabaseStore::new(settings, timeout)?)
        }
    };
    Ok(Some(pair))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn local_mode_uses_json_store() {
        let dir = TempDir::new().unwrap();
        let (storage, notice) = Storage::open(&Config::default(), dir.path(), false).unwrap();
        assert!(notice.is_none());
        assert_eq!(storage.label(), "local");
        assert_eq!(storage.active().backend_name(), "local");
        assert!(storage.check().is_none());
        assert!(storage.sync_to_cloud().unwrap().is_none());
    }

    #[test]
    fn unconfigured_cloud_falls_back_to_local() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            storage_mode: StorageMode::Firebase,
            ..Config::default()
        };
        let (mut storage, notice) = Storage::open(&config, dir.path(), false).unwrap();
        assert_eq!(storage.requested(), StorageMode::Firebase);
        assert!(notice.unwrap().contains("FIREBASE_DATABASE_URL"));
        assert_eq!(storage.label(), "local");
        assert!(!storage.use_local());
    }
}
