//! Cloud store paired with the local store as fallback.

use std::{
    sync::{
        mpsc::{self, Receiver, RecvTimeoutError, Sender},
        Arc, Mutex, MutexGuard,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use chrono::{DateTime, Utc};
use quicklink_core::{CoreError, ShortcutStore, SyncPlanner, SyncReport};
use quicklink_domain::{Category, Shortcut, ShortcutDraft};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{CloudStore, ConnectionMode, ConnectionStatus};

#[derive(Debug, Clone, Copy)]
pub struct HybridOptions {
    pub max_reconnect_attempts: u32,
    /// Delay unit for reconnection backoff; attempt `n` waits `base * 2^n`.
    pub backoff_base: Duration,
}

impl Default for HybridOptions {
    fn default() -> Self {
        Self {
            max_reconnect_attempts: 3,
            backoff_base: Duration::from_secs(1),
        }
    }
}

/// Snapshot published to listeners whenever the mode changes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StorageInfo {
    pub mode: ConnectionMode,
    pub cloud_backend: String,
    pub connected: bool,
    pub forced_local: bool,
    pub last_checked: DateTime<Utc>,
    pub latency_ms: Option<u64>,
    pub last_error: Option<String>,
}

struct HybridState {
    mode: ConnectionMode,
    status: ConnectionStatus,
    forced_local: bool,
    reconnect_attempts: u32,
}

pub struct HybridStore {
    cloud: Arc<dyn CloudStore>,
    local: Arc<dyn ShortcutStore>,
    options: HybridOptions,
    state: Mutex<HybridState>,
    listeners: Mutex<Vec<Sender<StorageInfo>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl HybridStore {
    /// Starts in local mode; call [`HybridStore::initialize`] to probe the cloud.
    pub fn new(
        cloud: Arc<dyn CloudStore>,
        local: Arc<dyn ShortcutStore>,
        options: HybridOptions,
    ) -> Self {
        Self {
            cloud,
            local,
            options,
            state: Mutex::new(HybridState {
                mode: ConnectionMode::Local,
                status: ConnectionStatus::unchecked(),
                forced_local: false,
                reconnect_attempts: 0,
            }),
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// Probes the cloud once and picks the starting mode.
    pub fn initialize(&self) -> StorageInfo {
        let status = self.cloud.probe();
        let mode = if status.connected {
            ConnectionMode::Cloud
        } else {
            ConnectionMode::Local
        };
        {
            let mut state = lock(&self.state);
            state.mode = mode;
            state.status = status;
        }
        info!(backend = self.cloud.backend_name(), %mode, "hybrid storage initialized");
        let info = self.info();
        self.notify(&info);
        info
    }

    pub fn info(&self) -> StorageInfo {
        let state = lock(&self.state);
        StorageInfo {
            mode: state.mode,
            cloud_backend: self.cloud.backend_name().to_string(),
            connected: state.status.connected,
            forced_local: state.forced_local,
            last_checked: state.status.last_checked,
            latency_ms: state.status.latency_ms,
            last_error: state.status.error.clone(),
        }
    }

    pub fn mode(&self) -> ConnectionMode {
        lock(&self.state).mode
    }

    pub fn local(&self) -> &dyn ShortcutStore {
        self.local.as_ref()
    }

    pub fn cloud(&self) -> &dyn CloudStore {
        self.cloud.as_ref()
    }

    /// Receives a [`StorageInfo`] on every mode change.
    pub fn subscribe(&self) -> Receiver<StorageInfo> {
        let (tx, rx) = mpsc::channel();
        lock(&self.listeners).push(tx);
        rx
    }

    /// Probes the cloud and switches modes; returning to the cloud pushes local data first.
    pub fn check_and_switch(&self) -> StorageInfo {
        if lock(&self.state).forced_local {
            return self.info();
        }
        let status = self.cloud.probe();
        self.apply_probe(status);
        self.info()
    }

    /// Retries the cloud with exponential backoff, up to the configured attempt limit.
    pub fn attempt_reconnection(&self) -> bool {
        loop {
            let attempt = {
                let mut state = lock(&self.state);
                if state.forced_local {
                    return false;
                }
                if state.reconnect_attempts >= self.options.max_reconnect_attempts {
                    info!(
                        attempts = state.reconnect_attempts,
                        "reconnection limit reached; staying in local mode"
                    );
                    return false;
                }
                state.reconnect_attempts += 1;
                state.reconnect_attempts
            };
            info!(attempt, max = self.options.max_reconnect_attempts, "reconnecting to cloud");
            let status = self.cloud.probe();
            if status.connected {
                self.apply_probe(status);
                return true;
            }
            self.apply_probe(status);
            if attempt < self.options.max_reconnect_attempts {
                let delay = self.options.backoff_base * 2u32.saturating_pow(attempt);
                debug!(
                    delay_ms = delay.as_millis() as u64,
                    "waiting before next reconnection attempt"
                );
                thread::sleep(delay);
            }
        }
    }

    /// Pins local mode until [`HybridStore::allow_cloud`] is called.
    pub fn force_local(&self) -> StorageInfo {
        let changed = {
            let mut state = lock(&self.state);
            state.forced_local = true;
            state.reconnect_attempts = 0;
            let changed = state.mode != ConnectionMode::Local;
            state.mode = ConnectionMode::Local;
            changed
        };
        info!("local mode forced");
        let info = self.info();
        if changed {
            self.notify(&info);
        }
        info
    }

    pub fn allow_cloud(&self) {
        let mut state = lock(&self.state);
        state.forced_local = false;
        state.reconnect_attempts = 0;
    }

    /// Uploads local records missing from the cloud.
    pub fn sync_local_to_cloud(&self) -> Result<SyncReport, CoreError> {
        let local = self.local.load_collection()?;
        let remote = self.cloud.load_collection()?;
        let plan = SyncPlanner::plan(&local, &remote);
        if plan.is_empty() {
            debug!("nothing to sync");
            return Ok(SyncReport::default());
        }
        plan.apply(self.cloud.as_store())
    }

    /// Checks the cloud every `interval` on a background thread.
    pub fn spawn_monitor(self: &Arc<Self>, interval: Duration) -> MonitorHandle {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let store = Arc::clone(self);
        let handle = thread::spawn(move || loop {
            match stop_rx.recv_timeout(interval) {
                Err(RecvTimeoutError::Timeout) => {
                    store.check_and_switch();
                }
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        });
        MonitorHandle {
            stop: Some(stop_tx),
            handle: Some(handle),
        }
    }

    fn apply_probe(&self, status: ConnectionStatus) {
        let connected = status.connected;
        let (previous, current) = {
            let mut state = lock(&self.state);
            let previous = state.mode;
            state.status = status;
            if state.forced_local {
                (previous, previous)
            } else {
                if connected {
                    state.mode = ConnectionMode::Cloud;
                    state.reconnect_attempts = 0;
                } else {
                    state.mode = ConnectionMode::Local;
                }
                (previous, state.mode)
            }
        };
        if previous == current {
            return;
        }
        if current == ConnectionMode::Cloud {
            info!(
                backend = self.cloud.backend_name(),
                "cloud reachable again; switching from local"
            );
            match self.sync_local_to_cloud() {
                Ok(report) if !report.is_empty() => info!(
                    categories = report.categories,
                    shortcuts = report.shortcuts,
                    skipped = report.skipped,
                    "local data synced"
                ),
                Ok(_) => {}
                Err(err) => warn!(error = %err, "local to cloud sync failed"),
            }
        } else {
            warn!(backend = self.cloud.backend_name(), "cloud unreachable; switching to local");
        }
        let info = self.info();
        self.notify(&info);
    }

    fn fallback_to_local(&self, reason: &CoreError) {
        let changed = {
            let mut state = lock(&self.state);
            state.status = ConnectionStatus::failed(reason.to_string());
            let changed = state.mode != ConnectionMode::Local;
            state.mode = ConnectionMode::Local;
            changed
        };
        if changed {
            warn!(error = %reason, "cloud request failed; falling back to local storage");
            let info = self.info();
            self.notify(&info);
        }
    }

    fn notify(&self, info: &StorageInfo) {
        lock(&self.listeners).retain(|listener| listener.send(info.clone()).is_ok());
    }

    /// Runs `op` against the active store, retrying locally when the cloud fails.
    fn route<T>(
        &self,
        op: impl Fn(&dyn ShortcutStore) -> Result<T, CoreError>,
    ) -> Result<T, CoreError> {
        if self.mode() == ConnectionMode::Cloud {
            match op(self.cloud.as_store()) {
                Err(err) if err.is_backend_failure() => self.fallback_to_local(&err),
                other => return other,
            }
        }
        op(self.local.as_ref())
    }
}

impl ShortcutStore for HybridStore {
    fn backend_name(&self) -> &str {
        if self.mode() == ConnectionMode::Cloud {
            self.cloud.backend_name()
        } else {
            self.local.backend_name()
        }
    }

    fn list_shortcuts(&self) -> Result<Vec<Shortcut>, CoreError> {
        self.route(|store| store.list_shortcuts())
    }

    fn list_categories(&self) -> Result<Vec<Category>, CoreError> {
        self.route(|store| store.list_categories())
    }

    fn add_shortcut(&self, draft: ShortcutDraft) -> Result<Shortcut, CoreError> {
        self.route(|store| store.add_shortcut(draft.clone()))
    }

    fn update_shortcut(&self, shortcut: &Shortcut) -> Result<(), CoreError> {
        self.route(|store| store.update_shortcut(shortcut))
    }

    fn delete_shortcut(&self, id: &str) -> Result<(), CoreError> {
        self.route(|store| store.delete_shortcut(id))
    }

    fn add_category(&self, name: &str) -> Result<Category, CoreError> {
        self.route(|store| store.add_category(name))
    }

    fn update_category(&self, id: &str, name: &str) -> Result<(), CoreError> {
        self.route(|store| store.update_category(id, name))
    }

    fn delete_category(&self, id: &str) -> Result<(), CoreError> {
        self.route(|store| store.delete_category(id))
    }
}

/// Stops the background monitor when stopped or dropped.
pub struct MonitorHandle {
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl MonitorHandle {
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("storage monitor thread panicked");
            }
        }
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
