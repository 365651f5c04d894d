use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use quicklink_config::{write_atomic, BackupDir, BackupEntry};
use quicklink_core::{CoreError, DocumentBackend, DocumentStore};
use quicklink_domain::Collection;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub const CURRENT_SCHEMA_VERSION: u32 = 1;
pub const DATA_FILE_NAME: &str = "quicklink.json";
const BACKUP_PREFIX: &str = "quicklink";
const DEFAULT_RETENTION: usize = 5;

/// On-disk document wrapping the collection with a schema version.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredDocument {
    #[serde(default = "default_schema_version")]
    schema_version: u32,
    #[serde(flatten)]
    collection: Collection,
}

fn default_schema_version() -> u32 {
    CURRENT_SCHEMA_VERSION
}

/// Local JSON file holding every shortcut and category, with rolling backups.
#[derive(Debug, Clone)]
pub struct JsonDocumentBackend {
    data_path: PathBuf,
    backups: BackupDir,
    /// Automatic backups kept; named ones are never pruned.
    retention: usize,
}

pub type JsonShortcutStore = DocumentStore<JsonDocumentBackend>;

/// Opens (creating directories as needed) the local store under `data_dir`.
pub fn open_store(
    data_dir: &Path,
    retention: Option<usize>,
) -> Result<JsonShortcutStore, CoreError> {
    let backend = JsonDocumentBackend::with_retention(
        data_dir.join(DATA_FILE_NAME),
        data_dir.join("backups"),
        retention.unwrap_or(DEFAULT_RETENTION),
    )?;
    Ok(DocumentStore::new(backend))
}

impl JsonDocumentBackend {
    pub fn new(data_path: PathBuf, backups_dir: PathBuf) -> Result<Self, CoreError> {
        Self::with_retention(data_path, backups_dir, DEFAULT_RETENTION)
    }

    pub fn with_retention(
        data_path: PathBuf,
        backups_dir: PathBuf,
        retention: usize,
    ) -> Result<Self, CoreError> {
        if let Some(parent) = data_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::create_dir_all(&backups_dir)?;
        Ok(Self {
            data_path,
            backups: BackupDir::new(backups_dir, BACKUP_PREFIX),
            retention: retention.max(1),
        })
    }

    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    pub fn backups_dir(&self) -> &Path {
        self.backups.path()
    }

    /// Copies the current data file into a named backup that survives pruning.
    pub fn backup(&self, note: Option<&str>) -> Result<BackupInfo, CoreError> {
        if !self.data_path.exists() {
            return Err(CoreError::Storage("nothing to back up yet".into()));
        }
        let entry = self.backups.save_manual(&fs::read(&self.data_path)?, note)?;
        debug!(backup = %entry.name, "data file backed up");
        Ok(entry.into())
    }

    pub fn list_backups(&self) -> Result<Vec<BackupInfo>, CoreError> {
        Ok(self.backups.list()?.into_iter().map(BackupInfo::from).collect())
    }

    /// Replaces the data file with the named backup and returns its contents.
    pub fn restore(&self, backup_id: &str) -> Result<Collection, CoreError> {
        let source = self
            .backups
            .resolve(backup_id)
            .map_err(|err| CoreError::Storage(err.to_string()))?;
        let collection = read_collection(&source)?;
        self.write_document(&collection)?;
        Ok(collection)
    }

    /// Writes the current collection to an arbitrary path.
    pub fn export_to(&self, path: &Path) -> Result<(), CoreError> {
        export_collection(path, &self.load()?)
    }

    fn write_document(&self, collection: &Collection) -> Result<(), CoreError> {
        let previous = self.data_path.exists();
        if previous {
            self.backups.save_automatic(&fs::read(&self.data_path)?)?;
        }
        write_document_to(&self.data_path, collection)?;
        if previous {
            self.prune_backups();
        }
        Ok(())
    }

    fn prune_backups(&self) {
        match self.backups.prune_automatic(self.retention) {
            Ok(removed) if !removed.is_empty() => {
                debug!(count = removed.len(), "pruned automatic backups");
            }
            Ok(_) => {}
            Err(err) => warn!(error = %err, "failed to prune backups"),
        }
    }
}

impl DocumentBackend for JsonDocumentBackend {
    fn name(&self) -> &str {
        "local"
    }

    fn load(&self) -> Result<Collection, CoreError> {
        if !self.data_path.exists() {
            return Ok(Collection::default());
        }
        read_collection(&self.data_path)
    }

    fn save(&self, collection: &Collection) -> Result<(), CoreError> {
        self.write_document(collection)
    }
}

/// Writes `collection` as a versioned document at `path`.
pub fn export_collection(path: &Path, collection: &Collection) -> Result<(), CoreError> {
    write_document_to(path, collection)
}

/// Reads a collection document (with or without a schema version) from disk.
pub fn import_from(path: &Path) -> Result<Collection, CoreError> {
    read_collection(path)
}

fn read_collection(path: &Path) -> Result<Collection, CoreError> {
    let data = fs::read_to_string(path)?;
    let document: StoredDocument =
        serde_json::from_str(&data).map_err(|err| CoreError::Serde(err.to_string()))?;
    if document.schema_version > CURRENT_SCHEMA_VERSION {
        return Err(CoreError::Storage(format!(
            "{} uses schema v{}, newer than supported v{}",
            path.display(),
            document.schema_version,
            CURRENT_SCHEMA_VERSION
        )));
    }
    Ok(document.collection)
}

fn write_document_to(path: &Path, collection: &Collection) -> Result<(), CoreError> {
    let document = StoredDocument {
        schema_version: CURRENT_SCHEMA_VERSION,
        collection: collection.clone(),
    };
    let json =
        serde_json::to_vec_pretty(&document).map_err(|err| CoreError::Serde(err.to_string()))?;
    write_atomic(path, &json)?;
    Ok(())
}

#[derive(Debug, Clone)]
pub struct BackupInfo {
    pub id: String,
    pub created_at: Option<DateTime<Utc>>,
    /// `None` for the automatic copies taken before each save.
    pub note: Option<String>,
    pub size_bytes: u64,
    pub path: PathBuf,
}

impl From<BackupEntry> for BackupInfo {
    fn from(entry: BackupEntry) -> Self {
        Self {
            id: entry.name,
            created_at: entry.created_at,
            note: entry.note,
            size_bytes: entry.size_bytes,
            path: entry.path,
        }
    }
}
