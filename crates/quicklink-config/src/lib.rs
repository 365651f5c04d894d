//! quicklink-config
//!
//! Persistent user preferences and backend credentials.
//! Owns the Config data structure plus disk persistence helpers.

pub mod error;
pub mod files;
pub mod manager;
pub mod model;

pub use error::ConfigError;
pub use files::{write_atomic, BackupDir, BackupEntry};
pub use manager::{resolve_base_dir, ConfigManager, HOME_ENV};
pub use model::{Config, FirebaseConfig, SheetsConfig, StorageMode, SupabaseConfig};
