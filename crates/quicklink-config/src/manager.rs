use std::{
    env, fs,
    path::{Path, PathBuf},
};

use crate::{
    files::{write_atomic, BackupDir},
    Config, ConfigError,
};

/// Environment variable pointing at the QuickLink home directory.
pub const HOME_ENV: &str = "QUICKLINK_HOME";
const BACKUP_PREFIX: &str = "config";

/// `QUICKLINK_HOME`, else the platform data directory, else the working directory.
pub fn resolve_base_dir() -> PathBuf {
    if let Some(home) = env::var_os(HOME_ENV).filter(|value| !value.is_empty()) {
        return PathBuf::from(home);
    }
    dirs::data_dir()
        .or_else(dirs::home_dir)
        .map(|base| base.join("quicklink"))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Reads and writes `config.json`, keeping named snapshots next to it.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    base_dir: PathBuf,
    config_path: PathBuf,
    backups: BackupDir,
}

impl ConfigManager {
    pub fn new(config_path: PathBuf, backups_dir: PathBuf) -> Self {
        let base_dir = config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Self {
            base_dir,
            config_path,
            backups: BackupDir::new(backups_dir, BACKUP_PREFIX),
        }
    }

    /// Lays out `<base>/config/config.json` and `<base>/config/backups/`.
    pub fn with_base_dir(base: PathBuf) -> Result<Self, ConfigError> {
        let config_dir = base.join("config");
        let backups_dir = config_dir.join("backups");
        fs::create_dir_all(&backups_dir)?;
        Ok(Self {
            config_path: config_dir.join("config.json"),
            backups: BackupDir::new(backups_dir, BACKUP_PREFIX),
            base_dir: base,
        })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn backups_dir(&self) -> &Path {
        self.backups.path()
    }

    /// Reads the stored config and layers environment overrides on top.
    pub fn load(&self) -> Result<Config, ConfigError> {
        let mut config = self.load_file()?;
        config.apply_overrides(|key| env::var(key).ok())?;
        Ok(config)
    }

    /// Reads the stored config as written on disk.
    pub fn load_file(&self) -> Result<Config, ConfigError> {
        if !self.config_path.exists() {
            return Ok(Config::default());
        }
        decode(&fs::read(&self.config_path)?)
    }

    pub fn save(&self, config: &Config) -> Result<(), ConfigError> {
        write_atomic(&self.config_path, &encode(config)?)?;
        Ok(())
    }

    /// Snapshots `config` and returns the backup's file name.
    pub fn backup(&self, config: &Config, note: Option<&str>) -> Result<String, ConfigError> {
        let entry = self.backups.save_manual(&encode(config)?, note)?;
        Ok(entry.name)
    }

    /// Loads a backup and makes it the active config.
    pub fn restore(&self, backup_name: &str) -> Result<Config, ConfigError> {
        let path = self.backups.resolve(backup_name)?;
        let config = decode(&fs::read(path)?)?;
        self.save(&config)?;
        Ok(config)
    }

    /// Backup file names, newest first.
    pub fn list_backups(&self) -> Result<Vec<String>, ConfigError> {
        Ok(self
            .backups
            .list()?
            .into_iter()
            .map(|entry| entry.name)
            .collect())
    }
}

fn encode(config: &Config) -> Result<Vec<u8>, ConfigError> {
    serde_json::to_vec_pretty(config).map_err(|err| ConfigError::Serde(err.to_string()))
}

fn decode(bytes: &[u8]) -> Result<Config, ConfigError> {
    serde_json::from_slice(bytes).map_err(|err| ConfigError::Serde(err.to_string()))
}
