//! On-disk conventions shared by the data file and the config file: atomic
//! replacement and a directory of timestamped backups.
//!
//! Backup names look like `<prefix>_<YYYYmmdd>_<HHMMSS>[-<n>][_<note>].json`.
//! Backups without a note are taken automatically before each save and are the
//! only ones [`BackupDir::prune_automatic`] removes.

use std::{
    cmp::Reverse,
    ffi::OsString,
    fs::{self, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
};

use chrono::{DateTime, NaiveDateTime, Utc};

const EXTENSION: &str = "json";
const STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const MANUAL_NOTE: &str = "manual";

/// Writes `contents` to a sibling temp file, then renames it over `path`.
pub fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut tmp = OsString::from(path.as_os_str());
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let mut file = fs::File::create(&tmp)?;
    file.write_all(contents)?;
    file.sync_all()?;
    fs::rename(&tmp, path)
}

/// One file in a [`BackupDir`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupEntry {
    pub name: String,
    pub path: PathBuf,
    pub created_at: Option<DateTime<Utc>>,
    pub note: Option<String>,
    pub size_bytes: u64,
    automatic: bool,
    sequence: u32,
}

impl BackupEntry {
    /// Taken before a save rather than requested by the user.
    pub fn is_automatic(&self) -> bool {
        self.automatic
    }
}

#[derive(Debug, Clone)]
pub struct BackupDir {
    dir: PathBuf,
    prefix: String,
}

impl BackupDir {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    pub fn save_automatic(&self, contents: &[u8]) -> io::Result<BackupEntry> {
        self.save(contents, None)
    }

    /// Stores a user-requested backup. These always carry a note and survive pruning.
    pub fn save_manual(&self, contents: &[u8], note: Option<&str>) -> io::Result<BackupEntry> {
        let note = sanitize_note(note).unwrap_or_else(|| MANUAL_NOTE.to_string());
        self.save(contents, Some(note.as_str()))
    }

    /// Every `.json` file in the directory, newest first.
    pub fn list(&self) -> io::Result<Vec<BackupEntry>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(EXTENSION) {
                continue;
            }
            let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
                continue;
            };
            let size_bytes = fs::metadata(&path).map(|meta| meta.len()).unwrap_or(0);
            entries.push(self.describe(name.to_string(), path.clone(), size_bytes));
        }
        entries.sort_by_key(|entry| Reverse((entry.created_at, entry.sequence)));
        Ok(entries)
    }

    /// Path of the backup called `name`. Names that could leave the directory are rejected.
    pub fn resolve(&self, name: &str) -> io::Result<PathBuf> {
        let escapes = name.is_empty()
            || name.contains("..")
            || name.contains(|ch: char| ch == '/' || ch == '\\')
            || Path::new(name).is_absolute();
        if escapes {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid backup name `{}`", name),
            ));
        }
        let path = self.dir.join(name);
        if !path.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("backup `{}` not found", name),
            ));
        }
        Ok(path)
    }

    /// Deletes all but the newest `keep` automatic backups and returns what was removed.
    pub fn prune_automatic(&self, keep: usize) -> io::Result<Vec<BackupEntry>> {
        let stale: Vec<BackupEntry> = self
            .list()?
            .into_iter()
            .filter(BackupEntry::is_automatic)
            .skip(keep)
            .collect();
        for entry in &stale {
            fs::remove_file(&entry.path)?;
        }
        Ok(stale)
    }

    fn save(&self, contents: &[u8], note: Option<&str>) -> io::Result<BackupEntry> {
        fs::create_dir_all(&self.dir)?;
        let stamp = Utc::now().format(STAMP_FORMAT).to_string();
        let mut sequence = 0u32;
        loop {
            let name = self.file_name(&stamp, sequence, note);
            let path = self.dir.join(&name);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    file.write_all(contents)?;
                    file.sync_all()?;
                    return Ok(self.describe(name, path, contents.len() as u64));
                }
                Err(err) if err.kind() == io::ErrorKind::AlreadyExists => sequence += 1,
                Err(err) => return Err(err),
            }
        }
    }

    fn file_name(&self, stamp: &str, sequence: u32, note: Option<&str>) -> String {
        let mut name = format!("{}_{}", self.prefix, stamp);
        if sequence > 0 {
            name.push_str(&format!("-{}", sequence));
        }
        if let Some(note) = note {
            name.push('_');
            name.push_str(note);
        }
        name.push('.');
        name.push_str(EXTENSION);
        name
    }

    fn describe(&self, name: String, path: PathBuf, size_bytes: u64) -> BackupEntry {
        let parsed = parse_name(&self.prefix, &name);
        BackupEntry {
            created_at: parsed.as_ref().map(|parsed| parsed.created_at),
            note: parsed.as_ref().and_then(|parsed| parsed.note.clone()),
            automatic: parsed.as_ref().is_some_and(|parsed| parsed.note.is_none()),
            sequence: parsed.as_ref().map_or(0, |parsed| parsed.sequence),
            name,
            path,
            size_bytes,
        }
    }
}

struct ParsedName {
    created_at: DateTime<Utc>,
    sequence: u32,
    note: Option<String>,
}

fn parse_name(prefix: &str, name: &str) -> Option<ParsedName> {
    let stem = name
        .strip_suffix(EXTENSION)?
        .strip_suffix('.')?
        .strip_prefix(prefix)?
        .strip_prefix('_')?;
    let mut parts = stem.splitn(3, '_');
    let date = parts.next()?;
    let time_part = parts.next()?;
    let (time, sequence) = match time_part.split_once('-') {
        Some((time, sequence)) => (time, sequence.parse().ok()?),
        None => (time_part, 0),
    };
    let note = parts.next().map(str::to_string);
    if !is_digits(date, 8) || !is_digits(time, 6) {
        return None;
    }
    let stamp = format!("{}_{}", date, time);
    let naive = NaiveDateTime::parse_from_str(&stamp, STAMP_FORMAT).ok()?;
    Some(ParsedName {
        created_at: DateTime::from_naive_utc_and_offset(naive, Utc),
        sequence,
        note,
    })
}

fn is_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.chars().all(|ch| ch.is_ascii_digit())
}

/// Lowercase alphanumerics joined by single dashes; `None` when nothing usable remains.
fn sanitize_note(note: Option<&str>) -> Option<String> {
    let words: Vec<String> = note?
        .split(|ch: char| !ch.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_ascii_lowercase)
        .collect();
    if words.is_empty() {
        None
    } else {
        Some(words.join("-"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn names_carry_timestamp_sequence_and_note() {
        let parsed =
            parse_name("quicklink", "quicklink_20240115_093000-2_before-sync.json").unwrap();
        assert_eq!(
            parsed.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            "2024-01-15 09:30:00"
        );
        assert_eq!(parsed.sequence, 2);
        assert_eq!(parsed.note.as_deref(), Some("before-sync"));

        let plain = parse_name("quicklink", "quicklink_20240115_093000.json").unwrap();
        assert_eq!((plain.sequence, plain.note), (0, None));
        assert!(parse_name("quicklink", "notes.json").is_none());
        assert!(parse_name("config", "quicklink_20240115_093000.json").is_none());
    }

    #[test]
    fn notes_are_sanitized() {
        assert_eq!(sanitize_note(Some("  Before Sync!! ")), Some("before-sync".into()));
        assert_eq!(sanitize_note(Some("v1.2_final")), Some("v1-2-final".into()));
        assert_eq!(sanitize_note(Some("***")), None);
        assert_eq!(sanitize_note(None), None);
    }

    #[test]
    fn backups_in_the_same_second_get_distinct_names() {
        let dir = tempdir().unwrap();
        let backups = BackupDir::new(dir.path(), "quicklink");
        let first = backups.save_automatic(b"one").unwrap();
        let second = backups.save_automatic(b"two").unwrap();
        let third = backups.save_automatic(b"three").unwrap();

        assert_ne!(first.name, second.name);
        assert_ne!(second.name, third.name);
        assert_eq!(fs::read(&first.path).unwrap(), b"one");
        assert_eq!(backups.list().unwrap()[0].name, third.name);
    }

    #[test]
    fn pruning_keeps_named_backups() {
        let dir = tempdir().unwrap();
        let backups = BackupDir::new(dir.path(), "quicklink");
        backups.save_automatic(b"a").unwrap();
        let named = backups.save_manual(b"b", Some("important")).unwrap();
        let unnamed = backups.save_manual(b"c", None).unwrap();
        for _ in 0..3 {
            backups.save_automatic(b"d").unwrap();
        }

        let removed = backups.prune_automatic(2).unwrap();
        assert_eq!(removed.len(), 2);
        assert!(removed.iter().all(BackupEntry::is_automatic));

        let left: Vec<String> = backups.list().unwrap().into_iter().map(|e| e.name).collect();
        assert_eq!(left.len(), 4);
        assert!(left.contains(&named.name));
        assert!(unnamed.name.ends_with("_manual.json"));
        assert!(left.contains(&unnamed.name));
    }

    #[test]
    fn resolve_stays_inside_the_directory() {
        let dir = tempdir().unwrap();
        let backups = BackupDir::new(dir.path().join("backups"), "config");
        fs::write(dir.path().join("outside.json"), "{}").unwrap();
        let saved = backups.save_manual(b"{}", Some("keep")).unwrap();

        assert_eq!(backups.resolve(&saved.name).unwrap(), saved.path);
        for name in ["../outside.json", "..", "", "sub/file.json", "sub\\file.json"] {
            let err = backups.resolve(name).unwrap_err();
            assert_eq!(err.kind(), io::ErrorKind::InvalidInput, "{name}");
        }
        assert_eq!(
            backups.resolve("config_missing.json").unwrap_err().kind(),
            io::ErrorKind::NotFound
        );
    }

    #[test]
    fn atomic_write_replaces_contents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
        assert!(!dir.path().join("nested").join("config.json.tmp").exists());
    }
}
