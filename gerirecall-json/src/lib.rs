use chrono::NaiveDateTime;
use gerirecall_core::{CoreError, Snapshot, Store};
use parking_lot::Mutex;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

pub mod paths;

pub const DEFAULT_MAX_BACKUPS: usize = 10;

const BACKUP_STAMP: &str = "%Y%m%d-%H%M%S";

/// Stores the scheduler snapshot as one JSON file named after its storage
/// key, keeping a rotating set of timestamped copies next to it.
pub struct JsonFileStore {
    key: String,
    path: PathBuf,
    backups_dir: PathBuf,
    max_backups: usize,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn open_in(root: &Path, key: &str, max_backups: usize) -> Result<Self, CoreError> {
        let key = key.trim();
        if key.is_empty() || key.contains(['/', '\\']) {
            return Err(CoreError::InvalidInput(format!("bad storage key: {key:?}")));
        }
        let (path, backups_dir) = paths::store_files(root, key);
        ensure_parent_dirs(&path)?;
        ensure_dir(&backups_dir)?;
        info!(path = %path.display(), "opened json store");
        Ok(Self {
            key: key.to_string(),
            path,
            backups_dir,
            max_backups: max_backups.max(1),
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backups_dir(&self) -> &Path {
        &self.backups_dir
    }
}

impl Store for JsonFileStore {
    fn load(&self) -> Result<Option<Snapshot>, CoreError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let buf = fs::read_to_string(&self.path).map_err(CoreError::storage)?;
        let snapshot = serde_json::from_str::<Snapshot>(&buf)?;
        debug!(items = snapshot.cards.len(), "read json store");
        Ok(Some(snapshot))
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), CoreError> {
        let _guard = self.write_lock.lock();
        let json = serde_json::to_vec_pretty(snapshot)?;
        write_with_backup(&self.path, &self.backups_dir, &self.key, self.max_backups, &json)
            .map_err(CoreError::storage)
    }
}

fn ensure_parent_dirs(path: &Path) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    Ok(())
}

fn ensure_dir(path: &Path) -> Result<(), CoreError> {
    fs::create_dir_all(path).map_err(CoreError::storage)
}

fn write_atomic(dir: &Path, target: &Path, bytes: &[u8]) -> Result<(), std::io::Error> {
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.flush()?;
    tmp.persist(target).map_err(|e| e.error)?;
    Ok(())
}

fn write_with_backup(
    path: &Path,
    backups_dir: &Path,
    key: &str,
    max_backups: usize,
    json: &[u8],
) -> Result<(), std::io::Error> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)?;
    fs::create_dir_all(backups_dir)?;

    write_atomic(parent, path, json)?;

    let ts = chrono::Local::now().format(BACKUP_STAMP);
    let backup_path = backups_dir.join(format!("{key}-{ts}.json"));
    write_atomic(backups_dir, &backup_path, json)?;

    rotate_backups(backups_dir, key, max_backups)
}

/// True for `<key>-<stamp>.json`. A key that extends this one
/// (`ward` vs `ward-3`) leaves a non-stamp remainder and does not match.
fn is_backup_of(name: &str, key: &str) -> bool {
    name.strip_prefix(key)
        .and_then(|rest| rest.strip_prefix('-'))
        .and_then(|rest| rest.strip_suffix(".json"))
        .is_some_and(|stamp| NaiveDateTime::parse_from_str(stamp, BACKUP_STAMP).is_ok())
}

fn rotate_backups(dir: &Path, key: &str, keep: usize) -> Result<(), std::io::Error> {
    let mut entries: Vec<_> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .filter(|e| is_backup_of(&e.file_name().to_string_lossy(), key))
        .collect();
    // timestamped names sort chronologically
    entries.sort_by_key(|e| e.file_name());
    if entries.len() > keep {
        for e in &entries[0..entries.len() - keep] {
            let _ = fs::remove_file(e.path());
        }
    }
    Ok(())
}
