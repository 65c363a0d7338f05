use directories::ProjectDirs;
use std::path::{Path, PathBuf};

pub fn data_root() -> PathBuf {
    if let Some(pd) = ProjectDirs::from("org", "gerirecall", "gerirecall") {
        pd.data_dir().to_path_buf()
    } else {
        // Fallback: current dir
        std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
    }
}

/// Blob file and backups directory for `key` under `root`.
pub fn store_files(root: &Path, key: &str) -> (PathBuf, PathBuf) {
    let file = root.join(format!("{key}.json"));
    let backups = root.join("backups");
    (file, backups)
}
