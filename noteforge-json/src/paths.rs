use directories::ProjectDirs;
use std::path::PathBuf;

pub fn data_root() -> PathBuf {
    if let Some(pd) = ProjectDirs::from("com", "noteforge", "NoteForge") {
        pd.data_dir().to_path_buf()
    } else {
        std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
    }
}

/// Store file and its backups directory under the data root.
pub fn default_store_file() -> (PathBuf, PathBuf) {
    let root = data_root();
    (root.join("noteforge.json"), root.join("backups"))
}

pub fn default_settings_file() -> PathBuf {
    data_root().join("settings.json")
}

pub fn default_sqlite_file() -> PathBuf {
    data_root().join("noteforge.sqlite")
}
