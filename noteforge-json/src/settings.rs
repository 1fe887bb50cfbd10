//! Preferences file stored next to the data store.

use anyhow::{Context, Result};
use noteforge_core::Settings;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::{paths, write_atomic};

pub struct SettingsFile {
    path: PathBuf,
}

impl SettingsFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn open_default() -> Self {
        Self::new(paths::default_settings_file())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file yields defaults. So does an unreadable one, with a warning.
    pub fn load(&self) -> Settings {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Settings::default(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "cannot read settings, using defaults");
                return Settings::default();
            }
        };
        match Settings::from_json(&raw) {
            Ok(settings) => settings,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "corrupt settings, using defaults");
                Settings::default()
            }
        }
    }

    /// Loads the file, creating it when absent so the owner id stays stable.
    pub fn load_or_create(&self) -> Result<Settings> {
        if self.path.exists() {
            return Ok(self.load());
        }
        let settings = Settings::default();
        self.save(&settings)?;
        Ok(settings)
    }

    pub fn save(&self, settings: &Settings) -> Result<()> {
        let json = settings.to_json().context("encode settings")?;
        write_atomic(&self.path, json.as_bytes())
            .with_context(|| format!("write {}", self.path.display()))
    }

    pub fn update<F>(&self, f: F) -> Result<Settings>
    where
        F: FnOnce(&mut Settings),
    {
        let mut settings = self.load_or_create()?;
        f(&mut settings);
        self.save(&settings)?;
        Ok(settings)
    }

    /// Restores defaults but keeps the owner id so existing notes stay reachable.
    pub fn reset(&self) -> Result<Settings> {
        let owner_id = self.load_or_create()?.owner_id;
        let settings = Settings {
            owner_id,
            ..Default::default()
        };
        self.save(&settings)?;
        Ok(settings)
    }
}
