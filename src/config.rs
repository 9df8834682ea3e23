//! Settings storage for the credential and the repository selection.
//!
//! Settings are plain optional strings. The store persists them and
//! broadcasts the key of every value that changed; interpreting the values
//! (for example checking that owner and name are both present) is left to
//! the synchronization engine.
//!
//! Example settings file:
//! ```yaml
//! auth_token: ghp_...
//! repo_owner: acme
//! repo_name: widgets
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio::sync::broadcast;

use crate::error::{Result, SyncError};
use crate::types::{Credential, RepositorySelection};

const CHANNEL_CAPACITY: usize = 16;

/// Keys owned by this crate's settings namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    AuthToken,
    RepoOwner,
    RepoName,
}

impl ConfigKey {
    pub const ALL: [ConfigKey; 3] = [ConfigKey::AuthToken, ConfigKey::RepoOwner, ConfigKey::RepoName];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigKey::AuthToken => "auth_token",
            ConfigKey::RepoOwner => "repo_owner",
            ConfigKey::RepoName => "repo_name",
        }
    }
}

/// Persisted key/value settings with change notification
pub trait Settings: Send + Sync {
    fn get(&self, key: ConfigKey) -> Option<String>;

    /// Apply all changes in one durable write, then notify once per key.
    /// `None` clears a key.
    fn update(&self, changes: &[(ConfigKey, Option<String>)]) -> Result<()>;

    fn subscribe(&self) -> broadcast::Receiver<ConfigKey>;

    fn set(&self, key: ConfigKey, value: Option<String>) -> Result<()> {
        self.update(&[(key, value)])
    }

    fn credential(&self) -> Option<Credential> {
        self.get(ConfigKey::AuthToken).and_then(Credential::new)
    }

    fn selection(&self) -> Result<RepositorySelection> {
        RepositorySelection::from_parts(self.get(ConfigKey::RepoOwner), self.get(ConfigKey::RepoName))
    }

    /// Write owner and name together so no partial selection is ever stored
    fn set_selection(&self, selection: &RepositorySelection) -> Result<()> {
        self.update(&[
            (ConfigKey::RepoOwner, Some(selection.owner.clone())),
            (ConfigKey::RepoName, Some(selection.name.clone())),
        ])
    }
}

/// On-disk shape of the settings file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingsFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_name: Option<String>,
}

impl SettingsFile {
    fn get(&self, key: ConfigKey) -> Option<String> {
        let value = match key {
            ConfigKey::AuthToken => &self.auth_token,
            ConfigKey::RepoOwner => &self.repo_owner,
            ConfigKey::RepoName => &self.repo_name,
        };
        value.clone().filter(|v| !v.is_empty())
    }

    /// Returns true if the stored value changed
    fn put(&mut self, key: ConfigKey, value: Option<String>) -> bool {
        let slot = match key {
            ConfigKey::AuthToken => &mut self.auth_token,
            ConfigKey::RepoOwner => &mut self.repo_owner,
            ConfigKey::RepoName => &mut self.repo_name,
        };
        let value = value.filter(|v| !v.is_empty());
        if *slot == value {
            return false;
        }
        *slot = value;
        true
    }

    /// Apply changes, returning the keys whose values actually changed
    fn apply(&mut self, changes: &[(ConfigKey, Option<String>)]) -> Vec<ConfigKey> {
        let mut changed = Vec::new();
        for (key, value) in changes {
            if self.put(*key, value.clone()) && !changed.contains(key) {
                changed.push(*key);
            }
        }
        changed
    }
}

/// Default location of the settings file
pub fn default_settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("issue-sidebar").join("settings.yaml"))
}

/// YAML-backed settings store
pub struct FileSettings {
    path: PathBuf,
    state: Mutex<SettingsFile>,
    credential_override: Option<String>,
    changes: broadcast::Sender<ConfigKey>,
}

impl FileSettings {
    /// Load settings from `path`. A missing file means every key is absent.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let state = read_settings_file(&path)?;
        let (changes, _) = broadcast::channel(CHANNEL_CAPACITY);

        tracing::debug!(path = %path.display(), "Loaded settings");

        Ok(Self {
            path,
            state: Mutex::new(state),
            credential_override: None,
            changes,
        })
    }

    /// Use `token` as the credential for the lifetime of this store without
    /// persisting it
    pub fn with_credential_override(mut self, token: Option<String>) -> Self {
        self.credential_override = token.filter(|t| !t.trim().is_empty());
        self
    }

    /// Re-read the file, notifying for every key another process changed
    pub fn reload(&self) -> Result<()> {
        let on_disk = read_settings_file(&self.path)?;
        let changed: Vec<ConfigKey> = {
            let mut state = self.state.lock().map_err(|_| lock_poisoned())?;
            let changed = ConfigKey::ALL
                .into_iter()
                .filter(|key| state.get(*key) != on_disk.get(*key))
                .collect();
            *state = on_disk;
            changed
        };

        for key in changed {
            tracing::debug!(key = key.as_str(), "Setting changed on disk");
            let _ = self.changes.send(key);
        }

        Ok(())
    }
}

fn read_settings_file(path: &Path) -> Result<SettingsFile> {
    match fs::read_to_string(path) {
        Ok(content) if content.trim().is_empty() => Ok(SettingsFile::default()),
        Ok(content) => serde_yaml::from_str(&content).map_err(|e| {
            SyncError::settings(format!("Failed to parse {}: {}", path.display(), e))
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(SettingsFile::default()),
        Err(e) => Err(SyncError::settings(format!(
            "Failed to read {}: {}",
            path.display(),
            e
        ))),
    }
}

fn write_settings_file(path: &Path, settings: &SettingsFile) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            SyncError::settings(format!("Failed to create {}: {}", parent.display(), e))
        })?;
    }

    let yaml = serde_yaml::to_string(settings)
        .map_err(|e| SyncError::settings(format!("Failed to serialize settings: {}", e)))?;

    // Write to a sibling file and rename so a crash never leaves half a file
    let tmp = path.with_extension("yaml.tmp");
    fs::write(&tmp, yaml)
        .and_then(|_| fs::rename(&tmp, path))
        .map_err(|e| SyncError::settings(format!("Failed to write {}: {}", path.display(), e)))
}

fn lock_poisoned() -> SyncError {
    SyncError::settings("settings lock poisoned")
}

impl Settings for FileSettings {
    fn get(&self, key: ConfigKey) -> Option<String> {
        if key == ConfigKey::AuthToken {
            if let Some(token) = &self.credential_override {
                return Some(token.clone());
            }
        }
        self.state.lock().ok()?.get(key)
    }

    fn update(&self, changes: &[(ConfigKey, Option<String>)]) -> Result<()> {
        let changed = {
            let mut state = self.state.lock().map_err(|_| lock_poisoned())?;
            let mut next = state.clone();
            let changed = next.apply(changes);
            if changed.is_empty() {
                return Ok(());
            }
            write_settings_file(&self.path, &next)?;
            *state = next;
            changed
        };

        for key in changed {
            tracing::debug!(key = key.as_str(), "Setting changed");
            // No receivers is fine
            let _ = self.changes.send(key);
        }

        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<ConfigKey> {
        self.changes.subscribe()
    }
}

/// In-process settings store with the same contract as [`FileSettings`]
pub struct MemorySettings {
    state: Mutex<SettingsFile>,
    changes: broadcast::Sender<ConfigKey>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::from_file(SettingsFile::default())
    }

    pub fn from_file(state: SettingsFile) -> Self {
        let (changes, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            state: Mutex::new(state),
            changes,
        }
    }

    pub fn with(self, key: ConfigKey, value: &str) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.put(key, Some(value.to_string()));
        }
        self
    }
}

impl Default for MemorySettings {
    fn default() -> Self {
        Self::new()
    }
}

impl Settings for MemorySettings {
    fn get(&self, key: ConfigKey) -> Option<String> {
        self.state.lock().ok()?.get(key)
    }

    fn update(&self, changes: &[(ConfigKey, Option<String>)]) -> Result<()> {
        let changed = self.state.lock().map_err(|_| lock_poisoned())?.apply(changes);
        for key in changed {
            let _ = self.changes.send(key);
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<ConfigKey> {
        self.changes.subscribe()
    }
}
