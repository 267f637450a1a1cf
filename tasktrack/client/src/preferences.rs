//! Local preferences that outlive the process.
//!
//! The only preference today is the selected organization. It scopes every
//! organization-bound request, so it is read from the store at request time rather
//! than cached by callers.

use mockall::automock;
use serde_json::{Map, Value};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tasktrack_core::Organization;
use thiserror::Error;

/// Key under which the selected organization is stored.
pub const CURRENT_ORG_KEY: &str = "currentOrg";

#[derive(Error, Debug)]
pub enum PreferenceError {
    #[error("Cannot access preferences file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Cannot serialize preferences: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Storage for the organization the user is working in.
#[automock]
pub trait PreferenceStore: Send + Sync {
    /// The selected organization, or `None` when nothing is selected or the stored
    /// value could not be read.
    fn current_organization(&self) -> Option<Organization>;
    /// Persists the selection before returning.
    fn set_current_organization(&self, organization: &Organization) -> Result<(), PreferenceError>;
    fn clear_current_organization(&self) -> Result<(), PreferenceError>;
}

/// Preferences kept in a JSON document on disk.
///
/// The document is read once when the store is opened. Writes go to disk first and
/// only then replace the in-memory copy, so a failed write leaves the previous
/// selection in effect.
#[derive(Debug)]
pub struct FilePreferenceStore {
    path: PathBuf,
    current: Mutex<Option<Organization>>,
}

impl FilePreferenceStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let current = read_current(&path);
        Self {
            path,
            current: Mutex::new(current),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn update(&self, organization: Option<&Organization>) -> Result<(), PreferenceError> {
        let mut document = match read_document(&self.path) {
            Ok(document) => document,
            Err(e) => {
                tracing::warn!("Replacing unreadable preferences at {:?}: {}", self.path, e);
                Map::new()
            }
        };
        match organization {
            Some(organization) => {
                document.insert(
                    CURRENT_ORG_KEY.to_string(),
                    serde_json::to_value(organization)?,
                );
            }
            None => {
                document.remove(CURRENT_ORG_KEY);
            }
        }
        write_document(&self.path, &document)?;

        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = organization.cloned();
        Ok(())
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn current_organization(&self) -> Option<Organization> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_current_organization(&self, organization: &Organization) -> Result<(), PreferenceError> {
        self.update(Some(organization))
    }

    fn clear_current_organization(&self) -> Result<(), PreferenceError> {
        self.update(None)
    }
}

fn read_document(path: &Path) -> Result<Map<String, Value>, PreferenceError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Map::new()),
        Err(e) => return Err(e.into()),
    };
    if contents.trim().is_empty() {
        return Ok(Map::new());
    }
    Ok(serde_json::from_str(&contents)?)
}

fn write_document(path: &Path, document: &Map<String, Value>) -> Result<(), PreferenceError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(document)?)?;
    Ok(())
}

fn read_current(path: &Path) -> Option<Organization> {
    let document = match read_document(path) {
        Ok(document) => document,
        Err(e) => {
            tracing::warn!("Ignoring unreadable preferences at {:?}: {}", path, e);
            return None;
        }
    };
    let value = document.get(CURRENT_ORG_KEY)?.clone();
    match serde_json::from_value(value) {
        Ok(organization) => Some(organization),
        Err(e) => {
            tracing::warn!("Ignoring malformed {} preference: {}", CURRENT_ORG_KEY, e);
            None
        }
    }
}

/// Preferences held only for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    current: Mutex<Option<Organization>>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_organization(organization: Organization) -> Self {
        Self {
            current: Mutex::new(Some(organization)),
        }
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn current_organization(&self) -> Option<Organization> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_current_organization(&self, organization: &Organization) -> Result<(), PreferenceError> {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = Some(organization.clone());
        Ok(())
    }

    fn clear_current_organization(&self) -> Result<(), PreferenceError> {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}
