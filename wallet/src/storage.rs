//! Client-side key/value storage
//!
//! A small JSON object on disk standing in for the browser's local storage.
//! Every write rewrites the whole file with owner-only permissions.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cluster::Cluster;
use crate::error::StorageError;
use crate::LOCAL_STORAGE_CLAIM_CODE;

/// Default directory for burner wallet data
const BURNER_DIR: &str = ".burner";
const STORAGE_FILE: &str = "storage.json";

/// A claim code the user generated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimCodeRecord {
    pub code: String,
    pub cluster: Cluster,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// JSON file backed string storage
#[derive(Debug, Clone)]
pub struct LocalStorage {
    path: PathBuf,
}

impl LocalStorage {
    /// Storage file inside `dir`
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(STORAGE_FILE),
        }
    }

    /// `~/.burner`
    pub fn default_dir() -> Result<PathBuf, StorageError> {
        dirs::home_dir()
            .map(|home| home.join(BURNER_DIR))
            .ok_or(StorageError::NoHomeDirectory)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read_all()?.remove(key))
    }

    pub fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut items = self.read_all()?;
        items.insert(key.to_string(), value.to_string());
        self.write_all(&items)
    }

    pub fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let mut items = self.read_all()?;
        if items.remove(key).is_some() {
            self.write_all(&items)?;
        }
        Ok(())
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, StorageError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let json = fs::read_to_string(&self.path)?;
        if json.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&json)?)
    }

    fn write_all(&self, items: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(items)?;

        // Set restrictive permissions on Unix
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::write(&self.path, &json)?;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))?;
        }

        #[cfg(not(unix))]
        {
            fs::write(&self.path, &json)?;
        }

        Ok(())
    }

    // ==================== Claim codes ====================

    /// All stored claim codes, oldest first
    ///
    /// An unparsable listing reads as empty.
    pub fn claim_codes(&self) -> Result<Vec<ClaimCodeRecord>, StorageError> {
        let Some(json) = self.get_item(LOCAL_STORAGE_CLAIM_CODE)? else {
            return Ok(Vec::new());
        };

        match serde_json::from_str(&json) {
            Ok(records) => Ok(records),
            Err(e) => {
                tracing::warn!("Ignoring unreadable claim code listing: {}", e);
                Ok(Vec::new())
            }
        }
    }

    /// Append a claim code
    pub fn save_claim_code(&self, code: &str, cluster: Cluster) -> Result<(), StorageError> {
        let mut records = self.claim_codes()?;
        records.push(ClaimCodeRecord {
            code: code.to_string(),
            cluster,
            created_at: Some(Utc::now()),
        });
        self.write_claim_codes(&records)
    }

    /// Remove every record with this code
    pub fn remove_claim_code(&self, code: &str) -> Result<bool, StorageError> {
        let mut records = self.claim_codes()?;
        let before = records.len();
        records.retain(|record| record.code != code);

        if records.len() == before {
            return Ok(false);
        }
        self.write_claim_codes(&records)?;
        Ok(true)
    }

    fn write_claim_codes(&self, records: &[ClaimCodeRecord]) -> Result<(), StorageError> {
        let json = serde_json::to_string(records)?;
        self.set_item(LOCAL_STORAGE_CLAIM_CODE, &json)
    }
}
