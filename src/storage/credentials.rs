//! Credential storage
//!
//! The session manager owns exactly one [`CredentialStore`]. The file-backed
//! store keeps the credential between invocations; every update goes through
//! a temp file in the same directory followed by a rename, so an interrupted
//! write leaves the previous credential intact.

use super::Result;
use crate::error::StorageError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub const CREDENTIALS_FILE_NAME: &str = "credentials.json";

#[derive(Serialize, Deserialize, Clone, PartialEq)]
pub struct Credential {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Credential {
    /// A credential without a known expiry is treated as valid until the
    /// server says otherwise.
    pub fn is_expired(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        match self.expires_at {
            Some(expires_at) => now + margin >= expires_at,
            None => false,
        }
    }

    pub fn has_refresh_token(&self) -> bool {
        self.refresh_token.as_ref().is_some_and(|t| !t.is_empty())
    }
}

// Tokens never show up in logs or panic messages
impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"<redacted>")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "<redacted>"),
            )
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

pub trait CredentialStore {
    fn current(&self) -> Option<&Credential>;
    /// Replace the held credential. Implementations must not leave a
    /// partially written credential behind on failure.
    fn replace(&mut self, credential: Credential) -> Result<()>;
    fn clear(&mut self) -> Result<()>;
}

/// Process-lifetime store; nothing touches the disk.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    credential: Option<Credential>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credential(credential: Credential) -> Self {
        Self {
            credential: Some(credential),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn current(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    fn replace(&mut self, credential: Credential) -> Result<()> {
        self.credential = Some(credential);
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.credential = None;
        Ok(())
    }
}

#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    credential: Option<Credential>,
}

impl FileCredentialStore {
    /// Read the cached credential once. A missing file means no credential.
    pub fn open(path: PathBuf) -> Result<Self> {
        let credential = if path.exists() {
            let content = fs::read_to_string(&path).map_err(|source| StorageError::FileIo {
                path: path.to_string_lossy().to_string(),
                source,
            })?;
            let credential: Credential = serde_json::from_str(&content).map_err(|e| {
                StorageError::CredentialParseError {
                    message: format!("{}: {}", path.to_string_lossy(), e),
                }
            })?;
            Some(credential)
        } else {
            None
        };

        Ok(Self { path, credential })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_atomically(&self, credential: &Credential) -> Result<()> {
        let parent = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        fs::create_dir_all(parent).map_err(|source| StorageError::FileIo {
            path: parent.to_string_lossy().to_string(),
            source,
        })?;

        let content =
            serde_json::to_vec_pretty(credential).map_err(|e| StorageError::CredentialParseError {
                message: format!("Failed to serialize credential: {}", e),
            })?;

        let io_error = |source: std::io::Error| StorageError::FileIo {
            path: self.path.to_string_lossy().to_string(),
            source,
        };

        // Same directory as the target so the rename stays on one filesystem
        let mut temp = NamedTempFile::new_in(parent).map_err(io_error)?;
        restrict_permissions(temp.path()).map_err(io_error)?;
        temp.write_all(&content).map_err(io_error)?;
        temp.as_file().sync_all().map_err(io_error)?;
        temp.persist(&self.path).map_err(|e| io_error(e.error))?;

        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    fn current(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    fn replace(&mut self, credential: Credential) -> Result<()> {
        self.write_atomically(&credential)?;
        self.credential = Some(credential);
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.credential = None;
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            // Nothing cached is fine for sign out
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::FileIo {
                path: self.path.to_string_lossy().to_string(),
                source,
            }),
        }
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
