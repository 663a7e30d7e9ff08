//! Credential handling
//!
//! Tokens live in a small JSON "local storage" file (a flat string map, like the
//! browser storage the dashboard used). The file is read once into a [`Session`]
//! which is then injected into the [`ApiClient`](crate::api::ApiClient); nothing
//! else reads the file at request time.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

/// Storage key of the bearer token
pub const ACCESS_TOKEN_KEY: &str = "accessToken";
/// Storage key of the CSRF token used on mutating requests
pub const CSRF_TOKEN_KEY: &str = "csrfToken";

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Failed to read local storage {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write local storage {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Local storage {path} is not a JSON object of strings: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Access token must not be empty")]
    EmptyToken,
}

/// Credentials attached to outgoing requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Session {
    Authenticated {
        access_token: String,
        csrf_token: Option<String>,
    },
    Unauthenticated,
}

impl Session {
    pub fn bearer(access_token: impl Into<String>) -> Self {
        Session::Authenticated {
            access_token: access_token.into(),
            csrf_token: None,
        }
    }

    pub fn with_csrf(self, csrf: impl Into<String>) -> Self {
        match self {
            Session::Authenticated { access_token, .. } => Session::Authenticated {
                access_token,
                csrf_token: Some(csrf.into()),
            },
            Session::Unauthenticated => Session::Unauthenticated,
        }
    }

    pub fn access_token(&self) -> Option<&str> {
        match self {
            Session::Authenticated { access_token, .. } => Some(access_token),
            Session::Unauthenticated => None,
        }
    }

    pub fn csrf_token(&self) -> Option<&str> {
        match self {
            Session::Authenticated { csrf_token, .. } => csrf_token.as_deref(),
            Session::Unauthenticated => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Session::Authenticated { .. })
    }
}

/// File-backed key/value store standing in for browser local storage
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole storage map; a missing file is an empty map
    pub fn read_all(&self) -> Result<BTreeMap<String, String>, SessionError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No local storage at {}", self.path.display());
                return Ok(BTreeMap::new());
            }
            Err(source) => {
                return Err(SessionError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&raw).map_err(|source| SessionError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), SessionError> {
        let write_err = |source| SessionError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(write_err)?;
            }
        }

        let body = serde_json::to_string_pretty(entries).map_err(|source| SessionError::Corrupt {
            path: self.path.clone(),
            source,
        })?;
        std::fs::write(&self.path, body).map_err(write_err)
    }

    /// Build the session from storage. Blank tokens count as absent.
    pub fn load_session(&self) -> Result<Session, SessionError> {
        let entries = self.read_all()?;
        let non_blank = |key: &str| {
            entries
                .get(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Ok(match non_blank(ACCESS_TOKEN_KEY) {
            Some(access_token) => Session::Authenticated {
                access_token,
                csrf_token: non_blank(CSRF_TOKEN_KEY),
            },
            None => Session::Unauthenticated,
        })
    }

    /// Store tokens, keeping unrelated keys intact
    pub fn save_tokens(&self, access_token: &str, csrf_token: Option<&str>) -> Result<(), SessionError> {
        if access_token.trim().is_empty() {
            return Err(SessionError::EmptyToken);
        }

        let mut entries = self.read_all()?;
        entries.insert(ACCESS_TOKEN_KEY.to_string(), access_token.trim().to_string());
        match csrf_token {
            Some(csrf) => {
                entries.insert(CSRF_TOKEN_KEY.to_string(), csrf.trim().to_string());
            }
            None => {
                entries.remove(CSRF_TOKEN_KEY);
            }
        }
        self.write_all(&entries)?;
        info!("Stored access token in {}", self.path.display());
        Ok(())
    }

    /// Remove both tokens from storage
    pub fn clear_tokens(&self) -> Result<(), SessionError> {
        let mut entries = self.read_all()?;
        let had_token = entries.remove(ACCESS_TOKEN_KEY).is_some();
        entries.remove(CSRF_TOKEN_KEY);
        self.write_all(&entries)?;
        if had_token {
            info!("Cleared access token from {}", self.path.display());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_storage_is_unauthenticated() {
        let dir = TempDir::new().unwrap();
        let store = TokenStore::new(dir.path().join("storage.json"));
        assert_eq!(store.load_session().unwrap(), Session::Unauthenticated);
    }

    #[test]
    fn test_save_and_load_tokens() {
        let dir = TempDir::new().unwrap();
        let store = TokenStore::new(dir.path().join("nested").join("storage.json"));

        store.save_tokens("abc123", Some("csrf-1")).unwrap();
        let session = store.load_session().unwrap();
        assert_eq!(session.access_token(), Some("abc123"));
        assert_eq!(session.csrf_token(), Some("csrf-1"));

        store.clear_tokens().unwrap();
        assert!(!store.load_session().unwrap().is_authenticated());
    }

    #[test]
    fn test_unrelated_keys_survive_token_updates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, r#"{"theme":"dark","accessToken":"  "}"#).unwrap();

        let store = TokenStore::new(&path);
        assert!(!store.load_session().unwrap().is_authenticated());

        store.save_tokens("tok", None).unwrap();
        let entries = store.read_all().unwrap();
        assert_eq!(entries.get("theme").map(String::as_str), Some("dark"));
        assert_eq!(entries.get(ACCESS_TOKEN_KEY).map(String::as_str), Some("tok"));
    }

    #[test]
    fn test_corrupt_storage_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, "[1, 2, 3]").unwrap();

        let err = TokenStore::new(&path).load_session().unwrap_err();
        assert!(matches!(err, SessionError::Corrupt { .. }));
    }

    #[test]
    fn test_empty_token_rejected() {
        let dir = TempDir::new().unwrap();
        let store = TokenStore::new(dir.path().join("storage.json"));
        assert!(matches!(store.save_tokens("  ", None), Err(SessionError::EmptyToken)));
    }
}
