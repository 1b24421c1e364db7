//! Token persistence
//!
//! A [`TokenStore`] is a single opaque slot: the manager only ever loads
//! the whole token or replaces it.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::common::{Error, Result};

/// Single-slot token persistence
pub trait TokenStore: Send + Sync {
    /// Read the stored token, `None` when nothing was stored
    fn load(&self) -> Result<Option<Vec<u8>>>;

    /// Replace the stored token
    fn save(&self, token: &[u8]) -> Result<()>;
}

/// Token kept in a file; a missing file means no token
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<Vec<u8>>> {
        match std::fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::TokenStore(format!(
                "Failed to read '{}': {}",
                self.path.display(),
                e
            ))),
        }
    }

    fn save(&self, token: &[u8]) -> Result<()> {
        std::fs::write(&self.path, token).map_err(|e| {
            Error::TokenStore(format!("Failed to write '{}': {}", self.path.display(), e))
        })
    }
}

/// In-process token slot
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    slot: Mutex<Option<Vec<u8>>>,
    saves: Mutex<usize>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with a token
    pub fn with_token(token: &str) -> Self {
        Self {
            slot: Mutex::new(Some(token.as_bytes().to_vec())),
            saves: Mutex::new(0),
        }
    }

    /// Current contents as text
    pub fn token(&self) -> Option<String> {
        self.slot
            .lock()
            .ok()
            .and_then(|slot| slot.as_ref().map(|b| String::from_utf8_lossy(b).into_owned()))
    }

    /// Number of `save` calls so far
    pub fn save_count(&self) -> usize {
        self.saves.lock().map(|n| *n).unwrap_or(0)
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<Vec<u8>>> {
        self.slot
            .lock()
            .map(|slot| slot.clone())
            .map_err(|_| Error::TokenStore("token slot poisoned".to_string()))
    }

    fn save(&self, token: &[u8]) -> Result<()> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| Error::TokenStore("token slot poisoned".to_string()))?;
        *slot = Some(token.to_vec());
        if let Ok(mut saves) = self.saves.lock() {
            *saves += 1;
        }
        Ok(())
    }
}
