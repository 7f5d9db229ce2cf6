//! Best-effort state persistence
//!
//! When `PERSISTENT_DIR` is set, the full exchange state is written
//! after every successful mutation: serialize with bincode, hash with
//! SHA-256, write to a temp file, fsync, rename. Load verifies both the
//! format version and the checksum before trusting the file.

use engine::exchange::PersistedState;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::PathBuf;
use thiserror::Error;

/// Current on-disk format version.
const STATE_VERSION: u32 = 1;

const STATE_FILE: &str = "exchange-state.bin";

#[derive(Error, Debug)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("integrity check failed: expected {expected}, got {actual}")]
    IntegrityFailure { expected: String, actual: String },

    #[error("unsupported state file version: {0}")]
    UnsupportedVersion(u32),
}

#[derive(Serialize, Deserialize)]
struct Envelope {
    version: u32,
    checksum: String,
    payload: Vec<u8>,
}

/// Writes and loads the single state file under one directory.
pub struct Persister {
    dir: PathBuf,
}

impl Persister {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self) -> PathBuf {
        self.dir.join(STATE_FILE)
    }

    /// Write atomically: serialize, hash, temp file, fsync, rename.
    pub fn write(&self, state: &PersistedState) -> Result<(), PersistError> {
        fs::create_dir_all(&self.dir)?;

        let payload =
            bincode::serialize(state).map_err(|e| PersistError::Serialization(e.to_string()))?;
        let envelope = Envelope {
            version: STATE_VERSION,
            checksum: checksum(&payload),
            payload,
        };
        let data = bincode::serialize(&envelope)
            .map_err(|e| PersistError::Serialization(e.to_string()))?;

        let path = self.path();
        let tmp_path = self.dir.join(format!("{STATE_FILE}.tmp"));
        {
            let mut file = File::create(&tmp_path)?;
            file.write_all(&data)?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    /// Load the state file if present; `None` when nothing was ever
    /// written.
    pub fn load(&self) -> Result<Option<PersistedState>, PersistError> {
        let path = self.path();
        if !path.exists() {
            return Ok(None);
        }

        let mut data = Vec::new();
        File::open(&path)?.read_to_end(&mut data)?;

        let envelope: Envelope =
            bincode::deserialize(&data).map_err(|e| PersistError::Serialization(e.to_string()))?;
        if envelope.version > STATE_VERSION {
            return Err(PersistError::UnsupportedVersion(envelope.version));
        }
        let actual = checksum(&envelope.payload);
        if actual != envelope.checksum {
            return Err(PersistError::IntegrityFailure {
                expected: envelope.checksum,
                actual,
            });
        }

        let state = bincode::deserialize(&envelope.payload)
            .map_err(|e| PersistError::Serialization(e.to_string()))?;
        Ok(Some(state))
    }
}

fn checksum(payload: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(payload);
    format!("{:x}", hasher.finalize())
}
