//! Whitelist snapshot store
//!
//! Whole-file JSON persistence for the per-chat whitelist mapping.
//! Reads degrade to an empty snapshot (missing file = first run);
//! writes go through a uniquely named temp file + rename so a crash
//! mid-write can never leave a partial snapshot behind, and writers in
//! other processes cannot interleave on a shared temp path.
//!
//! Author: AI-Generated
//! Created: 2026-08-30

use crate::types::WhitelistSnapshot;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tracing::{debug, warn};

/// A save that could not complete. The engine discards the attempted
/// in-memory mutation when it sees one of these, so no false "saved"
/// acknowledgment is ever sent.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to serialize whitelist snapshot: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write snapshot temp file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to replace snapshot file {path}: {source}")]
    Replace {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// File-backed store for the full whitelist snapshot.
pub struct WhitelistStore {
    path: PathBuf,
    /// Per-instance counter feeding unique temp file names.
    tmp_seq: AtomicU64,
}

impl WhitelistStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            tmp_seq: AtomicU64::new(0),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the snapshot. A missing or unreadable file yields an empty
    /// mapping; the bot stays operational with no prior history rather
    /// than crashing on first run or on storage hiccups.
    pub fn load(&self) -> WhitelistSnapshot {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Store: {} not found, starting empty", self.path.display());
                return WhitelistSnapshot::new();
            }
            Err(e) => {
                warn!("Store: cannot read {}: {} — treating as empty", self.path.display(), e);
                return WhitelistSnapshot::new();
            }
        };

        match serde_json::from_str(&content) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Store: corrupt snapshot {}: {} — treating as empty", self.path.display(), e);
                WhitelistSnapshot::new()
            }
        }
    }

    /// Persist the full snapshot atomically: serialize, write to a temp
    /// file next to the target, then rename over it. Readers observe
    /// either the old snapshot or the new one, never a partial write.
    /// The temp name carries pid + sequence so no two saves ever share it.
    pub fn save(&self, snapshot: &WhitelistSnapshot) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(snapshot)?;

        // Temp file in the same directory so the rename stays on one filesystem
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "snapshot.json".to_string());
        let tmp_path = self.path.with_file_name(format!(
            "{}.{}.{}.tmp",
            file_name,
            std::process::id(),
            self.tmp_seq.fetch_add(1, Ordering::Relaxed),
        ));
        let write = |path: &Path| -> std::io::Result<()> {
            let mut file = fs::File::create(path)?;
            file.write_all(json.as_bytes())?;
            file.flush()
        };
        write(&tmp_path).map_err(|source| StoreError::Write {
            path: tmp_path.clone(),
            source,
        })?;

        fs::rename(&tmp_path, &self.path).map_err(|source| {
            // Best effort: don't leave the temp file behind on failure
            let _ = fs::remove_file(&tmp_path);
            StoreError::Replace {
                path: self.path.clone(),
                source,
            }
        })?;

        debug!("Store: wrote {} chats to {}", snapshot.len(), self.path.display());
        Ok(())
    }
}
