use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use spool_core::errors::{SpoolError, SpoolResult};
use spool_core::models::{Checkpoint, CHECKPOINT_VERSION};

/// Minimal probe used to check the schema version before committing to
/// a full parse.
#[derive(Deserialize)]
struct VersionProbe {
    version: u32,
}

/// Reads and writes the versioned checkpoint format.
///
/// `load` is all-or-nothing: the version is checked first and the whole
/// record deserialized before anything is handed back, so a rejected or
/// corrupt file can never leave a session half-restored. `save` writes
/// through a temp file and renames, so a crash mid-write leaves the
/// previous checkpoint intact.
pub struct CheckpointStore;

impl CheckpointStore {
    /// Serialize a checkpoint to `path`.
    pub fn save(checkpoint: &Checkpoint, path: &Path) -> SpoolResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| SpoolError::CheckpointIo {
                    path: path.to_path_buf(),
                    source,
                })?;
            }
        }

        let payload = serde_json::to_string_pretty(checkpoint)
            .map_err(|e| SpoolError::CheckpointFormat {
                reason: e.to_string(),
            })?;

        let temp = path.with_extension("tmp");
        fs::write(&temp, payload).map_err(|source| SpoolError::CheckpointIo {
            path: temp.clone(),
            source,
        })?;
        fs::rename(&temp, path).map_err(|source| SpoolError::CheckpointIo {
            path: path.to_path_buf(),
            source,
        })?;

        info!(path = %path.display(), "checkpoint saved");
        Ok(())
    }

    /// Load and validate a checkpoint from `path`.
    pub fn load(path: &Path) -> SpoolResult<Checkpoint> {
        let payload = fs::read_to_string(path).map_err(|source| SpoolError::CheckpointIo {
            path: path.to_path_buf(),
            source,
        })?;

        let probe: VersionProbe =
            serde_json::from_str(&payload).map_err(|e| SpoolError::CheckpointFormat {
                reason: e.to_string(),
            })?;
        if probe.version != CHECKPOINT_VERSION {
            return Err(SpoolError::CheckpointVersionMismatch {
                found: probe.version,
                supported: CHECKPOINT_VERSION,
            });
        }

        let checkpoint: Checkpoint =
            serde_json::from_str(&payload).map_err(|e| SpoolError::CheckpointFormat {
                reason: e.to_string(),
            })?;

        info!(path = %path.display(), "checkpoint loaded");
        Ok(checkpoint)
    }
}
