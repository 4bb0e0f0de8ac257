// record.rs — Interaction records and their store.
//
// An interaction is only persisted once it has landed: `InteractionStore`
// runs the termination invariant first and writes nothing when it fails.
// Records are appended one JSON object per line and never rewritten.

use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::error::GateError;
use crate::landing::{self, JudgmentTerminalState};

/// A completed interaction ready to be logged.
///
/// The closing judgment lives only in `judgment_landing`; any other key at
/// the top level is rejected on read.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct InteractionRecord {
    pub interaction_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub principle: Option<String>,
    /// Whatever the surrounding system wants kept with the record.
    #[serde(default)]
    pub payload: serde_json::Value,
    #[serde(default)]
    pub judgment_landing: Option<JudgmentTerminalState>,
}

impl InteractionRecord {
    pub fn new(interaction_id: impl Into<String>) -> Self {
        Self {
            interaction_id: interaction_id.into(),
            user_id: None,
            mode: None,
            principle: None,
            payload: serde_json::Value::Null,
            judgment_landing: None,
        }
    }

    pub fn with_landing(mut self, landing: JudgmentTerminalState) -> Self {
        self.judgment_landing = Some(landing);
        self
    }
}

/// Append-only JSONL store of landed interactions.
pub struct InteractionStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl InteractionStore {
    /// Open a store at `path`. Creates the parent directory; the file itself
    /// is created on first persist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, GateError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| GateError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    /// Enforce the termination invariant, then append the record.
    pub fn persist(&self, record: &InteractionRecord) -> Result<(), GateError> {
        if record.interaction_id.trim().is_empty() {
            return Err(GateError::InvalidRecord(
                "interaction_id must not be empty".to_string(),
            ));
        }
        if let Err(e) = landing::enforce(record.judgment_landing.as_ref()) {
            tracing::warn!(
                interaction_id = %record.interaction_id,
                error = %e,
                "interaction refused: no valid judgment landing"
            );
            return Err(e.into());
        }

        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| GateError::InvalidRecord("interaction store lock poisoned".to_string()))?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| GateError::Io {
                path: self.path.clone(),
                source,
            })?;
        file.write_all(line.as_bytes())
            .and_then(|()| file.flush())
            .map_err(|source| GateError::Io {
                path: self.path.clone(),
                source,
            })?;

        tracing::info!(interaction_id = %record.interaction_id, "interaction persisted");
        Ok(())
    }

    /// Read every persisted record, oldest first.
    pub fn read_all(&self) -> Result<Vec<InteractionRecord>, GateError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let file = fs::File::open(&self.path).map_err(|source| GateError::Io {
            path: self.path.clone(),
            source,
        })?;

        let mut records = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line.map_err(|source| GateError::Io {
                path: self.path.clone(),
                source,
            })?;
            if line.trim().is_empty() {
                continue;
            }
            records.push(serde_json::from_str(&line)?);
        }
        Ok(records)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
