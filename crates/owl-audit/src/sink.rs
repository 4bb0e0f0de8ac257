// sink.rs — Where the gate sends confirmed BLOCK events.
//
// The gate only depends on `AuditSink`. Implementations serialize appends so
// concurrent gates never interleave partial lines.

use std::path::Path;
use std::sync::{Mutex, PoisonError};

use crate::error::AuditError;
use crate::event::BlockEvent;
use crate::log::AuditLog;

/// Destination for BLOCK events.
pub trait AuditSink: Send + Sync {
    /// Validate and persist one event. On success `event.previous_hash` holds
    /// the chain link the sink assigned.
    fn append(&self, event: &mut BlockEvent) -> Result<(), AuditError>;
}

/// A file-backed [`AuditLog`] shared between threads.
pub struct SharedAuditLog {
    inner: Mutex<AuditLog>,
}

impl SharedAuditLog {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AuditError> {
        Ok(Self {
            inner: Mutex::new(AuditLog::open(path)?),
        })
    }
}

impl AuditSink for SharedAuditLog {
    fn append(&self, event: &mut BlockEvent) -> Result<(), AuditError> {
        let mut log = self.inner.lock().map_err(|_| AuditError::LockPoisoned)?;
        log.append(event)
    }
}

/// Keeps events in memory. Validates like the file log; no hash chain.
#[derive(Default)]
pub struct MemoryAuditSink {
    events: Mutex<Vec<BlockEvent>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything appended so far. Appends are all-or-nothing,
    /// so a poisoned lock still guards a consistent list.
    pub fn events(&self) -> Vec<BlockEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl AuditSink for MemoryAuditSink {
    fn append(&self, event: &mut BlockEvent) -> Result<(), AuditError> {
        event.validate()?;
        let mut events = self.events.lock().map_err(|_| AuditError::LockPoisoned)?;
        events.push(event.clone());
        Ok(())
    }
}
