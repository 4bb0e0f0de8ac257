// log.rs — Append-only JSONL BLOCK event log.
//
// One BlockEvent per line. Each event is linked to the previous one via
// `previous_hash` (SHA-256 of the previous raw line), forming a hash chain:
// editing, inserting or deleting a line breaks the chain.
//
// The log never rewrites or truncates. Events that fail the BLOCK event
// contract are refused before anything is written. Each line goes out in a
// single unbuffered write, so a failed append leaves nothing queued behind
// for the next one.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::error::AuditError;
use crate::event::BlockEvent;
use crate::hasher;

/// An append-only audit log backed by a JSONL file.
///
/// Not `Sync` on its own; wrap it in [`crate::SharedAuditLog`] to share one
/// writer between threads.
pub struct AuditLog {
    writer: Box<dyn Write + Send>,
    path: PathBuf,
    /// Hash of the last line written — becomes `previous_hash` of the next event.
    last_hash: Option<String>,
}

impl AuditLog {
    /// Open (or create) a log at the given path, recovering the chain head
    /// from any existing content.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AuditError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| AuditError::OpenFailed {
                path: path.clone(),
                source,
            })?;
        }

        let last_hash = if path.exists() {
            Self::read_last_hash(&path)?
        } else {
            None
        };

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| AuditError::OpenFailed {
                path: path.clone(),
                source,
            })?;

        Ok(Self {
            writer: Box::new(file),
            path,
            last_hash,
        })
    }

    #[cfg(test)]
    fn with_writer(path: impl AsRef<Path>, writer: impl Write + Send + 'static) -> Self {
        Self {
            writer: Box::new(writer),
            path: path.as_ref().to_path_buf(),
            last_hash: None,
        }
    }

    /// Validate, chain, and append an event.
    ///
    /// On error the chain head is unchanged and the event counts as not
    /// written.
    pub fn append(&mut self, event: &mut BlockEvent) -> Result<(), AuditError> {
        event.validate()?;
        event.previous_hash = self.last_hash.clone();

        let json = serde_json::to_string(event)?;
        let mut line = String::with_capacity(json.len() + 1);
        line.push_str(&json);
        line.push('\n');
        self.writer.write_all(line.as_bytes())?;

        // Only advance the chain head once the line is out.
        self.last_hash = Some(hasher::hash_line(&json));
        tracing::info!(
            event_id = %event.event_id,
            interaction_id = %event.subject.interaction_id,
            path = %self.path.display(),
            "block event appended"
        );
        Ok(())
    }

    /// Read all events from a log file, oldest first. Skips blank lines.
    pub fn read_all(path: impl AsRef<Path>) -> Result<Vec<BlockEvent>, AuditError> {
        let reader = open_reader(path.as_ref())?;
        let mut events = Vec::new();

        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            events.push(serde_json::from_str(&line)?);
        }

        Ok(events)
    }

    /// Verify the hash chain and every event's contract.
    ///
    /// Returns the number of events checked, or the first breach found.
    pub fn verify_chain(path: impl AsRef<Path>) -> Result<usize, AuditError> {
        let reader = open_reader(path.as_ref())?;
        let mut previous_hash: Option<String> = None;
        let mut count = 0;

        for (line_num, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let event = BlockEvent::from_json_line(&line)?;
            if event.previous_hash != previous_hash {
                return Err(AuditError::IntegrityViolation {
                    line: line_num + 1,
                    expected: previous_hash.unwrap_or_else(|| "None".to_string()),
                    actual: event.previous_hash.unwrap_or_else(|| "None".to_string()),
                });
            }

            // Hash the raw line, not a re-serialization.
            previous_hash = Some(hasher::hash_line(&line));
            count += 1;
        }

        Ok(count)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_last_hash(path: &Path) -> Result<Option<String>, AuditError> {
        let reader = open_reader(path)?;
        let mut last_line: Option<String> = None;

        for line in reader.lines() {
            let line = line?;
            if !line.trim().is_empty() {
                last_line = Some(line);
            }
        }

        Ok(last_line.map(|line| hasher::hash_line(&line)))
    }
}

fn open_reader(path: &Path) -> Result<BufReader<File>, AuditError> {
    let file = File::open(path).map_err(|source| AuditError::OpenFailed {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::tests::valid_event;
    use std::sync::{Arc, Mutex};
    use tempfile::tempdir;

    /// Refuses the first `failures` writes, then records into `out`.
    struct FlakyWriter {
        failures: usize,
        out: Arc<Mutex<Vec<u8>>>,
    }

    impl Write for FlakyWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if self.failures > 0 {
                self.failures -= 1;
                return Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full"));
            }
            self.out.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn append_and_read_round_trip() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("block_events.jsonl");

        let mut first = valid_event();
        {
            let mut log = AuditLog::open(&log_path).unwrap();
            log.append(&mut first).unwrap();
            log.append(&mut valid_event()).unwrap();
        }

        let events = AuditLog::read_all(&log_path).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], first);
        assert!(events[0].previous_hash.is_none());
        assert!(events[1].previous_hash.is_some());
    }

    #[test]
    fn hash_chain_is_valid() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("block_events.jsonl");
        {
            let mut log = AuditLog::open(&log_path).unwrap();
            for _ in 0..4 {
                log.append(&mut valid_event()).unwrap();
            }
        }
        assert_eq!(AuditLog::verify_chain(&log_path).unwrap(), 4);
    }

    #[test]
    fn reopen_log_continues_chain() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("nested").join("block_events.jsonl");
        {
            let mut log = AuditLog::open(&log_path).unwrap();
            log.append(&mut valid_event()).unwrap();
        }
        {
            let mut log = AuditLog::open(&log_path).unwrap();
            log.append(&mut valid_event()).unwrap();
        }
        assert_eq!(AuditLog::verify_chain(&log_path).unwrap(), 2);
    }

    #[test]
    fn deleting_a_line_breaks_the_chain() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("block_events.jsonl");
        {
            let mut log = AuditLog::open(&log_path).unwrap();
            for _ in 0..3 {
                log.append(&mut valid_event()).unwrap();
            }
        }
        let content = std::fs::read_to_string(&log_path).unwrap();
        let kept: Vec<&str> = content.lines().enumerate().filter(|(i, _)| *i != 1).map(|(_, l)| l).collect();
        std::fs::write(&log_path, kept.join("\n") + "\n").unwrap();

        let err = AuditLog::verify_chain(&log_path).unwrap_err();
        assert!(matches!(err, AuditError::IntegrityViolation { line: 2, .. }));
    }

    #[test]
    fn editing_a_line_breaks_the_chain() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("block_events.jsonl");
        {
            let mut log = AuditLog::open(&log_path).unwrap();
            log.append(&mut valid_event()).unwrap();
            log.append(&mut valid_event()).unwrap();
        }
        let content = std::fs::read_to_string(&log_path).unwrap();
        let edited = content.replacen("Signing today", "Signing tomorrow", 1);
        std::fs::write(&log_path, edited).unwrap();

        assert!(AuditLog::verify_chain(&log_path).is_err());
    }

    #[test]
    fn invalid_event_is_never_written() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("block_events.jsonl");
        let mut log = AuditLog::open(&log_path).unwrap();

        let mut bad = valid_event().with_failed_interventions(vec![]);
        assert!(matches!(
            log.append(&mut bad),
            Err(AuditError::InvalidEvent { .. })
        ));
        assert!(AuditLog::read_all(&log_path).unwrap().is_empty());
    }

    #[test]
    fn failed_write_leaves_no_stale_line_behind() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("block_events.jsonl");
        let out = Arc::new(Mutex::new(Vec::new()));
        let mut log = AuditLog::with_writer(
            &log_path,
            FlakyWriter {
                failures: 1,
                out: Arc::clone(&out),
            },
        );

        let mut lost = valid_event();
        assert!(matches!(
            log.append(&mut lost),
            Err(AuditError::WriteFailed(_))
        ));
        let mut kept = valid_event();
        log.append(&mut kept).unwrap();
        log.append(&mut valid_event()).unwrap();

        let written = String::from_utf8(out.lock().unwrap().clone()).unwrap();
        assert_eq!(written.lines().count(), 2);
        assert!(!written.contains(&lost.event_id.to_string()));
        assert!(kept.previous_hash.is_none());

        std::fs::write(&log_path, &written).unwrap();
        assert_eq!(AuditLog::verify_chain(&log_path).unwrap(), 2);
    }
}
