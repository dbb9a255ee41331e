// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Append-Only Event Log
//!
//! The log is the single channel of truth between the store and every index.
//! - The log allocates sequence numbers under its own writer lock, so appends
//!   are totally ordered across keys
//! - An event is returned only after it is durable
//! - Replay is restartable from any position
//!
//! # File Format
//! ```text
//! [LogHeader: 16 bytes][Frame][Frame][Frame]...
//! ```
//! See `delegation_persistence::wal` for the frame layout.

use delegation_kernel::{EventKind, MutationEvent};
use delegation_persistence::codec::{decode_event, encode_event};
use delegation_persistence::wal::{self, LogHeader};
use delegation_persistence::PersistenceError;
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum EventLogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid header")]
    InvalidHeader,

    #[error("Event log corrupted: {0}")]
    Corrupted(String),

    #[error("Event log unavailable: {0}")]
    Unavailable(String),
}

impl From<PersistenceError> for EventLogError {
    fn from(e: PersistenceError) -> Self {
        match e {
            PersistenceError::IoError(io) => EventLogError::Io(io),
            PersistenceError::InvalidMagic | PersistenceError::UnsupportedVersion(_) => EventLogError::InvalidHeader,
            PersistenceError::Codec(msg) => EventLogError::Serialization(msg),
            other => EventLogError::Corrupted(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, EventLogError>;

/// A finite, ordered replay of the log.
pub type EventStream = Box<dyn Iterator<Item = Result<MutationEvent>> + Send>;

pub trait EventLog: Send + Sync {
    /// Seals `kind` at the next sequence number and persists it.
    fn append(&self, kind: EventKind, timestamp: u64) -> Result<MutationEvent>;

    /// Events with `sequence >= from`, in order. Starting past the head
    /// yields an empty stream.
    fn replay_from(&self, from: u64) -> Result<EventStream>;

    /// Sequence number the next append will receive.
    fn next_sequence(&self) -> u64;
}

/// In-process log, for tests and ephemeral registries.
#[derive(Debug, Default)]
pub struct MemoryEventLog {
    events: Mutex<Vec<MutationEvent>>,
}

impl MemoryEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adopts an existing gap-free event sequence.
    pub fn from_events(events: Vec<MutationEvent>) -> Result<Self> {
        for (expected, event) in events.iter().enumerate() {
            if event.sequence != expected as u64 {
                return Err(EventLogError::Corrupted(format!(
                    "sequence gap: expected {}, found {}",
                    expected, event.sequence
                )));
            }
        }
        Ok(Self { events: Mutex::new(events) })
    }

    /// Copy of every event appended so far.
    pub fn events(&self) -> Vec<MutationEvent> {
        self.events.lock().clone()
    }
}

impl EventLog for MemoryEventLog {
    fn append(&self, kind: EventKind, timestamp: u64) -> Result<MutationEvent> {
        let mut events = self.events.lock();
        let event = MutationEvent::seal(events.len() as u64, timestamp, kind);
        events.push(event.clone());
        Ok(event)
    }

    fn replay_from(&self, from: u64) -> Result<EventStream> {
        let events = self.events.lock();
        let start = usize::try_from(from).unwrap_or(usize::MAX).min(events.len());
        let tail: Vec<MutationEvent> = events[start..].to_vec();
        Ok(Box::new(tail.into_iter().map(Ok)))
    }

    fn next_sequence(&self) -> u64 {
        self.events.lock().len() as u64
    }
}

struct FileWriter {
    file: File,
    /// File length after the last complete frame.
    len: u64,
    next_sequence: u64,
}

/// Durable log: checksummed frames, fsync per append.
pub struct FileEventLog {
    path: PathBuf,
    writer: Mutex<FileWriter>,
}

impl FileEventLog {
    /// Open or create a log file.
    ///
    /// An existing file is scanned to recover the head. A torn trailing
    /// frame is cut off; any other damage refuses the open.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let fresh = std::fs::metadata(&path).map(|m| m.len() == 0).unwrap_or(true);
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;

        let (len, next_sequence) = if fresh {
            LogHeader::new().write_to(&mut file)?;
            file.sync_all()?;
            info!(path = %path.display(), "created event log");
            (LogHeader::SIZE as u64, 0)
        } else {
            let report = wal::scan(&path)?;
            if report.torn_tail {
                warn!(
                    path = %path.display(),
                    valid_len = report.valid_len,
                    "truncating incomplete frame at end of event log"
                );
                file.set_len(report.valid_len)?;
                file.sync_all()?;
            }
            info!(path = %path.display(), events = report.frames, "opened event log");
            (report.valid_len, report.next_sequence)
        };

        Ok(Self {
            path,
            writer: Mutex::new(FileWriter { file, len, next_sequence }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EventLog for FileEventLog {
    fn append(&self, kind: EventKind, timestamp: u64) -> Result<MutationEvent> {
        let mut writer = self.writer.lock();
        let event = MutationEvent::seal(writer.next_sequence, timestamp, kind);
        let payload = encode_event(&event)?;

        let written = wal::append_frame(&mut writer.file, event.sequence, &payload)
            .map_err(EventLogError::from)
            .and_then(|n| {
                writer.file.sync_data()?;
                Ok(n)
            });

        match written {
            Ok(n) => {
                writer.len += n;
                writer.next_sequence += 1;
                Ok(event)
            }
            Err(e) => {
                // Drop whatever part of the frame reached the file.
                let len = writer.len;
                if let Err(trunc) = writer.file.set_len(len) {
                    warn!(error = %trunc, "failed to roll back partial frame");
                }
                Err(e)
            }
        }
    }

    fn replay_from(&self, from: u64) -> Result<EventStream> {
        // Frames below the head are complete and synced.
        let head = self.next_sequence();
        if from >= head {
            return Ok(Box::new(std::iter::empty()));
        }

        let frames = wal::read_stream(&self.path)?;
        let stream = frames
            .take(head as usize)
            .map(|frame| {
                let frame = frame?;
                let event = decode_event(&frame.payload)?;
                if event.sequence != frame.header.sequence {
                    return Err(EventLogError::Corrupted(format!(
                        "frame {} holds event {}",
                        frame.header.sequence, event.sequence
                    )));
                }
                Ok(event)
            })
            .filter(move |item| item.as_ref().map_or(true, |event| event.sequence >= from));
        Ok(Box::new(stream))
    }

    fn next_sequence(&self) -> u64 {
        self.writer.lock().next_sequence
    }
}

/// Collects a whole stream, stopping at the first error.
pub fn collect_events(stream: EventStream) -> Result<Vec<MutationEvent>> {
    stream.collect()
}
