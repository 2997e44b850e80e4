//! Session handoff store - one record slot between registration and the
//! ticket view.
//!
//! The slot is a narrow, typed channel: registration puts exactly one record,
//! the ticket view loads it once at startup. An empty slot is an expected
//! path, answered with a redirect, not an error.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::attendee::AttendeeRecord;

/// Name of the single record slot.
pub const RECORD_SLOT: &str = "ticketData";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Stored record is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

pub trait SessionStore {
    /// Place a record in the slot, replacing any previous one.
    fn put(&mut self, record: &AttendeeRecord) -> Result<(), StoreError>;

    /// Read the slot without clearing it.
    fn load(&self) -> Result<Option<AttendeeRecord>, StoreError>;

    /// Empty the slot. The record is gone for good.
    fn clear(&mut self) -> Result<(), StoreError>;
}

/// What the ticket view does after consulting the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "outcome")]
pub enum LoadOutcome {
    Ready { record: AttendeeRecord },
    RedirectToRegistration { target: String },
}

/// Resolve the ticket view's source data. Missing data redirects back to the
/// registration entry point; no error is surfaced.
pub fn load_ticket_view(store: &dyn SessionStore) -> Result<LoadOutcome, StoreError> {
    Ok(match store.load()? {
        Some(record) => LoadOutcome::Ready { record },
        None => LoadOutcome::RedirectToRegistration {
            target: "/register".to_string(),
        },
    })
}

/// In-memory store for a single session.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slot: Option<AttendeeRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemoryStore {
    fn put(&mut self, record: &AttendeeRecord) -> Result<(), StoreError> {
        self.slot = Some(record.clone());
        Ok(())
    }

    fn load(&self) -> Result<Option<AttendeeRecord>, StoreError> {
        Ok(self.slot.clone())
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        self.slot = None;
        Ok(())
    }
}

/// File-backed store: the slot is one JSON file inside a session directory,
/// so the record survives between CLI invocations.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(session_dir: &Path) -> Self {
        Self {
            path: session_dir.join(format!("{}.json", RECORD_SLOT)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for JsonFileStore {
    fn put(&mut self, record: &AttendeeRecord) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(record)?;
        fs::write(&self.path, json)?;
        Ok(())
    }

    fn load(&self) -> Result<Option<AttendeeRecord>, StoreError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}
