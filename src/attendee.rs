//! Attendee records and identifier generation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::ID_NAMESPACE;

/// One registration. Created at form submission, immutable afterwards, and
/// held only for the lifetime of the session store.
///
/// Field names match the serialized registration payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendeeRecord {
    pub name: String,
    pub email: String,
    pub planet: String,
    pub country: String,
    pub age: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_requests: Option<String>,
    pub ticket_id: TicketId,
    /// Photo as a `data:` URI, if one was attached at registration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

impl AttendeeRecord {
    /// "Planet, Country" origin line shown on the ticket.
    pub fn origin_label(&self) -> String {
        format!("{}, {}", self.planet, self.country)
    }
}

/// Generated per-registration token: `MARS-<unix millis>-<random suffix>`.
///
/// Uniqueness is probabilistic. The token doubles as the visible ticket ID
/// and the payload of the scannable check-in code; nothing parses it back.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketId(String);

impl TicketId {
    pub fn generate() -> Self {
        Self::generate_at(Utc::now(), random_suffix())
    }

    pub(crate) fn generate_at(at: DateTime<Utc>, suffix: u16) -> Self {
        TicketId(format!(
            "{}-{}-{:04}",
            ID_NAMESPACE,
            at.timestamp_millis(),
            suffix
        ))
    }

    /// Wrap an existing token, e.g. one read back from a stored record.
    pub fn new(raw: impl Into<String>) -> Self {
        TicketId(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn random_suffix() -> u16 {
    // Low bytes of a v4 UUID stand in for a dedicated RNG.
    let bytes = Uuid::new_v4().into_bytes();
    u16::from_be_bytes([bytes[0], bytes[1]]) % 10_000
}
