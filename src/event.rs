//! Event profile - the fixed event-side content printed on every ticket.
//!
//! Attendee data varies per record; everything here is identical across an
//! event and comes from configuration, not from the form.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventProfile {
    pub title: String,
    pub subtitle: String,
    pub date: String,
    pub departure_time: String,
    pub destination: String,
    pub access_label: String,
    pub issuer: IssuerBlock,
}

/// Signature and branding block overlaid on the exported document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IssuerBlock {
    pub authority: String,
    pub permit: String,
    pub signer: String,
    pub signer_title: String,
    pub branding: String,
}

impl Default for EventProfile {
    fn default() -> Self {
        Self {
            title: "MARS COLONY".to_string(),
            subtitle: "LAUNCH PARTY".to_string(),
            date: "June 15, 2045".to_string(),
            departure_time: "08:00 MST".to_string(),
            destination: "Mars, Olympus Mons Base".to_string(),
            access_label: "VIP ACCESS".to_string(),
            issuer: IssuerBlock::default(),
        }
    }
}

impl Default for IssuerBlock {
    fn default() -> Self {
        Self {
            authority: "Space Transport Authority".to_string(),
            permit: "INTERPLANETARY TRAVEL PERMIT".to_string(),
            signer: "Fozan Ahmed".to_string(),
            signer_title: "CEO, Felix Space Events".to_string(),
            branding: "Felix Space Events | Since 5000 BC".to_string(),
        }
    }
}

impl EventProfile {
    /// Load a profile from a JSON file, falling back to defaults for any
    /// field the file omits.
    pub fn load(path: &Path) -> io::Result<Self> {
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// Load from `path` if it exists, otherwise use defaults.
    pub fn load_or_default(path: Option<&Path>) -> io::Result<Self> {
        match path {
            Some(p) if p.exists() => Self::load(p),
            _ => Ok(Self::default()),
        }
    }
}
