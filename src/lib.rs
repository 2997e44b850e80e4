//! Marspass Core - Event Ticket Compiler
//!
//! Registration in, boarding-pass PDF out:
//! 1. Registration input is validated before a record exists
//! 2. Records move between steps through a session store, never globals
//! 3. The ticket card renders deterministically from its record
//! 4. Export is one linear pass: capture, fit, embed, save
//! 5. Only one export is in flight at a time

pub mod attendee;
pub mod capture;
pub mod event;
pub mod export;
pub mod hashing;
pub mod page;
pub mod pdf;
pub mod registration;
pub mod store;
pub mod ticket;

pub use attendee::{AttendeeRecord, TicketId};
pub use capture::{capture_region, Capture, CaptureError, CaptureOptions, Viewport};
pub use event::EventProfile;
pub use export::{ExportError, ExportPipeline, ExportedTicket};
pub use page::{ExportGeometry, PageAuthority, PageSpec};
pub use registration::{FieldViolation, RegistrationForm, RegistrationOutcome};
pub use store::{JsonFileStore, LoadOutcome, MemoryStore, SessionStore};
pub use ticket::{render_ticket, RenderError, TicketRegion};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Namespace prefix baked into every generated identifier.
pub const ID_NAMESPACE: &str = "MARS";

/// Namespace prefix for the scannable check-in token. Scanners must treat
/// the full token as opaque.
pub const QR_NAMESPACE: &str = "MARS-EVENT";

/// Prefix for exported artifact filenames.
pub const ARTIFACT_PREFIX: &str = "ticket";
