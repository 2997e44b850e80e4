//! Export pipeline - single entry point from record to saved document.
//!
//! One linear pass: ensure the region, capture it, fit the page, embed, save.
//! Any failing step aborts the whole run and no partial file is left behind.
//! A single-flight lock rejects overlapping invocations with `Busy`; each
//! successful run re-captures current state, so retries are always safe.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

use crate::attendee::{AttendeeRecord, TicketId};
use crate::capture::{capture_region, CaptureError, CaptureOptions, Viewport};
use crate::event::EventProfile;
use crate::hashing;
use crate::page::{ExportGeometry, PageSpec};
use crate::pdf::{assemble_document, PdfError};
use crate::ticket::{render_ticket, RenderError, TicketRegion};
use crate::ARTIFACT_PREFIX;

#[derive(Debug, Error)]
pub enum ExportError {
    /// Another export is already in flight.
    #[error("An export is already in progress")]
    Busy,

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Pdf(#[from] PdfError),

    #[error("Failed to save document: {0}")]
    Save(#[from] std::io::Error),

    #[error("Failed to fingerprint record: {0}")]
    Fingerprint(#[from] serde_json::Error),
}

/// One finished export. The PDF bytes are complete before anything touches
/// the filesystem.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedTicket {
    pub filename: String,
    pub page_size_mm: [f32; 2],
    pub geometry: ExportGeometry,
    /// Hash of the raster content; identical for repeat exports of an
    /// unchanged region.
    pub capture_hash: String,
    pub record_fingerprint: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip)]
    pub pdf_bytes: Vec<u8>,
}

impl ExportedTicket {
    /// Write the document into `dir` under its deterministic filename.
    pub fn save_to(&self, dir: &Path) -> std::io::Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = dir.join(&self.filename);
        fs::write(&path, &self.pdf_bytes)?;
        Ok(path)
    }
}

/// Deterministic artifact name: `ticket_<IdentifierCode>.pdf`.
pub fn artifact_filename(id: &TicketId) -> String {
    format!("{}_{}.pdf", ARTIFACT_PREFIX, id)
}

/// The export pipeline - the only way a ticket document is produced.
pub struct ExportPipeline {
    event: EventProfile,
    page: PageSpec,
    in_flight: AtomicBool,
}

impl ExportPipeline {
    pub fn new(event: EventProfile, page: PageSpec) -> Self {
        Self {
            event,
            page,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn event(&self) -> &EventProfile {
        &self.event
    }

    pub fn page(&self) -> &PageSpec {
        &self.page
    }

    /// Render the record's card and export it; the common path.
    pub fn export_for(
        &self,
        record: &AttendeeRecord,
        viewport: Viewport,
    ) -> Result<ExportedTicket, ExportError> {
        let region = render_ticket(record, &self.event)?;
        self.export_ticket(&region, record, CaptureOptions::for_viewport(viewport))
    }

    /// Export an already-rendered region.
    pub fn export_ticket(
        &self,
        region: &TicketRegion,
        record: &AttendeeRecord,
        options: CaptureOptions,
    ) -> Result<ExportedTicket, ExportError> {
        let _guard = self.try_begin()?;

        let capture = capture_region(region, options)?;
        let geometry = ExportGeometry::fit(capture.width, capture.height, &self.page);
        let created_at = Utc::now();
        let generated_on = created_at.format("%B %-d, %Y").to_string();

        tracing::info!(
            ticket_id = %record.ticket_id,
            capture_width = capture.width,
            capture_height = capture.height,
            image_width_mm = geometry.image_width_mm,
            image_height_mm = geometry.image_height_mm,
            "assembling ticket document"
        );

        let pdf_bytes = assemble_document(&capture, &geometry, record, &self.event, &generated_on)?;

        Ok(ExportedTicket {
            filename: artifact_filename(&record.ticket_id),
            page_size_mm: [self.page.width_mm, self.page.height_mm],
            geometry,
            capture_hash: capture.content_hash(),
            record_fingerprint: hashing::record_fingerprint(record)?,
            created_at,
            pdf_bytes,
        })
    }

    /// Claim the single-flight lock. The returned guard releases it on drop;
    /// while it lives, every other export attempt gets `Busy`.
    pub fn try_begin(&self) -> Result<FlightGuard<'_>, ExportError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::warn!("export rejected: another export is in flight");
            return Err(ExportError::Busy);
        }
        Ok(FlightGuard {
            in_flight: &self.in_flight,
        })
    }
}

impl Default for ExportPipeline {
    fn default() -> Self {
        Self::new(EventProfile::default(), PageSpec::default())
    }
}

/// Holds the pipeline's single-flight lock until dropped.
pub struct FlightGuard<'a> {
    in_flight: &'a AtomicBool,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.in_flight.store(false, Ordering::SeqCst);
    }
}
