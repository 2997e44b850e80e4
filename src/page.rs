//! Page specifications and fit geometry for the exported document.
//!
//! PageAuthority records where a spec came from, keeping override handling in
//! one place instead of scattered conditionals.

use serde::{Deserialize, Serialize};

/// Where a page specification comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageAuthority {
    /// System defaults (fallback)
    System,
    /// Event-profile-defined specification
    Event,
    /// User-provided override (with validation)
    User,
}

impl Default for PageAuthority {
    fn default() -> Self {
        Self::System
    }
}

/// Target medium for the exported ticket, in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSpec {
    pub authority: PageAuthority,
    pub width_mm: f32,
    pub height_mm: f32,
    pub margin_mm: f32,
}

impl Default for PageSpec {
    fn default() -> Self {
        Self::a4_portrait()
    }
}

impl PageSpec {
    pub fn a4_portrait() -> Self {
        Self {
            authority: PageAuthority::System,
            width_mm: 210.0,
            height_mm: 297.0,
            margin_mm: 10.0,
        }
    }

    pub fn from_event(width_mm: f32, height_mm: f32, margin_mm: f32) -> Self {
        Self {
            authority: PageAuthority::Event,
            width_mm,
            height_mm,
            margin_mm,
        }
    }

    pub fn from_user(width_mm: f32, height_mm: f32, margin_mm: f32) -> Result<Self, &'static str> {
        if !(50.0..=1000.0).contains(&width_mm) || !(50.0..=1000.0).contains(&height_mm) {
            return Err("Page dimensions must be between 50 and 1000 mm");
        }
        if margin_mm < 0.0 || 2.0 * margin_mm >= width_mm.min(height_mm) {
            return Err("Margins must be non-negative and leave a content area");
        }
        Ok(Self {
            authority: PageAuthority::User,
            width_mm,
            height_mm,
            margin_mm,
        })
    }

    pub fn content_width(&self) -> f32 {
        self.width_mm - 2.0 * self.margin_mm
    }

    pub fn content_height(&self) -> f32 {
        self.height_mm - 2.0 * self.margin_mm
    }
}

/// Placement of a capture on a page. Derived, never stored; recomputed from
/// the live capture on every export.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportGeometry {
    pub capture_width: u32,
    pub capture_height: u32,
    pub page_width_mm: f32,
    pub page_height_mm: f32,
    pub image_width_mm: f32,
    pub image_height_mm: f32,
    /// Lower-left corner of the embedded image, page coordinates.
    pub offset_x_mm: f32,
    pub offset_y_mm: f32,
    /// Millimetres per capture pixel.
    pub scale: f32,
}

impl ExportGeometry {
    /// Fit the capture inside the page margins: uniform scale, aspect ratio
    /// preserved, centered on both axes.
    pub fn fit(capture_width: u32, capture_height: u32, page: &PageSpec) -> Self {
        let cw = capture_width as f32;
        let ch = capture_height as f32;
        let scale = (page.content_width() / cw).min(page.content_height() / ch);
        let image_width_mm = cw * scale;
        let image_height_mm = ch * scale;
        Self {
            capture_width,
            capture_height,
            page_width_mm: page.width_mm,
            page_height_mm: page.height_mm,
            image_width_mm,
            image_height_mm,
            offset_x_mm: (page.width_mm - image_width_mm) / 2.0,
            offset_y_mm: (page.height_mm - image_height_mm) / 2.0,
            scale,
        }
    }

    pub fn image_aspect_ratio(&self) -> f32 {
        self.image_width_mm / self.image_height_mm
    }

    pub fn capture_aspect_ratio(&self) -> f32 {
        self.capture_width as f32 / self.capture_height as f32
    }
}
