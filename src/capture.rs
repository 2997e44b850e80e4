//! Region capture - rasterize the rendered card ahead of document assembly.
//!
//! Captures are self-contained and never cached: every export rasterizes the
//! current region from scratch.

use resvg::{tiny_skia, usvg};
use std::sync::{Arc, OnceLock};
use thiserror::Error;

use crate::ticket::TicketRegion;

/// Logical viewport the ticket is being viewed in. Only the width matters
/// for the capture policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn desktop() -> Self {
        Self {
            width: 1280.0,
            height: 800.0,
        }
    }

    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Capture scale policy. Narrow viewports show the card at proportionally
/// fewer source pixels, so the raster scale rises to keep the export sharp.
pub fn capture_scale(viewport: Viewport) -> f32 {
    if viewport.width <= 375.0 {
        3.0
    } else if viewport.width <= 480.0 {
        2.5
    } else {
        2.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureOptions {
    /// Raster pixels per logical unit.
    pub scale: f32,
    /// Background the card is composited over, RGB.
    pub background: [u8; 3],
}

impl CaptureOptions {
    pub fn for_viewport(viewport: Viewport) -> Self {
        Self {
            scale: capture_scale(viewport),
            background: [0, 0, 0],
        }
    }
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self::for_viewport(Viewport::desktop())
    }
}

#[derive(Debug, Error)]
pub enum CaptureError {
    /// The capture target is missing or zero-sized; rasterizing would
    /// produce a corrupt capture.
    #[error("Capture region is not ready ({width}x{height})")]
    RenderNotReady { width: f32, height: f32 },

    #[error("Failed to rasterize region: {0}")]
    Rasterize(String),
}

/// Completed raster of a ticket region.
#[derive(Debug, Clone)]
pub struct Capture {
    pub width: u32,
    pub height: u32,
    pub scale: f32,
    /// Tightly packed RGB8, already composited over the background.
    pub pixels: Vec<u8>,
}

impl Capture {
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Hash of the raster content. Two captures of an unchanged region at
    /// the same options hash identically.
    pub fn content_hash(&self) -> String {
        crate::hashing::sha256_hex(&self.pixels)
    }
}

const SANS_FAMILIES: &[&str] = &[
    "Helvetica",
    "Arial",
    "DejaVu Sans",
    "Liberation Sans",
    "Noto Sans",
    "FreeSans",
];

const MONO_FAMILIES: &[&str] = &[
    "Courier New",
    "DejaVu Sans Mono",
    "Liberation Mono",
    "Noto Sans Mono",
    "FreeMono",
];

/// Parse options shared by every capture. Text is converted to paths at
/// parse time against this font database, so it must hold real faces: the
/// system fonts are loaded once and the generic families are mapped onto
/// faces that actually exist, keeping the card's text rendering even when
/// none of its named fonts are installed.
fn svg_options() -> &'static usvg::Options<'static> {
    static OPTIONS: OnceLock<usvg::Options<'static>> = OnceLock::new();
    OPTIONS.get_or_init(|| {
        let mut fontdb = usvg::fontdb::Database::new();
        fontdb.load_system_fonts();

        let installed: Vec<String> = fontdb
            .faces()
            .filter_map(|face| face.families.first().map(|(name, _)| name.clone()))
            .collect();
        match pick_family(&installed, SANS_FAMILIES) {
            Some(sans) => {
                let mono = pick_family(&installed, MONO_FAMILIES).unwrap_or_else(|| sans.clone());
                tracing::debug!(sans = %sans, mono = %mono, "resolved capture font families");
                fontdb.set_serif_family(sans.clone());
                fontdb.set_sans_serif_family(sans);
                fontdb.set_monospace_family(mono);
            }
            None => {
                tracing::warn!("no system fonts available; captured text will not rasterize");
            }
        }

        let mut options = usvg::Options::default();
        options.fontdb = Arc::new(fontdb);
        options
    })
}

fn pick_family(installed: &[String], preferred: &[&str]) -> Option<String> {
    preferred
        .iter()
        .find(|name| installed.iter().any(|have| have == *name))
        .map(|name| name.to_string())
        .or_else(|| installed.first().cloned())
}

/// Rasterize a region at the requested scale.
pub fn capture_region(
    region: &TicketRegion,
    options: CaptureOptions,
) -> Result<Capture, CaptureError> {
    if region.width <= 0.0 || region.height <= 0.0 {
        return Err(CaptureError::RenderNotReady {
            width: region.width,
            height: region.height,
        });
    }

    let tree = usvg::Tree::from_str(&region.svg, svg_options())
        .map_err(|e| CaptureError::Rasterize(e.to_string()))?;

    let px_width = (region.width * options.scale).ceil() as u32;
    let px_height = (region.height * options.scale).ceil() as u32;
    let mut pixmap = tiny_skia::Pixmap::new(px_width, px_height).ok_or_else(|| {
        CaptureError::Rasterize(format!("cannot allocate {}x{} pixmap", px_width, px_height))
    })?;

    resvg::render(
        &tree,
        usvg::Transform::from_scale(options.scale, options.scale),
        &mut pixmap.as_mut(),
    );

    tracing::debug!(
        width = px_width,
        height = px_height,
        scale = options.scale,
        "captured ticket region"
    );

    Ok(Capture {
        width: px_width,
        height: px_height,
        scale: options.scale,
        pixels: flatten_rgb(&pixmap, options.background),
    })
}

/// Demultiply and composite the pixmap over a solid background, producing
/// the RGB bytes the document embeds.
fn flatten_rgb(pixmap: &tiny_skia::Pixmap, background: [u8; 3]) -> Vec<u8> {
    let mut out = Vec::with_capacity(pixmap.width() as usize * pixmap.height() as usize * 3);
    for pixel in pixmap.pixels() {
        let c = pixel.demultiply();
        let alpha = c.alpha() as f32 / 255.0;
        for (channel, bg) in [c.red(), c.green(), c.blue()].into_iter().zip(background) {
            out.push((channel as f32 * alpha + bg as f32 * (1.0 - alpha)) as u8);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(width: f32, height: f32) -> TicketRegion {
        TicketRegion {
            svg: format!(
                r##"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}"><rect width="{w}" height="{h}" fill="#ff0000"/></svg>"##,
                w = width.max(1.0),
                h = height.max(1.0),
            ),
            width,
            height,
        }
    }

    #[test]
    fn test_scale_policy_by_viewport_width() {
        assert_eq!(capture_scale(Viewport::new(320.0, 568.0)), 3.0);
        assert_eq!(capture_scale(Viewport::new(375.0, 667.0)), 3.0);
        assert_eq!(capture_scale(Viewport::new(480.0, 800.0)), 2.5);
        assert_eq!(capture_scale(Viewport::new(1280.0, 800.0)), 2.0);
    }

    #[test]
    fn test_zero_sized_region_not_ready() {
        let result = capture_region(&region(0.0, 420.0), CaptureOptions::default());
        assert!(matches!(
            result,
            Err(CaptureError::RenderNotReady { .. })
        ));
    }

    #[test]
    fn test_capture_dimensions_follow_scale() {
        let capture = capture_region(
            &region(100.0, 50.0),
            CaptureOptions {
                scale: 3.0,
                background: [0, 0, 0],
            },
        )
        .unwrap();
        assert_eq!(capture.width, 300);
        assert_eq!(capture.height, 150);
        assert_eq!(capture.pixels.len(), 300 * 150 * 3);
    }

    #[test]
    fn test_capture_hash_stable() {
        let r = region(64.0, 64.0);
        let a = capture_region(&r, CaptureOptions::default()).unwrap();
        let b = capture_region(&r, CaptureOptions::default()).unwrap();
        assert_eq!(a.content_hash(), b.content_hash());
    }

    #[test]
    fn test_text_reaches_the_pixels() {
        let region = TicketRegion {
            svg: r##"<svg xmlns="http://www.w3.org/2000/svg" width="200" height="60" viewBox="0 0 200 60"><rect width="200" height="60" fill="#000000"/><text x="10" y="44" font-family="Helvetica, Arial, sans-serif" font-size="36" fill="#ffffff">WWWW</text></svg>"##
                .to_string(),
            width: 200.0,
            height: 60.0,
        };
        let capture = capture_region(
            &region,
            CaptureOptions {
                scale: 2.0,
                background: [0, 0, 0],
            },
        )
        .unwrap();
        // Glyphs must land as light pixels over the dark fill.
        assert!(capture.pixels.iter().any(|&channel| channel > 128));
    }

    #[test]
    fn test_opaque_fill_survives_flatten() {
        let capture = capture_region(
            &region(4.0, 4.0),
            CaptureOptions {
                scale: 1.0,
                background: [0, 0, 0],
            },
        )
        .unwrap();
        // Solid red rect: first pixel is pure red regardless of background.
        assert_eq!(&capture.pixels[0..3], &[255, 0, 0]);
    }
}
