//! Document assembly - embed the captured card and issuer annotations.
//!
//! The capture is placed at the geometry computed by the fit step; text
//! annotations sit at page-relative coordinates around it.

use printpdf::*;
use thiserror::Error;

use crate::attendee::AttendeeRecord;
use crate::capture::Capture;
use crate::event::EventProfile;
use crate::page::ExportGeometry;

const SIGNER_FONT_SIZE: f32 = 11.0;
const SIGNER_TITLE_FONT_SIZE: f32 = 8.0;
const INFO_FONT_SIZE: f32 = 7.0;
const BRANDING_FONT_SIZE: f32 = 8.0;

const ACCENT: (f32, f32, f32) = (6.0 / 255.0, 182.0 / 255.0, 212.0 / 255.0);
const MUTED: (f32, f32, f32) = (100.0 / 255.0, 100.0 / 255.0, 100.0 / 255.0);

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("Failed to assemble document: {0}")]
    Assemble(String),
}

/// Assemble the single-page document: the capture at its fitted position,
/// signature block near its lower-right corner, info and branding lines
/// along the bottom margin. Returns the finished PDF bytes.
pub fn assemble_document(
    capture: &Capture,
    geometry: &ExportGeometry,
    record: &AttendeeRecord,
    event: &EventProfile,
    generated_on: &str,
) -> Result<Vec<u8>, PdfError> {
    let (doc, page1, layer1) = PdfDocument::new(
        "Event Ticket",
        Mm(geometry.page_width_mm),
        Mm(geometry.page_height_mm),
        "Layer 1",
    );
    let layer = doc.get_page(page1).get_layer(layer1);

    let font_regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| PdfError::Assemble(e.to_string()))?;
    let font_bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| PdfError::Assemble(e.to_string()))?;
    let font_italic = doc
        .add_builtin_font(BuiltinFont::HelveticaOblique)
        .map_err(|e| PdfError::Assemble(e.to_string()))?;

    embed_capture(&layer, capture, geometry);
    draw_signature_block(&layer, &font_italic, geometry, event);
    draw_footer(&layer, &font_regular, &font_bold, geometry, record, event, generated_on);

    doc.save_to_bytes()
        .map_err(|e| PdfError::Assemble(e.to_string()))
}

fn embed_capture(layer: &PdfLayerReference, capture: &Capture, geometry: &ExportGeometry) {
    let image = Image::from(ImageXObject {
        width: Px(capture.width as usize),
        height: Px(capture.height as usize),
        color_space: ColorSpace::Rgb,
        bits_per_component: ColorBits::Bit8,
        interpolate: true,
        image_data: capture.pixels.clone(),
        image_filter: None,
        clipping_bbox: None,
        smask: None,
    });

    // DPI chosen so the raster lands at exactly the fitted physical size.
    let dpi = capture.width as f32 / (geometry.image_width_mm / 25.4);

    image.add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(Mm(geometry.offset_x_mm)),
            translate_y: Some(Mm(geometry.offset_y_mm)),
            dpi: Some(dpi),
            ..Default::default()
        },
    );
}

fn draw_signature_block(
    layer: &PdfLayerReference,
    font_italic: &IndirectFontRef,
    geometry: &ExportGeometry,
    event: &EventProfile,
) {
    let right = geometry.offset_x_mm + geometry.image_width_mm;
    let signature_y = geometry.offset_y_mm + 20.0;

    layer.set_outline_color(Color::Rgb(Rgb::new(ACCENT.0, ACCENT.1, ACCENT.2, None)));
    layer.set_outline_thickness(0.5);
    draw_line(layer, right - 80.0, signature_y, right - 10.0, signature_y);

    layer.set_fill_color(Color::Rgb(Rgb::new(ACCENT.0, ACCENT.1, ACCENT.2, None)));
    layer.use_text(
        &event.issuer.signer,
        SIGNER_FONT_SIZE,
        Mm(right - 70.0),
        Mm(signature_y + 2.0),
        font_italic,
    );
    layer.use_text(
        &event.issuer.signer_title,
        SIGNER_TITLE_FONT_SIZE,
        Mm(right - 70.0),
        Mm(signature_y - 4.0),
        font_italic,
    );
}

fn draw_footer(
    layer: &PdfLayerReference,
    font_regular: &IndirectFontRef,
    font_bold: &IndirectFontRef,
    geometry: &ExportGeometry,
    record: &AttendeeRecord,
    event: &EventProfile,
    generated_on: &str,
) {
    let margin = geometry.offset_x_mm.min(geometry.offset_y_mm).min(10.0);

    layer.set_fill_color(Color::Rgb(Rgb::new(MUTED.0, MUTED.1, MUTED.2, None)));
    layer.use_text(
        &format!(
            "Ticket #{} | Generated on {}",
            record.ticket_id, generated_on
        ),
        INFO_FONT_SIZE,
        Mm(geometry.offset_x_mm),
        Mm(margin),
        font_regular,
    );

    // Right side: issuer branding. Builtin fonts carry no metrics here, so
    // the right alignment is a fixed offset from the edge.
    layer.set_fill_color(Color::Rgb(Rgb::new(ACCENT.0, ACCENT.1, ACCENT.2, None)));
    layer.use_text(
        &event.issuer.branding,
        BRANDING_FONT_SIZE,
        Mm(geometry.page_width_mm - margin - 60.0),
        Mm(margin),
        font_bold,
    );
}

fn draw_line(layer: &PdfLayerReference, x1: f32, y1: f32, x2: f32, y2: f32) {
    let line = Line {
        points: vec![
            (Point::new(Mm(x1), Mm(y1)), false),
            (Point::new(Mm(x2), Mm(y2)), false),
        ],
        is_closed: false,
    };
    layer.add_line(line);
}
