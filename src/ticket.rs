//! Ticket renderer - deterministic card markup from an attendee record.
//!
//! Pure data-to-markup binding: the same record and event profile always
//! produce byte-identical SVG, so the capture step can rely on a stable
//! layout. The photo slot keeps its frame whether or not a photo exists;
//! missing optional fields drop their row entirely.

use qrcode::{Color, EcLevel, QrCode};
use thiserror::Error;

use crate::attendee::AttendeeRecord;
use crate::event::EventProfile;
use crate::QR_NAMESPACE;

/// Fixed card design size, logical units. 2:1 boarding-pass aspect.
pub const CARD_WIDTH: f32 = 840.0;
pub const CARD_HEIGHT: f32 = 420.0;

const QR_BOX: f32 = 120.0;
const PHOTO_BOX: f32 = 128.0;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Failed to encode check-in code: {0}")]
    Qr(String),
}

/// A rendered capture region: fixed-layout markup plus its logical size.
#[derive(Debug, Clone)]
pub struct TicketRegion {
    pub svg: String,
    pub width: f32,
    pub height: f32,
}

/// Render the ticket card for a record. The scannable code carries
/// `MARS-EVENT-<ticket id>` at error-correction level H.
pub fn render_ticket(
    record: &AttendeeRecord,
    event: &EventProfile,
) -> Result<TicketRegion, RenderError> {
    let token = format!("{}-{}", QR_NAMESPACE, record.ticket_id);
    let qr = qr_modules(&token)?;

    let mut svg = String::with_capacity(8 * 1024);
    svg.push_str(&format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="Helvetica, Arial, sans-serif">"##,
        w = CARD_WIDTH,
        h = CARD_HEIGHT,
    ));

    // Background: slate-to-cyan gradient, faint grid, cyan border.
    svg.push_str(concat!(
        r##"<defs>"##,
        r##"<linearGradient id="bg" x1="0" y1="0" x2="1" y2="0">"##,
        r##"<stop offset="0" stop-color="#0f172a"/>"##,
        r##"<stop offset="1" stop-color="#164e63"/>"##,
        r##"</linearGradient>"##,
        r##"<pattern id="grid" width="20" height="20" patternUnits="userSpaceOnUse">"##,
        r##"<path d="M 20 0 L 0 0 0 20" fill="none" stroke="#00ffff" stroke-opacity="0.12" stroke-width="1"/>"##,
        r##"</pattern>"##,
        r##"</defs>"##,
    ));
    svg.push_str(&format!(
        r##"<rect width="{w}" height="{h}" rx="16" fill="url(#bg)"/><rect width="{w}" height="{h}" rx="16" fill="url(#grid)"/><rect x="1" y="1" width="{bw}" height="{bh}" rx="15" fill="none" stroke="#06b6d4" stroke-width="2"/>"##,
        w = CARD_WIDTH,
        h = CARD_HEIGHT,
        bw = CARD_WIDTH - 2.0,
        bh = CARD_HEIGHT - 2.0,
    ));

    left_block(&mut svg, record, event);
    right_panel(&mut svg, record, event, &qr);

    svg.push_str("</svg>");

    Ok(TicketRegion {
        svg,
        width: CARD_WIDTH,
        height: CARD_HEIGHT,
    })
}

fn left_block(svg: &mut String, record: &AttendeeRecord, event: &EventProfile) {
    // Event title block with access badge.
    svg.push_str(&format!(
        r##"<text x="40" y="62" fill="#ffffff" font-size="28" font-weight="bold">{}</text>"##,
        escape_xml(&event.title)
    ));
    svg.push_str(&format!(
        r##"<text x="40" y="84" fill="#67e8f9" font-size="14" letter-spacing="2">{}</text>"##,
        escape_xml(&event.subtitle)
    ));
    svg.push_str(&format!(
        r##"<rect x="400" y="40" width="120" height="28" rx="4" fill="#164e63" fill-opacity="0.5" stroke="#06b6d4"/><text x="460" y="59" fill="#67e8f9" font-size="13" text-anchor="middle">{}</text>"##,
        escape_xml(&event.access_label)
    ));

    // Attendee identity block. A missing optional field omits its row; the
    // rows above it keep their positions.
    let mut y = 140.0;
    field(svg, 40.0, y, "PASSENGER NAME", &record.name);
    y += 52.0;
    field(svg, 40.0, y, "ORIGIN", &record.origin_label());
    field(svg, 280.0, y, "DESTINATION", &event.destination);
    y += 52.0;
    field(svg, 40.0, y, "DATE", &event.date);
    field(svg, 280.0, y, "DEPARTURE TIME", &event.departure_time);
    y += 52.0;
    if let Some(requests) = &record.special_requests {
        field(svg, 40.0, y, "SPECIAL REQUESTS", requests);
    }

    // Ticket ID strip along the bottom of the left block.
    svg.push_str(concat!(
        r##"<rect x="40" y="356" width="180" height="2" fill="#06b6d4" fill-opacity="0.4"/>"##,
        r##"<text x="280" y="361" fill="#67e8f9" font-size="11" text-anchor="middle">TICKET ID</text>"##,
        r##"<rect x="340" y="356" width="180" height="2" fill="#06b6d4" fill-opacity="0.4"/>"##,
    ));
    svg.push_str(&format!(
        r##"<text x="280" y="384" fill="#67e8f9" font-size="15" font-family="monospace" text-anchor="middle">{}</text>"##,
        escape_xml(record.ticket_id.as_str())
    ));
}

fn right_panel(svg: &mut String, record: &AttendeeRecord, event: &EventProfile, qr: &QrModules) {
    // Panel backdrop.
    svg.push_str(&format!(
        r##"<rect x="560" y="0" width="280" height="{h}" fill="#0f172a" fill-opacity="0.7"/><line x1="560" y1="0" x2="560" y2="{h}" stroke="#06b6d4" stroke-opacity="0.5"/>"##,
        h = CARD_HEIGHT,
    ));

    // Photo frame. The placeholder silhouette is always drawn; an attached
    // photo paints over it so the layout never shifts.
    let px = 560.0 + (280.0 - PHOTO_BOX) / 2.0;
    let py = 28.0;
    svg.push_str(&format!(
        r##"<rect x="{x}" y="{y}" width="{s}" height="{s}" rx="8" fill="#164e63" fill-opacity="0.2" stroke="#22d3ee" stroke-width="2"/>"##,
        x = px,
        y = py,
        s = PHOTO_BOX,
    ));
    svg.push_str(&format!(
        r##"<g id="photo-placeholder" fill="#06b6d4" fill-opacity="0.7"><circle cx="{cx}" cy="{hy}" r="22"/><path d="M {sx} {sy} a 42 42 0 0 1 84 0 z"/></g>"##,
        cx = px + PHOTO_BOX / 2.0,
        hy = py + 46.0,
        sx = px + PHOTO_BOX / 2.0 - 42.0,
        sy = py + PHOTO_BOX - 12.0,
    ));
    if let Some(photo) = &record.photo_url {
        svg.push_str(&format!(
            r##"<image x="{x}" y="{y}" width="{s}" height="{s}" xlink:href="{href}" preserveAspectRatio="xMidYMid slice"/>"##,
            x = px,
            y = py,
            s = PHOTO_BOX,
            href = escape_xml(photo),
        ));
    }

    // QR code on a white card.
    let qx = 560.0 + (280.0 - QR_BOX) / 2.0;
    let qy = 176.0;
    svg.push_str(&format!(
        r##"<rect x="{x}" y="{y}" width="{pad}" height="{pad}" rx="6" fill="#ffffff"/>"##,
        x = qx - 8.0,
        y = qy - 8.0,
        pad = QR_BOX + 16.0,
    ));
    qr.emit(svg, qx, qy, QR_BOX);
    svg.push_str(&format!(
        r##"<text x="700" y="{y}" fill="#67e8f9" font-size="11" text-anchor="middle">Scan for check-in</text>"##,
        y = qy + QR_BOX + 24.0,
    ));

    // Issuer block.
    svg.push_str(&format!(
        r##"<text x="700" y="366" fill="#22d3ee" font-size="11" text-anchor="middle">{}</text><text x="700" y="382" fill="#67e8f9" font-size="12" font-weight="bold" text-anchor="middle">{}</text>"##,
        escape_xml(&event.issuer.authority),
        escape_xml(&event.issuer.permit),
    ));
}

/// Small-caps label over a value, the repeating unit of the identity block.
fn field(svg: &mut String, x: f32, y: f32, label: &str, value: &str) {
    svg.push_str(&format!(
        r##"<text x="{x}" y="{y}" fill="#22d3ee" font-size="11" letter-spacing="1">{label}</text><text x="{x}" y="{vy}" fill="#ffffff" font-size="17">{value}</text>"##,
        x = x,
        y = y,
        vy = y + 22.0,
        label = escape_xml(label),
        value = escape_xml(value),
    ));
}

/// Dark-module positions of the encoded token.
struct QrModules {
    width: usize,
    dark: Vec<(usize, usize)>,
}

impl QrModules {
    /// Emit the modules as rects inside a `size`-unit box at (x, y).
    fn emit(&self, svg: &mut String, x: f32, y: f32, size: f32) {
        let cell = size / self.width as f32;
        for &(cx, cy) in &self.dark {
            svg.push_str(&format!(
                r##"<rect x="{:.3}" y="{:.3}" width="{:.3}" height="{:.3}" fill="#000000"/>"##,
                x + cx as f32 * cell,
                y + cy as f32 * cell,
                cell,
                cell,
            ));
        }
    }
}

fn qr_modules(token: &str) -> Result<QrModules, RenderError> {
    let code = QrCode::with_error_correction_level(token.as_bytes(), EcLevel::H)
        .map_err(|e| RenderError::Qr(e.to_string()))?;
    let width = code.width();
    let dark = code
        .to_colors()
        .iter()
        .enumerate()
        .filter(|(_, c)| **c == Color::Dark)
        .map(|(i, _)| (i % width, i / width))
        .collect();
    Ok(QrModules { width, dark })
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attendee::TicketId;

    fn record() -> AttendeeRecord {
        AttendeeRecord {
            name: "John Doe".to_string(),
            email: "john@example.com".to_string(),
            planet: "Earth".to_string(),
            country: "Canada".to_string(),
            age: 34,
            special_requests: None,
            ticket_id: TicketId::new("MARS-1718377200000-0042"),
            photo_url: None,
        }
    }

    #[test]
    fn test_render_is_deterministic() {
        let event = EventProfile::default();
        let a = render_ticket(&record(), &event).unwrap();
        let b = render_ticket(&record(), &event).unwrap();
        assert_eq!(a.svg, b.svg);
        assert_eq!(a.width, CARD_WIDTH);
        assert_eq!(a.height, CARD_HEIGHT);
    }

    #[test]
    fn test_missing_photo_keeps_placeholder() {
        let event = EventProfile::default();
        let region = render_ticket(&record(), &event).unwrap();
        assert!(region.svg.contains("photo-placeholder"));
        assert!(!region.svg.contains("<image"));
    }

    #[test]
    fn test_photo_overlays_same_frame() {
        let event = EventProfile::default();
        let mut with_photo = record();
        with_photo.photo_url = Some("data:image/png;base64,aGVsbG8=".to_string());
        let region = render_ticket(&with_photo, &event).unwrap();
        // Frame and placeholder stay put; the photo paints on top.
        assert!(region.svg.contains("photo-placeholder"));
        assert!(region.svg.contains("<image"));
    }

    #[test]
    fn test_optional_row_omitted() {
        let event = EventProfile::default();
        let without = render_ticket(&record(), &event).unwrap();
        assert!(!without.svg.contains("SPECIAL REQUESTS"));

        let mut with = record();
        with.special_requests = Some("Low-gravity seating".to_string());
        let region = render_ticket(&with, &event).unwrap();
        assert!(region.svg.contains("SPECIAL REQUESTS"));
        assert!(region.svg.contains("Low-gravity seating"));
    }

    #[test]
    fn test_qr_token_namespaced() {
        // The encoded token is namespace + id; verify by re-deriving the
        // module matrix for the expected token.
        let expected = qr_modules("MARS-EVENT-MARS-1718377200000-0042").unwrap();
        assert!(expected.width > 0);
        let event = EventProfile::default();
        let region = render_ticket(&record(), &event).unwrap();
        // Module count is a proxy: identical payloads emit identical rects.
        let rect_count = region.svg.matches(r##"fill="#000000""##).count();
        assert_eq!(rect_count, expected.dark.len());
    }

    #[test]
    fn test_user_text_is_escaped() {
        let event = EventProfile::default();
        let mut hostile = record();
        hostile.name = r#"<script>"x"</script>"#.to_string();
        let region = render_ticket(&hostile, &event).unwrap();
        assert!(!region.svg.contains("<script>"));
        assert!(region.svg.contains("&lt;script&gt;"));
    }
}
