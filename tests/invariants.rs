//! Contract Invariant Tests
//!
//! These tests verify the export pipeline's guarantees end to end.

use marspass::{
    capture::{capture_region, capture_scale, CaptureOptions},
    export::{artifact_filename, ExportError, ExportPipeline},
    registration::{submit, RegistrationForm, RegistrationOutcome},
    store::{load_ticket_view, JsonFileStore, LoadOutcome, MemoryStore, SessionStore},
    ticket::{render_ticket, CARD_HEIGHT, CARD_WIDTH},
    AttendeeRecord, CaptureError, EventProfile, PageSpec, TicketId, TicketRegion, Viewport,
};

fn create_test_record() -> AttendeeRecord {
    AttendeeRecord {
        name: "John Doe".to_string(),
        email: "john.doe@example.com".to_string(),
        planet: "Earth".to_string(),
        country: "Canada".to_string(),
        age: 34,
        special_requests: None,
        ticket_id: TicketId::new("TKT-AB12CD34"),
        photo_url: None,
    }
}

fn create_pipeline() -> ExportPipeline {
    ExportPipeline::new(EventProfile::default(), PageSpec::a4_portrait())
}

#[test]
fn invariant_export_matches_target_medium() {
    let pipeline = create_pipeline();
    let record = create_test_record();

    let exported = pipeline
        .export_for(&record, Viewport::desktop())
        .expect("export failed");

    // Declared page dimensions match the configured medium.
    assert_eq!(exported.page_size_mm, [210.0, 297.0]);

    // The embedded image stays inside the margins on both axes.
    let g = &exported.geometry;
    assert!(g.image_width_mm <= 190.0 + 1e-3);
    assert!(g.image_height_mm <= 277.0 + 1e-3);
    assert!(g.offset_x_mm >= 10.0 - 1e-3);
    assert!(g.offset_y_mm >= 10.0 - 1e-3);

    // Embedded aspect ratio matches the capture within rounding tolerance.
    assert!((g.image_aspect_ratio() - g.capture_aspect_ratio()).abs() < 0.01);

    // Exactly one artifact, and it is a PDF.
    assert!(exported.pdf_bytes.starts_with(b"%PDF"));
}

#[test]
fn invariant_zero_sized_region_yields_render_not_ready() {
    let pipeline = create_pipeline();
    let record = create_test_record();
    let region = TicketRegion {
        svg: r#"<svg xmlns="http://www.w3.org/2000/svg"/>"#.to_string(),
        width: 0.0,
        height: 0.0,
    };

    let result = pipeline.export_ticket(&region, &record, CaptureOptions::default());

    // No artifact is produced.
    assert!(matches!(
        result,
        Err(ExportError::Capture(CaptureError::RenderNotReady { .. }))
    ));
}

#[test]
fn invariant_repeat_export_has_identical_visual_content() {
    let pipeline = create_pipeline();
    let record = create_test_record();

    let first = pipeline
        .export_for(&record, Viewport::desktop())
        .expect("first export failed");
    let second = pipeline
        .export_for(&record, Viewport::desktop())
        .expect("second export failed");

    // Unchanged input and region: same pixels, same placement, same name.
    assert_eq!(first.capture_hash, second.capture_hash);
    assert_eq!(first.geometry, second.geometry);
    assert_eq!(first.filename, second.filename);
    assert_eq!(first.record_fingerprint, second.record_fingerprint);
}

#[test]
fn invariant_attendee_identity_reaches_the_raster() {
    let event = EventProfile::default();
    let mut renamed = create_test_record();
    renamed.name = "A Completely Different Attendee".to_string();

    let base = capture_region(
        &render_ticket(&create_test_record(), &event).unwrap(),
        CaptureOptions::default(),
    )
    .expect("capture failed");
    let other = capture_region(
        &render_ticket(&renamed, &event).unwrap(),
        CaptureOptions::default(),
    )
    .expect("capture failed");

    // Records that differ only in the printed name must capture differently;
    // identical hashes would mean the text never rasterized.
    assert_ne!(base.content_hash(), other.content_hash());
}

#[test]
fn invariant_overlapping_export_is_rejected_busy() {
    let pipeline = create_pipeline();
    let record = create_test_record();

    let guard = pipeline.try_begin().expect("lock should be free");
    let result = pipeline.export_for(&record, Viewport::desktop());
    assert!(matches!(result, Err(ExportError::Busy)));
    drop(guard);

    // Once the in-flight export finishes, retries succeed.
    assert!(pipeline.export_for(&record, Viewport::desktop()).is_ok());
}

#[test]
fn scenario_artifact_filename_derives_from_identifier() {
    let record = create_test_record();
    assert_eq!(artifact_filename(&record.ticket_id), "ticket_TKT-AB12CD34.pdf");

    let pipeline = create_pipeline();
    let exported = pipeline
        .export_for(&record, Viewport::desktop())
        .expect("export failed");
    assert_eq!(exported.filename, "ticket_TKT-AB12CD34.pdf");
    // Single embedded image spans within the 210mm page width minus margins.
    assert!(exported.geometry.image_width_mm <= 210.0 - 2.0 * 10.0 + 1e-3);
}

#[test]
fn scenario_missing_photo_shows_placeholder_and_exports() {
    let record = create_test_record();
    assert!(record.photo_url.is_none());

    let region = render_ticket(&record, &EventProfile::default()).unwrap();
    assert!(region.svg.contains("photo-placeholder"));

    let pipeline = create_pipeline();
    let result = pipeline.export_ticket(&region, &record, CaptureOptions::default());
    assert!(result.is_ok());
}

#[test]
fn scenario_empty_store_redirects_to_registration() {
    let store = MemoryStore::new();
    let outcome = load_ticket_view(&store).unwrap();
    assert_eq!(
        outcome,
        LoadOutcome::RedirectToRegistration {
            target: "/register".to_string()
        }
    );
}

#[test]
fn scenario_narrow_viewport_selects_scale_three() {
    let viewport = Viewport::new(375.0, 667.0);
    assert_eq!(capture_scale(viewport), 3.0);

    // The rasterization call receives the selected scale: at scale 3 the
    // capture is exactly three times the card's logical size.
    let record = create_test_record();
    let region = render_ticket(&record, &EventProfile::default()).unwrap();
    let pipeline = create_pipeline();
    let exported = pipeline
        .export_ticket(&region, &record, CaptureOptions::for_viewport(viewport))
        .expect("export failed");
    assert_eq!(
        exported.geometry.capture_width,
        (CARD_WIDTH * 3.0) as u32
    );
    assert_eq!(
        exported.geometry.capture_height,
        (CARD_HEIGHT * 3.0) as u32
    );
}

#[test]
fn invariant_registration_blocks_until_resolved() {
    let form = RegistrationForm {
        name: String::new(),
        email: "bad".to_string(),
        planet: "Earth".to_string(),
        country: String::new(),
        age: "16".to_string(),
        special_requests: String::new(),
        photo_url: None,
    };

    match submit(&form) {
        RegistrationOutcome::Rejected(violations) => {
            let fields: Vec<_> = violations.iter().map(|v| v.field.as_str()).collect();
            assert!(fields.contains(&"name"));
            assert!(fields.contains(&"email"));
            assert!(fields.contains(&"country"));
            assert!(fields.contains(&"age"));
            assert!(fields.contains(&"photo"));
        }
        RegistrationOutcome::Accepted(_) => panic!("invalid form accepted"),
    }
}

#[test]
fn invariant_accepted_registration_mints_namespaced_id() {
    let form = RegistrationForm {
        name: "Valentina Tereshkova".to_string(),
        email: "valentina@example.com".to_string(),
        planet: "Earth".to_string(),
        country: "Russia".to_string(),
        age: "26".to_string(),
        special_requests: "  ".to_string(),
        photo_url: Some("photos/valentina.png".to_string()),
    };

    match submit(&form) {
        RegistrationOutcome::Accepted(record) => {
            assert!(record.ticket_id.as_str().starts_with("MARS-"));
            // Whitespace-only optional fields collapse to absent.
            assert!(record.special_requests.is_none());
        }
        RegistrationOutcome::Rejected(v) => panic!("rejected: {:?}", v),
    }
}

#[test]
fn invariant_file_store_hands_record_across_invocations() {
    let dir = tempfile::tempdir().unwrap();
    let record = create_test_record();

    {
        let mut store = JsonFileStore::new(dir.path());
        store.put(&record).unwrap();
    }

    // A fresh store over the same directory sees the same record.
    let store = JsonFileStore::new(dir.path());
    match load_ticket_view(&store).unwrap() {
        LoadOutcome::Ready { record: loaded } => assert_eq!(loaded, record),
        other => panic!("expected record, got {:?}", other),
    }
}

#[test]
fn invariant_saved_artifact_lands_under_deterministic_name() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = create_pipeline();
    let record = create_test_record();

    let exported = pipeline
        .export_for(&record, Viewport::desktop())
        .expect("export failed");
    let path = exported.save_to(dir.path()).expect("save failed");

    assert_eq!(path, dir.path().join("ticket_TKT-AB12CD34.pdf"));
    let bytes = std::fs::read(&path).unwrap();
    assert!(bytes.starts_with(b"%PDF"));
}
