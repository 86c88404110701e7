//! End-to-end tests through the public API.
//!
//! Tests print to an in-memory sink or a device path that does not exist,
//! and render with the built-in font, so no printer or font file is needed.

use std::path::Path;
use std::time::Duration;

use chrono::NaiveDate;
use image::GrayImage;
use pretty_assertions::assert_eq;

use labelprint::encode::chunked::{self, ChunkedQrEncoder, DEFAULT_SPLIT_THRESHOLD};
use labelprint::encode::{Gs1CodeBuilder, QrEncoder, QrSettings};
use labelprint::pipeline::ItemOutcome;
use labelprint::render::font::LabelFont;
use labelprint::transport::{DeviceAddress, DeviceSink, MemorySink};
use labelprint::{LabelError, LabelItem, LabelKind, LabelPipeline, LabelRequest, PipelineConfig, Printer, Quantity};

fn pipeline(work_dir: &Path) -> LabelPipeline {
    let config = PipelineConfig {
        work_dir: work_dir.to_path_buf(),
        pacing: Duration::ZERO,
        ..Default::default()
    };
    LabelPipeline::with_font(config, LabelFont::builtin())
}

fn has_dark_pixel(img: &GrayImage, rows: std::ops::Range<u32>) -> bool {
    rows.flat_map(|y| (0..img.width()).map(move |x| (x, y)))
        .any(|(x, y)| img.get_pixel(x, y).0[0] < 128)
}

/// A payload that compresses poorly.
fn noisy_payload(n: u32) -> String {
    (0..n)
        .map(|i| format!("{:x}", (i * 7919 + 13) % 10007))
        .collect::<Vec<_>>()
        .join(",")
}

/// Hex digits from a fixed LCG; compresses to about half its length.
fn hex_noise(len: usize) -> String {
    let mut x: u64 = 0x2545_f491_4f6c_dd1d;
    let mut out = String::with_capacity(len + 8);
    while out.len() < len {
        x = x
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        out.push_str(&format!("{:08x}", x >> 32));
    }
    out.truncate(len);
    out
}

// ============================================================================
// SCENARIOS
// ============================================================================

#[test]
fn test_text_above_qr_two_copies() {
    let dir = tempfile::tempdir().unwrap();
    let p = pipeline(dir.path());
    let sink = MemorySink::new();
    let printer = Printer::new(sink.clone()).with_pacing(Duration::ZERO);

    let raw = r#"{"qty": 2, "labelItems": [
        {"labelType": "text", "labelKey": "", "labelValue": "Widget"},
        {"labelType": "QR", "labelKey": "", "labelValue": "ABC123"}
    ]}"#;
    let outcome = p.process_json(raw, &printer).unwrap();

    assert_eq!(sink.attempts(), 2);
    assert!(outcome.report.is_success());
    assert_eq!(outcome.rendered.skipped().count(), 0);

    // The same QR alone: the text only adds rows on top
    let qr_only = p
        .render(&LabelRequest::new(
            Quantity::ONE,
            vec![LabelItem::new(LabelKind::Qr, "", "ABC123")],
        ))
        .unwrap();
    let with_text = outcome.rendered.image();
    let alone = qr_only.image();

    assert_eq!(with_text.width(), alone.width());
    assert!(with_text.height() > alone.height());
    let extra = with_text.height() - alone.height();
    assert!(has_dark_pixel(with_text, 0..extra));

    let tail = image::imageops::crop_imm(with_text, 0, extra, alone.width(), alone.height()).to_image();
    assert!(tail == *alone, "QR rows should follow the text unchanged");
}

#[test]
fn test_gs1_reference_string() {
    let expiry = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
    let code = Gs1CodeBuilder::new().build("7612345000011", "L5 2024 ", expiry);
    assert_eq!(code, "01076123450000111725030110L52024");
}

#[test]
fn test_chunked_three_tiles_round_trip() {
    let payload = noisy_payload(300);
    let encoded_len = chunked::pack(&payload).unwrap().len();
    let threshold = encoded_len.div_ceil(3);

    let encoder = ChunkedQrEncoder::new(threshold, QrEncoder::new(QrSettings::default()));
    let symbol = encoder.encode_symbol(&payload).unwrap();

    assert_eq!(symbol.chunks.len(), 3);
    assert_eq!(symbol.tiles.len(), 3);
    assert!(symbol.chunks.iter().all(|c| c.len() <= threshold));

    let back: String = chunked::reassemble(&symbol.chunks).unwrap();
    assert_eq!(back, payload);

    // Every tile is in the composite
    let stacked: u32 = symbol.tiles.iter().map(|t| t.height()).sum();
    assert_eq!(symbol.image.height(), stacked);
}

#[test]
fn test_chunked_default_threshold_three_tiles() {
    // Grow the payload until its encoding just passes two full tiles
    let mut len = 2048;
    let payload = loop {
        let candidate = hex_noise(len);
        if chunked::pack(&candidate).unwrap().len() > 2 * DEFAULT_SPLIT_THRESHOLD {
            break candidate;
        }
        len += 64;
    };
    let encoded_len = chunked::pack(&payload).unwrap().len();
    assert!(encoded_len <= 3 * DEFAULT_SPLIT_THRESHOLD);

    let symbol = ChunkedQrEncoder::default().encode_symbol(&payload).unwrap();
    assert_eq!(symbol.chunks.len(), 3);
    assert_eq!(symbol.chunks[0].len(), DEFAULT_SPLIT_THRESHOLD);
    assert_eq!(symbol.chunks[1].len(), DEFAULT_SPLIT_THRESHOLD);

    let back: String = chunked::reassemble(&symbol.chunks).unwrap();
    assert_eq!(back, payload);
    let stacked: u32 = symbol.tiles.iter().map(|t| t.height()).sum();
    assert_eq!(symbol.image.height(), stacked);
}

#[test]
fn test_chunked_item_through_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let payload = noisy_payload(300);
    let threshold = chunked::pack(&payload).unwrap().len().div_ceil(3);

    let config = PipelineConfig {
        work_dir: dir.path().to_path_buf(),
        split_threshold: threshold,
        ..Default::default()
    };
    let p = LabelPipeline::with_font(config.clone(), LabelFont::builtin());

    let ItemOutcome::Bitmap(img) = p.encode_item(&LabelItem::new(LabelKind::QrChunked, "", payload.as_str()))
    else {
        panic!("chunked QR should encode");
    };
    let expected = ChunkedQrEncoder::new(threshold, QrEncoder::new(config.qr))
        .encode(&payload)
        .unwrap();
    assert_eq!(img.dimensions(), expected.dimensions());
}

// ============================================================================
// PROPERTIES
// ============================================================================

#[test]
fn test_quantity_defaults_to_one() {
    let dir = tempfile::tempdir().unwrap();
    let p = pipeline(dir.path());

    for qty in ["0", "-1", "\"abc\"", "null"] {
        let sink = MemorySink::new();
        let printer = Printer::new(sink.clone()).with_pacing(Duration::ZERO);
        let raw = format!(
            r#"{{"qty": {}, "labelItems": [{{"labelType": "text", "labelKey": "", "labelValue": "x"}}]}}"#,
            qty
        );
        p.process_json(&raw, &printer).unwrap();
        assert_eq!(sink.attempts(), 1, "qty {}", qty);
    }

    let sink = MemorySink::new();
    let printer = Printer::new(sink.clone()).with_pacing(Duration::ZERO);
    p.process_json(
        r#"{"labelItems": [{"labelType": "text", "labelKey": "", "labelValue": "x"}]}"#,
        &printer,
    )
    .unwrap();
    assert_eq!(sink.attempts(), 1);
}

#[test]
fn test_width_never_exceeds_tape() {
    let dir = tempfile::tempdir().unwrap();
    let p = pipeline(dir.path());
    let max = p.config().compositor.tape_max_width;

    let long_line = "W".repeat(200);
    let long_code = "0123456789".repeat(8);
    let requests = [
        vec![LabelItem::text("", long_line.as_str())],
        vec![LabelItem::new(LabelKind::Barcode, "", long_code.as_str())],
        vec![
            LabelItem::text("Lot", "A"),
            LabelItem::new(LabelKind::Qr, "", "ABC123"),
            LabelItem::new(LabelKind::Barcode, "", long_code.as_str()),
        ],
    ];
    for items in requests {
        let rendered = p.render(&LabelRequest::new(Quantity::ONE, items)).unwrap();
        assert!(rendered.composition.width() <= max);
        assert!(rendered.composition.height() <= rendered.composition.estimated_height);
    }
}

#[test]
fn test_unknown_item_type_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let p = pipeline(dir.path());
    let sink = MemorySink::new();
    let printer = Printer::new(sink.clone()).with_pacing(Duration::ZERO);

    let raw = r#"{"qty": 1, "labelItems": [
        {"labelType": "hologram", "labelKey": "", "labelValue": "x"},
        {"labelType": "text", "labelKey": "", "labelValue": "Widget"}
    ]}"#;
    let outcome = p.process_json(raw, &printer).unwrap();
    assert_eq!(outcome.rendered.items.len(), 1);
    assert_eq!(sink.attempts(), 1);
}

#[test]
fn test_failed_copy_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let p = pipeline(dir.path());
    let sink = MemorySink::failing_on(&[1]);
    let printer = Printer::new(sink.clone()).with_pacing(Duration::ZERO);

    let outcome = p
        .process_json(
            r#"{"qty": 2, "labelItems": [{"labelType": "text", "labelKey": "", "labelValue": "x"}]}"#,
            &printer,
        )
        .unwrap();
    assert_eq!(sink.attempts(), 2);
    assert_eq!(sink.jobs().len(), 1);
    assert_eq!(outcome.report.failed(), 1);
}

#[test]
fn test_absent_device_fails_each_copy_after_rendering() {
    let dir = tempfile::tempdir().unwrap();
    let p = pipeline(dir.path());
    let missing = dir.path().join("dev").join("lp0");
    let printer = Printer::new(DeviceSink::new(DeviceAddress::Path(missing))).with_pacing(Duration::ZERO);

    let outcome = p
        .process_json(
            r#"{"qty": 3, "labelItems": [{"labelType": "text", "labelKey": "", "labelValue": "Widget"}]}"#,
            &printer,
        )
        .unwrap();

    assert!(outcome.label_path.exists());
    assert!(dir.path().join("output").join("label.png").exists());
    assert_eq!(outcome.report.attempts(), 3);
    assert_eq!(outcome.report.failed(), 3);
    assert!(outcome
        .report
        .outcomes
        .iter()
        .all(|o| matches!(o.result, Err(LabelError::Device { .. }))));
}
