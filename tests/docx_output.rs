mod common;

use std::io::{Cursor, Read};

use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use zip::ZipArchive;

use claim_report::{
    build_report, CaseRecord, ImageCache, OutputFormat, ReportConfig, ReportKind, ReportRequest,
};

fn request() -> ReportRequest {
    ReportRequest {
        kind: ReportKind::OdCase,
        format: OutputFormat::Docx,
        report_date: common::report_date(),
    }
}

fn render(record: &CaseRecord, cache: &ImageCache) -> Vec<u8> {
    build_report(
        record,
        &request(),
        cache,
        &ReportConfig::default(),
        &CancellationToken::new(),
    )
    .expect("render docx")
}

fn part(bytes: &[u8], name: &str) -> String {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut file = archive.by_name(name).unwrap();
    let mut text = String::new();
    file.read_to_string(&mut text).unwrap();
    text
}

#[test]
fn package_contains_every_part() {
    let bytes = render(&common::od_case(), &common::image_cache());
    let archive = ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();
    let mut names: Vec<_> = archive.file_names().collect();
    names.sort_unstable();
    assert_eq!(
        names,
        vec![
            "[Content_Types].xml",
            "_rels/.rels",
            "docProps/core.xml",
            "word/_rels/document.xml.rels",
            "word/document.xml",
            "word/footer1.xml",
            "word/media/image1.jpeg",
            "word/media/image2.jpeg",
            "word/media/image3.jpeg",
            "word/media/image4.jpeg",
            "word/styles.xml",
        ]
    );

    let footer = part(&bytes, "word/footer1.xml");
    assert!(footer.contains("PAGE"));
    assert!(footer.contains("NUMPAGES"));
    assert!(part(&bytes, "docProps/core.xml").contains("2026-10-19"));
}

#[test]
fn body_follows_the_case_record() {
    let bytes = render(&common::od_case(), &common::image_cache());
    let body = part(&bytes, "word/document.xml");

    let claim = body.find("Claim Summary").unwrap();
    let police = body.find("Police Record").unwrap();
    let photos = body.find("Photographs").unwrap();
    assert!(claim < police && police < photos);

    assert!(body.contains("FIR Number"));
    assert!(body.contains("412/2026"));
    assert!(body.contains("Documents: Police Record"));
    assert_eq!(body.matches("Saw the car slide into the barrier.").count(), 1);
    // Unreachable images are left out, cached ones are drawn once per cell.
    assert_eq!(body.matches("<w:drawing>").count(), 4);
}

#[test]
fn fir_details_are_omitted_without_an_fir() {
    let mut value = Value::Object(common::od_case().as_map().clone());
    value["policeRecord"] = json!({ "policeInformed": "Yes", "firStatus": "No" });
    let record = CaseRecord::from_value(value).unwrap();

    let body = part(&render(&record, &common::image_cache()), "word/document.xml");
    assert!(body.contains("FIR Lodged"));
    assert!(!body.contains("FIR Number"));
    assert!(!body.contains("Police Station"));
}

#[test]
fn missing_sections_print_fallbacks() {
    let record = CaseRecord::from_value(json!({ "caseId": "OD-1" })).unwrap();
    let body = part(&render(&record, &ImageCache::new()), "word/document.xml");

    assert!(body.contains("Claim Summary"));
    assert!(body.contains("Opinion"));
    assert!(body.contains("N/A"));
    assert!(!body.contains("Vehicle Details"));
    assert!(!body.contains("<w:drawing>"));
}

#[test]
fn rendering_is_idempotent() {
    let record = common::od_case();
    let cache = common::image_cache();
    assert_eq!(render(&record, &cache), render(&record, &cache));
}
