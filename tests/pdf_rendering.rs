mod common;

use std::collections::HashMap;

use claim_report::pdf::{fonts, normalize};
use claim_report::{build_report, OutputFormat, ReportConfig, ReportKind, ReportRequest};
use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object};
use sha2::{Digest, Sha256};
use tokio_util::sync::CancellationToken;

fn request() -> ReportRequest {
    ReportRequest {
        kind: ReportKind::OdCase,
        format: OutputFormat::Pdf,
        report_date: common::report_date(),
    }
}

fn render_sample_pdf() -> Vec<u8> {
    assert!(
        fonts::default_fonts_available(None),
        "report fonts missing: assets/fonts should hold DejaVu Sans"
    );

    build_report(
        &common::od_case(),
        &request(),
        &common::image_cache(),
        &ReportConfig::default(),
        &CancellationToken::new(),
    )
    .expect("render sample pdf")
}

fn resolve<'a>(document: &'a Document, object: &'a Object) -> &'a Object {
    match object {
        Object::Reference(id) => document.get_object(*id).unwrap(),
        other => other,
    }
}

/// Glyph id to character map from a font's `ToUnicode` CMap.
fn to_unicode(document: &Document, font: &Dictionary) -> HashMap<u16, char> {
    let mut map = HashMap::new();
    let Ok(reference) = font.get(b"ToUnicode") else {
        return map;
    };
    let Object::Stream(stream) = resolve(document, reference) else {
        return map;
    };
    let content = stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone());

    let mut ranges = false;
    let mut chars = false;
    for line in String::from_utf8_lossy(&content).lines() {
        let line = line.trim();
        if line.ends_with("beginbfchar") {
            chars = true;
            continue;
        }
        if line.ends_with("beginbfrange") {
            ranges = true;
            continue;
        }
        if line.starts_with("end") {
            chars = false;
            ranges = false;
            continue;
        }
        let values: Vec<u32> = line
            .split(['<', '>'])
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .filter_map(|part| u32::from_str_radix(part, 16).ok())
            .collect();
        if chars {
            for pair in values.chunks_exact(2) {
                if let Some(c) = char::from_u32(pair[1]) {
                    map.insert(pair[0] as u16, c);
                }
            }
        } else if ranges {
            if let [first, last, code] = values[..] {
                for gid in first..=last {
                    if let Some(c) = char::from_u32(code + gid - first) {
                        map.insert(gid as u16, c);
                    }
                }
            }
        }
    }
    map
}

/// Text of every page, whitespace collapsed.
fn page_texts(bytes: &[u8]) -> Vec<String> {
    let document = Document::load_mem(bytes).unwrap();
    document
        .get_pages()
        .into_values()
        .map(|page_id| {
            let page = document.get_dictionary(page_id).unwrap();
            let resources = resolve(&document, page.get(b"Resources").unwrap())
                .as_dict()
                .unwrap();
            let fonts = resolve(&document, resources.get(b"Font").unwrap())
                .as_dict()
                .unwrap();
            let maps: HashMap<Vec<u8>, HashMap<u16, char>> = fonts
                .iter()
                .map(|(name, font)| {
                    let font = resolve(&document, font).as_dict().unwrap();
                    (name.clone(), to_unicode(&document, font))
                })
                .collect();

            let content = Content::decode(&document.get_page_content(page_id).unwrap()).unwrap();
            let mut current: Option<Vec<u8>> = None;
            let mut text = String::new();
            for operation in &content.operations {
                match operation.operator.as_str() {
                    "Tf" => {
                        current = operation
                            .operands
                            .first()
                            .and_then(|name| name.as_name().ok())
                            .map(<[u8]>::to_vec);
                    }
                    "Tj" | "TJ" => {
                        let map = current.as_ref().and_then(|name| maps.get(name));
                        let mut strings = Vec::new();
                        for operand in &operation.operands {
                            match operand {
                                Object::String(bytes, _) => strings.push(bytes),
                                Object::Array(items) => {
                                    strings.extend(items.iter().filter_map(|item| match item {
                                        Object::String(bytes, _) => Some(bytes),
                                        _ => None,
                                    }));
                                }
                                _ => {}
                            }
                        }
                        for bytes in strings {
                            for glyph in bytes.chunks_exact(2) {
                                let gid = u16::from_be_bytes([glyph[0], glyph[1]]);
                                if let Some(c) = map.and_then(|map| map.get(&gid)) {
                                    text.push(*c);
                                }
                            }
                        }
                        text.push(' ');
                    }
                    _ => {}
                }
            }
            text.split_whitespace().collect::<Vec<_>>().join(" ")
        })
        .collect()
}

#[test]
fn renders_a_multi_page_report() {
    let bytes = render_sample_pdf();
    assert!(bytes.starts_with(b"%PDF-"));

    // Observations, opinion and photographs each start on a new page.
    let pages = normalize::page_count(&bytes).unwrap();
    assert!(pages >= 4, "expected at least 4 pages, got {pages}");
}

#[test]
fn every_page_carries_a_page_x_of_y_footer() {
    let bytes = render_sample_pdf();
    let texts = page_texts(&bytes);
    let total = texts.len();
    assert_eq!(total, normalize::page_count(&bytes).unwrap());

    for (index, text) in texts.iter().enumerate() {
        let footer = format!("Page {} of {}", index + 1, total);
        assert!(text.contains(&footer), "page {} lacks {footer:?}: {text}", index + 1);
    }
    assert!(texts[0].contains("Page 1 of"));
    assert!(texts[total - 1].contains(&format!("Page {total} of {total}")));
}

#[test]
fn split_rows_print_both_values() {
    let texts = page_texts(&render_sample_pdf());
    let words: String = texts
        .join(" ")
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == ' ')
        .collect();
    assert!(words.contains("Eligible to Drive"));
    assert!(words.contains("Transport No"), "{words}");
    assert!(words.contains("NonTransport Yes"), "{words}");
}

#[test]
fn rendering_is_byte_identical() {
    let bytes_a = render_sample_pdf();
    let bytes_b = render_sample_pdf();

    assert_eq!(bytes_a.len(), bytes_b.len(), "PDF sizes should match");
    let hash_a: [u8; 32] = Sha256::digest(&bytes_a).into();
    let hash_b: [u8; 32] = Sha256::digest(&bytes_b).into();
    assert_eq!(hash_a, hash_b, "PDF renders must be deterministic");
}

#[test]
fn metadata_is_derived_from_the_report() {
    let bytes = render_sample_pdf();
    let document = Document::load_mem(&bytes).unwrap();

    let info_id = document.trailer.get(b"Info").unwrap().as_reference().unwrap();
    let info = document.get_dictionary(info_id).unwrap();
    let creation = info.get(b"CreationDate").unwrap().as_str().unwrap();
    assert_eq!(creation, b"D:20261019000000Z");
    let producer = info.get(b"Producer").unwrap().as_str().unwrap();
    assert_eq!(producer, normalize::PRODUCER.as_bytes());

    let catalog_id = document.trailer.get(b"Root").unwrap().as_reference().unwrap();
    let catalog = document.get_dictionary(catalog_id).unwrap();
    assert!(catalog.get(b"Metadata").is_err());
}
