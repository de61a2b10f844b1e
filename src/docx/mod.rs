//! DOCX back end.
//!
//! The package is assembled by hand: `quick-xml` writes the parts and `zip`
//! stores them with fixed timestamps, so a report always packs to the same
//! bytes.

mod body;
pub mod parts;

use std::io::{Cursor, Write};

use chrono::NaiveDate;
use log::{info, warn};
use tokio_util::sync::CancellationToken;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use crate::error::ReportError;
use crate::images::ImageCache;
use crate::model::ReportDocument;

pub use body::MediaRegistry;
use body::BodyWriter;

/// Renders `document` into the bytes of a `.docx` package.
pub fn render_docx(
    document: &ReportDocument,
    cache: &ImageCache,
    report_date: NaiveDate,
    cancel: &CancellationToken,
) -> Result<Vec<u8>, ReportError> {
    let (body, media) = BodyWriter::new(cache).write_document(document)?;
    if cancel.is_cancelled() {
        return Err(ReportError::Cancelled);
    }

    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default());
    let mut package = ZipWriter::new(Cursor::new(Vec::new()));

    let letterhead = document.letterhead();
    let parts = [
        ("[Content_Types].xml", parts::content_types()?),
        ("_rels/.rels", parts::package_relationships()?),
        (
            "docProps/core.xml",
            parts::core_properties(&letterhead.title, report_date, &letterhead.agency_name)?,
        ),
        ("word/document.xml", body),
        ("word/_rels/document.xml.rels", parts::document_relationships(media.len())?),
        ("word/styles.xml", parts::STYLES.as_bytes().to_vec()),
        ("word/footer1.xml", parts::footer()?),
    ];
    for (name, bytes) in parts {
        package.start_file(name, options)?;
        package.write_all(&bytes)?;
    }

    for (number, url) in media.entries() {
        let Some(image) = cache.get(url) else {
            warn!("Image {url} missing from the cache while packaging");
            continue;
        };
        package.start_file(format!("word/media/{}", parts::media_name(number)), options)?;
        package.write_all(image.bytes())?;
    }

    let bytes = package.finish()?.into_inner();
    info!(
        "Packaged DOCX with {} embedded images ({} bytes)",
        media.len(),
        bytes.len()
    );
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::images::EmbeddedImage;
    use crate::model::{Block, Gallery, GalleryCell, Letterhead, Section, Table, TableRow};
    use std::io::Read;

    fn sample() -> (ReportDocument, ImageCache) {
        let mut cache = ImageCache::new();
        cache.insert("https://cdn.example/1.jpg", EmbeddedImage::new(800, 600, vec![0xff, 0xd8, 1]));
        cache.insert("https://cdn.example/2.jpg", EmbeddedImage::new(600, 800, vec![0xff, 0xd8, 2]));

        let mut summary = Section::builder("claimSummary", "Claim Summary");
        summary.push(Block::Table(Table::new(vec![TableRow::pair("Claim Number", "CLM-1")])));
        let mut photos = Section::builder("photos", "Photographs").start_on_new_page(true);
        photos.push(Block::Gallery(Gallery::from_cells(
            "Vehicle Photographs",
            vec![
                GalleryCell::Image { url: "https://cdn.example/1.jpg".into(), caption: "Front".into() },
                GalleryCell::Image { url: "https://cdn.example/2.jpg".into(), caption: "Rear".into() },
                GalleryCell::Image { url: "https://cdn.example/1.jpg".into(), caption: "Front again".into() },
            ],
        )));
        let letterhead = Letterhead {
            title: "Motor OD Claim Investigation Report".into(),
            ..Letterhead::default()
        };
        (ReportDocument::new(letterhead, vec![summary.build(), photos.build()]), cache)
    }

    fn read_part(bytes: &[u8], name: &str) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut part = archive.by_name(name).unwrap();
        let mut text = String::new();
        part.read_to_string(&mut text).unwrap();
        text
    }

    #[test]
    fn each_distinct_image_is_stored_once() {
        let (document, cache) = sample();
        let date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let bytes = render_docx(&document, &cache, date, &CancellationToken::new()).unwrap();

        let archive = zip::ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();
        let mut media: Vec<_> = archive
            .file_names()
            .filter(|name| name.starts_with("word/media/"))
            .collect();
        media.sort_unstable();
        assert_eq!(media, vec!["word/media/image1.jpeg", "word/media/image2.jpeg"]);

        let body = read_part(&bytes, "word/document.xml");
        assert_eq!(body.matches("<w:drawing>").count(), 3);
        assert!(body.contains(r#"<w:br w:type="page"/>"#));
        assert!(body.contains(r#"<w:footerReference w:type="default" r:id="rId2"/>"#));
    }

    #[test]
    fn packaging_is_deterministic() {
        let (document, cache) = sample();
        let date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let first = render_docx(&document, &cache, date, &CancellationToken::new()).unwrap();
        let second = render_docx(&document, &cache, date, &CancellationToken::new()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn cancelled_before_packaging() {
        let (document, cache) = sample();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = render_docx(
            &document,
            &cache,
            NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(),
            &cancel,
        );
        assert!(matches!(result, Err(ReportError::Cancelled)));
    }
}
