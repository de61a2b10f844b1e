use std::collections::HashSet;

use serde_json::Value;

use crate::record::{CaseRecord, ImageRef};
use crate::schema::{FieldDescriptor, FieldKind, SectionSchema};

/// Collects every distinct image URL the schema can place in the report, in
/// first-seen order.
pub fn discover_image_urls(record: &CaseRecord, schema: &SectionSchema) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut urls = Vec::new();

    for section in schema.sections {
        for entry in section.entries(record) {
            collect(entry, section.fields, &mut seen, &mut urls);
        }
    }

    urls
}

fn collect(
    parent: &Value,
    fields: &[FieldDescriptor],
    seen: &mut HashSet<String>,
    urls: &mut Vec<String>,
) {
    for field in fields {
        let Some(value) = parent.get(field.key) else {
            continue;
        };
        match field.kind {
            FieldKind::Image | FieldKind::ImagePair | FieldKind::Gallery => {
                for reference in ImageRef::parse_all(value) {
                    for url in reference.urls() {
                        if seen.insert(url.to_owned()) {
                            urls.push(url.to_owned());
                        }
                    }
                }
            }
            FieldKind::Group(nested) => collect(value, nested, seen, urls),
            FieldKind::Records(nested) => {
                for item in value.as_array().into_iter().flatten() {
                    collect(item, nested, seen, urls);
                }
            }
            FieldKind::Text
            | FieldKind::Date
            | FieldKind::Split { .. }
            | FieldKind::Statement
            | FieldKind::List
            | FieldKind::Checklist(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ReportKind;
    use serde_json::json;

    #[test]
    fn finds_urls_across_sections_once() {
        let record = CaseRecord::from_value(json!({
            "insuredDetails": {
                "driverPhoto": "https://cdn.example/driver.jpg",
                "licenseImage": { "front": "https://cdn.example/dl-f.jpg", "back": "https://cdn.example/dl-b.jpg" }
            },
            "witnesses": [
                { "name": "A", "witnessPhoto": { "url": "https://cdn.example/w1.jpg" } }
            ],
            "photos": {
                "documentImages": [
                    "https://cdn.example/driver.jpg",
                    { "url": "https://cdn.example/doc.jpg", "title": "Bill" }
                ]
            },
            "unknownSection": { "photo": "https://cdn.example/ignored.jpg" }
        }))
        .unwrap();

        let urls = discover_image_urls(&record, ReportKind::OdCase.schema());
        assert_eq!(
            urls,
            vec![
                "https://cdn.example/driver.jpg",
                "https://cdn.example/dl-f.jpg",
                "https://cdn.example/dl-b.jpg",
                "https://cdn.example/w1.jpg",
                "https://cdn.example/doc.jpg",
            ]
        );
    }

    #[test]
    fn text_only_record_has_no_urls() {
        let record = CaseRecord::from_value(json!({
            "claimSummary": { "claimNo": "CLM-1", "vehicleNo": "https://not-an-image-field" }
        }))
        .unwrap();
        assert!(discover_image_urls(&record, ReportKind::OdCase.schema()).is_empty());
    }
}
