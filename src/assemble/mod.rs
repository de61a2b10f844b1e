//! Turns a case record into a [`ReportDocument`].
//!
//! Sections are visited in schema order. Whether a section appears is decided
//! once, by [`SectionDescriptor::should_render`], so every output format sees
//! the same set of sections. Images attached to ordinary sections are gathered
//! into per-section document galleries placed after the photographs.

mod narrative;
mod tables;

use chrono::NaiveDate;
use log::debug;
use tokio_util::sync::CancellationToken;

use crate::config::AgencyProfile;
use crate::error::ReportError;
use crate::images::ImageCache;
use crate::model::{Block, Gallery, Letterhead, ReportDocument, Section};
use crate::record::CaseRecord;
use crate::schema::{
    format_date, render_or_default, Fallback, ReportKind, SectionDescriptor, SectionLayout,
};

use tables::{layout_fields, Statements};

/// Inputs of one assembly pass.
pub struct ReportAssembler<'a> {
    record: &'a CaseRecord,
    kind: ReportKind,
    cache: &'a ImageCache,
    agency: &'a AgencyProfile,
    generated_on: NaiveDate,
}

impl<'a> ReportAssembler<'a> {
    pub fn new(
        record: &'a CaseRecord,
        kind: ReportKind,
        cache: &'a ImageCache,
        agency: &'a AgencyProfile,
        generated_on: NaiveDate,
    ) -> Self {
        Self {
            record,
            kind,
            cache,
            agency,
            generated_on,
        }
    }

    /// Date printed on the letter: the record's own letter date when present,
    /// otherwise the generation date.
    pub fn letter_date(&self) -> String {
        self.record
            .text("letterDate")
            .map(|date| format_date(&date))
            .unwrap_or_else(|| self.generated_on.format("%d-%m-%Y").to_string())
    }

    /// Builds the document, checking `cancel` before every section.
    pub fn assemble(&self, cancel: &CancellationToken) -> Result<ReportDocument, ReportError> {
        let schema = self.kind.schema();
        let letter_date = self.letter_date();
        let mut sections = Vec::new();
        let mut document_galleries = Vec::new();

        for descriptor in schema.sections {
            if cancel.is_cancelled() {
                return Err(ReportError::Cancelled);
            }
            if !descriptor.should_render(self.record) {
                debug!("Skipping section '{}': no data", descriptor.key);
                continue;
            }

            let mut builder = Section::builder(descriptor.key, descriptor.title)
                .start_on_new_page(descriptor.page_break_before);
            let entries = descriptor.entries(self.record);
            let first = entries.first().copied();

            let (blocks, images) = match descriptor.layout {
                SectionLayout::Table => self.table_blocks(descriptor, &entries),
                SectionLayout::Narrative => {
                    narrative::narrative_blocks(descriptor, &entries, self.cache)
                }
                SectionLayout::Findings => {
                    (narrative::findings_blocks(descriptor, first), Vec::new())
                }
                SectionLayout::Opinion => (
                    narrative::opinion_blocks(descriptor, first, self.agency, &letter_date),
                    Vec::new(),
                ),
                SectionLayout::Photos => {
                    let blocks = narrative::photo_blocks(descriptor, first, self.cache);
                    if blocks.is_empty() {
                        debug!("Skipping section '{}': no image resolved", descriptor.key);
                        continue;
                    }
                    builder = builder.start_on_new_page(true);
                    (blocks, Vec::new())
                }
            };

            for block in blocks {
                builder.push(block);
            }
            debug!("Assembled section '{}'", descriptor.key);
            sections.push(builder.build());

            if !images.is_empty() {
                document_galleries.push((descriptor, images));
            }
        }

        for (descriptor, images) in document_galleries {
            let title = format!("Documents: {}", descriptor.title);
            let mut builder = Section::builder(format!("{}Documents", descriptor.key), title.clone())
                .start_on_new_page(true);
            builder.push(Block::Gallery(Gallery::from_cells(title, images)));
            sections.push(builder.build());
        }

        Ok(ReportDocument::new(self.letterhead(&letter_date), sections))
    }

    fn table_blocks(
        &self,
        descriptor: &SectionDescriptor,
        entries: &[&serde_json::Value],
    ) -> (Vec<Block>, Vec<crate::model::GalleryCell>) {
        let empty = serde_json::Value::Object(Default::default());
        let entries: Vec<&serde_json::Value> = if entries.is_empty() {
            // Always-shown sections without a backing object print N/A rows.
            vec![&empty]
        } else {
            entries.to_vec()
        };

        let mut blocks = Vec::new();
        let mut images = Vec::new();
        for entry in entries {
            let (entry_blocks, entry_images) =
                layout_fields(descriptor.fields, entry, self.cache, Statements::Inline)
                    .into_blocks(None);
            blocks.extend(entry_blocks);
            images.extend(entry_images);
        }
        (blocks, images)
    }

    fn summary_text(&self, field: &str) -> Option<String> {
        ["claimSummary", "caseSummary"]
            .iter()
            .find_map(|section| self.record.section_text(section, field))
    }

    fn letterhead(&self, letter_date: &str) -> Letterhead {
        let claim_no = self.summary_text("claimNo");
        let insured = self.summary_text("insuredName");
        let reference = self.record.text("referenceNo").or_else(|| claim_no.clone());

        let mut addressee = vec!["To,".to_owned(), "The Claims Manager".to_owned()];
        addressee.extend(self.record.text("insurerName"));
        addressee.extend(
            self.record
                .text("insurerAddress")
                .into_iter()
                .flat_map(|address| {
                    address
                        .split(['\n', ','])
                        .map(str::trim)
                        .filter(|line| !line.is_empty())
                        .map(str::to_owned)
                        .collect::<Vec<_>>()
                }),
        );

        let mut subject = format!(
            "Investigation report in respect of Claim No. {}, Insured: {}",
            render_or_default(claim_no.as_deref(), Fallback::NotApplicable),
            render_or_default(insured.as_deref(), Fallback::NotApplicable),
        );
        if self.kind == ReportKind::OdCase {
            let vehicle = self.summary_text("vehicleNo");
            subject.push_str(&format!(
                ", Vehicle No. {}",
                render_or_default(vehicle.as_deref(), Fallback::NotApplicable)
            ));
        }

        Letterhead {
            agency_name: self.agency.name.clone(),
            agency_address: self.agency.address.clone(),
            agency_contact: self.agency.contact.clone(),
            title: self.kind.title().to_owned(),
            reference: render_or_default(reference.as_deref(), Fallback::NotApplicable)
                .into_owned(),
            date: letter_date.to_owned(),
            addressee,
            subject,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::images::EmbeddedImage;
    use crate::model::{GalleryCell, TableRow};
    use serde_json::json;

    fn assemble(value: serde_json::Value, cache: &ImageCache) -> ReportDocument {
        let record = CaseRecord::from_value(value).unwrap();
        let agency = AgencyProfile::default();
        ReportAssembler::new(
            &record,
            ReportKind::OdCase,
            cache,
            &agency,
            NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(),
        )
        .assemble(&CancellationToken::new())
        .unwrap()
    }

    fn cache_with(urls: &[&str]) -> ImageCache {
        let mut cache = ImageCache::new();
        for url in urls {
            cache.insert(*url, EmbeddedImage::new(4, 3, vec![0xff, 0xd8]));
        }
        cache
    }

    #[test]
    fn claim_summary_scenario() {
        let document = assemble(
            json!({
                "odDetails": {
                    "claimSummary": { "vehicleNo": "RJ14AB1234", "insuredName": "A. Sharma" }
                },
                "meetingDetails": {},
                "garageVisit": null
            }),
            &ImageCache::new(),
        );

        let summary = document.section("claimSummary").expect("claim summary");
        assert_eq!(summary.title(), "Claim Summary");
        let table = summary.tables().next().unwrap();
        assert_eq!(table.value_of("Vehicle Registration No."), Some("RJ14AB1234"));
        assert_eq!(table.value_of("Name of Insured"), Some("A. Sharma"));
        assert_eq!(table.value_of("Claim Number"), Some("N/A"));
        assert_eq!(table.value_of("Cause of Loss"), Some("N/A"));

        assert!(document.section("meetingDetails").is_none());
        assert!(document.section("garageVisit").is_none());
        assert!(document
            .sections()
            .iter()
            .all(|section| section.title() != "Details of meeting with Insured"));
    }

    #[test]
    fn sections_follow_schema_order() {
        let document = assemble(
            json!({
                "policeRecord": { "policeInformed": "No" },
                "vehicleDetails": { "make": "Maruti" },
                "claimSummary": { "claimNo": "CLM-9" }
            }),
            &ImageCache::new(),
        );
        let order: Vec<_> = document.sections().iter().map(Section::identifier).collect();
        assert_eq!(order, vec!["claimSummary", "vehicleDetails", "policeRecord", "opinion"]);
    }

    #[test]
    fn fir_fields_depend_on_fir_status() {
        let with_fir = assemble(
            json!({ "policeRecord": {
                "firStatus": "yes", "policeStation": "Civil Lines", "firNo": "112/24",
                "firDateTime": "2024-03-05 10:00", "district": "Jaipur", "state": "Rajasthan"
            }}),
            &ImageCache::new(),
        );
        let table = with_fir.section("policeRecord").unwrap().tables().next().unwrap();
        for label in ["Police Station", "FIR Number", "FIR Date / Time", "District", "State"] {
            assert!(table.value_of(label).is_some(), "missing {label}");
        }

        let without_fir = assemble(
            json!({ "policeRecord": { "firStatus": "no", "policeInformed": "Yes", "firNo": "ignored" } }),
            &ImageCache::new(),
        );
        let table = without_fir
            .section("policeRecord")
            .expect("section still renders")
            .tables()
            .next()
            .unwrap();
        assert_eq!(table.value_of("Police Informed"), Some("Yes"));
        assert!(table.value_of("FIR Number").is_none());
        assert!(table.value_of("District").is_none());
    }

    #[test]
    fn only_witnesses_with_statements_get_statement_blocks() {
        let document = assemble(
            json!({ "witnesses": [
                { "name": "R. Meena", "witnessStatement": "I saw the truck hit the car." },
                { "name": "S. Khan", "witnessStatement": "  " }
            ]}),
            &ImageCache::new(),
        );
        let witnesses = document.section("witnesses").unwrap();
        let statements: Vec<_> = witnesses
            .blocks()
            .iter()
            .filter_map(|block| match block {
                Block::Statement(statement) => Some(statement),
                _ => None,
            })
            .collect();
        assert_eq!(statements.len(), 1);
        assert_eq!(statements[0].heading, "Statement of R. Meena");
        assert_eq!(statements[0].text, "I saw the truck hit the car.");
        assert_eq!(witnesses.tables().count(), 2);
    }

    #[test]
    fn meeting_statements_fall_back() {
        let document = assemble(
            json!({ "meetingDetails": { "personMet": "Insured" } }),
            &ImageCache::new(),
        );
        let meeting = document.section("meetingDetails").unwrap();
        assert!(meeting.blocks().iter().any(|block| matches!(
            block,
            Block::Statement(statement) if statement.text == "Statement enclosed."
        )));
    }

    #[test]
    fn split_and_statement_rows() {
        let document = assemble(
            json!({
                "insuredDetails": { "eligibleTransport": "No", "eligibleNonTransport": "Yes" },
                "observations": { "remarks": "x" },
                "garageVisit": { "garageName": "Shree Motors", "towingVendors": [] }
            }),
            &ImageCache::new(),
        );
        let insured = document.section("insuredDetails").unwrap();
        let split = insured
            .tables()
            .flat_map(|table| table.rows())
            .find(|row| row.label() == "Eligible to Drive")
            .unwrap();
        match split {
            TableRow::Split { left, right, .. } => {
                assert_eq!((left.label.as_str(), left.value.as_str()), ("Transport", "No"));
                assert_eq!(
                    (right.label.as_str(), right.value.as_str()),
                    ("Non-Transport", "Yes")
                );
            }
            other => panic!("expected split row, got {other:?}"),
        }

        let garage = document.section("garageVisit").unwrap();
        assert!(garage.blocks().iter().any(|block| matches!(
            block,
            Block::Paragraph(paragraph) if paragraph.text() == "Detail not available"
        )));
    }

    #[test]
    fn photographs_without_resolved_images_are_dropped() {
        let document = assemble(
            json!({ "photos": { "vehicleImages": ["https://cdn.example/missing.jpg"] } }),
            &ImageCache::new(),
        );
        assert!(document.section("photos").is_none());
        assert!(document.section("opinion").is_some());
    }

    #[test]
    fn odd_photo_gallery_gets_filler() {
        let urls = [
            "https://cdn.example/1.jpg",
            "https://cdn.example/2.jpg",
            "https://cdn.example/3.jpg",
        ];
        let document = assemble(
            json!({ "photos": { "vehicleImages": urls, "spotImages": ["https://cdn.example/missing.jpg"] } }),
            &cache_with(&urls),
        );
        let photos = document.section("photos").unwrap();
        assert!(photos.starts_on_new_page());
        let galleries: Vec<&Gallery> = photos
            .blocks()
            .iter()
            .filter_map(|block| match block {
                Block::Gallery(gallery) => Some(gallery),
                _ => None,
            })
            .collect();
        assert_eq!(galleries.len(), 1);
        assert_eq!(galleries[0].rows().len(), 2);
        assert_eq!(galleries[0].rows()[1][1], GalleryCell::Filler);
    }

    #[test]
    fn section_images_become_document_galleries() {
        let document = assemble(
            json!({ "witnesses": [ {
                "name": "R. Meena",
                "idProof": { "front": "https://cdn.example/id-f.jpg", "back": "https://cdn.example/id-b.jpg" }
            } ] }),
            &cache_with(&["https://cdn.example/id-f.jpg", "https://cdn.example/id-b.jpg"]),
        );
        let documents = document.section("witnessesDocuments").unwrap();
        assert_eq!(documents.title(), "Documents: Witness Details");
        assert!(documents.starts_on_new_page());
        assert_eq!(
            document.image_urls().collect::<Vec<_>>(),
            vec!["https://cdn.example/id-f.jpg", "https://cdn.example/id-b.jpg"]
        );
    }

    #[test]
    fn letterhead_defaults_date_and_builds_subject() {
        let document = assemble(
            json!({
                "insurerName": "National Insurance Co.",
                "claimSummary": { "claimNo": "CLM-1", "insuredName": "A. Sharma" }
            }),
            &ImageCache::new(),
        );
        let letterhead = document.letterhead();
        assert_eq!(letterhead.date, "19-10-2026");
        assert_eq!(letterhead.reference, "CLM-1");
        assert_eq!(
            letterhead.subject,
            "Investigation report in respect of Claim No. CLM-1, Insured: A. Sharma, Vehicle No. N/A"
        );
        assert!(letterhead.addressee.contains(&"National Insurance Co.".to_owned()));
    }

    #[test]
    fn cancelled_token_aborts_assembly() {
        let record = CaseRecord::from_value(json!({})).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = ReportAssembler::new(
            &record,
            ReportKind::OdCase,
            &ImageCache::new(),
            &AgencyProfile::default(),
            NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(),
        )
        .assemble(&cancel);
        assert!(matches!(result, Err(ReportError::Cancelled)));
    }
}
