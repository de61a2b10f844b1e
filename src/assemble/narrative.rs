use serde_json::Value;

use crate::config::AgencyProfile;
use crate::images::ImageCache;
use crate::model::{
    Block, Gallery, GalleryCell, HorizontalAlignment, RichParagraph, SignatureBlock, Statement,
};
use crate::record::scalar_text;
use crate::richtext::Span;
use crate::schema::{render_or_default, Fallback, FieldKind, SectionDescriptor};

use super::tables::{image_cells, layout_fields, Statements};

/// Facts table plus statement blocks.
///
/// Plain sections always print their statements, falling back to
/// "Statement enclosed."; repeated sections (witnesses) print one table per
/// entry and a statement block only for entries whose statement has text.
pub(super) fn narrative_blocks(
    section: &SectionDescriptor,
    entries: &[&Value],
    cache: &ImageCache,
) -> (Vec<Block>, Vec<GalleryCell>) {
    let mut blocks = Vec::new();
    let mut images = Vec::new();
    let mut statements = Vec::new();

    let entries: Vec<&Value> = entries
        .iter()
        .copied()
        .filter(|entry| section.fields.iter().any(|field| field.has_value(entry)))
        .collect();

    for (index, entry) in entries.iter().enumerate() {
        let caption = section
            .repeated
            .then(|| format!("{} {}", entry_noun(section), index + 1));
        let (table_blocks, entry_images) =
            layout_fields(section.fields, entry, cache, Statements::Skip).into_blocks(caption);
        blocks.extend(table_blocks);
        images.extend(entry_images);

        for field in section
            .fields
            .iter()
            .filter(|field| field.kind == FieldKind::Statement && field.applies_to(entry))
        {
            let text = field.display_value(entry);
            if section.repeated {
                if let Some(text) = text {
                    statements.push(Statement {
                        heading: format!("Statement of {}", person_name(entry, index)),
                        text,
                    });
                }
            } else {
                statements.push(Statement {
                    heading: field.label.to_owned(),
                    text: render_or_default(text.as_deref(), Fallback::StatementEnclosed)
                        .into_owned(),
                });
            }
        }
    }

    blocks.extend(statements.into_iter().map(Block::Statement));
    (blocks, images)
}

/// "Witness Details" -> "Witness".
fn entry_noun(section: &SectionDescriptor) -> &str {
    section
        .title
        .strip_suffix(" Details")
        .unwrap_or(section.title)
}

fn person_name(entry: &Value, index: usize) -> String {
    entry
        .get("name")
        .and_then(scalar_text)
        .unwrap_or_else(|| format!("Witness {}", index + 1))
}

/// Numbered findings followed by free-form remarks.
pub(super) fn findings_blocks(section: &SectionDescriptor, entry: Option<&Value>) -> Vec<Block> {
    let empty = Value::Object(Default::default());
    let entry = entry.unwrap_or(&empty);
    let mut blocks = Vec::new();

    for field in section.fields {
        match field.kind {
            FieldKind::List => {
                let (mut list_blocks, _) = layout_fields(
                    std::slice::from_ref(field),
                    entry,
                    &ImageCache::new(),
                    Statements::Skip,
                )
                .into_blocks(None);
                blocks.append(&mut list_blocks);
            }
            FieldKind::Statement => {
                if let Some(text) = field.display_value(entry) {
                    blocks.push(Block::paragraph(vec![
                        Span::new(format!("{}: ", field.label)).bold(),
                        Span::new(text),
                    ]));
                }
            }
            _ => {}
        }
    }

    blocks
}

/// Opinion paragraph, enclosures checklist and signature block.
pub(super) fn opinion_blocks(
    section: &SectionDescriptor,
    entry: Option<&Value>,
    agency: &AgencyProfile,
    letter_date: &str,
) -> Vec<Block> {
    let empty = Value::Object(Default::default());
    let entry = entry.unwrap_or(&empty);
    let mut blocks = Vec::new();
    let text = |key: &str| entry.get(key).and_then(scalar_text);

    for field in section.fields {
        match field.kind {
            FieldKind::Statement => {
                let opinion = field.display_value(entry);
                blocks.push(Block::Paragraph(
                    RichParagraph::plain(render_or_default(
                        opinion.as_deref(),
                        Fallback::NotAvailable,
                    ))
                    .with_alignment(HorizontalAlignment::Justified),
                ));
            }
            FieldKind::Checklist(_) => {
                let (mut checklist, _) = layout_fields(
                    std::slice::from_ref(field),
                    entry,
                    &ImageCache::new(),
                    Statements::Skip,
                )
                .into_blocks(None);
                blocks.append(&mut checklist);
            }
            _ => {}
        }
    }

    blocks.push(Block::Signature(SignatureBlock {
        agency: agency.name.clone(),
        investigator: render_or_default(text("investigatorName").as_deref(), Fallback::NotApplicable)
            .into_owned(),
        designation: render_or_default(text("designation").as_deref(), Fallback::NotApplicable)
            .into_owned(),
        place: render_or_default(text("place").as_deref(), Fallback::NotApplicable).into_owned(),
        date: letter_date.to_owned(),
    }));
    blocks
}

/// One gallery per photo category holding at least one resolved image,
/// each category after the first on a new page. Empty when nothing resolved.
pub(super) fn photo_blocks(
    section: &SectionDescriptor,
    entry: Option<&Value>,
    cache: &ImageCache,
) -> Vec<Block> {
    let mut blocks = Vec::new();
    let Some(entry) = entry else {
        return blocks;
    };

    for field in section.fields.iter().filter(|field| field.is_image()) {
        let Some(value) = entry.get(field.key) else {
            continue;
        };
        let cells = image_cells(value, field.label, cache);
        if cells.is_empty() {
            continue;
        }
        if !blocks.is_empty() {
            blocks.push(Block::PageBreak);
        }
        blocks.push(Block::Gallery(Gallery::from_cells(field.label, cells)));
    }
    blocks
}
