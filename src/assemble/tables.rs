use serde_json::Value;

use crate::images::ImageCache;
use crate::model::{Block, ChecklistItem, GalleryCell, SubValue, Table, TableRow};
use crate::record::ImageRef;
use crate::richtext::Span;
use crate::schema::{
    list_items, render_or_default, Fallback, FieldDescriptor, FieldKind, SubField,
};

/// Output of laying a field list out as a table.
#[derive(Default)]
pub(super) struct TableLayout {
    pub rows: Vec<TableRow>,
    /// Sub-tables, lists and checklists following the main table.
    pub trailing: Vec<Block>,
    /// Resolved images attached to the fields.
    pub images: Vec<GalleryCell>,
}

impl TableLayout {
    /// Main table (if any rows) followed by the trailing blocks.
    pub fn into_blocks(self, caption: Option<String>) -> (Vec<Block>, Vec<GalleryCell>) {
        let mut blocks = Vec::with_capacity(self.trailing.len() + 1);
        if !self.rows.is_empty() {
            let table = Table::new(self.rows);
            blocks.push(Block::Table(match caption {
                Some(caption) => table.with_caption(caption),
                None => table,
            }));
        }
        blocks.extend(self.trailing);
        (blocks, self.images)
    }
}

/// Which statement rows a layout keeps.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum Statements {
    /// Full-width rows with the "Statement enclosed." fallback.
    Inline,
    /// Left out of the table; the caller renders them as narrative blocks.
    Skip,
}

pub(super) fn layout_fields(
    fields: &[FieldDescriptor],
    entry: &Value,
    cache: &ImageCache,
    statements: Statements,
) -> TableLayout {
    let mut layout = TableLayout::default();

    for field in fields.iter().filter(|field| field.applies_to(entry)) {
        match field.kind {
            FieldKind::Text | FieldKind::Date => {
                let value = field.display_value(entry);
                layout.rows.push(TableRow::pair(
                    field.label,
                    render_or_default(value.as_deref(), Fallback::NotApplicable),
                ));
            }
            FieldKind::Split { left, right } => {
                let sub_value = |sub: SubField| SubValue {
                    label: sub.label.to_owned(),
                    value: render_or_default(
                        field.split_value(entry, sub).as_deref(),
                        Fallback::NotApplicable,
                    )
                    .into_owned(),
                };
                layout.rows.push(TableRow::Split {
                    label: field.label.to_owned(),
                    left: sub_value(left),
                    right: sub_value(right),
                });
            }
            FieldKind::Statement => {
                if statements == Statements::Inline {
                    let text = field.display_value(entry);
                    layout.rows.push(TableRow::Statement {
                        label: field.label.to_owned(),
                        text: render_or_default(text.as_deref(), Fallback::StatementEnclosed)
                            .into_owned(),
                    });
                }
            }
            FieldKind::Image | FieldKind::ImagePair | FieldKind::Gallery => {
                if let Some(value) = entry.get(field.key) {
                    layout.images.extend(image_cells(value, field.label, cache));
                }
            }
            FieldKind::Group(nested) => {
                layout.trailing.push(Block::Subheading(field.label.to_owned()));
                match entry.get(field.key) {
                    Some(group) if field.has_value(entry) => {
                        let (blocks, images) = layout_fields(nested, group, cache, statements)
                            .into_blocks(None);
                        layout.trailing.extend(blocks);
                        layout.images.extend(images);
                    }
                    _ => layout.trailing.push(detail_not_available()),
                }
            }
            FieldKind::Records(nested) => {
                layout.trailing.push(Block::Subheading(field.label.to_owned()));
                let items: Vec<&Value> = entry
                    .get(field.key)
                    .and_then(Value::as_array)
                    .map(|items| {
                        items
                            .iter()
                            .filter(|item| nested.iter().any(|f| f.has_value(item)))
                            .collect()
                    })
                    .unwrap_or_default();
                if items.is_empty() {
                    layout.trailing.push(detail_not_available());
                }
                for (index, item) in items.into_iter().enumerate() {
                    let (blocks, images) = layout_fields(nested, item, cache, statements)
                        .into_blocks(Some(format!("{} {}", record_noun(field.label), index + 1)));
                    layout.trailing.extend(blocks);
                    layout.images.extend(images);
                }
            }
            FieldKind::List => {
                let items: Vec<String> = entry
                    .get(field.key)
                    .map(|value| list_items(value).collect())
                    .unwrap_or_default();
                layout.trailing.push(if items.is_empty() {
                    Block::paragraph(vec![Span::new(Fallback::NotAvailable.text())])
                } else {
                    Block::NumberedList(items)
                });
            }
            FieldKind::Checklist(options) => {
                layout.trailing.push(Block::Subheading(field.label.to_owned()));
                layout
                    .trailing
                    .push(Block::Checklist(checklist(options, entry.get(field.key))));
            }
        }
    }

    layout
}

/// "Towing Vendor Details" -> "Towing Vendor".
fn record_noun(label: &str) -> &str {
    label.strip_suffix(" Details").unwrap_or(label)
}

fn detail_not_available() -> Block {
    Block::paragraph(vec![Span::new(Fallback::DetailNotAvailable.text()).italic()])
}

/// Fixed options ticked by the record's list; extra entries are appended as
/// enclosed.
pub(super) fn checklist(options: &[&str], value: Option<&Value>) -> Vec<ChecklistItem> {
    let mut listed: Vec<String> = value
        .map(|value| list_items(value).collect())
        .unwrap_or_default();

    let mut items: Vec<ChecklistItem> = options
        .iter()
        .map(|option| {
            let position = listed
                .iter()
                .position(|entry| entry.eq_ignore_ascii_case(option));
            if let Some(position) = position {
                listed.remove(position);
            }
            ChecklistItem {
                label: (*option).to_owned(),
                enclosed: position.is_some(),
            }
        })
        .collect();

    items.extend(listed.into_iter().map(|label| ChecklistItem {
        label,
        enclosed: true,
    }));
    items
}

/// Gallery cells of every resolved image in `value`.
///
/// Double-sided references produce a front and a back cell. URLs missing
/// from the cache are left out.
pub(super) fn image_cells(value: &Value, label: &str, cache: &ImageCache) -> Vec<GalleryCell> {
    let mut cells = Vec::new();
    for reference in ImageRef::parse_all(value) {
        let base = reference.title.as_deref().unwrap_or(label);
        let sides = [
            (reference.url.as_deref(), base.to_owned()),
            (reference.front.as_deref(), format!("{base} (Front)")),
            (reference.back.as_deref(), format!("{base} (Back)")),
        ];
        for (url, caption) in sides {
            if let Some(url) = url.filter(|url| cache.contains(url)) {
                cells.push(GalleryCell::Image {
                    url: url.to_owned(),
                    caption,
                });
            }
        }
    }
    cells
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::images::EmbeddedImage;
    use serde_json::json;

    #[test]
    fn checklist_ticks_case_insensitively_and_keeps_extras() {
        let items = checklist(
            &["Claim Form", "FIR Copy"],
            Some(&json!(["fir copy", "Repair Bills"])),
        );
        assert_eq!(
            items,
            vec![
                ChecklistItem { label: "Claim Form".into(), enclosed: false },
                ChecklistItem { label: "FIR Copy".into(), enclosed: true },
                ChecklistItem { label: "Repair Bills".into(), enclosed: true },
            ]
        );
    }

    #[test]
    fn image_cells_skip_unresolved_urls() {
        let mut cache = ImageCache::new();
        cache.insert("https://cdn.example/front.jpg", EmbeddedImage::new(1, 1, vec![]));
        let cells = image_cells(
            &json!({ "front": "https://cdn.example/front.jpg", "back": "https://cdn.example/back.jpg" }),
            "Driving Licence",
            &cache,
        );
        assert_eq!(
            cells,
            vec![GalleryCell::Image {
                url: "https://cdn.example/front.jpg".into(),
                caption: "Driving Licence (Front)".into(),
            }]
        );
    }

    const ELIGIBILITY: &[FieldDescriptor] = &[FieldDescriptor::split(
        "eligibleToDrive",
        "Eligible to Drive",
        ("eligibleTransport", "Transport"),
        ("eligibleNonTransport", "Non-Transport"),
    )];

    fn split_row(entry: serde_json::Value) -> TableRow {
        let layout = layout_fields(ELIGIBILITY, &entry, &ImageCache::new(), Statements::Inline);
        layout.rows.into_iter().next().unwrap()
    }

    #[test]
    fn split_values_are_read_from_the_nested_object() {
        let entry = json!({
            "eligibleToDrive": { "eligibleTransport": "No", "eligibleNonTransport": "Yes" }
        });
        assert!(ELIGIBILITY[0].has_value(&entry));
        assert_eq!(
            split_row(entry),
            TableRow::Split {
                label: "Eligible to Drive".into(),
                left: SubValue { label: "Transport".into(), value: "No".into() },
                right: SubValue { label: "Non-Transport".into(), value: "Yes".into() },
            }
        );
    }

    #[test]
    fn split_values_fall_back_to_siblings() {
        let entry = json!({ "eligibleNonTransport": true });
        assert!(ELIGIBILITY[0].has_value(&entry));
        let TableRow::Split { left, right, .. } = split_row(entry) else {
            panic!("expected a split row");
        };
        assert_eq!(left.value, "N/A");
        assert_eq!(right.value, "Yes");
        assert!(!ELIGIBILITY[0].has_value(&json!({ "eligibleToDrive": {} })));
    }
}
