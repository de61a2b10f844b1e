//! Static section schemas.
//!
//! A schema is an ordered list of [`SectionDescriptor`]s, each an ordered list
//! of typed [`FieldDescriptor`]s. It decides which sections appear, in which
//! order, under which labels, and which fields are images rather than text.
//! Fields the schema does not name are never rendered.

mod investigation;
mod od;

use std::borrow::Cow;
use std::fmt;

use serde_json::Value;

use crate::record::{is_blank, scalar_text, CaseRecord, ImageRef};

pub use investigation::INVESTIGATION_SCHEMA;
pub use od::OD_SCHEMA;

/// The report variants the generator knows how to build.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReportKind {
    /// Motor own-damage claim.
    OdCase,
    /// General claim investigation.
    Investigation,
}

impl ReportKind {
    /// Prefix used in generated file names.
    pub fn file_prefix(self) -> &'static str {
        match self {
            Self::OdCase => "OD_Report",
            Self::Investigation => "Investigation_Report",
        }
    }

    /// Document title printed below the letterhead.
    pub fn title(self) -> &'static str {
        match self {
            Self::OdCase => "Own Damage Claim Investigation Report",
            Self::Investigation => "Claim Investigation Report",
        }
    }

    pub fn schema(self) -> &'static SectionSchema {
        match self {
            Self::OdCase => &OD_SCHEMA,
            Self::Investigation => &INVESTIGATION_SCHEMA,
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_prefix())
    }
}

/// Fallback text used when a value is missing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fallback {
    /// Table cells.
    NotApplicable,
    /// Narrative paragraphs.
    NotAvailable,
    /// Empty sub-record lists and absent groups.
    DetailNotAvailable,
    /// Statement rows whose narrative is empty.
    StatementEnclosed,
}

impl Fallback {
    pub fn text(self) -> &'static str {
        match self {
            Self::NotApplicable => "N/A",
            Self::NotAvailable => "Not Available",
            Self::DetailNotAvailable => "Detail not available",
            Self::StatementEnclosed => "Statement enclosed.",
        }
    }
}

/// Returns the value when present and non-blank, otherwise the fallback text.
pub fn render_or_default(value: Option<&str>, fallback: Fallback) -> Cow<'_, str> {
    match value.map(str::trim) {
        Some(text) if !text.is_empty() => Cow::Borrowed(text),
        _ => Cow::Borrowed(fallback.text()),
    }
}

/// One half of a split row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubField {
    pub key: &'static str,
    pub label: &'static str,
}

/// How a field is read from the record and rendered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Date,
    Split { left: SubField, right: SubField },
    Statement,
    Image,
    ImagePair,
    Gallery,
    Group(&'static [FieldDescriptor]),
    Records(&'static [FieldDescriptor]),
    List,
    Checklist(&'static [&'static str]),
}

/// Renders a field only when a sibling value matches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Condition {
    pub key: &'static str,
    pub equals: &'static str,
}

impl Condition {
    pub fn holds(&self, parent: &Value) -> bool {
        parent
            .get(self.key)
            .and_then(scalar_text)
            .is_some_and(|value| value.eq_ignore_ascii_case(self.equals))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub condition: Option<Condition>,
}

impl FieldDescriptor {
    pub const fn new(key: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            key,
            label,
            kind,
            condition: None,
        }
    }

    pub const fn text(key: &'static str, label: &'static str) -> Self {
        Self::new(key, label, FieldKind::Text)
    }

    pub const fn date(key: &'static str, label: &'static str) -> Self {
        Self::new(key, label, FieldKind::Date)
    }

    pub const fn statement(key: &'static str, label: &'static str) -> Self {
        Self::new(key, label, FieldKind::Statement)
    }

    pub const fn image(key: &'static str, label: &'static str) -> Self {
        Self::new(key, label, FieldKind::Image)
    }

    pub const fn image_pair(key: &'static str, label: &'static str) -> Self {
        Self::new(key, label, FieldKind::ImagePair)
    }

    pub const fn gallery(key: &'static str, label: &'static str) -> Self {
        Self::new(key, label, FieldKind::Gallery)
    }

    pub const fn split(
        key: &'static str,
        label: &'static str,
        left: (&'static str, &'static str),
        right: (&'static str, &'static str),
    ) -> Self {
        Self::new(
            key,
            label,
            FieldKind::Split {
                left: SubField {
                    key: left.0,
                    label: left.1,
                },
                right: SubField {
                    key: right.0,
                    label: right.1,
                },
            },
        )
    }

    /// Restricts the field to records where `key` equals `equals`.
    pub const fn when(self, key: &'static str, equals: &'static str) -> Self {
        Self {
            condition: Some(Condition { key, equals }),
            ..self
        }
    }

    /// Whether the field applies to `parent` at all.
    pub fn applies_to(&self, parent: &Value) -> bool {
        self.condition
            .map_or(true, |condition| condition.holds(parent))
    }

    /// Whether the field carries anything on `parent`.
    pub fn has_value(&self, parent: &Value) -> bool {
        if !self.applies_to(parent) {
            return false;
        }
        match self.kind {
            FieldKind::Split { left, right } => [left, right]
                .into_iter()
                .any(|sub| self.split_value(parent, sub).is_some()),
            FieldKind::Text | FieldKind::Date | FieldKind::Statement => {
                parent.get(self.key).and_then(scalar_text).is_some()
            }
            FieldKind::Image | FieldKind::ImagePair | FieldKind::Gallery => parent
                .get(self.key)
                .is_some_and(|value| !ImageRef::parse_all(value).is_empty()),
            FieldKind::Group(fields) => parent
                .get(self.key)
                .is_some_and(|group| fields.iter().any(|field| field.has_value(group))),
            FieldKind::Records(fields) => parent
                .get(self.key)
                .and_then(Value::as_array)
                .is_some_and(|items| {
                    items
                        .iter()
                        .any(|item| fields.iter().any(|field| field.has_value(item)))
                }),
            FieldKind::List | FieldKind::Checklist(_) => parent
                .get(self.key)
                .is_some_and(|value| list_items(value).next().is_some()),
        }
    }

    /// Display text of a scalar field, formatted per its kind.
    pub fn display_value(&self, parent: &Value) -> Option<String> {
        let raw = parent.get(self.key).and_then(scalar_text)?;
        Some(match self.kind {
            FieldKind::Date => format_date(&raw),
            _ => raw,
        })
    }

    /// One side of a split field: read from the object under the field's own
    /// key, else from a sibling of the same name.
    pub fn split_value(&self, parent: &Value, sub: SubField) -> Option<String> {
        parent
            .get(self.key)
            .filter(|value| value.is_object())
            .and_then(|nested| nested.get(sub.key))
            .and_then(scalar_text)
            .or_else(|| parent.get(sub.key).and_then(scalar_text))
    }

    pub fn is_image(&self) -> bool {
        matches!(
            self.kind,
            FieldKind::Image | FieldKind::ImagePair | FieldKind::Gallery
        )
    }
}

/// Non-blank string items of an array value (or a single string).
pub fn list_items(value: &Value) -> impl Iterator<Item = String> + '_ {
    let items: Box<dyn Iterator<Item = &Value>> = match value {
        Value::Array(items) => Box::new(items.iter()),
        other => Box::new(std::iter::once(other)),
    };
    items.filter_map(scalar_text)
}

/// Reformats ISO dates (`YYYY-MM-DD`, optionally followed by a time) as
/// `DD-MM-YYYY`; any other text is returned unchanged.
pub fn format_date(raw: &str) -> String {
    let (Some(date_part), Some(rest)) = (raw.get(..10), raw.get(10..)) else {
        return raw.to_owned();
    };
    if !(rest.is_empty() || rest.starts_with(['T', ' '])) {
        return raw.to_owned();
    }
    match chrono::NaiveDate::parse_from_str(date_part, "%Y-%m-%d") {
        Ok(date) => date.format("%d-%m-%Y").to_string(),
        Err(_) => raw.to_owned(),
    }
}

/// Layout family of a section.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SectionLayout {
    /// Label/value table with sub-tables for groups and records.
    Table,
    /// Short facts table followed by narrative statement paragraphs.
    Narrative,
    /// Numbered findings list plus remarks.
    Findings,
    /// Opinion paragraph, enclosures checklist and signature block.
    Opinion,
    /// Named photo categories.
    Photos,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SectionDescriptor {
    pub key: &'static str,
    pub title: &'static str,
    pub layout: SectionLayout,
    pub fields: &'static [FieldDescriptor],
    /// The section value is an array of sub-records (e.g. witnesses).
    pub repeated: bool,
    pub always_shown: bool,
    pub page_break_before: bool,
}

impl SectionDescriptor {
    pub const fn new(
        key: &'static str,
        title: &'static str,
        layout: SectionLayout,
        fields: &'static [FieldDescriptor],
    ) -> Self {
        Self {
            key,
            title,
            layout,
            fields,
            repeated: false,
            always_shown: false,
            page_break_before: false,
        }
    }

    pub const fn repeated(self) -> Self {
        Self {
            repeated: true,
            ..self
        }
    }

    pub const fn always_shown(self) -> Self {
        Self {
            always_shown: true,
            ..self
        }
    }

    pub const fn page_break_before(self) -> Self {
        Self {
            page_break_before: true,
            ..self
        }
    }

    /// Backing objects of the section: one for plain sections, one per
    /// sub-record for repeated ones.
    pub fn entries<'a>(&self, record: &'a CaseRecord) -> Vec<&'a Value> {
        match record.section(self.key) {
            Some(Value::Array(items)) if self.repeated => {
                items.iter().filter(|item| !item.is_null()).collect()
            }
            Some(value) if !self.repeated && value.is_object() => vec![value],
            _ => Vec::new(),
        }
    }

    /// Whether any schema field of the section carries a value, images included.
    pub fn has_data(&self, record: &CaseRecord) -> bool {
        self.entries(record).into_iter().any(|entry| {
            !is_blank(entry) && self.fields.iter().any(|field| field.has_value(entry))
        })
    }

    /// The single predicate both output formats use to include a section.
    pub fn should_render(&self, record: &CaseRecord) -> bool {
        self.always_shown || self.has_data(record)
    }
}

#[derive(Debug)]
pub struct SectionSchema {
    pub kind: ReportKind,
    pub sections: &'static [SectionDescriptor],
}

impl SectionSchema {
    pub fn section(&self, key: &str) -> Option<&SectionDescriptor> {
        self.sections.iter().find(|section| section.key == key)
    }

    /// Sections that will appear for `record`, in schema order.
    pub fn rendered_sections<'a>(
        &'a self,
        record: &'a CaseRecord,
    ) -> impl Iterator<Item = &'a SectionDescriptor> + 'a {
        self.sections
            .iter()
            .filter(move |section| section.should_render(record))
    }
}
