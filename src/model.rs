//! Format-neutral description of a finished investigation report.
//!
//! The assembler produces a [`ReportDocument`]; the PDF and DOCX back ends only
//! lay it out. Keeping the decision of *what* appears in one place guarantees
//! both formats contain the same sections, rows and images.

use crate::richtext::Span;

/// Horizontal alignment of paragraphs and images.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HorizontalAlignment {
    #[default]
    Left,
    Center,
    Right,
    Justified,
}

/// Rich text paragraph with alignment.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RichParagraph {
    spans: Vec<Span>,
    alignment: HorizontalAlignment,
}

impl RichParagraph {
    /// Creates a left-aligned paragraph from the provided spans.
    pub fn new(spans: impl Into<Vec<Span>>) -> Self {
        Self {
            spans: spans.into(),
            ..Self::default()
        }
    }

    /// Single unstyled span.
    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(vec![Span::new(text)])
    }

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    pub fn alignment(&self) -> HorizontalAlignment {
        self.alignment
    }

    pub fn with_alignment(mut self, alignment: HorizontalAlignment) -> Self {
        self.alignment = alignment;
        self
    }

    /// Concatenated text of all spans.
    pub fn text(&self) -> String {
        self.spans.iter().map(Span::text).collect()
    }
}

/// A label with its own value, used for split rows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubValue {
    pub label: String,
    pub value: String,
}

/// One row of a label/value table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TableRow {
    Pair {
        label: String,
        value: String,
    },
    /// Two independent sub-values side by side under one label.
    Split {
        label: String,
        left: SubValue,
        right: SubValue,
    },
    /// Full-width narrative row.
    Statement {
        label: String,
        text: String,
    },
}

impl TableRow {
    pub fn pair(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Pair {
            label: label.into(),
            value: value.into(),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Pair { label, .. } | Self::Split { label, .. } | Self::Statement { label, .. } => {
                label
            }
        }
    }
}

/// Label/value table, optionally with a caption row on top.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Table {
    caption: Option<String>,
    rows: Vec<TableRow>,
}

impl Table {
    pub fn new(rows: Vec<TableRow>) -> Self {
        Self {
            caption: None,
            rows,
        }
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    pub fn caption(&self) -> Option<&str> {
        self.caption.as_deref()
    }

    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    /// Value of the first pair row carrying `label`.
    pub fn value_of(&self, label: &str) -> Option<&str> {
        self.rows.iter().find_map(|row| match row {
            TableRow::Pair { label: l, value } if l == label => Some(value.as_str()),
            _ => None,
        })
    }
}

/// One cell of a photo gallery.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GalleryCell {
    /// Resolved image, keyed by its source URL in the image cache.
    Image { url: String, caption: String },
    /// Empty cell completing the last row of an odd gallery.
    Filler,
}

/// Images laid out two per row under a category title.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Gallery {
    title: String,
    rows: Vec<[GalleryCell; 2]>,
}

impl Gallery {
    /// Pairs `cells` two per row; an odd count ends with a filler cell.
    pub fn from_cells(title: impl Into<String>, cells: Vec<GalleryCell>) -> Self {
        let mut rows = Vec::with_capacity(cells.len().div_ceil(2));
        let mut cells = cells.into_iter();
        while let Some(left) = cells.next() {
            let right = cells.next().unwrap_or(GalleryCell::Filler);
            rows.push([left, right]);
        }
        Self {
            title: title.into(),
            rows,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn rows(&self) -> &[[GalleryCell; 2]] {
        &self.rows
    }

    pub fn image_count(&self) -> usize {
        self.rows
            .iter()
            .flatten()
            .filter(|cell| matches!(cell, GalleryCell::Image { .. }))
            .count()
    }
}

/// Enclosure checklist entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChecklistItem {
    pub label: String,
    pub enclosed: bool,
}

/// Narrative statement attributed to a person.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Statement {
    pub heading: String,
    pub text: String,
}

/// Closing signature lines.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignatureBlock {
    pub agency: String,
    pub investigator: String,
    pub designation: String,
    pub place: String,
    pub date: String,
}

/// Content blocks that make up sections.
#[derive(Clone, Debug, PartialEq)]
pub enum Block {
    /// Sub-heading inside a section.
    Subheading(String),
    Paragraph(RichParagraph),
    Table(Table),
    NumberedList(Vec<String>),
    Checklist(Vec<ChecklistItem>),
    Statement(Statement),
    Gallery(Gallery),
    Signature(SignatureBlock),
    /// Explicit page break request.
    PageBreak,
}

impl Block {
    pub fn paragraph(spans: impl Into<Vec<Span>>) -> Self {
        Self::Paragraph(RichParagraph::new(spans))
    }
}

/// Reference block and addressee printed at the top of the first page.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Letterhead {
    pub agency_name: String,
    pub agency_address: String,
    pub agency_contact: String,
    pub title: String,
    pub reference: String,
    pub date: String,
    pub addressee: Vec<String>,
    pub subject: String,
}

/// Logical representation of a report section.
#[derive(Clone, Debug, PartialEq)]
pub struct Section {
    identifier: String,
    title: String,
    blocks: Vec<Block>,
}

impl Section {
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn starts_on_new_page(&self) -> bool {
        matches!(self.blocks.first(), Some(Block::PageBreak))
    }

    /// Tables of the section, in order.
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.blocks.iter().filter_map(|block| match block {
            Block::Table(table) => Some(table),
            _ => None,
        })
    }

    pub fn builder(identifier: impl Into<String>, title: impl Into<String>) -> SectionBuilder {
        SectionBuilder::new(identifier, title)
    }
}

/// Builder for [`Section`] values.
#[derive(Clone, Debug, Default)]
pub struct SectionBuilder {
    identifier: String,
    title: String,
    blocks: Vec<Block>,
    start_on_new_page: bool,
}

impl SectionBuilder {
    pub fn new(identifier: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            title: title.into(),
            ..Self::default()
        }
    }

    /// Marks the section to start on a new page.
    pub fn start_on_new_page(mut self, start_on_new_page: bool) -> Self {
        self.start_on_new_page = start_on_new_page;
        self
    }

    pub fn push(&mut self, block: Block) {
        self.blocks.push(block);
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Builds the final section, injecting a leading page break when requested.
    pub fn build(mut self) -> Section {
        if self.start_on_new_page {
            match self.blocks.first() {
                Some(Block::PageBreak) => {}
                _ => self.blocks.insert(0, Block::PageBreak),
            }
        }

        Section {
            identifier: self.identifier,
            title: self.title,
            blocks: self.blocks,
        }
    }
}

/// A complete report ready for a back end.
#[derive(Clone, Debug, PartialEq)]
pub struct ReportDocument {
    letterhead: Letterhead,
    sections: Vec<Section>,
}

impl ReportDocument {
    pub fn new(letterhead: Letterhead, sections: Vec<Section>) -> Self {
        Self {
            letterhead,
            sections,
        }
    }

    pub fn letterhead(&self) -> &Letterhead {
        &self.letterhead
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn section(&self, identifier: &str) -> Option<&Section> {
        self.sections
            .iter()
            .find(|section| section.identifier == identifier)
    }

    /// URLs of every image the document places, in layout order.
    pub fn image_urls(&self) -> impl Iterator<Item = &str> {
        self.sections
            .iter()
            .flat_map(|section| section.blocks.iter())
            .filter_map(|block| match block {
                Block::Gallery(gallery) => Some(gallery),
                _ => None,
            })
            .flat_map(|gallery| gallery.rows.iter().flatten())
            .filter_map(|cell| match cell {
                GalleryCell::Image { url, .. } => Some(url.as_str()),
                GalleryCell::Filler => None,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(n: usize) -> GalleryCell {
        GalleryCell::Image {
            url: format!("https://cdn.example/{n}.jpg"),
            caption: format!("Photo {n}"),
        }
    }

    #[test]
    fn builder_inserts_page_break() {
        let section = Section::builder("findings", "Findings")
            .start_on_new_page(true)
            .build();
        assert!(section.starts_on_new_page());
    }

    #[test]
    fn builder_does_not_duplicate_page_break() {
        let mut builder = Section::builder("findings", "Findings").start_on_new_page(true);
        builder.push(Block::PageBreak);
        let section = builder.build();
        assert_eq!(section.blocks().len(), 1);
    }

    #[test]
    fn odd_gallery_ends_with_filler() {
        let gallery = Gallery::from_cells("Spot Photographs", (0..5).map(image).collect());
        assert_eq!(gallery.rows().len(), 3);
        assert_eq!(gallery.rows()[2][1], GalleryCell::Filler);
        assert_eq!(gallery.image_count(), 5);
    }

    #[test]
    fn even_gallery_has_no_filler() {
        let gallery = Gallery::from_cells("Vehicle Photographs", (0..4).map(image).collect());
        assert_eq!(gallery.rows().len(), 2);
        assert!(gallery
            .rows()
            .iter()
            .flatten()
            .all(|cell| cell != &GalleryCell::Filler));
    }
}
