//! WordprocessingML body writer.

use std::collections::BTreeMap;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::error::ReportError;
use crate::images::{EmbeddedImage, ImageCache};
use crate::model::{
    Block, ChecklistItem, Gallery, GalleryCell, HorizontalAlignment, Letterhead, ReportDocument,
    RichParagraph, SignatureBlock, Statement, Table, TableRow,
};
use crate::pdf::elements::fitted_size_mm;
use crate::richtext::{color_hex, Span, HEADING_COLOR};

use super::parts::{image_rel_id, media_name, FOOTER_REL_ID, NS_A, NS_PIC, NS_R, NS_W, NS_WP};

/// A4 in twentieths of a point.
const PAGE_WIDTH_TWIPS: u32 = 11906;
const PAGE_HEIGHT_TWIPS: u32 = 16838;
/// 15 mm.
const MARGIN_TWIPS: u32 = 850;
const CONTENT_WIDTH_TWIPS: u32 = PAGE_WIDTH_TWIPS - 2 * MARGIN_TWIPS;
/// Label column of the three-column grid; the value spans the other two.
const LABEL_TWIPS: u32 = CONTENT_WIDTH_TWIPS * 2 / 5;
const HALF_VALUE_TWIPS: u32 = (CONTENT_WIDTH_TWIPS - LABEL_TWIPS) / 2;
const GALLERY_IMAGE_WIDTH_MM: f64 = 75.0;
const GALLERY_IMAGE_HEIGHT_MM: f64 = 85.0;
const EMU_PER_MM: f64 = 36_000.0;

/// Images referenced by the body, numbered in order of first use.
#[derive(Debug, Default)]
pub struct MediaRegistry {
    numbers: BTreeMap<String, usize>,
    order: Vec<String>,
}

impl MediaRegistry {
    /// Number of the media part holding `url`, registering it on first use.
    pub fn number_for(&mut self, url: &str) -> usize {
        if let Some(number) = self.numbers.get(url) {
            return *number;
        }
        self.order.push(url.to_owned());
        let number = self.order.len();
        self.numbers.insert(url.to_owned(), number);
        number
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Registered URLs with their media numbers, in number order.
    pub fn entries(&self) -> impl Iterator<Item = (usize, &str)> {
        self.order
            .iter()
            .enumerate()
            .map(|(index, url)| (index + 1, url.as_str()))
    }
}

/// Streams a [`ReportDocument`] into `word/document.xml`.
pub struct BodyWriter<'a> {
    writer: Writer<Vec<u8>>,
    cache: &'a ImageCache,
    media: MediaRegistry,
    drawings: usize,
}

fn jc(alignment: HorizontalAlignment) -> &'static str {
    match alignment {
        HorizontalAlignment::Left => "left",
        HorizontalAlignment::Center => "center",
        HorizontalAlignment::Right => "right",
        HorizontalAlignment::Justified => "both",
    }
}

fn mm_to_emu(mm: f64) -> String {
    ((mm * EMU_PER_MM).round() as i64).to_string()
}

impl<'a> BodyWriter<'a> {
    pub fn new(cache: &'a ImageCache) -> Self {
        Self {
            writer: Writer::new(Vec::new()),
            cache,
            media: MediaRegistry::default(),
            drawings: 0,
        }
    }

    /// Writes the whole document and returns the XML with the media it references.
    pub fn write_document(
        mut self,
        document: &ReportDocument,
    ) -> Result<(Vec<u8>, MediaRegistry), ReportError> {
        self.writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
        self.start(
            "w:document",
            &[("xmlns:w", NS_W), ("xmlns:r", NS_R), ("xmlns:wp", NS_WP)],
        )?;
        self.start("w:body", &[])?;

        self.letterhead(document.letterhead())?;
        for section in document.sections() {
            let mut blocks = section.blocks();
            if let Some((Block::PageBreak, rest)) = blocks.split_first() {
                self.page_break()?;
                blocks = rest;
            }
            self.styled_paragraph("Heading1", HorizontalAlignment::Left, &[Span::new(section.title())])?;
            for block in blocks {
                self.block(block)?;
            }
        }

        self.section_properties()?;
        self.end("w:body")?;
        self.end("w:document")?;
        Ok((self.writer.into_inner(), self.media))
    }

    fn start(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<(), ReportError> {
        self.writer.write_event(Event::Start(
            BytesStart::new(name).with_attributes(attributes.iter().copied()),
        ))?;
        Ok(())
    }

    fn end(&mut self, name: &str) -> Result<(), ReportError> {
        self.writer.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }

    fn empty(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<(), ReportError> {
        self.writer.write_event(Event::Empty(
            BytesStart::new(name).with_attributes(attributes.iter().copied()),
        ))?;
        Ok(())
    }

    fn run(&mut self, span: &Span) -> Result<(), ReportError> {
        self.start("w:r", &[])?;
        let styled = span.is_bold() || span.is_italic() || span.is_underlined() || span.color().is_some();
        if styled {
            self.start("w:rPr", &[])?;
            if span.is_bold() {
                self.empty("w:b", &[])?;
            }
            if span.is_italic() {
                self.empty("w:i", &[])?;
            }
            if span.is_underlined() {
                self.empty("w:u", &[("w:val", "single")])?;
            }
            if let Some(color) = span.color() {
                let hex = color_hex(color);
                self.empty("w:color", &[("w:val", hex.as_str())])?;
            }
            self.end("w:rPr")?;
        }
        for (index, line) in span.text().split('\n').enumerate() {
            if index > 0 {
                self.empty("w:br", &[])?;
            }
            self.start("w:t", &[("xml:space", "preserve")])?;
            self.writer.write_event(Event::Text(BytesText::new(line)))?;
            self.end("w:t")?;
        }
        self.end("w:r")
    }

    fn styled_paragraph(
        &mut self,
        style: &str,
        alignment: HorizontalAlignment,
        spans: &[Span],
    ) -> Result<(), ReportError> {
        self.start("w:p", &[])?;
        self.start("w:pPr", &[])?;
        if !style.is_empty() {
            self.empty("w:pStyle", &[("w:val", style)])?;
        }
        if alignment != HorizontalAlignment::Left {
            self.empty("w:jc", &[("w:val", jc(alignment))])?;
        }
        self.end("w:pPr")?;
        for span in spans {
            self.run(span)?;
        }
        self.end("w:p")
    }

    fn paragraph(&mut self, spans: &[Span]) -> Result<(), ReportError> {
        self.styled_paragraph("", HorizontalAlignment::Left, spans)
    }

    fn rich_paragraph(&mut self, paragraph: &RichParagraph) -> Result<(), ReportError> {
        self.styled_paragraph("", paragraph.alignment(), paragraph.spans())
    }

    fn page_break(&mut self) -> Result<(), ReportError> {
        self.start("w:p", &[])?;
        self.start("w:r", &[])?;
        self.empty("w:br", &[("w:type", "page")])?;
        self.end("w:r")?;
        self.end("w:p")
    }

    fn block(&mut self, block: &Block) -> Result<(), ReportError> {
        match block {
            Block::Subheading(text) => {
                self.styled_paragraph("Heading2", HorizontalAlignment::Left, &[Span::new(text.as_str())])
            }
            Block::Paragraph(paragraph) => self.rich_paragraph(paragraph),
            Block::Table(table) => self.table(table),
            Block::NumberedList(items) => {
                for (index, item) in items.iter().enumerate() {
                    self.start("w:p", &[])?;
                    self.start("w:pPr", &[])?;
                    self.empty("w:ind", &[("w:left", "567"), ("w:hanging", "340")])?;
                    self.end("w:pPr")?;
                    self.run(&Span::new(format!("{}.\t", index + 1)))?;
                    self.run(&Span::new(item.as_str()))?;
                    self.end("w:p")?;
                }
                Ok(())
            }
            Block::Checklist(items) => self.checklist(items),
            Block::Statement(statement) => self.statement(statement),
            Block::Gallery(gallery) => self.gallery(gallery),
            Block::Signature(signature) => self.signature(signature),
            Block::PageBreak => self.page_break(),
        }
    }

    fn letterhead(&mut self, letterhead: &Letterhead) -> Result<(), ReportError> {
        self.styled_paragraph(
            "",
            HorizontalAlignment::Center,
            &[Span::new(letterhead.agency_name.as_str()).bold().colored(HEADING_COLOR)],
        )?;
        for line in [&letterhead.agency_address, &letterhead.agency_contact] {
            if !line.trim().is_empty() {
                self.styled_paragraph("", HorizontalAlignment::Center, &[Span::new(line.as_str())])?;
            }
        }
        self.styled_paragraph("Title", HorizontalAlignment::Center, &[Span::new(letterhead.title.to_uppercase())])?;
        self.paragraph(&[Span::new(format!("Ref. No.: {}", letterhead.reference))])?;
        self.styled_paragraph(
            "",
            HorizontalAlignment::Right,
            &[Span::new(format!("Date: {}", letterhead.date))],
        )?;
        for line in &letterhead.addressee {
            self.paragraph(&[Span::new(line.as_str())])?;
        }
        self.paragraph(&[
            Span::new("Subject: ").bold(),
            Span::new(letterhead.subject.as_str()),
        ])
    }

    fn table_start(&mut self, columns: &[u32]) -> Result<(), ReportError> {
        let width = columns.iter().sum::<u32>().to_string();
        self.start("w:tbl", &[])?;
        self.start("w:tblPr", &[])?;
        self.empty("w:tblStyle", &[("w:val", "ReportTable")])?;
        self.empty("w:tblW", &[("w:w", width.as_str()), ("w:type", "dxa")])?;
        self.empty("w:tblLayout", &[("w:type", "fixed")])?;
        self.end("w:tblPr")?;
        self.start("w:tblGrid", &[])?;
        for column in columns {
            let column = column.to_string();
            self.empty("w:gridCol", &[("w:w", column.as_str())])?;
        }
        self.end("w:tblGrid")
    }

    /// A table cell spanning `span` grid columns; `content` writes its paragraphs.
    fn cell<F>(&mut self, width: u32, span: u32, content: F) -> Result<(), ReportError>
    where
        F: FnOnce(&mut Self) -> Result<(), ReportError>,
    {
        let width = width.to_string();
        self.start("w:tc", &[])?;
        self.start("w:tcPr", &[])?;
        self.empty("w:tcW", &[("w:w", width.as_str()), ("w:type", "dxa")])?;
        if span > 1 {
            let span = span.to_string();
            self.empty("w:gridSpan", &[("w:val", span.as_str())])?;
        }
        self.end("w:tcPr")?;
        content(self)?;
        self.end("w:tc")
    }

    fn text_cell(&mut self, width: u32, span: u32, spans: &[Span]) -> Result<(), ReportError> {
        self.cell(width, span, |body| body.paragraph(spans))
    }

    fn table(&mut self, table: &Table) -> Result<(), ReportError> {
        if table.rows().is_empty() {
            return Ok(());
        }
        self.table_start(&[LABEL_TWIPS, HALF_VALUE_TWIPS, HALF_VALUE_TWIPS])?;
        if let Some(caption) = table.caption() {
            self.start("w:tr", &[])?;
            self.text_cell(CONTENT_WIDTH_TWIPS, 3, &[Span::new(caption).bold()])?;
            self.end("w:tr")?;
        }
        for row in table.rows() {
            self.start("w:tr", &[])?;
            self.start("w:trPr", &[])?;
            self.empty("w:cantSplit", &[])?;
            self.end("w:trPr")?;
            match row {
                TableRow::Pair { label, value } => {
                    self.text_cell(LABEL_TWIPS, 1, &[Span::new(label.as_str()).bold()])?;
                    self.text_cell(2 * HALF_VALUE_TWIPS, 2, &[Span::new(value.as_str())])?;
                }
                TableRow::Split { label, left, right } => {
                    self.text_cell(LABEL_TWIPS, 1, &[Span::new(label.as_str()).bold()])?;
                    for sub in [left, right] {
                        self.text_cell(
                            HALF_VALUE_TWIPS,
                            1,
                            &[Span::new(format!("{}: ", sub.label)), Span::new(sub.value.as_str())],
                        )?;
                    }
                }
                TableRow::Statement { label, text } => {
                    self.cell(CONTENT_WIDTH_TWIPS, 3, |body| {
                        body.paragraph(&[Span::new(label.as_str()).bold()])?;
                        body.styled_paragraph("", HorizontalAlignment::Justified, &[Span::new(text.as_str())])
                    })?;
                }
            }
            self.end("w:tr")?;
        }
        self.end("w:tbl")?;
        // Word merges back-to-back tables; keep them apart.
        self.paragraph(&[])
    }

    fn checklist(&mut self, items: &[ChecklistItem]) -> Result<(), ReportError> {
        let label_width = CONTENT_WIDTH_TWIPS * 4 / 5;
        let mark_width = CONTENT_WIDTH_TWIPS - label_width;
        self.table_start(&[label_width, mark_width])?;
        self.start("w:tr", &[])?;
        self.text_cell(label_width, 1, &[Span::new("Document").bold()])?;
        self.text_cell(mark_width, 1, &[Span::new("Enclosed").bold()])?;
        self.end("w:tr")?;
        for item in items {
            self.start("w:tr", &[])?;
            self.text_cell(label_width, 1, &[Span::new(item.label.as_str())])?;
            self.text_cell(
                mark_width,
                1,
                &[Span::new(if item.enclosed { "Yes" } else { "No" })],
            )?;
            self.end("w:tr")?;
        }
        self.end("w:tbl")?;
        self.paragraph(&[])
    }

    fn statement(&mut self, statement: &Statement) -> Result<(), ReportError> {
        self.paragraph(&[Span::new(statement.heading.as_str()).bold()])?;
        self.styled_paragraph(
            "",
            HorizontalAlignment::Justified,
            &[Span::new(statement.text.as_str())],
        )
    }

    fn signature(&mut self, signature: &SignatureBlock) -> Result<(), ReportError> {
        self.paragraph(&[])?;
        self.paragraph(&[Span::new(format!("For {}", signature.agency)).bold()])?;
        self.paragraph(&[])?;
        self.paragraph(&[Span::new(format!("({})", signature.investigator))])?;
        self.paragraph(&[Span::new(signature.designation.as_str())])?;
        self.paragraph(&[Span::new(format!("Place: {}", signature.place))])?;
        self.paragraph(&[Span::new(format!("Date: {}", signature.date))])
    }

    fn gallery(&mut self, gallery: &Gallery) -> Result<(), ReportError> {
        self.styled_paragraph("Heading2", HorizontalAlignment::Left, &[Span::new(gallery.title())])?;
        let cache = self.cache;
        let half = CONTENT_WIDTH_TWIPS / 2;
        self.table_start(&[half, half])?;
        for row in gallery.rows() {
            self.start("w:tr", &[])?;
            self.start("w:trPr", &[])?;
            self.empty("w:cantSplit", &[])?;
            self.end("w:trPr")?;
            for cell in row {
                let image = match cell {
                    GalleryCell::Image { url, caption } => {
                        cache.get(url).map(|image| (url, caption, image))
                    }
                    GalleryCell::Filler => None,
                };
                match image {
                    Some((url, caption, image)) => self.cell(half, 1, |body| {
                        body.picture(url, image)?;
                        body.styled_paragraph("Caption", HorizontalAlignment::Center, &[Span::new(caption.as_str())])
                    })?,
                    None => self.text_cell(half, 1, &[])?,
                }
            }
            self.end("w:tr")?;
        }
        self.end("w:tbl")?;
        self.paragraph(&[])
    }

    fn picture(&mut self, url: &str, image: &EmbeddedImage) -> Result<(), ReportError> {
        let number = self.media.number_for(url);
        self.drawings += 1;
        let drawing_id = self.drawings.to_string();
        let rel_id = image_rel_id(number);
        let name = media_name(number);
        let (width, height) = fitted_size_mm(
            image.width(),
            image.height(),
            GALLERY_IMAGE_WIDTH_MM,
            GALLERY_IMAGE_HEIGHT_MM,
        );
        let (cx, cy) = (mm_to_emu(width), mm_to_emu(height));

        self.start("w:p", &[])?;
        self.start("w:pPr", &[])?;
        self.empty("w:jc", &[("w:val", "center")])?;
        self.end("w:pPr")?;
        self.start("w:r", &[])?;
        self.start("w:drawing", &[])?;
        self.start("wp:inline", &[("distT", "0"), ("distB", "0"), ("distL", "0"), ("distR", "0")])?;
        self.empty("wp:extent", &[("cx", cx.as_str()), ("cy", cy.as_str())])?;
        self.empty("wp:docPr", &[("id", drawing_id.as_str()), ("name", name.as_str())])?;
        self.start("a:graphic", &[("xmlns:a", NS_A)])?;
        self.start("a:graphicData", &[("uri", NS_PIC)])?;
        self.start("pic:pic", &[("xmlns:pic", NS_PIC)])?;
        self.start("pic:nvPicPr", &[])?;
        self.empty("pic:cNvPr", &[("id", drawing_id.as_str()), ("name", name.as_str())])?;
        self.empty("pic:cNvPicPr", &[])?;
        self.end("pic:nvPicPr")?;
        self.start("pic:blipFill", &[])?;
        self.empty("a:blip", &[("r:embed", rel_id.as_str())])?;
        self.start("a:stretch", &[])?;
        self.empty("a:fillRect", &[])?;
        self.end("a:stretch")?;
        self.end("pic:blipFill")?;
        self.start("pic:spPr", &[])?;
        self.start("a:xfrm", &[])?;
        self.empty("a:off", &[("x", "0"), ("y", "0")])?;
        self.empty("a:ext", &[("cx", cx.as_str()), ("cy", cy.as_str())])?;
        self.end("a:xfrm")?;
        self.start("a:prstGeom", &[("prst", "rect")])?;
        self.empty("a:avLst", &[])?;
        self.end("a:prstGeom")?;
        self.end("pic:spPr")?;
        self.end("pic:pic")?;
        self.end("a:graphicData")?;
        self.end("a:graphic")?;
        self.end("wp:inline")?;
        self.end("w:drawing")?;
        self.end("w:r")?;
        self.end("w:p")
    }

    fn section_properties(&mut self) -> Result<(), ReportError> {
        let width = PAGE_WIDTH_TWIPS.to_string();
        let height = PAGE_HEIGHT_TWIPS.to_string();
        let margin = MARGIN_TWIPS.to_string();
        self.start("w:sectPr", &[])?;
        self.empty("w:footerReference", &[("w:type", "default"), ("r:id", FOOTER_REL_ID)])?;
        self.empty("w:pgSz", &[("w:w", width.as_str()), ("w:h", height.as_str())])?;
        self.empty(
            "w:pgMar",
            &[
                ("w:top", margin.as_str()),
                ("w:right", margin.as_str()),
                ("w:bottom", margin.as_str()),
                ("w:left", margin.as_str()),
                ("w:header", "425"),
                ("w:footer", "425"),
                ("w:gutter", "0"),
            ],
        )?;
        self.end("w:sectPr")
    }
}
