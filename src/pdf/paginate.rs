//! Page planning for the PDF back end.
//!
//! `genpdf` only breaks pages when an element overflows. The planner walks the
//! document with a running cursor over estimated heights and decides where
//! pages end: tables and galleries break between rows, and a heading always
//! shares its page with the first row or block that follows it.

use std::ops::Range;

use tokio_util::sync::CancellationToken;

use crate::error::ReportError;
use crate::images::ImageCache;
use crate::model::{Block, Gallery, GalleryCell, Letterhead, ReportDocument, Table, TableRow};

use super::elements::fitted_size_mm;

pub const PAGE_WIDTH_MM: f64 = 210.0;
pub const PAGE_HEIGHT_MM: f64 = 297.0;
pub const MARGIN_MM: f64 = 15.0;
pub const FOOTER_HEIGHT_MM: f64 = 10.0;
pub const CONTENT_WIDTH_MM: f64 = PAGE_WIDTH_MM - 2.0 * MARGIN_MM;
pub const CONTENT_HEIGHT_MM: f64 = PAGE_HEIGHT_MM - 2.0 * MARGIN_MM - FOOTER_HEIGHT_MM;
/// Height the planner fills per page. The reserve absorbs estimate error so
/// the planner breaks before `genpdf` would, never after.
pub const PLANNED_HEIGHT_MM: f64 = CONTENT_HEIGHT_MM - PLANNING_RESERVE_MM;
const PLANNING_RESERVE_MM: f64 = 12.0;

/// Label column share of a label/value table.
pub const LABEL_COLUMN_WEIGHT: usize = 2;
pub const VALUE_COLUMN_WEIGHT: usize = 3;

/// Gallery images are fitted into this box inside each cell.
pub const GALLERY_IMAGE_WIDTH_MM: f64 = 80.0;
pub const GALLERY_IMAGE_HEIGHT_MM: f64 = 90.0;

// 10 pt text at 1.15 line spacing with the font's own line gap.
const LINE_HEIGHT_MM: f64 = 4.8;
const CHAR_WIDTH_MM: f64 = 2.0;
const CELL_PADDING_MM: f64 = 2.0;
const PARAGRAPH_GAP_MM: f64 = 2.0;
const SECTION_TITLE_MM: f64 = 11.0;
const SUBHEADING_MM: f64 = 7.0;
const CAPTION_ROW_MM: f64 = LINE_HEIGHT_MM + CELL_PADDING_MM;
const SIGNATURE_MM: f64 = 40.0;

/// One unit of planned output, in page order.
#[derive(Clone, Debug, PartialEq)]
pub enum Placement<'a> {
    Letterhead(&'a Letterhead),
    SectionTitle(&'a str),
    Block(&'a Block),
    /// A run of table rows; the caption is printed with the first run only.
    TableRows { table: &'a Table, rows: Range<usize> },
    /// A run of gallery rows; the title is printed with the first run only.
    GalleryRows { gallery: &'a Gallery, rows: Range<usize> },
    PageBreak,
}

/// Estimated number of lines `text` needs in a column `width_mm` wide.
pub fn line_count(text: &str, width_mm: f64) -> usize {
    let per_line = ((width_mm - CELL_PADDING_MM) / CHAR_WIDTH_MM).floor().max(1.0) as usize;
    text.split('\n')
        .map(|line| line.chars().count().div_ceil(per_line).max(1))
        .sum()
}

fn text_height(text: &str, width_mm: f64) -> f64 {
    line_count(text, width_mm) as f64 * LINE_HEIGHT_MM
}

fn column_width(weight: usize) -> f64 {
    CONTENT_WIDTH_MM * weight as f64 / (LABEL_COLUMN_WEIGHT + VALUE_COLUMN_WEIGHT) as f64
}

pub fn row_height(row: &TableRow) -> f64 {
    let label_width = column_width(LABEL_COLUMN_WEIGHT);
    let value_width = column_width(VALUE_COLUMN_WEIGHT);
    let content = match row {
        TableRow::Pair { label, value } => {
            text_height(label, label_width).max(text_height(value, value_width))
        }
        TableRow::Split { label, left, right } => {
            let half = value_width / 2.0;
            let left = format!("{}: {}", left.label, left.value);
            let right = format!("{}: {}", right.label, right.value);
            text_height(label, label_width)
                .max(text_height(&left, half))
                .max(text_height(&right, half))
        }
        TableRow::Statement { label, text } => {
            text_height(label, CONTENT_WIDTH_MM) + text_height(text, CONTENT_WIDTH_MM)
        }
    };
    content + 2.0 * CELL_PADDING_MM
}

pub fn gallery_row_height(row: &[GalleryCell; 2], cache: &ImageCache) -> f64 {
    let tallest = row
        .iter()
        .filter_map(|cell| match cell {
            GalleryCell::Image { url, caption } => cache.get(url).map(|image| {
                let (_, height) = fitted_size_mm(
                    image.width(),
                    image.height(),
                    GALLERY_IMAGE_WIDTH_MM,
                    GALLERY_IMAGE_HEIGHT_MM,
                );
                height + text_height(caption, CONTENT_WIDTH_MM / 2.0)
            }),
            GalleryCell::Filler => None,
        })
        .fold(LINE_HEIGHT_MM, f64::max);
    tallest + 3.0 * CELL_PADDING_MM
}

fn letterhead_height(letterhead: &Letterhead) -> f64 {
    let lines = 6 + letterhead.addressee.len();
    lines as f64 * LINE_HEIGHT_MM
        + text_height(&letterhead.subject, CONTENT_WIDTH_MM)
        + 6.0 * PARAGRAPH_GAP_MM
}

/// Estimated height of a whole block.
pub fn block_height(block: &Block, cache: &ImageCache) -> f64 {
    match block {
        Block::Subheading(text) => SUBHEADING_MM.max(text_height(text, CONTENT_WIDTH_MM)),
        Block::Paragraph(paragraph) => {
            text_height(&paragraph.text(), CONTENT_WIDTH_MM) + PARAGRAPH_GAP_MM
        }
        Block::Table(table) => {
            table.caption().map_or(0.0, |_| CAPTION_ROW_MM)
                + table.rows().iter().map(row_height).sum::<f64>()
                + PARAGRAPH_GAP_MM
        }
        Block::NumberedList(items) => {
            items
                .iter()
                .map(|item| text_height(item, CONTENT_WIDTH_MM - 8.0))
                .sum::<f64>()
                + PARAGRAPH_GAP_MM
        }
        Block::Checklist(items) => {
            (items.len() + 1) as f64 * (LINE_HEIGHT_MM + 2.0 * CELL_PADDING_MM) + PARAGRAPH_GAP_MM
        }
        Block::Statement(statement) => {
            SUBHEADING_MM + text_height(&statement.text, CONTENT_WIDTH_MM) + PARAGRAPH_GAP_MM
        }
        Block::Gallery(gallery) => {
            SUBHEADING_MM
                + gallery
                    .rows()
                    .iter()
                    .map(|row| gallery_row_height(row, cache))
                    .sum::<f64>()
        }
        Block::Signature(_) => SIGNATURE_MM,
        Block::PageBreak => 0.0,
    }
}

/// Height a block needs on the page where it starts: its first row for
/// tables and galleries, the whole block otherwise.
fn leading_height(block: &Block, cache: &ImageCache) -> f64 {
    match block {
        Block::Table(table) => {
            table.caption().map_or(0.0, |_| CAPTION_ROW_MM)
                + table.rows().first().map_or(0.0, row_height)
        }
        Block::Gallery(gallery) => {
            SUBHEADING_MM
                + gallery
                    .rows()
                    .first()
                    .map_or(0.0, |row| gallery_row_height(row, cache))
        }
        other => block_height(other, cache).min(PLANNED_HEIGHT_MM),
    }
}

struct Planner<'a, 'c> {
    cache: &'c ImageCache,
    cancel: &'c CancellationToken,
    cursor: f64,
    placements: Vec<Placement<'a>>,
}

impl<'a, 'c> Planner<'a, 'c> {
    fn remaining(&self) -> f64 {
        PLANNED_HEIGHT_MM - self.cursor
    }

    fn break_page(&mut self) -> Result<(), ReportError> {
        if self.cancel.is_cancelled() {
            return Err(ReportError::Cancelled);
        }
        if self.cursor > 0.0 {
            self.placements.push(Placement::PageBreak);
            self.cursor = 0.0;
        }
        Ok(())
    }

    /// Starts a new page unless `height` still fits on the current one.
    fn ensure_room(&mut self, height: f64) -> Result<(), ReportError> {
        if height > self.remaining() {
            self.break_page()?;
        }
        Ok(())
    }

    fn place(&mut self, placement: Placement<'a>, height: f64) {
        self.placements.push(placement);
        self.cursor += height;
        // Oversized blocks flow onto following pages on their own.
        while self.cursor > PLANNED_HEIGHT_MM {
            self.cursor -= PLANNED_HEIGHT_MM;
        }
    }

    fn table(&mut self, table: &'a Table) -> Result<(), ReportError> {
        let caption = table.caption().map_or(0.0, |_| CAPTION_ROW_MM);
        let mut start = 0;
        let mut used = caption;
        for (index, row) in table.rows().iter().enumerate() {
            let height = row_height(row);
            if index > start && used + height > self.remaining() {
                self.place(Placement::TableRows { table, rows: start..index }, used);
                self.break_page()?;
                start = index;
                used = 0.0;
            }
            used += height;
        }
        self.place(
            Placement::TableRows {
                table,
                rows: start..table.rows().len(),
            },
            used + PARAGRAPH_GAP_MM,
        );
        Ok(())
    }

    fn gallery(&mut self, gallery: &'a Gallery) -> Result<(), ReportError> {
        let mut start = 0;
        let mut used = SUBHEADING_MM;
        for (index, row) in gallery.rows().iter().enumerate() {
            let height = gallery_row_height(row, self.cache);
            if index > start && used + height > self.remaining() {
                self.place(Placement::GalleryRows { gallery, rows: start..index }, used);
                self.break_page()?;
                start = index;
                used = 0.0;
            }
            used += height;
        }
        self.place(
            Placement::GalleryRows {
                gallery,
                rows: start..gallery.rows().len(),
            },
            used,
        );
        Ok(())
    }

    fn block(&mut self, block: &'a Block, next: Option<&'a Block>) -> Result<(), ReportError> {
        match block {
            Block::PageBreak => self.break_page(),
            Block::Table(table) => {
                self.ensure_room(leading_height(block, self.cache))?;
                self.table(table)
            }
            Block::Gallery(gallery) => {
                self.ensure_room(leading_height(block, self.cache))?;
                self.gallery(gallery)
            }
            Block::Subheading(_) => {
                let height = block_height(block, self.cache);
                let following = next.map_or(0.0, |next| leading_height(next, self.cache));
                self.ensure_room(height + following)?;
                self.place(Placement::Block(block), height);
                Ok(())
            }
            other => {
                let height = block_height(other, self.cache);
                self.ensure_room(height.min(PLANNED_HEIGHT_MM))?;
                self.place(Placement::Block(other), height);
                Ok(())
            }
        }
    }
}

/// Plans the pages of `document`.
///
/// Fails with [`ReportError::Cancelled`] when `cancel` fires before a page
/// break decision.
pub fn plan<'a>(
    document: &'a ReportDocument,
    cache: &ImageCache,
    cancel: &CancellationToken,
) -> Result<Vec<Placement<'a>>, ReportError> {
    let mut planner = Planner {
        cache,
        cancel,
        cursor: 0.0,
        placements: Vec::new(),
    };

    let letterhead = document.letterhead();
    planner.place(Placement::Letterhead(letterhead), letterhead_height(letterhead));

    for section in document.sections() {
        let mut blocks = section.blocks();
        if let Some((Block::PageBreak, rest)) = blocks.split_first() {
            planner.break_page()?;
            blocks = rest;
        }

        let first = blocks
            .iter()
            .find(|block| !matches!(block, Block::PageBreak))
            .map_or(0.0, |block| leading_height(block, cache));
        planner.ensure_room(SECTION_TITLE_MM + first)?;
        planner.place(Placement::SectionTitle(section.title()), SECTION_TITLE_MM);

        for (index, block) in blocks.iter().enumerate() {
            planner.block(block, blocks.get(index + 1))?;
        }
    }

    Ok(planner.placements)
}

/// Number of pages the plan starts; used by tests and diagnostics.
pub fn planned_pages(placements: &[Placement<'_>]) -> usize {
    1 + placements
        .iter()
        .filter(|placement| matches!(placement, Placement::PageBreak))
        .count()
}
