//! PDF back end.
//!
//! Rendering is two-pass: the first pass only counts pages so the footer of
//! the second can print "Page X of Y". Page breaks come from [`paginate::plan`];
//! the result is normalised with `lopdf` so identical inputs give identical
//! bytes.

pub mod builder;
pub mod elements;
pub mod fonts;
pub mod normalize;
pub mod paginate;

use chrono::NaiveDate;
use genpdf::elements::{
    Break, FrameCellDecorator, LinearLayout, OrderedList, PageBreak, Paragraph, TableLayout,
};
use genpdf::style::{Style, StyledString};
use genpdf::{Alignment, Element, Margins};
use log::{debug, info, warn};
use tokio_util::sync::CancellationToken;

use crate::config::ReportConfig;
use crate::error::ReportError;
use crate::images::ImageCache;
use crate::model::{
    Block, ChecklistItem, Gallery, GalleryCell, Letterhead, ReportDocument, RichParagraph,
    SignatureBlock, Statement, TableRow,
};
use crate::richtext::{Span, StyledSpan, HEADING_COLOR};

use builder::DocumentBuilder;
use elements::{alignment, mm_from_f64, CaptionedImage, UnderlinedText};
use paginate::{
    Placement, FOOTER_HEIGHT_MM, GALLERY_IMAGE_HEIGHT_MM, GALLERY_IMAGE_WIDTH_MM,
    LABEL_COLUMN_WEIGHT, MARGIN_MM, VALUE_COLUMN_WEIGHT,
};

const BODY_FONT_SIZE: u8 = 10;

/// Renders `document` to PDF bytes.
pub fn render_pdf(
    document: &ReportDocument,
    cache: &ImageCache,
    config: &ReportConfig,
    report_date: NaiveDate,
    cancel: &CancellationToken,
) -> Result<Vec<u8>, ReportError> {
    let family = fonts::font_family(config.fonts_dir.as_deref())?;
    let placements = paginate::plan(document, cache, cancel)?;
    debug!(
        "Planned {} placements over {} pages",
        placements.len(),
        paginate::planned_pages(&placements)
    );

    let draft = render_pass(document, &placements, cache, family.clone(), None)?;
    let total = normalize::page_count(&draft)?;
    if cancel.is_cancelled() {
        return Err(ReportError::Cancelled);
    }

    let rendered = render_pass(document, &placements, cache, family, Some(total))?;
    let title = document.letterhead().title.clone();
    let bytes = normalize::normalize(&rendered, &title, report_date)?;
    info!("Rendered PDF with {total} pages ({} bytes)", bytes.len());
    Ok(bytes)
}

fn render_pass(
    document: &ReportDocument,
    placements: &[Placement<'_>],
    cache: &ImageCache,
    family: genpdf::fonts::FontFamily<genpdf::fonts::FontData>,
    total_pages: Option<usize>,
) -> Result<Vec<u8>, ReportError> {
    let mut pdf = DocumentBuilder::new(family)
        .with_title(document.letterhead().title.clone())
        .with_paper_size(genpdf::PaperSize::A4)
        .with_margins(Margins::all(mm_from_f64(MARGIN_MM)))
        .with_font_size(BODY_FONT_SIZE)
        .with_line_spacing(1.15)
        .with_footer(mm_from_f64(FOOTER_HEIGHT_MM), move |page| {
            Paragraph::new(footer_text(page, total_pages))
                .aligned(Alignment::Center)
                .styled(Style::new().with_font_size(8))
        })
        .build();

    for placement in placements {
        push_placement(&mut pdf, placement, cache)?;
    }

    let mut bytes = Vec::new();
    pdf.render(&mut bytes)?;
    Ok(bytes)
}

/// Footer line; the draft pass has no total yet and counts the page itself.
fn footer_text(page: usize, total_pages: Option<usize>) -> String {
    format!("Page {page} of {}", total_pages.unwrap_or(page))
}

fn push_placement(
    pdf: &mut genpdf::Document,
    placement: &Placement<'_>,
    cache: &ImageCache,
) -> Result<(), ReportError> {
    match placement {
        Placement::Letterhead(letterhead) => pdf.push(letterhead_element(letterhead)?),
        Placement::SectionTitle(title) => pdf.push(
            Paragraph::new(StyledString::new(
                title.to_uppercase(),
                Style::new().bold().with_font_size(12).with_color(HEADING_COLOR),
            ))
            .padded(Margins::trbl(4, 0, 3, 0)),
        ),
        Placement::Block(block) => push_block(pdf, block, cache)?,
        Placement::TableRows { table, rows } => {
            if rows.start == 0 {
                if let Some(caption) = table.caption() {
                    pdf.push(subheading(caption));
                }
            }
            pdf.push(table_element(&table.rows()[rows.clone()])?);
            pdf.push(Break::new(0.5));
        }
        Placement::GalleryRows { gallery, rows } => {
            if rows.start == 0 {
                pdf.push(subheading(gallery.title()));
            }
            pdf.push(gallery_element(gallery, rows.clone(), cache)?);
        }
        Placement::PageBreak => pdf.push(PageBreak::new()),
    }
    Ok(())
}

fn push_block(
    pdf: &mut genpdf::Document,
    block: &Block,
    cache: &ImageCache,
) -> Result<(), ReportError> {
    match block {
        Block::Subheading(text) => pdf.push(subheading(text)),
        Block::Paragraph(paragraph) => {
            pdf.push(rich_paragraph(paragraph).padded(Margins::trbl(0, 0, 2, 0)))
        }
        Block::Table(table) => {
            if let Some(caption) = table.caption() {
                pdf.push(subheading(caption));
            }
            pdf.push(table_element(table.rows())?);
        }
        Block::NumberedList(items) => {
            let mut list = OrderedList::new();
            for item in items {
                list.push(Paragraph::new(item.as_str()));
            }
            pdf.push(list.padded(Margins::trbl(0, 0, 2, 0)));
        }
        Block::Checklist(items) => pdf.push(checklist_element(items)?),
        Block::Statement(statement) => pdf.push(statement_element(statement)),
        Block::Gallery(gallery) => {
            pdf.push(subheading(gallery.title()));
            pdf.push(gallery_element(gallery, 0..gallery.rows().len(), cache)?);
        }
        Block::Signature(signature) => pdf.push(signature_element(signature)),
        Block::PageBreak => pdf.push(PageBreak::new()),
    }
    Ok(())
}

fn subheading(text: &str) -> impl Element {
    Paragraph::new(StyledString::new(
        text.to_owned(),
        Style::new().bold().with_font_size(11),
    ))
    .padded(Margins::trbl(2, 0, 1, 0))
}

fn rich_paragraph(paragraph: &RichParagraph) -> Paragraph {
    let mut element = Paragraph::default();
    for span in paragraph.spans() {
        element.push(span.to_styled_string());
    }
    element.aligned(alignment(paragraph.alignment()))
}

fn bold(text: &str) -> Paragraph {
    Paragraph::new(StyledString::new(text.to_owned(), Style::new().bold()))
}

fn cell(element: impl Element + 'static) -> impl Element {
    element.padded(Margins::trbl(1, 2, 1, 2))
}

/// Splits rows into runs of label/value rows and full-width statement rows,
/// one `genpdf` table per run.
fn table_element(rows: &[TableRow]) -> Result<LinearLayout, ReportError> {
    let mut elements = LinearLayout::vertical();
    let mut labelled: Option<TableLayout> = None;

    for row in rows {
        match row {
            TableRow::Pair { label, value } => {
                let table = labelled.get_or_insert_with(label_value_table);
                table
                    .row()
                    .element(cell(bold(label)))
                    .element(cell(Paragraph::new(value.as_str())))
                    .push()?;
            }
            TableRow::Split { label, left, right } => {
                let mut split = TableLayout::new(vec![1, 1]);
                split.set_cell_decorator(FrameCellDecorator::new(true, false, false));
                split
                    .row()
                    .element(cell(Paragraph::new(format!("{}: {}", left.label, left.value))))
                    .element(cell(Paragraph::new(format!("{}: {}", right.label, right.value))))
                    .push()?;
                let table = labelled.get_or_insert_with(label_value_table);
                table.row().element(cell(bold(label))).element(split).push()?;
            }
            TableRow::Statement { label, text } => {
                if let Some(table) = labelled.take() {
                    elements.push(table);
                }
                let mut statement = TableLayout::new(vec![1]);
                statement.set_cell_decorator(FrameCellDecorator::new(true, true, false));
                let mut content = LinearLayout::vertical();
                content.push(bold(label));
                content.push(Paragraph::new(text.as_str()));
                statement.row().element(cell(content)).push()?;
                elements.push(statement);
            }
        }
    }

    if let Some(table) = labelled {
        elements.push(table);
    }
    Ok(elements)
}

fn label_value_table() -> TableLayout {
    let mut table = TableLayout::new(vec![LABEL_COLUMN_WEIGHT, VALUE_COLUMN_WEIGHT]);
    table.set_cell_decorator(FrameCellDecorator::new(true, true, false));
    table
}

fn gallery_element(
    gallery: &Gallery,
    rows: std::ops::Range<usize>,
    cache: &ImageCache,
) -> Result<TableLayout, ReportError> {
    let mut table = TableLayout::new(vec![1, 1]);
    table.set_cell_decorator(FrameCellDecorator::new(true, true, false));

    for row in &gallery.rows()[rows] {
        let mut table_row = table.row();
        for gallery_cell in row {
            table_row = match gallery_cell {
                GalleryCell::Image { url, caption } => match cache.get(url) {
                    Some(image) => {
                        let caption = Paragraph::new(StyledString::new(
                            caption.clone(),
                            Style::new().italic().with_font_size(9),
                        ));
                        let element = CaptionedImage::from_embedded(image, caption)?
                            .with_alignment(Alignment::Center)
                            .with_bounds(GALLERY_IMAGE_WIDTH_MM, GALLERY_IMAGE_HEIGHT_MM);
                        table_row.element(element.padded(Margins::all(2)))
                    }
                    None => {
                        warn!("Image {url} vanished from the cache; leaving its cell empty");
                        table_row.element(Paragraph::new(""))
                    }
                },
                GalleryCell::Filler => table_row.element(Paragraph::new("")),
            };
        }
        table_row.push()?;
    }
    Ok(table)
}

fn checklist_element(items: &[ChecklistItem]) -> Result<TableLayout, ReportError> {
    let mut table = TableLayout::new(vec![4, 1]);
    table.set_cell_decorator(FrameCellDecorator::new(true, true, false));
    table
        .row()
        .element(cell(bold("Document")))
        .element(cell(bold("Enclosed").aligned(Alignment::Center)))
        .push()?;
    for item in items {
        table
            .row()
            .element(cell(Paragraph::new(item.label.as_str())))
            .element(cell(
                Paragraph::new(if item.enclosed { "Yes" } else { "No" }).aligned(Alignment::Center),
            ))
            .push()?;
    }
    Ok(table)
}

fn statement_element(statement: &Statement) -> impl Element {
    let mut layout = LinearLayout::vertical();
    layout.push(bold(&statement.heading).padded(Margins::trbl(2, 0, 1, 0)));
    layout.push(Paragraph::new(statement.text.as_str()));
    layout.padded(Margins::trbl(0, 0, 2, 0))
}

fn signature_element(signature: &SignatureBlock) -> impl Element {
    let mut layout = LinearLayout::vertical();
    layout.push(Break::new(1.5));
    layout.push(bold(&format!("For {}", signature.agency)));
    layout.push(Break::new(2.0));
    layout.push(Paragraph::new(format!("({})", signature.investigator)));
    layout.push(Paragraph::new(signature.designation.as_str()));
    layout.push(Paragraph::new(format!("Place: {}", signature.place)));
    layout.push(Paragraph::new(format!("Date: {}", signature.date)));
    layout
}

fn letterhead_element(letterhead: &Letterhead) -> Result<LinearLayout, ReportError> {
    let mut layout = LinearLayout::vertical();
    layout.push(
        Paragraph::new(StyledString::new(
            letterhead.agency_name.clone(),
            Style::new().bold().with_font_size(16).with_color(HEADING_COLOR),
        ))
        .aligned(Alignment::Center),
    );
    for line in [&letterhead.agency_address, &letterhead.agency_contact] {
        if !line.trim().is_empty() {
            layout.push(Paragraph::new(line.as_str()).aligned(Alignment::Center));
        }
    }
    layout.push(Break::new(1.0));

    let title = Span::new(letterhead.title.to_uppercase()).bold().underline();
    layout.push(
        UnderlinedText::new(vec![StyledSpan::from(&title)])
            .with_alignment(Alignment::Center)
            .styled(Style::new().with_font_size(13)),
    );
    layout.push(Break::new(1.0));

    let mut reference = TableLayout::new(vec![1, 1]);
    reference
        .row()
        .element(Paragraph::new(format!("Ref. No.: {}", letterhead.reference)))
        .element(Paragraph::new(format!("Date: {}", letterhead.date)).aligned(Alignment::Right))
        .push()?;
    layout.push(reference);
    layout.push(Break::new(1.0));

    for line in &letterhead.addressee {
        layout.push(Paragraph::new(line.as_str()));
    }
    layout.push(Break::new(1.0));

    let mut subject = Paragraph::default();
    subject.push(StyledString::new("Subject: ", Style::new().bold()));
    subject.push(letterhead.subject.as_str());
    layout.push(subject);
    layout.push(Break::new(1.0));
    Ok(layout)
}
