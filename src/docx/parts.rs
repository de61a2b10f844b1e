//! Package parts around the document body.

use chrono::NaiveDate;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::error::ReportError;

pub const NS_W: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
pub const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
pub const NS_WP: &str = "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";
pub const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
pub const NS_PIC: &str = "http://schemas.openxmlformats.org/drawingml/2006/picture";

const NS_CONTENT_TYPES: &str = "http://schemas.openxmlformats.org/package/2006/content-types";
const NS_PACKAGE_RELS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const REL_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
const REL_CORE_PROPERTIES: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties";
const REL_STYLES: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";
const REL_FOOTER: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/footer";
const REL_IMAGE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

/// Relationship id of the styles part inside `word/_rels/document.xml.rels`.
pub const STYLES_REL_ID: &str = "rId1";
/// Relationship id of the footer part.
pub const FOOTER_REL_ID: &str = "rId2";
/// Image relationships are numbered from here on.
pub const FIRST_IMAGE_REL: usize = 3;

pub fn image_rel_id(number: usize) -> String {
    format!("rId{}", FIRST_IMAGE_REL + number - 1)
}

pub fn media_name(number: usize) -> String {
    format!("image{number}.jpeg")
}

fn writer() -> Result<Writer<Vec<u8>>, ReportError> {
    let mut writer = Writer::new(Vec::new());
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
    Ok(writer)
}

fn empty(writer: &mut Writer<Vec<u8>>, name: &str, attributes: &[(&str, &str)]) -> Result<(), ReportError> {
    let element = BytesStart::new(name).with_attributes(attributes.iter().copied());
    writer.write_event(Event::Empty(element))?;
    Ok(())
}

fn text_element(writer: &mut Writer<Vec<u8>>, name: &str, attributes: &[(&str, &str)], text: &str) -> Result<(), ReportError> {
    writer.write_event(Event::Start(
        BytesStart::new(name).with_attributes(attributes.iter().copied()),
    ))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// `[Content_Types].xml`.
pub fn content_types() -> Result<Vec<u8>, ReportError> {
    let mut writer = writer()?;
    writer.write_event(Event::Start(
        BytesStart::new("Types").with_attributes([("xmlns", NS_CONTENT_TYPES)]),
    ))?;
    empty(&mut writer, "Default", &[
        ("Extension", "rels"),
        ("ContentType", "application/vnd.openxmlformats-package.relationships+xml"),
    ])?;
    empty(&mut writer, "Default", &[("Extension", "xml"), ("ContentType", "application/xml")])?;
    empty(&mut writer, "Default", &[("Extension", "jpeg"), ("ContentType", "image/jpeg")])?;
    for (part, content_type) in [
        (
            "/word/document.xml",
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml",
        ),
        (
            "/word/styles.xml",
            "application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml",
        ),
        (
            "/word/footer1.xml",
            "application/vnd.openxmlformats-officedocument.wordprocessingml.footer+xml",
        ),
        (
            "/docProps/core.xml",
            "application/vnd.openxmlformats-package.core-properties+xml",
        ),
    ] {
        empty(&mut writer, "Override", &[("PartName", part), ("ContentType", content_type)])?;
    }
    writer.write_event(Event::End(BytesEnd::new("Types")))?;
    Ok(writer.into_inner())
}

/// `_rels/.rels`.
pub fn package_relationships() -> Result<Vec<u8>, ReportError> {
    let mut writer = writer()?;
    writer.write_event(Event::Start(
        BytesStart::new("Relationships").with_attributes([("xmlns", NS_PACKAGE_RELS)]),
    ))?;
    empty(&mut writer, "Relationship", &[
        ("Id", "rId1"),
        ("Type", REL_OFFICE_DOCUMENT),
        ("Target", "word/document.xml"),
    ])?;
    empty(&mut writer, "Relationship", &[
        ("Id", "rId2"),
        ("Type", REL_CORE_PROPERTIES),
        ("Target", "docProps/core.xml"),
    ])?;
    writer.write_event(Event::End(BytesEnd::new("Relationships")))?;
    Ok(writer.into_inner())
}

/// `word/_rels/document.xml.rels` for a body embedding `media_count` images.
pub fn document_relationships(media_count: usize) -> Result<Vec<u8>, ReportError> {
    let mut writer = writer()?;
    writer.write_event(Event::Start(
        BytesStart::new("Relationships").with_attributes([("xmlns", NS_PACKAGE_RELS)]),
    ))?;
    empty(&mut writer, "Relationship", &[
        ("Id", STYLES_REL_ID),
        ("Type", REL_STYLES),
        ("Target", "styles.xml"),
    ])?;
    empty(&mut writer, "Relationship", &[
        ("Id", FOOTER_REL_ID),
        ("Type", REL_FOOTER),
        ("Target", "footer1.xml"),
    ])?;
    for number in 1..=media_count {
        let id = image_rel_id(number);
        let target = format!("media/{}", media_name(number));
        empty(&mut writer, "Relationship", &[
            ("Id", id.as_str()),
            ("Type", REL_IMAGE),
            ("Target", target.as_str()),
        ])?;
    }
    writer.write_event(Event::End(BytesEnd::new("Relationships")))?;
    Ok(writer.into_inner())
}

/// `docProps/core.xml`, dated with the report date.
pub fn core_properties(title: &str, date: NaiveDate, creator: &str) -> Result<Vec<u8>, ReportError> {
    let stamp = format!("{}T00:00:00Z", date.format("%Y-%m-%d"));
    let mut writer = writer()?;
    writer.write_event(Event::Start(BytesStart::new("cp:coreProperties").with_attributes([
        (
            "xmlns:cp",
            "http://schemas.openxmlformats.org/package/2006/metadata/core-properties",
        ),
        ("xmlns:dc", "http://purl.org/dc/elements/1.1/"),
        ("xmlns:dcterms", "http://purl.org/dc/terms/"),
        ("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance"),
    ])))?;
    text_element(&mut writer, "dc:title", &[], title)?;
    text_element(&mut writer, "dc:creator", &[], creator)?;
    for name in ["dcterms:created", "dcterms:modified"] {
        text_element(&mut writer, name, &[("xsi:type", "dcterms:W3CDTF")], &stamp)?;
    }
    writer.write_event(Event::End(BytesEnd::new("cp:coreProperties")))?;
    Ok(writer.into_inner())
}

/// `word/footer1.xml`: a centred "Page X of Y" line built from fields.
pub fn footer() -> Result<Vec<u8>, ReportError> {
    let mut writer = writer()?;
    writer.write_event(Event::Start(
        BytesStart::new("w:ftr").with_attributes([("xmlns:w", NS_W)]),
    ))?;
    writer.write_event(Event::Start(BytesStart::new("w:p")))?;
    writer.write_event(Event::Start(BytesStart::new("w:pPr")))?;
    empty(&mut writer, "w:jc", &[("w:val", "center")])?;
    writer.write_event(Event::End(BytesEnd::new("w:pPr")))?;

    let run = |writer: &mut Writer<Vec<u8>>, text: &str| -> Result<(), ReportError> {
        writer.write_event(Event::Start(BytesStart::new("w:r")))?;
        writer.write_event(Event::Start(BytesStart::new("w:rPr")))?;
        empty(writer, "w:sz", &[("w:val", "16")])?;
        writer.write_event(Event::End(BytesEnd::new("w:rPr")))?;
        text_element(writer, "w:t", &[("xml:space", "preserve")], text)?;
        writer.write_event(Event::End(BytesEnd::new("w:r")))?;
        Ok(())
    };

    run(&mut writer, "Page ")?;
    for (field, placeholder, trailer) in [(" PAGE ", "1", Some(" of ")), (" NUMPAGES ", "1", None)] {
        writer.write_event(Event::Start(
            BytesStart::new("w:fldSimple").with_attributes([("w:instr", field)]),
        ))?;
        run(&mut writer, placeholder)?;
        writer.write_event(Event::End(BytesEnd::new("w:fldSimple")))?;
        if let Some(trailer) = trailer {
            run(&mut writer, trailer)?;
        }
    }

    writer.write_event(Event::End(BytesEnd::new("w:p")))?;
    writer.write_event(Event::End(BytesEnd::new("w:ftr")))?;
    Ok(writer.into_inner())
}

/// `word/styles.xml`.
pub const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:docDefaults>
    <w:rPrDefault><w:rPr><w:rFonts w:ascii="Liberation Sans" w:hAnsi="Liberation Sans" w:cs="Liberation Sans"/><w:sz w:val="20"/><w:szCs w:val="20"/></w:rPr></w:rPrDefault>
    <w:pPrDefault><w:pPr><w:spacing w:after="60" w:line="264" w:lineRule="auto"/></w:pPr></w:pPrDefault>
  </w:docDefaults>
  <w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/></w:style>
  <w:style w:type="paragraph" w:styleId="Title"><w:name w:val="Title"/><w:basedOn w:val="Normal"/><w:pPr><w:jc w:val="center"/><w:spacing w:before="120" w:after="120"/></w:pPr><w:rPr><w:b/><w:u w:val="single"/><w:sz w:val="26"/></w:rPr></w:style>
  <w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:pPr><w:keepNext/><w:spacing w:before="240" w:after="120"/><w:outlineLvl w:val="0"/></w:pPr><w:rPr><w:b/><w:caps/><w:color w:val="1F3864"/><w:sz w:val="24"/></w:rPr></w:style>
  <w:style w:type="paragraph" w:styleId="Heading2"><w:name w:val="heading 2"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:pPr><w:keepNext/><w:spacing w:before="120" w:after="60"/><w:outlineLvl w:val="1"/></w:pPr><w:rPr><w:b/><w:sz w:val="22"/></w:rPr></w:style>
  <w:style w:type="paragraph" w:styleId="Caption"><w:name w:val="caption"/><w:basedOn w:val="Normal"/><w:pPr><w:jc w:val="center"/></w:pPr><w:rPr><w:i/><w:sz w:val="18"/></w:rPr></w:style>
  <w:style w:type="table" w:styleId="ReportTable"><w:name w:val="Report Table"/><w:tblPr><w:tblBorders><w:top w:val="single" w:sz="4" w:space="0" w:color="808080"/><w:left w:val="single" w:sz="4" w:space="0" w:color="808080"/><w:bottom w:val="single" w:sz="4" w:space="0" w:color="808080"/><w:right w:val="single" w:sz="4" w:space="0" w:color="808080"/><w:insideH w:val="single" w:sz="4" w:space="0" w:color="808080"/><w:insideV w:val="single" w:sz="4" w:space="0" w:color="808080"/></w:tblBorders><w:tblCellMar><w:left w:w="100" w:type="dxa"/><w:right w:w="100" w:type="dxa"/></w:tblCellMar></w:tblPr></w:style>
</w:styles>
"#;
