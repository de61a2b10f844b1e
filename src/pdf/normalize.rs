//! `lopdf` post-processing of rendered PDFs.
//!
//! `printpdf` stamps every file with the wall-clock time and a random document
//! id, and allocates some object numbers from hash-map iteration order.
//! [`normalize`] rewrites the file so the same report always yields the same
//! bytes: fixed dates and producer, objects renumbered in a canonical order,
//! dictionary keys sorted and an `/ID` derived from the content.

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;
use lopdf::{Dictionary, Document, Object, ObjectId, StringFormat};
use sha2::{Digest, Sha256};

use crate::error::ReportError;

/// Producer string written into every report.
pub const PRODUCER: &str = concat!("claim_report ", env!("CARGO_PKG_VERSION"));

/// Number of pages in a rendered PDF.
pub fn page_count(bytes: &[u8]) -> Result<usize, ReportError> {
    Ok(Document::load_mem(bytes)?.get_pages().len())
}

/// PDF date string for midnight UTC of `date`.
pub fn pdf_date(date: NaiveDate) -> String {
    format!("D:{}000000Z", date.format("%Y%m%d"))
}

/// Rewrites `bytes` into the canonical form described in the module docs.
pub fn normalize(bytes: &[u8], title: &str, date: NaiveDate) -> Result<Vec<u8>, ReportError> {
    let mut document = Document::load_mem(bytes)?;

    strip_catalog_metadata(&mut document)?;
    set_info(&mut document, title, date);
    document.trailer.remove(b"ID");
    canonicalize(&mut document);

    let mut unidentified = Vec::new();
    document.save_to(&mut unidentified)?;
    let digest = Sha256::digest(&unidentified);
    let id = Object::String(digest[..16].to_vec(), StringFormat::Hexadecimal);
    document.trailer.set("ID", Object::Array(vec![id.clone(), id]));

    let mut output = Vec::with_capacity(unidentified.len() + 64);
    document.save_to(&mut output)?;
    Ok(output)
}

fn strip_catalog_metadata(document: &mut Document) -> Result<(), ReportError> {
    let catalog_id = document.trailer.get(b"Root")?.as_reference()?;
    let catalog = document.get_object_mut(catalog_id)?.as_dict_mut()?;
    catalog.remove(b"Metadata");
    Ok(())
}

fn set_info(document: &mut Document, title: &str, date: NaiveDate) {
    let stamp = pdf_date(date);
    let mut info = Dictionary::new();
    info.set("Title", Object::string_literal(title));
    info.set("Producer", Object::string_literal(PRODUCER));
    info.set("CreationDate", Object::string_literal(stamp.as_str()));
    info.set("ModDate", Object::string_literal(stamp.as_str()));

    // The old info object becomes unreachable and is dropped by `canonicalize`.
    let info_id = document.add_object(Object::Dictionary(info));
    document.trailer.set("Info", Object::Reference(info_id));
}

/// Renumbers reachable objects in depth-first order from the trailer, visiting
/// dictionary entries by sorted key, and drops everything unreachable.
fn canonicalize(document: &mut Document) {
    let mut order = Vec::new();
    let mut seen = HashSet::new();
    let trailer = Object::Dictionary(document.trailer.clone());
    visit(&trailer, &document.objects, &mut seen, &mut order);

    let renumbered: BTreeMap<ObjectId, ObjectId> = order
        .iter()
        .enumerate()
        .map(|(index, id)| (*id, (index as u32 + 1, 0)))
        .collect();

    let mut objects = BTreeMap::new();
    for id in &order {
        if let Some(object) = document.objects.get(id) {
            objects.insert(renumbered[id], rewrite(object, &renumbered));
        }
    }

    if let Object::Dictionary(trailer) = rewrite(&trailer, &renumbered) {
        document.trailer = trailer;
    }
    document.objects = objects;
    document.max_id = order.len() as u32;
}

fn sorted_entries(dictionary: &Dictionary) -> Vec<(&Vec<u8>, &Object)> {
    let mut entries: Vec<_> = dictionary.iter().collect();
    entries.sort_by(|(a, _), (b, _)| a.cmp(b));
    entries
}

fn visit(
    object: &Object,
    objects: &BTreeMap<ObjectId, Object>,
    seen: &mut HashSet<ObjectId>,
    order: &mut Vec<ObjectId>,
) {
    match object {
        Object::Reference(id) => {
            if seen.insert(*id) {
                if let Some(target) = objects.get(id) {
                    order.push(*id);
                    visit(target, objects, seen, order);
                }
            }
        }
        Object::Array(items) => {
            for item in items {
                visit(item, objects, seen, order);
            }
        }
        Object::Dictionary(dictionary) => {
            for (_, value) in sorted_entries(dictionary) {
                visit(value, objects, seen, order);
            }
        }
        Object::Stream(stream) => {
            for (_, value) in sorted_entries(&stream.dict) {
                visit(value, objects, seen, order);
            }
        }
        _ => {}
    }
}

fn rewrite_dictionary(dictionary: &Dictionary, map: &BTreeMap<ObjectId, ObjectId>) -> Dictionary {
    let mut rewritten = Dictionary::new();
    for (key, value) in sorted_entries(dictionary) {
        rewritten.set(key.clone(), rewrite(value, map));
    }
    rewritten
}

fn rewrite(object: &Object, map: &BTreeMap<ObjectId, ObjectId>) -> Object {
    match object {
        Object::Reference(id) => map
            .get(id)
            .map_or(Object::Null, |new_id| Object::Reference(*new_id)),
        Object::Array(items) => Object::Array(items.iter().map(|item| rewrite(item, map)).collect()),
        Object::Dictionary(dictionary) => Object::Dictionary(rewrite_dictionary(dictionary, map)),
        Object::Stream(stream) => {
            let mut stream = stream.clone();
            stream.dict = rewrite_dictionary(&stream.dict, map);
            Object::Stream(stream)
        }
        other => other.clone(),
    }
}
