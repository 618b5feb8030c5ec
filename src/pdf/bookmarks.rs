use anyhow::{Context, Result};
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::{HashMap, HashSet};

use super::decode_text_string;

/// One bookmark of an existing outline, flattened in display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bookmark {
    pub level: u32,
    pub title: String,
    /// 1-based page, when the destination resolves to a page of this document
    pub page: Option<u32>,
}

/// Read the bookmark tree of `doc` in display order.
pub fn read_bookmarks(doc: &Document) -> Result<Vec<Bookmark>> {
    let catalog = doc
        .catalog()
        .with_context(|| "Failed to get document catalog")?;

    let Some(outlines) = catalog
        .get(b"Outlines")
        .ok()
        .and_then(|obj| resolve_dict(doc, obj))
    else {
        return Ok(Vec::new());
    };

    let Ok(Object::Reference(first)) = outlines.get(b"First") else {
        return Ok(Vec::new());
    };

    let page_numbers: HashMap<ObjectId, u32> = doc
        .get_pages()
        .into_iter()
        .map(|(num, id)| (id, num))
        .collect();

    let mut bookmarks = Vec::new();
    let mut visited = HashSet::new();
    // Depth-first: a node's children are shown before its next sibling
    let mut pending = vec![(*first, 0u32)];

    while let Some((id, level)) = pending.pop() {
        if !visited.insert(id) {
            continue;
        }
        let Ok(item) = doc.get_dictionary(id) else {
            continue;
        };

        let title = match item.get(b"Title") {
            Ok(Object::String(bytes, _)) => decode_text_string(bytes),
            _ => "Untitled".to_string(),
        };

        bookmarks.push(Bookmark {
            level,
            title,
            page: destination_page(doc, item, &page_numbers),
        });

        if let Ok(Object::Reference(next)) = item.get(b"Next") {
            pending.push((*next, level));
        }
        if let Ok(Object::Reference(child)) = item.get(b"First") {
            pending.push((*child, level + 1));
        }
    }

    Ok(bookmarks)
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Object> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

fn resolve_dict<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Dictionary> {
    resolve(doc, obj)?.as_dict().ok()
}

fn destination_page(
    doc: &Document,
    item: &Dictionary,
    page_numbers: &HashMap<ObjectId, u32>,
) -> Option<u32> {
    if let Ok(dest) = item.get(b"Dest") {
        return resolve_destination(doc, dest, page_numbers, 0);
    }

    // GoTo action, either inline or referenced
    let action = resolve_dict(doc, item.get(b"A").ok()?)?;
    match action.get(b"S") {
        Ok(Object::Name(kind)) if kind == b"GoTo" => {
            resolve_destination(doc, action.get(b"D").ok()?, page_numbers, 0)
        }
        _ => None,
    }
}

// Guards against reference cycles in malformed files
const MAX_DEST_DEPTH: usize = 16;

fn resolve_destination(
    doc: &Document,
    dest: &Object,
    page_numbers: &HashMap<ObjectId, u32>,
    depth: usize,
) -> Option<u32> {
    if depth > MAX_DEST_DEPTH {
        return None;
    }

    match resolve(doc, dest)? {
        // [page_ref /XYZ left top zoom] and friends
        Object::Array(parts) => match parts.first()? {
            Object::Reference(page_ref) => page_numbers.get(page_ref).copied(),
            _ => None,
        },
        // Destination dictionaries keep the array under /D
        Object::Dictionary(dict) => {
            resolve_destination(doc, dict.get(b"D").ok()?, page_numbers, depth + 1)
        }
        Object::String(name, _) | Object::Name(name) => {
            let target = named_destination(doc, name)?;
            resolve_destination(doc, target, page_numbers, depth + 1)
        }
        _ => None,
    }
}

fn named_destination<'a>(doc: &'a Document, name: &[u8]) -> Option<&'a Object> {
    let catalog = doc.catalog().ok()?;

    // PDF 1.2+: /Names /Dests name tree
    let from_tree = catalog
        .get(b"Names")
        .ok()
        .and_then(|names| resolve_dict(doc, names))
        .and_then(|names| names.get(b"Dests").ok())
        .and_then(|tree| resolve_dict(doc, tree))
        .and_then(|tree| search_name_tree(doc, tree, name, 0));
    if from_tree.is_some() {
        return from_tree;
    }

    // PDF 1.1: /Dests dictionary on the catalog
    catalog
        .get(b"Dests")
        .ok()
        .and_then(|dests| resolve_dict(doc, dests))
        .and_then(|dests| dests.get(name).ok())
}

fn search_name_tree<'a>(
    doc: &'a Document,
    node: &'a Dictionary,
    name: &[u8],
    depth: usize,
) -> Option<&'a Object> {
    if depth > MAX_DEST_DEPTH {
        return None;
    }

    if let Ok(Object::Array(names)) = node.get(b"Names") {
        for pair in names.chunks_exact(2) {
            if matches!(&pair[0], Object::String(key, _) if key.as_slice() == name) {
                return Some(&pair[1]);
            }
        }
    }

    if let Ok(Object::Array(kids)) = node.get(b"Kids") {
        for kid in kids {
            let found = resolve_dict(doc, kid).and_then(|kid| search_name_tree(doc, kid, name, depth + 1));
            if found.is_some() {
                return found;
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::testing::blank_document;
    use lopdf::{dictionary, StringFormat};

    fn page_id(doc: &Document, page: u32) -> ObjectId {
        doc.get_pages()[&page]
    }

    fn with_single_item(doc: &mut Document, item: Dictionary) {
        let item_id = doc.add_object(item);
        let outlines_id = doc.add_object(dictionary! {
            "Type" => "Outlines",
            "First" => item_id,
            "Last" => item_id,
            "Count" => 1,
        });
        let catalog_id = doc.trailer.get(b"Root").unwrap().as_reference().unwrap();
        doc.get_dictionary_mut(catalog_id)
            .unwrap()
            .set("Outlines", outlines_id);
    }

    #[test]
    fn test_no_outline() {
        let doc = blank_document(2);
        assert!(read_bookmarks(&doc).unwrap().is_empty());
    }

    #[test]
    fn test_goto_action() {
        let mut doc = blank_document(3);
        let target = page_id(&doc, 3);
        with_single_item(
            &mut doc,
            dictionary! {
                "Title" => Object::string_literal("Appendix"),
                "A" => dictionary! {
                    "S" => "GoTo",
                    "D" => vec![Object::Reference(target), Object::Name(b"Fit".to_vec())],
                },
            },
        );

        assert_eq!(
            read_bookmarks(&doc).unwrap(),
            vec![Bookmark {
                level: 0,
                title: "Appendix".to_string(),
                page: Some(3),
            }]
        );
    }

    #[test]
    fn test_named_destination() {
        let mut doc = blank_document(2);
        let target = page_id(&doc, 2);
        let dests_id = doc.add_object(dictionary! {
            "Names" => vec![
                Object::String(b"chapter-1".to_vec(), StringFormat::Literal),
                Object::Array(vec![Object::Reference(target), Object::Name(b"Fit".to_vec())]),
            ],
        });
        let catalog_id = doc.trailer.get(b"Root").unwrap().as_reference().unwrap();
        doc.get_dictionary_mut(catalog_id)
            .unwrap()
            .set("Names", dictionary! { "Dests" => dests_id });
        with_single_item(
            &mut doc,
            dictionary! {
                "Title" => Object::string_literal("Chapter 1"),
                "Dest" => Object::String(b"chapter-1".to_vec(), StringFormat::Literal),
            },
        );

        assert_eq!(read_bookmarks(&doc).unwrap()[0].page, Some(2));
    }

    #[test]
    fn test_missing_destination() {
        let mut doc = blank_document(1);
        with_single_item(&mut doc, dictionary! { "Title" => Object::string_literal("Nowhere") });

        let bookmarks = read_bookmarks(&doc).unwrap();
        assert_eq!(bookmarks[0].title, "Nowhere");
        assert_eq!(bookmarks[0].page, None);
    }
}
