use anyhow::{Context, Result};
use lopdf::{dictionary, Document, Object, ObjectId};
use tracing::debug;

use super::encode_text_string;
use crate::toc::OutlineEntry;

struct OutlineNode<'a> {
    id: ObjectId,
    title: &'a str,
    page_id: ObjectId,
    children: Vec<usize>,
}

/// Replace the document's bookmarks with `entries`.
///
/// Each entry becomes a child of the closest preceding entry with a lower
/// level. Returns the id of the new `/Outlines` dictionary, or `None` when
/// `entries` is empty and the outline was removed.
pub fn apply_outline(doc: &mut Document, entries: &[OutlineEntry]) -> Result<Option<ObjectId>> {
    let catalog_id = doc
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .context("Document has no catalog")?;

    if entries.is_empty() {
        doc.get_dictionary_mut(catalog_id)?.remove(b"Outlines");
        return Ok(None);
    }

    let pages = doc.get_pages();
    let mut nodes: Vec<OutlineNode> = Vec::with_capacity(entries.len());
    let mut roots = Vec::new();
    let mut open: Vec<(u32, usize)> = Vec::new();

    for entry in entries {
        let page_id = *pages.get(&entry.page).with_context(|| {
            format!(
                "Bookmark \"{}\" points to page {} but the document has {} pages",
                entry.title,
                entry.page,
                pages.len()
            )
        })?;

        while open.last().is_some_and(|&(level, _)| level >= entry.level) {
            open.pop();
        }

        let idx = nodes.len();
        match open.last() {
            Some(&(_, parent)) => nodes[parent].children.push(idx),
            None => roots.push(idx),
        }
        nodes.push(OutlineNode {
            id: doc.new_object_id(),
            title: &entry.title,
            page_id,
            children: Vec::new(),
        });
        open.push((entry.level, idx));
    }

    let outlines_id = doc.new_object_id();
    write_siblings(doc, &nodes, &roots, outlines_id);

    doc.objects.insert(
        outlines_id,
        Object::Dictionary(dictionary! {
            "Type" => "Outlines",
            "First" => nodes[roots[0]].id,
            "Last" => nodes[roots[roots.len() - 1]].id,
            // Child items start closed, so only the top level is visible
            "Count" => roots.len() as i64,
        }),
    );

    let catalog = doc.get_dictionary_mut(catalog_id)?;
    catalog.set("Outlines", outlines_id);
    catalog.set("PageMode", "UseOutlines");

    debug!(bookmarks = nodes.len(), top_level = roots.len(), "applied outline");
    Ok(Some(outlines_id))
}

fn write_siblings(doc: &mut Document, nodes: &[OutlineNode], siblings: &[usize], parent: ObjectId) {
    for (i, &idx) in siblings.iter().enumerate() {
        let node = &nodes[idx];
        let mut dict = dictionary! {
            "Title" => encode_text_string(node.title),
            "Parent" => parent,
            "Dest" => vec![Object::Reference(node.page_id), Object::Name(b"Fit".to_vec())],
        };

        if i > 0 {
            dict.set("Prev", nodes[siblings[i - 1]].id);
        }
        if let Some(&next) = siblings.get(i + 1) {
            dict.set("Next", nodes[next].id);
        }

        if let (Some(&first), Some(&last)) = (node.children.first(), node.children.last()) {
            dict.set("First", nodes[first].id);
            dict.set("Last", nodes[last].id);
            dict.set("Count", -(node.children.len() as i64));
            write_siblings(doc, nodes, &node.children, node.id);
        }

        doc.objects.insert(node.id, Object::Dictionary(dict));
    }
}
