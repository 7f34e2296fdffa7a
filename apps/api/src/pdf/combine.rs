use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, warn};

use super::{PdfBlob, PdfError, PdfGroup};

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];
const MAX_TREE_DEPTH: usize = 64;
const OUTPUT_VERSION: &str = "1.7";

/// Result of combining one group. A failed group does not affect its siblings.
#[derive(Debug)]
pub struct GroupOutcome {
    pub number: usize,
    pub member_names: Vec<String>,
    pub result: Result<Vec<u8>, PdfError>,
}

/// Combines every group independently.
pub fn combine_all(groups: &[PdfGroup]) -> Vec<GroupOutcome> {
    groups
        .iter()
        .map(|group| {
            let result = combine(group);
            if let Err(e) = &result {
                warn!("Group {} failed: {e}", group.number);
            }
            GroupOutcome {
                number: group.number,
                member_names: group.members.iter().map(|m| m.name.clone()).collect(),
                result,
            }
        })
        .collect()
}

/// Concatenates the pages of every member, in order, into one document.
///
/// Page objects and everything they reference are carried over as-is; only object
/// numbers change. Inherited attributes are copied onto each page so size, rotation and
/// resources survive the new page tree.
pub fn combine(group: &PdfGroup) -> Result<Vec<u8>, PdfError> {
    let mut merged = Document::with_version(OUTPUT_VERSION);
    let mut next_id: u32 = 1;
    let mut page_ids: Vec<ObjectId> = Vec::new();

    for blob in &group.members {
        let mut doc = Document::load_mem(&blob.data).map_err(|e| unprocessable(blob, e))?;
        doc.renumber_objects_with(next_id);
        next_id = doc.max_id + 1;

        let source_pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
        if source_pages.is_empty() {
            return Err(unprocessable(blob, "document has no pages"));
        }

        let mut pages = Vec::with_capacity(source_pages.len());
        for page_id in source_pages {
            let page = flatten_page(&doc, page_id).map_err(|e| unprocessable(blob, e))?;
            pages.push((page_id, page));
        }

        for (object_id, object) in doc.objects {
            if !is_structural(&object) {
                merged.objects.insert(object_id, object);
            }
        }
        for (page_id, page) in pages {
            merged.objects.insert(page_id, Object::Dictionary(page));
            page_ids.push(page_id);
        }
    }

    merged.max_id = next_id.saturating_sub(1);
    let pages_id = merged.new_object_id();
    for page_id in &page_ids {
        if let Some(Object::Dictionary(page)) = merged.objects.get_mut(page_id) {
            page.set("Parent", Object::Reference(pages_id));
        }
    }

    let kids: Vec<Object> = page_ids.iter().map(|&id| Object::Reference(id)).collect();
    let pages = Dictionary::from_iter([
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Kids", Object::Array(kids)),
        ("Count", Object::Integer(page_ids.len() as i64)),
    ]);
    merged.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = merged.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    merged.trailer.set("Root", Object::Reference(catalog_id));

    // Outlines and old page-tree nodes are no longer reachable from the new catalog.
    let pruned = merged.prune_objects();
    merged.renumber_objects();
    debug!(
        "Combined group {}: {} pages, {} unreachable objects dropped",
        group.number,
        page_ids.len(),
        pruned.len()
    );

    let mut output = Vec::new();
    merged
        .save_to(&mut output)
        .map_err(|e| PdfError::Write(e.to_string()))?;
    Ok(output)
}

fn unprocessable(blob: &PdfBlob, reason: impl std::fmt::Display) -> PdfError {
    PdfError::Unprocessable {
        name: blob.name.clone(),
        reason: reason.to_string(),
    }
}

/// Catalog, page-tree and outline nodes are rebuilt rather than copied.
fn is_structural(object: &Object) -> bool {
    let Object::Dictionary(dict) = object else {
        return false;
    };
    matches!(
        dict.get(b"Type").and_then(Object::as_name),
        Ok(b"Catalog" | b"Pages" | b"Page" | b"Outlines")
    )
}

fn flatten_page(doc: &Document, page_id: ObjectId) -> Result<Dictionary, lopdf::Error> {
    let mut page = doc.get_dictionary(page_id)?.clone();
    for key in INHERITABLE {
        if page.has(key) {
            continue;
        }
        if let Some(value) = inherited_attribute(doc, &page, key) {
            page.set(key, value);
        }
    }
    Ok(page)
}

fn inherited_attribute(doc: &Document, page: &Dictionary, key: &[u8]) -> Option<Object> {
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
    for _ in 0..MAX_TREE_DEPTH {
        let node = doc.get_dictionary(parent?).ok()?;
        if let Ok(value) = node.get(key) {
            return Some(value.clone());
        }
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
    }
    None
}
