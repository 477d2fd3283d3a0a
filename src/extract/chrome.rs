//! Site chrome removal
//!
//! Both passes collect their targets before detaching any of them, so the
//! walk never observes a half-edited tree. Callers pass a clone; the
//! document given here is modified in place.

use crate::dom::{Document, NodeId};

/// Elements that are always chrome
pub const CHROME_TAGS: [&str; 4] = ["nav", "header", "footer", "aside"];

/// Case-insensitive substrings of `class`/`id` values that mark chrome
pub const CHROME_KEYWORDS: [&str; 14] = [
    "nav",
    "sidebar",
    "menu",
    "breadcrumb",
    "search",
    "footer",
    "header",
    "cookie",
    "consent",
    "version",
    "language",
    "theme",
    "edit",
    "github",
];

/// Never removed by the keyword pass
const STRUCTURAL_TAGS: [&str; 3] = ["html", "head", "body"];

/// Strip chrome from `doc`, returning the number of detached subtrees
pub fn remove_chrome(doc: &mut Document) -> usize {
    let tagged: Vec<NodeId> = doc
        .elements()
        .filter(|id| {
            doc.tag_name(*id)
                .is_some_and(|name| CHROME_TAGS.contains(&name))
        })
        .collect();
    for id in &tagged {
        doc.detach(*id);
    }

    let keyworded: Vec<NodeId> = doc
        .elements()
        .filter(|id| is_keyword_chrome(doc, *id))
        .collect();
    for id in &keyworded {
        doc.detach(*id);
    }

    tracing::trace!(
        tagged = tagged.len(),
        keyworded = keyworded.len(),
        "chrome removed"
    );
    tagged.len() + keyworded.len()
}

fn is_keyword_chrome(doc: &Document, id: NodeId) -> bool {
    let Some(el) = doc.element(id) else {
        return false;
    };
    if STRUCTURAL_TAGS.contains(&el.name()) {
        return false;
    }
    ["class", "id"].iter().any(|attr| {
        el.attr(*attr).is_some_and(|value| {
            let value = value.to_ascii_lowercase();
            CHROME_KEYWORDS.iter().any(|keyword| value.contains(keyword))
        })
    })
}
