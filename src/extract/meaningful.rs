//! Content statistics and the meaningfulness predicate
//!
//! Every extraction layer asks the same question of a candidate subtree: is
//! this a real block of documentation, or page furniture? The answer is a
//! fixed boolean rule over [`ContentStats`], shared by all three layers.

use crate::config::Meaningfulness;
use crate::dom::{Document, NodeId, NodeKind};

/// Text and structure counts of a subtree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContentStats {
    /// Non-whitespace characters of all text, script-like elements excluded
    pub non_whitespace: usize,
    pub paragraphs: usize,
    /// h1..h6
    pub headings: usize,
    /// h1..h3
    pub major_headings: usize,
    /// `pre` containing `code` (once), plus inline `code` outside `pre`
    pub code_blocks: usize,
    pub list_items: usize,
    pub links: usize,
    /// Non-whitespace characters of text inside `<a>` elements
    pub link_text: usize,
}

impl ContentStats {
    /// Collect statistics for the subtree rooted at `root`
    pub fn collect(doc: &Document, root: NodeId) -> Self {
        let mut stats = ContentStats::default();
        // (node, inside <pre>, inside <a>)
        let mut stack = vec![(root, false, false)];

        while let Some((id, in_pre, in_link)) = stack.pop() {
            let (in_pre, in_link) = match doc.kind(id) {
                NodeKind::Text(text) => {
                    let count = text.chars().filter(|c| !c.is_whitespace()).count();
                    stats.non_whitespace += count;
                    if in_link {
                        stats.link_text += count;
                    }
                    continue;
                }
                NodeKind::Other => continue,
                NodeKind::Document => (in_pre, in_link),
                NodeKind::Element(el) => match el.name() {
                    "script" | "style" | "noscript" | "template" => continue,
                    "p" => {
                        stats.paragraphs += 1;
                        (in_pre, in_link)
                    }
                    "h1" | "h2" | "h3" => {
                        stats.headings += 1;
                        stats.major_headings += 1;
                        (in_pre, in_link)
                    }
                    "h4" | "h5" | "h6" => {
                        stats.headings += 1;
                        (in_pre, in_link)
                    }
                    "li" => {
                        stats.list_items += 1;
                        (in_pre, in_link)
                    }
                    "a" => {
                        stats.links += 1;
                        (in_pre, true)
                    }
                    "pre" => {
                        if !in_pre && contains_code(doc, id) {
                            stats.code_blocks += 1;
                        }
                        (true, in_link)
                    }
                    "code" => {
                        if !in_pre {
                            stats.code_blocks += 1;
                        }
                        (in_pre, in_link)
                    }
                    _ => (in_pre, in_link),
                },
            };

            for child in doc.children(id).rev() {
                stack.push((child, in_pre, in_link));
            }
        }

        stats
    }

    /// Link text over total text, both as non-whitespace character counts
    pub fn link_density(&self) -> f64 {
        if self.non_whitespace == 0 {
            return 0.0;
        }
        self.link_text as f64 / self.non_whitespace as f64
    }

    /// Apply the meaningfulness rule
    ///
    /// Accepts iff there is enough text, the block is not a link farm
    /// (density above the limit with more than two links), and it carries
    /// either a paragraph or code, or a heading with at least 20 characters.
    pub fn is_meaningful(&self, thresholds: &Meaningfulness) -> bool {
        if self.non_whitespace < thresholds.min_non_whitespace {
            return false;
        }
        if self.link_density() > thresholds.max_link_density && self.links > 2 {
            return false;
        }
        self.paragraphs >= 1
            || self.code_blocks >= 1
            || (self.headings > 0 && self.non_whitespace >= 20)
    }
}

fn contains_code(doc: &Document, pre: NodeId) -> bool {
    doc.descendants(pre)
        .skip(1)
        .any(|id| doc.is_element(id, "code"))
}

/// Meaningfulness of the subtree rooted at `node`
pub fn is_meaningful(doc: &Document, node: NodeId, thresholds: &Meaningfulness) -> bool {
    ContentStats::collect(doc, node).is_meaningful(thresholds)
}
