//! Layer 3: content density scoring
//!
//! Runs on a chrome-stripped clone of the page. Every remaining `div`,
//! `section` and `body` is a candidate; candidates are scored in document
//! order and every scan walks that same order, so the earliest candidate
//! wins any tie and repeated runs pick the same node.
//!
//! ```text
//! score = non_whitespace / chars_per_point
//!       + paragraphs * paragraph_weight + h1..h3 * heading_weight
//!       + code_blocks * code_block_weight + list_items * list_item_weight
//! score -= (link_density - threshold) * score   when link_density > threshold
//! ```

use std::borrow::Cow;

use super::{remove_chrome, ContentStats, ExtractionResult, ExtractionStrategy, Layer};
use crate::config::ExtractParam;
use crate::dom::{Document, NodeId};

const CANDIDATE_TAGS: [&str; 3] = ["div", "section", "body"];

/// Candidate container and its density score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredCandidate {
    pub node: NodeId,
    pub score: f64,
}

/// Score every candidate of `doc`, in document order
pub fn score_candidates(doc: &Document, param: &ExtractParam) -> Vec<ScoredCandidate> {
    doc.elements()
        .filter(|id| {
            doc.tag_name(*id)
                .is_some_and(|name| CANDIDATE_TAGS.contains(&name))
        })
        .map(|node| ScoredCandidate {
            node,
            score: score(&ContentStats::collect(doc, node), param),
        })
        .collect()
}

fn score(stats: &ContentStats, param: &ExtractParam) -> f64 {
    let mut score = stats.non_whitespace as f64 / param.chars_per_point
        + stats.paragraphs as f64 * param.paragraph_weight
        + stats.major_headings as f64 * param.heading_weight
        + stats.code_blocks as f64 * param.code_block_weight
        + stats.list_items as f64 * param.list_item_weight;

    if stats.non_whitespace > 0 {
        let density = stats.link_density();
        if density > param.link_density_threshold {
            score -= (density - param.link_density_threshold) * score;
        }
    }
    score
}

/// Pick the winning candidate, applying the body specificity bias
fn select_best(doc: &Document, candidates: &[ScoredCandidate], bias: f64) -> Option<ScoredCandidate> {
    let mut best: Option<ScoredCandidate> = None;
    for candidate in candidates {
        if best.is_none_or(|b| candidate.score > b.score) {
            best = Some(*candidate);
        }
    }
    let best = best?;

    if !doc.is_element(best.node, "body") {
        return Some(best);
    }
    let body_score = best.score;
    let replacement = candidates.iter().find(|c| {
        c.node != best.node && c.score >= bias * body_score && c.score > 0.9 * best.score
    });
    Some(replacement.copied().unwrap_or(best))
}

/// Chrome removal followed by density scoring
#[derive(Debug, Clone)]
pub struct DensityScorer {
    param: ExtractParam,
}

impl DensityScorer {
    pub fn new(param: ExtractParam) -> Self {
        Self { param }
    }
}

impl ExtractionStrategy for DensityScorer {
    fn layer(&self) -> Layer {
        Layer::Density
    }

    fn try_extract<'a>(&self, doc: &'a Document) -> Option<ExtractionResult<'a>> {
        let mut cleaned = doc.clone();
        remove_chrome(&mut cleaned);

        let candidates = score_candidates(&cleaned, &self.param);
        let best = select_best(&cleaned, &candidates, self.param.body_specificity_bias)?;
        tracing::trace!(
            candidates = candidates.len(),
            score = best.score,
            tag = cleaned.tag_name(best.node).unwrap_or_default(),
            "density candidate selected"
        );

        let stats = ContentStats::collect(&cleaned, best.node);
        if !stats.is_meaningful(&self.param.meaningfulness()) {
            return None;
        }
        Some(ExtractionResult::new(
            Cow::Owned(cleaned),
            best.node,
            Layer::Density,
        ))
    }
}
