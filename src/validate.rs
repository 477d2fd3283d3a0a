//! Structural validation of rendered Markdown
//!
//! The body is parsed into a CommonMark event stream (pulldown-cmark, GFM
//! tables enabled) and walked once. The walk records every heading with its
//! level and inline text, whether content appeared before the first heading,
//! and which sections never received content. It stops at the first heading
//! seen inside a fenced code block.
//!
//! Checks run in a fixed order, each failing with its own cause:
//!
//! | Order | Rule | Cause |
//! |-------|------|-------|
//! | 1 | body is not empty or whitespace-only | `EmptyContent` |
//! | 2 | no heading inside a fenced code block | `BrokenAtomicBlock` |
//! | 3 | exactly one level-1 heading | `BrokenH1Invariant` |
//! | 4 | no text, paragraph, list or table before the first heading | `OrphanContent` |
//! | 5 | heading depth grows by at most one level | `SkippedHeadingLevels` |
//! | 6 | every heading owns a content block | `EmptySection` |
//!
//! A fence that is never closed runs to the end of its container and
//! silently turns the headings below it into code. Such a fence is reported
//! as a broken atomic block when it swallowed at least one ATX heading line.
//!
//! ```
//! use rag_markdown_normalizer::validate::validate;
//!
//! let outline = validate(b"# Install\n\nRun the installer.\n").unwrap();
//! assert_eq!(outline.title(), "Install");
//! ```

use std::ops::Range;
use std::sync::OnceLock;

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use regex::Regex;

use crate::error::{Cause, ClassifiedError};

/// Heading seen by the validator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    pub level: u8,
    /// Inline text, whitespace-collapsed
    pub text: String,
}

/// Headings of a valid document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentOutline {
    title: String,
    headings: Vec<Heading>,
}

impl DocumentOutline {
    /// Text of the single level-1 heading
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Every heading in document order
    pub fn headings(&self) -> &[Heading] {
        &self.headings
    }
}

/// Open section while walking: heading index and whether it owns content
struct OpenSection {
    heading: usize,
    level: u8,
    has_content: bool,
}

/// Fenced code block currently open
struct OpenFence {
    range: Range<usize>,
    content: String,
}

#[derive(Default)]
struct Walk {
    headings: Vec<Heading>,
    orphan_content: bool,
    empty_sections: Vec<usize>,
    open_sections: Vec<OpenSection>,
}

impl Walk {
    fn start_heading(&mut self, level: u8) {
        self.close_sections(level);
        self.open_sections.push(OpenSection {
            heading: self.headings.len(),
            level,
            has_content: false,
        });
        self.headings.push(Heading {
            level,
            text: String::new(),
        });
    }

    /// Close every open section at `level` or deeper
    fn close_sections(&mut self, level: u8) {
        while let Some(top) = self.open_sections.last() {
            if top.level < level {
                break;
            }
            if let Some(closed) = self.open_sections.pop() {
                if closed.has_content {
                    if let Some(parent) = self.open_sections.last_mut() {
                        parent.has_content = true;
                    }
                } else {
                    self.empty_sections.push(closed.heading);
                }
            }
        }
    }

    fn content_block(&mut self) {
        if let Some(section) = self.open_sections.last_mut() {
            section.has_content = true;
        }
    }
}

/// Validate a Markdown body and return its heading outline
///
/// Invalid UTF-8 is decoded lossily; structure is all that is checked here.
///
/// # Errors
///
/// The first violated rule, as a non-retryable [`ClassifiedError`].
pub fn validate(markdown: &[u8]) -> Result<DocumentOutline, ClassifiedError> {
    let text = String::from_utf8_lossy(markdown);
    if text.trim().is_empty() {
        return Err(ClassifiedError::new(Cause::EmptyContent, "empty content"));
    }

    let walk = walk(&text)?;

    let h1: Vec<&Heading> = walk.headings.iter().filter(|h| h.level == 1).collect();
    let title = match h1.as_slice() {
        [] => return Err(ClassifiedError::new(Cause::BrokenH1Invariant, "no H1 heading")),
        [single] => single.text.clone(),
        many => {
            return Err(ClassifiedError::new(
                Cause::BrokenH1Invariant,
                format!("multiple H1 headings ({})", many.len()),
            ));
        }
    };

    if walk.orphan_content {
        return Err(ClassifiedError::new(
            Cause::OrphanContent,
            "content appears before the first heading",
        ));
    }

    for pair in walk.headings.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        if next.level > prev.level + 1 {
            return Err(ClassifiedError::new(
                Cause::SkippedHeadingLevels,
                format!(
                    "heading '{}' jumps from level {} to level {}",
                    next.text, prev.level, next.level
                ),
            ));
        }
    }

    if let Some(index) = walk.empty_sections.iter().min() {
        let heading = &walk.headings[*index];
        return Err(ClassifiedError::new(
            Cause::EmptySection,
            format!("section '{}' has no content", heading.text),
        ));
    }

    tracing::debug!(headings = walk.headings.len(), title = %title, "markdown structure valid");
    Ok(DocumentOutline {
        title,
        headings: walk.headings,
    })
}

fn walk(text: &str) -> Result<Walk, ClassifiedError> {
    let mut walk = Walk::default();
    // index into walk.headings while inside a heading
    let mut in_heading: Option<usize> = None;
    let mut fence: Option<OpenFence> = None;
    let mut in_code = false;
    let mut in_html = false;

    let parser = Parser::new_ext(text, Options::ENABLE_TABLES);
    for (event, range) in parser.into_offset_iter() {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                if fence.is_some() {
                    return Err(broken_atomic_block("heading inside a fenced code block"));
                }
                walk.start_heading(heading_level(level));
                in_heading = Some(walk.headings.len() - 1);
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some(index) = in_heading.take() {
                    let heading = &mut walk.headings[index];
                    heading.text = collapse_whitespace(&heading.text);
                }
            }
            Event::Start(Tag::CodeBlock(kind)) => {
                walk.content_block();
                in_code = true;
                if let CodeBlockKind::Fenced(_) = kind {
                    fence = Some(OpenFence {
                        range,
                        content: String::new(),
                    });
                }
            }
            Event::End(TagEnd::CodeBlock) => {
                in_code = false;
                if let Some(open) = fence.take()
                    && !fence_is_closed(&text[open.range.clone()])
                    && contains_atx_heading(&open.content)
                {
                    return Err(broken_atomic_block(
                        "unclosed code fence swallows a heading",
                    ));
                }
            }
            Event::Start(Tag::Paragraph | Tag::List(_) | Tag::Table(_)) => {
                if walk.open_sections.is_empty() {
                    walk.orphan_content = true;
                }
                walk.content_block();
            }
            Event::Start(Tag::BlockQuote(_)) => walk.content_block(),
            Event::Start(Tag::HtmlBlock) => {
                in_html = true;
                walk.content_block();
            }
            Event::End(TagEnd::HtmlBlock) => in_html = false,
            Event::Text(content) | Event::Code(content) => {
                if let Some(open) = fence.as_mut() {
                    open.content.push_str(&content);
                } else if let Some(index) = in_heading {
                    walk.headings[index].text.push_str(&content);
                } else if !in_code && !in_html && walk.open_sections.is_empty() {
                    walk.orphan_content = true;
                }
            }
            Event::SoftBreak | Event::HardBreak => {
                if let Some(index) = in_heading {
                    walk.headings[index].text.push(' ');
                }
            }
            _ => {}
        }
    }

    walk.close_sections(1);
    Ok(walk)
}

fn heading_level(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

fn broken_atomic_block(message: &str) -> ClassifiedError {
    tracing::debug!(reason = message, "broken atomic block");
    ClassifiedError::new(Cause::BrokenAtomicBlock, message)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strip indentation and block quote markers from a source line
fn strip_container_prefix(line: &str) -> &str {
    line.trim_start_matches(|c: char| c == '>' || c.is_whitespace())
}

/// True when the fenced block source ends with a matching closing fence
fn fence_is_closed(source: &str) -> bool {
    let mut lines = source.lines();
    let Some(opening) = lines.next().map(strip_container_prefix) else {
        return false;
    };
    let Some(marker) = opening.chars().next().filter(|c| *c == '`' || *c == '~') else {
        return false;
    };
    let open_len = opening.chars().take_while(|c| *c == marker).count();

    let Some(last) = lines
        .map(|line| strip_container_prefix(line).trim_end())
        .filter(|line| !line.is_empty())
        .last()
    else {
        return false;
    };
    last.chars().all(|c| c == marker) && last.chars().count() >= open_len
}

fn contains_atx_heading(code: &str) -> bool {
    static ATX_HEADING: OnceLock<Option<Regex>> = OnceLock::new();
    let Some(regex) = ATX_HEADING
        .get_or_init(|| Regex::new(r"(?m)^ {0,3}#{1,6}(?:[ \t]|$)").ok())
        .as_ref()
    else {
        return false;
    };
    regex.is_match(code)
}
