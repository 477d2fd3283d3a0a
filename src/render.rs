//! Markdown rendering of an extracted content subtree
//!
//! [`MarkdownRenderer`] is the seam between content isolation and structural
//! validation. [`HtmlToMarkdown`] is the reference implementation: a
//! depth-first walk over the arena DOM that emits CommonMark with GFM tables.
//!
//! # Element handling
//!
//! - `h1`..`h6` become ATX headings; permalink anchors (`¶`, `#`, empty
//!   anchors) inside them are dropped
//! - `p`, `blockquote`, `hr` and `br` keep their block structure
//! - `ul`/`ol` become nested lists indented by the parent marker width
//! - `pre` becomes a fenced block, language taken from a `language-*` or
//!   `lang-*` class on the `code` child (or the `pre` itself)
//! - `code`, `strong`/`b` and `em`/`i` become inline spans
//! - `a` and `img` become links and images unless the URL scheme is unsafe
//! - `table` becomes a GFM pipe table, first row as header
//! - script-like and embedding elements are skipped with their subtree
//!
//! Text that would otherwise open a block construct at the start of a line
//! (`#`, `>`, `-`, `1.`, fences) is backslash-escaped, so rendered prose never
//! introduces headings or code blocks the page did not have.
//!
//! Output is normalized for deterministic results: LF line endings, no
//! trailing whitespace, at most one blank line in a row outside code blocks,
//! and exactly one final newline.
//!
//! ```
//! use rag_markdown_normalizer::config::ExtractParam;
//! use rag_markdown_normalizer::extract::ContentExtractor;
//! use rag_markdown_normalizer::parser::parse_html;
//! use rag_markdown_normalizer::render::{HtmlToMarkdown, MarkdownRenderer};
//!
//! let html = b"<html><body><main><h1>Setup</h1>\
//!     <p>Install the <code>cli</code> package before running any other command.</p></main></body></html>";
//! let doc = parse_html(html).unwrap();
//! let extraction = ContentExtractor::new(ExtractParam::default())
//!     .unwrap()
//!     .extract(&doc)
//!     .unwrap();
//! let markdown = HtmlToMarkdown::new().render(&extraction).unwrap();
//! assert_eq!(
//!     markdown,
//!     "# Setup\n\nInstall the `cli` package before running any other command.\n"
//! );
//! ```

use crate::dom::{Document, NodeId, NodeKind};
use crate::error::{Cause, ClassifiedError};
use crate::extract::ExtractionResult;

/// Default limit on element nesting below the content node
pub const MAX_NESTING_DEPTH: usize = 512;

/// Elements skipped together with their subtree
const SKIPPED_ELEMENTS: &[&str] = &[
    "script", "style", "noscript", "template", "iframe", "object", "embed", "applet", "link",
    "base", "svg", "head",
];

/// URL schemes that are never emitted as link or image targets
const DANGEROUS_URL_SCHEMES: &[&str] = &["javascript:", "data:", "vbscript:", "file:", "about:"];

/// Link texts that mark heading permalink anchors
const PERMALINK_MARKERS: &[&str] = &["¶", "#", "§", "🔗"];

/// Markdown renderer seam
///
/// Implementations must be deterministic: identical extraction results
/// render to identical bytes.
pub trait MarkdownRenderer: Send + Sync {
    fn render(&self, extraction: &ExtractionResult<'_>) -> Result<String, ClassifiedError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Alignment {
    Left,
    Center,
    Right,
}

/// Reference HTML to Markdown renderer
#[derive(Debug, Clone)]
pub struct HtmlToMarkdown {
    max_depth: usize,
}

impl Default for HtmlToMarkdown {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownRenderer for HtmlToMarkdown {
    fn render(&self, extraction: &ExtractionResult<'_>) -> Result<String, ClassifiedError> {
        self.render_node(extraction.document(), extraction.content())
    }
}

impl HtmlToMarkdown {
    pub fn new() -> Self {
        Self {
            max_depth: MAX_NESTING_DEPTH,
        }
    }

    pub fn with_max_depth(max_depth: usize) -> Self {
        Self { max_depth }
    }

    /// Render the subtree rooted at `node`
    ///
    /// # Errors
    ///
    /// `RenderFailed` when element nesting exceeds the configured depth.
    pub fn render_node(&self, doc: &Document, node: NodeId) -> Result<String, ClassifiedError> {
        let mut output = String::new();
        self.traverse(doc, node, &mut output, 0)?;
        Ok(normalize_output(&output))
    }

    fn traverse(
        &self,
        doc: &Document,
        node: NodeId,
        output: &mut String,
        depth: usize,
    ) -> Result<(), ClassifiedError> {
        match doc.kind(node) {
            NodeKind::Other => Ok(()),
            NodeKind::Document => self.traverse_children(doc, node, output, depth),
            NodeKind::Text(text) => {
                push_text(text, output);
                Ok(())
            }
            NodeKind::Element(el) => {
                if depth > self.max_depth {
                    return Err(ClassifiedError::new(
                        Cause::RenderFailed,
                        format!(
                            "element nesting depth {depth} exceeds maximum {}",
                            self.max_depth
                        ),
                    ));
                }
                self.handle_element(doc, node, el.name(), output, depth)
            }
        }
    }

    fn traverse_children(
        &self,
        doc: &Document,
        node: NodeId,
        output: &mut String,
        depth: usize,
    ) -> Result<(), ClassifiedError> {
        for child in doc.children(node) {
            self.traverse(doc, child, output, depth + 1)?;
        }
        Ok(())
    }

    /// Render the children of `node` into a fresh buffer
    fn render_children(
        &self,
        doc: &Document,
        node: NodeId,
        depth: usize,
    ) -> Result<String, ClassifiedError> {
        let mut buffer = String::new();
        self.traverse_children(doc, node, &mut buffer, depth)?;
        Ok(buffer)
    }

    fn handle_element(
        &self,
        doc: &Document,
        node: NodeId,
        tag: &str,
        output: &mut String,
        depth: usize,
    ) -> Result<(), ClassifiedError> {
        if SKIPPED_ELEMENTS.contains(&tag) {
            return Ok(());
        }

        match tag {
            "h1" => self.handle_heading(doc, node, 1, output, depth),
            "h2" => self.handle_heading(doc, node, 2, output, depth),
            "h3" => self.handle_heading(doc, node, 3, output, depth),
            "h4" => self.handle_heading(doc, node, 4, output, depth),
            "h5" => self.handle_heading(doc, node, 5, output, depth),
            "h6" => self.handle_heading(doc, node, 6, output, depth),
            "p" => self.handle_paragraph(doc, node, output, depth),
            "a" => self.handle_link(doc, node, output, depth),
            "img" => {
                handle_image(doc, node, output);
                Ok(())
            }
            "ul" => self.handle_list(doc, node, output, depth, false, 0),
            "ol" => self.handle_list(doc, node, output, depth, true, 0),
            "pre" => {
                handle_code_block(doc, node, output);
                Ok(())
            }
            "code" | "kbd" | "samp" => {
                handle_inline_code(doc, node, output);
                Ok(())
            }
            "strong" | "b" => self.handle_emphasis(doc, node, "**", output, depth),
            "em" | "i" => self.handle_emphasis(doc, node, "*", output, depth),
            "table" => self.handle_table(doc, node, output, depth),
            "blockquote" => self.handle_blockquote(doc, node, output, depth),
            "hr" => {
                ensure_blank_line(output);
                output.push_str("---\n\n");
                Ok(())
            }
            "br" => {
                output.push('\n');
                Ok(())
            }
            "div" | "section" | "article" | "main" | "header" | "footer" | "aside" | "nav"
            | "figure" | "figcaption" | "details" | "summary" | "dl" | "dt" | "dd" | "li"
            | "address" | "form" | "fieldset" => {
                if !output.is_empty() && !output.ends_with(char::is_whitespace) {
                    output.push('\n');
                }
                self.traverse_children(doc, node, output, depth)?;
                if !output.is_empty() && !output.ends_with(char::is_whitespace) {
                    output.push('\n');
                }
                Ok(())
            }
            _ => self.traverse_children(doc, node, output, depth),
        }
    }

    fn handle_heading(
        &self,
        doc: &Document,
        node: NodeId,
        level: usize,
        output: &mut String,
        depth: usize,
    ) -> Result<(), ClassifiedError> {
        let text = normalize_text(&self.render_children(doc, node, depth)?);
        if text.is_empty() {
            return Ok(());
        }

        ensure_blank_line(output);
        for _ in 0..level {
            output.push('#');
        }
        output.push(' ');
        output.push_str(&text);
        output.push_str("\n\n");
        Ok(())
    }

    fn handle_paragraph(
        &self,
        doc: &Document,
        node: NodeId,
        output: &mut String,
        depth: usize,
    ) -> Result<(), ClassifiedError> {
        let content = self.render_children(doc, node, depth)?;
        let content = content.trim();
        if content.is_empty() {
            return Ok(());
        }

        ensure_blank_line(output);
        output.push_str(content);
        output.push_str("\n\n");
        Ok(())
    }

    fn handle_link(
        &self,
        doc: &Document,
        node: NodeId,
        output: &mut String,
        depth: usize,
    ) -> Result<(), ClassifiedError> {
        let text = normalize_text(&self.render_children(doc, node, depth)?);
        let marker = text.trim_matches(|c: char| c.is_whitespace() || c == '\u{200b}' || c == '\\');
        if marker.is_empty() || PERMALINK_MARKERS.contains(&marker) {
            return Ok(());
        }

        match doc.attr(node, "href").and_then(sanitize_url) {
            Some(url) => {
                output.push('[');
                output.push_str(&text);
                output.push_str("](");
                push_url(url, output);
                output.push(')');
            }
            None => output.push_str(&text),
        }
        Ok(())
    }

    /// Emit a list; `indent` is the column its markers start at
    fn handle_list(
        &self,
        doc: &Document,
        node: NodeId,
        output: &mut String,
        depth: usize,
        ordered: bool,
        indent: usize,
    ) -> Result<(), ClassifiedError> {
        if indent == 0 {
            ensure_blank_line(output);
        } else if !output.is_empty() && !output.ends_with('\n') {
            output.push('\n');
        }

        let marker = if ordered { "1. " } else { "- " };
        let child_indent = indent + marker.len();

        for item in doc.child_elements(node) {
            if !doc.is_element(item, "li") {
                continue;
            }

            let mut first = true;
            let mut segment = String::new();
            for child in doc.children(item) {
                let nested = match doc.tag_name(child) {
                    Some("ul") => Some(false),
                    Some("ol") => Some(true),
                    _ => None,
                };
                let Some(nested_ordered) = nested else {
                    self.traverse(doc, child, &mut segment, depth + 2)?;
                    continue;
                };

                write_list_segment(output, &segment, indent, marker, &mut first);
                segment.clear();
                self.handle_list(doc, child, output, depth + 2, nested_ordered, child_indent)?;
            }
            write_list_segment(output, &segment, indent, marker, &mut first);
            if first {
                // nothing rendered at all: keep the item so numbering holds
                push_indent(output, indent);
                output.push_str(marker.trim_end());
                output.push('\n');
            }
        }

        if indent == 0 {
            output.push('\n');
        }
        Ok(())
    }

    fn handle_emphasis(
        &self,
        doc: &Document,
        node: NodeId,
        delimiter: &str,
        output: &mut String,
        depth: usize,
    ) -> Result<(), ClassifiedError> {
        let content = self.render_children(doc, node, depth)?;
        let inner = content.trim();
        if inner.is_empty() {
            output.push_str(&content);
            return Ok(());
        }

        if content.starts_with(char::is_whitespace) && !output.ends_with(char::is_whitespace) {
            output.push(' ');
        }
        output.push_str(delimiter);
        output.push_str(inner);
        output.push_str(delimiter);
        if content.ends_with(char::is_whitespace) {
            output.push(' ');
        }
        Ok(())
    }

    fn handle_blockquote(
        &self,
        doc: &Document,
        node: NodeId,
        output: &mut String,
        depth: usize,
    ) -> Result<(), ClassifiedError> {
        let content = normalize_output(&self.render_children(doc, node, depth)?);
        let content = content.trim_matches('\n');
        if content.is_empty() {
            return Ok(());
        }

        ensure_blank_line(output);
        for line in content.lines() {
            if line.is_empty() {
                output.push_str(">\n");
            } else {
                output.push_str("> ");
                output.push_str(line);
                output.push('\n');
            }
        }
        output.push('\n');
        Ok(())
    }

    fn handle_table(
        &self,
        doc: &Document,
        node: NodeId,
        output: &mut String,
        depth: usize,
    ) -> Result<(), ClassifiedError> {
        let mut rows: Vec<Vec<String>> = Vec::new();
        let mut alignments: Vec<Alignment> = Vec::new();

        for row in table_rows(doc, node) {
            let mut cells = Vec::new();
            for cell in doc.child_elements(row) {
                if !(doc.is_element(cell, "td") || doc.is_element(cell, "th")) {
                    continue;
                }
                let content = self.render_children(doc, cell, depth + 3)?;
                cells.push(normalize_text(&content).replace('|', "\\|"));
                if rows.is_empty() {
                    alignments.push(cell_alignment(doc, cell));
                }
            }
            if !cells.is_empty() {
                rows.push(cells);
            }
        }

        let Some((header, body)) = rows.split_first() else {
            return Ok(());
        };

        ensure_blank_line(output);
        let columns = header.len();
        write_table_row(output, header, columns);
        output.push('|');
        for alignment in &alignments {
            output.push_str(match alignment {
                Alignment::Left => " --- |",
                Alignment::Center => " :---: |",
                Alignment::Right => " ---: |",
            });
        }
        output.push('\n');
        for row in body {
            write_table_row(output, row, columns);
        }
        output.push('\n');
        Ok(())
    }
}

fn handle_image(doc: &Document, node: NodeId, output: &mut String) {
    let Some(src) = doc.attr(node, "src").and_then(sanitize_url) else {
        return;
    };
    let alt = normalize_text(doc.attr(node, "alt").unwrap_or_default());

    output.push_str("![");
    output.push_str(&alt.replace('[', "\\[").replace(']', "\\]"));
    output.push_str("](");
    push_url(src, output);
    output.push(')');
}

fn handle_code_block(doc: &Document, node: NodeId, output: &mut String) {
    let language = code_language(doc, node).unwrap_or_default();
    let mut code = raw_text(doc, node);
    if code.ends_with('\n') {
        code.pop();
    }
    let code = code.replace("\r\n", "\n");

    // the fence must be longer than any backtick run inside the code
    let fence = "`".repeat(longest_backtick_run(&code).max(2) + 1);

    ensure_blank_line(output);
    output.push_str(&fence);
    output.push_str(&language);
    output.push('\n');
    output.push_str(&code);
    if !code.is_empty() {
        output.push('\n');
    }
    output.push_str(&fence);
    output.push_str("\n\n");
}

fn handle_inline_code(doc: &Document, node: NodeId, output: &mut String) {
    let code = raw_text(doc, node).replace(['\r', '\n'], " ");
    if code.trim().is_empty() {
        return;
    }

    let ticks = "`".repeat(longest_backtick_run(&code) + 1);
    let padded = code.starts_with('`') || code.ends_with('`');

    output.push_str(&ticks);
    if padded {
        output.push(' ');
    }
    output.push_str(&code);
    if padded {
        output.push(' ');
    }
    output.push_str(&ticks);
}

/// Language from `language-*` / `lang-*` classes of the `code` child or the `pre`
fn code_language(doc: &Document, pre: NodeId) -> Option<String> {
    let code_children = doc
        .child_elements(pre)
        .filter(|child| doc.is_element(*child, "code"));
    code_children
        .chain(std::iter::once(pre))
        .filter_map(|id| doc.element(id))
        .flat_map(|el| el.classes())
        .find_map(|class| {
            class
                .strip_prefix("language-")
                .or_else(|| class.strip_prefix("lang-"))
                .filter(|lang| !lang.is_empty())
                .map(str::to_string)
        })
}

/// Unnormalized text of a subtree
fn raw_text(doc: &Document, node: NodeId) -> String {
    doc.descendants(node)
        .filter_map(|id| match doc.kind(id) {
            NodeKind::Text(text) => Some(text),
            _ => None,
        })
        .collect()
}

fn longest_backtick_run(text: &str) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for ch in text.chars() {
        if ch == '`' {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

/// `tr` elements of a table in order, looking through `thead`/`tbody`/`tfoot`
fn table_rows(doc: &Document, table: NodeId) -> Vec<NodeId> {
    let mut rows = Vec::new();
    for child in doc.child_elements(table) {
        match doc.tag_name(child) {
            Some("tr") => rows.push(child),
            Some("thead" | "tbody" | "tfoot") => rows.extend(
                doc.child_elements(child)
                    .filter(|row| doc.is_element(*row, "tr")),
            ),
            _ => {}
        }
    }
    rows
}

fn cell_alignment(doc: &Document, cell: NodeId) -> Alignment {
    if let Some(align) = doc.attr(cell, "align") {
        return match align.to_ascii_lowercase().as_str() {
            "center" => Alignment::Center,
            "right" => Alignment::Right,
            _ => Alignment::Left,
        };
    }
    if let Some(style) = doc.attr(cell, "style") {
        let style = style.to_ascii_lowercase();
        if style.contains("text-align") {
            if style.contains("center") {
                return Alignment::Center;
            } else if style.contains("right") {
                return Alignment::Right;
            }
        }
    }
    Alignment::Left
}

/// Write one row padded or truncated to `columns` cells
fn write_table_row(output: &mut String, cells: &[String], columns: usize) {
    output.push('|');
    for i in 0..columns {
        output.push(' ');
        if let Some(cell) = cells.get(i) {
            output.push_str(cell);
            output.push(' ');
        }
        output.push('|');
    }
    output.push('\n');
}

fn write_list_segment(
    output: &mut String,
    segment: &str,
    indent: usize,
    marker: &str,
    first: &mut bool,
) {
    let content = segment.trim();
    if content.is_empty() {
        return;
    }

    for (i, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            output.push('\n');
            continue;
        }
        push_indent(output, indent);
        if i == 0 && *first {
            output.push_str(marker);
        } else {
            push_indent(output, marker.len());
        }
        output.push_str(line);
        output.push('\n');
    }
    *first = false;
}

fn push_indent(output: &mut String, width: usize) {
    for _ in 0..width {
        output.push(' ');
    }
}

fn sanitize_url(url: &str) -> Option<&str> {
    let url = url.trim();
    if url.is_empty() {
        return None;
    }
    let lower = url.to_ascii_lowercase();
    let dangerous = DANGEROUS_URL_SCHEMES
        .iter()
        .any(|scheme| lower.starts_with(scheme));
    (!dangerous).then_some(url)
}

fn push_url(url: &str, output: &mut String) {
    if url.contains([' ', '(', ')', '<', '>']) {
        output.push('<');
        output.push_str(&url.replace('<', "%3C").replace('>', "%3E"));
        output.push('>');
    } else {
        output.push_str(url);
    }
}

fn ensure_blank_line(output: &mut String) {
    if output.is_empty() || output.ends_with("\n\n") {
        return;
    }
    if output.ends_with('\n') {
        output.push('\n');
    } else {
        output.push_str("\n\n");
    }
}

/// Append a text node, collapsing whitespace and escaping line starts
fn push_text(text: &str, output: &mut String) {
    let normalized = normalize_text(text);
    if normalized.is_empty() {
        if !text.is_empty() && !output.ends_with(char::is_whitespace) {
            output.push(' ');
        }
        return;
    }

    if text.starts_with(char::is_whitespace)
        && !output.is_empty()
        && !output.ends_with(char::is_whitespace)
    {
        output.push(' ');
    }
    if at_line_start(output) {
        output.push_str(&escape_line_start(&normalized));
    } else {
        output.push_str(&normalized);
    }
    if text.ends_with(char::is_whitespace) {
        output.push(' ');
    }
}

fn at_line_start(output: &str) -> bool {
    output
        .rsplit('\n')
        .next()
        .is_none_or(|line| line.trim().is_empty())
}

/// Backslash-escape a character that would open a block construct
fn escape_line_start(text: &str) -> String {
    let Some(first) = text.chars().next() else {
        return String::new();
    };
    if matches!(first, '#' | '>' | '+' | '-' | '*' | '=' | '~' | '`' | '|' | '<') {
        return format!("\\{text}");
    }

    // ordered list markers: digits followed by '.' or ')'
    let digits = text.chars().take_while(char::is_ascii_digit).count();
    if digits > 0 && digits <= 9 {
        let rest = &text[digits..];
        if rest.starts_with(['.', ')']) {
            return format!("{}\\{}", &text[..digits], rest);
        }
    }
    text.to_string()
}

fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalize rendered Markdown for deterministic output
fn normalize_output(output: &str) -> String {
    let output = output.replace("\r\n", "\n");
    let mut result = String::with_capacity(output.len());
    let mut prev_blank = true;
    let mut fence: Option<usize> = None;

    for line in output.lines() {
        let trimmed = line.trim_end();
        let lead = trimmed.trim_start();
        let ticks = lead.chars().take_while(|c| *c == '`').count();

        match fence {
            Some(open) => {
                result.push_str(trimmed);
                result.push('\n');
                if ticks >= open && lead.len() == ticks {
                    fence = None;
                    prev_blank = false;
                }
                continue;
            }
            None if ticks >= 3 => fence = Some(ticks),
            None => {}
        }

        if trimmed.is_empty() {
            if !prev_blank {
                result.push('\n');
                prev_blank = true;
            }
            continue;
        }

        if fence.is_some() {
            result.push_str(trimmed);
        } else {
            result.push_str(&normalize_line_whitespace(trimmed));
        }
        result.push('\n');
        prev_blank = false;
    }

    while result.ends_with("\n\n") {
        result.pop();
    }
    if result.is_empty() {
        return result;
    }
    if !result.ends_with('\n') {
        result.push('\n');
    }
    result
}

/// Collapse space runs outside inline code, keeping leading indentation
fn normalize_line_whitespace(line: &str) -> String {
    let mut result = String::with_capacity(line.len());
    let mut prev_space = false;
    let mut at_start = true;
    let mut in_inline_code = false;

    for ch in line.chars() {
        if ch == '`' {
            in_inline_code = !in_inline_code;
            result.push(ch);
            prev_space = false;
            at_start = false;
        } else if ch == ' ' {
            if in_inline_code || at_start || !prev_space {
                result.push(ch);
            }
            prev_space = !at_start && !in_inline_code;
        } else {
            result.push(ch);
            prev_space = false;
            at_start = false;
        }
    }

    result
}
