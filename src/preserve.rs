//! Document preservation: marker-delimited blocks and loss-free merging.
//!
//! A rendered document is split into alternating regions:
//!
//! - generated blocks, wrapped in `<!-- skillspec:generated:start/end -->`,
//!   which the renderer owns and may replace on every regeneration;
//! - manual blocks, wrapped in `<!-- skillspec:manual:start/end -->`,
//!   which are carried through byte-for-byte and never inspected.
//!
//! The markers must stay byte-exact for interoperability with other tools
//! that read the same documents.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::error::{Result, SkillspecError};

pub const GENERATED_START: &str = "<!-- skillspec:generated:start -->";
pub const GENERATED_END: &str = "<!-- skillspec:generated:end -->";
pub const MANUAL_START: &str = "<!-- skillspec:manual:start -->";
pub const MANUAL_END: &str = "<!-- skillspec:manual:end -->";

static FRONT_MATTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\A---[ \t]*\n.*?\n---[ \t]*\n").expect("valid regex"));

/// Ownership of a content block.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Generated,
    Manual,
    Unmarked,
}

/// A contiguous region of a parsed document.
#[derive(Debug, Clone, Serialize)]
pub struct ContentBlock {
    pub kind: BlockKind,
    pub content: String,
    /// The most recent `#`/`##` heading seen before the block closed.
    pub section_hint: Option<String>,
}

/// A document reconstructed from its marker stream.
///
/// Created fresh on every parse; only the merged text derived from it is
/// ever written back.
#[derive(Debug, Clone, Default)]
pub struct ParsedDocument {
    pub blocks: Vec<ContentBlock>,
    pub has_markers: bool,
    /// Non-fatal parse observations (e.g. a block left open at EOF).
    pub warnings: Vec<String>,
}

impl ParsedDocument {
    /// All manual blocks, in document order.
    #[must_use]
    pub fn manual_blocks(&self) -> Vec<&ContentBlock> {
        self.blocks
            .iter()
            .filter(|b| b.kind == BlockKind::Manual)
            .collect()
    }

    /// All generated blocks, in document order.
    #[must_use]
    pub fn generated_blocks(&self) -> Vec<&ContentBlock> {
        self.blocks
            .iter()
            .filter(|b| b.kind == BlockKind::Generated)
            .collect()
    }
}

/// Outcome of a [`reconcile`] merge.
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileResult {
    pub merged: String,
    pub manual_blocks_preserved: usize,
    pub generated_blocks_updated: usize,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

/// Parse a document into typed blocks by scanning its marker stream.
///
/// State machine over lines: a start marker flushes the current
/// accumulation (tagged with the state held before the marker) and opens
/// the new block; an end marker flushes the open block and returns to
/// unmarked; headings update the section hint and stay part of the
/// content; end of input flushes whatever remains. A document with no
/// markers at all becomes one single unmarked block.
///
/// # Errors
///
/// An end marker with no matching start corrupts the block structure in a
/// way that would make preservation unsafe, so it is fatal.
pub fn parse_document(content: &str) -> Result<ParsedDocument> {
    let mut doc = ParsedDocument {
        has_markers: content.contains(GENERATED_START) || content.contains(MANUAL_START),
        ..ParsedDocument::default()
    };

    if !doc.has_markers {
        doc.blocks.push(ContentBlock {
            kind: BlockKind::Unmarked,
            content: content.to_string(),
            section_hint: None,
        });
        return Ok(doc);
    }

    let mut state = BlockKind::Unmarked;
    let mut lines: Vec<&str> = Vec::new();
    let mut section: Option<String> = None;

    fn flush(
        blocks: &mut Vec<ContentBlock>,
        lines: &mut Vec<&str>,
        kind: BlockKind,
        section: Option<String>,
    ) {
        if !lines.is_empty() {
            blocks.push(ContentBlock {
                kind,
                content: lines.join("\n"),
                section_hint: section,
            });
            lines.clear();
        }
    }

    for line in content.split('\n') {
        if line.contains(GENERATED_START) {
            flush(&mut doc.blocks, &mut lines, state, section.clone());
            state = BlockKind::Generated;
            continue;
        }
        if line.contains(MANUAL_START) {
            flush(&mut doc.blocks, &mut lines, state, section.clone());
            state = BlockKind::Manual;
            continue;
        }
        if line.contains(GENERATED_END) || line.contains(MANUAL_END) {
            if state == BlockKind::Unmarked {
                return Err(SkillspecError::Reconciliation(format!(
                    "end marker without a matching start: {}",
                    line.trim()
                )));
            }
            doc.blocks.push(ContentBlock {
                kind: state,
                content: lines.join("\n"),
                section_hint: section.clone(),
            });
            lines.clear();
            state = BlockKind::Unmarked;
            continue;
        }

        if let Some(heading) = line.strip_prefix("## ") {
            section = Some(heading.trim().to_string());
        } else if let Some(heading) = line.strip_prefix("# ") {
            section = Some(heading.trim().to_string());
        }
        lines.push(line);
    }

    if state != BlockKind::Unmarked {
        tracing::warn!("document ends inside an open block");
        doc.warnings
            .push("document ends inside an open block".to_string());
    }
    flush(&mut doc.blocks, &mut lines, state, section);

    Ok(doc)
}

/// Split a leading front-matter header (`---` ... `---`) from the body.
#[must_use]
pub fn split_front_matter(content: &str) -> (Option<&str>, &str) {
    FRONT_MATTER
        .find(content)
        .map_or((None, content), |m| (Some(m.as_str()), &content[m.end()..]))
}

/// Wrap content in generated markers.
///
/// A leading front-matter header stays outside the markers: it must sit at
/// the very top of the file for downstream parsers to see it.
#[must_use]
pub fn wrap_generated(content: &str) -> String {
    match split_front_matter(content) {
        (Some(front), rest) => format!("{front}{GENERATED_START}\n{rest}\n{GENERATED_END}"),
        (None, _) => format!("{GENERATED_START}\n{content}\n{GENERATED_END}"),
    }
}

/// Wrap content in manual markers.
#[must_use]
pub fn wrap_manual(content: &str) -> String {
    format!("{MANUAL_START}\n{content}\n{MANUAL_END}")
}

/// Make an unmarked document ready for preservation by wrapping it once in
/// generated markers. Documents that already carry markers pass through.
pub fn add_markers(content: &str) -> Result<String> {
    let doc = parse_document(content)?;
    if doc.has_markers {
        Ok(content.to_string())
    } else {
        Ok(wrap_generated(content))
    }
}

/// Merge freshly generated content with a previous document, preserving
/// every manual block.
///
/// - `force` discards the previous document entirely; the fresh content
///   wins wholesale.
/// - A previous document without markers adopts the protocol: the fresh
///   content is wrapped in one generated block, with a warning.
/// - Otherwise the fresh content (front matter kept on top, unwrapped)
///   replaces the generated region, and every prior manual block is
///   re-wrapped and appended in order, blank-line separated.
///
/// # Errors
///
/// Corrupt marker structure in the previous document aborts the merge;
/// nothing should be written in that case.
pub fn reconcile(previous: &str, fresh: &str, force: bool) -> Result<ReconcileResult> {
    let mut result = ReconcileResult {
        merged: String::new(),
        manual_blocks_preserved: 0,
        generated_blocks_updated: 0,
        warnings: Vec::new(),
        errors: Vec::new(),
    };

    if force {
        result.merged = fresh.to_string();
        result
            .warnings
            .push("Force mode: all existing content replaced".to_string());
        return Ok(result);
    }

    let previous_doc = parse_document(previous)?;

    if !previous_doc.has_markers {
        result.merged = wrap_generated(fresh);
        result.warnings.push(
            "No markers found in existing content - wrapped new content in generated markers"
                .to_string(),
        );
        return Ok(result);
    }
    result.warnings.extend(previous_doc.warnings.clone());

    let manual_blocks = previous_doc.manual_blocks();
    result.manual_blocks_preserved = manual_blocks.len();

    let mut merged_parts: Vec<String> = Vec::new();

    if let (Some(front), rest) = split_front_matter(fresh) {
        merged_parts.push(front.trim().to_string());
        merged_parts.push(String::new());
        merged_parts.push(GENERATED_START.to_string());
        merged_parts.push(rest.trim().to_string());
        merged_parts.push(GENERATED_END.to_string());
    } else {
        merged_parts.push(GENERATED_START.to_string());
        merged_parts.push(fresh.trim().to_string());
        merged_parts.push(GENERATED_END.to_string());
    }
    result.generated_blocks_updated = 1;

    for block in manual_blocks {
        merged_parts.push(String::new());
        merged_parts.push(MANUAL_START.to_string());
        merged_parts.push(block.content.trim().to_string());
        merged_parts.push(MANUAL_END.to_string());
    }

    result.merged = merged_parts.join("\n");
    Ok(result)
}
