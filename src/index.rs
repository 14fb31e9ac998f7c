//! Markdown index document
//!
//! An index file is a sequence of paragraphs separated by blank lines. The
//! last paragraph holds the credit entries, one per line:
//!
//! ```text
//! - [label](percent-encoded-target): credit
//! ```
//!
//! All earlier paragraphs are free text and are kept verbatim. Entries are
//! keyed by the decoded link target, so writing an entry for a filename that
//! is already listed replaces the old line.
//!
//! A document without any blank line is a single paragraph, and that
//! paragraph is treated as the entry list even if it holds other text.

use crate::formatter::percent_decode;
use crate::types::IndexEntry;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Paragraph separator
const PARAGRAPH_SEPARATOR: &str = "\n\n";

/// `- [label](target): credit`
///
/// The label ends at the first `](` whose `]` is not backslash-escaped, so
/// hand-written labels with brackets (`Photo [1]`) still match.
fn entry_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        #[allow(clippy::expect_used)]
        Regex::new(r"(?m)^- \[((?:\\.|[^\\\n])+?)\]\((.+?)\): (.+)$")
            .expect("static index entry pattern is valid")
    })
}

/// Parsed index document
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexDocument {
    /// Free-text paragraphs before the entry list
    preamble: Vec<String>,
    /// Decoded filename -> raw entry line, ordered by filename
    entries: BTreeMap<String, String>,
}

impl IndexDocument {
    /// Parse index text
    ///
    /// Lines of the last paragraph that do not look like entries are dropped
    /// when the document is rendered again.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let text = text.replace("\r\n", "\n");
        let mut paragraphs: Vec<String> = text
            .trim()
            .split(PARAGRAPH_SEPARATOR)
            .map(str::to_string)
            .collect();
        // split always yields at least one item
        let last = paragraphs.pop().unwrap_or_default();

        let entries = entry_pattern()
            .captures_iter(&last)
            .filter_map(|caps| {
                let line = caps.get(0)?.as_str().to_string();
                let target = caps.get(2)?.as_str();
                Some((percent_decode(target), line))
            })
            .collect();

        Self {
            preamble: paragraphs,
            entries,
        }
    }

    /// Insert or replace entries by filename
    pub fn upsert(&mut self, entries: impl IntoIterator<Item = IndexEntry>) {
        for entry in entries {
            self.entries.insert(entry.filename, entry.line);
        }
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the entry list is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Raw line stored for `filename`
    pub fn get(&self, filename: &str) -> Option<&str> {
        self.entries.get(filename).map(String::as_str)
    }

    /// Free-text paragraphs, in document order
    pub fn preamble(&self) -> &[String] {
        &self.preamble
    }

    /// Render the document
    ///
    /// Entries are sorted by decoded filename, paragraphs are joined by one
    /// blank line, and the text ends with exactly one newline.
    #[must_use]
    pub fn render(&self) -> String {
        let entry_list = self
            .entries
            .values()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("\n");

        let mut paragraphs: Vec<&str> = self.preamble.iter().map(String::as_str).collect();
        paragraphs.push(&entry_list);

        let mut text = paragraphs.join(PARAGRAPH_SEPARATOR);
        text.push('\n');
        text
    }
}

/// Parse `text`, upsert `entries`, and render the result
#[must_use]
pub fn merge(text: &str, entries: impl IntoIterator<Item = IndexEntry>) -> String {
    let mut document = IndexDocument::parse(text);
    document.upsert(entries);
    document.render()
}
