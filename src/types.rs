//! Core types for commons-archivist

use std::ops::{BitOr, BitOrAssign};

/// A textual metadata value together with where it came from
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MetadataValue {
    /// The value (may contain HTML markup)
    pub value: String,
    /// Source of the value as reported by the API (e.g., "commons-desc-page")
    pub source: Option<String>,
}

impl MetadataValue {
    /// Create a value without a source
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            source: None,
        }
    }
}

/// Extended author and license metadata attached to an image variant
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExtMetadata {
    /// Artist (HTML)
    pub artist: Option<MetadataValue>,
    /// License short name (e.g., "CC BY-SA 4.0")
    pub license_short_name: Option<MetadataValue>,
    /// License URL
    pub license_url: Option<MetadataValue>,
}

/// A single image variant of a page
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageVariant {
    /// URL of the file description page
    pub description_url: String,
    /// URL of the binary content
    pub url: String,
    /// Extended metadata
    pub ext_metadata: ExtMetadata,
}

/// A media page resolved by the query stage
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageRecord {
    /// Page title, usually namespace-prefixed (e.g., "File:Example.jpg")
    pub title: String,
    /// Image variants; empty when the API returned no image information
    pub image_info: Vec<ImageVariant>,
}

impl PageRecord {
    /// Filename derived from the title by stripping the namespace prefix
    pub fn filename(&self) -> &str {
        crate::utils::derived_filename(&self.title)
    }

    /// The variant that gets downloaded, if any
    pub fn primary_image(&self) -> Option<&ImageVariant> {
        self.image_info.first()
    }
}

/// A formatted index line keyed by the decoded filename
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexEntry {
    /// Decoded filename
    pub filename: String,
    /// Raw Markdown line, `- [label](target): credit`
    pub line: String,
}

/// Pipeline stage
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Metadata query
    Query,
    /// Binary fetch
    Fetch,
    /// Index merge
    Index,
}

impl Stage {
    /// Flag set when the stage aborts
    pub fn error_flag(&self) -> ExitCode {
        match self {
            Stage::Query => ExitCode::QUERY_ERROR,
            Stage::Fetch => ExitCode::FETCH_ERROR,
            Stage::Index => ExitCode::INDEX_ERROR,
        }
    }

    /// Flag set when individual failures were swallowed, if the stage has one
    pub fn partial_flag(&self) -> Option<ExitCode> {
        match self {
            Stage::Query => Some(ExitCode::QUERY_ERROR_PARTIAL),
            Stage::Fetch => Some(ExitCode::FETCH_ERROR_PARTIAL),
            Stage::Index => None,
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Query => "querying",
            Stage::Fetch => "fetching",
            Stage::Index => "indexing",
        };
        f.write_str(name)
    }
}

/// Bit flags describing which stages failed, fully or partially.
///
/// Starts empty, accumulates with `|=` as stages complete, and is finally
/// turned into the process exit status.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ExitCode(u8);

impl ExitCode {
    /// No failure
    pub const SUCCESS: ExitCode = ExitCode(0);
    /// The run aborted
    pub const GENERIC_ERROR: ExitCode = ExitCode(1);
    /// The query stage aborted
    pub const QUERY_ERROR: ExitCode = ExitCode(1 << 1);
    /// The fetch stage aborted
    pub const FETCH_ERROR: ExitCode = ExitCode(1 << 2);
    /// The index stage aborted
    pub const INDEX_ERROR: ExitCode = ExitCode(1 << 3);
    /// Some queries failed and were ignored
    pub const QUERY_ERROR_PARTIAL: ExitCode = ExitCode(1 << 4);
    /// Some fetches failed and were ignored
    pub const FETCH_ERROR_PARTIAL: ExitCode = ExitCode(1 << 5);

    /// Raw bits
    pub fn bits(&self) -> u8 {
        self.0
    }

    /// Whether every bit of `other` is set
    pub fn contains(&self, other: ExitCode) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether no flag is set
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl BitOr for ExitCode {
    type Output = ExitCode;

    fn bitor(self, rhs: ExitCode) -> ExitCode {
        ExitCode(self.0 | rhs.0)
    }
}

impl BitOrAssign for ExitCode {
    fn bitor_assign(&mut self, rhs: ExitCode) {
        self.0 |= rhs.0;
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        i32::from(code.0)
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code.0)
    }
}
