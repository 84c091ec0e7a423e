//! Core data models used throughout folio.
//!
//! These types describe one scanned work as it moves from acquisition to
//! index publication.

use serde::Deserialize;

/// Descriptive metadata for one scanned work, as supplied by the operator
/// (CLI flags or a TOML work file) and enriched from the source archive.
///
/// Field names mirror the proofreading platform's index template; optional
/// fields render as empty template parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkRecord {
    /// Mainspace title the work will live under. May be supplied on the
    /// command line instead of the work file.
    #[serde(default)]
    pub title: String,
    /// Display override for the title link, e.g. a shortened form.
    #[serde(default)]
    pub title_display: Option<String>,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub editor: Option<String>,
    #[serde(default)]
    pub translator: Option<String>,
    #[serde(default)]
    pub illustrator: Option<String>,
    #[serde(default)]
    pub publisher: Option<String>,
    #[serde(default)]
    pub printer: Option<String>,
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    /// Volume number within a multi-volume work.
    #[serde(default)]
    pub volume: Option<String>,
    /// Subpage the volume lives under; defaults to `Volume {volume}`.
    #[serde(default)]
    pub subpage: Option<String>,
    /// Display text for the volume link.
    #[serde(default)]
    pub volume_display: Option<String>,
    /// Parenthetical detail appended to the volume link.
    #[serde(default)]
    pub volume_detail: Option<String>,
    /// Archive the scan came from (`ia`, `hathi`).
    #[serde(default)]
    pub source: Option<String>,
    /// Identifier of the work at the source archive.
    #[serde(default)]
    pub source_id: Option<String>,
    /// Physical page to use as the index cover image (1-based, after
    /// offset adjustment). Derived from the Title page when unset.
    #[serde(default)]
    pub image_page: Option<i64>,
    /// Leading physical pages hidden from the external numbering.
    #[serde(default)]
    pub page_offset: i64,
    /// Pre-rendered pagelist tag; built from scan metadata when unset.
    #[serde(default)]
    pub pagelist: Option<String>,
    /// Proofreading progress code; falls back to the configured default.
    #[serde(default)]
    pub progress: Option<String>,
    #[serde(default)]
    pub oclc: Option<String>,
    #[serde(default)]
    pub wikidata: Option<String>,
}
