//! The seam between the page-numbering core and the external archives.
//!
//! A [`ScanSource`] hands out everything folio needs to know about one
//! scanned work: how many pages it has, the raw page-label sequence (as a
//! built [`PageList`]), per-page images, and — for archives that serve
//! assembled documents — a direct file URL.

use anyhow::Result;
use async_trait::async_trait;

use crate::config::Config;
use crate::pagelist::PageList;
use crate::source_ht::HathiSource;
use crate::source_ia::IaSource;

/// A fetched page image: raw bytes plus the server-reported content type.
#[derive(Debug, Clone)]
pub struct PageImage {
    pub data: Vec<u8>,
    pub content_type: String,
}

/// An external archive holding one scanned work.
#[async_trait]
pub trait ScanSource: Send + Sync {
    /// Normalised identifier of the work at the archive.
    fn id(&self) -> &str;

    /// Whether the archive serves an assembled document file directly.
    fn can_download_file(&self) -> bool {
        false
    }

    /// URL of the best assembled document file, if the archive has one.
    async fn get_file_url(&self) -> Result<Option<String>> {
        Ok(None)
    }

    /// URL of a single-page image bundle (e.g. a JP2 ZIP), if the archive
    /// packages one.
    async fn get_page_bundle_url(&self) -> Result<Option<String>> {
        Ok(None)
    }

    /// Number of physical pages in the scan.
    async fn get_num_pages(&self) -> Result<i64>;

    /// Raw page labels in scan order, accumulated into a [`PageList`].
    async fn get_pagelist(&self) -> Result<PageList>;

    /// Image for one physical page (1-based sequence number).
    async fn get_image(&self, seq: i64) -> Result<PageImage>;
}

/// Instantiate the adapter for a source kind (`ia`, `hathi`).
pub fn make_source(config: &Config, kind: &str, id: &str) -> Result<Box<dyn ScanSource>> {
    match kind {
        "ia" => Ok(Box::new(IaSource::new(config, id))),
        "hathi" | "ht" => Ok(Box::new(HathiSource::new(config, id))),
        other => anyhow::bail!("unknown source kind: '{}' (expected ia or hathi)", other),
    }
}

/// Make an archive identifier safe for use in a filename.
pub fn sanitise_id(id: &str) -> String {
    id.replace(['/', ':', '$'], "_")
}

/// File extension (with leading dot) for a page-image content type.
/// Parameters after `;` are ignored; unknown types fall back to `.bin`.
pub fn mime_to_ext(content_type: &str) -> &'static str {
    let essence = content_type.split(';').next().unwrap_or_default().trim();
    match essence {
        "image/jpeg" => ".jpg",
        "image/png" => ".png",
        "image/tiff" => ".tif",
        "image/jp2" | "image/jpx" => ".jp2",
        "image/gif" => ".gif",
        _ => ".bin",
    }
}

/// Extensions a downloaded page image may have been saved under.
pub fn image_exts() -> &'static [&'static str] {
    &[".jpg", ".png", ".tif", ".jp2", ".gif"]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitised_ids_are_filename_safe() {
        assert_eq!(sanitise_id("uc1.$b280676"), "uc1._b280676");
        assert_eq!(sanitise_id("mdp.39015/12:3"), "mdp.39015_12_3");
        assert_eq!(sanitise_id("plainid00book"), "plainid00book");
    }

    #[test]
    fn content_type_parameters_are_ignored() {
        assert_eq!(mime_to_ext("image/jpeg"), ".jpg");
        assert_eq!(mime_to_ext("image/jpeg; charset=binary"), ".jpg");
        assert_eq!(mime_to_ext("application/octet-stream"), ".bin");
    }
}
