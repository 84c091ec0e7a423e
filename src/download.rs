//! Page image acquisition.
//!
//! Walks a work's sequences 1..=N, saving each page image under
//! `{sanitised_id}.{seq:04}.{ext}` in the output directory. Existing
//! non-empty files are skipped (resumable downloads), requests are
//! throttled to stay polite to the archives, and archives that serve
//! assembled documents can be fetched in one request instead.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::config::Config;
use crate::progress::{DownloadEvent, ProgressMode};
use crate::source::{image_exts, mime_to_ext, sanitise_id, ScanSource};

/// Options for one acquisition run, resolved from config and CLI flags.
pub struct DownloadOptions {
    pub output_dir: PathBuf,
    pub skip_existing: bool,
    pub throttle_ms: u64,
    pub limit: Option<i64>,
    pub progress: ProgressMode,
}

impl DownloadOptions {
    pub fn from_config(config: &Config) -> Self {
        DownloadOptions {
            output_dir: config.download.output_dir.clone(),
            skip_existing: config.download.skip_existing,
            throttle_ms: config.download.throttle_ms,
            limit: None,
            progress: ProgressMode::default_for_tty(),
        }
    }
}

/// Download every page image of a work.
pub async fn download_pages(source: &dyn ScanSource, opts: &DownloadOptions) -> Result<()> {
    std::fs::create_dir_all(&opts.output_dir)
        .with_context(|| format!("creating output dir {}", opts.output_dir.display()))?;

    let num_pages = source.get_num_pages().await?;
    let total = match opts.limit {
        Some(limit) => num_pages.min(limit),
        None => num_pages,
    };

    info!("Downloading {} pages of {}", total, source.id());

    let reporter = opts.progress.reporter();
    let esc_id = sanitise_id(source.id());

    for seq in 1..=total {
        let prefix = format!("{}.{:04}", esc_id, seq);

        if opts.skip_existing && have_image_with_prefix(&opts.output_dir, &prefix) {
            debug!("Skipping image for existing seq: {}", seq);
            reporter.report(DownloadEvent::Skipped {
                id: esc_id.clone(),
                seq,
                total,
            });
            continue;
        }

        let image = source.get_image(seq).await?;
        if image.data.is_empty() {
            bail!("zero-length image data for sequence {}", seq);
        }

        let ext = mime_to_ext(&image.content_type);
        let path = opts.output_dir.join(format!("{}{}", prefix, ext));
        debug!("Saving image for seq {} to {}", seq, path.display());
        std::fs::write(&path, &image.data)?;

        reporter.report(DownloadEvent::Saved {
            id: esc_id.clone(),
            seq,
            total,
        });

        if opts.throttle_ms > 0 && seq < total {
            tokio::time::sleep(std::time::Duration::from_millis(opts.throttle_ms)).await;
        }
    }

    info!(
        "Output directory now holds {} files",
        count_files_in_dir(&opts.output_dir)
    );

    Ok(())
}

/// Download the archive's assembled document file instead of page images.
/// Returns the path written.
pub async fn download_file(source: &dyn ScanSource, opts: &DownloadOptions) -> Result<PathBuf> {
    if !source.can_download_file() {
        bail!("{} cannot provide an assembled file", source.id());
    }

    let Some(url) = source.get_file_url().await? else {
        bail!("no suitable file found for {}", source.id());
    };

    std::fs::create_dir_all(&opts.output_dir)?;

    let filename = url
        .rsplit('/')
        .next()
        .unwrap_or("download.bin")
        .to_string();
    let dest = opts.output_dir.join(sanitise_id(&filename));

    if opts.skip_existing && file_nonempty(&dest) {
        info!("File already present: {}", dest.display());
        return Ok(dest);
    }

    info!("Downloading file: {}", url);

    let bytes = reqwest::get(&url)
        .await?
        .error_for_status()?
        .bytes()
        .await
        .with_context(|| format!("downloading {}", url))?;

    if bytes.is_empty() {
        bail!("zero-length download from {}", url);
    }

    std::fs::write(&dest, &bytes)?;
    info!("Wrote file to: {}", dest.display());

    Ok(dest)
}

/// Download the archive's single-page image bundle and unpack it next to
/// the regular page images. Returns the extraction directory.
pub async fn download_bundle(source: &dyn ScanSource, opts: &DownloadOptions) -> Result<PathBuf> {
    let Some(url) = source.get_page_bundle_url().await? else {
        bail!("no page-image bundle available for {}", source.id());
    };

    std::fs::create_dir_all(&opts.output_dir)?;

    let esc_id = sanitise_id(source.id());
    let zip_path = opts.output_dir.join(format!("{}_pages.zip", esc_id));
    let extract_dir = opts.output_dir.join(format!("{}_pages", esc_id));

    if !(opts.skip_existing && file_nonempty(&zip_path)) {
        info!("Downloading page bundle: {}", url);

        let bytes = reqwest::get(&url)
            .await?
            .error_for_status()?
            .bytes()
            .await
            .with_context(|| format!("downloading {}", url))?;
        std::fs::write(&zip_path, &bytes)?;
    }

    extract_zip_to(&zip_path, &extract_dir)?;
    Ok(extract_dir)
}

/// Unpack a downloaded ZIP bundle (e.g. an archive's single-page JP2 set)
/// into a directory. Skipped when the directory already holds at least as
/// many files as the archive has entries.
pub fn extract_zip_to(zip_path: &Path, dir: &Path) -> Result<()> {
    let file = std::fs::File::open(zip_path)
        .with_context(|| format!("opening {}", zip_path.display()))?;
    let mut archive = zip::ZipArchive::new(file)?;

    if dir.is_dir() && count_files_in_dir(dir) >= archive.len() {
        debug!("Skipping extraction, {} already populated", dir.display());
        return Ok(());
    }

    std::fs::create_dir_all(dir)?;
    archive
        .extract(dir)
        .with_context(|| format!("extracting {} to {}", zip_path.display(), dir.display()))?;
    Ok(())
}

/// True when any known image extension exists non-empty for this prefix.
fn have_image_with_prefix(dir: &Path, prefix: &str) -> bool {
    image_exts()
        .iter()
        .any(|ext| file_nonempty(&dir.join(format!("{}{}", prefix, ext))))
}

fn file_nonempty(path: &Path) -> bool {
    std::fs::metadata(path).map(|m| m.len() > 0).unwrap_or(false)
}

fn count_files_in_dir(dir: &Path) -> usize {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn existing_nonempty_image_is_detected() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path();

        assert!(!have_image_with_prefix(dir, "work.0001"));

        std::fs::write(dir.join("work.0001.jpg"), b"").unwrap();
        // zero-length files don't count as downloaded
        assert!(!have_image_with_prefix(dir, "work.0001"));

        std::fs::write(dir.join("work.0001.jpg"), b"jpegdata").unwrap();
        assert!(have_image_with_prefix(dir, "work.0001"));
        assert!(!have_image_with_prefix(dir, "work.0002"));
    }

    #[test]
    fn file_counting_ignores_subdirectory_entries() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path();
        std::fs::create_dir(dir.join("nested")).unwrap();
        std::fs::write(dir.join("a.jpg"), b"x").unwrap();
        std::fs::write(dir.join("nested/b.jpg"), b"x").unwrap();
        assert_eq!(count_files_in_dir(dir), 2);
    }
}
