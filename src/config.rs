use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub ia: IaConfig,
    #[serde(default)]
    pub hathi: HathiConfig,
    #[serde(default)]
    pub download: DownloadConfig,
    #[serde(default)]
    pub index: IndexConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IaConfig {
    #[serde(default = "default_ia_download_base")]
    pub download_base: String,
    /// Prefer a Text PDF over a DjVu when the item carries both.
    #[serde(default)]
    pub prefer_pdf: bool,
}

impl Default for IaConfig {
    fn default() -> Self {
        Self {
            download_base: default_ia_download_base(),
            prefer_pdf: false,
        }
    }
}

fn default_ia_download_base() -> String {
    "https://archive.org/download".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct HathiConfig {
    #[serde(default = "default_hathi_image_base")]
    pub image_base: String,
    #[serde(default = "default_hathi_metadata_base")]
    pub metadata_base: String,
    /// Longest-side pixel size requested from the image service.
    #[serde(default = "default_hathi_image_size")]
    pub image_size: u32,
}

impl Default for HathiConfig {
    fn default() -> Self {
        Self {
            image_base: default_hathi_image_base(),
            metadata_base: default_hathi_metadata_base(),
            image_size: default_hathi_image_size(),
        }
    }
}

fn default_hathi_image_base() -> String {
    "https://babel.hathitrust.org/cgi/imgsrv".to_string()
}
fn default_hathi_metadata_base() -> String {
    "https://babel.hathitrust.org/cgi/htd".to_string()
}
fn default_hathi_image_size() -> u32 {
    10000
}

#[derive(Debug, Deserialize, Clone)]
pub struct DownloadConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Skip sequences whose image file already exists non-empty.
    #[serde(default = "default_true")]
    pub skip_existing: bool,
    /// Pause between page requests, to stay polite to the archives.
    #[serde(default = "default_throttle_ms")]
    pub throttle_ms: u64,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            skip_existing: true,
            throttle_ms: default_throttle_ms(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("scans")
}
fn default_true() -> bool {
    true
}
fn default_throttle_ms() -> u64 {
    1000
}

#[derive(Debug, Deserialize, Clone)]
pub struct IndexConfig {
    /// Locale tag selecting the index template field map.
    #[serde(default = "default_language")]
    pub language: String,
    /// Progress code written when a record doesn't carry one.
    #[serde(default = "default_progress")]
    pub default_progress: String,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            default_progress: default_progress(),
        }
    }
}

fn default_language() -> String {
    "en".to_string()
}
fn default_progress() -> String {
    "X".to_string()
}

impl Config {
    /// All-defaults configuration for commands that can run without a
    /// config file (`select`, labels-file pagelist builds).
    pub fn minimal() -> Self {
        Config::default()
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.hathi.image_size == 0 {
        anyhow::bail!("hathi.image_size must be > 0");
    }

    if config.index.language.is_empty() {
        anyhow::bail!("index.language must not be empty");
    }

    for (key, base) in [
        ("ia.download_base", &config.ia.download_base),
        ("hathi.image_base", &config.hathi.image_base),
        ("hathi.metadata_base", &config.hathi.metadata_base),
    ] {
        if !base.starts_with("http://") && !base.starts_with("https://") {
            anyhow::bail!("{} must be an http(s) URL, got '{}'", key, base);
        }
    }

    Ok(config)
}
