//! # folio CLI
//!
//! The `folio` binary drives the scan acquisition and index publication
//! workflow from the command line.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `folio pagelist` | Build and print the pagelist tag for a work |
//! | `folio index` | Print the Index page wikitext for a work |
//! | `folio download <source> <id>` | Fetch page images (or the assembled file) |
//! | `folio select <expr>...` | Expand a page-selection expression |
//! | `folio sources` | List source archives and endpoint status |
//!
//! ## Examples
//!
//! ```bash
//! # Pagelist from archive metadata
//! folio pagelist --source ia --id work00test
//!
//! # Pagelist from a local label file, hiding two leading pages and
//! # dropping a duplicate leaf
//! folio pagelist --labels-file labels.txt --offset 2 --exclude 17
//!
//! # Page images, politely throttled, resumable
//! folio download hathi uc1.b280676 --output-dir scans/
//!
//! # Index wikitext with the embedded pagelist
//! folio index --source ia --id work00test --title "A History of Things"
//! ```

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use folio::config::{self, Config};
use folio::download::{self, DownloadOptions};
use folio::models::WorkRecord;
use folio::pagelist_cmd::{self, PagelistRequest};
use folio::progress::ProgressMode;
use folio::range_selection;
use folio::source::make_source;
use folio::sources;

/// folio — acquire scanned works, reconcile their page numbering, and
/// publish paginated wiki indexes.
#[derive(Parser)]
#[command(
    name = "folio",
    about = "Acquire scanned works and publish paginated wiki indexes",
    version,
    long_about = "folio fetches scanned books and periodicals from external archives \
    (Internet Archive, HathiTrust), reconciles each scan's raw page labels into a \
    minimal pagelist tag, and renders the Index page wikitext that embeds it."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// All source endpoints, download behavior, and index rendering
    /// settings are read from this file; every setting has a default, so
    /// the file is optional.
    #[arg(long, global = true, default_value = "./config/folio.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Build and print the pagelist tag for a work.
    ///
    /// Labels come from the archive's scan metadata (`--source`/`--id`)
    /// or from a local file with one raw label per line
    /// (`--labels-file`). The accumulated ranges are normalised unless
    /// `--raw` is given.
    Pagelist {
        /// Source archive: `ia` or `hathi`.
        #[arg(long)]
        source: Option<String>,

        /// Identifier of the work at the source archive.
        #[arg(long)]
        id: Option<String>,

        /// Local file with one raw page label per line (blank lines are
        /// unlabeled pages).
        #[arg(long)]
        labels_file: Option<PathBuf>,

        /// Leading physical pages to hide from the external numbering.
        #[arg(long, default_value_t = 0)]
        offset: i64,

        /// Skip the clean-up pass; show ranges exactly as accumulated.
        #[arg(long)]
        raw: bool,

        /// Physical pages to keep, as selection expressions (repeatable).
        #[arg(long)]
        include: Vec<String>,

        /// Physical pages to drop, as selection expressions (repeatable).
        /// Exclusions win over inclusions.
        #[arg(long)]
        exclude: Vec<String>,
    },

    /// Print the Index page wikitext for a work.
    ///
    /// Descriptive metadata comes from flags or from a TOML work file;
    /// the pagelist tag is built from the scan metadata unless the work
    /// file supplies one.
    Index {
        /// Source archive: `ia` or `hathi`.
        #[arg(long)]
        source: Option<String>,

        /// Identifier of the work at the source archive.
        #[arg(long)]
        id: Option<String>,

        /// Local file with one raw page label per line.
        #[arg(long)]
        labels_file: Option<PathBuf>,

        /// TOML file with the work's descriptive metadata.
        #[arg(long)]
        work_file: Option<PathBuf>,

        /// Work title (overrides the work file).
        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        author: Option<String>,

        #[arg(long)]
        year: Option<String>,

        #[arg(long)]
        publisher: Option<String>,

        #[arg(long)]
        language: Option<String>,

        /// Leading physical pages hidden from the external numbering.
        #[arg(long)]
        page_offset: Option<i64>,
    },

    /// Fetch a work's page images into the output directory.
    ///
    /// Images are saved as `{id}.{seq:04}.{ext}`; existing non-empty
    /// files are skipped so an interrupted run can resume. With
    /// `--file`, the archive's assembled document (DjVu or PDF) is
    /// downloaded instead of page images.
    Download {
        /// Source archive: `ia` or `hathi`.
        source: String,

        /// Identifier of the work at the source archive.
        id: String,

        /// Directory to save into (default from config).
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Re-download sequences even when files already exist.
        #[arg(long)]
        no_skip_existing: bool,

        /// Stop after this many pages.
        #[arg(long)]
        limit: Option<i64>,

        /// Download the assembled document file instead of page images.
        #[arg(long, conflicts_with = "bundle")]
        file: bool,

        /// Download the archive's single-page image bundle (e.g. a JP2
        /// ZIP) and unpack it instead of fetching pages one by one.
        #[arg(long)]
        bundle: bool,

        /// Progress reporting on stderr: `off`, `human`, or `json`
        /// (default: human when stderr is a terminal).
        #[arg(long)]
        progress: Option<String>,
    },

    /// Expand page-selection expressions into individual page numbers.
    ///
    /// Accepts `4`, `4-7`, `6+2`, and `22-end` forms; `end` needs
    /// `--last`.
    Select {
        /// Selection expressions (comma- or space-separated).
        exprs: Vec<String>,

        /// Page number `end` refers to.
        #[arg(long)]
        last: Option<i64>,
    },

    /// List source archives and their endpoint status.
    Sources,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // the config file is optional: every section has defaults
    let cfg = if cli.config.exists() {
        config::load_config(&cli.config)?
    } else {
        Config::minimal()
    };

    match cli.command {
        Commands::Pagelist {
            source,
            id,
            labels_file,
            offset,
            raw,
            include,
            exclude,
        } => {
            let req = PagelistRequest {
                source,
                id,
                labels_file,
                offset,
                raw,
                include: split_expressions(&include),
                exclude: split_expressions(&exclude),
            };
            pagelist_cmd::run_pagelist(&cfg, &req).await?;
        }
        Commands::Index {
            source,
            id,
            labels_file,
            work_file,
            title,
            author,
            year,
            publisher,
            language,
            page_offset,
        } => {
            let mut record = match work_file {
                Some(path) => load_work_file(&path)?,
                None => WorkRecord::default(),
            };

            if let Some(title) = title {
                record.title = title;
            }
            if author.is_some() {
                record.author = author;
            }
            if year.is_some() {
                record.year = year;
            }
            if publisher.is_some() {
                record.publisher = publisher;
            }
            if language.is_some() {
                record.language = language;
            }
            if let Some(offset) = page_offset {
                record.page_offset = offset;
            }
            if record.source.is_none() {
                record.source = source;
            }
            if record.source_id.is_none() {
                record.source_id = id;
            }

            if record.title.is_empty() {
                anyhow::bail!("a title is required (--title or a work file)");
            }

            pagelist_cmd::run_index(&cfg, record, labels_file.as_deref()).await?;
        }
        Commands::Download {
            source,
            id,
            output_dir,
            no_skip_existing,
            limit,
            file,
            bundle,
            progress,
        } => {
            let src = make_source(&cfg, &source, &id)?;

            let mut opts = DownloadOptions::from_config(&cfg);
            if let Some(dir) = output_dir {
                opts.output_dir = dir;
            }
            if no_skip_existing {
                opts.skip_existing = false;
            }
            opts.limit = limit;
            opts.progress = ProgressMode::from_flag(progress.as_deref());

            if file {
                let dest = download::download_file(src.as_ref(), &opts).await?;
                println!("{}", dest.display());
            } else if bundle {
                let dir = download::download_bundle(src.as_ref(), &opts).await?;
                println!("{}", dir.display());
            } else {
                download::download_pages(src.as_ref(), &opts).await?;
            }
        }
        Commands::Select { exprs, last } => {
            let exprs = split_expressions(&exprs);
            let pages = range_selection::get_range_selection(&exprs, last)?;
            let pages: Vec<String> = pages.iter().map(|p| p.to_string()).collect();
            println!("{}", pages.join(" "));
        }
        Commands::Sources => {
            sources::list_sources(&cfg)?;
        }
    }

    Ok(())
}

/// Selection flags accept both repeated flags and comma/space-separated
/// lists; flatten to one expression per element.
fn split_expressions(raw: &[String]) -> Vec<String> {
    raw.iter()
        .flat_map(|s| s.split([',', ' ']))
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

fn load_work_file(path: &Path) -> anyhow::Result<WorkRecord> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("reading work file {}: {}", path.display(), e))?;
    toml::from_str(&content)
        .map_err(|e| anyhow::anyhow!("parsing work file {}: {}", path.display(), e))
}
