//! CLI entry points for `folio pagelist` and `folio index`.
//!
//! Both commands need the same front half: obtain a raw label sequence
//! (from a source archive or a local labels file), accumulate it into a
//! [`PageList`], and normalise it. `pagelist` then prints the tag;
//! `index` embeds it into the Index page wikitext.

use std::path::Path;

use anyhow::{bail, Result};

use crate::config::Config;
use crate::index_writer::IndexWriter;
use crate::models::WorkRecord;
use crate::pagelist::{PageList, UNLABELED};
use crate::range_selection::get_range_selection;
use crate::source::make_source;

/// Resolved `folio pagelist` arguments.
pub struct PagelistRequest {
    pub source: Option<String>,
    pub id: Option<String>,
    pub labels_file: Option<std::path::PathBuf>,
    pub offset: i64,
    /// Skip the clean-up pass and show the ranges exactly as accumulated.
    pub raw: bool,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

pub async fn run_pagelist(config: &Config, req: &PagelistRequest) -> Result<()> {
    let mut pl = build_pagelist(
        config,
        req.source.as_deref(),
        req.id.as_deref(),
        req.labels_file.as_deref(),
    )
    .await?;

    if !req.raw {
        pl.clean_up();
    }

    if !req.include.is_empty() || !req.exclude.is_empty() {
        let last = Some(pl.page_count());
        let include = get_range_selection(&req.include, last)?;
        let exclude = get_range_selection(&req.exclude, last)?;
        let include = if include.is_empty() {
            None
        } else {
            Some(include.as_slice())
        };
        pl.strip_pages(include, &exclude);
    }

    println!("{}", pl.to_pagelist_tag(req.offset));
    Ok(())
}

pub async fn run_index(
    config: &Config,
    mut record: WorkRecord,
    labels_file: Option<&Path>,
) -> Result<()> {
    if record.pagelist.is_none() {
        let built = match (
            record.source.as_deref(),
            record.source_id.as_deref(),
            labels_file,
        ) {
            (_, _, Some(path)) => Some(pagelist_from_labels_file(path)?),
            (Some(kind), Some(id), None) => {
                Some(make_source(config, kind, id)?.get_pagelist().await?)
            }
            _ => None,
        };

        match built {
            Some(mut pl) => {
                pl.clean_up();

                if record.image_page.is_none() {
                    if let Some(title_index) = pl.title_index() {
                        record.image_page = Some(title_index - record.page_offset);
                    }
                }

                record.pagelist = Some(pl.to_pagelist_tag(record.page_offset));
            }
            None => {
                record.pagelist = Some("<pagelist/>".to_string());
            }
        }
    }

    let writer = IndexWriter::new(config);
    println!("{}", writer.make_index_content(&record));
    Ok(())
}

async fn build_pagelist(
    config: &Config,
    source: Option<&str>,
    id: Option<&str>,
    labels_file: Option<&Path>,
) -> Result<PageList> {
    if let Some(path) = labels_file {
        return pagelist_from_labels_file(path);
    }

    match (source, id) {
        (Some(kind), Some(id)) => make_source(config, kind, id)?.get_pagelist().await,
        _ => bail!("either --labels-file or both --source and --id are required"),
    }
}

/// Build a [`PageList`] from a local file with one raw label per line.
/// Empty lines stand for unlabeled pages, matching what the source
/// adapters do with missing page numbers.
pub fn pagelist_from_labels_file(path: &Path) -> Result<PageList> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("reading labels file {}: {}", path.display(), e))?;

    let mut pl = PageList::new();
    for line in content.lines() {
        let label = line.trim();
        if label.is_empty() {
            pl.append(UNLABELED);
        } else {
            pl.append(label);
        }
    }
    Ok(pl)
}
