//! Internet Archive source adapter.
//!
//! An item at the archive carries a file list (`{id}_files.xml`) and, for
//! scanned books, a scandata document describing every leaf: its type
//! (Normal, Title, Cover...), its printed page number, and whether it is
//! included in access formats. This adapter turns that metadata into the
//! raw label stream the page-numbering core consumes, and locates the best
//! assembled document file for direct download.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::debug;

use crate::config::Config;
use crate::pagelist::{PageList, UNLABELED};
use crate::source::{PageImage, ScanSource};

pub struct IaSource {
    id: String,
    download_base: String,
    prefer_pdf: bool,
    client: reqwest::Client,
}

/// One `<file>` entry from the item's file list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IaFile {
    pub name: String,
    pub format: String,
}

/// One `<page>` entry from scandata, before label mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanPage {
    pub page_type: Option<String>,
    pub page_number: Option<String>,
    pub add_to_access: Option<String>,
}

impl IaSource {
    pub fn new(config: &Config, id: &str) -> Self {
        IaSource {
            id: normalise_ia_id(id),
            download_base: config.ia.download_base.clone(),
            prefer_pdf: config.ia.prefer_pdf,
            client: reqwest::Client::new(),
        }
    }

    fn download_url(&self, filename: &str) -> String {
        format!("{}/{}/{}", self.download_base, self.id, filename)
    }

    async fn get_filelist(&self) -> Result<Vec<IaFile>> {
        debug!("Getting IA file list for {}", self.id);

        let url = self.download_url(&format!("{}_files.xml", self.id));
        let body = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await
            .with_context(|| format!("fetching file list for {}", self.id))?;

        parse_filelist(&body)
    }

    async fn get_scandata(&self) -> Result<Vec<ScanPage>> {
        let files = self.get_filelist().await?;

        let scandata_name = match files_with_format(&files, "Scandata").first() {
            Some(f) => f.name.clone(),
            // scribe items ship scandata inside a ZIP the archive can
            // serve out of directly
            None => match files_with_format(&files, "Scribe Scandata ZIP").first() {
                Some(f) => format!("{}/scandata.xml", f.name),
                None => bail!("no scandata found for {}", self.id),
            },
        };

        debug!("Scan data found: {}", scandata_name);

        let url = self.download_url(&scandata_name);
        let body = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await
            .with_context(|| format!("fetching scandata for {}", self.id))?;

        parse_scandata(&body)
    }
}

#[async_trait]
impl ScanSource for IaSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn can_download_file(&self) -> bool {
        true
    }

    async fn get_file_url(&self) -> Result<Option<String>> {
        debug!("Getting IA source URL for ID {}", self.id);

        let files = self.get_filelist().await?;
        Ok(best_file(&files, self.prefer_pdf).map(|f| self.download_url(&f.name)))
    }

    async fn get_page_bundle_url(&self) -> Result<Option<String>> {
        let files = self.get_filelist().await?;
        Ok(files_with_format(&files, "Single Page Processed JP2 ZIP")
            .first()
            .map(|f| self.download_url(&f.name)))
    }

    async fn get_num_pages(&self) -> Result<i64> {
        let pages = self.get_scandata().await?;
        Ok(labels_from_scandata(&pages).len() as i64)
    }

    async fn get_pagelist(&self) -> Result<PageList> {
        debug!("Getting IA pagelist for ID {}", self.id);

        let pages = self.get_scandata().await?;

        let mut pl = PageList::new();
        for label in labels_from_scandata(&pages) {
            pl.append(&label);
        }
        Ok(pl)
    }

    async fn get_image(&self, seq: i64) -> Result<PageImage> {
        bail!(
            "archive.org serves assembled files, not page images (requested sequence {}); \
             use the file download path",
            seq
        );
    }
}

/// Strip a detail-page URL down to the bare item identifier.
pub fn normalise_ia_id(id: &str) -> String {
    if id.starts_with("http") {
        id.rsplit('/').next().unwrap_or(id).to_string()
    } else {
        id.to_string()
    }
}

fn files_with_format<'a>(files: &'a [IaFile], format: &str) -> Vec<&'a IaFile> {
    files
        .iter()
        .filter(|f| f.format.eq_ignore_ascii_case(format))
        .collect()
}

/// The preferred assembled document: DjVu over Text PDF, unless the item
/// only has a PDF or `prefer_pdf` is set.
pub fn best_file(files: &[IaFile], prefer_pdf: bool) -> Option<&IaFile> {
    let djvus = files_with_format(files, "DjVu");
    let pdfs = files_with_format(files, "Text PDF");

    if !pdfs.is_empty() && (djvus.is_empty() || prefer_pdf) {
        return Some(pdfs[0]);
    }
    djvus.first().copied()
}

/// Parse `{id}_files.xml` into (name, format) entries.
pub fn parse_filelist(xml: &[u8]) -> Result<Vec<IaFile>> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);

    let mut files = Vec::new();
    let mut current: Option<IaFile> = None;
    let mut in_format = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.name().local_name().as_ref() {
                b"file" => {
                    let name = e
                        .try_get_attribute("name")?
                        .map(|a| a.unescape_value())
                        .transpose()?
                        .unwrap_or_default()
                        .into_owned();
                    current = Some(IaFile {
                        name,
                        format: String::new(),
                    });
                }
                b"format" => in_format = current.is_some(),
                _ => {}
            },
            Ok(Event::Text(t)) if in_format => {
                if let Some(f) = current.as_mut() {
                    f.format = t.unescape()?.into_owned();
                }
            }
            Ok(Event::End(e)) => match e.name().local_name().as_ref() {
                b"format" => in_format = false,
                b"file" => {
                    if let Some(f) = current.take() {
                        files.push(f);
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => bail!("malformed file list XML: {}", e),
            _ => {}
        }
        buf.clear();
    }

    Ok(files)
}

/// Parse scandata XML into per-leaf entries. Element names are matched by
/// local name; scandata namespaces vary across scanning generations.
pub fn parse_scandata(xml: &[u8]) -> Result<Vec<ScanPage>> {
    #[derive(Clone, Copy)]
    enum Field {
        Type,
        Number,
        Access,
    }

    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);

    let mut pages = Vec::new();
    let mut current: Option<ScanPage> = None;
    let mut field: Option<Field> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.name().local_name().as_ref() {
                b"page" => current = Some(ScanPage::default()),
                b"pageType" if current.is_some() => field = Some(Field::Type),
                b"pageNumber" if current.is_some() => field = Some(Field::Number),
                b"addToAccessFormats" if current.is_some() => field = Some(Field::Access),
                _ => field = None,
            },
            Ok(Event::Text(t)) => {
                if let (Some(page), Some(field)) = (current.as_mut(), field) {
                    let text = t.unescape()?.into_owned();
                    match field {
                        Field::Type => page.page_type = Some(text),
                        Field::Number => page.page_number = Some(text),
                        Field::Access => page.add_to_access = Some(text),
                    }
                }
            }
            Ok(Event::End(e)) => match e.name().local_name().as_ref() {
                b"page" => {
                    if let Some(page) = current.take() {
                        pages.push(page);
                    }
                }
                b"pageType" | b"pageNumber" | b"addToAccessFormats" => field = None,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => bail!("malformed scandata XML: {}", e),
            _ => {}
        }
        buf.clear();
    }

    Ok(pages)
}

/// Map scandata leaves to raw page labels.
///
/// Leaves excluded from access formats are skipped entirely; Title and
/// Cover leaves get their literal markers; everything else uses the
/// printed page number, with missing numbers mapped to the unlabeled
/// sentinel.
pub fn labels_from_scandata(pages: &[ScanPage]) -> Vec<String> {
    let mut labels = Vec::new();

    for page in pages {
        if let Some(access) = &page.add_to_access {
            if access.eq_ignore_ascii_case("false") {
                continue;
            }
        }

        let label = match page.page_type.as_deref() {
            Some("Title") | Some("Title Page") => "Title".to_string(),
            Some("Cover") => "Cover".to_string(),
            _ => match &page.page_number {
                Some(n) if !n.is_empty() => n.clone(),
                _ => UNLABELED.to_string(),
            },
        };
        labels.push(label);
    }

    labels
}
