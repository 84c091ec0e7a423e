//! HathiTrust source adapter.
//!
//! HathiTrust exposes per-volume metadata (page count plus a sequence map
//! with each leaf's printed page number) as JSON, and page images through
//! an image service addressed by sequence number. Assembled files are not
//! offered, so acquisition is always page-by-page.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::config::Config;
use crate::pagelist::{PageList, UNLABELED};
use crate::source::{PageImage, ScanSource};

pub struct HathiSource {
    htid: String,
    image_base: String,
    metadata_base: String,
    image_size: u32,
    client: reqwest::Client,
}

/// Volume metadata as returned by the structure endpoint.
#[derive(Debug, Deserialize)]
pub struct VolumeMeta {
    #[serde(rename = "htd:numpages")]
    numpages: serde_json::Value,
    #[serde(rename = "htd:seqmap", default)]
    seqmap: Vec<SeqMap>,
}

#[derive(Debug, Deserialize)]
struct SeqMap {
    #[serde(rename = "htd:seq", default)]
    seq: Vec<SeqEntry>,
}

#[derive(Debug, Deserialize)]
struct SeqEntry {
    #[serde(rename = "htd:pnum", default)]
    pnum: serde_json::Value,
}

impl HathiSource {
    pub fn new(config: &Config, htid: &str) -> Self {
        HathiSource {
            htid: normalise_htid(htid),
            image_base: config.hathi.image_base.clone(),
            metadata_base: config.hathi.metadata_base.clone(),
            image_size: config.hathi.image_size,
            client: reqwest::Client::new(),
        }
    }

    async fn get_meta(&self) -> Result<VolumeMeta> {
        let url = format!("{}/structure/{}?format=json&v=2", self.metadata_base, self.htid);
        let meta = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json::<VolumeMeta>()
            .await
            .with_context(|| format!("fetching volume metadata for {}", self.htid))?;
        Ok(meta)
    }
}

#[async_trait]
impl ScanSource for HathiSource {
    fn id(&self) -> &str {
        &self.htid
    }

    async fn get_num_pages(&self) -> Result<i64> {
        let meta = self.get_meta().await?;
        num_pages(&meta)
    }

    async fn get_pagelist(&self) -> Result<PageList> {
        let meta = self.get_meta().await?;

        let mut pl = PageList::new();
        for label in labels_from_seqmap(&meta) {
            pl.append(&label);
        }
        Ok(pl)
    }

    async fn get_image(&self, seq: i64) -> Result<PageImage> {
        debug!("Getting image for sequence {}", seq);

        let url = format!(
            "{}/image?id={};seq={};size={};rotation=0",
            self.image_base, self.htid, seq, self.image_size
        );

        let resp = self.client.get(&url).send().await?.error_for_status()?;
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = resp.bytes().await?.to_vec();

        Ok(PageImage { data, content_type })
    }
}

/// Strip handle and reader URLs down to the bare HTID.
pub fn normalise_htid(htid: &str) -> String {
    if htid.contains("hdl.handle.net") {
        return htid.rsplit('/').next().unwrap_or(htid).to_string();
    }
    if htid.contains("babel.hathitrust.org") {
        if let Ok(url) = reqwest::Url::parse(htid) {
            if let Some((_, id)) = url.query_pairs().find(|(k, _)| k == "id") {
                return id.into_owned();
            }
        }
    }
    htid.to_string()
}

/// Page count from the metadata; the endpoint has served it both as a
/// number and as a string across API generations.
pub fn num_pages(meta: &VolumeMeta) -> Result<i64> {
    match &meta.numpages {
        serde_json::Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| anyhow::anyhow!("non-integer page count: {}", n)),
        serde_json::Value::String(s) => s
            .parse()
            .with_context(|| format!("unparseable page count: '{}'", s)),
        other => bail!("unexpected page count value: {}", other),
    }
}

/// Raw labels from the sequence map, in scan order. Sequences with no
/// printed page number get the unlabeled sentinel.
pub fn labels_from_seqmap(meta: &VolumeMeta) -> Vec<String> {
    let Some(map) = meta.seqmap.first() else {
        return Vec::new();
    };

    map.seq
        .iter()
        .map(|entry| match &entry.pnum {
            serde_json::Value::String(s) if !s.is_empty() => s.clone(),
            serde_json::Value::Number(n) => n.to_string(),
            _ => UNLABELED.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const META: &str = r#"{
        "htd:numpages": 6,
        "htd:seqmap": [{
            "htd:seq": [
                {"htd:pnum": ""},
                {"htd:pnum": ""},
                {"htd:pnum": "i"},
                {"htd:pnum": "ii"},
                {"htd:pnum": "1"},
                {"htd:pnum": "2"}
            ]
        }]
    }"#;

    #[test]
    fn handle_urls_normalise_to_htids() {
        assert_eq!(
            normalise_htid("https://hdl.handle.net/2027/uc1.b280676"),
            "uc1.b280676"
        );
        assert_eq!(
            normalise_htid("https://babel.hathitrust.org/cgi/pt?id=mdp.39015&seq=7"),
            "mdp.39015"
        );
        assert_eq!(normalise_htid("uc1.b280676"), "uc1.b280676");
    }

    #[test]
    fn seqmap_labels_blank_out_missing_numbers() {
        let meta: VolumeMeta = serde_json::from_str(META).unwrap();
        assert_eq!(num_pages(&meta).unwrap(), 6);
        assert_eq!(
            labels_from_seqmap(&meta),
            vec![UNLABELED, UNLABELED, "i", "ii", "1", "2"]
        );
    }

    #[test]
    fn numeric_page_count_as_string() {
        let meta: VolumeMeta =
            serde_json::from_str(r#"{"htd:numpages": "12", "htd:seqmap": []}"#).unwrap();
        assert_eq!(num_pages(&meta).unwrap(), 12);
    }

    #[test]
    fn seqmap_feeds_pagelist() {
        let meta: VolumeMeta = serde_json::from_str(META).unwrap();
        let mut pl = PageList::new();
        for label in labels_from_seqmap(&meta) {
            pl.append(&label);
        }
        pl.clean_up();
        // two blank covers, then roman front matter, then the body
        assert_eq!(pl.ranges().len(), 3);
        assert_eq!(pl.to_pagelist_tag(0), "<pagelist\n1to2=\"–\"\n3=1\n3to4=roman\n5=1\n/>");
    }
}
