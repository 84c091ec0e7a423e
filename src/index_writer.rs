//! Index-page wikitext rendering.
//!
//! Turns a [`WorkRecord`] into the proofreading platform's Index page
//! template call: one `|Param=value` line per field the target wiki's
//! template knows about, with the pagelist tag from the page-numbering
//! core embedded verbatim. Parameter names are localized through a
//! per-language field map; unknown languages fall back to English.

use crate::config::Config;
use crate::models::WorkRecord;

/// (field key, localized template parameter) pairs, in template order.
type FieldMap = &'static [(&'static str, &'static str)];

const EN_FIELD_MAP: FieldMap = &[
    ("type", "Type"),
    ("title", "Title"),
    ("language", "Language"),
    ("volume", "Volume"),
    ("author", "Author"),
    ("editor", "Editor"),
    ("translator", "Translator"),
    ("illustrator", "Illustrator"),
    ("publisher", "Publisher"),
    ("printer", "Printer"),
    ("year", "Year"),
    ("city", "Address"),
    ("key", "Key"),
    ("oclc", "OCLC"),
    ("source", "Source"),
    ("image", "Image"),
    ("progress", "Progress"),
    ("pages", "Pages"),
    ("wikidata", "Wikidata"),
    ("remarks", "Remarks"),
];

fn field_map(language: &str) -> FieldMap {
    match language {
        "en" => EN_FIELD_MAP,
        _ => EN_FIELD_MAP,
    }
}

/// Sort key for the index listing: leading articles move to the back
/// ("The Title" sorts as "Title, The"). Titles without a leading article
/// need no key.
pub fn get_sortkey(title: &str) -> String {
    let mut words = title.split_whitespace();
    let Some(first) = words.next() else {
        return String::new();
    };

    if ["the", "a", "an"].contains(&first.to_lowercase().as_str()) {
        let rest: Vec<&str> = words.collect();
        format!("{}, {}", rest.join(" "), first)
    } else {
        String::new()
    }
}

/// Catalogue numbers are often pasted as full worldcat URLs; reduce those
/// to the bare OCLC number.
pub fn process_oclc(oclc: &str) -> &str {
    if oclc.contains("worldcat.org") {
        oclc.rsplit('/').next().unwrap_or(oclc)
    } else {
        oclc
    }
}

/// Source descriptor template for the index's Source field.
pub fn format_source(source: &str, id: &str) -> String {
    match source {
        "ia" => format!("{{{{IA|{}}}}}", id),
        "hathi" | "ht" => format!("{{{{HathiTrust|{}|book}}}}", id),
        _ => id.to_string(),
    }
}

pub struct IndexWriter {
    language: String,
    default_progress: String,
}

impl IndexWriter {
    pub fn new(config: &Config) -> Self {
        IndexWriter {
            language: config.index.language.clone(),
            default_progress: config.index.default_progress.clone(),
        }
    }

    /// Render the full Index page template call for a work.
    pub fn make_index_content(&self, r: &WorkRecord) -> String {
        let key = get_sortkey(&r.title);

        let title = match &r.title_display {
            Some(disp) => format!("[[{}|{}]]", r.title, disp),
            None => format!("[[{}]]", r.title),
        };

        let volume = volume_link(r);

        let mut lines = Vec::new();
        for (field, param) in field_map(&self.language) {
            let value = match *field {
                "type" => "book".to_string(),
                "title" => title.clone(),
                "language" => r.language.clone().unwrap_or_default(),
                "volume" => volume.clone(),
                "author" => r.author.clone().unwrap_or_default(),
                "editor" => r.editor.clone().unwrap_or_default(),
                "translator" => r.translator.clone().unwrap_or_default(),
                "illustrator" => r.illustrator.clone().unwrap_or_default(),
                "publisher" => r.publisher.clone().unwrap_or_default(),
                "printer" => r.printer.clone().unwrap_or_default(),
                "year" => r.year.clone().unwrap_or_default(),
                "city" => r.city.clone().unwrap_or_default(),
                "key" => key.clone(),
                "oclc" => r.oclc.as_deref().map(process_oclc).unwrap_or_default().to_string(),
                "source" => match (&r.source, &r.source_id) {
                    (Some(source), Some(id)) => format_source(source, id),
                    _ => String::new(),
                },
                "image" => r.image_page.map(|p| p.to_string()).unwrap_or_default(),
                "progress" => r
                    .progress
                    .clone()
                    .unwrap_or_else(|| self.default_progress.clone()),
                "pages" => r
                    .pagelist
                    .clone()
                    .unwrap_or_else(|| "<pagelist/>".to_string()),
                "wikidata" => r.wikidata.clone().unwrap_or_default(),
                "remarks" => String::new(),
                _ => continue,
            };
            lines.push(format!("|{}={}", param, value));
        }

        format!(
            "{{{{:MediaWiki:Proofreadpage_index_template\n{}\n}}}}",
            lines.join("\n")
        )
    }
}

/// `[[Title/Subpage|Display]]` link for a volume or sub-work, with the
/// optional parenthetical detail.
fn volume_link(r: &WorkRecord) -> String {
    let mut volume = if let Some(vol) = &r.volume {
        let subpage = r
            .subpage
            .clone()
            .unwrap_or_else(|| format!("Volume {}", vol));
        let disp = r.volume_display.clone().unwrap_or_else(|| subpage.clone());
        format!("[[{}/{}|{}]]", r.title, subpage, disp)
    } else if let (Some(subpage), Some(disp)) = (&r.subpage, &r.volume_display) {
        // not a volume as such, but still a sub-work-level link
        format!("[[{}/{}|{}]]", r.title, subpage, disp)
    } else {
        String::new()
    };

    if !volume.is_empty() {
        if let Some(detail) = &r.volume_detail {
            volume.push_str(&format!(" ({})", detail));
        }
    }

    volume
}
