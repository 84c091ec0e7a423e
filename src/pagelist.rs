//! Page-numbering reconciliation for scanned works.
//!
//! A scan is a linear sequence of physical pages, each carrying a raw label:
//! a decimal number, a Roman numeral, a literal marker ("Title", "Cover"),
//! or the unlabeled sentinel [`UNLABELED`]. [`PageList`] compresses such a
//! label stream, one page at a time, into a minimal ordered set of
//! [`PageRange`]s — contiguous runs that share one numbering scheme — and
//! renders them to the `<pagelist .../>` tag the proofreading platform's
//! viewer consumes.
//!
//! After accumulation, [`PageList::clean_up`] corrects the common scandata
//! artifact where leading front-matter pages are marked unlabeled even
//! though the numbered sequence implies they belong to it, and
//! [`PageList::strip_pages`] recomputes the ranges over a compacted page
//! axis after physical pages (blanks, duplicates) are removed from the
//! accompanying file.

use std::collections::HashSet;
use std::fmt;

/// Raw label used by scan metadata for pages with no printed number.
pub const UNLABELED: &str = "–";

/// Numbering scheme of a run of pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Form {
    /// Decimal page numbers, incrementing by one along the run.
    Numeric,
    /// Lowercase Roman numerals, incrementing by one along the run.
    Roman,
    /// Uppercase Roman numerals (only reachable via direct construction;
    /// the classifier folds case before parsing).
    HighRoman,
    /// A literal label repeated verbatim on every page of the run.
    Literal,
}

impl Form {
    /// Display-style name as it appears in the pagelist tag.
    fn style_name(self) -> &'static str {
        match self {
            Form::Roman => "roman",
            Form::HighRoman => "highroman",
            Form::Numeric => "numeric",
            Form::Literal => "string",
        }
    }
}

/// Label of the first page in a run: an integer for incrementing forms,
/// verbatim text for literal runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Label {
    Number(i64),
    Text(String),
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Number(n) => write!(f, "{}", n),
            Label::Text(t) => write!(f, "{}", t),
        }
    }
}

/// A contiguous run of physical pages sharing one numbering scheme.
///
/// `start` and `end` are 1-based positions on the physical page axis of the
/// scan. For incrementing forms, physical page `start + k` carries label
/// `number + k`; for literal runs every page carries `number` verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRange {
    pub start: i64,
    pub end: i64,
    pub number: Label,
    pub form: Form,
}

impl PageRange {
    /// Build a run of `length` pages starting at physical position `start`.
    pub fn new(start: i64, number: Label, form: Form, length: i64) -> Self {
        PageRange {
            start,
            end: start + length - 1,
            number,
            form,
        }
    }

    /// Number of pages in the run. May be zero or negative for runs fully
    /// consumed by [`PageList::clean_up`]; those are pruned before output.
    pub fn length(&self) -> i64 {
        self.end - self.start + 1
    }

    /// Serialize for the pagelist tag. `offset` hides that many leading
    /// physical pages from the external numbering; adjusted positions
    /// never fall below 1.
    fn to_tag_str(&self, offset: i64) -> String {
        let adj = |n: i64| (n - offset).max(1);

        let start = adj(self.start);
        let end = adj(self.end);

        match self.form {
            Form::Numeric => format!("{}={}", start, self.number),
            Form::Roman | Form::HighRoman => {
                let style = self.form.style_name();
                if start == end {
                    format!("{}={}\n{}={}", start, self.number, start, style)
                } else {
                    format!("{}={}\n{}to{}={}", start, self.number, start, end, style)
                }
            }
            Form::Literal => {
                // TODO: confirm with the index maintainers whether comparing
                // the adjusted start against the raw (unadjusted) end is
                // intentional; already-published indexes were generated this
                // way, so changing it would reflow existing pages.
                if start == self.end {
                    format!("{}=\"{}\"", start, self.number)
                } else {
                    format!("{}to{}=\"{}\"", start, end, self.number)
                }
            }
        }
    }
}

/// Table-driven Roman numeral parser with subtractive notation.
///
/// Returns `None` for the empty string or any character outside the
/// numeral set, letting the caller fall through to decimal or literal
/// classification.
pub fn roman_to_int(s: &str) -> Option<i64> {
    fn digit(c: char) -> Option<i64> {
        match c {
            'I' => Some(1),
            'V' => Some(5),
            'X' => Some(10),
            'L' => Some(50),
            'C' => Some(100),
            'D' => Some(500),
            'M' => Some(1000),
            _ => None,
        }
    }

    if s.is_empty() {
        return None;
    }

    let mut total = 0;
    let mut prev = 0;
    for c in s.chars() {
        let val = digit(c)?;
        if prev > 0 && val > prev {
            // subtractive pair: the previous digit was already added, so
            // back it out twice (IV = -1 + 5)
            total += val - 2 * prev;
        } else {
            total += val;
        }
        prev = val;
    }
    Some(total)
}

fn classify(label: &str) -> (Form, Label) {
    if let Some(n) = roman_to_int(&label.to_uppercase()) {
        return (Form::Roman, Label::Number(n));
    }
    if let Ok(n) = label.parse::<i64>() {
        return (Form::Numeric, Label::Number(n));
    }
    (Form::Literal, Label::Text(label.to_string()))
}

/// Ordered set of [`PageRange`]s covering a scan's physical page axis.
///
/// Built by appending one raw label per physical page in scan order; the
/// ranges always stay ascending, non-overlapping, and contiguous over the
/// pages appended so far.
#[derive(Debug, Clone, Default)]
pub struct PageList {
    ranges: Vec<PageRange>,
    page: i64,
    title_index: Option<i64>,
}

impl PageList {
    pub fn new() -> Self {
        PageList::default()
    }

    /// The accumulated ranges, in physical page order.
    pub fn ranges(&self) -> &[PageRange] {
        &self.ranges
    }

    /// Physical pages represented (after [`strip_pages`](Self::strip_pages),
    /// the surviving count).
    pub fn page_count(&self) -> i64 {
        self.page
    }

    /// Physical position of the page labeled `Title`, if one was appended.
    pub fn title_index(&self) -> Option<i64> {
        self.title_index
    }

    /// Record the raw label of the next physical page.
    ///
    /// The label is classified as a Roman numeral, a decimal number, or a
    /// literal string, and either extends the last range (when it continues
    /// that range's numbering, or repeats its literal label) or opens a new
    /// one. Only the immediately preceding range is ever consulted.
    pub fn append(&mut self, label: &str) {
        self.page += 1;

        if label == "Title" {
            self.title_index = Some(self.page);
        }

        let (form, number) = classify(label);

        let Some(last) = self.ranges.last_mut() else {
            self.ranges.push(PageRange::new(self.page, number, form, 1));
            return;
        };

        let extends = match (&last.number, &number) {
            // both integer-like: continue only if this page carries the
            // label one past the last range's final member
            (Label::Number(prev), Label::Number(n)) if last.form == form => {
                *n == *prev + (last.end - last.start) + 1
            }
            _ => last.form == form && last.number == number,
        };

        if extends {
            last.end += 1;
        } else {
            self.ranges.push(PageRange::new(self.page, number, form, 1));
        }
    }

    /// Apply heuristic corrections to the accumulated ranges.
    ///
    /// Currently this borrows trailing pages from a leading unlabeled run
    /// when the first Roman or numeric run implies pages are missing below
    /// it, e.g. `1to9=–` / `10=2` becomes `1to8=–` / `9=1`.
    pub fn clean_up(&mut self) {
        self.fix_missing_first_pages(Form::Roman);
        self.fix_missing_first_pages(Form::Numeric);
        self.clear_empty_ranges();
    }

    fn fix_missing_first_pages(&mut self, form: Form) {
        let mut before = 0;
        let mut first = None;
        for i in 1..self.ranges.len() {
            if self.ranges[i].form == form {
                first = Some(i);
                break;
            }
            before = i;
        }

        let Some(first) = first else { return };

        let blank_before = self.ranges[before].form == Form::Literal
            && self.ranges[before].number == Label::Text(UNLABELED.to_string());
        if !blank_before {
            return;
        }

        let Label::Number(number) = &self.ranges[first].number else {
            return;
        };

        // can't borrow more pages than the unlabeled run has
        let offset = (*number - 1).min(self.ranges[before].length()).max(0);

        self.ranges[first].start -= offset;
        if let Label::Number(n) = &mut self.ranges[first].number {
            *n -= offset;
        }
        self.ranges[before].end -= offset;
    }

    fn clear_empty_ranges(&mut self) {
        self.ranges.retain(|r| r.length() > 0);
    }

    /// Render the tag consumed by the proofreading platform's viewer.
    ///
    /// `offset` hides that many leading physical pages from the external
    /// numbering (used when the scan opens with pages that are not part of
    /// the logical document).
    pub fn to_pagelist_tag(&self, offset: i64) -> String {
        let lines: Vec<String> = self.ranges.iter().map(|r| r.to_tag_str(offset)).collect();
        format!("<pagelist\n{}\n/>", lines.join("\n"))
    }

    /// Recompute the ranges after physical pages are removed from the scan.
    ///
    /// `include` selects the physical pages to keep (`None` or empty keeps
    /// all); `exclude` then drops pages from that selection. The surviving
    /// pages are renumbered onto a gapless 1..=N axis while each keeps the
    /// logical label it originally carried. Selected positions outside the
    /// covered span are ignored.
    pub fn strip_pages(&mut self, include: Option<&[i64]>, exclude: &[i64]) {
        let Some(last) = self.ranges.last() else { return };
        let last_end = last.end;

        let excluded: HashSet<i64> = exclude.iter().copied().collect();
        let keep: HashSet<i64> = match include {
            Some(inc) if !inc.is_empty() => {
                inc.iter().copied().filter(|p| !excluded.contains(p)).collect()
            }
            _ => (1..=last_end).filter(|p| !excluded.contains(p)).collect(),
        };

        let mut out = Vec::new();
        // cumulative count of removed physical positions seen so far
        let mut offset = 0;

        for r in &self.ranges {
            let survivors: Vec<i64> = (r.start..=r.end).filter(|p| keep.contains(p)).collect();

            let Some(&head) = survivors.first() else {
                offset += r.length();
                continue;
            };

            // pages dropped at the head of this range
            offset += head - r.start;

            let mut sub_start = head;
            let mut prev = head;
            for &p in &survivors[1..] {
                if p != prev + 1 {
                    out.push(Self::sub_range(r, sub_start, prev, offset));
                    offset += p - prev - 1;
                    sub_start = p;
                }
                prev = p;
            }
            out.push(Self::sub_range(r, sub_start, prev, offset));
        }

        self.title_index = self.title_index.and_then(|ti| {
            if keep.contains(&ti) && ti <= last_end {
                Some((1..=ti).filter(|p| keep.contains(p)).count() as i64)
            } else {
                None
            }
        });
        self.page = out.iter().map(|r| r.length()).sum();
        self.ranges = out;
    }

    /// Copy of `r` covering the surviving physical span
    /// `phys_start..=phys_end`, shifted left by `offset` onto the compacted
    /// axis. Incrementing forms keep the label their first surviving page
    /// carried; literal runs keep their text.
    fn sub_range(r: &PageRange, phys_start: i64, phys_end: i64, offset: i64) -> PageRange {
        let number = match &r.number {
            Label::Number(n) => Label::Number(n + (phys_start - r.start)),
            Label::Text(t) => Label::Text(t.clone()),
        };
        PageRange {
            start: phys_start - offset,
            end: phys_end - offset,
            number,
            form: r.form,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(labels: &[&str]) -> PageList {
        let mut pl = PageList::new();
        for label in labels {
            pl.append(label);
        }
        pl
    }

    #[test]
    fn roman_parsing() {
        assert_eq!(roman_to_int("I"), Some(1));
        assert_eq!(roman_to_int("IV"), Some(4));
        assert_eq!(roman_to_int("IX"), Some(9));
        assert_eq!(roman_to_int("XIV"), Some(14));
        assert_eq!(roman_to_int("MCMXCIV"), Some(1994));
        assert_eq!(roman_to_int(""), None);
        assert_eq!(roman_to_int("ABC"), None);
        assert_eq!(roman_to_int("X2"), None);
    }

    #[test]
    fn consecutive_numbers_merge_into_one_range() {
        let pl = build(&["5", "6", "7", "8"]);
        assert_eq!(pl.ranges().len(), 1);
        let r = &pl.ranges()[0];
        assert_eq!(r.form, Form::Numeric);
        assert_eq!(r.number, Label::Number(5));
        assert_eq!(r.length(), 4);
    }

    #[test]
    fn discontinuous_numbers_split() {
        let pl = build(&["5", "6", "9"]);
        assert_eq!(pl.ranges().len(), 2);
        assert_eq!(
            pl.ranges()[0],
            PageRange::new(1, Label::Number(5), Form::Numeric, 2)
        );
        assert_eq!(
            pl.ranges()[1],
            PageRange::new(3, Label::Number(9), Form::Numeric, 1)
        );
    }

    #[test]
    fn lowercase_roman_labels_merge() {
        let pl = build(&["i", "ii", "iii"]);
        assert_eq!(pl.ranges().len(), 1);
        let r = &pl.ranges()[0];
        assert_eq!(r.form, Form::Roman);
        assert_eq!(r.number, Label::Number(1));
        assert_eq!(r.length(), 3);
    }

    #[test]
    fn roman_to_numeric_transition_starts_new_range() {
        let pl = build(&["i", "ii", "1", "2"]);
        assert_eq!(pl.ranges().len(), 2);
        assert_eq!(pl.ranges()[0].form, Form::Roman);
        assert_eq!(pl.ranges()[1].form, Form::Numeric);
    }

    #[test]
    fn repeated_literals_merge_distinct_literals_split() {
        let pl = build(&["–", "–", "Cover", "–"]);
        assert_eq!(pl.ranges().len(), 3);
        assert_eq!(pl.ranges()[0].length(), 2);
        assert_eq!(pl.ranges()[1].number, Label::Text("Cover".to_string()));
        assert_eq!(pl.ranges()[2].length(), 1);
    }

    #[test]
    fn title_page_is_recorded() {
        let pl = build(&["–", "–", "Title", "1", "2"]);
        assert_eq!(pl.title_index(), Some(3));
        assert_eq!(pl.ranges().len(), 3);
        assert_eq!(pl.ranges()[0].length(), 2);

        // the run before the numeric one is "Title", not the unlabeled
        // sentinel, so clean_up must not shift anything
        let mut pl = pl;
        pl.clean_up();
        assert_eq!(pl.ranges().len(), 3);
        assert_eq!(pl.ranges()[2], PageRange::new(4, Label::Number(1), Form::Numeric, 2));
    }

    #[test]
    fn tag_rendering_is_idempotent() {
        let pl = build(&["–", "1", "2", "3"]);
        assert_eq!(pl.to_pagelist_tag(0), pl.to_pagelist_tag(0));
    }

    #[test]
    fn empty_list_renders_empty_tag() {
        let pl = PageList::new();
        assert_eq!(pl.to_pagelist_tag(0), "<pagelist\n\n/>");
    }

    #[test]
    fn blanks_then_numbers_starting_at_one() {
        let mut pl = build(&["–", "–", "–", "1", "2", "3", "4"]);
        pl.clean_up();
        // numbering already starts at 1: nothing to borrow
        assert_eq!(pl.ranges().len(), 2);
        assert_eq!(pl.to_pagelist_tag(0), "<pagelist\n1to3=\"–\"\n4=1\n/>");
    }

    #[test]
    fn clean_up_borrows_pages_from_leading_blanks() {
        let mut pl = build(&["–", "–", "3", "4", "5"]);
        pl.clean_up();
        // the blank run is fully consumed and pruned
        assert_eq!(pl.ranges().len(), 1);
        assert_eq!(pl.ranges()[0], PageRange::new(1, Label::Number(1), Form::Numeric, 5));
    }

    #[test]
    fn clean_up_offset_capped_at_blank_run_length() {
        let mut pl = build(&["–", "–", "–", "8", "9"]);
        pl.clean_up();
        assert_eq!(pl.ranges().len(), 1);
        let r = &pl.ranges()[0];
        // shifted by at most the 3 blank pages, never below start 1
        assert_eq!(r.start, 1);
        assert_eq!(r.number, Label::Number(5));
        assert_eq!(r.length(), 5);
    }

    #[test]
    fn clean_up_fixes_roman_then_numeric() {
        let mut pl = build(&["–", "–", "iii", "iv", "1", "2"]);
        pl.clean_up();
        assert_eq!(pl.ranges().len(), 2);
        assert_eq!(pl.ranges()[0], PageRange::new(1, Label::Number(1), Form::Roman, 4));
        assert_eq!(pl.ranges()[1], PageRange::new(5, Label::Number(1), Form::Numeric, 2));
    }

    #[test]
    fn clean_up_on_empty_list_is_noop() {
        let mut pl = PageList::new();
        pl.clean_up();
        assert!(pl.ranges().is_empty());
    }

    #[test]
    fn roman_range_renders_style_line() {
        let pl = build(&["i", "ii", "iii"]);
        assert_eq!(pl.to_pagelist_tag(0), "<pagelist\n1=1\n1to3=roman\n/>");

        let pl = build(&["iv"]);
        assert_eq!(pl.to_pagelist_tag(0), "<pagelist\n1=4\n1=roman\n/>");
    }

    #[test]
    fn offset_clamps_adjusted_positions_to_one() {
        let pl = build(&["–", "–", "1", "2"]);
        // hiding two leading pages: blank run collapses onto position 1
        assert_eq!(pl.to_pagelist_tag(2), "<pagelist\n1to1=\"–\"\n1=1\n/>");
    }

    #[test]
    fn literal_single_page_compares_raw_end() {
        // offset shifts the adjusted start away from the raw end, so a
        // one-page literal run renders in the ranged form
        let mut pl = PageList::new();
        pl.ranges.push(PageRange::new(
            5,
            Label::Text("Img".to_string()),
            Form::Literal,
            1,
        ));
        assert_eq!(pl.to_pagelist_tag(0), "<pagelist\n5=\"Img\"\n/>");
        assert_eq!(pl.to_pagelist_tag(4), "<pagelist\n1to1=\"Img\"\n/>");
    }

    #[test]
    fn strip_single_page_shifts_following_labels_left() {
        let mut pl = build(&["1", "2", "3", "4", "5", "6"]);
        pl.strip_pages(None, &[3]);

        assert_eq!(pl.page_count(), 5);
        let total: i64 = pl.ranges().iter().map(|r| r.length()).sum();
        assert_eq!(total, 5);

        // the label formerly on physical page 4 now sits at position 3
        assert_eq!(pl.ranges().len(), 2);
        assert_eq!(pl.ranges()[0], PageRange::new(1, Label::Number(1), Form::Numeric, 2));
        assert_eq!(pl.ranges()[1], PageRange::new(3, Label::Number(4), Form::Numeric, 3));
    }

    #[test]
    fn strip_whole_range_drops_it() {
        let mut pl = build(&["–", "–", "1", "2"]);
        pl.strip_pages(None, &[1, 2]);
        assert_eq!(pl.ranges().len(), 1);
        assert_eq!(pl.ranges()[0], PageRange::new(1, Label::Number(1), Form::Numeric, 2));
    }

    #[test]
    fn strip_with_include_selection() {
        let mut pl = build(&["1", "2", "3", "4", "5", "6"]);
        pl.strip_pages(Some(&[2, 3]), &[]);
        assert_eq!(pl.ranges().len(), 1);
        assert_eq!(pl.ranges()[0], PageRange::new(1, Label::Number(2), Form::Numeric, 2));
    }

    #[test]
    fn strip_exclude_wins_over_include() {
        let mut pl = build(&["1", "2", "3", "4"]);
        pl.strip_pages(Some(&[1, 2, 3]), &[2]);
        assert_eq!(pl.ranges().len(), 2);
        assert_eq!(pl.ranges()[0], PageRange::new(1, Label::Number(1), Form::Numeric, 1));
        assert_eq!(pl.ranges()[1], PageRange::new(2, Label::Number(3), Form::Numeric, 1));
    }

    #[test]
    fn strip_reselection_of_all_survivors_is_noop() {
        let mut pl = build(&["1", "2", "3", "4", "5", "6"]);
        pl.strip_pages(Some(&[2, 3, 5]), &[]);
        let before = pl.ranges().to_vec();

        let survivors: Vec<i64> = (1..=pl.page_count()).collect();
        pl.strip_pages(Some(&survivors), &[]);
        assert_eq!(pl.ranges(), &before[..]);
    }

    #[test]
    fn strip_literal_run_keeps_its_label() {
        let mut pl = build(&["–", "–", "–", "1", "2"]);
        pl.strip_pages(None, &[2]);
        assert_eq!(pl.ranges().len(), 2);
        assert_eq!(
            pl.ranges()[0],
            PageRange::new(1, Label::Text(UNLABELED.to_string()), Form::Literal, 2)
        );
        assert_eq!(pl.ranges()[1], PageRange::new(3, Label::Number(1), Form::Numeric, 2));
    }

    #[test]
    fn strip_out_of_span_selections_are_ignored() {
        let mut pl = build(&["1", "2"]);
        pl.strip_pages(None, &[99]);
        assert_eq!(pl.ranges().len(), 1);
        assert_eq!(pl.ranges()[0].length(), 2);
    }

    #[test]
    fn strip_to_nothing_yields_empty_list() {
        let mut pl = build(&["1", "2"]);
        pl.strip_pages(None, &[1, 2]);
        assert!(pl.ranges().is_empty());
        assert_eq!(pl.page_count(), 0);
        assert_eq!(pl.to_pagelist_tag(0), "<pagelist\n\n/>");
    }

    #[test]
    fn strip_on_empty_list_is_noop() {
        let mut pl = PageList::new();
        pl.strip_pages(None, &[1]);
        assert!(pl.ranges().is_empty());
    }

    #[test]
    fn strip_remaps_title_index() {
        let mut pl = build(&["–", "Title", "1", "2"]);
        assert_eq!(pl.title_index(), Some(2));

        let mut dropped_before = pl.clone();
        dropped_before.strip_pages(None, &[1]);
        assert_eq!(dropped_before.title_index(), Some(1));

        pl.strip_pages(None, &[2]);
        assert_eq!(pl.title_index(), None);
    }

    #[test]
    fn strip_then_render() {
        let mut pl = build(&["–", "–", "3", "4", "5", "6"]);
        pl.clean_up();
        // physical page 3 (label 3) is a duplicate leaf; drop it
        pl.strip_pages(None, &[3]);
        assert_eq!(pl.to_pagelist_tag(0), "<pagelist\n1=1\n3=4\n/>");
    }
}
