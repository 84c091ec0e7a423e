//! Operator-facing page-selection expressions.
//!
//! Commands that take page sets (download exclusions, pagelist stripping)
//! accept compact expressions instead of exhaustive lists: `4` is a single
//! page, `4-7` an inclusive span, `6+2` a start plus a count, and `22-end`
//! a span to the last page of the work. [`get_range_selection`] expands a
//! list of such expressions into explicit page numbers.

use anyhow::{bail, Result};
use once_cell::sync::Lazy;
use regex::Regex;

static SPAN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)([+-])(\d+|end)$").expect("span expression pattern"));

/// Expand selection expressions into individual page numbers.
///
/// Duplicates are removed, keeping first-seen order. `last` supplies the
/// page number `end` refers to; an `end` span without it is an error, as is
/// any token that is neither a page number nor a span.
pub fn get_range_selection(exprs: &[String], last: Option<i64>) -> Result<Vec<i64>> {
    let mut pages = Vec::new();

    for expr in exprs {
        let expr = expr.trim();

        if let Some(caps) = SPAN_RE.captures(expr) {
            let from: i64 = caps[1].parse()?;

            match (&caps[2], &caps[3]) {
                ("-", "end") => {
                    let Some(last) = last else {
                        bail!("selection '{}' needs a known last page", expr);
                    };
                    pages.extend(from..=last);
                }
                ("-", to) => {
                    let to: i64 = to.parse()?;
                    pages.extend(from..=to);
                }
                ("+", count) => {
                    let count: i64 = count.parse()?;
                    pages.extend(from..=from + count);
                }
                _ => unreachable!("pattern admits only '-' and '+'"),
            }
        } else {
            let page: i64 = expr
                .parse()
                .map_err(|_| anyhow::anyhow!("invalid page selection: '{}'", expr))?;
            pages.push(page);
        }
    }

    // dedup, first occurrence wins
    let mut seen = std::collections::HashSet::new();
    pages.retain(|p| seen.insert(*p));

    Ok(pages)
}
