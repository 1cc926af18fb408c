use std::collections::{BTreeMap, BTreeSet};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;

/// Page break marker inserted between pages of the joined document.
pub const PAGE_BREAK: char = '\u{000C}';

/// "3. Tujuan", "B) Site Plan", "12. jadwal pelaksanaan". Letter markers are
/// uppercase only; "a." list items stay inside their section.
static HEADING_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[ \t]*(?:\d{1,3}|[A-Z])[.)][ \t]*(\p{L}[^\n]*)$").unwrap());
static HSPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\S\n]+").unwrap());

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentationStrategy {
    Headings,
    PageScan,
    #[default]
    Auto,
}

/// Text attributed to one requirement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub heading: String,
    pub text: String,
    /// 0-based page indices.
    pub pages: BTreeSet<usize>,
}

impl Segment {
    pub fn is_empty(&self) -> bool {
        self.heading.is_empty() && self.text.is_empty()
    }

    /// Heading title and body, the text keyword checks run against.
    pub fn scoring_text(&self) -> String {
        if self.heading.is_empty() {
            self.text.clone()
        } else if self.text.is_empty() {
            self.heading.clone()
        } else {
            format!("{}\n{}", self.heading, self.text)
        }
    }
}

/// A heading line found in the joined document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingMatch {
    /// Byte offset of the heading line start.
    pub start: usize,
    /// Byte offset just past the heading line.
    pub body_start: usize,
    /// Start of the next heading, or end of document.
    pub end: usize,
    pub title: String,
    pub requirement: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segmentation {
    pub strategy: SegmentationStrategy,
    pub segments: BTreeMap<String, Segment>,
}

impl Segmentation {
    pub fn segment(&self, name: &str) -> Option<&Segment> {
        self.segments.get(name)
    }
}

/// Collapse horizontal whitespace, keeping line structure and case.
/// Case matters for heading markers; segment text is lowercased later.
pub fn normalize_page(text: &str) -> String {
    let collapsed = HSPACE_RE.replace_all(text, " ");
    collapsed.lines().map(str::trim).collect::<Vec<_>>().join("\n").trim().to_string()
}

/// Join pages with a page-break marker on its own line.
pub fn join_pages(pages: &[String]) -> String {
    let sep = format!("\n{}\n", PAGE_BREAK);
    pages.join(sep.as_str())
}

/// Page index for a byte offset of the joined document.
fn page_at(breaks: &[usize], offset: usize) -> usize {
    breaks.partition_point(|&b| b < offset)
}

fn page_breaks(text: &str) -> Vec<usize> {
    text.match_indices(PAGE_BREAK).map(|(i, _)| i).collect()
}

/// Locate heading lines and classify them against the catalog.
pub fn find_headings(text: &str, catalog: &Catalog) -> Vec<HeadingMatch> {
    let raw: Vec<(usize, usize, String)> = HEADING_RE
        .captures_iter(text)
        .filter_map(|cap| {
            let whole = cap.get(0)?;
            let title = cap.get(1)?.as_str().trim().to_lowercase();
            Some((whole.start(), whole.end(), title))
        })
        .collect();

    let mut out = Vec::with_capacity(raw.len());
    for (i, (start, body_start, title)) in raw.iter().enumerate() {
        let end = raw.get(i + 1).map(|next| next.0).unwrap_or(text.len());
        let requirement = catalog.classify_heading(title).map(|r| r.name.clone());
        out.push(HeadingMatch { start: *start, body_start: *body_start, end, title: title.clone(), requirement });
    }
    out
}

fn strip_breaks(s: &str) -> String {
    s.replace(PAGE_BREAK, "").lines().map(str::trim).filter(|l| !l.is_empty()).collect::<Vec<_>>().join("\n").to_lowercase()
}

/// Heading-based segmentation. Every catalog requirement gets an entry;
/// a later heading for the same requirement replaces the earlier one.
pub fn segment_by_headings(text: &str, catalog: &Catalog) -> BTreeMap<String, Segment> {
    let mut segments: BTreeMap<String, Segment> =
        catalog.requirements().iter().map(|r| (r.name.clone(), Segment::default())).collect();
    let breaks = page_breaks(text);

    for heading in find_headings(text, catalog) {
        let Some(name) = heading.requirement.clone() else { continue };
        let body = &text[heading.body_start..heading.end];
        let last_content = body
            .char_indices()
            .rev()
            .find(|(_, c)| !c.is_whitespace() && *c != PAGE_BREAK)
            .map(|(i, _)| heading.body_start + i)
            .unwrap_or(heading.start);
        let first_page = page_at(&breaks, heading.start);
        let last_page = page_at(&breaks, last_content).max(first_page);
        segments.insert(
            name,
            Segment { heading: heading.title, text: strip_breaks(body), pages: (first_page..=last_page).collect() },
        );
    }
    segments
}

/// Page-scan segmentation: each requirement collects every page its patterns match.
pub fn segment_by_pages(pages: &[String], catalog: &Catalog) -> BTreeMap<String, Segment> {
    catalog
        .requirements()
        .iter()
        .map(|req| {
            let mut seg = Segment::default();
            let mut texts: Vec<&str> = Vec::new();
            for (idx, page) in pages.iter().enumerate() {
                if req.matches_text(page) {
                    seg.pages.insert(idx);
                    texts.push(page.as_str());
                }
            }
            seg.text = texts.join("\n").to_lowercase();
            (req.name.clone(), seg)
        })
        .collect()
}

/// Segment normalized pages with the requested strategy.
/// `Auto` uses headings unless no heading was assigned to any requirement.
pub fn segment_document(pages: &[String], catalog: &Catalog, strategy: SegmentationStrategy) -> Segmentation {
    match strategy {
        SegmentationStrategy::Headings => {
            Segmentation { strategy, segments: segment_by_headings(&join_pages(pages), catalog) }
        }
        SegmentationStrategy::PageScan => Segmentation { strategy, segments: segment_by_pages(pages, catalog) },
        SegmentationStrategy::Auto => {
            let by_headings = segment_by_headings(&join_pages(pages), catalog);
            if by_headings.values().any(|s| !s.is_empty()) {
                Segmentation { strategy: SegmentationStrategy::Headings, segments: by_headings }
            } else {
                Segmentation { strategy: SegmentationStrategy::PageScan, segments: segment_by_pages(pages, catalog) }
            }
        }
    }
}
