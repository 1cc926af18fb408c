use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::score::{score_requirement, EvidencePolicy, PageCounts, Verdict};
use crate::segment::{normalize_page, segment_document, Segment, SegmentationStrategy};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisOptions {
    pub strategy: SegmentationStrategy,
    pub evidence_policy: EvidencePolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub page_count: usize,
    pub word_count: usize,
    pub image_count: usize,
    pub table_count: usize,
    pub completeness_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Strategy that actually produced the segments.
    pub strategy: SegmentationStrategy,
    pub evidence_policy: EvidencePolicy,
    pub verdicts: Vec<Verdict>,
    pub stats: Stats,
}

impl Report {
    pub fn verdict(&self, name: &str) -> Option<&Verdict> {
        self.verdicts.iter().find(|v| v.requirement == name)
    }
}

/// Percentage of complete verdicts, one decimal; 0.0 for no verdicts.
pub fn completeness_percent(verdicts: &[Verdict]) -> f64 {
    if verdicts.is_empty() {
        return 0.0;
    }
    let ok = verdicts.iter().filter(|v| v.is_complete()).count();
    let pct = 100.0 * ok as f64 / verdicts.len() as f64;
    (pct * 10.0).round() / 10.0
}

/// Extractors may disagree on page count; take the largest view.
pub fn page_count(pages: &[String], images: &BTreeMap<usize, usize>, tables: &BTreeMap<usize, usize>) -> usize {
    let from_map = |m: &BTreeMap<usize, usize>| m.keys().next_back().map(|k| k + 1).unwrap_or(0);
    pages.len().max(from_map(images)).max(from_map(tables))
}

pub fn word_count(pages: &[String]) -> usize {
    pages.iter().map(|p| p.split_whitespace().count()).sum()
}

/// Segment, score and aggregate one document. Infallible: empty input
/// yields an all-incomplete report.
pub fn analyze(
    pages: &[String],
    images: &BTreeMap<usize, usize>,
    tables: &BTreeMap<usize, usize>,
    catalog: &Catalog,
    opts: &AnalysisOptions,
) -> Report {
    let normalized: Vec<String> = pages.iter().map(|p| normalize_page(p)).collect();
    let segmentation = segment_document(&normalized, catalog, opts.strategy);
    let counts = PageCounts { images, tables };
    let empty = Segment::default();

    let verdicts: Vec<Verdict> = catalog
        .requirements()
        .iter()
        .map(|req| {
            let seg = segmentation.segment(&req.name).unwrap_or(&empty);
            score_requirement(req, seg, counts, opts.evidence_policy)
        })
        .collect();

    let stats = Stats {
        page_count: page_count(pages, images, tables),
        word_count: word_count(&normalized),
        image_count: images.values().sum(),
        table_count: tables.values().sum(),
        completeness_percent: completeness_percent(&verdicts),
    };

    Report { strategy: segmentation.strategy, evidence_policy: opts.evidence_policy, verdicts, stats }
}
