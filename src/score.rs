use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::{Requirement, MEASUREMENT_PATTERN, TEMPORAL_PATTERN};
use crate::segment::Segment;

pub const NOTE_KEYWORD_MISSING: &str = "related keywords not found";
pub const NOTE_IMAGE_MISSING: &str = "mandatory image missing for this section";
pub const NOTE_TABLE_MISSING: &str = "mandatory table missing for this section";
pub const NOTE_NO_MEASUREMENT: &str = "no number with area unit (m², m2, ha) found; consider adding one";
pub const NOTE_NO_DATES: &str = "consider adding dates, periods or quarters to the schedule";

/// How mandatory image/table checks treat a segment with no pages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidencePolicy {
    /// Only pages spanned by the segment count; no pages means failure.
    #[default]
    SegmentLocal,
    /// No pages falls back to the document-wide totals.
    DocumentFallback,
}

/// Per-page image and table counts, keyed by 0-based page index.
#[derive(Debug, Clone, Copy)]
pub struct PageCounts<'a> {
    pub images: &'a BTreeMap<usize, usize>,
    pub tables: &'a BTreeMap<usize, usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Complete,
    Incomplete,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub requirement: String,
    /// Display name from the catalog, e.g. "Peta Lokasi".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub text_found: bool,
    pub visual_ok: bool,
    pub table_ok: bool,
    pub requires_visual: bool,
    pub requires_table: bool,
    pub status: Status,
    pub notes: Vec<String>,
    /// 1-based, ascending.
    pub evidence_pages: Vec<usize>,
}

impl Verdict {
    /// Requirement name with its catalog label, when there is one.
    pub fn display_name(&self) -> String {
        match &self.label {
            Some(label) => format!("{} ({})", self.requirement, label),
            None => self.requirement.clone(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.status == Status::Complete
    }

    /// Evidence pages for display, cut to `max` entries; `-` when empty.
    pub fn evidence_label(&self, max: usize) -> String {
        if self.evidence_pages.is_empty() {
            return "-".to_string();
        }
        self.evidence_pages.iter().take(max.max(1)).map(|p| p.to_string()).collect::<Vec<_>>().join(", ")
    }
}

fn mandatory_ok(required: bool, map: &BTreeMap<usize, usize>, seg: &Segment, policy: EvidencePolicy) -> bool {
    if !required {
        return true;
    }
    if seg.pages.is_empty() {
        return match policy {
            EvidencePolicy::SegmentLocal => false,
            EvidencePolicy::DocumentFallback => map.values().any(|&c| c > 0),
        };
    }
    seg.pages.iter().any(|p| map.get(p).copied().unwrap_or(0) > 0)
}

/// Score one requirement against its segment.
pub fn score_requirement(req: &Requirement, seg: &Segment, counts: PageCounts<'_>, policy: EvidencePolicy) -> Verdict {
    let text = seg.scoring_text();
    let text_found = req.matches_text(&text);
    let visual_ok = mandatory_ok(req.requires_visual, counts.images, seg, policy);
    let table_ok = mandatory_ok(req.requires_table, counts.tables, seg, policy);

    let mut notes = Vec::new();
    if !text_found {
        notes.push(NOTE_KEYWORD_MISSING.to_string());
    }
    if !visual_ok {
        notes.push(NOTE_IMAGE_MISSING.to_string());
    }
    if !table_ok {
        notes.push(NOTE_TABLE_MISSING.to_string());
    }
    // advisory only
    if req.expects_measurement && !MEASUREMENT_PATTERN.is_match(&text) {
        notes.push(NOTE_NO_MEASUREMENT.to_string());
    }
    if req.expects_dates && !TEMPORAL_PATTERN.is_match(&text) {
        notes.push(NOTE_NO_DATES.to_string());
    }

    let status = if text_found && visual_ok && table_ok { Status::Complete } else { Status::Incomplete };

    Verdict {
        requirement: req.name.clone(),
        label: req.label.clone(),
        text_found,
        visual_ok,
        table_ok,
        requires_visual: req.requires_visual,
        requires_table: req.requires_table,
        status,
        notes,
        evidence_pages: seg.pages.iter().map(|p| p + 1).collect(),
    }
}
