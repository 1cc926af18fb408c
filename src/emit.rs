use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::report::Report;
use crate::score::Verdict;
use crate::sha256_hex;

pub const CHECKLIST_HEADERS: [&str; 6] =
    ["Requirement", "Text Found", "Image/Table (if mandatory)", "Status", "Notes", "Evidence Pages"];

#[derive(Debug, Error)]
pub enum EmitError {
    #[error("WriteFailed: {0}")]
    WriteFailed(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmitPaths {
    pub json_path: String,
    pub md_path: String,
    pub csv_path: String,
}

/// Run context stored next to the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMeta {
    pub doc_id: String,
    pub file: String,
    pub backend: Option<String>,
    pub failed_backends: Vec<String>,
}

fn mark(ok: bool) -> &'static str {
    if ok {
        "yes"
    } else {
        "no"
    }
}

/// One checklist row, in `CHECKLIST_HEADERS` order.
pub fn checklist_row(v: &Verdict, max_evidence_pages: usize) -> [String; 6] {
    let aux = if v.requires_visual || v.requires_table { mark(v.visual_ok && v.table_ok) } else { "n/a" };
    let status = if v.is_complete() { "COMPLETE" } else { "INCOMPLETE" };
    [
        v.display_name(),
        mark(v.text_found).to_string(),
        aux.to_string(),
        status.to_string(),
        v.notes.join("; "),
        v.evidence_label(max_evidence_pages),
    ]
}

fn md_cell(s: &str) -> String {
    s.replace('|', "\\|")
}

/// Markdown rendering of the checklist dashboard.
pub fn render_markdown(report: &Report, title: &str, max_evidence_pages: usize) -> String {
    let s = &report.stats;
    let mut out = String::new();
    out.push_str(&format!("# Completeness checklist: {}\n\n", title));
    out.push_str(&format!(
        "Pages: {} | Words: {} | Images: {} | Tables: {} | Completeness: {}%\n\n",
        s.page_count, s.word_count, s.image_count, s.table_count, s.completeness_percent
    ));
    out.push_str(&format!("| {} |\n", CHECKLIST_HEADERS.join(" | ")));
    out.push_str(&format!("|{}\n", "---|".repeat(CHECKLIST_HEADERS.len())));
    for v in &report.verdicts {
        let row = checklist_row(v, max_evidence_pages);
        let cells: Vec<String> = row.iter().map(|c| md_cell(c)).collect();
        out.push_str(&format!("| {} |\n", cells.join(" | ")));
    }
    out
}

pub fn render_csv(report: &Report, max_evidence_pages: usize) -> Result<String, EmitError> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(CHECKLIST_HEADERS).map_err(|e| EmitError::WriteFailed(e.to_string()))?;
    for v in &report.verdicts {
        wtr.write_record(checklist_row(v, max_evidence_pages)).map_err(|e| EmitError::WriteFailed(e.to_string()))?;
    }
    let bytes = wtr.into_inner().map_err(|e| EmitError::WriteFailed(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| EmitError::WriteFailed(e.to_string()))
}

/// SHA-256 of the serialized report; stable for identical inputs.
pub fn report_fingerprint(report: &Report) -> Result<String, EmitError> {
    let bytes = serde_json::to_vec(report).map_err(|e| EmitError::WriteFailed(e.to_string()))?;
    Ok(sha256_hex(&bytes))
}

pub fn report_json(report: &Report, meta: &ReportMeta) -> Result<serde_json::Value, EmitError> {
    Ok(serde_json::json!({
        "meta": meta,
        "report": report,
        "report_fingerprint": report_fingerprint(report)?,
    }))
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), EmitError> {
    let pid = std::process::id();
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(format!(".tmp.{}", pid));
    let tmp = PathBuf::from(tmp);
    std::fs::write(&tmp, bytes).map_err(|e| EmitError::WriteFailed(e.to_string()))?;
    std::fs::rename(&tmp, path).map_err(|e| EmitError::WriteFailed(e.to_string()))
}

/// Atomically write report JSON, checklist markdown and CSV into outdir.
pub fn emit_files(report: &Report, meta: &ReportMeta, outdir: &str, max_evidence_pages: usize) -> Result<EmitPaths, EmitError> {
    std::fs::create_dir_all(outdir).map_err(|e| EmitError::WriteFailed(e.to_string()))?;
    let doc_id = &meta.doc_id;
    let json_path = Path::new(outdir).join(format!("{}.report.json", doc_id));
    let md_path = Path::new(outdir).join(format!("{}.checklist.md", doc_id));
    let csv_path = Path::new(outdir).join(format!("{}.checklist.csv", doc_id));

    let json = report_json(report, meta)?;
    let json_bytes = serde_json::to_vec_pretty(&json).map_err(|e| EmitError::WriteFailed(e.to_string()))?;
    write_atomic(&json_path, &json_bytes)?;
    write_atomic(&md_path, render_markdown(report, &meta.file, max_evidence_pages).as_bytes())?;
    write_atomic(&csv_path, render_csv(report, max_evidence_pages)?.as_bytes())?;

    Ok(EmitPaths {
        json_path: json_path.to_string_lossy().to_string(),
        md_path: md_path.to_string_lossy().to_string(),
        csv_path: csv_path.to_string_lossy().to_string(),
    })
}
