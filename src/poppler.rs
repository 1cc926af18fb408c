use std::collections::BTreeMap;
use std::path::Path;
use std::process::Command;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::extract::{lower_extension, ExtractError, ExtractedDocument, Extractor};

static CELL_GAP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{2,}|\t+").unwrap());

/// Minimum consecutive row-like lines that make a table.
pub const MIN_TABLE_ROWS: usize = 3;
/// Minimum cells per row-like line.
pub const MIN_TABLE_CELLS: usize = 3;

#[derive(Debug, Error)]
pub enum PopplerError {
    #[error("FileNotFound: {0}")]
    FileNotFound(String),
    #[error("EncryptedPDF: {0}")]
    EncryptedPDF(String),
    #[error("PopplerError: {0}")]
    Other(String),
}

fn is_encrypted_stderr(stderr: &[u8]) -> bool {
    let err = String::from_utf8_lossy(stderr).to_lowercase();
    err.contains("encrypt") || err.contains("password")
}

/// Page count from `pdfinfo`, when the tool is present and succeeds.
pub fn pdfinfo_pages(path: &Path) -> Result<Option<usize>, PopplerError> {
    if which::which("pdfinfo").is_err() {
        return Ok(None);
    }
    match Command::new("pdfinfo").arg(path).output() {
        Ok(out) if out.status.success() => Ok(parse_pdfinfo_pages(&String::from_utf8_lossy(&out.stdout))),
        Ok(out) => {
            if is_encrypted_stderr(&out.stderr) {
                return Err(PopplerError::EncryptedPDF(path.display().to_string()));
            }
            Ok(None)
        }
        Err(_) => Ok(None),
    }
}

pub fn parse_pdfinfo_pages(stdout: &str) -> Option<usize> {
    stdout.lines().find_map(|line| line.strip_prefix("Pages:").and_then(|rest| rest.trim().parse::<usize>().ok()))
}

/// Extract text pages using Poppler's pdftotext with `-layout`.
/// Per-page when pdfinfo reports a page count, otherwise a single pass split on form feeds.
pub fn poppler_extract(path: &Path) -> Result<Vec<String>, PopplerError> {
    if !path.exists() {
        return Err(PopplerError::FileNotFound(path.display().to_string()));
    }

    if let Some(n_pages) = pdfinfo_pages(path)? {
        let mut pages: Vec<String> = Vec::with_capacity(n_pages);
        for i in 1..=n_pages {
            let out = Command::new("pdftotext")
                .arg("-layout")
                .arg("-nopgbrk")
                .arg("-q")
                .arg("-f")
                .arg(i.to_string())
                .arg("-l")
                .arg(i.to_string())
                .arg(path)
                .arg("-")
                .output()
                .map_err(|e| PopplerError::Other(e.to_string()))?;
            if !out.status.success() {
                if is_encrypted_stderr(&out.stderr) {
                    return Err(PopplerError::EncryptedPDF(path.display().to_string()));
                }
                return Err(PopplerError::Other(format!("pdftotext failed on page {}", i)));
            }
            pages.push(String::from_utf8_lossy(&out.stdout).to_string());
        }
        return Ok(pages);
    }

    // page breaks are kept so the output can be split
    let out = Command::new("pdftotext")
        .arg("-layout")
        .arg("-q")
        .arg(path)
        .arg("-")
        .output()
        .map_err(|e| PopplerError::Other(e.to_string()))?;
    if !out.status.success() {
        if is_encrypted_stderr(&out.stderr) {
            return Err(PopplerError::EncryptedPDF(path.display().to_string()));
        }
        return Err(PopplerError::Other("pdftotext failed".into()));
    }
    Ok(split_form_feeds(&String::from_utf8_lossy(&out.stdout)))
}

/// Split on form feeds and drop trailing blank pages.
pub fn split_form_feeds(s: &str) -> Vec<String> {
    let mut pages: Vec<String> = s.split('\u{000C}').map(|x| x.to_string()).collect();
    while matches!(pages.last(), Some(last) if last.trim().is_empty()) {
        pages.pop();
    }
    pages
}

/// Per-page image counts (0-based) from `pdfimages -list` output.
/// Only rows of type `image` count; masks and stencils are skipped.
pub fn parse_pdfimages_list(stdout: &str) -> BTreeMap<usize, usize> {
    let mut counts: BTreeMap<usize, usize> = BTreeMap::new();
    for line in stdout.lines() {
        let mut cols = line.split_whitespace();
        let (Some(page), Some(_num), Some(kind)) = (cols.next(), cols.next(), cols.next()) else { continue };
        let Ok(page_no) = page.parse::<usize>() else { continue };
        if page_no == 0 || kind != "image" {
            continue;
        }
        *counts.entry(page_no - 1).or_insert(0) += 1;
    }
    counts
}

/// Run `pdfimages -list`; an absent tool or a failure yields no counts.
pub fn pdfimages_counts(path: &Path) -> BTreeMap<usize, usize> {
    if which::which("pdfimages").is_err() {
        return BTreeMap::new();
    }
    match Command::new("pdfimages").arg("-list").arg(path).output() {
        Ok(out) if out.status.success() => parse_pdfimages_list(&String::from_utf8_lossy(&out.stdout)),
        _ => BTreeMap::new(),
    }
}

fn split_cells(line: &str) -> Vec<&str> {
    let mut cells: Vec<&str> = CELL_GAP_RE.split(line.trim()).map(str::trim).filter(|c| !c.is_empty()).collect();
    if cells.len() <= 1 && line.contains('|') {
        cells = line.split('|').map(str::trim).filter(|c| !c.is_empty()).collect();
    }
    cells
}

/// Count tables in layout-preserved page text: each run of at least
/// `MIN_TABLE_ROWS` consecutive lines with `MIN_TABLE_CELLS` or more cells.
pub fn count_layout_tables(page: &str) -> usize {
    let mut tables = 0usize;
    let mut run = 0usize;
    for line in page.lines() {
        if split_cells(line).len() >= MIN_TABLE_CELLS {
            run += 1;
            if run == MIN_TABLE_ROWS {
                tables += 1;
            }
        } else {
            run = 0;
        }
    }
    tables
}

pub fn layout_table_counts(pages: &[String]) -> BTreeMap<usize, usize> {
    pages.iter().enumerate().map(|(i, p)| (i, count_layout_tables(p))).filter(|(_, c)| *c > 0).collect()
}

/// PDF backend: pdftotext text, pdfimages image counts, layout table heuristic.
#[derive(Debug, Clone, Default)]
pub struct PopplerExtractor;

impl Extractor for PopplerExtractor {
    fn name(&self) -> &'static str {
        "poppler"
    }

    fn supports(&self, path: &Path) -> bool {
        lower_extension(path) == "pdf"
    }

    fn extract(&self, path: &Path) -> Result<ExtractedDocument, ExtractError> {
        if which::which("pdftotext").is_err() {
            return Err(ExtractError::MissingTool("pdftotext".into()));
        }
        let pages = poppler_extract(path)?;
        let tables = layout_table_counts(&pages);
        let images = pdfimages_counts(path);
        Ok(ExtractedDocument { pages, images, tables })
    }
}
