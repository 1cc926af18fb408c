use std::collections::HashSet;
use std::path::{Path, PathBuf};

use globwalk::GlobWalkerBuilder;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod catalog;
pub mod config;
pub mod emit;
pub mod extract;
pub mod ocr;
pub mod poppler;
pub mod report;
pub mod score;
pub mod segment;

pub use catalog::{Catalog, CatalogError, Requirement, RequirementSpec, MEASUREMENT_PATTERN, TEMPORAL_PATTERN};
pub use config::{load_config, parse_config, Config, ConfigError};
pub use emit::{emit_files, render_csv, render_markdown, report_fingerprint, EmitError, EmitPaths, ReportMeta};
pub use extract::{build_extractors, extract_ranked, Backend, ExtractError, ExtractedDocument, ExtractionOutcome, Extractor, PlainTextExtractor};
pub use poppler::{PopplerError, PopplerExtractor};
pub use report::{analyze, AnalysisOptions, Report, Stats};
pub use score::{score_requirement, EvidencePolicy, PageCounts, Status, Verdict};
pub use segment::{segment_document, Segment, SegmentationStrategy};

const SUPPORTED_EXTENSIONS: &[&str] = &["pdf", "txt", "md", "png", "jpg", "jpeg", "tif", "tiff", "bmp"];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DepsResult {
    pub ok: bool,
    pub missing: Vec<String>,
}

/// Check external tools.
/// - Required: pdftotext (Poppler)
/// - Optional: pdfinfo, pdfimages, pdftoppm, tesseract
/// `ok` is true iff the required tool is present.
pub fn check_deps() -> DepsResult {
    let mut missing = Vec::new();

    let has_pdftotext = which::which("pdftotext").is_ok();
    if !has_pdftotext {
        missing.push("pdftotext".to_string());
    }
    for optional in ["pdfinfo", "pdfimages", "pdftoppm", "tesseract"] {
        if which::which(optional).is_err() {
            missing.push(optional.to_string());
        }
    }

    DepsResult { ok: has_pdftotext, missing }
}

/// Render installation help for missing tools.
pub fn install_help_for(missing: &[String]) -> String {
    let mut pkgs: Vec<&str> = Vec::new();
    if missing.iter().any(|m| matches!(m.as_str(), "pdftotext" | "pdfinfo" | "pdfimages" | "pdftoppm")) {
        pkgs.push("poppler-utils");
    }
    if missing.iter().any(|m| m == "tesseract") {
        pkgs.push("tesseract-ocr");
        pkgs.push("tesseract-ocr-ind");
    }

    if pkgs.is_empty() {
        return String::new();
    }

    format!("Dependency missing. Install with:\n  sudo apt install {}", pkgs.join(" "))
}

#[derive(Debug, Error)]
pub enum EnumerateError {
    #[error("NoFilesFound")]
    NoFilesFound { guidance: String },
}

fn is_supported(path: &Path) -> bool {
    SUPPORTED_EXTENSIONS.contains(&extract::lower_extension(path).as_str())
}

/// Resolve the input: a single existing file, or a glob such as "./input/**/*.pdf".
/// Returns a sorted list of supported files.
pub fn enumerate_documents(input: &str) -> Result<Vec<PathBuf>, EnumerateError> {
    let direct = Path::new(input);
    if direct.is_file() {
        return if is_supported(direct) {
            Ok(vec![direct.to_path_buf()])
        } else {
            Err(EnumerateError::NoFilesFound { guidance: folder_guidance() })
        };
    }

    let (base, pat) = split_glob_base(input);
    if !base.is_dir() {
        return Err(EnumerateError::NoFilesFound { guidance: folder_guidance() });
    }
    let mut paths: Vec<PathBuf> = GlobWalkerBuilder::from_patterns(&base, &[pat.as_str()])
        .case_insensitive(true)
        .follow_links(false)
        .build()
        .map_err(|_| EnumerateError::NoFilesFound { guidance: folder_guidance() })?
        .filter_map(|e| e.ok())
        .map(|e| e.path().to_path_buf())
        .filter(|p| p.is_file() && is_supported(p))
        .collect();

    paths.sort();

    if paths.is_empty() {
        return Err(EnumerateError::NoFilesFound { guidance: folder_guidance() });
    }

    Ok(paths)
}

/// Split a glob into its literal leading directory and the remaining pattern.
/// A plain directory is walked recursively.
fn split_glob_base(input: &str) -> (PathBuf, String) {
    let path = Path::new(input);
    if path.is_dir() {
        return (path.to_path_buf(), "**/*".to_string());
    }
    let mut base = PathBuf::new();
    let mut rest: Vec<String> = Vec::new();
    for comp in path.components() {
        let part = comp.as_os_str().to_string_lossy();
        if rest.is_empty() && !part.contains(['*', '?', '[', '{']) {
            base.push(comp);
        } else {
            rest.push(part.to_string());
        }
    }
    if rest.is_empty() {
        // a literal path that is not a file: match it by name under its parent
        let name = base.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
        base.pop();
        rest.push(name);
    }
    if base.as_os_str().is_empty() {
        base.push(".");
    }
    (base, rest.join("/"))
}

fn folder_guidance() -> String {
    let guide = r#"No documents found for the input pattern (default ./input/**/*.pdf)
Suggested layout:
  ./input/<applicant>/permohonan.pdf
Supported: .pdf, .txt, .md, .png, .jpg, .tif
Or pass a single file: permitdoc --input path/to/document.pdf"#;
    guide.to_string()
}

/// Lowercase ASCII slug for output file names; "doc" when nothing remains.
pub fn slugify(base: &str) -> String {
    let lower = base.to_lowercase();
    let mut out = String::with_capacity(lower.len());
    let mut prev_dash = true;
    for ch in lower.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch);
            prev_dash = false;
        } else if !prev_dash {
            out.push('-');
            prev_dash = true;
        }
    }
    let trimmed = out.trim_end_matches('-');
    if trimmed.is_empty() {
        "doc".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Append `-N` until the slug is unused, then record it.
pub fn unique_slug(slug_in: String, used: &mut HashSet<String>) -> String {
    if used.insert(slug_in.clone()) {
        return slug_in;
    }
    let mut i = 1;
    loop {
        let candidate = format!("{}-{}", slug_in, i);
        if used.insert(candidate.clone()) {
            return candidate;
        }
        i += 1;
    }
}

// Utility to compute sha256 hex
pub fn sha256_hex(bytes: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let out = hasher.finalize();
    out.iter().map(|b| format!("{:02x}", b)).collect()
}
