use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ocr::OcrExtractor;
use crate::poppler::{PopplerError, PopplerExtractor};

/// Pages plus per-page image/table counts, as handed to the analysis core.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedDocument {
    pub pages: Vec<String>,
    pub images: BTreeMap<usize, usize>,
    pub tables: BTreeMap<usize, usize>,
}

impl ExtractedDocument {
    pub fn has_text(&self) -> bool {
        self.pages.iter().any(|p| !p.trim().is_empty())
    }
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("FileNotFound: {0}")]
    FileNotFound(String),
    #[error("Unsupported: {0}")]
    Unsupported(String),
    #[error("MissingTool: {0}")]
    MissingTool(String),
    #[error("Io: {0}")]
    Io(String),
    #[error("OcrFailed: {0}")]
    Ocr(String),
    #[error(transparent)]
    Poppler(#[from] PopplerError),
}

/// One text/image/table extraction backend.
pub trait Extractor {
    fn name(&self) -> &'static str;
    fn supports(&self, path: &Path) -> bool;
    fn extract(&self, path: &Path) -> Result<ExtractedDocument, ExtractError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    Poppler,
    Ocr,
    Text,
}

impl Backend {
    pub fn default_rank() -> Vec<Backend> {
        vec![Backend::Poppler, Backend::Ocr, Backend::Text]
    }
}

pub fn lower_extension(path: &Path) -> String {
    path.extension().and_then(|e| e.to_str()).map(|e| e.to_ascii_lowercase()).unwrap_or_default()
}

/// Plain text input; pages split on form feeds.
#[derive(Debug, Clone, Default)]
pub struct PlainTextExtractor;

impl Extractor for PlainTextExtractor {
    fn name(&self) -> &'static str {
        "text"
    }

    fn supports(&self, path: &Path) -> bool {
        matches!(lower_extension(path).as_str(), "txt" | "md" | "text")
    }

    fn extract(&self, path: &Path) -> Result<ExtractedDocument, ExtractError> {
        if !path.exists() {
            return Err(ExtractError::FileNotFound(path.display().to_string()));
        }
        let bytes = std::fs::read(path).map_err(|e| ExtractError::Io(e.to_string()))?;
        let raw = String::from_utf8_lossy(&bytes);
        let mut pages: Vec<String> = raw.split('\u{000C}').map(|p| p.to_string()).collect();
        while matches!(pages.last(), Some(last) if last.trim().is_empty()) && pages.len() > 1 {
            pages.pop();
        }
        Ok(ExtractedDocument { pages, ..ExtractedDocument::default() })
    }
}

#[derive(Debug, Clone)]
pub struct ExtractionOptions {
    pub rank: Vec<Backend>,
    pub ocr_lang: String,
    pub ocr_dpi: u32,
}

impl Default for ExtractionOptions {
    fn default() -> Self {
        ExtractionOptions { rank: Backend::default_rank(), ocr_lang: "ind".to_string(), ocr_dpi: 300 }
    }
}

/// Build the ranked backend list.
pub fn build_extractors(opts: &ExtractionOptions) -> Vec<Box<dyn Extractor>> {
    opts.rank
        .iter()
        .map(|b| -> Box<dyn Extractor> {
            match b {
                Backend::Poppler => Box::new(PopplerExtractor),
                Backend::Ocr => Box::new(OcrExtractor::new(&opts.ocr_lang, opts.ocr_dpi)),
                Backend::Text => Box::new(PlainTextExtractor),
            }
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendFailure {
    pub backend: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionOutcome {
    pub backend: Option<String>,
    pub document: ExtractedDocument,
    pub failures: Vec<BackendFailure>,
}

/// Try each supporting backend in order; the first with non-blank text wins.
/// Never fails: when nothing works the document is empty.
pub fn extract_ranked(path: &Path, extractors: &[Box<dyn Extractor>]) -> ExtractionOutcome {
    let mut outcome = ExtractionOutcome::default();
    // first textless result, kept for its image/table counts
    let mut fallback: Option<(String, ExtractedDocument)> = None;
    for ex in extractors.iter().filter(|e| e.supports(path)) {
        match ex.extract(path) {
            Ok(doc) if doc.has_text() => {
                outcome.backend = Some(ex.name().to_string());
                outcome.document = doc;
                return outcome;
            }
            Ok(doc) => {
                outcome.failures.push(BackendFailure { backend: ex.name().to_string(), error: "no_text".to_string() });
                if fallback.is_none() {
                    fallback = Some((ex.name().to_string(), doc));
                }
            }
            Err(e) => {
                outcome.failures.push(BackendFailure { backend: ex.name().to_string(), error: e.to_string() });
            }
        }
    }
    if let Some((name, doc)) = fallback {
        outcome.backend = Some(name);
        outcome.document = doc;
    }
    outcome
}
