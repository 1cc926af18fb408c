use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::{Deserialize, Serialize};

use crate::extract::{lower_extension, ExtractError, ExtractedDocument, Extractor};
use crate::poppler::{pdfimages_counts, pdfinfo_pages};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "tif", "tiff", "bmp"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrText {
    pub index: usize,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrErrorEntry {
    pub index: usize,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct OcrOutcome {
    pub texts: Vec<OcrText>,
    pub skipped_due_to_missing_deps: bool,
    pub errors: Vec<OcrErrorEntry>,
}

/// Run tesseract on one image, retrying with `ind+eng` and then PSM 6.
pub fn tesseract_image(image: &Path, lang: &str) -> Result<String, String> {
    let run_tess = |lang_arg: &str, psm_arg: u8| -> Result<String, String> {
        let out = Command::new("tesseract")
            .arg(image)
            .arg("stdout")
            .arg("-l")
            .arg(lang_arg)
            .arg("--psm")
            .arg(psm_arg.to_string())
            .arg("--oem")
            .arg("1")
            .output();
        match out {
            Ok(o) if o.status.success() => {
                let s = String::from_utf8_lossy(&o.stdout).to_string();
                if s.trim().is_empty() {
                    Err("empty_text".into())
                } else {
                    Ok(s)
                }
            }
            Ok(o) => Err(format!("tesseract_exit_{}", o.status.code().unwrap_or(-1))),
            Err(e) => Err(format!("tesseract_spawn_error: {}", e)),
        }
    };

    run_tess(lang, 4).or_else(|e1| {
        let fallback_lang = if lang.contains('+') { lang } else { "ind+eng" };
        run_tess(fallback_lang, 4)
            .or_else(|e2| run_tess(fallback_lang, 6).map_err(|e3| format!("{};{};{}", e1, e2, e3)))
    })
}

/// OCR the given 0-based PDF pages via `pdftoppm` + `tesseract`.
/// Never panics; missing tools mark the run skipped.
pub fn ocr_pdf_pages(path: &Path, pages: &[usize], lang: &str, dpi: u32) -> OcrOutcome {
    let has_pdftoppm = which::which("pdftoppm").is_ok();
    let has_tesseract = which::which("tesseract").is_ok();
    if !has_pdftoppm || !has_tesseract {
        return OcrOutcome { texts: vec![], skipped_due_to_missing_deps: true, errors: vec![] };
    }
    let tmpdir = tempfile::tempdir().ok();
    let base: PathBuf = tmpdir.as_ref().map(|d| d.path().to_path_buf()).unwrap_or_else(std::env::temp_dir);

    let mut texts = Vec::new();
    let mut errors = Vec::new();

    for &idx0 in pages {
        let page_no = idx0 + 1;
        let render_prefix = base.join(format!("p{}", page_no));
        let render_img = render_prefix.with_extension("png");

        let out = Command::new("pdftoppm")
            .arg("-r")
            .arg(dpi.to_string())
            .arg("-f")
            .arg(page_no.to_string())
            .arg("-l")
            .arg(page_no.to_string())
            .arg("-png")
            .arg("-singlefile")
            .arg(path)
            .arg(&render_prefix)
            .output();
        match out {
            Ok(o) if o.status.success() => {}
            _ => {
                errors.push(OcrErrorEntry { index: idx0, message: "pdftoppm_failed".into() });
                continue;
            }
        }
        match std::fs::metadata(&render_img) {
            Ok(meta) if meta.len() > 0 => {}
            Ok(_) => {
                errors.push(OcrErrorEntry { index: idx0, message: "image_zero_size".into() });
                continue;
            }
            Err(_) => {
                errors.push(OcrErrorEntry { index: idx0, message: "image_missing".into() });
                continue;
            }
        }

        match tesseract_image(&render_img, lang) {
            Ok(text) => texts.push(OcrText { index: idx0, text }),
            Err(message) => {
                errors.push(OcrErrorEntry { index: idx0, message });
            }
        }
    }

    OcrOutcome { texts, skipped_due_to_missing_deps: false, errors }
}

/// Scanned PDFs and image files.
#[derive(Debug, Clone)]
pub struct OcrExtractor {
    pub lang: String,
    pub dpi: u32,
}

impl OcrExtractor {
    pub fn new(lang: &str, dpi: u32) -> Self {
        OcrExtractor { lang: lang.to_string(), dpi: dpi.max(72) }
    }

    fn extract_image(&self, path: &Path) -> Result<ExtractedDocument, ExtractError> {
        let text = tesseract_image(path, &self.lang).map_err(ExtractError::Ocr)?;
        let images = BTreeMap::from([(0usize, 1usize)]);
        Ok(ExtractedDocument { pages: vec![text], images, tables: BTreeMap::new() })
    }

    fn extract_pdf(&self, path: &Path) -> Result<ExtractedDocument, ExtractError> {
        let n_pages = pdfinfo_pages(path)?.ok_or_else(|| ExtractError::MissingTool("pdfinfo".into()))?;
        let indices: Vec<usize> = (0..n_pages).collect();
        let outcome = ocr_pdf_pages(path, &indices, &self.lang, self.dpi);
        if outcome.skipped_due_to_missing_deps {
            return Err(ExtractError::MissingTool("pdftoppm/tesseract".into()));
        }
        if outcome.texts.is_empty() && !outcome.errors.is_empty() {
            let detail: Vec<String> = outcome.errors.iter().map(|e| format!("p{}: {}", e.index + 1, e.message)).collect();
            return Err(ExtractError::Ocr(detail.join("; ")));
        }
        let mut pages = vec![String::new(); n_pages];
        for t in outcome.texts {
            if let Some(slot) = pages.get_mut(t.index) {
                *slot = t.text;
            }
        }
        Ok(ExtractedDocument { pages, images: pdfimages_counts(path), tables: BTreeMap::new() })
    }
}

impl Extractor for OcrExtractor {
    fn name(&self) -> &'static str {
        "ocr"
    }

    fn supports(&self, path: &Path) -> bool {
        let ext = lower_extension(path);
        ext == "pdf" || IMAGE_EXTENSIONS.contains(&ext.as_str())
    }

    fn extract(&self, path: &Path) -> Result<ExtractedDocument, ExtractError> {
        if !path.exists() {
            return Err(ExtractError::FileNotFound(path.display().to_string()));
        }
        let ext = lower_extension(path);
        if ext == "pdf" {
            return self.extract_pdf(path);
        }
        if !IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            return Err(ExtractError::Unsupported(path.display().to_string()));
        }
        if which::which("tesseract").is_err() {
            return Err(ExtractError::MissingTool("tesseract".into()));
        }
        self.extract_image(path)
    }
}
