use std::path::Path;

use permitdoc_check::extract::Backend;
use permitdoc_check::{load_config, parse_config, CatalogError, ConfigError, EvidencePolicy, SegmentationStrategy};

#[test]
fn empty_config_yields_defaults() {
    let cfg = parse_config("").unwrap();
    assert_eq!(cfg.input, "./input/**/*.pdf");
    assert_eq!(cfg.output_dir, "./output");
    assert_eq!(cfg.strategy, SegmentationStrategy::Auto);
    assert_eq!(cfg.evidence_policy, EvidencePolicy::SegmentLocal);
    assert_eq!(cfg.max_evidence_pages, 3);
    assert_eq!(cfg.backends, vec![Backend::Poppler, Backend::Ocr, Backend::Text]);
    assert!(cfg.per_doc_dir);
    assert_eq!(cfg.catalog().unwrap().len(), 8);
}

#[test]
fn overrides_are_read_from_yaml() {
    let cfg = parse_config(
        "strategy: page_scan\nevidence_policy: document_fallback\nmax_evidence_pages: 5\nbackends: [text]\nocr_lang: ind+eng\n",
    )
    .unwrap();
    assert_eq!(cfg.strategy, SegmentationStrategy::PageScan);
    assert_eq!(cfg.evidence_policy, EvidencePolicy::DocumentFallback);
    assert_eq!(cfg.max_evidence_pages, 5);
    assert_eq!(cfg.backends, vec![Backend::Text]);
    let ext = cfg.extraction_options();
    assert_eq!(ext.ocr_lang, "ind+eng");
    assert_eq!(ext.ocr_dpi, 300);
    let opts = cfg.analysis_options();
    assert_eq!(opts.strategy, SegmentationStrategy::PageScan);
}

#[test]
fn zero_evidence_pages_is_invalid() {
    let err = parse_config("max_evidence_pages: 0\n").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn empty_backend_list_is_invalid() {
    assert!(matches!(parse_config("backends: []\n"), Err(ConfigError::Invalid(_))));
}

#[test]
fn unknown_strategy_is_a_parse_error() {
    assert!(matches!(parse_config("strategy: sideways\n"), Err(ConfigError::Parse { .. })));
}

#[test]
fn custom_requirements_replace_builtin_catalog() {
    let cfg = parse_config(
        "requirements:\n  - name: Budget\n    requires_table: true\n    patterns: ['anggaran', 'biaya']\n",
    )
    .unwrap();
    let catalog = cfg.catalog().unwrap();
    assert_eq!(catalog.len(), 1);
    assert!(catalog.get("Budget").unwrap().requires_table);
}

#[test]
fn requirement_without_patterns_fails_at_catalog_build() {
    let cfg = parse_config("requirements:\n  - name: Budget\n    patterns: []\n").unwrap();
    assert!(matches!(cfg.catalog(), Err(ConfigError::Catalog(CatalogError::NoPatterns(_)))));
}

#[test]
fn requirement_missing_patterns_key_is_a_parse_error() {
    assert!(matches!(parse_config("requirements:\n  - name: Budget\n"), Err(ConfigError::Parse { .. })));
}

#[test]
fn missing_default_file_means_defaults_but_explicit_path_fails() {
    let td = tempfile::tempdir().unwrap();
    let path = td.path().join("checklist.yaml");
    assert_eq!(load_config(&path, false).unwrap().max_evidence_pages, 3);
    let err = load_config(&path, true).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
}

#[test]
fn load_config_reports_file_path_on_parse_error() {
    let td = tempfile::tempdir().unwrap();
    let path = td.path().join("checklist.yaml");
    std::fs::write(&path, "max_evidence_pages: [\n").unwrap();
    match load_config(Path::new(&path), true) {
        Err(ConfigError::Parse { path: p, .. }) => assert!(p.ends_with("checklist.yaml")),
        other => panic!("expected parse error, got {:?}", other),
    }
}
