use std::fs;
use std::os::unix::fs::PermissionsExt;

use permitdoc_check::{check_deps, install_help_for};

fn set_path(dir: &std::path::Path) {
    std::env::set_var("PATH", dir.display().to_string());
}

fn fake_tool(dir: &std::path::Path, name: &str) {
    let bin = dir.join(name);
    fs::write(&bin, "#!/bin/sh\nexit 0\n").unwrap();
    let mut perms = fs::metadata(&bin).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&bin, perms).unwrap();
}

// PATH is process-wide, so both cases run in one test.
#[test]
fn check_deps_tracks_required_and_optional_tools() {
    let original = std::env::var_os("PATH");

    let td = tempfile::tempdir().unwrap();
    fake_tool(td.path(), "pdftotext");
    set_path(td.path());
    let res = check_deps();
    assert!(res.ok, "pdftotext present should yield ok");
    assert!(res.missing.iter().any(|m| m == "tesseract"));
    assert!(res.missing.iter().any(|m| m == "pdfimages"));
    assert!(!res.missing.iter().any(|m| m == "pdftotext"));

    let empty = tempfile::tempdir().unwrap();
    set_path(empty.path());
    let res = check_deps();
    assert!(!res.ok, "missing pdftotext should not be ok");
    assert!(res.missing.iter().any(|m| m == "pdftotext"));

    if let Some(p) = original {
        std::env::set_var("PATH", p);
    }
}

#[test]
fn install_help_names_packages() {
    let help = install_help_for(&["pdfimages".to_string(), "tesseract".to_string()]);
    assert!(help.contains("poppler-utils"));
    assert!(help.contains("tesseract-ocr-ind"));
    assert_eq!(install_help_for(&[]), "");
}
