use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use permitdoc_check::{enumerate_documents, slugify, unique_slug};

#[test]
fn enumerate_finds_nested_files() {
    let td = tempfile::tempdir().unwrap();
    let base = td.path();
    let dir = base.join("input/cv-maju");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("Permohonan.PDF"), b"%PDF-1.4\n").unwrap();
    fs::write(dir.join("catatan.docx"), b"PK").unwrap();

    let pattern = format!("{}/input/**/*.pdf", base.display());
    let files = enumerate_documents(&pattern).expect("should find files");
    let files: Vec<PathBuf> = files.into_iter().map(|p| p.strip_prefix(base).unwrap().to_path_buf()).collect();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].to_string_lossy(), "input/cv-maju/Permohonan.PDF");
}

#[test]
fn enumerate_directory_keeps_supported_files_sorted() {
    let td = tempfile::tempdir().unwrap();
    let base = td.path();
    fs::write(base.join("b.txt"), "2. Tujuan").unwrap();
    fs::write(base.join("a.pdf"), b"%PDF-1.4\n").unwrap();
    fs::write(base.join("c.docx"), b"PK").unwrap();

    let files = enumerate_documents(base.to_str().unwrap()).unwrap();
    let names: Vec<String> = files.iter().map(|p| p.file_name().unwrap().to_string_lossy().to_string()).collect();
    assert_eq!(names, vec!["a.pdf", "b.txt"]);
}

#[test]
fn enumerate_single_file() {
    let td = tempfile::tempdir().unwrap();
    let path = td.path().join("permohonan.txt");
    fs::write(&path, "1. Tujuan").unwrap();
    assert_eq!(enumerate_documents(path.to_str().unwrap()).unwrap(), vec![path.clone()]);

    let docx = td.path().join("permohonan.docx");
    fs::write(&docx, b"PK").unwrap();
    assert!(enumerate_documents(docx.to_str().unwrap()).is_err());
}

#[test]
fn enumerate_empty_returns_error_with_guidance() {
    let td = tempfile::tempdir().unwrap();
    let pattern = format!("{}/input/**/*.pdf", td.path().display());
    let err = enumerate_documents(&pattern).err().expect("should be error");
    assert_eq!(format!("{}", err), "NoFilesFound");
    let permitdoc_check::EnumerateError::NoFilesFound { guidance } = err;
    assert!(guidance.contains("./input/**/*.pdf"));
}

#[test]
fn slugs_are_ascii_and_unique() {
    assert_eq!(slugify("Permohonan Izin (Final)"), "permohonan-izin-final");
    assert_eq!(slugify("  __ "), "doc");
    let mut used = HashSet::new();
    assert_eq!(unique_slug("permohonan".into(), &mut used), "permohonan");
    assert_eq!(unique_slug("permohonan".into(), &mut used), "permohonan-1");
    assert_eq!(unique_slug("permohonan".into(), &mut used), "permohonan-2");
}
