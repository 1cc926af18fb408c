use permitdoc_check::{Catalog, CatalogError, RequirementSpec, MEASUREMENT_PATTERN, TEMPORAL_PATTERN};

fn spec(name: &str, patterns: &[&str]) -> RequirementSpec {
    RequirementSpec {
        name: name.to_string(),
        label: None,
        requires_visual: false,
        requires_table: false,
        expects_measurement: false,
        expects_dates: false,
        aliases: vec![],
        patterns: patterns.iter().map(|p| p.to_string()).collect(),
    }
}

#[test]
fn builtin_catalog_has_eight_requirements_in_order() {
    let catalog = Catalog::builtin().expect("builtin catalog must compile");
    let names: Vec<&str> = catalog.requirements().iter().map(|r| r.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "Activity Information",
            "Objective",
            "Benefit",
            "Existing Activity Requested",
            "Implementation Schedule",
            "Site Plan",
            "Required Area Description",
            "Location Map",
        ]
    );
    for req in catalog.requirements() {
        assert!(!catalog.patterns_for(&req.name).unwrap().is_empty());
    }
}

#[test]
fn builtin_flags_match_checklist() {
    let catalog = Catalog::builtin().unwrap();
    let schedule = catalog.get("Implementation Schedule").unwrap();
    assert!(schedule.requires_visual && schedule.requires_table && schedule.expects_dates);
    assert!(catalog.get("Site Plan").unwrap().requires_visual);
    assert!(catalog.get("Location Map").unwrap().requires_visual);
    assert!(catalog.get("Required Area Description").unwrap().expects_measurement);
    let objective = catalog.get("Objective").unwrap();
    assert!(!objective.requires_visual && !objective.requires_table);
}

#[test]
fn patterns_for_unknown_name_is_none() {
    let catalog = Catalog::builtin().unwrap();
    assert!(catalog.patterns_for("Environmental Permit").is_none());
}

#[test]
fn patterns_are_case_insensitive() {
    let catalog = Catalog::builtin().unwrap();
    assert!(catalog.get("Benefit").unwrap().matches_text("MANFAAT bagi masyarakat"));
}

#[test]
fn heading_classification_is_first_match_in_catalog_order() {
    let catalog = Catalog::builtin().unwrap();
    assert_eq!(catalog.classify_heading("tujuan dan manfaat").unwrap().name, "Objective");
    assert_eq!(catalog.classify_heading("jadwal pelaksanaan kegiatan").unwrap().name, "Implementation Schedule");
    assert_eq!(catalog.classify_heading("denah tapak").unwrap().name, "Site Plan");
    assert_eq!(catalog.classify_heading("peta lokasi").unwrap().name, "Location Map");
    assert!(catalog.classify_heading("lampiran").is_none());
}

#[test]
fn headings_fall_back_to_body_patterns_when_no_alias_matches() {
    let catalog = Catalog::builtin().unwrap();
    let cases = [
        ("denah", "Site Plan"),
        ("peta tapak", "Site Plan"),
        ("tahapan kegiatan", "Implementation Schedule"),
        ("roadmap", "Implementation Schedule"),
        ("target", "Objective"),
        ("hasil yang diharapkan", "Benefit"),
        ("nilai tambah", "Benefit"),
    ];
    for (heading, expected) in cases {
        assert_eq!(catalog.classify_heading(heading).map(|r| r.name.as_str()), Some(expected), "heading {heading:?}");
    }
}

#[test]
fn alias_match_beats_earlier_pattern_match() {
    let catalog = Catalog::builtin().unwrap();
    // "kegiatan" is an Activity Information body pattern, "jadwal" a Schedule alias
    assert!(catalog.get("Activity Information").unwrap().matches_text("jadwal pelaksanaan kegiatan"));
    assert_eq!(catalog.classify_heading("jadwal pelaksanaan kegiatan").unwrap().name, "Implementation Schedule");
}

#[test]
fn requirement_without_aliases_classifies_by_patterns() {
    let catalog = Catalog::from_specs(&[spec("Budget", &["anggaran", "biaya"])]).unwrap();
    assert_eq!(catalog.classify_heading("rencana anggaran").unwrap().name, "Budget");
}

#[test]
fn catalog_validation_fails_fast() {
    assert!(matches!(Catalog::from_specs(&[]), Err(CatalogError::Empty)));
    assert!(matches!(Catalog::from_specs(&[spec("Budget", &[])]), Err(CatalogError::NoPatterns(_))));
    assert!(matches!(Catalog::from_specs(&[spec("Budget", &["  "])]), Err(CatalogError::EmptyPattern(_))));
    assert!(matches!(Catalog::from_specs(&[spec(" ", &["x"])]), Err(CatalogError::EmptyName(0))));
    assert!(matches!(
        Catalog::from_specs(&[spec("Budget", &["x"]), spec("Budget", &["y"])]),
        Err(CatalogError::Duplicate(_))
    ));
    assert!(matches!(Catalog::from_specs(&[spec("Budget", &["(unclosed"])]), Err(CatalogError::InvalidPattern { .. })));
}

#[test]
fn catalog_from_yaml_reports_parse_errors() {
    let err = Catalog::from_yaml("requirements: [").unwrap_err();
    assert!(matches!(err, CatalogError::Parse(_)));
}

#[test]
fn measurement_pattern_needs_number_and_area_unit() {
    assert!(MEASUREMENT_PATTERN.is_match("luas lahan 1.250 m2"));
    assert!(MEASUREMENT_PATTERN.is_match("sekitar 3,5 ha"));
    assert!(MEASUREMENT_PATTERN.is_match("bangunan 500 m²"));
    assert!(MEASUREMENT_PATTERN.is_match("400 meter persegi"));
    assert!(MEASUREMENT_PATTERN.is_match("2 hektare"));
    assert!(!MEASUREMENT_PATTERN.is_match("selama 5 hari"));
    assert!(!MEASUREMENT_PATTERN.is_match("luas lahan cukup"));
}

#[test]
fn temporal_pattern_recognizes_dates_quarters_and_periods() {
    assert!(TEMPORAL_PATTERN.is_match("mulai 12/03/2025"));
    assert!(TEMPORAL_PATTERN.is_match("target q3"));
    assert!(TEMPORAL_PATTERN.is_match("januari 2025"));
    assert!(TEMPORAL_PATTERN.is_match("selama 6 bulan"));
    assert!(TEMPORAL_PATTERN.is_match("12-mar-2025"));
    assert!(!TEMPORAL_PATTERN.is_match("akan segera dimulai"));
}
