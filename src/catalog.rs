use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;

static BUILTIN_CATALOG_YAML: &str = include_str!("../config/catalog.yaml");

/// Number followed by an area unit: `1.250 m2`, `3,5 ha`, `400 meter persegi`.
pub static MEASUREMENT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\d+(?:[.,]\d+)*\s*(?:(?:m2|m\^2|meter\s*persegi|hektare|hektar|ha)\b|m²)").unwrap()
});

/// Dates, quarters and period words used by schedules.
pub static TEMPORAL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:\d{1,2}[-/]?(?:\d{1,2}|jan|feb|mar|apr|mei|jun|jul|agu|sep|okt|nov|des)[-/]?\d{2,4}|(?:januari|februari|maret|april|mei|juni|juli|agustus|september|oktober|november|desember)\s+\d{4}|q[1-4]|minggu|bulan|tahun|week|month|year|quarter)\b",
    )
    .unwrap()
});

/// One catalog entry as written in YAML.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RequirementSpec {
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub requires_visual: bool,
    #[serde(default)]
    pub requires_table: bool,
    #[serde(default)]
    pub expects_measurement: bool,
    #[serde(default)]
    pub expects_dates: bool,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub patterns: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogFile {
    pub requirements: Vec<RequirementSpec>,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to parse catalog: {0}")]
    Parse(String),
    #[error("Catalog has no requirements")]
    Empty,
    #[error("Requirement at position {0} has an empty name")]
    EmptyName(usize),
    #[error("Duplicate requirement: {0}")]
    Duplicate(String),
    #[error("Requirement {0} has no patterns")]
    NoPatterns(String),
    #[error("Requirement {0} has an empty pattern")]
    EmptyPattern(String),
    #[error("Requirement {name}: invalid pattern {pattern:?}: {message}")]
    InvalidPattern { name: String, pattern: String, message: String },
}

/// A compiled checklist item.
#[derive(Debug, Clone)]
pub struct Requirement {
    pub name: String,
    pub label: Option<String>,
    pub requires_visual: bool,
    pub requires_table: bool,
    pub expects_measurement: bool,
    pub expects_dates: bool,
    aliases: Vec<Regex>,
    patterns: Vec<Regex>,
}

impl Requirement {
    pub fn patterns(&self) -> &[Regex] {
        &self.patterns
    }

    pub fn aliases(&self) -> &[Regex] {
        &self.aliases
    }

    pub fn matches_text(&self, text: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(text))
    }

    pub fn matches_alias(&self, heading: &str) -> bool {
        self.aliases.iter().any(|re| re.is_match(heading))
    }
}

/// Ordered, validated requirement catalog.
#[derive(Debug, Clone)]
pub struct Catalog {
    requirements: Vec<Requirement>,
}

impl Catalog {
    /// The catalog compiled into the binary.
    pub fn builtin() -> Result<Catalog, CatalogError> {
        Catalog::from_yaml(BUILTIN_CATALOG_YAML)
    }

    pub fn from_yaml(raw: &str) -> Result<Catalog, CatalogError> {
        let file: CatalogFile = serde_yaml::from_str(raw).map_err(|e| CatalogError::Parse(e.to_string()))?;
        Catalog::from_specs(&file.requirements)
    }

    /// Validate and compile. Any gap in the table is a configuration error.
    pub fn from_specs(specs: &[RequirementSpec]) -> Result<Catalog, CatalogError> {
        if specs.is_empty() {
            return Err(CatalogError::Empty);
        }
        let mut requirements: Vec<Requirement> = Vec::with_capacity(specs.len());
        for (idx, spec) in specs.iter().enumerate() {
            let name = spec.name.trim();
            if name.is_empty() {
                return Err(CatalogError::EmptyName(idx));
            }
            if requirements.iter().any(|r| r.name == name) {
                return Err(CatalogError::Duplicate(name.to_string()));
            }
            if spec.patterns.is_empty() {
                return Err(CatalogError::NoPatterns(name.to_string()));
            }
            let patterns = compile_all(name, &spec.patterns)?;
            let aliases = compile_all(name, &spec.aliases)?;
            requirements.push(Requirement {
                name: name.to_string(),
                label: spec.label.clone(),
                requires_visual: spec.requires_visual,
                requires_table: spec.requires_table,
                expects_measurement: spec.expects_measurement,
                expects_dates: spec.expects_dates,
                aliases,
                patterns,
            });
        }
        Ok(Catalog { requirements })
    }

    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }

    pub fn len(&self) -> usize {
        self.requirements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Requirement> {
        self.requirements.iter().find(|r| r.name == name)
    }

    /// Patterns for a requirement name; `None` for an unknown name.
    pub fn patterns_for(&self, name: &str) -> Option<&[Regex]> {
        self.get(name).map(Requirement::patterns)
    }

    /// First requirement in catalog order whose aliases match the heading;
    /// failing that, the first whose body patterns match.
    pub fn classify_heading(&self, heading: &str) -> Option<&Requirement> {
        self.requirements
            .iter()
            .find(|r| r.matches_alias(heading))
            .or_else(|| self.requirements.iter().find(|r| r.matches_text(heading)))
    }
}

fn compile_all(name: &str, raw: &[String]) -> Result<Vec<Regex>, CatalogError> {
    raw.iter()
        .map(|p| {
            if p.trim().is_empty() {
                return Err(CatalogError::EmptyPattern(name.to_string()));
            }
            RegexBuilder::new(p)
                .case_insensitive(true)
                .build()
                .map_err(|e| CatalogError::InvalidPattern { name: name.to_string(), pattern: p.clone(), message: e.to_string() })
        })
        .collect()
}
