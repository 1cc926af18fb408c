use std::collections::HashSet;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use permitdoc_check::config::DEFAULT_CONFIG_PATH;
use permitdoc_check::{
    analyze, build_extractors, check_deps, emit_files, enumerate_documents, extract_ranked, install_help_for,
    load_config, render_markdown, slugify, unique_slug, EnumerateError, EvidencePolicy, ReportMeta,
    SegmentationStrategy,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Json,
    Text,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StrategyArg {
    Auto,
    Headings,
    PageScan,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PolicyArg {
    SegmentLocal,
    DocumentFallback,
}

#[derive(Parser, Debug)]
#[command(name = "permitdoc", version, about = "Completeness checklist for permit application documents")]
struct Cli {
    /// YAML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Glob or single file; overrides the config file.
    #[arg(long)]
    input: Option<String>,

    #[arg(long)]
    output_dir: Option<String>,

    #[arg(long, value_enum)]
    strategy: Option<StrategyArg>,

    #[arg(long, value_enum)]
    evidence_policy: Option<PolicyArg>,

    #[arg(long)]
    max_evidence_pages: Option<usize>,

    /// Write outputs straight into the output dir instead of one dir per document.
    #[arg(long, default_value_t = false)]
    flat: bool,

    /// Also print the checklist markdown to stdout.
    #[arg(long, default_value_t = false)]
    print: bool,

    #[arg(long, value_enum, default_value_t = LogFormat::Json)]
    log_format: LogFormat,
}

fn init_tracing(format: LogFormat) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(env_filter).with_target(false).with_writer(std::io::stderr);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    // 1) Config and catalog
    let config_path = cli.config.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let mut cfg = match load_config(&config_path, cli.config.is_some()) {
        Ok(c) => c,
        Err(e) => {
            error!(tool = "load_config", file = %config_path.display(), error = %e, error_code = 3);
            std::process::exit(3);
        }
    };
    if let Some(input) = cli.input {
        cfg.input = input;
    }
    if let Some(dir) = cli.output_dir {
        cfg.output_dir = dir;
    }
    if let Some(s) = cli.strategy {
        cfg.strategy = match s {
            StrategyArg::Auto => SegmentationStrategy::Auto,
            StrategyArg::Headings => SegmentationStrategy::Headings,
            StrategyArg::PageScan => SegmentationStrategy::PageScan,
        };
    }
    if let Some(p) = cli.evidence_policy {
        cfg.evidence_policy = match p {
            PolicyArg::SegmentLocal => EvidencePolicy::SegmentLocal,
            PolicyArg::DocumentFallback => EvidencePolicy::DocumentFallback,
        };
    }
    if let Some(n) = cli.max_evidence_pages {
        cfg.max_evidence_pages = n;
    }
    if cli.flat {
        cfg.per_doc_dir = false;
    }
    if let Err(e) = cfg.validate() {
        error!(tool = "load_config", error = %e, error_code = 3);
        std::process::exit(3);
    }
    let catalog = match cfg.catalog() {
        Ok(c) => c,
        Err(e) => {
            error!(tool = "load_config", error = %e, error_code = 3);
            std::process::exit(3);
        }
    };
    info!(
        tool = "load_config",
        status = "ok",
        input = %cfg.input,
        output_dir = %cfg.output_dir,
        requirements = catalog.len(),
        strategy = ?cfg.strategy,
        evidence_policy = ?cfg.evidence_policy
    );

    // 2) Dependencies
    let deps = check_deps();
    let help = install_help_for(&deps.missing);
    if deps.ok {
        info!(tool = "check_deps", status = "ok", missing = ?deps.missing);
    } else {
        warn!(tool = "check_deps", missing = ?deps.missing, "pdf text extraction unavailable");
    }
    if !help.is_empty() {
        eprintln!("{}", help);
    }

    // 3) Inputs
    let files = match enumerate_documents(&cfg.input) {
        Ok(files) => files,
        Err(EnumerateError::NoFilesFound { guidance }) => {
            error!(tool = "enumerate_documents", error = "NoFilesFound", error_code = 1);
            eprintln!("{}", guidance);
            std::process::exit(1);
        }
    };
    info!(tool = "enumerate_documents", count = files.len());
    if !deps.ok && files.iter().any(|f| f.extension().is_some_and(|e| e.eq_ignore_ascii_case("pdf"))) {
        error!(tool = "check_deps", missing = ?deps.missing, error_code = 2);
        std::process::exit(2);
    }

    let extractors = build_extractors(&cfg.extraction_options());
    let opts = cfg.analysis_options();
    let mut used_doc_ids: HashSet<String> = HashSet::new();

    // 4) Extract -> analyze -> emit, one document at a time
    for file in files {
        let stem = file.file_stem().and_then(|s| s.to_str()).unwrap_or("doc");
        let doc_id = unique_slug(slugify(stem), &mut used_doc_ids);
        let doc_outdir = if cfg.per_doc_dir { format!("{}/{}", cfg.output_dir, doc_id) } else { cfg.output_dir.clone() };

        let outcome = extract_ranked(&file, &extractors);
        for failure in &outcome.failures {
            warn!(tool = "extract", file = %file.display(), backend = %failure.backend, error = %failure.error);
        }
        let doc = &outcome.document;
        info!(
            tool = "extract",
            file = %file.display(),
            backend = outcome.backend.as_deref().unwrap_or("none"),
            pages = doc.pages.len(),
            images = doc.images.values().sum::<usize>(),
            tables = doc.tables.values().sum::<usize>()
        );

        let report = analyze(&doc.pages, &doc.images, &doc.tables, &catalog, &opts);
        info!(
            tool = "analyze",
            file = %file.display(),
            strategy = ?report.strategy,
            complete = report.verdicts.iter().filter(|v| v.is_complete()).count(),
            total = report.verdicts.len(),
            completeness_percent = report.stats.completeness_percent
        );

        let meta = ReportMeta {
            doc_id: doc_id.clone(),
            file: file.display().to_string(),
            backend: outcome.backend.clone(),
            failed_backends: outcome.failures.iter().map(|f| format!("{}: {}", f.backend, f.error)).collect(),
        };
        match emit_files(&report, &meta, &doc_outdir, cfg.max_evidence_pages) {
            Ok(paths) => {
                info!(
                    tool = "emit_files",
                    file = %file.display(),
                    json_path = %paths.json_path,
                    md_path = %paths.md_path,
                    csv_path = %paths.csv_path
                );
            }
            Err(e) => {
                error!(tool = "emit_files", file = %file.display(), error = %e, error_code = 6);
                std::process::exit(6);
            }
        }

        if cli.print {
            println!("{}", render_markdown(&report, &meta.file, cfg.max_evidence_pages));
        }
    }
}
