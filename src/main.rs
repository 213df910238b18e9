// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * VANGUARD - Vulnerability Analytics Engine
 * CLI for signature detection, CVE correlation and risk scoring
 * over pre-collected scan records
 *
 * (c) 2026 Bountyy Oy
 */

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use vanguard_scanner::aggregator::{ReportModel, RiskAggregator};
use vanguard_scanner::catalog::SignatureCatalog;
use vanguard_scanner::config::EngineConfig;
use vanguard_scanner::cve_index::CveIndex;
use vanguard_scanner::intake::ScanDataParser;
use vanguard_scanner::orchestrator::{CancellationFlag, ScanOrchestrator};
use vanguard_scanner::reporting::{ReportEngine, ReportFormat};
use vanguard_scanner::types::{Severity, VulnClass};

/// VANGUARD - Vulnerability Analytics Engine
#[derive(Parser)]
#[command(name = "vanguard")]
#[command(author = "Bountyy Oy <info@bountyy.fi>")]
#[command(version = "1.0.0")]
#[command(about = "Signature detection, CVE correlation and risk scoring for scan records", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a scan results file (CSV, JSON or TXT)
    Scan {
        /// Path to the scan results file
        scan_file: PathBuf,

        /// Report format
        #[arg(short, long, default_value = "json")]
        format: OutputFormat,

        /// Report output path (defaults to a timestamped file name)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Custom report title
        #[arg(long)]
        title: Option<String>,

        /// Maximum targets analyzed concurrently
        #[arg(long, default_value = "100")]
        concurrency: usize,

        /// Per-target deadline in seconds
        #[arg(long, default_value = "5")]
        timeout: u64,

        /// Comma-separated vulnerability classes to detect (default: all)
        #[arg(long)]
        classes: Option<String>,

        /// JSON CVE database file (defaults to the built-in record set)
        #[arg(long, env = "VANGUARD_CVE_DATABASE")]
        cve_database: Option<PathBuf>,

        /// JSON signature rule file (defaults to the built-in catalog)
        #[arg(long)]
        rules: Option<PathBuf>,
    },

    /// List the detection rules in the active catalog
    Rules {
        /// JSON signature rule file (defaults to the built-in catalog)
        #[arg(long)]
        rules: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Markdown,
    Html,
    Csv,
}

impl From<OutputFormat> for ReportFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Json => ReportFormat::Json,
            OutputFormat::Markdown => ReportFormat::Markdown,
            OutputFormat::Html => ReportFormat::Html,
            OutputFormat::Csv => ReportFormat::Csv,
        }
    }
}

fn print_banner() {
    print!("\x1b[95m");
    println!(r" __     ___    _   _  ____ _   _   _    ____  ____  ");
    println!(r" \ \   / / \  | \ | |/ ___| | | | / \  |  _ \|  _ \ ");
    println!(r"  \ \ / / _ \ |  \| | |  _| | | |/ _ \ | |_) | | | |");
    println!(r"   \ V / ___ \| |\  | |_| | |_| / ___ \|  _ <| |_| |");
    println!(r"    \_/_/   \_\_| \_|\____|\___/_/   \_\_| \_\____/ ");
    print!("\x1b[0m\x1b[1m\x1b[97m");
    println!("         Vulnerability Analytics Engine v1.0");
    print!("\x1b[0m");
    println!();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.debug {
        tracing::Level::DEBUG
    } else if cli.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    print_banner();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(num_cpus::get())
        .thread_name("vanguard-worker")
        .enable_all()
        .build()?;

    runtime.block_on(async_main(cli))
}

async fn async_main(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Scan {
            scan_file,
            format,
            output,
            title,
            concurrency,
            timeout,
            classes,
            cve_database,
            rules,
        } => {
            run_scan(ScanArgs {
                scan_file,
                format: format.into(),
                output,
                title,
                concurrency,
                timeout,
                classes,
                cve_database,
                rules,
            })
            .await
        }
        Commands::Rules { rules } => {
            let catalog = load_catalog(rules.as_deref())?;
            println!("{:<26} {:<6} {:>7}  DESCRIPTION", "RULE", "CLASS", "WEIGHT");
            for rule in &catalog.rules {
                println!(
                    "{:<26} {:<6} {:>7.1}  {}",
                    rule.id, rule.class, rule.weight, rule.description
                );
            }
            Ok(())
        }
    }
}

struct ScanArgs {
    scan_file: PathBuf,
    format: ReportFormat,
    output: Option<PathBuf>,
    title: Option<String>,
    concurrency: usize,
    timeout: u64,
    classes: Option<String>,
    cve_database: Option<PathBuf>,
    rules: Option<PathBuf>,
}

async fn run_scan(args: ScanArgs) -> Result<()> {
    let targets = ScanDataParser::parse_file(&args.scan_file)?;
    if targets.is_empty() {
        warn!("No scan entries found in {}", args.scan_file.display());
    }
    println!(
        "[*] Loaded {} scan entries from {}",
        targets.len(),
        args.scan_file.display()
    );

    let catalog = Arc::new(load_catalog(args.rules.as_deref())?);
    let index = Arc::new(match &args.cve_database {
        Some(path) => CveIndex::from_json_file(path)?,
        None => CveIndex::builtin(),
    });
    println!(
        "[*] Catalog: {} rules, CVE index: {} records",
        catalog.len(),
        index.record_count()
    );

    let config = EngineConfig {
        concurrency_limit: args.concurrency,
        per_target_timeout: Duration::from_secs(args.timeout),
        enabled_classes: parse_classes(args.classes.as_deref())?,
    };

    let orchestrator = ScanOrchestrator::new(catalog, index, config)?;

    let cancel = CancellationFlag::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\n[!] Interrupt received, finishing in-flight targets...");
            signal_cancel.cancel();
        }
    });

    let findings = orchestrator.run(targets, &cancel).await;
    let model = RiskAggregator::aggregate(findings);

    let title = args.title.unwrap_or_else(|| "VANGUARD Security Analysis Report".to_string());
    let report = ReportEngine::new().generate_report(&model, args.format, &title)?;

    let output_path = args
        .output
        .unwrap_or_else(|| PathBuf::from(&report.filename));
    std::fs::write(&output_path, &report.data)
        .with_context(|| format!("failed to write report to {}", output_path.display()))?;
    info!("Report written to {}", output_path.display());

    print_summary(&model, &output_path);
    Ok(())
}

fn load_catalog(path: Option<&std::path::Path>) -> Result<SignatureCatalog> {
    match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read rule file {}", path.display()))?;
            SignatureCatalog::from_json(&raw)
                .with_context(|| format!("failed to parse rule file {}", path.display()))
        }
        None => Ok(SignatureCatalog::builtin()),
    }
}

fn parse_classes(raw: Option<&str>) -> Result<BTreeSet<VulnClass>> {
    let Some(raw) = raw else {
        return Ok(VulnClass::ALL.iter().copied().collect());
    };

    let mut classes = BTreeSet::new();
    for token in raw.split(',') {
        match VulnClass::parse(token) {
            Some(class) => {
                classes.insert(class);
            }
            None => bail!("unknown vulnerability class: {}", token.trim()),
        }
    }
    Ok(classes)
}

fn print_summary(model: &ReportModel, output_path: &std::path::Path) {
    let timed_out = model.findings.iter().filter(|f| f.timed_out).count();
    let failed = model.findings.iter().filter(|f| f.error.is_some()).count();

    println!();
    println!("============================================================");
    println!(" SCAN SUMMARY");
    println!("============================================================");
    println!(" Targets analyzed : {}", model.findings.len());
    for severity in Severity::ALL {
        println!(
            " {:<16} : {}",
            severity.to_string(),
            model.severity_counts.get(&severity).copied().unwrap_or(0)
        );
    }
    println!(" Total findings   : {}", model.total_vulnerabilities);
    if timed_out > 0 {
        println!(" Timed out        : {}", timed_out);
    }
    if failed > 0 {
        println!(" Failed           : {}", failed);
    }
    println!(" Overall risk     : {}", model.risk_level);
    println!(" Report           : {}", output_path.display());
    println!("============================================================");
}
