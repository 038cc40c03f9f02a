//! MCC Manifest CLI
//!
//! Command-line tool for browsing manifest workbooks and resolving which
//! release of each title matches a given MCC base release.

mod csv_dir;
mod xlsx;

use clap::{Parser, Subcommand, ValueEnum};
use csv_dir::CsvSource;
use manifest_core::{
    load_with_config, Error, LoaderConfig, ManifestRow, MatchKind, Matcher, SheetSource,
    WorkbookData,
};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use xlsx::WorkbookSource;

#[derive(Parser)]
#[command(name = "manifest-cli")]
#[command(about = "MCC patch manifest browser", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Loader config file (JSON); defaults are used when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the sheets of a workbook
    Sheets {
        /// Workbook file, CSV file, or directory of CSV files
        #[arg(short, long)]
        input: PathBuf,
    },

    /// List the base releases, newest first
    Base {
        /// Workbook file, CSV file, or directory of CSV files
        #[arg(short, long)]
        input: PathBuf,

        /// Maximum number of rows to display
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Find the release of one sheet matching a base release
    Match {
        /// Workbook file, CSV file, or directory of CSV files
        #[arg(short, long)]
        input: PathBuf,

        /// Base release slug (defaults to the newest)
        #[arg(short, long)]
        base: Option<String>,

        /// Sheet to search
        #[arg(short, long)]
        sheet: String,

        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// Find the matching release in every sheet
    MatchAll {
        /// Workbook file, CSV file, or directory of CSV files
        #[arg(short, long)]
        input: PathBuf,

        /// Base release slug (defaults to the newest)
        #[arg(short, long)]
        base: Option<String>,

        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// Write the loaded workbook as JSON
    Dump {
        /// Workbook file, CSV file, or directory of CSV files
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Write the default loader config to a file
    InitConfig {
        /// Output path for the config file
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("manifest_core=debug,manifest_cli=debug,info")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("manifest_core=warn,manifest_cli=warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> manifest_core::Result<()> {
    let config = match &cli.config {
        Some(path) => LoaderConfig::load(path)?,
        None => LoaderConfig::default(),
    };

    match cli.command {
        Commands::Sheets { input } => cmd_sheets(&input, &config),
        Commands::Base { input, limit } => cmd_base(&input, &config, limit),
        Commands::Match {
            input,
            base,
            sheet,
            format,
        } => cmd_match(&input, &config, base.as_deref(), &sheet, format),
        Commands::MatchAll {
            input,
            base,
            format,
        } => cmd_match_all(&input, &config, base.as_deref(), format),
        Commands::Dump { input, output } => cmd_dump(&input, &config, &output),
        Commands::InitConfig { output } => cmd_init_config(&output),
    }
}

/// Pick a decoder by input kind: directory, `.csv` file, or spreadsheet
fn open_source(input: &Path) -> manifest_core::Result<Box<dyn SheetSource>> {
    if input.is_dir() {
        debug!(path = %input.display(), "reading CSV directory");
        return Ok(Box::new(CsvSource::scan(input)?));
    }

    let is_csv = input
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    if is_csv {
        Ok(Box::new(CsvSource::file(input)))
    } else {
        Ok(Box::new(WorkbookSource::open(input)?))
    }
}

fn load_input(input: &Path, config: &LoaderConfig) -> manifest_core::Result<WorkbookData> {
    let mut source = open_source(input)?;
    load_with_config(source.as_mut(), config)
}

fn select_base<'a>(
    data: &'a WorkbookData,
    config: &LoaderConfig,
    slug: Option<&str>,
) -> manifest_core::Result<&'a ManifestRow> {
    match slug {
        Some(slug) => data
            .find_base(slug)
            .ok_or_else(|| Error::BaseRowNotFound(slug.to_string())),
        None => data.latest_base().ok_or_else(|| Error::MissingBaseData {
            sheet: config.base_sheet.clone(),
        }),
    }
}

fn cmd_sheets(input: &Path, config: &LoaderConfig) -> manifest_core::Result<()> {
    let data = load_input(input, config)?;
    let base_key = manifest_core::fold_key(&config.base_sheet);

    println!("Sheets ({}):", data.group_names.len());
    for name in &data.group_names {
        if manifest_core::fold_key(name) == base_key {
            println!("  {} [base] ({} rows)", name, data.base_rows.len());
        } else {
            let count = data.group(name).map_or(0, |rows| rows.len());
            println!("  {} ({} rows)", name, count);
        }
    }

    Ok(())
}

fn cmd_base(input: &Path, config: &LoaderConfig, limit: Option<usize>) -> manifest_core::Result<()> {
    let data = load_input(input, config)?;

    println!("Slug\tRelease\tManifestID\tSize");
    println!("{}", "-".repeat(48));

    let row_limit = limit.unwrap_or(data.base_rows.len());
    for row in data.base_rows.iter().take(row_limit) {
        println!(
            "{}\t{}\t{}\t{}",
            row.slug,
            row.release_date_full,
            row.manifest_id,
            format_size(row.total_size_bytes)
        );
    }

    if data.base_rows.len() > row_limit {
        println!("... ({} more rows)", data.base_rows.len() - row_limit);
    }

    Ok(())
}

/// One sheet's match, as written by `--format json`
#[derive(Serialize)]
struct MatchReport<'a> {
    sheet: &'a str,
    matched: Option<&'a ManifestRow>,
    kind: Option<MatchKind>,
}

#[derive(Serialize)]
struct MatchOutput<'a> {
    base: &'a ManifestRow,
    matches: Vec<MatchReport<'a>>,
}

fn cmd_match(
    input: &Path,
    config: &LoaderConfig,
    base_slug: Option<&str>,
    sheet: &str,
    format: Format,
) -> manifest_core::Result<()> {
    let data = load_input(input, config)?;
    let base = select_base(&data, config, base_slug)?;
    let candidates = data
        .group(sheet)
        .ok_or_else(|| Error::SheetNotFound(sheet.to_string()))?;

    let found = Matcher::default().resolve_detailed(base, candidates);
    let report = MatchReport {
        sheet,
        matched: found.map(|m| m.row),
        kind: found.map(|m| m.kind),
    };

    print_matches(base, vec![report], format)
}

fn cmd_match_all(
    input: &Path,
    config: &LoaderConfig,
    base_slug: Option<&str>,
    format: Format,
) -> manifest_core::Result<()> {
    let data = load_input(input, config)?;
    let base = select_base(&data, config, base_slug)?;

    let reports = data
        .resolve_all(base, &Matcher::default())
        .into_iter()
        .map(|g| MatchReport {
            sheet: g.sheet,
            matched: g.matched.map(|m| m.row),
            kind: g.matched.map(|m| m.kind),
        })
        .collect();

    print_matches(base, reports, format)
}

fn print_matches(base: &ManifestRow, matches: Vec<MatchReport<'_>>, format: Format) -> manifest_core::Result<()> {
    if format == Format::Json {
        let json = serde_json::to_string_pretty(&MatchOutput { base, matches })?;
        println!("{}", json);
        return Ok(());
    }

    println!("Base: {} ({})", base.slug, base.release_date_full);
    println!();
    for report in &matches {
        match (report.matched, report.kind) {
            (Some(row), Some(kind)) => {
                println!("{}: {} [by {}]", report.sheet, row.slug, kind);
                println!("  app {}  depot {}  manifest {}", row.app_id, row.depot_id, row.manifest_id);
                println!("  size {}", format_size(row.total_size_bytes));
            }
            _ => println!("{}: no matching release", report.sheet),
        }
    }

    Ok(())
}

fn cmd_dump(input: &Path, config: &LoaderConfig, output: &Path) -> manifest_core::Result<()> {
    let data = load_input(input, config)?;

    let file = File::create(output)?;
    let mut writer = BufWriter::new(file);
    let json = serde_json::to_string_pretty(&data)?;
    writeln!(writer, "{}", json)?;

    let total: usize = data.groups.values().map(Vec::len).sum();
    println!(
        "Wrote {} base rows and {} rows from {} sheets to {}",
        data.base_rows.len(),
        total,
        data.groups.len(),
        output.display()
    );

    Ok(())
}

fn cmd_init_config(output: &Path) -> manifest_core::Result<()> {
    LoaderConfig::default().save(output)?;
    println!("Created config file: {}", output.display());
    println!();
    println!("Edit the file to rename sheets or columns, then run:");
    println!("  manifest-cli --config {} sheets --input <workbook>", output.display());

    Ok(())
}

/// Human-readable byte count
fn format_size(bytes: Option<u64>) -> String {
    const UNITS: [&str; 4] = ["KiB", "MiB", "GiB", "TiB"];

    let Some(bytes) = bytes else {
        return "unknown".to_string();
    };
    if bytes < 1024 {
        return format!("{} B", bytes);
    }

    let mut value = bytes as f64;
    let mut unit = "B";
    for u in UNITS {
        if value < 1024.0 {
            break;
        }
        value /= 1024.0;
        unit = u;
    }
    format!("{:.1} {}", value, unit)
}
