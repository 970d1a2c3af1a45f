//! Command-line interface for featuresheet
//!
//! Usage:
//!   featuresheet list `<DIR>` [--json]                  - List the feature documents in a directory
//!   featuresheet show `<PATH>` [--id ID] [--format F]   - Render one document as Markdown or JSON
//!   featuresheet export `<PATH>` [--id ID] [options]    - Write manual test records (XLSX, CSV or JSON)

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::NaiveDate;
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

use featuresheet::{
    render, Catalog, DateFormat, Document, Exporter, ExporterBuilder, FeatureSheetError,
    OutputFormat, RenderFormat,
};

/// `--url`で文書IDに置換されるプレースホルダー
const ID_PLACEHOLDER: &str = "{id}";

#[derive(Parser)]
#[command(name = "featuresheet")]
#[command(version)]
#[command(about = "Turn Gherkin feature files into manual test execution workbooks")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// List the documents of a feature directory
    List {
        /// Directory with `.feature` files or a manifest.json
        dir: PathBuf,

        /// Print the summaries as JSON grouped by category
        #[arg(long)]
        json: bool,
    },

    /// Render one document for review
    Show {
        /// Feature file, messages JSON file, or directory
        path: PathBuf,

        /// Document id (required when PATH is a directory)
        #[arg(long)]
        id: Option<String>,

        #[arg(short, long, value_enum, default_value = "markdown")]
        format: ShowFormat,
    },

    /// Export manual test records
    Export(ExportArgs),
}

#[derive(Args)]
struct ExportArgs {
    /// Feature file, messages JSON file, or directory
    path: PathBuf,

    /// Document id (all documents are exported when PATH is a directory and no id is given)
    #[arg(long)]
    id: Option<String>,

    /// Feature link shown in the header; `{id}` is replaced by the document id
    #[arg(long, default_value = ID_PLACEHOLDER)]
    url: String,

    /// Output file, or directory for generated file names
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(short, long, value_enum, default_value = "xlsx")]
    format: ExportFormat,

    /// Test date recorded in the sheet (defaults to today)
    #[arg(long, value_parser = parse_date)]
    date: Option<NaiveDate>,

    /// `long`, `iso`, or a chrono pattern such as `%d/%m/%Y`
    #[arg(long, default_value = "long")]
    date_format: String,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ShowFormat {
    Markdown,
    Json,
}

impl From<ShowFormat> for RenderFormat {
    fn from(format: ShowFormat) -> Self {
        match format {
            ShowFormat::Markdown => RenderFormat::Markdown,
            ShowFormat::Json => RenderFormat::Json,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ExportFormat {
    Xlsx,
    Csv,
    Json,
}

impl From<ExportFormat> for OutputFormat {
    fn from(format: ExportFormat) -> Self {
        match format {
            ExportFormat::Xlsx => OutputFormat::Xlsx,
            ExportFormat::Csv => OutputFormat::Csv,
            ExportFormat::Json => OutputFormat::Json,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::List { dir, json } => handle_list(&dir, json),
        Commands::Show { path, id, format } => handle_show(&path, id.as_deref(), format.into()),
        Commands::Export(args) => handle_export(&args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::from_default_env().add_directive(Level::INFO.into()),
        2 => EnvFilter::from_default_env().add_directive(Level::DEBUG.into()),
        _ => EnvFilter::from_default_env().add_directive(Level::TRACE.into()),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|err| format!("expected YYYY-MM-DD: {}", err))
}

fn parse_date_format(value: &str) -> DateFormat {
    match value {
        "long" => DateFormat::Long,
        "iso" => DateFormat::Iso8601,
        pattern => DateFormat::Custom(pattern.to_string()),
    }
}

fn handle_list(dir: &Path, json: bool) -> Result<(), FeatureSheetError> {
    let catalog = Catalog::open(dir)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    if json {
        serde_json::to_writer_pretty(&mut out, &catalog.list_by_category()?)?;
        writeln!(out)?;
        return Ok(());
    }

    for group in catalog.list_by_category()? {
        writeln!(out, "{}", group.category.as_deref().unwrap_or("Uncategorized"))?;
        for suite in &group.suites {
            writeln!(
                out,
                "  {:<24} {:<40} {:<12} {:<10} {}",
                suite.id, suite.title, suite.feature, suite.status, suite.last_updated
            )?;
        }
    }
    Ok(())
}

fn handle_show(path: &Path, id: Option<&str>, format: RenderFormat) -> Result<(), FeatureSheetError> {
    let catalog = Catalog::open(path)?;
    let document = load_one(&catalog, path, id)?;
    let stdout = io::stdout();
    render(&document, format, &mut stdout.lock())
}

fn handle_export(args: &ExportArgs) -> Result<(), FeatureSheetError> {
    let mut builder = ExporterBuilder::new()
        .with_date_format(parse_date_format(&args.date_format))
        .with_output_format(args.format.into());
    if let Some(date) = args.date {
        builder = builder.with_generated_on(date);
    }
    let exporter = builder.build()?;
    let catalog = Catalog::open(&args.path)?;

    if args.path.is_dir() && args.id.is_none() {
        return export_directory(&exporter, &catalog, args);
    }

    let document = load_one(&catalog, &args.path, args.id.as_deref())?;
    let (name, bytes) = exporter.export_named(&document, &link_for(&args.url, &document))?;
    let target = match &args.output {
        Some(path) if path.is_dir() => path.join(name),
        Some(path) => path.clone(),
        None => PathBuf::from(name),
    };

    fs::write(&target, bytes)?;
    info!(path = %target.display(), "wrote export");
    println!("{}", target.display());
    Ok(())
}

fn export_directory(
    exporter: &Exporter,
    catalog: &Catalog,
    args: &ExportArgs,
) -> Result<(), FeatureSheetError> {
    let out_dir = args.output.clone().unwrap_or_else(|| PathBuf::from("."));
    fs::create_dir_all(&out_dir)?;

    let documents = catalog.load_all()?;
    let exports = exporter.export_all(&documents, |document| link_for(&args.url, document))?;
    for (name, bytes) in exports {
        let target = out_dir.join(name);
        fs::write(&target, bytes)?;
        println!("{}", target.display());
    }
    Ok(())
}

/// IDが指定されていない場合、単一ファイルの文書を対象とする
fn load_one(catalog: &Catalog, path: &Path, id: Option<&str>) -> Result<Document, FeatureSheetError> {
    if let Some(id) = id {
        return catalog.load(id);
    }
    if path.is_dir() {
        return Err(FeatureSheetError::Config(
            "--id is required when PATH is a directory".to_string(),
        ));
    }
    let entries = catalog.entries()?;
    let entry = entries
        .first()
        .ok_or_else(|| FeatureSheetError::NotFound(path.display().to_string()))?;
    catalog.load(&entry.id)
}

fn link_for(template: &str, document: &Document) -> String {
    template.replace(ID_PLACEHOLDER, &document.id)
}
