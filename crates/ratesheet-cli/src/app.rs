//! CLI Application logic
//!
//! Contains the command-line interface implementation.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use ratesheet_core::{Engine, EngineConfig, LayoutOverride, ParseOutcome};
use ratesheet_data::{DataEngine, DataSource};
use ratesheet_model::{DetectionResult, Orientation, RawWorksheet};

/// Config files looked up in the working directory
const CONFIG_CANDIDATES: [&str; 2] = ["ratesheet.toml", ".ratesheet.toml"];

/// Output format for reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output for tool consumption
    Json,
}

/// Orientation forced by a reviewer
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OrientationArg {
    /// Months run across a header row
    MonthsInColumns,
    /// Months run down a header column
    MonthsInRows,
}

impl From<OrientationArg> for Orientation {
    fn from(arg: OrientationArg) -> Self {
        match arg {
            OrientationArg::MonthsInColumns => Orientation::MonthsInColumns,
            OrientationArg::MonthsInRows => Orientation::MonthsInRows,
        }
    }
}

#[derive(Parser)]
#[command(name = "ratesheet")]
#[command(author, version, about = "Read pricing out of supplier rate sheets", long_about = None)]
struct Cli {
    /// Engine configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log detection decisions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract pricing, inclusions and metadata from a workbook
    Parse {
        /// Input workbook (.xlsx, .xls, .ods or .csv)
        input: PathBuf,

        /// Sheet to read (defaults to the first sheet)
        #[arg(short, long, conflicts_with = "all_sheets")]
        sheet: Option<String>,

        /// Parse every non-empty sheet
        #[arg(long)]
        all_sheets: bool,

        /// Output format (text or json)
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Strict mode: exit with error code if any error is reported
        #[arg(long)]
        strict: bool,

        /// Force the layout orientation
        #[arg(long, value_enum)]
        orientation: Option<OrientationArg>,

        /// Row (or column, for months in rows) number holding the period headers
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        header_line: Option<u32>,

        /// Accommodation type for sheets that name none
        #[arg(long)]
        default_type: Option<String>,
    },

    /// Show the detected layout without extracting
    Detect {
        /// Input workbook
        input: PathBuf,

        /// Sheet to read (defaults to the first sheet)
        #[arg(short, long, conflicts_with = "all_sheets")]
        sheet: Option<String>,

        /// Detect on every non-empty sheet
        #[arg(long)]
        all_sheets: bool,

        /// Output format (text or json)
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// List the sheets of a workbook
    Sheets {
        /// Input workbook
        input: PathBuf,

        /// Output format (text or json)
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

/// Which sheets of a workbook to process
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetSelection {
    /// The first sheet
    Default,
    /// One sheet by name
    Named(String),
    /// Every sheet with content
    All,
}

impl SheetSelection {
    fn from_args(sheet: Option<String>, all_sheets: bool) -> Self {
        match (sheet, all_sheets) {
            (_, true) => SheetSelection::All,
            (Some(name), false) => SheetSelection::Named(name),
            (None, false) => SheetSelection::Default,
        }
    }
}

/// One sheet's detection, as printed by `detect`
#[derive(Debug, Serialize)]
struct SheetDetection<'a> {
    sheet: &'a str,
    detection: &'a DetectionResult,
}

/// Run the CLI application
///
/// This is the main entry point for the command-line interface.
/// It parses arguments and dispatches to the appropriate command.
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Parse {
            input,
            sheet,
            all_sheets,
            format,
            strict,
            orientation,
            header_line,
            default_type,
        } => {
            let overrides = LayoutOverride {
                orientation: orientation.map(Orientation::from),
                header_index: header_line.map(|n| n as usize - 1),
                default_accommodation_type: default_type,
            };
            let selection = SheetSelection::from_args(sheet, all_sheets);
            let status = parse_command(
                &input,
                &selection,
                format,
                strict,
                cli.config.as_deref(),
                &overrides,
            )?;
            if status != 0 {
                std::process::exit(status);
            }
        }
        Commands::Detect {
            input,
            sheet,
            all_sheets,
            format,
        } => {
            let selection = SheetSelection::from_args(sheet, all_sheets);
            detect_command(&input, &selection, format, cli.config.as_deref())?;
        }
        Commands::Sheets { input, format } => {
            sheets_command(&input, format)?;
        }
    }

    Ok(())
}

/// Install the stderr log subscriber; `RUST_LOG` wins unless verbose
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    // A subscriber may already be installed when embedded
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Execute the parse command, returning the process exit status
///
/// Status is 2 when any sheet carries a critical issue, 1 in strict mode
/// when any sheet carries an error, else 0.
pub fn parse_command(
    input: &Path,
    selection: &SheetSelection,
    format: OutputFormat,
    strict: bool,
    config_path: Option<&Path>,
    overrides: &LayoutOverride,
) -> Result<i32> {
    let engine = load_engine(config_path)?;
    let outcomes = parse_file(&engine, input, selection, overrides)?;

    match format {
        OutputFormat::Json => {
            let json = if matches!(selection, SheetSelection::All) {
                serde_json::to_string_pretty(&outcomes)
            } else {
                serde_json::to_string_pretty(&outcomes.first())
            }
            .context("Failed to serialize parse result to JSON")?;
            println!("{}", json);
        }
        OutputFormat::Text => {
            for outcome in &outcomes {
                println!("{}", render_report(outcome));
            }
        }
    }

    Ok(exit_status(&outcomes, strict))
}

/// Read the selected sheets and run the engine on each
///
/// Never returns an empty list: a single selected sheet is parsed even when
/// blank, and `All` falls back to the first sheet when every sheet is blank.
pub fn parse_file(
    engine: &Engine,
    input: &Path,
    selection: &SheetSelection,
    overrides: &LayoutOverride,
) -> Result<Vec<ParseOutcome>> {
    let sheets = read_sheets(input, selection)?;
    let has_overrides = overrides != &LayoutOverride::default();

    Ok(sheets
        .iter()
        .map(|sheet| {
            if has_overrides {
                engine.parse_with_override(sheet, overrides)
            } else {
                engine.parse(sheet)
            }
        })
        .collect())
}

/// Execute the detect command
pub fn detect_command(
    input: &Path,
    selection: &SheetSelection,
    format: OutputFormat,
    config_path: Option<&Path>,
) -> Result<()> {
    let engine = load_engine(config_path)?;
    let sheets = read_sheets(input, selection)?;
    let detections: Vec<DetectionResult> = sheets.iter().map(|s| engine.detect(s)).collect();

    match format {
        OutputFormat::Json => {
            let rows: Vec<SheetDetection> = sheets
                .iter()
                .zip(&detections)
                .map(|(sheet, detection)| SheetDetection {
                    sheet: &sheet.name,
                    detection,
                })
                .collect();
            let json =
                serde_json::to_string_pretty(&rows).context("Failed to serialize detection to JSON")?;
            println!("{}", json);
        }
        OutputFormat::Text => {
            for (sheet, detection) in sheets.iter().zip(&detections) {
                println!("{}", render_detection(&sheet.name, detection));
            }
        }
    }

    Ok(())
}

/// Execute the sheets command
pub fn sheets_command(input: &Path, format: OutputFormat) -> Result<()> {
    let source = open_source(input)?;
    let names = source
        .list_sheets()
        .with_context(|| format!("Failed to list sheets: {}", input.display()))?;

    match format {
        OutputFormat::Json => {
            let json =
                serde_json::to_string_pretty(&names).context("Failed to serialize sheet list")?;
            println!("{}", json);
        }
        OutputFormat::Text => {
            for name in &names {
                println!("{}", name);
            }
        }
    }

    Ok(())
}

fn open_source(input: &Path) -> Result<Box<dyn DataSource>> {
    if !input.exists() {
        anyhow::bail!("Input file not found: {}", input.display());
    }
    DataEngine::open(input).with_context(|| format!("Failed to open workbook: {}", input.display()))
}

fn read_sheets(input: &Path, selection: &SheetSelection) -> Result<Vec<RawWorksheet>> {
    let source = open_source(input)?;

    let name = match selection {
        SheetSelection::Named(name) => name.clone(),
        SheetSelection::Default => source
            .default_sheet()
            .with_context(|| format!("No sheets in workbook: {}", input.display()))?,
        SheetSelection::All => {
            let all = source
                .read_all_sheets()
                .with_context(|| format!("Failed to read sheets: {}", input.display()))?;
            let total = all.len();
            let mut filled = Vec::new();
            let mut first_blank = None;
            for sheet in all {
                if sheet.is_empty() {
                    debug!(sheet = %sheet.name, "skipping empty sheet");
                    first_blank.get_or_insert(sheet);
                } else {
                    filled.push(sheet);
                }
            }
            debug!(total, parsed = filled.len(), "sheets selected");

            if filled.is_empty() {
                filled.extend(first_blank);
            }
            if filled.is_empty() {
                anyhow::bail!("No sheets in workbook: {}", input.display());
            }
            return Ok(filled);
        }
    };

    let sheet = source
        .read_sheet(&name)
        .with_context(|| format!("Failed to read sheet '{}' from {}", name, input.display()))?;
    Ok(vec![sheet])
}

/// Build the engine from `--config`, a config file in the working
/// directory, or defaults
fn load_engine(config_path: Option<&Path>) -> Result<Engine> {
    let config = load_config(config_path)?;
    Engine::new(config).context("Invalid engine configuration")
}

fn load_config(config_path: Option<&Path>) -> Result<EngineConfig> {
    match config_path {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            EngineConfig::from_toml_str(&content)
                .with_context(|| format!("Failed to parse config: {}", path.display()))
        }
        None => {
            for candidate in CONFIG_CANDIDATES {
                if Path::new(candidate).exists() {
                    let content = fs::read_to_string(candidate)?;
                    match EngineConfig::from_toml_str(&content) {
                        Ok(config) => return Ok(config),
                        Err(e) => warn!(file = candidate, error = %e, "ignoring invalid config"),
                    }
                }
            }
            Ok(EngineConfig::default())
        }
    }
}

/// Exit status for a finished run
pub fn exit_status(outcomes: &[ParseOutcome], strict: bool) -> i32 {
    let summaries: Vec<_> = outcomes.iter().map(|o| o.data.summary()).collect();
    if summaries.iter().any(|s| s.critical > 0) {
        2
    } else if strict && summaries.iter().any(|s| s.errors > 0) {
        1
    } else {
        0
    }
}

/// Human-readable report for one parsed sheet
pub fn render_report(outcome: &ParseOutcome) -> String {
    let data = &outcome.data;
    let mut out = String::new();

    let name = if data.resort_name.is_empty() {
        "(unknown)"
    } else {
        data.resort_name.as_str()
    };
    let _ = writeln!(out, "Resort: {}", name);
    if let Some(destination) = &data.destination {
        let _ = writeln!(out, "Destination: {}", destination);
    }
    let _ = writeln!(out, "Currency: {}", data.metadata.currency);
    if let (Some(from), Some(to)) = (data.metadata.valid_from, data.metadata.valid_to) {
        let _ = writeln!(out, "Valid: {} to {}", from, to);
    }
    match outcome.detection.orientation() {
        Some(orientation) => {
            let _ = writeln!(
                out,
                "Layout: {} (confidence {:.2})",
                orientation, outcome.detection.confidence
            );
        }
        None => {
            let _ = writeln!(out, "Layout: not detected");
        }
    }
    let _ = writeln!(
        out,
        "Records: {} ({} priced)",
        data.pricing.len(),
        data.available_records().count()
    );
    let _ = writeln!(out, "Inclusions: {}", data.inclusions.len());
    if let Some(exclusions) = &data.exclusions {
        let _ = writeln!(out, "Exclusions: {}", exclusions.len());
    }

    if !data.issues.is_empty() {
        out.push('\n');
        for issue in &data.issues {
            let _ = writeln!(out, "{}\n", issue);
        }
    }

    let summary = data.summary();
    let _ = writeln!(
        out,
        "Found {} critical, {} error(s), {} warning(s) and {} info",
        summary.critical, summary.errors, summary.warnings, summary.info
    );
    let verdict = if data.is_import_eligible() {
        "✓ Ready to import"
    } else {
        "✗ Not importable"
    };
    let _ = write!(out, "{}", verdict);
    out
}

/// Human-readable detection summary for one sheet
pub fn render_detection(sheet: &str, detection: &DetectionResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Sheet: {}", sheet);

    let Some(primary) = &detection.primary else {
        let _ = write!(out, "  No pricing layout detected");
        return out;
    };
    let _ = writeln!(
        out,
        "  Layout: {} (confidence {:.2}{})",
        detection.orientation().unwrap_or(primary.orientation),
        detection.confidence,
        if detection.low_confidence { ", low" } else { "" }
    );
    let _ = writeln!(out, "  Header band: {}", primary.header_band);
    let _ = writeln!(out, "  Headers: {}", primary.detected_headers.join(", "));
    if let Some(bounds) = detection.pricing_bounds {
        let _ = writeln!(out, "  Pricing: {}", bounds);
    }
    if let Some(bounds) = detection.inclusions_bounds {
        let _ = writeln!(out, "  Inclusions: {}", bounds);
    }
    for secondary in &detection.secondary {
        let _ = writeln!(
            out,
            "  Alternative: {} at {} (confidence {:.2})",
            secondary.orientation, secondary.header_band, secondary.confidence
        );
    }
    out.truncate(out.trim_end().len());
    out
}
