use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use glob::glob;
use serde::Serialize;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use zwiftmetrics_core::{AnalysisConfig, Report, ZWIFT_OUTGOING_PORT, ZwiftError};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (commit ",
    env!("ZWIFTMETRICS_BUILD_COMMIT"),
    ", ",
    env!("ZWIFTMETRICS_BUILD_DATE"),
    ")"
);

const ANALYSE_EXAMPLES: &str = "Examples:\n  zwiftmetrics pcap analyse ride.pcapng -o report.json\n  zwiftmetrics pcap analyze ride.pcap --stdout --pretty\n  zwiftmetrics pcap analyse ride.pcapng --report report.json --samples";

#[derive(Parser, Debug)]
#[command(name = "zwiftmetrics")]
#[command(version, long_version = LONG_VERSION)]
#[command(
    about = "Decoder for Zwift player-state telemetry (power, heart rate, cadence, speed).",
    long_about = None,
    after_help = "Examples:\n  zwiftmetrics pcap analyse ride.pcapng -o report.json\n  zwiftmetrics decode 080210b9603a0f18e807301e485a58910160dc017832"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). RUST_LOG overrides.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Operations on PCAP/PCAPNG captures of a ride.
    Pcap {
        #[command(subcommand)]
        command: PcapCommands,
    },
    /// Decode one hex-encoded player-state payload and print it as JSON.
    Decode(DecodeArgs),
}

#[derive(Subcommand, Debug)]
enum PcapCommands {
    /// Decode every player-state datagram in a capture into a JSON report.
    #[command(alias = "analyze")]
    #[command(after_help = ANALYSE_EXAMPLES)]
    Analyse(AnalyseArgs),
}

#[derive(Args, Debug)]
struct AnalyseArgs {
    /// Path to a .pcap or .pcapng file (glob patterns must match one file)
    input: PathBuf,

    /// Output report path (JSON)
    #[arg(short = 'o', long, required_unless_present = "stdout")]
    report: Option<PathBuf>,

    /// Write JSON report to stdout
    #[arg(long, conflicts_with = "report")]
    stdout: bool,

    /// Pretty-print JSON output
    #[arg(long, conflicts_with = "compact")]
    pretty: bool,

    /// Compact JSON output (default)
    #[arg(long)]
    compact: bool,

    /// Suppress non-error output
    #[arg(long)]
    quiet: bool,

    /// Exit with a non-zero code if any payload failed to decode
    #[arg(long)]
    strict: bool,

    /// List decode failures after analysis
    #[arg(long)]
    list_failures: bool,

    /// UDP destination port carrying player-state datagrams
    #[arg(long, default_value_t = ZWIFT_OUTGOING_PORT)]
    port: u16,

    /// Include every decoded packet in the report
    #[arg(long)]
    samples: bool,
}

#[derive(Args, Debug)]
struct DecodeArgs {
    /// Payload as hex text; read from stdin when omitted
    hex: Option<String>,

    /// Print the schema-less field map instead of the telemetry packet
    #[arg(long)]
    raw: bool,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Pcap {
            command: PcapCommands::Analyse(args),
        } => cmd_pcap_analyse(args),
        Commands::Decode(args) => cmd_decode(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {}", hint);
            }
            ExitCode::from(2)
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            format!("zwiftmetrics={level},zwiftmetrics_core={level}").into()
        }))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .init();
}

#[derive(Debug)]
struct CliError {
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(message: impl Into<String>, hint: Option<String>) -> Self {
        Self {
            message: message.into(),
            hint,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::new(format!("{err:#}"), None)
    }
}

impl From<ZwiftError> for CliError {
    fn from(err: ZwiftError) -> Self {
        let hint = match err {
            ZwiftError::InvalidHexInput { .. } => "expected two hex digits per byte",
            ZwiftError::SchemaMismatch { .. } => {
                "payload decoded but is not a player-state message; try --raw"
            }
            _ => "payload does not follow the player-state wire layout",
        };
        CliError::new(err.to_string(), Some(hint.to_string()))
    }
}

fn cmd_pcap_analyse(args: AnalyseArgs) -> Result<(), CliError> {
    let resolved_input = resolve_input_path(&args.input)?;
    validate_input_file(&resolved_input)?;
    let input_abs = fs::canonicalize(&resolved_input)
        .with_context(|| format!("Failed to resolve input path: {}", resolved_input.display()))?;

    let report_path = if args.stdout {
        None
    } else {
        let path = args.report.clone().ok_or_else(|| {
            CliError::new(
                "missing output path",
                Some("use -o/--report or --stdout".to_string()),
            )
        })?;
        ensure_distinct_output(&path, &input_abs)?;
        Some(path)
    };

    tracing::debug!(input = %input_abs.display(), port = args.port, "analysing capture");
    let config = AnalysisConfig {
        port: args.port,
        include_samples: args.samples,
        ..AnalysisConfig::default()
    };
    let rep = zwiftmetrics_core::analyze_pcap_file(&resolved_input, &config)
        .context("PCAP/PCAPNG analysis failed")?;
    let json = serialize_json(&rep, args.pretty && !args.compact)?;

    match report_path {
        None => print!("{}", json),
        Some(report) => {
            if let Some(parent) = report.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent).with_context(|| {
                        format!("Failed to create output directory: {}", parent.display())
                    })?;
                }
            }
            fs::write(&report, json)
                .with_context(|| format!("Failed to write report: {}", report.display()))?;
            if !args.quiet {
                eprintln!(
                    "OK: {} of {} datagrams decoded -> {}",
                    rep.telemetry.decoded,
                    rep.telemetry.datagrams,
                    report.display()
                );
            }
        }
    }

    if args.list_failures && !args.quiet {
        print_failures(&rep);
    }
    if args.strict && rep.telemetry.failed > 0 {
        return Err(CliError::new(
            format!("{} payload(s) failed to decode", rep.telemetry.failed),
            Some("use --list-failures to inspect".to_string()),
        ));
    }
    Ok(())
}

fn cmd_decode(args: DecodeArgs) -> Result<(), CliError> {
    let text = match args.hex {
        Some(hex) => hex,
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read payload from stdin")?;
            buf
        }
    };
    let payload = zwiftmetrics_core::decode_hex(text.trim())?;

    let json = if args.raw {
        let message = zwiftmetrics_core::decode_message(&payload)?;
        serialize_json(&message, args.pretty)?
    } else {
        let packet = zwiftmetrics_core::parse_telemetry(&payload)?;
        serialize_json(&packet, args.pretty)?
    };
    println!("{}", json);
    Ok(())
}

fn ensure_distinct_output(report_path: &Path, input_abs: &Path) -> Result<(), CliError> {
    let parent = match report_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    // A missing output directory is created later, so it cannot alias the input.
    let Ok(report_dir) = fs::canonicalize(parent) else {
        return Ok(());
    };
    let file_name = report_path
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("Invalid report path: {}", report_path.display()))?;
    if report_dir.join(file_name) == input_abs {
        return Err(CliError::new(
            format!(
                "report path must differ from input: {}",
                report_path.display()
            ),
            Some("choose a different output path".to_string()),
        ));
    }
    Ok(())
}

fn serialize_json<T: Serialize + ?Sized>(
    value: &T,
    pretty: bool,
) -> Result<String, CliError> {
    let json = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    json.context("JSON serialization failed").map_err(Into::into)
}

fn print_failures(rep: &Report) {
    eprintln!("Decode failures:");
    if rep.decode_failures.is_empty() {
        eprintln!("  none");
    }
    for failure in &rep.decode_failures {
        eprintln!("  {} ({}): {}", failure.id, failure.count, failure.message);
    }
}

fn validate_input_file(input: &Path) -> Result<(), CliError> {
    if !input.exists() {
        return Err(CliError::new(
            format!("input file not found: {}", input.display()),
            Some("use a .pcap or .pcapng file".to_string()),
        ));
    }
    if !input.is_file() {
        return Err(CliError::new(
            format!("input is not a file: {}", input.display()),
            Some("use a .pcap or .pcapng file".to_string()),
        ));
    }
    let ext = input
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    if ext != "pcap" && ext != "pcapng" {
        return Err(CliError::new(
            format!("unsupported input format '{}'", input.display()),
            Some("expected a .pcap or .pcapng file".to_string()),
        ));
    }
    Ok(())
}

fn resolve_input_path(input: &Path) -> Result<PathBuf, CliError> {
    let pattern = input.to_string_lossy();
    if !is_glob_pattern(&pattern) {
        return Ok(input.to_path_buf());
    }

    let paths = glob(&pattern).map_err(|err| {
        CliError::new(
            format!("invalid input pattern '{}'", pattern),
            Some(format!("pattern error: {}", err.msg)),
        )
    })?;
    let mut matches = Vec::new();
    for entry in paths {
        let path = entry.map_err(|err| {
            CliError::new(
                format!("invalid input pattern '{}'", pattern),
                Some(format!("pattern error: {}", err)),
            )
        })?;
        if path.is_file() {
            matches.push(path);
        }
    }

    match matches.len() {
        0 => Err(CliError::new(
            format!("no files match pattern '{}'", pattern),
            Some("check the path or quote the pattern; expected .pcap or .pcapng".to_string()),
        )),
        1 => Ok(matches.remove(0)),
        count => {
            let listed: Vec<String> = matches
                .iter()
                .take(3)
                .map(|p| p.display().to_string())
                .collect();
            let more = if count > 3 { ", ..." } else { "" };
            Err(CliError::new(
                format!(
                    "multiple files match pattern '{}' ({} matches); matches: {}{}",
                    pattern,
                    count,
                    listed.join(", "),
                    more
                ),
                Some("pass a single capture file, or run once per file".to_string()),
            ))
        }
    }
}

fn is_glob_pattern(input: &str) -> bool {
    input.contains('*') || input.contains('?') || input.contains('[')
}
