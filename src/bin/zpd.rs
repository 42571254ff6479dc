//! zpd CLI - Command-line interface for Mastery Zone
//!
//! Commands:
//! - replay: Replay graded answer scores through a controller (batch mode)
//! - run: Process answer scores streamed on stdin (streaming mode)
//! - performance: Compute recency-weighted performance of a score list
//! - doctor: Diagnose configuration and saved state health

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, BufRead, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use mastery_zone::encoder::{UpdateEncoder, UpdateRecord};
use mastery_zone::history::DEFAULT_WINDOW_SIZE;
use mastery_zone::{compute_performance, ZoneConfig, ZoneError, ZoneProcessor};
use mastery_zone::{PRODUCER_NAME, ZONE_VERSION};

/// zpd - Adaptive difficulty controller for mastery-zone scores
#[derive(Parser)]
#[command(name = "zpd")]
#[command(version = ZONE_VERSION)]
#[command(about = "Track a learner's mastery-zone score from graded answers", long_about = None)]
struct Cli {
    /// Log controller updates to stderr (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay answer scores through a controller (batch mode)
    Replay {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long)]
        output: PathBuf,

        /// Input format
        #[arg(long, default_value = "lines")]
        input_format: InputFormat,

        /// Output format
        #[arg(long, default_value = "ndjson")]
        output_format: OutputFormat,

        #[command(flatten)]
        controller: ControllerArgs,
    },

    /// Process answer scores streamed on stdin, one per line (streaming mode)
    Run {
        /// Output format
        #[arg(long, default_value = "ndjson")]
        output_format: OutputFormat,

        #[command(flatten)]
        controller: ControllerArgs,

        /// Flush output after each record
        #[arg(long, default_value = "true")]
        flush: bool,
    },

    /// Compute recency-weighted performance of scores ordered oldest to newest
    Performance {
        /// Answer scores in [0, 1]
        #[arg(allow_hyphen_values = true)]
        scores: Vec<f64>,
    },

    /// Diagnose configuration and saved state health
    Doctor {
        /// Check a saved state file
        #[arg(long)]
        state: Option<PathBuf>,

        /// Check a config file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(clap::Args)]
struct ControllerArgs {
    /// Initial mastery-zone score for a fresh controller
    #[arg(long, default_value = "5.0")]
    initial_score: f64,

    /// Number of recent answers kept for performance scoring
    #[arg(long, default_value_t = DEFAULT_WINDOW_SIZE)]
    window: usize,

    /// Controller configuration JSON file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Student ID attached to output records
    #[arg(long)]
    student_id: Option<String>,

    /// Load controller state from file
    #[arg(long)]
    load_state: Option<PathBuf>,

    /// Save controller state to file after processing
    #[arg(long)]
    save_state: Option<PathBuf>,
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// One score per line
    Lines,
    /// JSON array of scores
    Json,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Newline-delimited JSON (one update record per line)
    Ndjson,
    /// JSON array of update records
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("mastery_zone=debug,zpd=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), ZpdCliError> {
    match cli.command {
        Commands::Replay {
            input,
            output,
            input_format,
            output_format,
            controller,
        } => cmd_replay(&input, &output, input_format, output_format, &controller),

        Commands::Run {
            output_format,
            controller,
            flush,
        } => cmd_run(output_format, &controller, flush),

        Commands::Performance { scores } => cmd_performance(&scores),

        Commands::Doctor {
            state,
            config,
            json,
        } => cmd_doctor(state.as_deref(), config.as_deref(), json),
    }
}

fn cmd_replay(
    input: &Path,
    output: &Path,
    input_format: InputFormat,
    output_format: OutputFormat,
    args: &ControllerArgs,
) -> Result<(), ZpdCliError> {
    // Read input
    let input_data = if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(input)?
    };

    let answers = match input_format {
        InputFormat::Lines => parse_lines(&input_data)?,
        InputFormat::Json => serde_json::from_str::<Vec<f64>>(&input_data)?,
    };

    if answers.is_empty() {
        return Err(ZpdCliError::NoAnswers);
    }

    let mut processor = build_processor(args)?;
    let encoder = UpdateEncoder::new();
    let student_id = args.student_id.as_deref();

    let mut records: Vec<UpdateRecord> = Vec::with_capacity(answers.len());
    for answer in answers {
        let event = processor.record_answer(answer)?;
        records.push(encoder.encode(&event, student_id));
    }

    info!(
        answers = records.len(),
        score = processor.current_score(),
        "replay finished"
    );

    save_state_if_requested(&processor, args.save_state.as_deref())?;

    let output_data = format_output(&records, &output_format)?;
    if output.to_string_lossy() == "-" {
        print!("{}", output_data);
    } else {
        fs::write(output, output_data)?;
    }

    Ok(())
}

fn cmd_run(
    output_format: OutputFormat,
    args: &ControllerArgs,
    flush: bool,
) -> Result<(), ZpdCliError> {
    let mut processor = build_processor(args)?;
    let encoder = UpdateEncoder::new();

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    let streamed = stream_answers(
        &mut processor,
        &encoder,
        stdin.lock(),
        &mut stdout,
        &output_format,
        args.student_id.as_deref(),
        flush,
    );

    // Records already written must stay in step with the saved state, even
    // when the stream stops on a bad line.
    let saved = save_state_if_requested(&processor, args.save_state.as_deref());
    streamed?;
    saved
}

/// Feed answer scores from `reader` through the processor, one record per line
fn stream_answers<R: BufRead, W: Write>(
    processor: &mut ZoneProcessor,
    encoder: &UpdateEncoder,
    reader: R,
    writer: &mut W,
    output_format: &OutputFormat,
    student_id: Option<&str>,
    flush: bool,
) -> Result<usize, ZpdCliError> {
    let mut count = 0;

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();

        if trimmed.is_empty() {
            continue;
        }

        let answer = parse_score(trimmed, index + 1)?;
        let event = processor.record_answer(answer)?;
        let record = encoder.encode(&event, student_id);

        write!(writer, "{}", format_output(&[record], output_format)?)?;
        if flush {
            writer.flush()?;
        }
        count += 1;
    }

    writer.flush()?;
    Ok(count)
}

fn cmd_performance(scores: &[f64]) -> Result<(), ZpdCliError> {
    let performance = compute_performance(scores)?;
    println!("{:.4}", performance);
    Ok(())
}

fn cmd_doctor(
    state: Option<&Path>,
    config: Option<&Path>,
    json: bool,
) -> Result<(), ZpdCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "zpd_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("mastery-zone version {}", ZONE_VERSION),
    });

    if let Some(config_path) = config {
        checks.push(match fs::read_to_string(config_path) {
            Ok(content) => match ZoneConfig::from_json(&content) {
                Ok(cfg) => DoctorCheck {
                    name: "config".to_string(),
                    status: CheckStatus::Ok,
                    message: format!(
                        "Config valid (scores {:.1}-{:.1}, alpha {}, beta {})",
                        cfg.min_score, cfg.max_score, cfg.performance_alpha, cfg.score_beta
                    ),
                },
                Err(e) => DoctorCheck {
                    name: "config".to_string(),
                    status: CheckStatus::Error,
                    message: e.to_string(),
                },
            },
            Err(e) => DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Error,
                message: format!("Cannot read config file: {}", e),
            },
        });
    }

    if let Some(state_path) = state {
        checks.push(if !state_path.exists() {
            DoctorCheck {
                name: "state".to_string(),
                status: CheckStatus::Warning,
                message: "State file does not exist".to_string(),
            }
        } else {
            match fs::read_to_string(state_path) {
                Ok(content) => match ZoneProcessor::from_json(&content) {
                    Ok(processor) => DoctorCheck {
                        name: "state".to_string(),
                        status: CheckStatus::Ok,
                        message: format!(
                            "State valid (score {:.1}, {} answers in window, streak {})",
                            processor.current_score(),
                            processor.answer_history().len(),
                            processor.state().consecutive_successes()
                        ),
                    },
                    Err(e) => DoctorCheck {
                        name: "state".to_string(),
                        status: CheckStatus::Error,
                        message: e.to_string(),
                    },
                },
                Err(e) => DoctorCheck {
                    name: "state".to_string(),
                    status: CheckStatus::Error,
                    message: format!("Cannot read state file: {}", e),
                },
            }
        });
    }

    checks.push(if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (interactive mode)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (streaming mode ready)".to_string(),
        }
    });

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: ZONE_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("zpd Doctor Report");
        println!("=================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(ZpdCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// Helper functions

fn build_processor(args: &ControllerArgs) -> Result<ZoneProcessor, ZpdCliError> {
    if let Some(state_path) = &args.load_state {
        let json = fs::read_to_string(state_path)?;
        debug!(path = %state_path.display(), "loading controller state");
        return Ok(ZoneProcessor::from_json(&json)?);
    }

    let config = match &args.config {
        Some(path) => ZoneConfig::from_json(&fs::read_to_string(path)?)?,
        None => ZoneConfig::default(),
    };

    Ok(ZoneProcessor::with_config(
        args.initial_score,
        config,
        args.window,
    )?)
}

fn save_state_if_requested(
    processor: &ZoneProcessor,
    path: Option<&Path>,
) -> Result<(), ZpdCliError> {
    if let Some(state_path) = path {
        fs::write(state_path, processor.save_state()?)?;
        debug!(path = %state_path.display(), "saved controller state");
    }
    Ok(())
}

fn parse_lines(input: &str) -> Result<Vec<f64>, ZpdCliError> {
    input
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| parse_score(line.trim(), index + 1))
        .collect()
}

fn parse_score(text: &str, line: usize) -> Result<f64, ZpdCliError> {
    text.parse::<f64>()
        .map_err(|e| ZpdCliError::ParseError(format!("line {}: {:?}: {}", line, text, e)))
}

fn format_output(records: &[UpdateRecord], format: &OutputFormat) -> Result<String, ZpdCliError> {
    match format {
        OutputFormat::Ndjson => {
            let mut lines: Vec<String> = Vec::new();
            for record in records {
                lines.push(serde_json::to_string(record)?);
            }
            Ok(lines.join("\n") + "\n")
        }
        OutputFormat::Json => Ok(serde_json::to_string(records)?),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(records)?),
    }
}

// Error types

#[derive(Debug)]
enum ZpdCliError {
    Io(io::Error),
    Zone(ZoneError),
    Json(serde_json::Error),
    NoAnswers,
    DoctorFailed,
    ParseError(String),
}

impl From<io::Error> for ZpdCliError {
    fn from(e: io::Error) -> Self {
        ZpdCliError::Io(e)
    }
}

impl From<ZoneError> for ZpdCliError {
    fn from(e: ZoneError) -> Self {
        ZpdCliError::Zone(e)
    }
}

impl From<serde_json::Error> for ZpdCliError {
    fn from(e: serde_json::Error) -> Self {
        ZpdCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<ZpdCliError> for CliError {
    fn from(e: ZpdCliError) -> Self {
        match e {
            ZpdCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            ZpdCliError::Zone(e) => {
                let (code, hint) = match &e {
                    ZoneError::Configuration(_) => (
                        "CONFIGURATION_ERROR",
                        "Check the initial score against the configured bounds and the config file",
                    ),
                    ZoneError::InvalidInput(_) => {
                        ("INVALID_INPUT", "Answer scores must lie in [0.0, 1.0]")
                    }
                    ZoneError::ParseError(_) | ZoneError::JsonError(_) => {
                        ("STATE_ERROR", "Run 'zpd doctor --state <file>' for details")
                    }
                    ZoneError::EncodingError(_) => ("ENCODING_ERROR", "Retry the command"),
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            ZpdCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            ZpdCliError::NoAnswers => CliError {
                code: "NO_ANSWERS".to_string(),
                message: "No answer scores found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            ZpdCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
            ZpdCliError::ParseError(msg) => CliError {
                code: "PARSE_ERROR".to_string(),
                message: msg,
                hint: Some("Put one score between 0 and 1 on each line".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
