//! mindcity CLI - Command-line interface for Mind City Flux
//!
//! Commands:
//! - assess: Assess summary messages from a file (batch mode)
//! - run: Assess summary messages streamed on stdin (streaming mode)
//! - track: Feed per-epoch metrics or band powers through the tracker
//! - validate: Validate EEG message schema
//! - doctor: Diagnose configuration and environment
//! - schema: Print input/output schema

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, BufRead, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use mindcity_flux::config::DEFAULT_LOG_LEVEL;
use mindcity_flux::features::BandPowers;
use mindcity_flux::pipeline::FeedbackProcessor;
use mindcity_flux::schema::{EegMessage, SchemaAdapter, SCHEMA_VERSION};
use mindcity_flux::tracker::MetricsTracker;
use mindcity_flux::types::{Assessment, MetricsSample};
use mindcity_flux::{ComputeError, ConfigError, EngineConfig, ENGINE_VERSION, PRODUCER_NAME};

/// mindcity - EEG feedback engine for the Mind City Navigator
#[derive(Parser)]
#[command(name = "mindcity")]
#[command(author = "Mind City Navigator Team")]
#[command(version = ENGINE_VERSION)]
#[command(about = "Turn EEG summaries into city preference verdicts and scores", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assess summary messages (batch mode)
    Assess {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output format
        #[arg(long, default_value = "ndjson")]
        output_format: OutputFormat,
    },

    /// Assess summary messages streamed on stdin (streaming mode)
    Run {
        /// Output format
        #[arg(long, default_value = "ndjson")]
        output_format: OutputFormat,

        /// Abort on the first malformed or invalid message
        #[arg(long)]
        strict: bool,

        /// Flush output after each record (`--flush false` to buffer)
        #[arg(long, default_value_t = true, action = ArgAction::Set)]
        flush: bool,
    },

    /// Track per-epoch samples from stdin and assess every summary interval
    Track {
        /// Kind of record on each input line
        #[arg(long, default_value = "metrics")]
        input_kind: TrackInput,

        /// Output format
        #[arg(long, default_value = "ndjson")]
        output_format: OutputFormat,

        /// Samples per summary (overrides MINDCITY_SUMMARY_INTERVAL)
        #[arg(long, conflicts_with = "load_tracker")]
        interval: Option<usize>,

        /// Load tracker state from file; the saved interval is kept
        #[arg(long)]
        load_tracker: Option<PathBuf>,

        /// Save tracker state to file on exit
        #[arg(long)]
        save_tracker: Option<PathBuf>,

        /// Abort on the first malformed or invalid sample
        #[arg(long)]
        strict: bool,

        /// Flush output after each record (`--flush false` to buffer)
        #[arg(long, default_value_t = true, action = ArgAction::Set)]
        flush: bool,
    },

    /// Validate EEG message schema
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose configuration and environment
    Doctor {
        /// Check a saved tracker state file
        #[arg(long)]
        tracker: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print schema information
    Schema {
        /// Schema to print (input or output)
        #[arg(value_enum)]
        schema_type: SchemaType,

        /// Output as JSON schema
        #[arg(long)]
        json_schema: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Newline-delimited JSON (one message per line)
    Ndjson,
    /// JSON array of messages
    Json,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Newline-delimited JSON (one assessment per line)
    Ndjson,
    /// JSON array of assessments
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

#[derive(Clone, ValueEnum)]
enum TrackInput {
    /// Metric samples (all seven channels)
    Metrics,
    /// Band powers (delta, theta, alpha, beta)
    Bands,
}

#[derive(Clone, ValueEnum)]
enum SchemaType {
    /// Input schema (mindcity.eeg_message.v1)
    Input,
    /// Output schema (assessment)
    Output,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), MindcityCliError> {
    dotenvy::dotenv().ok();

    // Doctor reports a bad configuration as a failed check
    let loaded = EngineConfig::load();
    let log_level = loaded
        .as_ref()
        .map_or(DEFAULT_LOG_LEVEL, |config| config.log_level.as_str());
    init_telemetry(log_level)?;

    match cli.command {
        Commands::Assess {
            input,
            output,
            input_format,
            output_format,
        } => cmd_assess(&loaded?, &input, &output, input_format, output_format),

        Commands::Run {
            output_format,
            strict,
            flush,
        } => cmd_run(&loaded?, output_format, strict, flush),

        Commands::Track {
            input_kind,
            output_format,
            interval,
            load_tracker,
            save_tracker,
            strict,
            flush,
        } => {
            let config = loaded?;
            let config = EngineConfig {
                summary_interval: interval.unwrap_or(config.summary_interval),
                ..config
            };
            cmd_track(
                &config,
                input_kind,
                output_format,
                load_tracker.as_deref(),
                save_tracker.as_deref(),
                strict,
                flush,
            )
        }

        Commands::Validate {
            input,
            input_format,
            json,
        } => cmd_validate(&input, input_format, json),

        Commands::Doctor { tracker, json } => cmd_doctor(&loaded, tracker.as_deref(), json),

        Commands::Schema {
            schema_type,
            json_schema,
        } => cmd_schema(schema_type, json_schema),
    }
}

/// Log to stderr so stdout stays machine-readable
fn init_telemetry(log_level: &str) -> Result<(), MindcityCliError> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(log_level).map_err(|e| {
            MindcityCliError::Telemetry(format!("invalid log level/filter '{log_level}': {e}"))
        })?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .with_ansi(false)
        .try_init()
        .map_err(|e| MindcityCliError::Telemetry(e.to_string()))
}

fn cmd_assess(
    config: &EngineConfig,
    input: &Path,
    output: &Path,
    input_format: InputFormat,
    output_format: OutputFormat,
) -> Result<(), MindcityCliError> {
    let input_data = read_input(input)?;

    let messages = match input_format {
        InputFormat::Ndjson => SchemaAdapter::parse_ndjson(&input_data)?,
        InputFormat::Json => SchemaAdapter::parse_array(&input_data)?,
    };

    if messages.is_empty() {
        return Err(MindcityCliError::NoMessages);
    }

    let mut processor = FeedbackProcessor::from_config(config);
    let mut assessments: Vec<Assessment> = Vec::new();

    for message in &messages {
        if let Some(assessment) = processor.handle_message(message)? {
            assessments.push(assessment);
        }
    }

    if assessments.is_empty() {
        return Err(MindcityCliError::NoSummaries);
    }
    debug!(
        messages = messages.len(),
        assessments = assessments.len(),
        "batch assessed"
    );

    let output_data = format_output(&assessments, &output_format)?;

    if output.to_string_lossy() == "-" {
        print!("{}", output_data);
    } else {
        fs::write(output, output_data)?;
    }

    Ok(())
}

fn cmd_run(
    config: &EngineConfig,
    output_format: OutputFormat,
    strict: bool,
    flush: bool,
) -> Result<(), MindcityCliError> {
    let mut processor = FeedbackProcessor::from_config(config);

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for (line_num, line) in stdin.lock().lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();

        if trimmed.is_empty() {
            continue;
        }

        let outcome = serde_json::from_str::<EegMessage>(trimmed)
            .map_err(ComputeError::from)
            .and_then(|message| processor.handle_message(&message));

        match outcome {
            Ok(Some(assessment)) => {
                write!(stdout, "{}", format_output(&[assessment], &output_format)?)?;
                if flush {
                    stdout.flush()?;
                }
            }
            Ok(None) => {}
            Err(e) if strict => {
                return Err(MindcityCliError::Line {
                    line: line_num + 1,
                    source: e,
                })
            }
            Err(e) => warn!(line = line_num + 1, error = %e, "skipping message"),
        }
    }

    stdout.flush()?;
    Ok(())
}

fn cmd_track(
    config: &EngineConfig,
    input_kind: TrackInput,
    output_format: OutputFormat,
    load_tracker: Option<&Path>,
    save_tracker: Option<&Path>,
    strict: bool,
    flush: bool,
) -> Result<(), MindcityCliError> {
    let mut processor = FeedbackProcessor::from_config(config);

    if let Some(tracker_path) = load_tracker {
        let tracker_json = fs::read_to_string(tracker_path)?;
        processor.load_tracker(&tracker_json)?;
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for (line_num, line) in stdin.lock().lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();

        if trimmed.is_empty() {
            continue;
        }

        let outcome = match input_kind {
            TrackInput::Metrics => serde_json::from_str::<MetricsSample>(trimmed)
                .map_err(ComputeError::from)
                .and_then(|sample| processor.ingest_metrics(&sample)),
            TrackInput::Bands => serde_json::from_str::<BandPowers>(trimmed)
                .map_err(ComputeError::from)
                .and_then(|bands| processor.ingest_band_powers(&bands)),
        };

        match outcome {
            Ok(Some(assessment)) => {
                write!(stdout, "{}", format_output(&[assessment], &output_format)?)?;
                if flush {
                    stdout.flush()?;
                }
            }
            Ok(None) => {}
            Err(e) if strict => {
                return Err(MindcityCliError::Line {
                    line: line_num + 1,
                    source: e,
                })
            }
            Err(e) => warn!(line = line_num + 1, error = %e, "skipping sample"),
        }
    }

    stdout.flush()?;

    if let Some(tracker_path) = save_tracker {
        let tracker_json = processor.save_tracker()?;
        fs::write(tracker_path, tracker_json)?;
    }

    Ok(())
}

fn cmd_validate(
    input: &Path,
    input_format: InputFormat,
    json: bool,
) -> Result<(), MindcityCliError> {
    let input_data = read_input(input)?;

    let messages = match input_format {
        InputFormat::Ndjson => SchemaAdapter::parse_ndjson(&input_data)?,
        InputFormat::Json => SchemaAdapter::parse_array(&input_data)?,
    };

    let results = SchemaAdapter::validate_messages(&messages);

    let report = ValidationReport {
        total_messages: messages.len(),
        valid_messages: messages.len() - results.len(),
        invalid_messages: results.len(),
        errors: results
            .iter()
            .map(|r| ValidationErrorDetail {
                index: r.index,
                message_type: r.message_type.to_string(),
                error: r.error.clone(),
            })
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total messages:   {}", report.total_messages);
        println!("Valid messages:   {}", report.valid_messages);
        println!("Invalid messages: {}", report.invalid_messages);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!("  - {} message (index {}): {}", err.message_type, err.index, err.error);
            }
        }
    }

    if report.invalid_messages > 0 {
        Err(MindcityCliError::ValidationFailed(report.invalid_messages))
    } else {
        Ok(())
    }
}

fn cmd_doctor(
    config: &Result<EngineConfig, ConfigError>,
    tracker: Option<&Path>,
    json: bool,
) -> Result<(), MindcityCliError> {
    let mut checks: Vec<DoctorCheck> = vec![
        DoctorCheck::new(
            "engine_version",
            CheckStatus::Ok,
            format!("Engine version {}", ENGINE_VERSION),
        ),
        DoctorCheck::new(
            "schema_version",
            CheckStatus::Ok,
            format!("Input schema: {}", SCHEMA_VERSION),
        ),
    ];

    checks.push(match config {
        Ok(config) => DoctorCheck::new(
            "config",
            CheckStatus::Ok,
            format!(
                "Summary interval {}, log level {}, instance id {}",
                config.summary_interval,
                config.log_level,
                config.instance_id.as_deref().unwrap_or("random")
            ),
        ),
        Err(e) => DoctorCheck::new("config", CheckStatus::Error, e.to_string()),
    });

    if let Some(tracker_path) = tracker {
        let check = if !tracker_path.exists() {
            DoctorCheck::new(
                "tracker",
                CheckStatus::Warning,
                "Tracker state file does not exist".to_string(),
            )
        } else {
            match fs::read_to_string(tracker_path) {
                Ok(content) => match MetricsTracker::from_json(&content) {
                    Ok(state) => DoctorCheck::new(
                        "tracker",
                        CheckStatus::Ok,
                        format!(
                            "Tracker state valid ({} samples tracked, {} in window of {})",
                            state.iterations(),
                            state.len(),
                            state.interval()
                        ),
                    ),
                    Err(e) => DoctorCheck::new(
                        "tracker",
                        CheckStatus::Error,
                        format!("Invalid tracker state: {}", e),
                    ),
                },
                Err(e) => DoctorCheck::new(
                    "tracker",
                    CheckStatus::Error,
                    format!("Cannot read tracker state file: {}", e),
                ),
            }
        };
        checks.push(check);
    }

    let stdin_message = if atty::is(atty::Stream::Stdin) {
        "stdin is a TTY (interactive mode)"
    } else {
        "stdin is a pipe (streaming mode ready)"
    };
    checks.push(DoctorCheck::new(
        "stdin",
        CheckStatus::Ok,
        stdin_message.to_string(),
    ));

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: ENGINE_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Mind City Doctor Report");
        println!("=======================");
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
        Err(MindcityCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

fn cmd_schema(schema_type: SchemaType, json_schema: bool) -> Result<(), MindcityCliError> {
    match schema_type {
        SchemaType::Input => {
            if json_schema {
                println!("{}", input_json_schema());
            } else {
                println!("Input Schema: {}", SCHEMA_VERSION);
                println!();
                println!("Messages are {{ \"type\": ..., \"data\": ... }} objects of two kinds:");
                println!();
                println!("1. summary - Aggregated metrics and mental state");
                println!("   - metrics: alpha_relaxation, beta_concentration, theta_relaxation,");
                println!("     engagement_index, arousal_index, frustration_index, mindfulness_index");
                println!("     (engagement, arousal, frustration and mindfulness are required)");
                println!("   - mental_state: relaxation, concentration, calm, engagement, arousal,");
                println!("     frustration, mindfulness; each \"low\", \"medium\" or \"high\"");
                println!("   - timestamp: unix seconds (optional, defaults to now)");
                println!("   - iterations_analyzed: samples aggregated (optional)");
                println!();
                println!("2. real_time - Live readings (ignored by assessment)");
                println!("   - data: {{ timestamp, channels: {{ electrode: value }}, metrics }}");
                println!("   - or flat: {{ \"type\": \"real_time\", \"metrics\": {{...}}, \"timestamp\": ... }}");
            }
        }
        SchemaType::Output => {
            if json_schema {
                println!("{}", output_json_schema());
            } else {
                println!("Output Schema: assessment v{}", mindcity_flux::encoder::ASSESSMENT_VERSION);
                println!();
                println!("- assessment_version: Schema version");
                println!("- producer: {{ name, version, instance_id }}");
                println!("- observed_at_utc, computed_at_utc, freshness_sec");
                println!("- iterations_analyzed: Samples behind the summary");
                println!("- verdict: {{ is_positive, reason, message, next_action, action_text, indicators }}");
                println!("- score: Preference score 1-10");
                println!("- raw_score: Weighted metric sum before scaling");
            }
        }
    }

    Ok(())
}

// Helper functions

fn read_input(input: &Path) -> Result<String, MindcityCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn format_output(assessments: &[Assessment], format: &OutputFormat) -> Result<String, MindcityCliError> {
    match format {
        OutputFormat::Ndjson => {
            let mut lines: Vec<String> = Vec::new();
            for assessment in assessments {
                lines.push(serde_json::to_string(assessment)?);
            }
            Ok(lines.join("\n") + "\n")
        }
        OutputFormat::Json => Ok(serde_json::to_string(assessments)? + "\n"),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(assessments)? + "\n"),
    }
}

fn input_json_schema() -> String {
    let levels = serde_json::json!({ "type": "string", "enum": ["low", "medium", "high"] });
    let number = serde_json::json!({ "type": "number" });

    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": SCHEMA_VERSION,
        "description": "Mind City EEG metrics stream message",
        "type": "object",
        "required": ["type"],
        "oneOf": [
            {
                "required": ["data"],
                "properties": {
                    "type": { "const": "summary" },
                    "data": {
                        "type": "object",
                        "required": ["metrics", "mental_state"],
                        "properties": {
                            "metrics": {
                                "type": "object",
                                "required": ["engagement_index", "arousal_index", "frustration_index", "mindfulness_index"],
                                "properties": {
                                    "alpha_relaxation": number,
                                    "beta_concentration": number,
                                    "theta_relaxation": number,
                                    "engagement_index": number,
                                    "arousal_index": number,
                                    "frustration_index": number,
                                    "mindfulness_index": number
                                }
                            },
                            "mental_state": {
                                "type": "object",
                                "required": ["relaxation", "concentration", "calm", "engagement", "arousal", "frustration", "mindfulness"],
                                "properties": {
                                    "relaxation": levels,
                                    "concentration": levels,
                                    "calm": levels,
                                    "engagement": levels,
                                    "arousal": levels,
                                    "frustration": levels,
                                    "mindfulness": levels
                                }
                            },
                            "timestamp": number,
                            "iterations_analyzed": { "type": "integer", "minimum": 0 }
                        }
                    }
                }
            },
            {
                "required": ["data"],
                "properties": {
                    "type": { "const": "real_time" },
                    "data": {
                        "type": "object",
                        "required": ["timestamp"],
                        "properties": {
                            "timestamp": number,
                            "channels": { "type": "object", "additionalProperties": number },
                            "metrics": { "type": "object", "additionalProperties": number }
                        }
                    }
                }
            },
            {
                "required": ["metrics", "timestamp"],
                "properties": {
                    "type": { "const": "real_time" },
                    "metrics": { "type": "object", "additionalProperties": number },
                    "timestamp": number
                }
            }
        ]
    })
    .to_string()
}

fn output_json_schema() -> String {
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "mindcity.assessment",
        "description": "Mind City feedback assessment",
        "type": "object",
        "required": ["assessment_version", "producer", "observed_at_utc", "computed_at_utc", "verdict", "score"],
        "properties": {
            "assessment_version": { "type": "string" },
            "producer": {
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "version": { "type": "string" },
                    "instance_id": { "type": "string" }
                }
            },
            "observed_at_utc": { "type": "string", "format": "date-time" },
            "computed_at_utc": { "type": "string", "format": "date-time" },
            "freshness_sec": { "type": "integer" },
            "iterations_analyzed": { "type": "integer" },
            "verdict": {
                "type": "object",
                "properties": {
                    "is_positive": { "type": "boolean" },
                    "reason": {
                        "type": "string",
                        "enum": [
                            "relaxed", "engaged", "mindful_attention", "positive_signals",
                            "frustrated", "disinterested", "failed_to_engage", "negative_signals"
                        ]
                    },
                    "message": { "type": "string" },
                    "next_action": { "type": "string", "enum": ["similar_city", "different_city"] },
                    "action_text": { "type": "string" },
                    "indicators": {
                        "type": "object",
                        "properties": {
                            "positive_states": { "type": "integer", "minimum": 0, "maximum": 7 },
                            "low_frustration": { "type": "boolean" },
                            "high_engagement": { "type": "boolean" },
                            "high_mindfulness": { "type": "boolean" }
                        }
                    }
                }
            },
            "score": { "type": "integer", "minimum": 1, "maximum": 10 },
            "raw_score": { "type": "number" }
        }
    })
    .to_string()
}

// Error types

#[derive(Debug)]
enum MindcityCliError {
    Io(io::Error),
    Compute(ComputeError),
    Json(serde_json::Error),
    Config(ConfigError),
    Telemetry(String),
    Line { line: usize, source: ComputeError },
    NoMessages,
    NoSummaries,
    ValidationFailed(usize),
    DoctorFailed,
}

impl From<io::Error> for MindcityCliError {
    fn from(e: io::Error) -> Self {
        MindcityCliError::Io(e)
    }
}

impl From<ComputeError> for MindcityCliError {
    fn from(e: ComputeError) -> Self {
        MindcityCliError::Compute(e)
    }
}

impl From<serde_json::Error> for MindcityCliError {
    fn from(e: serde_json::Error) -> Self {
        MindcityCliError::Json(e)
    }
}

impl From<ConfigError> for MindcityCliError {
    fn from(e: ConfigError) -> Self {
        MindcityCliError::Config(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(code: &str, message: String, hint: &str) -> Self {
        Self {
            code: code.to_string(),
            message,
            hint: Some(hint.to_string()),
        }
    }
}

fn compute_error_code(e: &ComputeError) -> &'static str {
    match e {
        ComputeError::InvalidInput(_) => "INVALID_INPUT",
        ComputeError::JsonError(_) => "JSON_ERROR",
        ComputeError::ParseError(_) => "PARSE_ERROR",
        ComputeError::EncodingError(_) => "ENCODING_ERROR",
    }
}

impl From<MindcityCliError> for CliError {
    fn from(e: MindcityCliError) -> Self {
        match e {
            MindcityCliError::Io(e) => {
                CliError::new("IO_ERROR", e.to_string(), "Check file paths and permissions")
            }
            MindcityCliError::Compute(e) => CliError::new(
                compute_error_code(&e),
                e.to_string(),
                "Ensure input matches the mindcity.eeg_message.v1 schema",
            ),
            MindcityCliError::Json(e) => {
                CliError::new("JSON_ERROR", e.to_string(), "Check JSON syntax")
            }
            MindcityCliError::Config(e) => CliError::new(
                "CONFIG_ERROR",
                e.to_string(),
                "Check MINDCITY_* environment variables and .env",
            ),
            MindcityCliError::Telemetry(msg) => CliError::new(
                "TELEMETRY_ERROR",
                msg,
                "Check RUST_LOG or MINDCITY_LOG_LEVEL",
            ),
            MindcityCliError::Line { line, source } => CliError::new(
                compute_error_code(&source),
                format!("line {}: {}", line, source),
                "Run without --strict to skip bad lines",
            ),
            MindcityCliError::NoMessages => CliError::new(
                "NO_MESSAGES",
                "No messages found in input".to_string(),
                "Ensure input file is not empty",
            ),
            MindcityCliError::NoSummaries => CliError::new(
                "NO_SUMMARIES",
                "No summary messages found in input".to_string(),
                "Only summary messages produce assessments",
            ),
            MindcityCliError::ValidationFailed(count) => CliError::new(
                "VALIDATION_FAILED",
                format!("{} messages failed validation", count),
                "Fix validation errors and retry",
            ),
            MindcityCliError::DoctorFailed => CliError::new(
                "DOCTOR_FAILED",
                "One or more health checks failed".to_string(),
                "Review the doctor report for details",
            ),
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    total_messages: usize,
    valid_messages: usize,
    invalid_messages: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(serde::Serialize)]
struct ValidationErrorDetail {
    index: usize,
    message_type: String,
    error: String,
}

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

impl DoctorCheck {
    fn new(name: &str, status: CheckStatus, message: String) -> Self {
        Self {
            name: name.to_string(),
            status,
            message,
        }
    }
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_flush_defaults_on() {
        let cli = Cli::try_parse_from(["mindcity", "run"]).unwrap();
        let Commands::Run { flush, .. } = cli.command else {
            panic!("expected run command");
        };
        assert!(flush);
    }

    #[test]
    fn test_flush_can_be_disabled() {
        let cli = Cli::try_parse_from(["mindcity", "run", "--flush", "false"]).unwrap();
        let Commands::Run { flush, .. } = cli.command else {
            panic!("expected run command");
        };
        assert!(!flush);

        let cli = Cli::try_parse_from(["mindcity", "track", "--flush=false"]).unwrap();
        let Commands::Track { flush, .. } = cli.command else {
            panic!("expected track command");
        };
        assert!(!flush);
    }

    #[test]
    fn test_interval_conflicts_with_load_tracker() {
        let err = Cli::try_parse_from([
            "mindcity",
            "track",
            "--interval",
            "10",
            "--load-tracker",
            "state.json",
        ])
        .err()
        .unwrap();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);

        let cli = Cli::try_parse_from(["mindcity", "track", "--interval", "10"]).unwrap();
        let Commands::Track { interval, .. } = cli.command else {
            panic!("expected track command");
        };
        assert_eq!(interval, Some(10));
    }

    #[test]
    fn test_input_json_schema_accepts_flat_realtime() {
        let schema: serde_json::Value = serde_json::from_str(&input_json_schema()).unwrap();
        let variants = schema["oneOf"].as_array().unwrap();

        assert_eq!(variants.len(), 3);
        assert_eq!(variants[2]["required"], serde_json::json!(["metrics", "timestamp"]));
    }
}
