//! sleepq CLI - Command-line interface for sleep quality prediction
//!
//! Commands:
//! - predict: Predict sleep quality for one or more input records
//! - validate: Check input records against a schema without predicting
//! - schema: Print a built-in feature schema
//! - doctor: Diagnose configuration and model artifacts

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use sleep_quality::inputs::expand_blood_pressure;
use sleep_quality::schema::{AttributeKind, FeatureSchema, SchemaId};
use sleep_quality::{
    InputValidator, ModelBundle, PredictError, PredictionEncoder, PredictionRecord, Predictor,
    PredictorConfig, RawInputs, ScalerPolicy, SchemaSource, PREDICTOR_VERSION, PRODUCER_NAME,
};

/// sleepq - Sleep quality prediction from lifestyle attributes
#[derive(Parser)]
#[command(name = "sleepq")]
#[command(author = "Synheart AI Inc")]
#[command(version = PREDICTOR_VERSION)]
#[command(about = "Predict sleep quality from lifestyle attributes", long_about = None)]
struct Cli {
    /// Enable debug logging (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Predict sleep quality for input records
    Predict {
        #[command(flatten)]
        model: ModelArgs,

        /// Input file path (use - for stdin)
        #[arg(short, long, default_value = "-")]
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

    /// Check input records against a schema without predicting
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long, default_value = "-")]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Built-in schema to validate against
        #[arg(long, default_value = "lifestyle.v1")]
        schema: SchemaId,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print a built-in feature schema
    Schema {
        /// Schema id (lifestyle.v1, lifestyle.v2, health.v1)
        #[arg(default_value = "lifestyle.v1")]
        schema: SchemaId,

        /// Output the schema as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose configuration and model artifacts
    Doctor {
        #[command(flatten)]
        model: ModelArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Model selection shared by `predict` and `doctor`. Flags override values
/// from `--config`.
#[derive(clap::Args)]
struct ModelArgs {
    /// Predictor configuration file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Built-in schema id
    #[arg(long)]
    schema: Option<SchemaId>,

    /// Custom schema file (JSON)
    #[arg(long, conflicts_with = "schema")]
    schema_file: Option<PathBuf>,

    /// Classifier artifact (JSON)
    #[arg(long)]
    classifier: Option<PathBuf>,

    /// Scaler artifact (JSON)
    #[arg(long)]
    scaler: Option<PathBuf>,

    /// Fail instead of classifying unscaled features when the scaler does not fit
    #[arg(long)]
    strict: bool,

    /// Skip bounds and category checks before predicting
    #[arg(long)]
    no_validate: bool,
}

impl ModelArgs {
    fn resolve(&self) -> Result<PredictorConfig, SleepqCliError> {
        let mut config = match (&self.config, &self.classifier) {
            (Some(path), _) => PredictorConfig::load(path)?,
            (None, Some(classifier)) => PredictorConfig::new(SchemaSource::default(), classifier),
            (None, None) => return Err(SleepqCliError::NoModel),
        };

        if let Some(id) = self.schema {
            config.schema = SchemaSource::Builtin(id);
        }
        if let Some(path) = &self.schema_file {
            config.schema = SchemaSource::File { path: path.clone() };
        }
        if let Some(path) = &self.classifier {
            config.classifier_path = path.clone();
        }
        if let Some(path) = &self.scaler {
            config.scaler_path = Some(path.clone());
        }
        if self.strict {
            config.scaler_policy = ScalerPolicy::Strict;
        }
        if self.no_validate {
            config.validate_inputs = false;
        }

        Ok(config)
    }
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Newline-delimited JSON (one record per line)
    Ndjson,
    /// A single JSON object or a JSON array of objects
    Json,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Newline-delimited JSON (one prediction record per line)
    Ndjson,
    /// JSON array of prediction records
    Json,
    /// Pretty-printed JSON
    JsonPretty,
    /// One human-readable line per record
    Text,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

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

fn init_logging(verbose: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();
}

fn run(cli: Cli) -> Result<(), SleepqCliError> {
    match cli.command {
        Commands::Predict {
            model,
            input,
            output,
            input_format,
            output_format,
        } => cmd_predict(&model, &input, &output, input_format, output_format),

        Commands::Validate {
            input,
            input_format,
            schema,
            json,
        } => cmd_validate(&input, input_format, schema, json),

        Commands::Schema { schema, json } => cmd_schema(schema, json),

        Commands::Doctor { model, json } => cmd_doctor(&model, json),
    }
}

fn cmd_predict(
    model: &ModelArgs,
    input: &Path,
    output: &Path,
    input_format: InputFormat,
    output_format: OutputFormat,
) -> Result<(), SleepqCliError> {
    let config = model.resolve()?;
    let predictor = Predictor::from_config(&config)?;

    let records = parse_records(&read_input(input)?, &input_format)?;
    if records.is_empty() {
        return Err(SleepqCliError::NoRecords);
    }

    let encoder = PredictionEncoder::new();
    let mut outputs: Vec<PredictionRecord> = Vec::with_capacity(records.len());
    for raw in &records {
        let prediction = predictor.predict(raw)?;
        outputs.push(encoder.encode(&prediction));
    }

    let output_data = format_output(&outputs, &output_format)?;

    if output.to_string_lossy() == "-" {
        let mut stdout = io::stdout();
        write!(stdout, "{}", output_data)?;
        stdout.flush()?;
    } else {
        fs::write(output, output_data)?;
    }

    Ok(())
}

fn cmd_validate(
    input: &Path,
    input_format: InputFormat,
    schema_id: SchemaId,
    json: bool,
) -> Result<(), SleepqCliError> {
    let schema = FeatureSchema::builtin(schema_id);
    let records = parse_records(&read_input(input)?, &input_format)?;

    let mut errors = Vec::new();
    for (index, raw) in records.iter().enumerate() {
        for issue in InputValidator::check(&schema, raw) {
            errors.push(ValidationErrorDetail {
                index,
                attribute: issue.attribute,
                error: issue.error.to_string(),
            });
        }
    }

    let invalid_records = {
        let mut indices: Vec<usize> = errors.iter().map(|e| e.index).collect();
        indices.dedup();
        indices.len()
    };

    let report = ValidationReport {
        schema: schema.id.clone(),
        total_records: records.len(),
        valid_records: records.len() - invalid_records,
        invalid_records,
        errors,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report ({})", report.schema);
        println!("=================");
        println!("Total records:   {}", report.total_records);
        println!("Valid records:   {}", report.valid_records);
        println!("Invalid records: {}", report.invalid_records);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!("  - Record {} ({}): {}", err.index, err.attribute, err.error);
            }
        }
    }

    if report.invalid_records > 0 {
        Err(SleepqCliError::ValidationFailed(report.invalid_records))
    } else {
        Ok(())
    }
}

fn cmd_schema(schema_id: SchemaId, json: bool) -> Result<(), SleepqCliError> {
    let schema = FeatureSchema::builtin(schema_id);

    if json {
        println!("{}", schema.to_json()?);
        return Ok(());
    }

    println!("Schema: {}", schema.id);
    println!("{}", schema.description);
    println!();
    println!("Inputs:");
    for attr in &schema.attributes {
        let detail = match &attr.kind {
            AttributeKind::Numeric { min, max } => match (min, max) {
                (Some(lo), Some(hi)) => format!("number in [{lo}, {hi}]"),
                (Some(lo), None) => format!("number >= {lo}"),
                (None, Some(hi)) => format!("number <= {hi}"),
                (None, None) => "number".to_string(),
            },
            AttributeKind::Categorical { table } => {
                let values = schema
                    .table(table)
                    .map(|t| t.values.join(", "))
                    .unwrap_or_default();
                format!("one of {{{values}}}")
            }
        };
        match &attr.description {
            Some(description) => println!("  - {}: {} ({})", attr.name, detail, description),
            None => println!("  - {}: {}", attr.name, detail),
        }
    }
    println!();
    println!("Columns (fit order):");
    for (i, name) in schema.column_names().iter().enumerate() {
        println!("  {:>2}. {}", i, name);
    }
    println!();
    println!("Labels:");
    for entry in &schema.labels {
        println!("  {} => {}", entry.code, entry.label);
    }

    Ok(())
}

fn cmd_doctor(model: &ModelArgs, json: bool) -> Result<(), SleepqCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "version".to_string(),
        status: CheckStatus::Ok,
        message: format!("{} version {}", PRODUCER_NAME, PREDICTOR_VERSION),
    });

    match model.resolve() {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Ok,
                message: format!("Classifier {}", config.classifier_path.display()),
            });
            checks.extend(check_artifacts(&config));
        }
        Err(e) => checks.push(DoctorCheck {
            name: "config".to_string(),
            status: CheckStatus::Error,
            message: CliError::from(e).message,
        }),
    }

    // Check stdin is available (for piped predictions)
    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (interactive mode)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (batch mode ready)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: PREDICTOR_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("sleepq Doctor Report");
        println!("====================");
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

    let has_errors = report.checks.iter().any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(SleepqCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

/// Load each artifact separately so one failure does not hide the others
fn check_artifacts(config: &PredictorConfig) -> Vec<DoctorCheck> {
    let mut checks = Vec::new();

    let schema = match config.schema.resolve() {
        Ok(schema) => {
            checks.push(DoctorCheck {
                name: "schema".to_string(),
                status: CheckStatus::Ok,
                message: format!("{} ({} columns)", schema.id, schema.columns.len()),
            });
            Some(schema)
        }
        Err(e) => {
            checks.push(DoctorCheck::error("schema", e));
            None
        }
    };

    let classifier = match sleep_quality::model::load_classifier(&config.classifier_path) {
        Ok(classifier) => {
            checks.push(DoctorCheck {
                name: "classifier".to_string(),
                status: CheckStatus::Ok,
                message: format!("Fit on {} features", classifier.n_features()),
            });
            Some(classifier)
        }
        Err(e) => {
            checks.push(DoctorCheck::error("classifier", e));
            None
        }
    };

    let scaler = match &config.scaler_path {
        Some(path) => match sleep_quality::Scaler::load(path) {
            Ok(scaler) => {
                checks.push(DoctorCheck {
                    name: "scaler".to_string(),
                    status: CheckStatus::Ok,
                    message: format!("Fit on {} features", scaler.n_features()),
                });
                Some(scaler)
            }
            Err(e) => {
                checks.push(DoctorCheck::error("scaler", e));
                None
            }
        },
        None => {
            checks.push(DoctorCheck {
                name: "scaler".to_string(),
                status: CheckStatus::Ok,
                message: "No scaler configured; features are classified unscaled".to_string(),
            });
            None
        }
    };

    if let Some(schema) = schema {
        let names: Vec<String> = schema.column_names().iter().map(|c| c.to_string()).collect();

        if let Some(scaler) = &scaler {
            if let Err(e) = scaler.check_layout(&names) {
                let status = match config.scaler_policy {
                    ScalerPolicy::Lenient => CheckStatus::Warning,
                    ScalerPolicy::Strict => CheckStatus::Error,
                };
                checks.push(DoctorCheck {
                    name: "scaler_layout".to_string(),
                    status,
                    message: e.to_string(),
                });
            }
        }

        if let Some(classifier) = classifier {
            match ModelBundle::new(schema, classifier, scaler) {
                Ok(_) => checks.push(DoctorCheck {
                    name: "bundle".to_string(),
                    status: CheckStatus::Ok,
                    message: "Classifier matches schema columns".to_string(),
                }),
                Err(e) => checks.push(DoctorCheck::error("bundle", e)),
            }
        }
    }

    checks
}

// Helper functions

fn read_input(input: &Path) -> Result<String, SleepqCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn parse_records(data: &str, format: &InputFormat) -> Result<Vec<RawInputs>, SleepqCliError> {
    let values: Vec<serde_json::Value> = match format {
        InputFormat::Ndjson => data
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(serde_json::from_str::<serde_json::Value>)
            .collect::<Result<_, _>>()?,
        InputFormat::Json => match serde_json::from_str(data)? {
            serde_json::Value::Array(items) => items,
            value => vec![value],
        },
    };

    values
        .into_iter()
        .map(|value| -> Result<RawInputs, SleepqCliError> {
            let mut raw: RawInputs = serde_json::from_value(value)?;
            expand_blood_pressure(&mut raw)?;
            Ok(raw)
        })
        .collect()
}

fn format_output(
    records: &[PredictionRecord],
    format: &OutputFormat,
) -> Result<String, SleepqCliError> {
    match format {
        OutputFormat::Ndjson => {
            let mut lines: Vec<String> = Vec::new();
            for record in records {
                lines.push(serde_json::to_string(record)?);
            }
            Ok(lines.join("\n") + "\n")
        }
        OutputFormat::Json => Ok(serde_json::to_string(records)? + "\n"),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(records)? + "\n"),
        OutputFormat::Text => Ok(records
            .iter()
            .map(|r| format!("{}: {}\n", r.label, r.advisory))
            .collect()),
    }
}

// Error types

#[derive(Debug)]
enum SleepqCliError {
    Io(io::Error),
    Predict(PredictError),
    Json(serde_json::Error),
    NoModel,
    NoRecords,
    ValidationFailed(usize),
    DoctorFailed,
}

impl From<io::Error> for SleepqCliError {
    fn from(e: io::Error) -> Self {
        SleepqCliError::Io(e)
    }
}

impl From<PredictError> for SleepqCliError {
    fn from(e: PredictError) -> Self {
        SleepqCliError::Predict(e)
    }
}

impl From<serde_json::Error> for SleepqCliError {
    fn from(e: serde_json::Error) -> Self {
        SleepqCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<SleepqCliError> for CliError {
    fn from(e: SleepqCliError) -> Self {
        match e {
            SleepqCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            SleepqCliError::Predict(e) => predict_error(e),
            SleepqCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            SleepqCliError::NoModel => CliError {
                code: "NO_MODEL".to_string(),
                message: "No classifier configured".to_string(),
                hint: Some("Pass --config or --classifier".to_string()),
            },
            SleepqCliError::NoRecords => CliError {
                code: "NO_RECORDS".to_string(),
                message: "No input records found".to_string(),
                hint: Some("Ensure input is not empty".to_string()),
            },
            SleepqCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} records failed validation", count),
                hint: Some("Fix validation errors and retry".to_string()),
            },
            SleepqCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

fn predict_error(e: PredictError) -> CliError {
    let (code, hint) = match &e {
        PredictError::ArtifactLoad { .. } | PredictError::InvalidArtifact(_) => (
            "ARTIFACT_ERROR",
            "Run 'sleepq doctor' to check model artifacts",
        ),
        PredictError::SchemaMismatch(_) => (
            "SCHEMA_MISMATCH",
            "Ensure the classifier was fit on the schema's columns",
        ),
        PredictError::ScalerShapeMismatch { .. } => (
            "SCALER_MISMATCH",
            "Use a scaler fit on the schema's columns, or drop --strict",
        ),
        PredictError::InvalidConfig(_) => ("CONFIG_ERROR", "Check the predictor configuration"),
        PredictError::JsonError(_) => ("JSON_ERROR", "Check JSON syntax"),
        PredictError::UnrecognizedCategory { .. }
        | PredictError::MissingAttribute(_)
        | PredictError::InvalidAttribute { .. }
        | PredictError::OutOfRange { .. } => (
            "INPUT_ERROR",
            "Run 'sleepq schema' to see accepted inputs",
        ),
    };

    CliError {
        code: code.to_string(),
        message: e.to_string(),
        hint: Some(hint.to_string()),
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    schema: String,
    total_records: usize,
    valid_records: usize,
    invalid_records: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(serde::Serialize)]
struct ValidationErrorDetail {
    index: usize,
    attribute: String,
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
    fn error(name: &str, e: PredictError) -> Self {
        DoctorCheck {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: e.to_string(),
        }
    }
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
