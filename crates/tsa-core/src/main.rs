//! Time-series anomaly scoring CLI.
//!
//! The main entry point for tsa-core, handling:
//! - Reading multi-entity CSV tables
//! - Running the configured scorers entity by entity
//! - Writing the scored table and a run report
//! - Configuration inspection and validation

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::io::Write;
use std::path::{Path, PathBuf};
use tsa_common::{OutputFormat, StructuredError, TimeSeriesTable};
use tsa_config::pipeline::DEFAULT_INPUT_ITEM;
use tsa_config::preset::{list_presets, PRESET_WINDOWSIZE};
use tsa_config::{
    config_schema, get_preset, load_config, LoadedConfig, MissedMatchPolicy, NonFinitePolicy,
    ScorerConfig, ScorerKind, CONFIG_SCHEMA_VERSION,
};
use tsa_core::exit_codes::ExitCode;
use tsa_core::io::{read_table, read_table_path, write_table, write_table_path, TableLayout};
use tsa_core::log_event;
use tsa_core::logging::{event_names, generate_run_id, init_logging, LogConfig, LogFormat, LogLevel, Stage};
use tsa_core::output::{render_report, RunReport};
use tsa_core::Pipeline;

/// Time-series anomaly scoring - windowed per-entity anomaly scores
#[derive(Parser)]
#[command(name = "tsa-core")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Pipeline configuration file (TOML or JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "json")]
    format: OutputFormat,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log format on stderr
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a CSV table and write the scored table plus a run report
    Score(ScoreArgs),

    /// Configuration management
    Config(ConfigArgs),

    /// Generate shell completions
    Completions {
        /// Target shell
        shell: Shell,
    },

    /// Print version information
    Version,
}

#[derive(Args, Debug)]
struct ScoreArgs {
    /// Input CSV file ("-" for stdin)
    #[arg(long, short = 'i')]
    input: PathBuf,

    /// Write the scored table here instead of stdout
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,

    /// Run a single scorer instead of the configured pipeline
    #[arg(long, conflicts_with = "preset")]
    scorer: Option<ScorerKind>,

    /// Run a preset pipeline (gaps, spectral, kmeans, full)
    #[arg(long)]
    preset: Option<String>,

    /// Input column for --scorer or --preset
    #[arg(long)]
    input_item: Option<String>,

    /// Window size in samples for --scorer or --preset
    #[arg(long, allow_hyphen_values = true)]
    windowsize: Option<i64>,

    /// Output column for --scorer (default: <input>_<kind>)
    #[arg(long, requires = "scorer")]
    output_item: Option<String>,

    /// Entity column name
    #[arg(long, default_value = "id")]
    entity_column: String,

    /// Timestamp column name
    #[arg(long, default_value = "timestamp")]
    time_column: String,

    /// Handling of NaN and infinite scores
    #[arg(long)]
    non_finite: Option<NonFinitePolicy>,

    /// Score for rows without a realigned score
    #[arg(long)]
    missed_match: Option<MissedMatchPolicy>,

    /// Clustering seed
    #[arg(long)]
    seed: Option<u64>,

    /// Exit with code 1 when any absolute score exceeds this value
    #[arg(long)]
    fail_above: Option<f64>,
}

#[derive(Args, Debug)]
struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show the resolved configuration
    Show,
    /// Validate a configuration file (default: the resolved one)
    Validate {
        /// Path to the file
        path: Option<PathBuf>,
    },
    /// List preset pipelines
    Presets,
    /// Print the JSON schema of the configuration file
    Schema,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            let code = if err.use_stderr() {
                ExitCode::ArgsError
            } else {
                // --help / --version
                ExitCode::Clean
            };
            std::process::exit(code.as_i32());
        }
    };

    let log_config = LogConfig::from_env(
        LogLevel::from_verbosity(cli.global.verbose, cli.global.quiet),
        cli.global.log_format,
    );
    init_logging(&log_config);

    let exit_code = match &cli.command {
        Commands::Score(args) => run_score(&cli.global, args),
        Commands::Config(args) => run_config(&cli.global, args),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(*shell, &mut cmd, "tsa-core", &mut std::io::stdout());
            ExitCode::Clean
        }
        Commands::Version => {
            print_version(&cli.global);
            ExitCode::Clean
        }
    };

    std::process::exit(exit_code.as_i32());
}

// ============================================================================
// score
// ============================================================================

fn run_score(global: &GlobalOpts, args: &ScoreArgs) -> ExitCode {
    let run_id = generate_run_id();
    log_event!(INFO, run_id, event_names::RUN_STARTED, Stage::Init, "starting scoring run");

    let loaded = match resolve_pipeline(global, args) {
        Ok(loaded) => loaded,
        Err(e) => return output_error(global, &e),
    };
    log_event!(
        INFO,
        run_id,
        event_names::CONFIG_LOADED,
        Stage::Init,
        "configuration loaded",
        source = tracing::field::display(loaded.snapshot.source),
        scorers = loaded.config.scorers.len()
    );

    let layout = TableLayout::new(args.entity_column.clone(), args.time_column.clone());
    let table = match load_table(&args.input, &layout) {
        Ok(table) => table,
        Err(e) => return output_error(global, &e),
    };
    log_event!(
        INFO,
        run_id,
        event_names::TABLE_LOADED,
        Stage::Load,
        "table loaded",
        rows = table.len()
    );

    let pipeline = Pipeline::from_config(&loaded.config);
    let outcome = match pipeline.run(&table) {
        Ok(outcome) => outcome,
        Err(e) => return output_error(global, &e.into()),
    };

    let code = match (args.fail_above, outcome.peak_score()) {
        (Some(limit), Some(peak)) if peak > limit => ExitCode::AnomaliesFound,
        _ => ExitCode::Clean,
    };

    // the table goes to --output, or to stdout (pushing the report to stderr)
    let table_on_stdout = args.output.is_none();
    let written = match &args.output {
        Some(path) => write_table_path(path, &outcome.table, &layout),
        None => {
            let stdout = std::io::stdout();
            write_table(stdout.lock(), &outcome.table, &layout)
        }
    };
    if let Err(e) = written {
        return output_error(global, &e.into());
    }

    let report = RunReport::new(
        run_id.clone(),
        args.input.display().to_string(),
        loaded.snapshot.clone(),
        &outcome,
        code.code_name(),
    );
    match render_report(&report, global.format) {
        Ok(Some(text)) if table_on_stdout => eprintln!("{}", text),
        Ok(Some(text)) => println!("{}", text),
        Ok(None) => {}
        Err(e) => return output_error(global, &e.into()),
    }

    log_event!(
        INFO,
        run_id,
        event_names::RUN_FINISHED,
        Stage::Write,
        "scoring run finished",
        status = code.code_name()
    );
    code
}

/// Configured pipeline with CLI overrides applied.
fn resolve_pipeline(global: &GlobalOpts, args: &ScoreArgs) -> Result<LoadedConfig, tsa_common::Error> {
    let loaded = load_config(global.config.as_deref())?;
    let mut config = loaded.config.clone();
    let input_item = args.input_item.as_deref().unwrap_or(DEFAULT_INPUT_ITEM);

    if let Some(kind) = args.scorer {
        let output_item = args
            .output_item
            .clone()
            .unwrap_or_else(|| kind.default_output(input_item));
        config.scorers = vec![ScorerConfig::new(
            kind,
            input_item,
            args.windowsize.unwrap_or(PRESET_WINDOWSIZE),
            output_item,
        )];
    } else if let Some(name) = &args.preset {
        let preset = get_preset(name, input_item).map_err(|e| tsa_common::Error::Config(e.to_string()))?;
        config.scorers = preset.scorers;
        if let Some(ws) = args.windowsize {
            for scorer in &mut config.scorers {
                scorer.windowsize = ws;
            }
        }
    } else if args.input_item.is_some() || args.windowsize.is_some() {
        return Err(tsa_common::Error::Config(
            "--input-item and --windowsize need --scorer or --preset".to_string(),
        ));
    }

    if let Some(policy) = args.non_finite {
        config.policy.non_finite = policy;
    }
    if let Some(policy) = args.missed_match {
        config.policy.missed_match = policy;
    }
    if let Some(seed) = args.seed {
        config.clustering.seed = seed;
    }

    if config == loaded.config {
        return Ok(loaded);
    }
    Ok(loaded.with_config(config)?)
}

fn load_table(input: &Path, layout: &TableLayout) -> Result<TimeSeriesTable, tsa_common::Error> {
    let table = if input == Path::new("-") {
        read_table(std::io::stdin().lock(), layout)?
    } else {
        read_table_path(input, layout)?
    };
    Ok(table)
}

// ============================================================================
// config
// ============================================================================

fn run_config(global: &GlobalOpts, args: &ConfigArgs) -> ExitCode {
    match &args.command {
        ConfigCommands::Show => run_config_show(global),
        ConfigCommands::Validate { path } => {
            run_config_validate(global, path.as_deref().or(global.config.as_deref()))
        }
        ConfigCommands::Presets => {
            run_config_presets(global);
            ExitCode::Clean
        }
        ConfigCommands::Schema => {
            match serde_json::to_string_pretty(&config_schema()) {
                Ok(text) => println!("{}", text),
                Err(e) => return output_error(global, &e.into()),
            }
            ExitCode::Clean
        }
    }
}

fn run_config_show(global: &GlobalOpts) -> ExitCode {
    let loaded = match load_config(global.config.as_deref()) {
        Ok(loaded) => loaded,
        Err(e) => return output_error(global, &e.into()),
    };

    match global.format {
        OutputFormat::Summary | OutputFormat::Csv => match loaded.config.to_toml_string() {
            Ok(text) => {
                println!("# source: {}", loaded.snapshot.source);
                print!("{}", text);
            }
            Err(e) => return output_error(global, &e.into()),
        },
        OutputFormat::Json | OutputFormat::Jsonl => {
            let response = serde_json::json!({
                "schema_version": CONFIG_SCHEMA_VERSION,
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "snapshot": &loaded.snapshot,
                "config": &loaded.config,
            });
            print_json(global, &response);
        }
    }
    ExitCode::Clean
}

fn run_config_validate(global: &GlobalOpts, path: Option<&Path>) -> ExitCode {
    match load_config(path) {
        Ok(loaded) => {
            match global.format {
                OutputFormat::Json | OutputFormat::Jsonl => {
                    let response = serde_json::json!({
                        "status": "valid",
                        "source": loaded.snapshot.source,
                        "path": loaded.snapshot.path,
                        "scorers": loaded.snapshot.summary.scorers,
                        "combined_hash": loaded.snapshot.combined_hash,
                    });
                    print_json(global, &response);
                }
                _ => println!(
                    "valid: {} scorer(s) from {}",
                    loaded.config.scorers.len(),
                    loaded.snapshot.source
                ),
            }
            ExitCode::Clean
        }
        Err(e) => output_error(global, &e.into()),
    }
}

fn run_config_presets(global: &GlobalOpts) {
    let presets = list_presets();
    match global.format {
        OutputFormat::Json | OutputFormat::Jsonl => {
            let response: Vec<_> = presets
                .iter()
                .map(|(name, description)| serde_json::json!({ "name": name, "description": description }))
                .collect();
            print_json(global, &serde_json::json!({ "presets": response }));
        }
        _ => {
            for (name, description) in presets {
                println!("{:<10} {}", name, description);
            }
        }
    }
}

// ============================================================================
// output helpers
// ============================================================================

fn print_json(global: &GlobalOpts, value: &serde_json::Value) {
    let text = match global.format {
        OutputFormat::Jsonl => serde_json::to_string(value),
        _ => serde_json::to_string_pretty(value),
    };
    match text {
        Ok(text) => println!("{}", text),
        Err(e) => eprintln!("error: {}", e),
    }
}

/// Report an error on stderr and pick the matching exit code.
fn output_error(global: &GlobalOpts, error: &tsa_common::Error) -> ExitCode {
    let exit_code = ExitCode::for_category(error.category());
    tracing::debug!(code = error.code(), exit = %exit_code, "command failed");

    let mut stderr = std::io::stderr().lock();
    let _ = match global.format {
        OutputFormat::Json | OutputFormat::Jsonl => {
            writeln!(stderr, "{}", StructuredError::from(error).to_json())
        }
        _ => writeln!(stderr, "error: {}", error),
    };
    exit_code
}

fn print_version(global: &GlobalOpts) {
    let version_info = serde_json::json!({
        "tsa_core_version": env!("CARGO_PKG_VERSION"),
        "config_schema_version": CONFIG_SCHEMA_VERSION,
        "report_schema_version": tsa_core::output::REPORT_SCHEMA_VERSION,
    });

    match global.format {
        OutputFormat::Json | OutputFormat::Jsonl => print_json(global, &version_info),
        _ => println!("tsa-core {}", env!("CARGO_PKG_VERSION")),
    }
}
