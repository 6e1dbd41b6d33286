use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand, ValueEnum};

use mutation_gate::gate::{
    ActionsReporter, Clock, CommandEngine, CommandSpec, FileMetricsStore, GateConfig,
    MutationGate, MutationResultSet, ReportFormat, Reporter, SystemClock, TracingReporter,
    extract_from_project, load_baseline, render_result_set,
};

#[derive(Debug, Parser)]
#[command(name = "mutation-gate")]
#[command(about = "Fail the build when the mutation score drops below the stored baseline")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run one gate cycle and store the new baseline on success.
    Run {
        #[command(flatten)]
        storage: StorageArgs,
        /// Command that runs the mutation tests (stdio inherited).
        #[arg(long, env = "MUTATION_GATE_TEST_COMMAND")]
        test_command: Option<String>,
        /// Command that prints the result-set JSON on stdout.
        #[arg(long, env = "MUTATION_GATE_METRICS_COMMAND")]
        metrics_command: Option<String>,
        /// Where gate messages go.
        #[arg(long, value_enum, default_value = "auto")]
        reporter: ReporterChoice,
    },
    /// Print the result-set payload derived from a Stryker JSON report.
    ExtractMetrics {
        /// Project directory searched for the report.
        #[arg(long, env = "MUTATION_GATE_PROJECT")]
        project: Option<PathBuf>,
        /// Explicit report path.
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Show the stored baseline.
    Baseline {
        #[command(flatten)]
        storage: StorageArgs,
        /// Output format.
        #[arg(long, value_enum, default_value = "md")]
        format: OutputFormat,
    },
}

#[derive(Debug, Args)]
struct StorageArgs {
    /// Project directory.
    #[arg(long, env = "MUTATION_GATE_PROJECT")]
    project: Option<PathBuf>,
    /// Baseline JSON file, relative to the project.
    #[arg(long, env = "MUTATION_GATE_METRICS_FILE")]
    metrics_file: Option<PathBuf>,
    /// Plain score file, relative to the project.
    #[arg(long, env = "MUTATION_GATE_SCORE_FILE")]
    score_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ReporterChoice {
    /// Actions workflow commands when `GITHUB_ACTIONS` is set, log otherwise.
    Auto,
    /// GitHub Actions workflow commands on stdout.
    Actions,
    /// Log lines on stderr.
    Log,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Markdown
    Md,
    /// JSON
    Json,
}

fn make_config(storage: StorageArgs) -> GateConfig {
    let mut config = GateConfig::default();
    if let Some(project) = storage.project {
        config = config.with_project_dir(project);
    }
    if let Some(metrics_file) = storage.metrics_file {
        config = config.with_metrics_file(metrics_file);
    }
    if let Some(score_file) = storage.score_file {
        config = config.with_score_file(score_file);
    }
    config
}

fn parse_command(flag: &str, line: &str) -> Result<CommandSpec> {
    CommandSpec::parse(line).ok_or_else(|| anyhow!("--{flag} must not be empty"))
}

fn use_actions(choice: ReporterChoice) -> bool {
    match choice {
        ReporterChoice::Auto => std::env::var_os("GITHUB_ACTIONS").is_some(),
        ReporterChoice::Actions => true,
        ReporterChoice::Log => false,
    }
}

fn run_gate(config: &GateConfig, reporter: &dyn Reporter) -> ExitCode {
    let engine = CommandEngine;
    let clock = SystemClock;
    let store = FileMetricsStore::new(config, &engine, &clock, reporter);
    let gate = MutationGate::new(config, &store, &engine, reporter);

    // The reporter has already carried the failure message.
    match gate.run() {
        Ok(_) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    match cli.command {
        Command::Run {
            storage,
            test_command,
            metrics_command,
            reporter,
        } => {
            let mut config = make_config(storage);
            if let Some(line) = test_command {
                config = config.with_test_command(parse_command("test-command", &line)?);
            }
            if let Some(line) = metrics_command {
                config = config.with_metrics_command(parse_command("metrics-command", &line)?);
            }

            if use_actions(reporter) {
                mutation_gate::logging::init("warn");
                Ok(run_gate(&config, &ActionsReporter::stdout()))
            } else {
                mutation_gate::logging::init("info");
                Ok(run_gate(&config, &TracingReporter::default()))
            }
        }
        Command::ExtractMetrics { project, report } => {
            mutation_gate::logging::init("warn");
            let project = match project {
                Some(project) => project,
                None => std::env::current_dir().context("resolve current directory")?,
            };
            let payload = extract_from_project(&project, report.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&payload)?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Baseline { storage, format } => {
            mutation_gate::logging::init("warn");
            let config = make_config(storage);
            let path = config.metrics_path();
            let baseline = load_baseline(&path)
                .with_context(|| format!("read baseline {}", path.display()))?
                .unwrap_or_else(|| MutationResultSet::zeroed(SystemClock.now()));
            let format = match format {
                OutputFormat::Md => ReportFormat::Markdown,
                OutputFormat::Json => ReportFormat::Json,
            };
            println!("{}", render_result_set(&baseline, format)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}
