//! CLI entrypoint for mender
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use mender_application::{
    ActionExecutor, JournalQuery, NoStepProgress, Planner, ReadJournalUseCase, RunPlanError,
    RunMode, RunPlanInput, RunPlanUseCase, StepProgressNotifier, UndoError, UndoInput, UndoSessionUseCase,
};
use mender_domain::{PolicyClassifier, ToolCatalog};
use mender_infrastructure::{
    ConfigLoader, FileConfig, JsonlJournal, KeywordPlanner, LocalProcessRunner, PlanFilePlanner,
    builtin_catalog, is_elevated,
};
use mender_presentation::{Cli, Command, ConsoleFormatter, ProgressReporter};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// Exit status when a plan was aborted or the journal could not be written
const EXIT_ABORTED: u8 = 2;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let mut config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_deref())
            .map_err(|e| anyhow!("failed to load configuration: {}", e))?
    };
    apply_cli_overrides(&cli, &mut config);
    config.validate().context("invalid configuration")?;

    let _log_guard = init_logging(cli.verbose, &config);
    info!("Starting mender");

    match &cli.command {
        Command::Plan {
            issue,
            mode,
            plan_file,
        } => {
            let catalog = Arc::new(builtin_catalog()?);
            let planner = build_planner(&config, plan_file.clone())?;
            let executor = build_executor(&config, *mode == RunMode::Execute)?;
            let journal = open_journal(&config)?;

            let use_case = RunPlanUseCase::new(planner, catalog, executor, journal);
            info!("Session {}", use_case.session_id());

            let reporter = ProgressReporter::new();
            let progress: &dyn StepProgressNotifier = if cli.quiet {
                &NoStepProgress
            } else {
                &reporter
            };

            let result = use_case
                .execute(RunPlanInput::new(issue.clone(), *mode), progress)
                .await;
            reporter.finish();

            match result {
                Ok(report) => {
                    println!("{}", ConsoleFormatter::format_run(&report));
                    Ok(exit_code(report.exit_code()))
                }
                Err(e @ RunPlanError::Journal(_)) => {
                    eprintln!("error: {}", e);
                    Ok(ExitCode::from(EXIT_ABORTED))
                }
                Err(e) => Err(e.into()),
            }
        }

        Command::Undo { session, dry } => {
            let executor = build_executor(&config, !dry)?;
            let journal = open_journal(&config)?;
            let use_case = UndoSessionUseCase::new(executor, journal);

            let reporter = ProgressReporter::new();
            let progress: &dyn StepProgressNotifier = if cli.quiet || *dry {
                &NoStepProgress
            } else {
                &reporter
            };

            let input = UndoInput {
                session: session.clone(),
                dry_run: *dry,
            };
            let result = use_case.execute(input, progress).await;
            reporter.finish();

            match result {
                Ok(report) => {
                    println!("{}", ConsoleFormatter::format_undo(&report));
                    Ok(exit_code(report.exit_code()))
                }
                Err(e @ UndoError::Journal(_)) => {
                    eprintln!("error: {}", e);
                    Ok(ExitCode::from(EXIT_ABORTED))
                }
                Err(e) => {
                    eprintln!("{}", e);
                    Ok(ExitCode::FAILURE)
                }
            }
        }

        Command::History {
            limit,
            session,
            json,
        } => {
            let journal = open_journal(&config)?;
            let query = match session {
                Some(session) => JournalQuery::Session(session.clone()),
                None => JournalQuery::Recent(*limit),
            };
            let entries = ReadJournalUseCase::new(journal).execute(&query)?;

            if *json {
                println!("{}", ConsoleFormatter::format_json(&entries));
            } else {
                print!("{}", ConsoleFormatter::format_history(&entries));
            }
            Ok(ExitCode::SUCCESS)
        }

        Command::Tools => {
            let catalog: ToolCatalog = builtin_catalog()?;
            println!("{}", ConsoleFormatter::format_tools(catalog.descriptors()));
            Ok(ExitCode::SUCCESS)
        }

        Command::Config => {
            show_config(&cli, &config)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Command-line flags win over every file and environment layer
fn apply_cli_overrides(cli: &Cli, config: &mut FileConfig) {
    if cli.allow_maintenance {
        config.policy.allow_maintenance = true;
    }
    if cli.allow_kill {
        config.policy.allow_kill = true;
    }
    if cli.allow_dangerous {
        config.policy.allow_dangerous = true;
    }
    if let Some(secs) = cli.timeout {
        config.execution.timeout_seconds = secs;
    }
}

fn init_logging(verbose: u8, config: &FileConfig) -> Option<WorkerGuard> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };

    let console = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let log_dir = config
        .logging
        .file
        .then(|| {
            config
                .logging
                .dir
                .clone()
                .or_else(|| dirs::data_local_dir().map(|d| d.join("mender").join("logs")))
        })
        .flatten();

    match log_dir {
        Some(dir) => {
            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, "mender.log"));
            tracing_subscriber::registry()
                .with(EnvFilter::new(level))
                .with(console)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(writer),
                )
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(EnvFilter::new(level))
                .with(console)
                .init();
            None
        }
    }
}

fn build_planner(config: &FileConfig, plan_file: Option<PathBuf>) -> Result<Arc<dyn Planner>> {
    if let Some(path) = plan_file {
        info!("Using plan file {}", path.display());
        return Ok(Arc::new(PlanFilePlanner::new(path)));
    }

    let base = if config.planner.builtin_rules {
        KeywordPlanner::builtin()
    } else {
        KeywordPlanner::new(Vec::new())
    };
    let planner = base.with_rules(config.keyword_rules()?);
    info!("Keyword planner with {} rule(s)", planner.len());
    Ok(Arc::new(planner))
}

/// `check_privilege` is false for dry paths, which only note missing elevation
fn build_executor(
    config: &FileConfig,
    check_privilege: bool,
) -> Result<Arc<ActionExecutor<LocalProcessRunner>>> {
    let engine = config.to_engine_config();
    let classifier = Arc::new(PolicyClassifier::new(&config.policy_patterns())?);
    let runner = Arc::new(LocalProcessRunner::from_params(&engine.execution));

    let elevated = check_privilege && !engine.execution.skip_elevation_check && is_elevated();
    info!(
        "Interpreter: {}, policy: {:?}, elevated: {}",
        runner.interpreter(),
        engine.policy,
        elevated
    );

    Ok(Arc::new(
        ActionExecutor::new(runner, classifier, engine).with_elevated(elevated),
    ))
}

fn open_journal(config: &FileConfig) -> Result<Arc<JsonlJournal>> {
    let dir = config
        .journal
        .dir
        .clone()
        .or_else(JsonlJournal::default_dir)
        .context("cannot determine a journal directory; set [journal] dir")?;
    let journal = JsonlJournal::new(&dir)
        .with_context(|| format!("cannot open journal at {}", dir.display()))?;
    Ok(Arc::new(journal))
}

fn show_config(cli: &Cli, config: &FileConfig) -> Result<()> {
    if cli.no_config {
        println!("Configuration files disabled (--no-config)");
    } else {
        let sources = ConfigLoader::config_sources(cli.config.as_deref());
        print!(
            "{}",
            ConsoleFormatter::format_config_sources(
                sources
                    .iter()
                    .map(|s| (s.label, s.path.as_path(), s.found))
            )
        );
    }

    let runner = LocalProcessRunner::from_params(&config.execution_params());
    println!("\nInterpreter: {}", runner.interpreter());
    match config.journal.dir.clone().or_else(JsonlJournal::default_dir) {
        Some(dir) => println!("Journal:     {}", dir.display()),
        None => println!("Journal:     (no data directory)"),
    }

    println!("\nEffective configuration:\n");
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

fn exit_code(code: i32) -> ExitCode {
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}
