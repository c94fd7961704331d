//! Command line surface for modgen.
//!
//! Every command resolves a project root and calls exactly one entry point of
//! `modgen-core`. Exit code is 0 on success and 1 on any reported error.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

mod commands;
mod common;

use commands::ProjectArgs;

/// Crates whose logs are shown by default.
const LOG_TARGETS: &[&str] = &["modgen_cli", "modgen_core", "modgen_common"];

#[derive(Parser, Debug)]
#[command(
    name = "modgen",
    version,
    about = "Generate type-safe native module bindings from TypeScript specs",
    args_conflicts_with_subcommands = true
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[arg(
        value_name = "PROJECT_PATH",
        help = "Path inside the project. Defaults to current working directory"
    )]
    project_path: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Show debug logs")]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate bindings for every spec (default)
    Codegen(ProjectArgs),
    /// Scaffold a new project
    Init(commands::init::InitArgs),
    /// Check generated code, then run the build command
    Build(ProjectArgs),
    /// List modules and their drift status
    Show(ProjectArgs),
    /// Verify generated code matches the specs
    Doctor(commands::doctor::DoctorArgs),
    /// Remove generated files and the manifest
    Clean(ProjectArgs),
}

/// Parse `args` (including the binary name) and run the command.
pub fn run_cli(args: Vec<String>) -> i32 {
    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("Failed to create tokio runtime: {err}");
            return 1;
        }
    };

    runtime.block_on(run_cli_async(args))
}

async fn run_cli_async(args: Vec<String>) -> i32 {
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(e) => {
            let code = e.exit_code();
            let _ = e.print();
            return code;
        }
    };
    init_tracing(cli.verbose);

    match cli.command {
        Some(Commands::Codegen(args)) => commands::codegen::run(args).await,
        Some(Commands::Init(args)) => commands::init::run(args),
        Some(Commands::Build(args)) => commands::build::run(args).await,
        Some(Commands::Show(args)) => commands::show::run(args).await,
        Some(Commands::Doctor(args)) => commands::doctor::run(args).await,
        Some(Commands::Clean(args)) => commands::clean::run(args),
        None => {
            commands::codegen::run(ProjectArgs {
                project_path: cli.project_path,
            })
            .await
        }
    }
}

fn init_tracing(verbose: bool) {
    // MODGEN_LOG takes a plain level ("debug") or a full filter spec
    // ("modgen_core=trace,modgen_cli=info")
    let default_level = if verbose { "debug" } else { "info" };
    let filter = match std::env::var("MODGEN_LOG") {
        Ok(level) if is_plain_level(&level) => targets_at(&level),
        Ok(spec) => spec,
        Err(_) => targets_at(default_level),
    };

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .without_time()
        .with_filter(EnvFilter::new(filter));

    if tracing_subscriber::registry()
        .with(fmt_layer)
        .try_init()
        .is_err()
    {
        eprintln!("Warning: tracing subscriber already initialized");
    }
}

fn targets_at(level: &str) -> String {
    LOG_TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

fn is_plain_level(s: &str) -> bool {
    matches!(
        s.to_ascii_lowercase().as_str(),
        "trace" | "debug" | "info" | "warn" | "error"
    )
}
