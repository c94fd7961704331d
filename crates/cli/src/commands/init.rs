use clap::Args;
use console::style;
use std::path::PathBuf;

use super::run_cli;

#[derive(Args, Debug, Clone)]
pub struct InitArgs {
    #[arg(value_name = "PACKAGE_NAME", help = "Name of the new package")]
    pub package_name: String,
    #[arg(
        value_name = "PROJECT_PATH",
        help = "Directory to create the project in. Defaults to current working directory"
    )]
    pub project_path: Option<PathBuf>,
}

pub fn run(args: InitArgs) -> i32 {
    run_cli(|| run_inner(args))
}

fn run_inner(args: InitArgs) -> Result<(), String> {
    let cwd = match args.project_path {
        Some(path) => path,
        None => std::env::current_dir()
            .map_err(|e| format!("Failed to read current directory: {e}"))?,
    };
    let root = modgen_core::init(&cwd, &args.package_name).map_err(|e| e.to_string())?;

    println!("{} {}", style("Created").green().bold(), root.display());
    println!("Next: cd {} && modgen codegen", root.display());
    Ok(())
}
