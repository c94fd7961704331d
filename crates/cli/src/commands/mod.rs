pub mod build;
pub mod clean;
pub mod codegen;
pub mod doctor;
pub mod init;
pub mod show;

use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug, Clone, Default)]
pub struct ProjectArgs {
    #[arg(
        value_name = "PROJECT_PATH",
        help = "Path inside the project. Defaults to current working directory"
    )]
    pub project_path: Option<PathBuf>,
}

pub async fn run_cli_async<F, Fut>(f: F) -> i32
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<(), String>>,
{
    exit_code(f().await)
}

pub fn run_cli<F>(f: F) -> i32
where
    F: FnOnce() -> Result<(), String>,
{
    exit_code(f())
}

fn exit_code(result: Result<(), String>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("{} {err}", console::style("error:").red().bold());
            1
        }
    }
}
