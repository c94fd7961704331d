use clap::Args;
use console::style;

use super::{ProjectArgs, run_cli_async};
use crate::common::{describe_error, resolve_project_root, run_engine};

#[derive(Args, Debug, Clone)]
pub struct DoctorArgs {
    #[command(flatten)]
    pub project: ProjectArgs,
    #[arg(long, help = "Print a unified diff for every modified generated file")]
    pub diff: bool,
}

pub async fn run(args: DoctorArgs) -> i32 {
    run_cli_async(|| run_inner(args)).await
}

async fn run_inner(args: DoctorArgs) -> Result<(), String> {
    let root = resolve_project_root(args.project.project_path.as_deref())?;
    let report = run_engine("Checking generated code...", move |_| modgen_core::doctor(&root))
        .await?
        .map_err(|e| describe_error(&e))?;

    if report.is_healthy() {
        println!("{} Generated code is up to date", style("✓").green());
        return Ok(());
    }

    for problem in report.problems() {
        println!("  {} {problem}", style("•").yellow());
    }
    if args.diff {
        for mismatch in &report.mismatched {
            print!("{}", mismatch.unified_diff());
        }
    } else if !report.mismatched.is_empty() {
        println!("Run `modgen doctor --diff` to see the changes");
    }
    Err("Generated code is out of date. Run `modgen codegen`".to_string())
}
