use std::time::Instant;

use super::{ProjectArgs, run_cli_async};
use crate::common::{describe_error, format_elapsed_ms, resolve_project_root, run_engine};

pub async fn run(args: ProjectArgs) -> i32 {
    run_cli_async(|| run_inner(args)).await
}

async fn run_inner(args: ProjectArgs) -> Result<(), String> {
    let root = resolve_project_root(args.project_path.as_deref())?;
    println!("Building project in {}", root.display());
    let start = Instant::now();

    let engine_root = root.clone();
    let report = run_engine("Checking generated code...", move |token| {
        modgen_core::build(&engine_root, &token)
    })
    .await?
    .map_err(|e| describe_error(&e))?;

    println!(
        "Build completed: `{}` ({})",
        report.command.join(" "),
        format_elapsed_ms(start)
    );
    Ok(())
}
