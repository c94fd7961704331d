use console::style;
use std::time::Instant;

use super::{ProjectArgs, run_cli_async};
use crate::common::{
    describe_error, format_elapsed_ms, print_diagnostics, resolve_project_root, run_engine,
    styled_status,
};

pub async fn run(args: ProjectArgs) -> i32 {
    run_cli_async(|| run_inner(args)).await
}

async fn run_inner(args: ProjectArgs) -> Result<(), String> {
    let root = resolve_project_root(args.project_path.as_deref())?;
    let start = Instant::now();

    let engine_root = root.clone();
    let report = run_engine("Generating bindings...", move |token| {
        modgen_core::codegen(&engine_root, &token)
    })
    .await?
    .map_err(|e| describe_error(&e))?;

    for entry in &report.drift.entries {
        if !entry.status.is_unchanged() {
            println!("  {:<9} {}", styled_status(&entry.status), entry.module);
        }
    }
    for path in &report.written {
        println!("  {} {path}", style("wrote").green());
    }
    for path in &report.pruned {
        println!("  {} {path}", style("removed").red());
    }

    if !report.is_success() {
        print_diagnostics(&report.diagnostics);
        return Err(format!(
            "{} error(s) reported; manifest left unchanged",
            report.diagnostics.len()
        ));
    }

    println!(
        "Generated {} module(s): {} written, {} unchanged ({})",
        report.modules.len(),
        report.written.len(),
        report.unchanged,
        format_elapsed_ms(start)
    );
    Ok(())
}
