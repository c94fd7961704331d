use console::style;

use super::{ProjectArgs, run_cli_async};
use crate::common::{
    describe_error, print_diagnostics, resolve_project_root, run_engine, styled_status,
};

pub async fn run(args: ProjectArgs) -> i32 {
    run_cli_async(|| run_inner(args)).await
}

async fn run_inner(args: ProjectArgs) -> Result<(), String> {
    let root = resolve_project_root(args.project_path.as_deref())?;
    let report = run_engine("Analyzing specs...", move |_| modgen_core::show(&root))
        .await?
        .map_err(|e| describe_error(&e))?;

    if report.modules.is_empty() && report.removed.is_empty() {
        println!("No modules found");
    }
    for module in &report.modules {
        println!(
            "{} {} {}",
            style(&module.name).bold(),
            styled_status(&module.status),
            style(&module.source).dim()
        );
        for name in &module.enums {
            println!("  enum {name}");
        }
        for name in &module.objects {
            println!("  object {name}");
        }
        for signature in &module.methods {
            println!("  {signature}");
        }
    }
    for name in &report.removed {
        println!("{} {}", style(name).bold(), style("removed").red());
    }
    for platform in &report.stale_emitters {
        println!("{} emitter changed since the last run", style(platform).yellow());
    }

    if !report.diagnostics.is_empty() {
        print_diagnostics(&report.diagnostics);
        return Err(format!("{} error(s) reported", report.diagnostics.len()));
    }
    Ok(())
}
