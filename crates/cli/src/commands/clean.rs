use console::style;

use super::{ProjectArgs, run_cli};
use crate::common::resolve_project_root;

pub fn run(args: ProjectArgs) -> i32 {
    run_cli(|| run_inner(args))
}

fn run_inner(args: ProjectArgs) -> Result<(), String> {
    let root = resolve_project_root(args.project_path.as_deref())?;
    let report = modgen_core::clean(&root).map_err(|e| e.to_string())?;

    for path in &report.removed {
        println!("  {} {path}", style("removed").red());
    }
    println!("Removed {} generated file(s)", report.removed.len());
    Ok(())
}
