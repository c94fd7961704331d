use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use modgen_core::{CancellationToken, Diagnostic, DriftStatus, Error};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Nearest ancestor of `project_path` (default: current dir) containing `modgen.toml`.
pub fn resolve_project_root(project_path: Option<&Path>) -> Result<PathBuf, String> {
    let start = match project_path {
        Some(path) => path.to_path_buf(),
        None => std::env::current_dir()
            .map_err(|e| format!("Failed to read current directory: {e}"))?,
    };
    let root = modgen_common::find_project_root(&start).map_err(|e| e.to_string())?;
    debug!(root = %root.display(), "Resolved project root");
    Ok(root)
}

pub fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner.set_message(message.to_string());
    spinner
}

pub fn format_elapsed_ms(start: Instant) -> String {
    let elapsed = start.elapsed();
    if elapsed.as_secs() == 0 {
        return format!("{}ms", elapsed.as_millis());
    }
    let seconds = elapsed.as_secs();
    let remaining_ms = elapsed.subsec_millis();
    format!("{seconds}s {remaining_ms}ms")
}

/// Run a blocking engine call on the blocking pool behind a spinner.
/// Ctrl-C cancels the shared token; tasks already started finish.
pub async fn run_engine<T, F>(description: &str, f: F) -> Result<modgen_core::Result<T>, String>
where
    T: Send + 'static,
    F: FnOnce(CancellationToken) -> modgen_core::Result<T> + Send + 'static,
{
    let token = CancellationToken::new();
    let watcher = {
        let token = token.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Ctrl+C received, finishing in-flight work");
                token.cancel();
            }
        })
    };

    let spinner = spinner(description);
    let result = tokio::task::spawn_blocking(move || f(token)).await;
    spinner.finish_and_clear();
    watcher.abort();

    result.map_err(|e| format!("Engine task failed: {e}"))
}

pub fn print_diagnostics(diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        eprintln!(
            "{} {} {}",
            style(format!("[{}]", diagnostic.kind)).red().bold(),
            style(&diagnostic.unit).bold(),
            diagnostic.message
        );
    }
}

/// Print what an engine error carries and turn it into the final message.
pub fn describe_error(err: &Error) -> String {
    match err {
        Error::Failed(diagnostics) => {
            print_diagnostics(diagnostics);
            err.to_string()
        }
        Error::OutOfDate(problems) => {
            for problem in problems {
                eprintln!("  {} {problem}", style("•").yellow());
            }
            "Generated code is out of date. Run `modgen codegen` first".to_string()
        }
        other => other.to_string(),
    }
}

pub fn styled_status(status: &DriftStatus) -> String {
    let label = status.label();
    match status {
        DriftStatus::Unchanged => style(label).dim().to_string(),
        DriftStatus::Changed { .. } => style(label).yellow().to_string(),
        DriftStatus::Removed => style(label).red().to_string(),
        DriftStatus::New => style(label).green().to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_project_root_walks_up() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("modgen.toml"),
            "[project]\nname = \"x\"\n[platforms.rust]\nout_dir = \"gen\"\n",
        )
        .unwrap();
        let nested = dir.path().join("specs/deep");
        fs::create_dir_all(&nested).unwrap();

        let root = resolve_project_root(Some(&nested)).unwrap();
        assert_eq!(root, dir.path());
    }

    #[test]
    fn test_describe_out_of_date() {
        let err = Error::OutOfDate(vec!["module Calculator is changed".into()]);
        assert!(describe_error(&err).contains("modgen codegen"));
    }
}
