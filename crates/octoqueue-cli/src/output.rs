//! Terminal output formatting utilities.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use colored::Colorize;
use octoqueue_github::{QuotaState, RunStatus, WorkflowRun};
use serde::Serialize;

static QUIET_MODE: AtomicBool = AtomicBool::new(false);

/// Set quiet mode globally. Call once at startup.
pub fn set_quiet(quiet: bool) {
    QUIET_MODE.store(quiet, Ordering::Relaxed);
}

fn is_quiet() -> bool {
    QUIET_MODE.load(Ordering::Relaxed)
}

/// Print a success message (suppressed in quiet mode).
pub fn success(msg: &str) {
    if !is_quiet() {
        println!("{} {}", "✓".green(), msg);
    }
}

/// Print an error message (always prints to stderr).
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a warning message (always prints to stderr).
pub fn warn(msg: &str) {
    eprintln!("{} {}", "!".yellow(), msg);
}

/// Print an info message (suppressed in quiet mode).
pub fn info(msg: &str) {
    if !is_quiet() {
        println!("{} {}", "→".blue(), msg);
    }
}

/// Print a detail line without prefix (suppressed in quiet mode).
pub fn detail(msg: &str) {
    if !is_quiet() {
        println!("{msg}");
    }
}

/// Print essential machine-readable output (always prints).
///
/// Use for results that should be available for piping, like URLs and
/// signatures.
pub fn essential(msg: &str) {
    println!("{msg}");
}

/// Print a value as pretty JSON (always prints).
///
/// # Errors
/// Returns error if the value cannot be serialized.
pub fn json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Get the status indicator for a workflow run.
#[must_use]
pub fn run_indicator(run: &WorkflowRun) -> String {
    match (run.status, run.conclusion.as_deref()) {
        (Some(RunStatus::Completed), Some("success")) => "●".green().to_string(),
        (Some(RunStatus::Completed), Some("failure" | "timed_out" | "startup_failure")) => {
            "●".red().to_string()
        }
        (Some(RunStatus::Completed), _) => "○".dimmed().to_string(),
        _ => "●".yellow().to_string(),
    }
}

/// Format a quota snapshot for display.
#[must_use]
pub fn quota_line(quota: &QuotaState, now: DateTime<Utc>) -> String {
    let counts = format!("{}/{}", quota.remaining, quota.limit);
    let counts = if quota.can_dispatch_now() {
        counts.green().to_string()
    } else {
        counts.red().to_string()
    };
    let reset_in = quota.time_until_reset(now).as_secs();
    format!("{} {counts} remaining, resets in {reset_in}s", quota.resource)
}

/// Print a horizontal line (suppressed in quiet mode).
pub fn hr() {
    if !is_quiet() {
        println!("{}", "─".repeat(50).dimmed());
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeDelta;

    use super::*;

    fn run(status: Option<RunStatus>, conclusion: Option<&str>) -> WorkflowRun {
        WorkflowRun {
            id: 1,
            name: Some("CI".into()),
            head_branch: Some("main".into()),
            head_sha: "abc".into(),
            event: "push".into(),
            status,
            conclusion: conclusion.map(Into::into),
            workflow_id: 7,
            html_url: "https://github.com/o/r/actions/runs/1".into(),
            created_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    #[test]
    fn run_indicator_colors_match_conclusion() {
        colored::control::set_override(true);

        assert_eq!(
            run_indicator(&run(Some(RunStatus::Completed), Some("success"))),
            "●".green().to_string()
        );
        assert_eq!(
            run_indicator(&run(Some(RunStatus::Completed), Some("failure"))),
            "●".red().to_string()
        );
        assert_eq!(
            run_indicator(&run(Some(RunStatus::Completed), Some("cancelled"))),
            "○".dimmed().to_string()
        );
        assert_eq!(
            run_indicator(&run(Some(RunStatus::InProgress), None)),
            "●".yellow().to_string()
        );

        colored::control::set_override(false);
    }

    #[test]
    fn test_quota_line() {
        let now = DateTime::<Utc>::UNIX_EPOCH + TimeDelta::seconds(100);
        let quota = QuotaState::new(5000, 12, now + TimeDelta::seconds(90), "core");

        let line = quota_line(&quota, now);
        assert!(line.starts_with("core "));
        assert!(line.contains("12/5000"));
        assert!(line.contains("resets in 90s"));
    }

    #[test]
    fn test_quiet_mode_default() {
        // Reset to default state
        set_quiet(false);
        assert!(!is_quiet());
    }

    #[test]
    fn test_quiet_mode_enabled() {
        set_quiet(true);
        assert!(is_quiet());
        // Reset
        set_quiet(false);
    }
}
