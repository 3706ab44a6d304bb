//! Text summary builder for CLI output.
//!
//! Condenses a run report into human-readable lines for text mode.

use crate::model::{InvocationOutcome, PlotGroup, RunReport};

/// Pre-formatted lines for text output.
pub(crate) struct TextSummary {
    pub lines: Vec<String>,
}

/// Build a text summary from a finished (or dry) run.
pub(crate) fn build_text_summary(report: &RunReport) -> TextSummary {
    let mut lines = Vec::new();
    let dry_run = report.config.dry_run;
    let verb = if dry_run { "would plot" } else { "plotted" };

    for group in PlotGroup::ALL {
        if report.disabled_groups.contains(&group) {
            lines.push(format!("{:<34} disabled", group.label()));
            continue;
        }
        let count = report.invocations_in(group).count();
        lines.push(format!("{:<34} {verb} {count}", group.label()));
    }

    lines.push(format!(
        "Absent candidates skipped: {}",
        report.skipped
    ));

    let mut nonzero = 0usize;
    let mut timed_out = 0usize;
    let mut spawn_failed = 0usize;
    for inv in &report.invocations {
        match inv.outcome {
            InvocationOutcome::Exited { code } if code != Some(0) => nonzero += 1,
            InvocationOutcome::TimedOut => timed_out += 1,
            InvocationOutcome::SpawnFailed { .. } => spawn_failed += 1,
            _ => {}
        }
    }
    if nonzero + timed_out + spawn_failed > 0 {
        lines.push(format!(
            "Viewer problems: {nonzero} non-zero exit, {timed_out} timed out, {spawn_failed} failed to start"
        ));
    }

    if dry_run {
        for inv in &report.invocations {
            lines.push(format!("  {} {}", report.config.view_cmd, inv.args.join(" ")));
        }
    } else {
        lines.push(format!(
            "Moved {} files into {}",
            report.relocated.len(),
            report.config.pic_path().display()
        ));
        lines.push(format!("Log: {}", report.config.log_path().display()));
    }

    TextSummary { lines }
}
