//! `metro absorb` command - Merge another line into the current one.

use anyhow::Result;
use metro_core::{AbsorbOutcome, MergeWorkflow};

use super::utils::open_workspace;
use crate::output;

/// Run the absorb command.
pub fn run(other: &str) -> Result<()> {
    let ws = open_workspace()?;
    let outcome = MergeWorkflow::new(&ws.repo, &ws.settings).absorb(other)?;
    report(other, &outcome);
    Ok(())
}

fn report(other: &str, outcome: &AbsorbOutcome) {
    match outcome {
        AbsorbOutcome::Absorbed { commit } => {
            output::success(&format!(
                "Absorbed '{other}' as {}",
                output::short_id(&commit.to_string())
            ));
        }
        AbsorbOutcome::Conflicted { conflicts } => {
            output::warn(&format!("Absorbing '{other}' left conflicts in:"));
            print_conflicts(conflicts);
            output::info("Fix them, then run `metro resolve`");
        }
    }
}

pub fn print_conflicts(conflicts: &[String]) {
    for path in conflicts {
        output::detail(&format!("  {path}"));
    }
}
