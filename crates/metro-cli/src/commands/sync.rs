//! `metro sync` command - Integrate the remote copy of the current line.

use anyhow::{Result, bail};
use metro_core::{DownsyncOutcome, SyncEngine};

use super::absorb::print_conflicts;
use super::utils::open_workspace;
use crate::output;
use crate::prompt::TerminalPrompt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Up,
    Down,
}

/// Run the sync command.
pub fn run(direction: Option<&str>, url: Option<&str>, force: bool) -> Result<()> {
    let (direction, url) = parse_args(direction, url)?;
    let ws = open_workspace()?;
    let engine = SyncEngine::new(&ws.repo, &ws.settings);

    if direction == Direction::Up {
        engine.upsync()?;
        return Ok(());
    }

    let mut prompt = TerminalPrompt::new();
    let remote = &ws.settings.remote;
    match engine.downsync(url, force, &mut prompt)? {
        DownsyncOutcome::UpToDate => output::success(&format!("Already up to date with {remote}")),
        DownsyncOutcome::Reset { to } => output::success(&format!(
            "Reset to {remote} at {}",
            output::short_id(&to.to_string())
        )),
        DownsyncOutcome::FastForwarded { to } => output::success(&format!(
            "Fast-forwarded to {}",
            output::short_id(&to.to_string())
        )),
        DownsyncOutcome::Absorbed { side_line, commit } => output::success(&format!(
            "Absorbed your commits from '{side_line}' as {}",
            output::short_id(&commit.to_string())
        )),
        DownsyncOutcome::Conflicted {
            side_line,
            conflicts,
        } => {
            output::warn(&format!(
                "Absorbing your commits from '{side_line}' left conflicts in:"
            ));
            print_conflicts(&conflicts);
            output::info("Fix them, then run `metro resolve`");
        }
        DownsyncOutcome::Parked { side_line } => {
            output::success(&format!("Synced with {remote}"));
            output::info(&format!(
                "Your commits are on '{side_line}' - `metro absorb {side_line}` when ready"
            ));
        }
    }
    Ok(())
}

/// Split `[up|down] [url]`, where the url may take the direction's place.
fn parse_args<'a>(
    first: Option<&'a str>,
    second: Option<&'a str>,
) -> Result<(Direction, Option<&'a str>)> {
    match (first, second) {
        (None, _) => Ok((Direction::Down, None)),
        (Some("down"), url) => Ok((Direction::Down, url)),
        (Some("up"), url) => Ok((Direction::Up, url)),
        (Some(url), None) => Ok((Direction::Down, Some(url))),
        (Some(other), Some(_)) => bail!("Unknown sync direction '{other}' (expected up or down)"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_args() {
        assert_eq!(parse_args(None, None).unwrap(), (Direction::Down, None));
        assert_eq!(
            parse_args(Some("up"), None).unwrap(),
            (Direction::Up, None)
        );
        assert_eq!(
            parse_args(Some("down"), Some("../origin")).unwrap(),
            (Direction::Down, Some("../origin"))
        );
        assert_eq!(
            parse_args(Some("https://example.com/r.git"), None).unwrap(),
            (Direction::Down, Some("https://example.com/r.git"))
        );
        assert!(parse_args(Some("sideways"), Some("url")).is_err());
    }
}
