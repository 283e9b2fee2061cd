//! Interactive answers for sync: fetch progress, credentials, the remote
//! URL and the diverged-history choice.
//!
//! Without a terminal attached nothing is asked: credentials and URLs are
//! declined and diverged local work is parked.

use indicatif::{ProgressBar, ProgressStyle};
use inquire::{Password, Select, Text};
use metro_core::{DivergedChoice, SyncPrompt};
use metro_git::{Credential, FetchCallbacks, SecretString};

use crate::output;

const ABSORB_OPTION: &str = "Absorb my commits on top of the remote";
const PARK_OPTION: &str = "Leave my commits on the side line";

/// Terminal implementation of [`SyncPrompt`].
pub struct TerminalPrompt {
    interactive: bool,
    bar: Option<ProgressBar>,
}

impl TerminalPrompt {
    pub fn new() -> Self {
        Self {
            interactive: console::user_attended(),
            bar: None,
        }
    }

    fn bar(&mut self, total: u64) -> &ProgressBar {
        self.bar.get_or_insert_with(|| {
            let style = ProgressStyle::with_template("{spinner} {msg} [{bar:30}] {pos}/{len}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> ");
            let bar = ProgressBar::new(total).with_style(style);
            bar.set_message("Fetching");
            bar
        })
    }
}

impl FetchCallbacks for TerminalPrompt {
    fn progress(&mut self, received: usize, _indexed: usize, total: usize) {
        if total == 0 || output::is_quiet() || !self.interactive {
            return;
        }
        let bar = self.bar(total as u64);
        bar.set_length(total as u64);
        bar.set_position(received as u64);
    }

    fn credentials(&mut self, url: &str, username: Option<&str>) -> Option<Credential> {
        if !self.interactive {
            return None;
        }
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }

        let username = match username {
            Some(name) => name.to_string(),
            None => Text::new(&format!("Username for {url}:")).prompt().ok()?,
        };
        let password = Password::new(&format!("Password for {username}@{url}:"))
            .without_confirmation()
            .prompt()
            .ok()?;

        Some(Credential {
            username,
            password: SecretString::from(password),
        })
    }

    fn finished(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}

impl SyncPrompt for TerminalPrompt {
    fn remote_url(&mut self, remote: &str) -> Option<String> {
        if !self.interactive {
            return None;
        }
        Text::new(&format!("No url for remote '{remote}'. Url:"))
            .prompt()
            .ok()
    }

    fn diverged(&mut self, line: &str, side_line: &str) -> DivergedChoice {
        output::warn(&format!(
            "'{line}' has diverged from the remote; your commits are on '{side_line}'"
        ));
        if !self.interactive {
            return DivergedChoice::Park;
        }

        match Select::new("What now?", vec![ABSORB_OPTION, PARK_OPTION]).prompt() {
            Ok(ABSORB_OPTION) => DivergedChoice::Absorb,
            _ => DivergedChoice::Park,
        }
    }
}
