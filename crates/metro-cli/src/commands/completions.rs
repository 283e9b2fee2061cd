//! `metro completions` command - Print a shell completion script.

use std::io::{self, Write};

use anyhow::Result;
use clap::CommandFactory;
use clap_complete::{Shell, generate};

use super::Cli;

/// Run the completions command.
pub fn run(shell: Shell) -> Result<()> {
    let mut stdout = io::stdout().lock();
    write_script(shell, &mut stdout);
    stdout.flush()?;
    Ok(())
}

fn write_script(shell: Shell, out: &mut dyn Write) {
    let mut cmd = Cli::command();
    let bin = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin, out);
}
