//! Metro CLI - lines, checkpoints and absorbs that never lose work in progress.

use clap::{CommandFactory, Parser};

mod commands;
mod logging;
mod output;
mod prompt;

use commands::{Cli, Commands, DeleteCommands};

fn main() {
    let cli = Cli::parse();
    output::set_quiet(cli.quiet);
    logging::init(cli.verbose);

    let name = cli.command.name();
    let result = match cli.command {
        Commands::Create { directory, line } => commands::create::run(directory, &line),
        Commands::Line { name } => commands::line::run(&name),
        Commands::Lines => commands::lines::run(),
        Commands::Switch { name } => commands::switch::run(&name),
        Commands::Checkpoint { message } => commands::checkpoint::run(&message.join(" ")),
        Commands::Patch { message } => commands::patch::run(message.as_deref()),
        Commands::Delete(DeleteCommands::Commit { count }) => {
            commands::delete::run_commits(count)
        }
        Commands::Delete(DeleteCommands::Line { name }) => commands::delete::run_line(&name),
        Commands::Absorb { line } => commands::absorb::run(&line),
        Commands::Resolve => commands::resolve::run(),
        Commands::Sync {
            direction,
            url,
            force,
        } => commands::sync::run(direction.as_deref(), url.as_deref(), force),
        Commands::Status { json } => commands::status::run(json),
        Commands::Completions { shell } => commands::completions::run(shell),
    };

    if let Err(e) = result {
        output::error(&format!("{e:#}"));
        print_usage(name);
        std::process::exit(1);
    }
}

/// Print the failing sub-command's usage line to stderr.
fn print_usage(name: &str) {
    let mut cmd = Cli::command();
    if let Some(sub) = cmd.find_subcommand_mut(name) {
        eprintln!();
        eprintln!("{}", sub.render_usage());
    }
}
