#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{CommandFactory, Parser, Subcommand};
use lanes_core::config::resolve_config;
use output::OutputMode;
use std::env;
use std::path::Path;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "lanes: a kanban board with ordered columns and optimistic sync",
    long_about = None
)]
struct Cli {
    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Suppress success notices.
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Setup",
        about = "Initialize a board",
        long_about = "Create .lanes/ with a default config and an empty board database.",
        after_help = "EXAMPLES:\n    # Initialize a board in the current directory\n    lanes init\n\n    # Re-apply migrations to an existing board\n    lanes init --force"
    )]
    Init(cmd::init::InitArgs),

    #[command(
        next_help_heading = "Board",
        about = "Manage projects",
        long_about = "Add, rename, remove, reorder, and list the board's projects.",
        after_help = "EXAMPLES:\n    # Add a project at the end of the board\n    lanes project add \"Backlog\"\n\n    # Move a project into another project's slot\n    lanes project move 3fQk --onto 9bZt\n\n    # Emit machine-readable output\n    lanes project list --json"
    )]
    Project(cmd::project::ProjectArgs),

    #[command(
        next_help_heading = "Board",
        about = "Manage tasks",
        long_about = "Add, edit, remove, reorder, and complete tasks.",
        after_help = "EXAMPLES:\n    # Add a task to the first project\n    lanes task add \"Write release notes\" --priority high\n\n    # Reorder within a column\n    lanes task move Xy12 --onto Ab34\n\n    # Mark done or reopen\n    lanes task toggle Xy12"
    )]
    Task(cmd::task::TaskArgs),

    #[command(
        next_help_heading = "Read",
        about = "Show the board",
        long_about = "Show every project with its visible tasks in board order.",
        after_help = "EXAMPLES:\n    # Everything\n    lanes list\n\n    # Open high-priority work mentioning deploy\n    lanes list --priority high --status active -s deploy\n\n    # Emit machine-readable output\n    lanes list --json"
    )]
    List(cmd::list::ListArgs),

    #[command(
        next_help_heading = "Backup",
        about = "Export the board",
        long_about = "Write a versioned JSON backup of the whole board.",
        after_help = "EXAMPLES:\n    # Print the backup\n    lanes export\n\n    # Save it to a file\n    lanes export -o board.json"
    )]
    Export(cmd::export::ExportArgs),

    #[command(
        next_help_heading = "Backup",
        about = "Replace the board from a backup",
        long_about = "Validate a version 1 backup and replace the whole board with it.",
        after_help = "EXAMPLES:\n    # Restore from a file\n    lanes import board.json\n\n    # Restore from stdin\n    cat board.json | lanes import -"
    )]
    Import(cmd::import::ImportArgs),

    #[command(
        next_help_heading = "Setup",
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n    # Bash\n    lanes completions bash > ~/.local/share/bash-completion/completions/lanes"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("LANES_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "lanes=debug,info"
        } else {
            "lanes=info,warn"
        })
    });

    let format = env::var("LANES_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());
    let registry = tracing_subscriber::registry().with(filter);
    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn output_mode(cli: &Cli, project_root: &Path) -> OutputMode {
    match resolve_config(project_root, cli.json) {
        Ok(config) => OutputMode::from_resolved(&config.resolved_output),
        Err(e) => {
            debug!("config unreadable, using default output: {e:#}");
            if cli.json {
                OutputMode::Json
            } else {
                OutputMode::Text
            }
        }
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let project_root = env::current_dir()?;
    let output = output_mode(&cli, &project_root);
    let quiet = cli.quiet;

    match cli.command {
        Commands::Init(args) => cmd::init::run_init(&args, output, &project_root),
        Commands::Project(args) => cmd::project::run_project(&args, output, quiet, &project_root),
        Commands::Task(args) => cmd::task::run_task(&args, output, quiet, &project_root),
        Commands::List(args) => cmd::list::run_list(&args, output, &project_root),
        Commands::Export(args) => cmd::export::run_export(&args, output, &project_root),
        Commands::Import(args) => cmd::import::run_import(&args, output, quiet, &project_root),
        Commands::Completions(args) => cmd::completions::run_completions(&args, Cli::command()),
    }
}
