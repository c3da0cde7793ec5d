//! CLI frontend for Calliope, git-based version control and AI assistance
//! for fiction writers.

mod commands;

use std::path::PathBuf;
use std::process;

use calliope_core::TerminalConsole;
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "calliope",
    about = "Calliope: git-based version control for fiction writers",
    version,
    propagate_version = true
)]
struct Cli {
    /// Increase log output on stderr (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new project directory with starter content and a git repository
    Init {
        /// Name of the project directory to create
        name: String,
    },

    /// Manage the cast
    Character {
        #[command(subcommand)]
        action: CharacterCommand,
    },

    /// Run the AI character consistency checker
    Check {
        /// Files to check
        files: Vec<PathBuf>,

        /// Check every chapter and scene
        #[arg(long)]
        all: bool,
    },

    /// AI generation commands
    Generate {
        #[command(subcommand)]
        action: GenerateCommand,
    },

    /// Show git status with the manuscript word count
    Status,

    /// Commit all changes
    Commit {
        /// Commit message (prompted for when omitted)
        message: Option<String>,
    },

    /// Show recent commit history
    Log {
        /// Number of commits to show
        #[arg(short = 'n', long, default_value = "10")]
        count: usize,
    },

    /// Create a branch for an alternate storyline
    Branch {
        /// Branch name
        name: String,
    },

    /// Show a word-level diff of uncommitted changes
    Diff {
        /// Limit the diff to one file
        file: Option<String>,
    },

    /// Export the manuscript: markdown, txt, docx, pdf
    Export {
        /// Output format
        format: String,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },

    /// Show project metadata
    Info,

    /// Remove generated exports and consistency reports
    Cleanup {
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Character and scene templates
    Template {
        #[command(subcommand)]
        action: TemplateCommand,
    },
}

#[derive(Subcommand)]
enum CharacterCommand {
    /// Add a character interactively
    Add {
        /// Character name
        name: String,
    },
    /// List all characters
    List,
    /// Show one character
    Show {
        /// Character name (case-insensitive)
        name: String,
    },
    /// Edit a character interactively
    Edit {
        /// Character name (case-insensitive)
        name: String,
    },
    /// Remove a character
    Remove {
        /// Character name (case-insensitive)
        name: String,
    },
}

#[derive(Subcommand)]
enum GenerateCommand {
    /// Draft a new scene with AI assistance
    Scene {
        /// Scene name; also names the file in scenes/
        name: String,

        /// Append the scene to this chapter file (relative to the project root)
        #[arg(long)]
        append_to: Option<String>,
    },
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Configure the AI provider and credentials
    Ai,
}

#[derive(Subcommand)]
enum TemplateCommand {
    /// List available templates
    List,
    /// Create a character or scene from a template
    Use {
        /// `character` or `scene`
        category: String,
        /// Template name without extension
        name: String,
    },
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let console = TerminalConsole;

    let result = match cli.command {
        Commands::Init { name } => commands::init::run(&console, &name),
        Commands::Character { action } => match action {
            CharacterCommand::Add { name } => commands::character::add(&console, &name),
            CharacterCommand::List => commands::character::list(&console),
            CharacterCommand::Show { name } => commands::character::show(&name),
            CharacterCommand::Edit { name } => commands::character::edit(&console, &name),
            CharacterCommand::Remove { name } => commands::character::remove(&console, &name),
        },
        Commands::Check { files, all } => commands::check::run(&console, &files, all),
        Commands::Generate { action } => match action {
            GenerateCommand::Scene { name, append_to } => {
                commands::generate::scene(&console, &name, append_to.as_deref())
            }
        },
        Commands::Status => commands::git::status(),
        Commands::Commit { message } => commands::git::commit(&console, message.as_deref()),
        Commands::Log { count } => commands::git::log(count),
        Commands::Branch { name } => commands::git::branch(&console, &name),
        Commands::Diff { file } => commands::git::diff(file.as_deref()),
        Commands::Export { format } => commands::export::run(&console, &format),
        Commands::Config { action } => match action {
            ConfigCommand::Ai => commands::config::ai(&console),
        },
        Commands::Info => commands::info::run(),
        Commands::Cleanup { yes } => commands::cleanup::run(&console, yes),
        Commands::Template { action } => match action {
            TemplateCommand::List => commands::template::list(),
            TemplateCommand::Use { category, name } => {
                commands::template::apply(&console, &category, &name)
            }
        },
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
