mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{
    bucket::BucketSubcommand, config::ConfigSubcommand, member::MemberSubcommand,
    report::ReportArgs, settings::SettingsSubcommand, story::StorySubcommand,
    subtask::SubtaskSubcommand, sync::SyncSubcommand,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "sprint",
    about = "Sprint planning: team capacity, sprint load, delivery forecast and reports",
    version,
    propagate_version = true
)]
struct Cli {
    /// Workspace root (default: auto-detect from .sprint/ or .git/)
    #[arg(long, global = true, env = "SPRINT_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a planning workspace in the current directory
    Init {
        /// Team name recorded in the config
        #[arg(long, default_value = "")]
        team: String,
    },

    /// Manage the team roster
    Member {
        #[command(subcommand)]
        subcommand: MemberSubcommand,
    },

    /// Manage backlog stories
    Story {
        #[command(subcommand)]
        subcommand: StorySubcommand,
    },

    /// Move stories in and out of the sprint
    Bucket {
        #[command(subcommand)]
        subcommand: BucketSubcommand,
    },

    /// Manage sub-tasks of a story
    Subtask {
        #[command(subcommand)]
        subcommand: SubtaskSubcommand,
    },

    /// Show or change sprint settings
    Settings {
        #[command(subcommand)]
        subcommand: SettingsSubcommand,
    },

    /// Team capacity against committed sprint work
    Capacity,

    /// Forecast delivery of the sprint's stories
    Forecast,

    /// Render the planning report
    Report(ReportArgs),

    /// Exchange the plan with the configured remote
    Sync {
        #[command(subcommand)]
        subcommand: SyncSubcommand,
    },

    /// Validate the workspace configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Sync { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init { team } => cmd::init::run(&root, &team, cli.json),
        Commands::Member { subcommand } => cmd::member::run(&root, subcommand, cli.json),
        Commands::Story { subcommand } => cmd::story::run(&root, subcommand, cli.json),
        Commands::Bucket { subcommand } => cmd::bucket::run(&root, subcommand, cli.json),
        Commands::Subtask { subcommand } => cmd::subtask::run(&root, subcommand, cli.json),
        Commands::Settings { subcommand } => cmd::settings::run(&root, subcommand, cli.json),
        Commands::Capacity => cmd::capacity::run(&root, cli.json),
        Commands::Forecast => cmd::forecast::run(&root, cli.json),
        Commands::Report(args) => cmd::report::run(&root, args, cli.json),
        Commands::Sync { subcommand } => cmd::sync::run(&root, subcommand, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
