use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "etude", version, about = "Etude study tracker")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Study countdown control
    Timer {
        #[command(subcommand)]
        action: commands::timer::TimerAction,
    },
    /// Recorded study sessions
    Session {
        #[command(subcommand)]
        action: commands::session::SessionAction,
    },
    /// Course chapter checklists
    Course {
        #[command(subcommand)]
        action: commands::course::CourseAction,
    },
    /// To-do list
    Task {
        #[command(subcommand)]
        action: commands::task::TaskAction,
    },
    /// Saved study links
    Link {
        #[command(subcommand)]
        action: commands::link::LinkAction,
    },
    /// Weekly study planner
    Plan {
        #[command(subcommand)]
        action: commands::plan::PlanAction,
    },
    /// Study statistics
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("ETUDE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_logging();
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Timer { action } => commands::timer::run(action),
        Commands::Session { action } => commands::session::run(action),
        Commands::Course { action } => commands::course::run(action),
        Commands::Task { action } => commands::task::run(action),
        Commands::Link { action } => commands::link::run(action),
        Commands::Plan { action } => commands::plan::run(action),
        Commands::Stats { action } => commands::stats::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
