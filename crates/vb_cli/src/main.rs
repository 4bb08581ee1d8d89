//! Volleyball Match Replay CLI
//!
//! Action CSV → live match engine → dashboard tables
//! Team events CSV → resume state

#[cfg(feature = "cli")]
use anyhow::Result;
#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "vb_cli")]
#[command(about = "Replay recorded volleyball actions and export match tables", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Replay an action CSV through the match engine
    Replay {
        /// Action CSV (Player, Position, Action, Outcome, Attack_Type, Timestamp, Notes)
        #[arg(long)]
        actions: PathBuf,

        /// Match config JSON (defaults: rotation 1, we serve, 25/2/best of 5)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Directory for the exported tables
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,

        /// Opponent name used in the file names
        #[arg(long, default_value = "Match")]
        opponent: String,

        /// Match date (YYYY-MM-DD), today when omitted
        #[arg(long)]
        date: Option<chrono::NaiveDate>,

        /// Also write the full match log as JSON
        #[arg(long, default_value = "false")]
        json: bool,

        /// Close a trailing rally that has no terminal action
        #[arg(long, default_value = "false")]
        close_open_rally: bool,
    },

    /// Derive the resume state from exported tables
    Resume {
        /// Team events CSV
        #[arg(long)]
        team: PathBuf,

        /// Individual events CSV
        #[arg(long)]
        individual: Option<PathBuf>,

        /// Match config JSON used for rules and defaults
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[cfg(feature = "cli")]
fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Replay {
            actions,
            config,
            out_dir,
            opponent,
            date,
            json,
            close_open_rally,
        } => {
            println!("🏐 Replaying match...");
            println!("   Actions: {}", actions.display());
            println!("   Output:  {}", out_dir.display());

            let match_config = vb_cli::load_config(config.as_deref())?;
            let options = vb_cli::ReplayOptions {
                out_dir,
                opponent,
                date: date.unwrap_or_else(|| chrono::Local::now().date_naive()),
                write_json: json,
                close_trailing_rally: close_open_rally,
            };
            let summary = vb_cli::replay_match(&actions, match_config, &options)?;
            print_summary(&summary);
        }

        Commands::Resume { team, individual, config } => {
            println!("🔍 Reading tables...");
            println!("   Team: {}", team.display());

            let base = vb_cli::load_config(config.as_deref())?;
            let report = vb_cli::resume_from_tables(&team, individual.as_deref(), &base)?;
            if report.estimated_rotations {
                println!("⚠️  Rotation column missing, rotations are estimated");
            }
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

#[cfg(feature = "cli")]
fn print_summary(summary: &vb_cli::ReplaySummary) {
    let snap = &summary.snapshot;
    println!("\n✅ Replay finished");
    println!("   Actions:   {}", summary.actions);
    println!("   Rallies:   {}", summary.rallies_sealed);
    if summary.closed_open_rally {
        println!("   (last rally closed without a terminal action)");
    }
    println!("   Set:       {} ({})", snap.set_index, snap.score);
    println!("   Sets:      {}-{}", snap.sets_won_by_us, snap.sets_won_by_opponent);
    println!("   Rotation:  {} ({})", snap.rotation, snap.serving_phase);
    if snap.is_complete() {
        println!("   Winner:    {:?}", snap.match_winner);
    }
    println!("\n📄 Individual events: {}", summary.individual_csv.display());
    println!("📄 Team events:       {}", summary.team_csv.display());
    if let Some(path) = &summary.match_json {
        println!("📄 Match log:         {}", path.display());
    }
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("vb_cli is not available. Enable the 'cli' feature to use it.");
    std::process::exit(1);
}
