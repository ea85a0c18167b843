use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod aggregate;
mod config;
mod db;
mod error;
mod import;
mod local;
mod models;
mod report;
mod store;

use config::{StoreArgs, StoreConfig};
use models::{parse_timestamp, Exercise, WorkoutSession, WorkoutType};

#[derive(Parser)]
#[command(name = "workout-insights")]
#[command(about = "Workout session log with daily volume, frequency and personal record views", long_about = None)]
struct Cli {
    #[command(flatten)]
    store: StoreArgs,
    /// Log at debug level
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the session store if it does not exist yet
    Init,
    /// Load realistic sample sessions
    Seed,
    /// Import per-set rows from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Record a finished workout session
    Log {
        #[arg(long = "type", value_enum, default_value_t = WorkoutType::Strength)]
        workout_type: WorkoutType,
        /// Session length in seconds
        #[arg(long, default_value_t = 0)]
        duration: u64,
        /// ISO-8601 timestamp, defaults to now
        #[arg(long)]
        date: Option<String>,
        /// NAME:SETSxREPS@WEIGHT, repeatable
        #[arg(long = "exercise", required = true)]
        exercises: Vec<Exercise>,
    },
    /// List logged sessions, newest first
    History {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Print the four summary views
    Insights {
        #[arg(long)]
        since_days: Option<i64>,
        /// Emit JSON for chart rendering
        #[arg(long)]
        json: bool,
    },
    /// Generate a markdown report
    Report {
        #[arg(long)]
        since_days: Option<i64>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "workout_insights=info,warn".into()),
        )
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = StoreConfig::from(cli.store);
    let store = store::open_store(&config).await?;

    match cli.command {
        Commands::Init => {
            store.prepare().await?;
            println!("Session store ready ({}).", store.describe());
        }
        Commands::Seed => {
            let inserted = import::seed(store.as_ref()).await?;
            println!("Inserted {inserted} sample sessions.");
        }
        Commands::Import { csv } => {
            let inserted = import::import_csv(store.as_ref(), &csv).await?;
            println!("Inserted {inserted} sessions from {}.", csv.display());
        }
        Commands::Log {
            workout_type,
            duration,
            date,
            exercises,
        } => {
            let performed_at = match date {
                Some(value) => parse_timestamp(&value).context("invalid --date")?,
                None => Utc::now(),
            };
            let session = WorkoutSession::new(performed_at, workout_type, duration, exercises);
            store.append_session(&session).await?;
            println!(
                "Logged {} exercises in {}.",
                session.exercises.len(),
                report::format_duration(session.duration_seconds)
            );
        }
        Commands::History { limit } => {
            let sessions = store.list_sessions().await?;
            if sessions.is_empty() {
                println!("No sessions logged yet.");
                return Ok(());
            }
            print!("{}", report::render_history(&sessions, limit));
        }
        Commands::Insights { since_days, json } => {
            let since = since_days.map(aggregate::cutoff_date).transpose()?;
            let records = store.list_records().await?;
            let insights = aggregate::summarize(&records, since);

            if json {
                println!("{}", serde_json::to_string_pretty(&insights)?);
                return Ok(());
            }
            if insights.total_weight_by_day.is_empty() {
                println!("No workout data found.");
            } else {
                println!("Total weight lifted per day:");
                for entry in &insights.total_weight_by_day {
                    println!("- {} {:.1}", entry.day, entry.total_weight);
                }
                println!("Volume over time:");
                for point in &insights.volume_over_time {
                    println!("- {} {:.1}", point.day, point.volume);
                }
                println!("Most performed exercises:");
                for entry in &insights.exercise_frequency {
                    println!("- {} ({} sets)", entry.exercise, entry.count);
                }
                println!("Personal records:");
                for entry in &insights.personal_records {
                    println!("- {} {:.1}", entry.exercise, entry.max_weight);
                }
            }
            if !insights.rejected.is_empty() {
                println!("Skipped {} records that could not be read:", insights.rejected.len());
                for rejected in &insights.rejected {
                    println!("- {rejected}");
                }
            }
        }
        Commands::Report { since_days, out } => {
            let since = since_days.map(aggregate::cutoff_date).transpose()?;
            let sessions = store.list_sessions().await?;
            let records: Vec<_> = sessions.iter().flat_map(WorkoutSession::to_records).collect();
            let insights = aggregate::summarize(&records, since);
            let report = report::build_report(since, &insights, &sessions);
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
