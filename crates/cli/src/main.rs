use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use storage::{
    Database, Leaderboard,
    models::{AwardRecord, Participant},
    services::{
        leaderboard::DEFAULT_PARTICIPANTS,
        points::{PointsSource, RandomPoints, SeededPoints},
    },
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "leaderboard-admin")]
#[command(about = "Leaderboard maintenance tool", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    /// Print JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the default participants if the leaderboard is empty
    Seed {
        /// Comma separated names, defaults to the built-in roster
        #[arg(long, value_delimiter = ',')]
        names: Vec<String>,
    },
    /// Recompute every participant's rank
    Reconcile,
    /// Show participants in standings order
    Standings,
    /// Show the most recent awards
    History {
        #[arg(long)]
        participant: Option<Uuid>,

        #[arg(long)]
        limit: Option<usize>,
    },
    /// Create a participant
    Create { name: String },
    /// Grant a random award to a participant
    Claim {
        participant: Uuid,

        /// Draw points from a seeded generator
        #[arg(long, env = "POINTS_SEED")]
        points_seed: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("leaderboard_admin={},storage={}", log_level, log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let db = Database::new(&cli.database_url)
        .await
        .context("Failed to connect to database")?;
    db.run_migrations()
        .await
        .context("Failed to run migrations")?;

    let points: Arc<dyn PointsSource> = match &cli.command {
        Commands::Claim {
            points_seed: Some(seed),
            ..
        } => Arc::new(SeededPoints::new(*seed)),
        _ => Arc::new(RandomPoints),
    };
    let board = Leaderboard::new(Arc::new(db.store()), points);

    match cli.command {
        Commands::Seed { names } => {
            let names: Vec<String> = if names.is_empty() {
                DEFAULT_PARTICIPANTS.iter().map(|s| s.to_string()).collect()
            } else {
                names
            };

            let seeded = board.seed_defaults(&names).await?;
            if seeded.is_empty() {
                tracing::info!("Leaderboard already has participants, nothing seeded");
            }
            print_participants(&seeded, cli.json)?;
        }
        Commands::Reconcile => {
            board.reconcile().await?;
            tracing::info!("✓ Ranks reconciled");
            print_participants(&board.list_participants().await?, cli.json)?;
        }
        Commands::Standings => {
            print_participants(&board.list_participants().await?, cli.json)?;
        }
        Commands::History { participant, limit } => {
            let records = board.recent_history(participant, limit).await?;
            print_history(&records, cli.json)?;
        }
        Commands::Create { name } => {
            let participant = board.create_participant(&name).await?;
            print_participants(std::slice::from_ref(&participant), cli.json)?;
        }
        Commands::Claim { participant, .. } => {
            let claim = board.claim(participant).await?;
            tracing::info!(
                "✓ {} earned {} points!",
                claim.participant.name,
                claim.points_awarded
            );
            print_participants(std::slice::from_ref(&claim.participant), cli.json)?;
        }
    }

    Ok(())
}

fn print_participants(participants: &[Participant], json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(participants)?);
    } else {
        print!("{}", format_participants(participants));
    }
    Ok(())
}

fn print_history(records: &[AwardRecord], json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(records)?);
    } else {
        print!("{}", format_history(records));
    }
    Ok(())
}

fn format_participants(participants: &[Participant]) -> String {
    let width = name_width(participants.iter().map(|p| p.name.as_str()));
    let mut out = format!("{:>4}  {:<width$}  {:>8}  {}\n", "RANK", "NAME", "POINTS", "ID");

    for p in participants {
        out.push_str(&format!(
            "{:>4}  {:<width$}  {:>8}  {}\n",
            p.rank, p.name, p.total_points, p.participant_id
        ));
    }
    out
}

fn format_history(records: &[AwardRecord]) -> String {
    let width = name_width(records.iter().map(|r| r.participant_name.as_str()));
    let mut out = format!("{:<20}  {:<width$}  {:>6}\n", "AWARDED AT", "NAME", "POINTS");

    for r in records {
        out.push_str(&format!(
            "{:<20}  {:<width$}  {:>6}\n",
            r.awarded_at.format("%Y-%m-%d %H:%M:%S"),
            r.participant_name,
            r.points_awarded
        ));
    }
    out
}

fn name_width<'a>(names: impl Iterator<Item = &'a str>) -> usize {
    names.map(|n| n.chars().count()).max().unwrap_or(0).max(4)
}
