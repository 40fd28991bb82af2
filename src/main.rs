use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::info;

use elex_transform::constants::{PLACE, STATE};
use elex_transform::domain::RawResult;
use elex_transform::error::Result;
use elex_transform::logging;
use elex_transform::names::HeuristicNameParser;
use elex_transform::storage::{InMemoryStorage, Storage};
use elex_transform::transform::{PassSummary, Transformer};

#[derive(Parser)]
#[command(name = "elex_transform")]
#[command(about = "Chicago election-results transform pipeline")]
#[command(version = "0.1.0")]
struct Cli {
    /// JSON file of raw result rows to seed the store with
    #[arg(long)]
    file: String,

    /// State tag for the transform run
    #[arg(long, default_value = STATE)]
    state: String,

    /// Place filter for the raw-result input set
    #[arg(long, default_value = PLACE)]
    place: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create unique contests (and their offices) from raw results
    Contests,
    /// Create unique candidates from raw results
    Candidates,
    /// Create vote results from raw results
    Results,
    /// Run all three passes in order
    Run,
    /// Delete all entities previously created from this raw input
    Reverse,
}

async fn load_raw_results(storage: &dyn Storage, path: &str) -> Result<usize> {
    let contents = std::fs::read_to_string(path)?;
    let rows: Vec<RawResult> = serde_json::from_str(&contents)?;
    let count = rows.len();
    for mut row in rows {
        storage.create_raw_result(&mut row).await?;
    }
    info!(count, file = path, "loaded raw results");
    Ok(count)
}

fn print_summary(pass: &str, summary: &PassSummary) {
    println!("📊 {pass} pass:");
    println!("   Scanned: {}", summary.scanned);
    println!("   Created: {}", summary.created);
    if summary.unchanged > 0 {
        println!("   Unchanged: {}", summary.unchanged);
    }
    println!("   Skipped: {}", summary.skipped);
    if summary.ambiguous > 0 {
        println!("   Ambiguous: {}", summary.ambiguous);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_logging();

    let cli = Cli::parse();

    let storage: Arc<InMemoryStorage> = Arc::new(InMemoryStorage::new());
    load_raw_results(storage.as_ref(), &cli.file).await?;

    let transformer = Transformer::new(storage.clone(), Arc::new(HeuristicNameParser::new()));

    match cli.command {
        Commands::Contests => {
            let summary = transformer.create_contests(&cli.state, &cli.place).await?;
            print_summary("Contests", &summary);
        }
        Commands::Candidates => {
            let summary = transformer.create_contests(&cli.state, &cli.place).await?;
            print_summary("Contests", &summary);
            let summary = transformer.create_candidates(&cli.state, &cli.place).await?;
            print_summary("Candidates", &summary);
        }
        Commands::Results | Commands::Run => {
            let [contests, candidates, results] =
                transformer.run_all(&cli.state, &cli.place).await?;
            print_summary("Contests", &contests);
            print_summary("Candidates", &candidates);
            print_summary("Results", &results);
        }
        Commands::Reverse => {
            // populate then reverse, to report what a full run would remove
            transformer.run_all(&cli.state, &cli.place).await?;
            let reversed = transformer.reverse_all(&cli.state).await?;
            println!("🗑  Reversed transform for {}:", cli.state);
            println!("   Offices deleted: {}", reversed.offices);
            println!("   Contests deleted: {}", reversed.contests);
            println!("   Candidates deleted: {}", reversed.candidates);
            println!("   Results deleted: {}", reversed.results);
        }
    }

    Ok(())
}
