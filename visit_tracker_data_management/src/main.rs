use std::{collections::HashMap, path::PathBuf};

use chrono::SecondsFormat;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use visit_tracker_data_management::{visit_log::VisitLog, DataManagerConfig};

#[derive(Parser)]
#[command(name = "VisitCLI")]
#[command(about = "A CLI to inspect the visit log", long_about = None)]
struct Cli {
    /// Path to the visit log file. Defaults to the workspace data directory.
    #[arg(long)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print recent visits, newest first
    List {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Print the total visit count and the most frequent language
    Stats,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=warn", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let path = cli.log_file.unwrap_or_else(|| DataManagerConfig::default().visit_log_path);
    let visits = VisitLog::new(path).read_all().await.unwrap();

    match &cli.command {
        Commands::List { limit } => {
            for visit in visits.iter().take(*limit) {
                let path = visit.extra.get("path").and_then(|value| value.as_str()).unwrap_or("-");
                let time = visit.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true);
                println!("{}\t{}\t{}\t{}\t{}", time, visit.ip, visit.country, visit.city, path);
            }
        }
        Commands::Stats => {
            let mut languages: HashMap<&str, usize> = HashMap::new();
            for visit in &visits {
                if let Some(language) = visit.extra.get("language").and_then(|value| value.as_str()) {
                    *languages.entry(language).or_default() += 1;
                }
            }

            println!("Total visits: {}", visits.len());
            match languages.iter().max_by_key(|(_, count)| **count) {
                Some((language, count)) => println!("Most frequent language: {language} ({count})"),
                None => println!("Most frequent language: n/a"),
            }
        }
    }
}
