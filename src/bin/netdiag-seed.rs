use anyhow::{Context, Result};
use chrono::{Duration, NaiveTime, Utc};
use clap::Parser;
use netdiag::config::Config;
use netdiag::models::{round2, NewDiagnostic};
use netdiag::storage::{DiagnosticsStore, SqliteStore};
use rand::RngExt;
use std::sync::Arc;

const CITIES: [(&str, &str); 10] = [
    ("Salvador", "BA"),
    ("Feira de Santana", "BA"),
    ("São Paulo", "SP"),
    ("Rio de Janeiro", "RJ"),
    ("Belo Horizonte", "MG"),
    ("Brasília", "DF"),
    ("Recife", "PE"),
    ("Fortaleza", "CE"),
    ("Curitiba", "PR"),
    ("Porto Alegre", "RS"),
];

#[derive(Parser)]
#[command(name = "netdiag-seed")]
#[command(about = "Populate the diagnostics database with sample telemetry", long_about = None)]
struct Cli {
    /// Number of days to backfill, ending today
    #[arg(long, default_value_t = 7)]
    days: u32,

    /// Records per city per day
    #[arg(long, default_value_t = 5)]
    per_city: u32,

    /// Delete existing records before seeding
    #[arg(long, default_value_t = false)]
    reset: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    let store = Arc::new(
        SqliteStore::new(&config.database.url, config.database.max_connections).await?,
    );
    store.init().await?;

    if cli.reset {
        store.clear().await?;
        println!("✓ Cleared existing diagnostics");
    }

    let mut rng = rand::rng();
    let today = Utc::now().date_naive();
    let mut inserted = 0u64;

    for day_offset in 0..cli.days {
        let day = today - Duration::days(day_offset as i64);

        for (city, state) in CITIES {
            for _ in 0..cli.per_city {
                let latency: f64 = rng.random_range(30.0..70.0);
                let loss = rng.random_range(0.1..2.0);
                let quality = (100.0 - latency * 0.2 - loss * 5.0).clamp(0.0, 100.0);

                let time = NaiveTime::from_hms_opt(
                    rng.random_range(0..24),
                    rng.random_range(0..60),
                    rng.random_range(0..60),
                )
                .context("generated time out of range")?;

                store
                    .insert(&NewDiagnostic {
                        device_id: format!("DEV{:03}", rng.random_range(1..1000)),
                        city: city.to_string(),
                        state: state.to_string(),
                        latency_ms: round2(latency),
                        packet_loss: round2(loss),
                        quality_of_service: round2(quality),
                        date: day.and_time(time),
                    })
                    .await?;
                inserted += 1;
            }
        }
    }

    println!("✓ Inserted {inserted} diagnostic records");
    Ok(())
}
