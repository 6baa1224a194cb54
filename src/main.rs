use std::{fmt::Display, path::PathBuf, time::Instant};

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info};

use crate::{config::Config, report::ReportOptions};

mod config;
mod error;
mod ident;
mod loader;
mod provision;
mod report;
mod schema;
#[cfg(test)]
mod testutil;

/// Loads the NYC green taxi trips and zone lookup into PostgreSQL once, then
/// prints the trip reports.
#[derive(Debug, Parser)]
pub struct Args {
    #[command(flatten)]
    db: Config,

    /// Trip records CSV, imported into green_tripdata
    #[arg(long, default_value = "../data/green_tripdata_2019-10.csv")]
    trips: PathBuf,

    /// Zone lookup CSV, imported into taxi_zone_lookup
    #[arg(long, default_value = "../data/taxi_zone_lookup.csv")]
    zones: PathBuf,

    #[command(flatten)]
    reports: ReportOptions,
}

const SEGMENTATION_TITLE: &str = "📊 Question 3: Trip Segmentation Count";
const LONGEST_TRIP_TITLE: &str = "🕒 Question 4: Longest Trip";
const PICKUP_ZONES_TITLE: &str = "🌆 Question 5: Biggest Pickup Zones";
const LARGEST_TIP_TITLE: &str = "💰 Question 6: Largest Tip";

fn main() -> Result<()> {
    // .env has to be applied before clap reads DB_* from the environment.
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    provision::ensure_database_exists(&args.db)
        .with_context(|| format!("failed to provision database {}", args.db.name))?;

    let start = Instant::now();
    let summary = loader::load(&args.db, &args.trips, &args.zones)
        .context("failed to load data into PostgreSQL")?;
    info!(
        "green_tripdata: {}; taxi_zone_lookup: {} ({:?})",
        summary.trips,
        summary.zones,
        start.elapsed()
    );

    let opts = &args.reports;
    print_section(
        SEGMENTATION_TITLE,
        report::trip_segmentation(&args.db).map(|s| vec![s]),
    );
    print_section(
        LONGEST_TRIP_TITLE,
        report::longest_trip_day(&args.db, opts.month).map(Vec::from_iter),
    );
    print_section(
        PICKUP_ZONES_TITLE,
        report::top_pickup_zones(
            &args.db,
            opts.revenue_date,
            opts.revenue_threshold,
            opts.top_zones,
        ),
    );
    print_section(
        LARGEST_TIP_TITLE,
        report::largest_tip(&args.db, &opts.tip_origin_zone).map(Vec::from_iter),
    );

    Ok(())
}

fn print_section<T: Display>(title: &str, result: error::Result<Vec<T>>) {
    print!("{}", render_section(title, result));
}

// A failed report is logged and does not stop the ones after it.
fn render_section<T: Display>(title: &str, result: error::Result<Vec<T>>) -> String {
    let mut out = format!("\n## {title}\n");
    match result {
        Ok(rows) if rows.is_empty() => out.push_str("No result available\n"),
        Ok(rows) => {
            for row in rows {
                out.push_str(&format!("{row}\n"));
            }
        }
        Err(err) => {
            error!("{title}: {err}");
            out.push_str("No result available\n");
        }
    }
    out
}
