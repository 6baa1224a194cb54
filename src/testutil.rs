//! Scratch databases for tests that need a live server.
//!
//! Connection details come from the same `DB_*` variables the binary reads
//! (a `.env` file works too). Tests using `ScratchDb` are `#[ignore]`d; run
//! them with `cargo test -- --ignored` against a live server.

use std::{
    env,
    io::Write,
    sync::atomic::{AtomicUsize, Ordering},
};

use serde::Serialize;
use tempfile::NamedTempFile;

use crate::{config::Config, ident::Ident, provision};

static NEXT_ID: AtomicUsize = AtomicUsize::new(0);

pub struct ScratchDb {
    pub config: Config,
}

impl ScratchDb {
    /// Provisions a fresh database. Panics when the server settings are
    /// incomplete or the server rejects the request.
    pub fn create() -> Self {
        dotenvy::dotenv().ok();
        let base = server_config(|key| env::var(key).ok()).unwrap_or_else(|err| panic!("{err}"));
        let id = NEXT_ID.fetch_add(1, Ordering::SeqCst);
        let config = Config {
            name: format!("taxi_test_{}_{}", std::process::id(), id),
            ..base
        };
        provision::ensure_database_exists(&config).unwrap();
        ScratchDb { config }
    }

    pub fn count(&self, table: &str) -> i64 {
        let mut client = self.config.connect().unwrap();
        let table = Ident::parse(table).unwrap();
        client
            .query_one(format!("SELECT COUNT(*) FROM {table}").as_str(), &[])
            .unwrap()
            .get(0)
    }
}

/// Server settings from `DB_*` lookups; the database name is left empty.
pub fn server_config(lookup: impl Fn(&str) -> Option<String>) -> Result<Config, String> {
    let var = |key: &str| lookup(key).ok_or_else(|| format!("{key} must be set for database tests"));
    let port = var("DB_PORT")?;
    Ok(Config {
        host: var("DB_HOST")?,
        port: port
            .parse()
            .map_err(|_| format!("DB_PORT is not a port number: {port:?}"))?,
        name: String::new(),
        user: var("DB_USER")?,
        password: var("DB_PASSWORD")?,
        maintenance_db: lookup("DB_MAINTENANCE_DB").unwrap_or_else(|| "postgres".into()),
    })
}

impl Drop for ScratchDb {
    fn drop(&mut self) {
        let Ok(name) = Ident::parse(&self.config.name) else {
            return;
        };
        if let Ok(mut client) = self.config.connect_server() {
            let _ = client.batch_execute(&format!("DROP DATABASE IF EXISTS {name} WITH (FORCE)"));
        }
    }
}

#[derive(Serialize)]
pub struct TripRow {
    #[serde(rename = "VendorID")]
    pub vendor_id: i32,
    pub lpep_pickup_datetime: String,
    pub lpep_dropoff_datetime: String,
    pub store_and_fwd_flag: String,
    #[serde(rename = "RatecodeID")]
    pub ratecode_id: i32,
    #[serde(rename = "PULocationID")]
    pub pu_location_id: i32,
    #[serde(rename = "DOLocationID")]
    pub do_location_id: i32,
    pub passenger_count: i32,
    pub trip_distance: Option<f64>,
    pub fare_amount: f64,
    pub extra: f64,
    pub mta_tax: f64,
    pub tip_amount: f64,
    pub tolls_amount: f64,
    pub ehail_fee: Option<f64>,
    pub improvement_surcharge: f64,
    pub total_amount: f64,
    pub payment_type: i32,
    pub trip_type: i32,
    pub congestion_surcharge: f64,
}

/// A trip with the given pickup time (`YYYY-MM-DD HH:MM:SS`) and distance,
/// from zone 1 to zone 2, everything else zeroed.
pub fn trip(pickup: &str, trip_distance: f64) -> TripRow {
    TripRow {
        vendor_id: 2,
        lpep_pickup_datetime: pickup.to_string(),
        lpep_dropoff_datetime: pickup.to_string(),
        store_and_fwd_flag: "N".to_string(),
        ratecode_id: 1,
        pu_location_id: 1,
        do_location_id: 2,
        passenger_count: 1,
        trip_distance: Some(trip_distance),
        fare_amount: 0.0,
        extra: 0.0,
        mta_tax: 0.0,
        tip_amount: 0.0,
        tolls_amount: 0.0,
        ehail_fee: None,
        improvement_surcharge: 0.0,
        total_amount: 0.0,
        payment_type: 1,
        trip_type: 1,
        congestion_surcharge: 0.0,
    }
}

#[derive(Serialize)]
pub struct ZoneRow {
    #[serde(rename = "LocationID")]
    pub location_id: i32,
    #[serde(rename = "Borough")]
    pub borough: String,
    #[serde(rename = "Zone")]
    pub zone: String,
    pub service_zone: String,
}

pub fn zone(location_id: i32, name: &str) -> ZoneRow {
    ZoneRow {
        location_id,
        borough: "Manhattan".to_string(),
        zone: name.to_string(),
        service_zone: "Boro Zone".to_string(),
    }
}

pub fn write_csv<T: Serialize>(rows: &[T]) -> NamedTempFile {
    let file = NamedTempFile::new().unwrap();
    let mut writer = csv::Writer::from_writer(file.reopen().unwrap());
    for row in rows {
        writer.serialize(row).unwrap();
    }
    writer.flush().unwrap();
    file
}

pub fn write_raw(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

mod tests {
    use std::collections::HashMap;

    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_server_config_from_complete_settings() {
        let vars = vars(&[
            ("DB_HOST", "localhost"),
            ("DB_PORT", "5432"),
            ("DB_USER", "loader"),
            ("DB_PASSWORD", "secret"),
        ]);
        let config = server_config(|key| vars.get(key).cloned()).unwrap();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 5432);
        assert_eq!(config.maintenance_db, "postgres");
        assert!(config.name.is_empty());
    }

    #[test]
    fn test_server_config_names_missing_setting() {
        let vars = vars(&[("DB_HOST", "localhost"), ("DB_PORT", "5432"), ("DB_USER", "loader")]);
        let err = server_config(|key| vars.get(key).cloned()).unwrap_err();
        assert_eq!(err, "DB_PASSWORD must be set for database tests");
    }

    #[test]
    fn test_server_config_rejects_bad_port() {
        let vars = vars(&[
            ("DB_HOST", "localhost"),
            ("DB_PORT", "fifty"),
            ("DB_USER", "loader"),
            ("DB_PASSWORD", "secret"),
        ]);
        let err = server_config(|key| vars.get(key).cloned()).unwrap_err();
        assert!(err.contains("DB_PORT"));
    }
}
