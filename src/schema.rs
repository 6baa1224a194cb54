use crate::{error::Result, ident::Ident};

pub struct Column {
    pub name: &'static str,
    pub sql_type: &'static str,
}

const fn column(name: &'static str, sql_type: &'static str) -> Column {
    Column { name, sql_type }
}

/// A fixed table definition. Column names are emitted unquoted, so the
/// server folds them to lower case and queries may spell them either way.
pub struct Table {
    pub name: &'static str,
    pub columns: &'static [Column],
}

pub const GREEN_TRIPDATA: Table = Table {
    name: "green_tripdata",
    columns: &[
        column("VendorID", "INTEGER"),
        column("lpep_pickup_datetime", "TIMESTAMP"),
        column("lpep_dropoff_datetime", "TIMESTAMP"),
        column("store_and_fwd_flag", "CHAR(1)"),
        column("RatecodeID", "INTEGER"),
        column("PULocationID", "INTEGER"),
        column("DOLocationID", "INTEGER"),
        column("passenger_count", "INTEGER"),
        column("trip_distance", "FLOAT"),
        column("fare_amount", "FLOAT"),
        column("extra", "FLOAT"),
        column("mta_tax", "FLOAT"),
        column("tip_amount", "FLOAT"),
        column("tolls_amount", "FLOAT"),
        column("ehail_fee", "FLOAT"),
        column("improvement_surcharge", "FLOAT"),
        column("total_amount", "FLOAT"),
        column("payment_type", "INTEGER"),
        column("trip_type", "INTEGER"),
        column("congestion_surcharge", "FLOAT"),
    ],
};

pub const TAXI_ZONE_LOOKUP: Table = Table {
    name: "taxi_zone_lookup",
    columns: &[
        column("LocationID", "INTEGER PRIMARY KEY"),
        column("Borough", "TEXT"),
        column("Zone", "TEXT"),
        column("service_zone", "TEXT"),
    ],
};

impl Table {
    pub fn ident(&self) -> Result<Ident> {
        Ident::parse(self.name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.iter().map(|c| c.name)
    }

    pub fn create_sql(&self) -> Result<String> {
        let columns = self
            .columns
            .iter()
            .map(|c| format!("{} {}", c.name, c.sql_type))
            .collect::<Vec<_>>()
            .join(", ");
        Ok(format!("CREATE TABLE IF NOT EXISTS {} ({})", self.ident()?, columns))
    }

    pub fn has_rows_sql(&self) -> Result<String> {
        Ok(format!("SELECT EXISTS (SELECT 1 FROM {} LIMIT 1)", self.ident()?))
    }

    /// Bulk import from the client; the first line of the stream is a header.
    pub fn copy_sql(&self) -> Result<String> {
        Ok(format!(
            "COPY {} FROM STDIN WITH (FORMAT csv, HEADER true)",
            self.ident()?
        ))
    }
}
