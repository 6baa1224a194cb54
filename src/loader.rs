use std::{
    fmt::Display,
    fs::File,
    io::{self, ErrorKind, Read, Seek, SeekFrom, Write},
    path::Path,
};

use log::{debug, info};
use postgres::Client;

use crate::{
    config::Config,
    error::{Error, Result},
    schema::{GREEN_TRIPDATA, TAXI_ZONE_LOOKUP, Table},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded { rows: u64 },
    /// The table already held at least one row.
    Skipped,
}

impl Display for LoadOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadOutcome::Loaded { rows } => write!(f, "loaded {rows} rows"),
            LoadOutcome::Skipped => write!(f, "already contains data, skipped"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadSummary {
    pub trips: LoadOutcome,
    pub zones: LoadOutcome,
}

/// Creates both tables if needed and bulk-imports each CSV into its table,
/// trips first.
///
/// A table that already holds any row is left alone without opening its file.
/// The check is on presence only: an updated CSV is never re-imported into a
/// populated table.
pub fn load(config: &Config, trip_csv: &Path, zone_csv: &Path) -> Result<LoadSummary> {
    let mut client = config.connect()?;
    let trips = load_table(&mut client, &GREEN_TRIPDATA, trip_csv)?;
    let zones = load_table(&mut client, &TAXI_ZONE_LOOKUP, zone_csv)?;
    Ok(LoadSummary { trips, zones })
}

fn load_table(client: &mut Client, table: &Table, path: &Path) -> Result<LoadOutcome> {
    let mut tx = client.transaction()?;
    tx.batch_execute(&table.create_sql()?)?;
    tx.commit()?;

    // The emptiness check and the copy share a transaction, so a failed copy
    // leaves the table empty for the next run.
    let mut tx = client.transaction()?;
    let sql = table.has_rows_sql()?;
    let has_rows: bool = tx.query_one(sql.as_str(), &[])?.try_get(0)?;
    if has_rows {
        info!("{} already contains data, skipping load", table.name);
        return Ok(LoadOutcome::Skipped);
    }

    let mut file = File::open(path).map_err(|e| Error::io(path, e))?;
    check_header(table, &mut file)?;
    file.seek(SeekFrom::Start(0)).map_err(|e| Error::io(path, e))?;

    let sql = table.copy_sql()?;
    debug!("{sql} <- {}", path.display());
    let mut writer = tx.copy_in(sql.as_str())?;
    let mut buf = vec![0u8; COPY_CHUNK];
    loop {
        let n = match file.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::io(path, e)),
        };
        writer.write_all(&buf[..n]).map_err(copy_error)?;
    }
    let rows = writer.finish()?;
    tx.commit()?;

    info!("Loaded {rows} rows into {} from {}", table.name, path.display());
    Ok(LoadOutcome::Loaded { rows })
}

const COPY_CHUNK: usize = 64 * 1024;

/// Write errors on a COPY stream carry the server's error when it rejected
/// the data.
fn copy_error(err: io::Error) -> Error {
    let kind = err.kind();
    match err.into_inner() {
        Some(inner) => match inner.downcast::<postgres::Error>() {
            Ok(server) => Error::Postgres(*server),
            Err(inner) => Error::Copy(io::Error::new(kind, inner)),
        },
        None => Error::Copy(kind.into()),
    }
}

/// Fails unless the first CSV record names the table's columns in order.
/// Names are compared ignoring ASCII case, as the server folds them.
pub fn check_header<R: Read>(table: &Table, reader: R) -> Result<()> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(reader);
    let found = reader.headers()?;

    let matches = found.len() == table.columns.len()
        && found
            .iter()
            .zip(table.column_names())
            .all(|(found, expected)| found.trim().eq_ignore_ascii_case(expected));
    if !matches {
        return Err(Error::HeaderMismatch {
            table: table.name,
            expected: table.column_names().collect::<Vec<_>>().join(","),
            found: found.iter().collect::<Vec<_>>().join(","),
        });
    }
    Ok(())
}
