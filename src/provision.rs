use log::{debug, info};

use crate::{config::Config, error::Result, ident::Ident};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Provisioned {
    Created,
    AlreadyExists,
}

/// Creates the configured database unless the server already has one with
/// exactly that name. Never touches an existing database.
///
/// The lookup binds the name as given; only a name that has to be created
/// must be a plain identifier. Runs against the maintenance database with
/// every statement auto-committed, since `CREATE DATABASE` is rejected inside
/// a transaction block.
pub fn ensure_database_exists(config: &Config) -> Result<Provisioned> {
    let mut client = config.connect_server()?;

    let existing = client.query_opt(
        "SELECT 1 FROM pg_database WHERE datname = $1",
        &[&config.name],
    )?;
    if existing.is_some() {
        info!("Database {} already exists", config.name);
        return Ok(Provisioned::AlreadyExists);
    }

    let name = Ident::parse(&config.name)?;
    let sql = format!("CREATE DATABASE {name}");
    debug!("{sql}");
    client.batch_execute(&sql)?;
    info!("Database {} created", name.as_str());
    Ok(Provisioned::Created)
}
