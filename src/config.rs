use std::fmt::Debug;

use clap::Args;
use log::debug;
use postgres::{Client, NoTls};

use crate::error::Result;

const APPLICATION_NAME: &str = "green-taxi-reports";

/// Connection parameters for the PostgreSQL server holding the taxi data.
#[derive(Clone, Args)]
pub struct Config {
    /// Database server host
    #[arg(long = "db-host", env = "DB_HOST")]
    pub host: String,

    /// Database server port
    #[arg(long = "db-port", env = "DB_PORT")]
    pub port: u16,

    /// Database holding the taxi tables, created if missing
    #[arg(long = "db-name", env = "DB_NAME")]
    pub name: String,

    #[arg(long = "db-user", env = "DB_USER")]
    pub user: String,

    #[arg(long = "db-password", env = "DB_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Existing database to connect to while creating the target database
    #[arg(long = "db-maintenance", env = "DB_MAINTENANCE_DB", default_value = "postgres")]
    pub maintenance_db: String,
}

impl Config {
    /// Connects to the target database.
    pub fn connect(&self) -> Result<Client> {
        self.connect_to(&self.name)
    }

    /// Connects to the maintenance database, for work that must happen
    /// before the target database exists.
    pub fn connect_server(&self) -> Result<Client> {
        self.connect_to(&self.maintenance_db)
    }

    fn connect_to(&self, dbname: &str) -> Result<Client> {
        debug!("connecting to {}:{}/{}", self.host, self.port, dbname);
        let client = postgres::Config::new()
            .host(&self.host)
            .port(self.port)
            .user(&self.user)
            .password(&self.password)
            .dbname(dbname)
            .application_name(APPLICATION_NAME)
            .connect(NoTls)?;
        Ok(client)
    }
}

impl Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("name", &self.name)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("maintenance_db", &self.maintenance_db)
            .finish()
    }
}
