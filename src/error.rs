use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Postgres(#[from] postgres::Error),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("COPY stream failed: {0}")]
    Copy(#[source] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV header for {table} does not match: expected [{expected}], found [{found}]")]
    HeaderMismatch {
        table: &'static str,
        expected: String,
        found: String,
    },

    #[error("invalid identifier {0:?}")]
    InvalidIdent(String),

    #[error("no month follows {0}")]
    MonthOutOfRange(chrono::NaiveDate),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
