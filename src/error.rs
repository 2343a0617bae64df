use thiserror::Error;

use crate::models::RowId;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("I/O error while {context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON error while {context}: {source}")]
    Json {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("CSV error while {context}: {source}")]
    Csv {
        context: &'static str,
        #[source]
        source: csv::Error,
    },
    #[error("database error while {context}: {source}")]
    Database {
        context: &'static str,
        #[source]
        source: sqlx::Error,
    },
    #[error("row index {index} is out of range for a buffer of {len} rows")]
    RowOutOfRange { index: usize, len: usize },
    #[error("no row with id {0} in the edit buffer")]
    UnknownRow(RowId),
    #[error("unknown transcript field `{0}`")]
    UnknownField(String),
    #[error("no curriculum plan for major `{0}`")]
    UnknownMajor(String),
}

impl EngineError {
    pub(crate) fn io(context: &'static str, source: std::io::Error) -> Self {
        Self::Io { context, source }
    }

    pub(crate) fn json(context: &'static str, source: serde_json::Error) -> Self {
        Self::Json { context, source }
    }

    pub(crate) fn csv(context: &'static str, source: csv::Error) -> Self {
        Self::Csv { context, source }
    }

    pub(crate) fn database(context: &'static str, source: sqlx::Error) -> Self {
        Self::Database { context, source }
    }
}
