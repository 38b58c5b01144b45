//! Error taxonomy for the report pipeline.
//!
//! Every variant is fatal: the pipeline never retries and never writes a
//! partial report.

use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ReportError>;

#[derive(Debug, Error)]
pub enum ReportError {
    /// Fetch failed: unreachable host, transport error or non-success status.
    #[error("failed to fetch {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// A manually provisioned input file is absent.
    #[error("required file {} is missing: {hint}", .path.display())]
    MissingFile { path: PathBuf, hint: String },

    #[error("{file}:{line}: {message}")]
    Parse {
        file: String,
        line: u64,
        message: String,
    },

    /// The inner join on date matched nothing.
    #[error("no {metric} date matches a vaccination-rate date")]
    JoinMismatch { metric: String },

    /// Population share of a vaccination subgroup is zero or out of range.
    #[error("vaccination rate {rate}% on {date} leaves no {status} population to normalize by")]
    Math {
        date: NaiveDate,
        status: String,
        rate: f64,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl ReportError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ReportError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn parse(file: &str, line: u64, message: impl Into<String>) -> Self {
        ReportError::Parse {
            file: file.to_string(),
            line,
            message: message.into(),
        }
    }
}
