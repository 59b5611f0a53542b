//! Error types for registry loading, extraction and export
//!
//! Extraction errors never abort a run: the dispatcher folds every one of
//! them into a failed `SiteOutcome`. Configuration errors are downgraded to
//! empty input by the loaders, and export errors stay inside the sink.

use std::time::Duration;
use thiserror::Error;

/// Result type alias for a single extraction attempt
pub type ExtractionResult<T> = Result<T, ExtractionError>;

/// Why a single extraction attempt produced no usable result
///
/// `Clone` because outcomes carry their error and are copied into the
/// failure log.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    /// The attempt exceeded its time budget
    #[error("extraction timed out after {}s", .after.as_secs_f64())]
    Timeout { after: Duration },

    /// Connection, DNS, TLS or HTTP status failure
    #[error("network error: {0}")]
    Network(String),

    /// The page was fetched but could not be interpreted
    #[error("parse error: {0}")]
    Parse(String),

    /// Missing or invalid per-site configuration (e.g. no rules for a browser site)
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The shared browser runtime could not be started, so the attempt never ran
    #[error("browser runtime unavailable: {0}")]
    RuntimeUnavailable(String),

    /// The run was interrupted before this attempt finished
    #[error("extraction cancelled by shutdown")]
    Cancelled,

    /// The extractor panicked; the panic was contained at the task boundary
    #[error("extractor panicked: {0}")]
    Panicked(String),
}

impl ExtractionError {
    /// Short machine-friendly label, used as a structured log field
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Timeout { .. } => "timeout",
            Self::Network(_) => "network",
            Self::Parse(_) => "parse",
            Self::Configuration(_) => "configuration",
            Self::RuntimeUnavailable(_) => "runtime_unavailable",
            Self::Cancelled => "cancelled",
            Self::Panicked(_) => "panicked",
        }
    }

    /// A browser-tier site with no usable selector set
    #[must_use]
    pub fn missing_rules(site: &str) -> Self {
        Self::Configuration(format!("no extraction rules for '{site}'"))
    }
}

impl From<reqwest::Error> for ExtractionError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Parse(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<chromiumoxide::error::CdpError> for ExtractionError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        match err {
            chromiumoxide::error::CdpError::Serde(e) => Self::Parse(e.to_string()),
            chromiumoxide::error::CdpError::Timeout => Self::Timeout {
                after: Duration::from_secs(crate::utils::BROWSER_REQUEST_TIMEOUT_SECS),
            },
            other => Self::Network(other.to_string()),
        }
    }
}

/// Errors raised while reading the registry, rules, or run configuration
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Registry header lacks one or more required columns
    #[error("registry is missing required columns {missing:?} (found {found:?})")]
    MissingColumns {
        missing: Vec<String>,
        found: Vec<String>,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Errors raised by the result sink; never propagated into the dispatcher
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("IO error writing {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("spreadsheet error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
