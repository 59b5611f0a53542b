//! Per-attempt outcomes and the merged run result

use serde::Serialize;
use std::fmt;
use std::fmt::Write as _;

use crate::error::ExtractionError;
use crate::record::JobRecord;

/// Which extractor produced an outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Light,
    Heavy,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Light => f.write_str("light"),
            Self::Heavy => f.write_str("heavy"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Ok,
    Empty,
    Failed,
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => f.write_str("ok"),
            Self::Empty => f.write_str("empty"),
            Self::Failed => f.write_str("failed"),
        }
    }
}

/// The result of one extraction attempt for one site
///
/// Fields are private so the status, records, and error always agree:
/// `error` is present exactly when the status is `Failed`, and a failed
/// outcome carries no records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteOutcome {
    site: String,
    strategy_used: Tier,
    records: Vec<JobRecord>,
    status: OutcomeStatus,
    #[serde(serialize_with = "serialize_error")]
    error: Option<ExtractionError>,
}

fn serialize_error<S: serde::Serializer>(
    error: &Option<ExtractionError>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match error {
        Some(e) => serializer.serialize_some(&e.to_string()),
        None => serializer.serialize_none(),
    }
}

impl SiteOutcome {
    /// Successful attempt; `Ok` with records, `Empty` without
    #[must_use]
    pub fn completed(site: impl Into<String>, tier: Tier, records: Vec<JobRecord>) -> Self {
        let status = if records.is_empty() {
            OutcomeStatus::Empty
        } else {
            OutcomeStatus::Ok
        };
        Self {
            site: site.into(),
            strategy_used: tier,
            records,
            status,
            error: None,
        }
    }

    #[must_use]
    pub fn failed(site: impl Into<String>, tier: Tier, error: ExtractionError) -> Self {
        Self {
            site: site.into(),
            strategy_used: tier,
            records: Vec::new(),
            status: OutcomeStatus::Failed,
            error: Some(error),
        }
    }

    /// Fold an extractor result into an outcome
    #[must_use]
    pub fn from_result(
        site: impl Into<String>,
        tier: Tier,
        result: Result<Vec<JobRecord>, ExtractionError>,
    ) -> Self {
        match result {
            Ok(records) => Self::completed(site, tier, records),
            Err(e) => Self::failed(site, tier, e),
        }
    }

    #[must_use]
    pub fn site(&self) -> &str {
        &self.site
    }

    #[must_use]
    pub fn strategy_used(&self) -> Tier {
        self.strategy_used
    }

    #[must_use]
    pub fn status(&self) -> OutcomeStatus {
        self.status
    }

    #[must_use]
    pub fn records(&self) -> &[JobRecord] {
        &self.records
    }

    #[must_use]
    pub fn error(&self) -> Option<&ExtractionError> {
        self.error.as_ref()
    }

    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status == OutcomeStatus::Ok
    }

    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.status == OutcomeStatus::Failed
    }

    pub(crate) fn into_parts(self) -> (String, Vec<JobRecord>, Option<ExtractionError>) {
        (self.site, self.records, self.error)
    }
}

/// One site that ended the run without a usable result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureEntry {
    pub site: String,
    #[serde(serialize_with = "serialize_failure")]
    pub error: ExtractionError,
}

fn serialize_failure<S: serde::Serializer>(
    error: &ExtractionError,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&error.to_string())
}

/// Merged dataset and failure log of one batch
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunResult {
    /// Records in registry order, each site's records in extractor order
    pub records: Vec<JobRecord>,
    /// Failed sites in registry order
    pub failures: Vec<FailureEntry>,
    /// A shutdown signal cut the run short
    pub interrupted: bool,
}

impl RunResult {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty() && self.failures.is_empty()
    }

    /// Human-readable `site -> reason` listing, empty when nothing failed
    #[must_use]
    pub fn failure_summary(&self) -> String {
        let mut out = String::new();
        if self.failures.is_empty() {
            return out;
        }

        let _ = writeln!(out, "{} site(s) failed:", self.failures.len());
        for entry in &self.failures {
            let _ = writeln!(
                out,
                "  {} -> [{}] {}",
                entry.site,
                entry.error.kind(),
                entry.error
            );
        }
        out
    }
}
