//! The job listing emitted by extractors

use serde::{Deserialize, Serialize};

use crate::utils::{UNKNOWN_LOCATION, clean_title};

/// One discovered listing
///
/// `firm` is the registry name of the site it came from and `link` is
/// always absolute.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobRecord {
    pub firm: String,
    pub title: String,
    pub location: String,
    pub link: String,
}

impl JobRecord {
    /// Build a record, normalising whitespace and defaulting the location
    #[must_use]
    pub fn new(
        firm: impl Into<String>,
        title: &str,
        location: Option<&str>,
        link: impl Into<String>,
    ) -> Self {
        let location = location
            .map(clean_title)
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| UNKNOWN_LOCATION.to_string());

        Self {
            firm: firm.into(),
            title: clean_title(title),
            location,
            link: link.into(),
        }
    }
}
