//! Per-site browser extraction rules
//!
//! Rules are a JSON object keyed by firm name:
//!
//! ```json
//! {
//!   "Two Sigma": {
//!     "url": "https://www.twosigma.com/careers/open-roles/",
//!     "job_card_selector": "div.role-card-container",
//!     "title_selector": "h3",
//!     "location_selector": "div.location-text",
//!     "requires_interaction": false
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

use crate::error::ConfigurationError;

/// Title selector value meaning "use the card's own text"
pub const CARD_TEXT_SELECTOR: &str = "text";

/// Selectors the browser tier uses to pull listings off a rendered page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionRules {
    /// Optional page to render instead of the registry URL
    #[serde(default)]
    pub url: Option<String>,
    pub job_card_selector: String,
    #[serde(default = "default_title_selector")]
    pub title_selector: String,
    #[serde(default)]
    pub location_selector: Option<String>,
    #[serde(default)]
    pub link_selector: Option<String>,
    /// Page only populates its listing after scrolling
    #[serde(default)]
    pub requires_interaction: bool,
}

fn default_title_selector() -> String {
    CARD_TEXT_SELECTOR.to_string()
}

impl ExtractionRules {
    #[must_use]
    pub fn new(job_card_selector: impl Into<String>, title_selector: impl Into<String>) -> Self {
        Self {
            url: None,
            job_card_selector: job_card_selector.into(),
            title_selector: title_selector.into(),
            location_selector: None,
            link_selector: None,
            requires_interaction: false,
        }
    }

    /// A rule set is usable only with a card selector
    #[must_use]
    pub fn is_usable(&self) -> bool {
        !self.job_card_selector.trim().is_empty()
    }
}

/// All known rule sets, keyed by firm name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RulesBook {
    rules: HashMap<String, ExtractionRules>,
}

impl RulesBook {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, firm: impl Into<String>, rules: ExtractionRules) -> Self {
        self.rules.insert(firm.into(), rules);
        self
    }

    #[must_use]
    pub fn get(&self, firm: &str) -> Option<&ExtractionRules> {
        self.rules.get(firm)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Parse a rules book from JSON text, dropping entries without a card selector
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a JSON object of rule sets.
    pub fn from_json(text: &str) -> Result<Self, ConfigurationError> {
        let mut book: Self = serde_json::from_str(text)?;
        book.rules.retain(|firm, rules| {
            let usable = rules.is_usable();
            if !usable {
                warn!(firm = %firm, "Dropping rule set with empty job_card_selector");
            }
            usable
        });
        Ok(book)
    }

    /// Read a rules file, strictly
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn try_load(path: &Path) -> Result<Self, ConfigurationError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigurationError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Read a rules file; any failure yields an empty book and a warning
    #[must_use]
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(book) => {
                info!(path = %path.display(), count = book.len(), "Loaded extraction rules");
                book
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Could not load extraction rules; browser sites will fail");
                Self::default()
            }
        }
    }
}
