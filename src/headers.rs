//! Rotating request headers
//!
//! The rotation is an immutable value built once from configuration and
//! handed to every extractor call. A site's header set is picked by its
//! registry position, so the choice is deterministic and needs no shared
//! mutable counter.

use serde::{Deserialize, Serialize};

use crate::utils::USER_AGENTS;

/// Browser-like headers sent with every light request
const BASE_HEADERS: &[(&str, &str)] = &[
    (
        "Accept",
        "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
    ),
    ("Accept-Language", "en-US,en;q=0.9"),
    ("Cache-Control", "no-cache"),
    ("Pragma", "no-cache"),
    ("DNT", "1"),
];

/// One concrete set of headers for one request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderSet {
    pub user_agent: String,
    pub extra: Vec<(String, String)>,
}

impl HeaderSet {
    /// All headers, user agent first
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        std::iter::once(("User-Agent", self.user_agent.as_str()))
            .chain(self.extra.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }
}

/// Immutable list of candidate user agents
///
/// (De)serializes as a plain list; deserialization goes through [`HeaderRotation::new`],
/// so the rotation is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct HeaderRotation {
    user_agents: Vec<String>,
}

impl HeaderRotation {
    /// Build a rotation from the given agents; an empty list falls back to the defaults
    #[must_use]
    pub fn new(user_agents: Vec<String>) -> Self {
        if user_agents.is_empty() {
            return Self::default();
        }
        Self { user_agents }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.user_agents.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.user_agents.is_empty()
    }

    /// Header set for the site at registry position `index` (round robin)
    #[must_use]
    pub fn for_index(&self, index: usize) -> HeaderSet {
        let user_agent = self.user_agents[index % self.user_agents.len()].clone();
        HeaderSet {
            user_agent,
            extra: BASE_HEADERS
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        }
    }
}

impl From<Vec<String>> for HeaderRotation {
    fn from(user_agents: Vec<String>) -> Self {
        Self::new(user_agents)
    }
}

impl From<HeaderRotation> for Vec<String> {
    fn from(rotation: HeaderRotation) -> Self {
        rotation.user_agents
    }
}

impl Default for HeaderRotation {
    fn default() -> Self {
        Self {
            user_agents: USER_AGENTS.iter().map(|ua| (*ua).to_string()).collect(),
        }
    }
}
