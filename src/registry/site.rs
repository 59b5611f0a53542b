//! Site descriptors and extraction strategies

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

use super::rules::ExtractionRules;

/// How a site is scraped first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Greenhouse-hosted board with the standard `div.opening` markup
    LightStandard,
    /// Arbitrary career page, scraped with generic selectors
    LightCustom,
    /// Rendered in the headless browser with per-site rules
    Heavy,
}

impl Strategy {
    /// Light strategies run in phase one and may escalate
    #[must_use]
    pub fn is_light(self) -> bool {
        matches!(self, Self::LightStandard | Self::LightCustom)
    }
}

impl FromStr for Strategy {
    type Err = String;

    /// Parse a registry `platform_type` value
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "greenhouse_standard" | "greenhouse" => Ok(Self::LightStandard),
            "custom_site" | "custom" => Ok(Self::LightCustom),
            "playwright" | "browser" | "heavy" => Ok(Self::Heavy),
            other => Err(format!("unknown platform_type '{other}'")),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LightStandard => write!(f, "light_standard"),
            Self::LightCustom => write!(f, "light_custom"),
            Self::Heavy => write!(f, "heavy"),
        }
    }
}

/// One target career page
///
/// Built once by the registry loader, read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteDescriptor {
    pub name: String,
    pub url: Url,
    pub strategy: Strategy,
    pub extraction_rules: Option<ExtractionRules>,
}

impl SiteDescriptor {
    #[must_use]
    pub fn new(name: impl Into<String>, url: Url, strategy: Strategy) -> Self {
        Self {
            name: name.into(),
            url,
            strategy,
            extraction_rules: None,
        }
    }

    #[must_use]
    pub fn with_rules(mut self, rules: ExtractionRules) -> Self {
        self.extraction_rules = Some(rules);
        self
    }

    /// Rules the browser tier can act on, if any
    #[must_use]
    pub fn usable_rules(&self) -> Option<&ExtractionRules> {
        self.extraction_rules.as_ref().filter(|r| r.is_usable())
    }

    /// Host used for per-domain concurrency limiting
    #[must_use]
    pub fn domain(&self) -> String {
        let host = self.url.host_str().unwrap_or_default();
        host.strip_prefix("www.").unwrap_or(host).to_lowercase()
    }

    /// Page the browser should render: the rules' override, else the registry URL
    #[must_use]
    pub fn render_url(&self) -> Url {
        self.extraction_rules
            .as_ref()
            .and_then(|r| r.url.as_deref())
            .and_then(|u| Url::parse(u).ok())
            .unwrap_or_else(|| self.url.clone())
    }
}
