//! Type-safe builder for `HarvestConfig` using the typestate pattern
//!
//! The registry and output paths must be given, in that order, before
//! `build()` becomes available. Range checks run in `build()`.

use std::marker::PhantomData;
use std::path::PathBuf;

use super::types::HarvestConfig;
use crate::error::ConfigurationError;

// Type states for the builder
pub struct WithRegistry;
pub struct Complete;

pub struct HarvestConfigBuilder<State = ()> {
    pub(crate) registry_path: Option<PathBuf>,
    pub(crate) output_path: Option<PathBuf>,
    /// Optional settings, pre-filled with defaults
    pub(crate) draft: HarvestConfig,
    pub(crate) _phantom: PhantomData<State>,
}

impl Default for HarvestConfigBuilder<()> {
    fn default() -> Self {
        Self {
            registry_path: None,
            output_path: None,
            draft: HarvestConfig::default(),
            _phantom: PhantomData,
        }
    }
}

impl HarvestConfig {
    /// Create a builder for configuring a `HarvestConfig` with a fluent interface
    #[must_use]
    pub fn builder() -> HarvestConfigBuilder<()> {
        HarvestConfigBuilder::default()
    }
}

impl HarvestConfigBuilder<()> {
    pub fn registry_path(self, path: impl Into<PathBuf>) -> HarvestConfigBuilder<WithRegistry> {
        HarvestConfigBuilder {
            registry_path: Some(path.into()),
            output_path: self.output_path,
            draft: self.draft,
            _phantom: PhantomData,
        }
    }
}

impl HarvestConfigBuilder<WithRegistry> {
    pub fn output_path(self, path: impl Into<PathBuf>) -> HarvestConfigBuilder<Complete> {
        HarvestConfigBuilder {
            registry_path: self.registry_path,
            output_path: Some(path.into()),
            draft: self.draft,
            _phantom: PhantomData,
        }
    }
}

// Build method only available when all required fields are set
impl HarvestConfigBuilder<Complete> {
    /// # Errors
    ///
    /// Returns `ConfigurationError::Invalid` when a concurrency setting is
    /// outside `1..=64`, a timeout is zero, or the settle delay bounds are
    /// reversed.
    pub fn build(self) -> Result<HarvestConfig, ConfigurationError> {
        let mut config = self.draft;
        config.registry_path = self
            .registry_path
            .ok_or_else(|| ConfigurationError::Invalid("registry_path is required".into()))?;
        config.output_path = self
            .output_path
            .ok_or_else(|| ConfigurationError::Invalid("output_path is required".into()))?;

        config.validate()?;
        Ok(config)
    }
}

// Optional settings, available in any state
impl<State> HarvestConfigBuilder<State> {
    #[must_use]
    pub fn rules_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.draft.rules_path = Some(path.into());
        self
    }

    /// Maximum simultaneous static-HTML extractions (default: 8)
    #[must_use]
    pub fn light_concurrency(mut self, n: usize) -> Self {
        self.draft.light_concurrency = n;
        self
    }

    /// Maximum simultaneous browser pages (default: 3)
    #[must_use]
    pub fn heavy_concurrency(mut self, n: usize) -> Self {
        self.draft.heavy_concurrency = n;
        self
    }

    /// Maximum simultaneous attempts against one host, per phase (default: 2)
    #[must_use]
    pub fn max_per_domain(mut self, n: usize) -> Self {
        self.draft.max_per_domain = n;
        self
    }

    #[must_use]
    pub fn light_timeout_secs(mut self, secs: u64) -> Self {
        self.draft.light_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn heavy_timeout_secs(mut self, secs: u64) -> Self {
        self.draft.heavy_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.draft.request_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn page_load_timeout_secs(mut self, secs: u64) -> Self {
        self.draft.page_load_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn selector_wait_secs(mut self, secs: u64) -> Self {
        self.draft.selector_wait_secs = secs;
        self
    }

    /// Bounds of the randomised pause after each browser navigation
    ///
    /// # Example
    /// ```rust
    /// # use jobscrape::config::HarvestConfig;
    /// # fn main() -> Result<(), jobscrape::error::ConfigurationError> {
    /// let config = HarvestConfig::builder()
    ///     .registry_path("firms.csv")
    ///     .output_path("out/jobs.xlsx")
    ///     .settle_delay_ms(0, 0) // no pause, e.g. for a local fixture server
    ///     .build()?;
    /// assert_eq!(config.settle_delay_ms(), (0, 0));
    /// # Ok(())
    /// # }
    /// ```
    #[must_use]
    pub fn settle_delay_ms(mut self, min: u64, max: u64) -> Self {
        self.draft.settle_delay_ms = (min, max);
        self
    }

    /// Scroll passes for sites whose rules set `requires_interaction`
    #[must_use]
    pub fn interaction_rounds(mut self, rounds: u32) -> Self {
        self.draft.interaction_rounds = rounds;
        self
    }

    #[must_use]
    pub fn headless(mut self, headless: bool) -> Self {
        self.draft.headless = headless;
        self
    }

    #[must_use]
    pub fn chrome_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.draft.chrome_data_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn user_agents(mut self, agents: Vec<String>) -> Self {
        self.draft.user_agents = agents;
        self
    }
}
