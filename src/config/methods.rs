//! Validation and the per-component option sets derived from `HarvestConfig`

use super::types::HarvestConfig;
use crate::dispatcher::DispatchOptions;
use crate::error::ConfigurationError;
use crate::extractors::{HeavyOptions, HttpLightExtractor};
use crate::headers::HeaderRotation;
use crate::utils::MAX_CONCURRENCY;

impl HarvestConfig {
    /// Check ranges: concurrency in `1..=64`, every timeout non-zero
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::Invalid` naming the first offending setting.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        for (name, value) in [
            ("light_concurrency", self.light_concurrency),
            ("heavy_concurrency", self.heavy_concurrency),
            ("max_per_domain", self.max_per_domain),
        ] {
            if !(1..=MAX_CONCURRENCY).contains(&value) {
                return Err(ConfigurationError::Invalid(format!(
                    "{name} must be between 1 and {MAX_CONCURRENCY}, got {value}"
                )));
            }
        }

        for (name, value) in [
            ("light_timeout_secs", self.light_timeout_secs),
            ("heavy_timeout_secs", self.heavy_timeout_secs),
            ("request_timeout_secs", self.request_timeout_secs),
            ("page_load_timeout_secs", self.page_load_timeout_secs),
            ("selector_wait_secs", self.selector_wait_secs),
        ] {
            if value == 0 {
                return Err(ConfigurationError::Invalid(format!(
                    "{name} must be greater than zero"
                )));
            }
        }

        let (min, max) = self.settle_delay_ms;
        if min > max {
            return Err(ConfigurationError::Invalid(format!(
                "settle delay lower bound {min}ms exceeds upper bound {max}ms"
            )));
        }

        Ok(())
    }

    #[must_use]
    pub fn dispatch_options(&self) -> DispatchOptions {
        DispatchOptions {
            light_concurrency: self.light_concurrency,
            heavy_concurrency: self.heavy_concurrency,
            max_per_domain: self.max_per_domain,
            light_timeout: self.light_timeout(),
            heavy_timeout: self.heavy_timeout(),
        }
    }

    #[must_use]
    pub fn heavy_options(&self) -> HeavyOptions {
        HeavyOptions {
            headless: self.headless,
            page_load_timeout: self.page_load_timeout(),
            selector_wait: self.selector_wait(),
            settle_delay_ms: self.settle_delay_ms,
            interaction_rounds: self.interaction_rounds,
            chrome_data_dir: self.chrome_data_dir.clone(),
        }
    }

    #[must_use]
    pub fn light_extractor(&self) -> HttpLightExtractor {
        HttpLightExtractor::new(self.request_timeout())
    }

    #[must_use]
    pub fn header_rotation(&self) -> HeaderRotation {
        HeaderRotation::new(self.user_agents.clone())
    }
}
