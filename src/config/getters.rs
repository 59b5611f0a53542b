//! Getter methods for `HarvestConfig`

use std::path::{Path, PathBuf};
use std::time::Duration;

use super::types::HarvestConfig;

impl HarvestConfig {
    #[must_use]
    pub fn registry_path(&self) -> &PathBuf {
        &self.registry_path
    }

    #[must_use]
    pub fn rules_path(&self) -> Option<&Path> {
        self.rules_path.as_deref()
    }

    #[must_use]
    pub fn output_path(&self) -> &PathBuf {
        &self.output_path
    }

    #[must_use]
    pub fn light_concurrency(&self) -> usize {
        self.light_concurrency
    }

    #[must_use]
    pub fn heavy_concurrency(&self) -> usize {
        self.heavy_concurrency
    }

    #[must_use]
    pub fn max_per_domain(&self) -> usize {
        self.max_per_domain
    }

    #[must_use]
    pub fn light_timeout(&self) -> Duration {
        Duration::from_secs(self.light_timeout_secs)
    }

    #[must_use]
    pub fn heavy_timeout(&self) -> Duration {
        Duration::from_secs(self.heavy_timeout_secs)
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    #[must_use]
    pub fn page_load_timeout(&self) -> Duration {
        Duration::from_secs(self.page_load_timeout_secs)
    }

    #[must_use]
    pub fn selector_wait(&self) -> Duration {
        Duration::from_secs(self.selector_wait_secs)
    }

    #[must_use]
    pub fn settle_delay_ms(&self) -> (u64, u64) {
        self.settle_delay_ms
    }

    #[must_use]
    pub fn interaction_rounds(&self) -> u32 {
        self.interaction_rounds
    }

    #[must_use]
    pub fn headless(&self) -> bool {
        self.headless
    }

    #[must_use]
    pub fn chrome_data_dir(&self) -> Option<&Path> {
        self.chrome_data_dir.as_deref()
    }

    #[must_use]
    pub fn user_agents(&self) -> &[String] {
        &self.user_agents
    }
}
