//! Run configuration for one harvest

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::utils::{
    DEFAULT_HEAVY_CONCURRENCY, DEFAULT_HEAVY_TIMEOUT_SECS, DEFAULT_LIGHT_CONCURRENCY,
    DEFAULT_LIGHT_TIMEOUT_SECS, DEFAULT_MAX_PER_DOMAIN, DEFAULT_OUTPUT_PATH,
    DEFAULT_PAGE_LOAD_TIMEOUT_SECS, DEFAULT_REGISTRY_PATH, DEFAULT_REQUEST_TIMEOUT_SECS,
    DEFAULT_SELECTOR_WAIT_SECS, DEFAULT_SETTLE_DELAY_MS,
};

/// Everything a run needs besides the registry contents
///
/// Build it with [`HarvestConfig::builder`], which validates ranges; the
/// `Default` value is already valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    pub(crate) registry_path: PathBuf,
    /// JSON rules book; `None` means no site has browser rules
    pub(crate) rules_path: Option<PathBuf>,
    pub(crate) output_path: PathBuf,

    pub(crate) light_concurrency: usize,
    pub(crate) heavy_concurrency: usize,
    pub(crate) max_per_domain: usize,

    pub(crate) light_timeout_secs: u64,
    pub(crate) heavy_timeout_secs: u64,
    pub(crate) request_timeout_secs: u64,
    pub(crate) page_load_timeout_secs: u64,
    pub(crate) selector_wait_secs: u64,

    /// Inclusive bounds of the post-navigation settle delay; `(0, 0)` disables it
    pub(crate) settle_delay_ms: (u64, u64),
    pub(crate) interaction_rounds: u32,
    pub(crate) headless: bool,
    pub(crate) chrome_data_dir: Option<PathBuf>,

    /// Overrides the built-in user-agent list when non-empty
    pub(crate) user_agents: Vec<String>,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            registry_path: PathBuf::from(DEFAULT_REGISTRY_PATH),
            rules_path: None,
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            light_concurrency: DEFAULT_LIGHT_CONCURRENCY,
            heavy_concurrency: DEFAULT_HEAVY_CONCURRENCY,
            max_per_domain: DEFAULT_MAX_PER_DOMAIN,
            light_timeout_secs: DEFAULT_LIGHT_TIMEOUT_SECS,
            heavy_timeout_secs: DEFAULT_HEAVY_TIMEOUT_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            page_load_timeout_secs: DEFAULT_PAGE_LOAD_TIMEOUT_SECS,
            selector_wait_secs: DEFAULT_SELECTOR_WAIT_SECS,
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            interaction_rounds: 5,
            headless: true,
            chrome_data_dir: None,
            user_agents: Vec::new(),
        }
    }
}
