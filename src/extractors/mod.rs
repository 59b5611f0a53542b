//! Extraction drivers and the seams the dispatcher calls them through
//!
//! The dispatcher only decides *when* each driver runs. The traits below are
//! the whole contract: a blocking light extractor, and a heavy runtime that
//! is launched once per run and hands out a session shared by every browser
//! attempt.

pub mod heavy;
pub mod light;

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::ExtractionResult;
use crate::headers::HeaderSet;
use crate::record::JobRecord;
use crate::registry::SiteDescriptor;

pub use heavy::{ChromiumRuntime, ChromiumSession, HeavyOptions};
pub use light::{HttpLightExtractor, parse_generic_listings, parse_greenhouse_listings};

/// Cheap static-HTML extraction with a blocking call pattern
///
/// Called from the blocking worker pool, never directly on the async
/// scheduler.
pub trait LightExtractor: Send + Sync + 'static {
    /// Fetch and parse one site
    ///
    /// # Errors
    ///
    /// Returns an error for network, HTTP status, or parse failures.
    /// Finding no listings is `Ok(vec![])`, not an error.
    fn extract(&self, site: &SiteDescriptor, headers: &HeaderSet)
    -> ExtractionResult<Vec<JobRecord>>;
}

/// Factory for the shared browser runtime
#[async_trait]
pub trait HeavyRuntime: Send + Sync {
    /// Start the runtime; called at most once per run
    ///
    /// # Errors
    ///
    /// Returns `ExtractionError::RuntimeUnavailable` when the engine cannot start.
    async fn launch(&self) -> ExtractionResult<Arc<dyn HeavySession>>;
}

/// A running browser runtime shared by all heavy attempts of one phase
#[async_trait]
pub trait HeavySession: Send + Sync {
    /// Render one site and extract its listings
    ///
    /// # Errors
    ///
    /// Returns an error for navigation, configuration, or script failures.
    async fn extract(
        &self,
        site: &SiteDescriptor,
        headers: &HeaderSet,
    ) -> ExtractionResult<Vec<JobRecord>>;

    /// Tear the runtime down; called exactly once after every attempt has finished
    async fn close(&self);
}
