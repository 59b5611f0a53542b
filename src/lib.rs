pub mod browser_setup;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod extractors;
pub mod headers;
pub mod record;
pub mod registry;
pub mod sink;
pub mod utils;

pub use browser_setup::{download_managed_browser, find_browser_executable, launch_browser};
pub use config::HarvestConfig;
pub use dispatcher::{
    DispatchOptions, Dispatcher, FailureEntry, OutcomeStatus, RunResult, SiteOutcome, Tier,
    needs_escalation, select_final,
};
pub use error::{ConfigurationError, ExportError, ExtractionError, ExtractionResult};
pub use extractors::{
    ChromiumRuntime, HeavyOptions, HeavyRuntime, HeavySession, HttpLightExtractor, LightExtractor,
};
pub use headers::{HeaderRotation, HeaderSet};
pub use record::JobRecord;
pub use registry::{ExtractionRules, RulesBook, SiteDescriptor, Strategy, load_registry};
pub use sink::{ExportFormat, ExportReport, export_jobs};
