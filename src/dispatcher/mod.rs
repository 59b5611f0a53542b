//! Extraction dispatch: tiering, bounded concurrency, escalation and merge

pub mod domain_limiter;
pub mod escalation;
pub mod orchestrator;
pub mod outcome;
pub mod pool;

pub use domain_limiter::DomainLimiter;
pub use escalation::{needs_escalation, select_final};
pub use orchestrator::{DispatchOptions, Dispatcher};
pub use outcome::{FailureEntry, OutcomeStatus, RunResult, SiteOutcome, Tier};
pub use pool::{PhaseJob, PhaseReport, WorkerPool};
