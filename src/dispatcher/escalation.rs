//! Escalation and merge decisions
//!
//! Both functions are pure so the dispatcher's policy can be tested with
//! hand-built outcomes.

use super::outcome::{OutcomeStatus, SiteOutcome};
use crate::registry::{SiteDescriptor, Strategy};

/// Should this site be retried with the browser tier?
///
/// True iff the attempt came back `Empty` or `Failed` and the site was not
/// already assigned to the browser tier.
#[must_use]
pub fn needs_escalation(outcome: &SiteOutcome, descriptor: &SiteDescriptor) -> bool {
    descriptor.strategy != Strategy::Heavy
        && matches!(
            outcome.status(),
            OutcomeStatus::Empty | OutcomeStatus::Failed
        )
}

/// Pick the outcome that represents a site in the run result
///
/// The browser outcome supersedes the light one, except when the browser
/// failed and the light attempt had produced records.
#[must_use]
pub fn select_final(
    light: Option<SiteOutcome>,
    heavy: Option<SiteOutcome>,
) -> Option<SiteOutcome> {
    match (light, heavy) {
        (Some(light), Some(heavy)) => {
            if heavy.is_failed() && light.is_ok() {
                Some(light)
            } else {
                Some(heavy)
            }
        }
        (light, None) => light,
        (None, heavy) => heavy,
    }
}
