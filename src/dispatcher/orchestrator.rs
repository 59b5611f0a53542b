//! Two-phase extraction run
//!
//! Phase 1 runs every light-tier site on the blocking pool. Sites that came
//! back empty or failed, together with the browser-assigned sites, form the
//! escalation set for phase 2, which shares one browser runtime across
//! bounded async tasks. The outcomes are merged per site in registry order.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::escalation::{needs_escalation, select_final};
use super::outcome::{FailureEntry, RunResult, SiteOutcome, Tier};
use super::pool::{PhaseJob, WorkerPool};
use crate::error::ExtractionError;
use crate::extractors::{HeavyRuntime, LightExtractor};
use crate::headers::HeaderRotation;
use crate::registry::{SiteDescriptor, Strategy};
use crate::utils::{
    DEFAULT_HEAVY_CONCURRENCY, DEFAULT_HEAVY_TIMEOUT_SECS, DEFAULT_LIGHT_CONCURRENCY,
    DEFAULT_LIGHT_TIMEOUT_SECS, DEFAULT_MAX_PER_DOMAIN,
};

/// Caps and time budgets for both phases
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOptions {
    pub light_concurrency: usize,
    pub heavy_concurrency: usize,
    pub max_per_domain: usize,
    pub light_timeout: Duration,
    pub heavy_timeout: Duration,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            light_concurrency: DEFAULT_LIGHT_CONCURRENCY,
            heavy_concurrency: DEFAULT_HEAVY_CONCURRENCY,
            max_per_domain: DEFAULT_MAX_PER_DOMAIN,
            light_timeout: Duration::from_secs(DEFAULT_LIGHT_TIMEOUT_SECS),
            heavy_timeout: Duration::from_secs(DEFAULT_HEAVY_TIMEOUT_SECS),
        }
    }
}

/// Runs one batch of sites through both tiers
///
/// The dispatcher only schedules; the extractors are injected, so the same
/// code drives the real HTTP and browser drivers and the fakes in tests.
pub struct Dispatcher {
    light: Arc<dyn LightExtractor>,
    heavy: Arc<dyn HeavyRuntime>,
    headers: HeaderRotation,
    options: DispatchOptions,
}

impl Dispatcher {
    #[must_use]
    pub fn new(
        light: Arc<dyn LightExtractor>,
        heavy: Arc<dyn HeavyRuntime>,
        headers: HeaderRotation,
        options: DispatchOptions,
    ) -> Self {
        Self {
            light,
            heavy,
            headers,
            options,
        }
    }

    #[must_use]
    pub fn options(&self) -> &DispatchOptions {
        &self.options
    }

    /// Extract every site and merge the results
    ///
    /// Never fails: per-site errors, timeouts and panics become failure
    /// entries, and a cancelled token yields whatever finished so far with
    /// `interrupted` set.
    pub async fn run(&self, sites: Vec<SiteDescriptor>, cancel: &CancellationToken) -> RunResult {
        let start = Instant::now();
        let sites: Vec<Arc<SiteDescriptor>> = sites.into_iter().map(Arc::new).collect();
        if sites.is_empty() {
            info!("No sites to extract");
            return RunResult {
                interrupted: cancel.is_cancelled(),
                ..RunResult::default()
            };
        }

        let light_jobs: Vec<PhaseJob> = sites
            .iter()
            .enumerate()
            .filter(|(_, site)| site.strategy.is_light())
            .map(|(index, site)| self.job(index, site))
            .collect();
        info!(
            sites = sites.len(),
            light = light_jobs.len(),
            heavy = sites.len() - light_jobs.len(),
            "Starting extraction run"
        );

        // Phase 1
        let mut light_outcomes: Vec<Option<SiteOutcome>> = vec![None; sites.len()];
        if !light_jobs.is_empty() {
            let pool = WorkerPool::new(
                Tier::Light,
                self.options.light_concurrency,
                self.options.max_per_domain,
                self.options.light_timeout,
            );
            let extractor = Arc::clone(&self.light);
            let report = pool
                .run_blocking(light_jobs, cancel, move |site, headers| {
                    extractor.extract(site, headers)
                })
                .await;
            for (index, outcome) in report.outcomes {
                light_outcomes[index] = Some(outcome);
            }
        }

        // Escalation set: browser-assigned sites first, then escalated light sites
        let mut queued = vec![false; sites.len()];
        let mut escalation = Vec::new();
        for (index, site) in sites.iter().enumerate() {
            if site.strategy == Strategy::Heavy {
                queued[index] = true;
                escalation.push(index);
            }
        }
        for (index, site) in sites.iter().enumerate() {
            let Some(outcome) = &light_outcomes[index] else {
                continue;
            };
            if needs_escalation(outcome, site) && !queued[index] {
                info!(
                    site = %site.name,
                    status = %outcome.status(),
                    "Escalating to browser tier"
                );
                queued[index] = true;
                escalation.push(index);
            }
        }

        // Phase 2
        let mut heavy_outcomes: Vec<Option<SiteOutcome>> = vec![None; sites.len()];
        if !escalation.is_empty() {
            let jobs = escalation
                .iter()
                .map(|&index| self.job(index, &sites[index]))
                .collect();
            for (index, outcome) in self.run_heavy_phase(jobs, cancel).await {
                heavy_outcomes[index] = Some(outcome);
            }
        }

        // Merge
        let mut result = RunResult::default();
        for (light, heavy) in light_outcomes.into_iter().zip(heavy_outcomes) {
            let Some(kept) = select_final(light, heavy) else {
                continue;
            };
            let (site, records, error) = kept.into_parts();
            result.records.extend(records);
            if let Some(error) = error {
                result.failures.push(FailureEntry { site, error });
            }
        }
        result.interrupted = cancel.is_cancelled();

        if result.interrupted {
            warn!(
                records = result.records.len(),
                failures = result.failures.len(),
                "Extraction run interrupted; returning partial results"
            );
        } else {
            info!(
                records = result.records.len(),
                failures = result.failures.len(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Extraction run complete"
            );
        }
        result
    }

    fn job(&self, index: usize, site: &Arc<SiteDescriptor>) -> PhaseJob {
        PhaseJob {
            index,
            site: Arc::clone(site),
            headers: self.headers.for_index(index),
        }
    }

    /// Launch the browser runtime once, run every escalated site, close it once
    ///
    /// Sites without usable rules fail up front; if none are left the
    /// runtime is never launched.
    async fn run_heavy_phase(
        &self,
        jobs: Vec<PhaseJob>,
        cancel: &CancellationToken,
    ) -> Vec<(usize, SiteOutcome)> {
        let (jobs, unruled): (Vec<_>, Vec<_>) = jobs
            .into_iter()
            .partition(|job| job.site.usable_rules().is_some());
        let mut outcomes: Vec<(usize, SiteOutcome)> = unruled
            .into_iter()
            .map(|job| {
                warn!(site = %job.site.name, "No extraction rules; skipping browser attempt");
                let cause = ExtractionError::missing_rules(&job.site.name);
                (job.index, SiteOutcome::failed(job.site.name.clone(), Tier::Heavy, cause))
            })
            .collect();
        if jobs.is_empty() {
            return outcomes;
        }

        outcomes.extend(self.launch_and_extract(jobs, cancel).await);
        outcomes
    }

    async fn launch_and_extract(
        &self,
        jobs: Vec<PhaseJob>,
        cancel: &CancellationToken,
    ) -> Vec<(usize, SiteOutcome)> {
        let launched = tokio::select! {
            biased;
            () = cancel.cancelled() => None,
            launched = self.heavy.launch() => Some(launched),
        };

        let session = match launched {
            None => {
                info!(sites = jobs.len(), "Browser phase skipped; run interrupted");
                return fail_all(jobs, &ExtractionError::Cancelled);
            }
            Some(Err(e)) => {
                let cause = match e {
                    ExtractionError::RuntimeUnavailable(_) => e,
                    other => ExtractionError::RuntimeUnavailable(other.to_string()),
                };
                error!(sites = jobs.len(), "Browser runtime failed to start: {cause}");
                return fail_all(jobs, &cause);
            }
            Some(Ok(session)) => session,
        };

        let pool = WorkerPool::new(
            Tier::Heavy,
            self.options.heavy_concurrency,
            self.options.max_per_domain,
            self.options.heavy_timeout,
        );
        let shared = Arc::clone(&session);
        let report = pool
            .run_async(jobs, cancel, move |site, headers| {
                let session = Arc::clone(&shared);
                async move { session.extract(&site, &headers).await }
            })
            .await;

        session.close().await;
        report.outcomes
    }
}

fn fail_all(jobs: Vec<PhaseJob>, cause: &ExtractionError) -> Vec<(usize, SiteOutcome)> {
    jobs.into_iter()
        .map(|job| {
            let outcome = SiteOutcome::failed(job.site.name.clone(), Tier::Heavy, cause.clone());
            (job.index, outcome)
        })
        .collect()
}
