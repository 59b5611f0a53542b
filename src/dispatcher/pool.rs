//! Bounded fan-out / fan-in for one extraction phase
//!
//! Jobs are admitted in submission order through a FIFO semaphore sized to
//! the phase cap, then through the per-domain limiter. Each admitted job runs
//! under a supervisor task that races the attempt against its timeout and
//! the cancellation token, so every job yields exactly one outcome no matter
//! how the attempt ends.
//!
//! Two attempt kinds share the machinery:
//! - blocking attempts go to the blocking pool (`spawn_blocking`)
//! - async attempts run as ordinary tasks (`tokio::spawn`)

use futures::FutureExt;
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use super::domain_limiter::DomainLimiter;
use super::outcome::{SiteOutcome, Tier};
use crate::error::{ExtractionError, ExtractionResult};
use crate::headers::HeaderSet;
use crate::record::JobRecord;
use crate::registry::SiteDescriptor;

type AttemptHandle = JoinHandle<ExtractionResult<Vec<JobRecord>>>;

/// One site submitted to a phase, tagged with its registry position
#[derive(Debug, Clone)]
pub struct PhaseJob {
    pub index: usize,
    pub site: Arc<SiteDescriptor>,
    pub headers: HeaderSet,
}

/// Outcomes of one phase keyed by registry position, in completion order
#[derive(Debug, Default)]
pub struct PhaseReport {
    pub outcomes: Vec<(usize, SiteOutcome)>,
    pub interrupted: bool,
}

/// Concurrency-bounded executor for one tier
pub struct WorkerPool {
    tier: Tier,
    slots: Arc<Semaphore>,
    limiter: Arc<DomainLimiter>,
    attempt_timeout: Duration,
}

impl WorkerPool {
    #[must_use]
    pub fn new(
        tier: Tier,
        concurrency: usize,
        max_per_domain: usize,
        attempt_timeout: Duration,
    ) -> Self {
        Self {
            tier,
            slots: Arc::new(Semaphore::new(concurrency.max(1))),
            limiter: Arc::new(DomainLimiter::new(max_per_domain)),
            attempt_timeout,
        }
    }

    /// Run a blocking extractor for every job on the blocking pool
    pub async fn run_blocking<F>(
        &self,
        jobs: Vec<PhaseJob>,
        cancel: &CancellationToken,
        extract: F,
    ) -> PhaseReport
    where
        F: Fn(&SiteDescriptor, &HeaderSet) -> ExtractionResult<Vec<JobRecord>>
            + Send
            + Sync
            + 'static,
    {
        let extract = Arc::new(extract);
        self.run(jobs, cancel, move |site, headers| {
            let extract = Arc::clone(&extract);
            tokio::task::spawn_blocking(move || extract(&site, &headers))
        })
        .await
    }

    /// Run an async extractor for every job as a native task
    pub async fn run_async<F, Fut>(
        &self,
        jobs: Vec<PhaseJob>,
        cancel: &CancellationToken,
        extract: F,
    ) -> PhaseReport
    where
        F: Fn(Arc<SiteDescriptor>, HeaderSet) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ExtractionResult<Vec<JobRecord>>> + Send + 'static,
    {
        self.run(jobs, cancel, move |site, headers| {
            tokio::spawn(extract(site, headers))
        })
        .await
    }

    async fn run<S>(&self, jobs: Vec<PhaseJob>, cancel: &CancellationToken, start: S) -> PhaseReport
    where
        S: Fn(Arc<SiteDescriptor>, HeaderSet) -> AttemptHandle + Send + Sync + 'static,
    {
        let start = Arc::new(start);
        let mut report = PhaseReport {
            outcomes: Vec::with_capacity(jobs.len()),
            interrupted: false,
        };
        let mut in_flight = FuturesUnordered::new();
        let mut pending = jobs.into_iter();

        // Submission: one slot per job, in order
        for job in pending.by_ref() {
            let slot = tokio::select! {
                biased;
                () = cancel.cancelled() => None,
                permit = Arc::clone(&self.slots).acquire_owned() => permit.ok(),
            };
            let Some(slot) = slot else {
                report
                    .outcomes
                    .push((job.index, self.abandoned(&job.site.name)));
                break;
            };

            let index = job.index;
            let site = job.site.name.clone();
            let supervisor = tokio::spawn(supervise(
                job,
                self.tier,
                self.attempt_timeout,
                Arc::clone(&self.limiter),
                cancel.clone(),
                Arc::clone(&start),
                slot,
            ));
            in_flight.push(supervisor.map(move |joined| (index, site, joined)));
        }

        // Jobs that never got a slot
        for job in pending {
            report
                .outcomes
                .push((job.index, self.abandoned(&job.site.name)));
        }

        // Fan-in
        while let Some((index, site, joined)) = in_flight.next().await {
            let outcome = joined.unwrap_or_else(|e| {
                error!(site = %site, tier = %self.tier, "Attempt supervisor failed: {e}");
                SiteOutcome::failed(site, self.tier, join_error(e))
            });
            report.outcomes.push((index, outcome));
        }

        report.interrupted = cancel.is_cancelled();
        report
    }

    fn abandoned(&self, site: &str) -> SiteOutcome {
        debug!(site, tier = %self.tier, "Attempt not started; run interrupted");
        SiteOutcome::failed(site, self.tier, ExtractionError::Cancelled)
    }
}

/// Drive one attempt to exactly one outcome
async fn supervise<S>(
    job: PhaseJob,
    tier: Tier,
    attempt_timeout: Duration,
    limiter: Arc<DomainLimiter>,
    cancel: CancellationToken,
    start: Arc<S>,
    _slot: OwnedSemaphorePermit,
) -> SiteOutcome
where
    S: Fn(Arc<SiteDescriptor>, HeaderSet) -> AttemptHandle + Send + Sync + 'static,
{
    let PhaseJob { site, headers, .. } = job;
    let name = site.name.clone();
    let domain = site.domain();

    let domain_slot = tokio::select! {
        biased;
        () = cancel.cancelled() => None,
        permit = limiter.acquire(&domain) => Some(permit),
    };
    let Some(_domain_slot) = domain_slot else {
        return SiteOutcome::failed(name, tier, ExtractionError::Cancelled);
    };

    let mut handle = start(site, headers);
    let joined = tokio::select! {
        biased;
        () = cancel.cancelled() => None,
        joined = tokio::time::timeout(attempt_timeout, &mut handle) => Some(joined),
    };

    // A blocking call that is already running cannot be stopped; abort only
    // detaches it and its eventual result is dropped
    let result = match joined {
        None => {
            handle.abort();
            Err(ExtractionError::Cancelled)
        }
        Some(Err(_elapsed)) => {
            handle.abort();
            Err(ExtractionError::Timeout {
                after: attempt_timeout,
            })
        }
        Some(Ok(Ok(result))) => result,
        Some(Ok(Err(e))) => Err(join_error(e)),
    };

    let outcome = SiteOutcome::from_result(name, tier, result);
    match outcome.error() {
        Some(e) => warn!(
            site = outcome.site(),
            tier = %tier,
            status = %outcome.status(),
            error_kind = e.kind(),
            "Extraction failed: {e}"
        ),
        None => debug!(
            site = outcome.site(),
            tier = %tier,
            status = %outcome.status(),
            records = outcome.records().len(),
            "Extraction finished"
        ),
    }
    outcome
}

fn join_error(err: JoinError) -> ExtractionError {
    if !err.is_panic() {
        return ExtractionError::Cancelled;
    }
    let payload = err.into_panic();
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string());
    ExtractionError::Panicked(message)
}
