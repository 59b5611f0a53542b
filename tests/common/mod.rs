//! Test utilities: fake extractors and site fixtures for the dispatcher suite

use async_trait::async_trait;
use jobscrape::dispatcher::{DispatchOptions, Dispatcher};
use jobscrape::error::{ExtractionError, ExtractionResult};
use jobscrape::extractors::{HeavyRuntime, HeavySession, LightExtractor};
use jobscrape::headers::{HeaderRotation, HeaderSet};
use jobscrape::record::JobRecord;
use jobscrape::registry::{ExtractionRules, SiteDescriptor, Strategy};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

/// What a fake extractor does for one site
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub enum Behavior {
    Records(Vec<JobRecord>),
    Empty,
    Fail(ExtractionError),
    Panic,
    /// Sleep, then return the records
    Delay(Duration, Vec<JobRecord>),
}

/// Counts calls and tracks the peak number of simultaneous calls
#[derive(Debug, Default)]
pub struct Gauge {
    current: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicUsize,
}

#[allow(dead_code)]
impl Gauge {
    fn enter(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn exit(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

/// Decrements the gauge even when the fake panics
struct InFlight<'a>(&'a Gauge);

impl<'a> InFlight<'a> {
    fn new(gauge: &'a Gauge) -> Self {
        gauge.enter();
        Self(gauge)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.exit();
    }
}

/// Blocking fake driven by a per-site behaviour table; unknown sites are `Empty`
#[derive(Default)]
pub struct FakeLight {
    behaviors: HashMap<String, Behavior>,
    pub gauge: Gauge,
    pub seen: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl FakeLight {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, site: &str, behavior: Behavior) -> Self {
        self.behaviors.insert(site.to_string(), behavior);
        self
    }
}

impl LightExtractor for FakeLight {
    fn extract(&self, site: &SiteDescriptor, _headers: &HeaderSet) -> ExtractionResult<Vec<JobRecord>> {
        let _in_flight = InFlight::new(&self.gauge);
        self.seen.lock().unwrap().push(site.name.clone());

        match self.behaviors.get(&site.name).cloned().unwrap_or(Behavior::Empty) {
            Behavior::Records(records) => Ok(records),
            Behavior::Empty => Ok(Vec::new()),
            Behavior::Fail(e) => Err(e),
            Behavior::Panic => panic!("light extractor blew up on {}", site.name),
            Behavior::Delay(delay, records) => {
                std::thread::sleep(delay);
                Ok(records)
            }
        }
    }
}

/// Shared state of a fake browser runtime, inspectable after the run
#[derive(Default)]
pub struct HeavyProbe {
    pub launches: AtomicUsize,
    pub closes: AtomicUsize,
    pub gauge: Gauge,
    pub seen: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl HeavyProbe {
    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<String> {
        let mut seen = self.seen.lock().unwrap().clone();
        seen.sort();
        seen
    }
}

/// Async fake runtime; unknown sites are `Empty`
#[derive(Default)]
pub struct FakeHeavy {
    behaviors: Arc<HashMap<String, Behavior>>,
    launch_error: Option<ExtractionError>,
    pub probe: Arc<HeavyProbe>,
}

#[allow(dead_code)]
impl FakeHeavy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, site: &str, behavior: Behavior) -> Self {
        Arc::make_mut(&mut self.behaviors).insert(site.to_string(), behavior);
        self
    }

    pub fn failing_launch(mut self, error: ExtractionError) -> Self {
        self.launch_error = Some(error);
        self
    }
}

#[async_trait]
impl HeavyRuntime for FakeHeavy {
    async fn launch(&self) -> ExtractionResult<Arc<dyn HeavySession>> {
        self.probe.launches.fetch_add(1, Ordering::SeqCst);
        if let Some(e) = &self.launch_error {
            return Err(e.clone());
        }
        Ok(Arc::new(FakeSession {
            behaviors: Arc::clone(&self.behaviors),
            probe: Arc::clone(&self.probe),
        }))
    }
}

struct FakeSession {
    behaviors: Arc<HashMap<String, Behavior>>,
    probe: Arc<HeavyProbe>,
}

#[async_trait]
impl HeavySession for FakeSession {
    async fn extract(&self, site: &SiteDescriptor, _headers: &HeaderSet) -> ExtractionResult<Vec<JobRecord>> {
        let _in_flight = InFlight::new(&self.probe.gauge);
        self.probe.seen.lock().unwrap().push(site.name.clone());

        match self.behaviors.get(&site.name).cloned().unwrap_or(Behavior::Empty) {
            Behavior::Records(records) => Ok(records),
            Behavior::Empty => Ok(Vec::new()),
            Behavior::Fail(e) => Err(e),
            Behavior::Panic => panic!("browser extractor blew up on {}", site.name),
            Behavior::Delay(delay, records) => {
                tokio::time::sleep(delay).await;
                Ok(records)
            }
        }
    }

    async fn close(&self) {
        self.probe.closes.fetch_add(1, Ordering::SeqCst);
    }
}

/// A site on its own host, so per-domain limits never interfere
///
/// Carries browser rules, so any escalation reaches the fake runtime.
#[allow(dead_code)]
pub fn site(name: &str, strategy: Strategy) -> SiteDescriptor {
    bare_site(name, strategy).with_rules(ExtractionRules::new("div.job", "text"))
}

/// Like [`site`] but without extraction rules
#[allow(dead_code)]
pub fn bare_site(name: &str, strategy: Strategy) -> SiteDescriptor {
    let url = Url::parse(&format!("https://{}.example.com/careers", name.to_lowercase())).unwrap();
    SiteDescriptor::new(name, url, strategy)
}

/// `n` distinct records for `firm`
#[allow(dead_code)]
pub fn records(firm: &str, n: usize) -> Vec<JobRecord> {
    (0..n)
        .map(|i| {
            JobRecord::new(
                firm,
                &format!("{firm} Engineer {i}"),
                Some("London"),
                format!("https://{}.example.com/jobs/{i}", firm.to_lowercase()),
            )
        })
        .collect()
}

#[allow(dead_code)]
pub fn fast_options() -> DispatchOptions {
    DispatchOptions {
        light_concurrency: 4,
        heavy_concurrency: 2,
        max_per_domain: 2,
        light_timeout: Duration::from_secs(5),
        heavy_timeout: Duration::from_secs(5),
    }
}

#[allow(dead_code)]
pub fn dispatcher(light: Arc<FakeLight>, heavy: FakeHeavy, options: DispatchOptions) -> Dispatcher {
    Dispatcher::new(light, Arc::new(heavy), HeaderRotation::default(), options)
}
