//! Headless-browser extraction with chromiumoxide
//!
//! One Chromium process is launched per run and shared by every heavy
//! attempt; each attempt opens its own tab, renders the page, pulls job
//! cards out with the site's selectors, and closes the tab again.

use async_trait::async_trait;
use futures::future::BoxFuture;
use chromiumoxide::Page;
use chromiumoxide::browser::Browser;
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use rand::Rng;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

use super::{HeavyRuntime, HeavySession};
use crate::browser_setup::{CleanupResult, launch_browser, shutdown_browser};
use crate::error::{ExtractionError, ExtractionResult};
use crate::headers::HeaderSet;
use crate::record::JobRecord;
use crate::registry::{CARD_TEXT_SELECTOR, ExtractionRules, SiteDescriptor};
use crate::utils::{
    DEFAULT_PAGE_LOAD_TIMEOUT_SECS, DEFAULT_SELECTOR_WAIT_SECS, DEFAULT_SETTLE_DELAY_MS,
    clean_title, resolve_link, title_length_ok,
};

const SELECTOR_POLL_INTERVAL: Duration = Duration::from_millis(250);
const SCROLL_PAUSE: Duration = Duration::from_millis(800);

/// Runs in the page; `__CONFIG__` is replaced with a JSON object
const CARD_EXTRACTION_SCRIPT: &str = r"
(() => {
    const cfg = __CONFIG__;
    const text = (el) => (el ? (el.innerText || el.textContent || '') : '');
    const safeQuery = (root, sel) => {
        try { return root.querySelector(sel); } catch (_) { return null; }
    };
    return Array.from(document.querySelectorAll(cfg.card)).map((card) => {
        const title = cfg.title === 'text' ? text(card) : text(card.querySelector(cfg.title));
        let href = null;
        if (cfg.link) {
            const linkEl = card.matches(cfg.link) ? card : safeQuery(card, cfg.link);
            if (linkEl) href = linkEl.getAttribute('href');
        }
        if (!href && card.tagName === 'A') href = card.getAttribute('href');
        if (!href) {
            const anchor = card.querySelector('a[href]');
            if (anchor) href = anchor.getAttribute('href');
        }
        const location = cfg.location ? text(safeQuery(card, cfg.location)).trim() || null : null;
        return { title, href, location };
    });
})()
";

/// Tunables for the browser tier
#[derive(Debug, Clone)]
pub struct HeavyOptions {
    pub headless: bool,
    pub page_load_timeout: Duration,
    pub selector_wait: Duration,
    /// Inclusive range of the randomised settle delay after navigation, in ms
    pub settle_delay_ms: (u64, u64),
    /// Scroll passes for pages flagged `requires_interaction`
    pub interaction_rounds: u32,
    /// Parent of the per-run profile directory; the profile is deleted on close
    pub chrome_data_dir: Option<PathBuf>,
}

impl Default for HeavyOptions {
    fn default() -> Self {
        Self {
            headless: true,
            page_load_timeout: Duration::from_secs(DEFAULT_PAGE_LOAD_TIMEOUT_SECS),
            selector_wait: Duration::from_secs(DEFAULT_SELECTOR_WAIT_SECS),
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            interaction_rounds: 5,
            chrome_data_dir: None,
        }
    }
}

/// Launches one Chromium process per run
#[derive(Debug, Clone, Default)]
pub struct ChromiumRuntime {
    options: HeavyOptions,
}

impl ChromiumRuntime {
    #[must_use]
    pub fn new(options: HeavyOptions) -> Self {
        Self { options }
    }
}

#[async_trait]
impl HeavyRuntime for ChromiumRuntime {
    async fn launch(&self) -> ExtractionResult<Arc<dyn HeavySession>> {
        let (browser, handler, user_data_dir) =
            launch_browser(self.options.headless, self.options.chrome_data_dir.clone())
                .await
                .map_err(|e| ExtractionError::RuntimeUnavailable(format!("{e:#}")))?;

        info!(profile = %user_data_dir.display(), "Browser runtime started");
        Ok(Arc::new(ChromiumSession {
            browser: RwLock::new(Some(browser)),
            handler: StdMutex::new(Some(handler)),
            user_data_dir,
            options: self.options.clone(),
        }))
    }
}

/// A live Chromium process shared by the heavy phase
///
/// Attempts take the read side of the lock, so tabs render concurrently;
/// `close()` takes the write side and therefore waits for open tabs.
pub struct ChromiumSession {
    browser: RwLock<Option<Browser>>,
    handler: StdMutex<Option<JoinHandle<()>>>,
    user_data_dir: PathBuf,
    options: HeavyOptions,
}

/// Runs an async cleanup for `T` exactly once
///
/// Awaited on the normal path; if the owning task is aborted first (attempt
/// timeout, shutdown) the cleanup is spawned from `Drop` instead.
struct CloseOnDrop<T: Send + 'static> {
    item: Option<T>,
    cleanup: fn(T) -> BoxFuture<'static, ()>,
}

impl<T: Send + 'static> CloseOnDrop<T> {
    fn new(item: T, cleanup: fn(T) -> BoxFuture<'static, ()>) -> Self {
        Self {
            item: Some(item),
            cleanup,
        }
    }

    async fn close(mut self) {
        if let Some(item) = self.item.take() {
            (self.cleanup)(item).await;
        }
    }
}

impl<T: Send + 'static> Drop for CloseOnDrop<T> {
    fn drop(&mut self) {
        let Some(item) = self.item.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn((self.cleanup)(item));
            }
            Err(_) => debug!("No runtime to run deferred cleanup on"),
        }
    }
}

fn close_tab(page: Page) -> BoxFuture<'static, ()> {
    Box::pin(async move {
        if let Err(e) = page.close().await {
            debug!(error = %e, "Failed to close tab");
        }
    })
}

#[derive(Debug, Deserialize)]
struct RawCard {
    title: String,
    href: Option<String>,
    location: Option<String>,
}

impl ChromiumSession {
    async fn scrape(
        &self,
        page: &Page,
        site: &SiteDescriptor,
        rules: &ExtractionRules,
        headers: &HeaderSet,
    ) -> ExtractionResult<Vec<JobRecord>> {
        page.execute(SetUserAgentOverrideParams::new(headers.user_agent.clone()))
            .await?;

        let target = site.render_url();
        match tokio::time::timeout(self.options.page_load_timeout, page.goto(target.as_str())).await {
            Ok(result) => {
                result?;
            }
            Err(_) => {
                return Err(ExtractionError::Timeout {
                    after: self.options.page_load_timeout,
                });
            }
        }

        self.settle().await;

        if !self.wait_for_cards(page, &rules.job_card_selector).await? {
            warn!(site = %site.name, selector = %rules.job_card_selector, "No job cards appeared");
            return Ok(Vec::new());
        }

        if rules.requires_interaction {
            self.scroll_to_load(page).await;
        }

        let config = serde_json::json!({
            "card": rules.job_card_selector,
            "title": rules.title_selector,
            "location": rules.location_selector,
            "link": rules.link_selector,
        });
        let script = CARD_EXTRACTION_SCRIPT.replace("__CONFIG__", &config.to_string());
        let cards: Vec<RawCard> = page
            .evaluate(script.as_str())
            .await?
            .into_value()
            .map_err(|e| ExtractionError::Parse(format!("unexpected card payload: {e}")))?;

        debug!(site = %site.name, cards = cards.len(), "Extracted raw job cards");
        Ok(cards_to_records(&site.name, &target, cards))
    }

    async fn settle(&self) {
        let (lo, hi) = self.options.settle_delay_ms;
        let delay_ms = if hi > lo {
            rand::rng().random_range(lo..=hi)
        } else {
            lo
        };
        if delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }
    }

    /// Poll until at least one card matches or the wait budget runs out
    async fn wait_for_cards(&self, page: &Page, card_selector: &str) -> ExtractionResult<bool> {
        let quoted = serde_json::to_string(card_selector)
            .map_err(|e| ExtractionError::Parse(e.to_string()))?;
        let script = format!("document.querySelectorAll({quoted}).length");
        let deadline = Instant::now() + self.options.selector_wait;

        loop {
            let count: u64 = page
                .evaluate(script.as_str())
                .await?
                .into_value()
                .map_err(|e| ExtractionError::Parse(format!("bad selector count: {e}")))?;
            if count > 0 {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(SELECTOR_POLL_INTERVAL).await;
        }
    }

    /// Scroll to the bottom repeatedly so lazy-loaded listings render
    async fn scroll_to_load(&self, page: &Page) {
        for round in 0..self.options.interaction_rounds {
            if let Err(e) = page
                .evaluate("window.scrollTo(0, document.body.scrollHeight)")
                .await
            {
                debug!(round, error = %e, "Scroll failed; continuing with what is rendered");
                break;
            }
            tokio::time::sleep(SCROLL_PAUSE).await;
        }
    }
}

/// Turn in-page card data into records, dropping cards without a usable title or link
fn cards_to_records(firm: &str, page: &Url, cards: Vec<RawCard>) -> Vec<JobRecord> {
    cards
        .into_iter()
        .enumerate()
        .filter_map(|(i, card)| {
            let title = clean_title(&card.title);
            let link = card.href.as_deref().and_then(|h| resolve_link(page, h));
            match link {
                Some(link) if title_length_ok(&title) => {
                    Some(JobRecord::new(firm, &title, card.location.as_deref(), link))
                }
                _ => {
                    debug!(firm, card = i, title = %title, "Skipping card with invalid title or link");
                    None
                }
            }
        })
        .collect()
}

#[async_trait]
impl HeavySession for ChromiumSession {
    async fn extract(
        &self,
        site: &SiteDescriptor,
        headers: &HeaderSet,
    ) -> ExtractionResult<Vec<JobRecord>> {
        let rules = site
            .usable_rules()
            .ok_or_else(|| ExtractionError::missing_rules(&site.name))?;

        let kind = if rules.title_selector == CARD_TEXT_SELECTOR {
            "card-text"
        } else {
            "selector"
        };
        info!(site = %site.name, title_mode = kind, "Starting browser extraction");

        let guard = self.browser.read().await;
        let browser = guard
            .as_ref()
            .ok_or_else(|| ExtractionError::RuntimeUnavailable("browser already closed".into()))?;

        let page = browser.new_page("about:blank").await?;
        let tab = CloseOnDrop::new(page.clone(), close_tab);
        let result = self.scrape(&page, site, rules, headers).await;
        tab.close().await;

        if let Ok(records) = &result {
            info!(site = %site.name, count = records.len(), "Browser extraction finished");
        }
        result
    }

    async fn close(&self) {
        let browser = self.browser.write().await.take();
        let handler = self.handler.lock().ok().and_then(|mut h| h.take());

        match (browser, handler) {
            (Some(browser), Some(handler)) => {
                match shutdown_browser(browser, handler, &self.user_data_dir).await {
                    CleanupResult::Success => info!("Browser runtime shut down"),
                    CleanupResult::PartialFailure(errors) => {
                        warn!(?errors, "Browser runtime shut down with errors");
                    }
                }
            }
            _ => debug!("Browser runtime already closed"),
        }
    }
}

impl Drop for ChromiumSession {
    fn drop(&mut self) {
        // Fallback when close() never ran; Browser's own Drop kills the process
        if let Ok(mut handler) = self.handler.lock()
            && let Some(h) = handler.take()
        {
            warn!("Browser session dropped without close(); aborting handler");
            h.abort();
        }
    }
}
