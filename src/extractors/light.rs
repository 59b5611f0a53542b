//! Static-HTML extraction: one blocking GET, then CSS selection
//!
//! Two page shapes are understood. Greenhouse boards list each job as a
//! `div.opening`. Anything else goes through a generic sweep of job-looking
//! anchors and containers, filtered hard because career pages link to a lot
//! of navigation that uses the same markup.

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use super::LightExtractor;
use crate::error::{ExtractionError, ExtractionResult};
use crate::headers::HeaderSet;
use crate::record::JobRecord;
use crate::registry::{SiteDescriptor, Strategy};
use crate::utils::{DEFAULT_REQUEST_TIMEOUT_SECS, clean_title, is_plausible_title, resolve_link};

/// Candidate selectors for the generic sweep, in priority order
const GENERIC_SELECTORS: &[&str] = &[
    r#"a[href*="job"]"#,
    r#"a[href*="careers"]"#,
    r#"a[href*="role"]"#,
    "div.job-listing",
    "li.job-item",
    "div.role-item",
    r#"a[class*="job"]"#,
    r#"div[class*="job"]"#,
];

/// Light extractor backed by a blocking reqwest client
///
/// A client is built per call, inside the worker thread that runs it: the
/// blocking client owns an internal runtime that must not be created or
/// dropped on an async worker.
#[derive(Debug, Clone)]
pub struct HttpLightExtractor {
    request_timeout: Duration,
}

impl HttpLightExtractor {
    #[must_use]
    pub fn new(request_timeout: Duration) -> Self {
        Self { request_timeout }
    }

    fn fetch(&self, url: &Url, headers: &HeaderSet) -> ExtractionResult<String> {
        let client = Client::builder()
            .timeout(self.request_timeout)
            .default_headers(to_header_map(headers))
            .build()
            .map_err(|e| ExtractionError::Network(format!("failed to build HTTP client: {e}")))?;

        let response = client
            .get(url.as_str())
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| self.classify(e))?;
        response.text().map_err(|e| self.classify(e))
    }

    /// Client-side timeouts carry the configured budget; everything else
    /// goes through the generic conversion
    fn classify(&self, err: reqwest::Error) -> ExtractionError {
        if err.is_timeout() {
            ExtractionError::Timeout {
                after: self.request_timeout,
            }
        } else {
            err.into()
        }
    }
}

impl Default for HttpLightExtractor {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS))
    }
}

impl LightExtractor for HttpLightExtractor {
    fn extract(
        &self,
        site: &SiteDescriptor,
        headers: &HeaderSet,
    ) -> ExtractionResult<Vec<JobRecord>> {
        info!(site = %site.name, strategy = %site.strategy, url = %site.url, "Starting light extraction");

        let parse: fn(&str, &Url, &str) -> ExtractionResult<Vec<JobRecord>> = match site.strategy {
            Strategy::LightStandard => parse_greenhouse_listings,
            Strategy::LightCustom => parse_generic_listings,
            Strategy::Heavy => {
                return Err(ExtractionError::Configuration(format!(
                    "'{}' is assigned to the browser tier",
                    site.name
                )));
            }
        };

        let html = self.fetch(&site.url, headers)?;
        let records = parse(&site.name, &site.url, &html)?;

        if records.is_empty() {
            warn!(site = %site.name, "No listings found with static selectors");
        } else {
            info!(site = %site.name, count = records.len(), "Light extraction found listings");
        }
        Ok(records)
    }
}

fn to_header_map(headers: &HeaderSet) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (name, value) in headers.iter() {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(n), Ok(v)) => {
                map.insert(n, v);
            }
            _ => debug!(header = name, "Skipping header that is not valid HTTP"),
        }
    }
    map
}

fn selector(css: &str) -> ExtractionResult<Selector> {
    Selector::parse(css).map_err(|e| ExtractionError::Parse(format!("bad selector '{css}': {e}")))
}

/// Visible text of an element with whitespace collapsed
fn element_text(el: ElementRef<'_>) -> String {
    clean_title(&el.text().collect::<Vec<_>>().join(" "))
}

/// Parse a Greenhouse job board
///
/// # Errors
///
/// Only fails if a built-in selector cannot be compiled.
pub fn parse_greenhouse_listings(
    firm: &str,
    page: &Url,
    html: &str,
) -> ExtractionResult<Vec<JobRecord>> {
    let document = Html::parse_document(html);
    let opening = selector("div.opening")?;
    let anchor = selector("a")?;
    let location = selector("span.location")?;

    let mut records = Vec::new();
    for card in document.select(&opening) {
        let Some(a) = card.select(&anchor).next() else {
            continue;
        };

        let title = element_text(a);
        let link = a.value().attr("href").and_then(|href| resolve_link(page, href));
        let Some(link) = link.filter(|_| !title.is_empty()) else {
            debug!(firm, "Skipping opening without title or usable link");
            continue;
        };

        let loc = card.select(&location).next().map(element_text);
        records.push(JobRecord::new(firm, &title, loc.as_deref(), link));
    }

    Ok(records)
}

/// Parse an arbitrary career page with the generic selector sweep
///
/// # Errors
///
/// Only fails if a built-in selector cannot be compiled.
pub fn parse_generic_listings(
    firm: &str,
    page: &Url,
    html: &str,
) -> ExtractionResult<Vec<JobRecord>> {
    let document = Html::parse_document(html);
    let nested_anchor = selector("a[href]")?;

    let mut candidates = 0usize;
    let mut seen = HashSet::new();
    let mut records = Vec::new();

    for css in GENERIC_SELECTORS {
        let sel = selector(css)?;
        for element in document.select(&sel) {
            candidates += 1;

            let (href, title) = if element.value().name() == "a" {
                (element.value().attr("href"), element_text(element))
            } else {
                match element.select(&nested_anchor).next() {
                    Some(a) => (a.value().attr("href"), element_text(element)),
                    None => continue,
                }
            };

            let Some(link) = href.and_then(|h| resolve_link(page, h)) else {
                continue;
            };
            if !is_plausible_title(&title) {
                continue;
            }

            if seen.insert((title.clone(), link.clone())) {
                records.push(JobRecord::new(firm, &title, None, link));
            }
        }
    }

    if records.is_empty() && candidates > 0 {
        debug!(firm, candidates, "Generic sweep matched elements but filtered all of them");
    }

    Ok(records)
}
