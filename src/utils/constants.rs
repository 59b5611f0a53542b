//! Shared configuration constants for jobscrape
//!
//! Default values used by the config builder, the extractors and the sink,
//! kept in one place to avoid magic numbers.

/// Default number of simultaneous static-HTML extractions
///
/// Light extractions are cheap (one GET + parse) and run on the blocking
/// worker pool, so this can be larger than the browser cap.
pub const DEFAULT_LIGHT_CONCURRENCY: usize = 8;

/// Default number of simultaneous browser pages
///
/// Each heavy attempt holds one tab in the shared Chromium instance.
/// Rendering is memory hungry; three tabs keeps a laptop responsive.
pub const DEFAULT_HEAVY_CONCURRENCY: usize = 3;

/// Default number of simultaneous attempts against one host
///
/// Many firms publish through the same applicant-tracking host
/// (e.g. `boards.greenhouse.io`), which would otherwise receive the whole
/// light phase at once.
pub const DEFAULT_MAX_PER_DOMAIN: usize = 2;

/// Upper bound accepted for any concurrency setting
pub const MAX_CONCURRENCY: usize = 64;

/// Time budget for one light attempt (fetch + parse)
pub const DEFAULT_LIGHT_TIMEOUT_SECS: u64 = 20;

/// Time budget for one heavy attempt (page open, render, extract, close)
pub const DEFAULT_HEAVY_TIMEOUT_SECS: u64 = 60;

/// HTTP request timeout used by the light extractor's client
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;

/// Budget for a single DevTools command sent to the browser
pub const BROWSER_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Timeout for `page.goto()` in the heavy extractor
pub const DEFAULT_PAGE_LOAD_TIMEOUT_SECS: u64 = 30;

/// How long the heavy extractor polls for the job-card selector
pub const DEFAULT_SELECTOR_WAIT_SECS: u64 = 10;

/// Randomised settle delay after navigation, in milliseconds
///
/// Lets client-side frameworks finish their first render and spaces out
/// page loads so the browser tier does not look like a burst.
pub const DEFAULT_SETTLE_DELAY_MS: (u64, u64) = (2_000, 4_000);

/// Default registry file, relative to the working directory
pub const DEFAULT_REGISTRY_PATH: &str = "firms.csv";

/// Default spreadsheet location
pub const DEFAULT_OUTPUT_PATH: &str = "output/jobs.xlsx";

/// Location written when a listing carries none
pub const UNKNOWN_LOCATION: &str = "Unknown";

/// Titles must be strictly longer than this many characters
pub const MIN_TITLE_CHARS: usize = 5;

/// Titles must be strictly shorter than this many characters
pub const MAX_TITLE_CHARS: usize = 100;

/// Anchor texts that are navigation chrome rather than job titles
pub const NAVIGATION_KEYWORDS: &[&str] = &["open role", "career", "alert", "view all"];

/// User agents rotated across sites
///
/// Desktop and mobile builds of the three major engines, so consecutive
/// requests to one host do not present an identical fingerprint.
pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.6834.160 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.6 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:133.0) Gecko/20100101 Firefox/133.0",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; WOW64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/130.0.0.0 Safari/537.36",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1",
    "Mozilla/5.0 (Linux; Android 14) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.6778.135 Mobile Safari/537.36",
];
