//! Registry CSV loading
//!
//! The registry is a CSV file with at least the columns `firm_name`, `url`
//! and `platform_type`. Bad rows are skipped one by one; a bad file as a
//! whole yields an empty registry. Neither case aborts the run.

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;
use tracing::{error, info, warn};
use url::Url;

use super::rules::RulesBook;
use super::site::{SiteDescriptor, Strategy};
use crate::error::ConfigurationError;

const REQUIRED_COLUMNS: [&str; 3] = ["firm_name", "url", "platform_type"];

/// Load and validate the registry, attaching rules by firm name
///
/// Never fails: any file-level problem is logged and yields an empty list.
#[must_use]
pub fn load_registry(path: &Path, rules: &RulesBook) -> Vec<SiteDescriptor> {
    let file = match std::fs::File::open(path) {
        Ok(f) => f,
        Err(e) => {
            error!(path = %path.display(), error = %e, "Registry file could not be opened");
            return Vec::new();
        }
    };

    match parse_registry(file, rules) {
        Ok(sites) => {
            info!(path = %path.display(), count = sites.len(), "Loaded site registry");
            sites
        }
        Err(e) => {
            error!(path = %path.display(), error = %e, "Registry file is unusable");
            Vec::new()
        }
    }
}

/// Parse registry CSV from any reader
///
/// # Errors
///
/// Returns an error when the header is unreadable or lacks a required column,
/// or when the input is not valid UTF-8.
pub fn parse_registry<R: Read>(
    reader: R,
    rules: &RulesBook,
) -> Result<Vec<SiteDescriptor>, ConfigurationError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect();

    let column = |name: &str| headers.iter().position(|h| h == name);
    let (name_idx, url_idx, type_idx) =
        match (column("firm_name"), column("url"), column("platform_type")) {
            (Some(n), Some(u), Some(t)) => (n, u, t),
            _ => {
                let missing = REQUIRED_COLUMNS
                    .iter()
                    .filter(|c| column(**c).is_none())
                    .map(|c| (*c).to_string())
                    .collect();
                return Err(ConfigurationError::MissingColumns {
                    missing,
                    found: headers.clone(),
                });
            }
        };

    let mut seen = HashSet::new();
    let mut sites = Vec::new();

    for (line, record) in csv_reader.records().enumerate() {
        // header is line 1
        let line = line + 2;
        let record = match record {
            Ok(r) => r,
            Err(e) if matches!(e.kind(), csv::ErrorKind::Utf8 { .. }) => {
                return Err(e.into());
            }
            Err(e) => {
                warn!(line, error = %e, "Skipping malformed registry row");
                continue;
            }
        };

        let field = |idx: usize| record.get(idx).unwrap_or_default().trim();
        let (name, raw_url, raw_type) = (field(name_idx), field(url_idx), field(type_idx));

        if name.is_empty() || raw_url.is_empty() || raw_type.is_empty() {
            warn!(line, "Skipping registry row with missing data");
            continue;
        }

        let strategy = match raw_type.parse::<Strategy>() {
            Ok(s) => s,
            Err(reason) => {
                warn!(line, firm = name, "Skipping registry row: {reason}");
                continue;
            }
        };

        let url = match Url::parse(raw_url) {
            Ok(u) if matches!(u.scheme(), "http" | "https") => u,
            Ok(u) => {
                warn!(line, firm = name, scheme = u.scheme(), "Skipping registry row: URL is not http(s)");
                continue;
            }
            Err(e) => {
                warn!(line, firm = name, error = %e, "Skipping registry row: invalid URL");
                continue;
            }
        };

        if !seen.insert(name.to_string()) {
            warn!(line, firm = name, "Skipping duplicate firm in registry");
            continue;
        }

        let mut site = SiteDescriptor::new(name, url, strategy);
        if let Some(r) = rules.get(name) {
            site = site.with_rules(r.clone());
        } else if strategy == Strategy::Heavy {
            warn!(firm = name, "Browser site has no extraction rules; it will be reported as failed");
        }
        sites.push(site);
    }

    Ok(sites)
}
