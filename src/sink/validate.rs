//! Pre-export cleanup of the merged record stream

use std::collections::HashSet;
use tracing::debug;

use crate::record::JobRecord;
use crate::utils::is_http_url;

/// Records ready for export plus what was dropped on the way
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validated {
    pub records: Vec<JobRecord>,
    pub dropped_invalid: usize,
    pub dropped_duplicates: usize,
}

/// Drop incomplete records, de-duplicate, and sort by firm then title
///
/// A record is incomplete when any field is blank or the link is not an
/// http(s) URL. Duplicates are detected on the case-insensitive
/// `(firm, title, location)` triple; the first occurrence wins.
#[must_use]
pub fn validate(records: &[JobRecord]) -> Validated {
    let mut seen = HashSet::new();
    let mut out = Validated::default();

    for record in records {
        let complete = [&record.firm, &record.title, &record.location, &record.link]
            .iter()
            .all(|field| !field.trim().is_empty())
            && is_http_url(&record.link);
        if !complete {
            debug!(firm = %record.firm, title = %record.title, "Dropping incomplete record");
            out.dropped_invalid += 1;
            continue;
        }

        let key = (
            record.firm.to_lowercase(),
            record.title.to_lowercase(),
            record.location.to_lowercase(),
        );
        if !seen.insert(key) {
            out.dropped_duplicates += 1;
            continue;
        }
        out.records.push(record.clone());
    }

    out.records
        .sort_by(|a, b| a.firm.cmp(&b.firm).then_with(|| a.title.cmp(&b.title)));
    out
}
