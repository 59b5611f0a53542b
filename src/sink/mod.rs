//! Result sink: validated records to a spreadsheet
//!
//! The output format follows the file extension: `.csv` writes plain CSV,
//! anything else writes an `.xlsx` workbook with a bold header, fitted
//! column widths, and clickable links.

mod validate;

pub use validate::{Validated, validate};

use rust_xlsxwriter::{Format, FormatAlign, Url as XlsxUrl, Workbook};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::ExportError;
use crate::record::JobRecord;

/// Column headers, in output order
pub const COLUMNS: [&str; 4] = ["Firm", "Job Title", "Location", "Link"];

/// Column widths never exceed this many characters
const MAX_COLUMN_WIDTH: usize = 75;
const COLUMN_PADDING: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Xlsx,
    Csv,
}

impl ExportFormat {
    /// `.csv` (any case) selects CSV; everything else is a workbook
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => Self::Csv,
            _ => Self::Xlsx,
        }
    }
}

/// What an export wrote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReport {
    pub path: PathBuf,
    pub format: ExportFormat,
    pub rows: usize,
    pub dropped_invalid: usize,
    pub dropped_duplicates: usize,
}

/// Validate `records` and write them to `path`
///
/// An empty record set still produces a file with the header row.
///
/// # Errors
///
/// Returns `ExportError` if the parent directory cannot be created or the
/// file cannot be written.
pub fn export_jobs(records: &[JobRecord], path: &Path) -> Result<ExportReport, ExportError> {
    let validated = validate(records);
    let format = ExportFormat::from_path(path);

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|source| ExportError::Io {
            path: parent.display().to_string(),
            source,
        })?;
    }

    match format {
        ExportFormat::Xlsx => write_xlsx(&validated.records, path)?,
        ExportFormat::Csv => write_csv(&validated.records, path)?,
    }

    let report = ExportReport {
        path: path.to_path_buf(),
        format,
        rows: validated.records.len(),
        dropped_invalid: validated.dropped_invalid,
        dropped_duplicates: validated.dropped_duplicates,
    };
    info!(
        path = %report.path.display(),
        rows = report.rows,
        dropped_invalid = report.dropped_invalid,
        dropped_duplicates = report.dropped_duplicates,
        "Exported job listings"
    );
    Ok(report)
}

fn row(record: &JobRecord) -> [&str; 4] {
    [&record.firm, &record.title, &record.location, &record.link]
}

/// Width per column: longest cell (header included) plus padding, capped
#[must_use]
pub fn column_widths(records: &[JobRecord]) -> [usize; 4] {
    let mut widths = COLUMNS.map(|h| h.chars().count());
    for record in records {
        for (width, cell) in widths.iter_mut().zip(row(record)) {
            *width = (*width).max(cell.chars().count());
        }
    }
    widths.map(|w| (w + COLUMN_PADDING).min(MAX_COLUMN_WIDTH))
}

fn write_xlsx(records: &[JobRecord], path: &Path) -> Result<(), ExportError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Jobs")?;

    let header = Format::new().set_bold().set_align(FormatAlign::Center);
    for (col, title) in (0u16..).zip(COLUMNS) {
        sheet.write_string_with_format(0, col, title, &header)?;
    }

    for (row_index, record) in (1u32..).zip(records) {
        sheet.write_string(row_index, 0, &record.firm)?;
        sheet.write_string(row_index, 1, &record.title)?;
        sheet.write_string(row_index, 2, &record.location)?;
        let linked = sheet
            .write_url(row_index, 3, XlsxUrl::new(&record.link))
            .map(|_| ());
        if let Err(e) = linked {
            // Excel rejects some links (overlong, odd characters); keep them as text
            debug!(link = %record.link, "Link not accepted as hyperlink: {e}");
            sheet.write_string(row_index, 3, &record.link)?;
        }
    }

    for (col, width) in (0u16..).zip(column_widths(records)) {
        sheet.set_column_width(col, width as f64)?;
    }

    workbook.save(path)?;
    Ok(())
}

fn write_csv(records: &[JobRecord], path: &Path) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(COLUMNS)?;
    for record in records {
        writer.write_record(row(record))?;
    }
    writer.flush().map_err(|source| ExportError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(())
}
