//! Haraj Export - tabular export of listing records.
//!
//! Writes a header row followed by one row per record, in input order, with
//! the fixed column layout in [`HEADER`]. Two formats are produced: an Excel
//! workbook with a single `Publications` sheet, and UTF-8 CSV prefixed with
//! a byte order mark so spreadsheet tools detect the encoding of Arabic text.
//!
//! ```rust
//! use haraj_core::ListingRecord;
//!
//! let bytes = haraj_export::to_csv_bytes(&[ListingRecord::default()]).unwrap();
//! let text = String::from_utf8(bytes).unwrap();
//! assert!(text.starts_with("\u{feff}Title,Price,URL,Location,Phone,Description,Name"));
//! ```

#![warn(clippy::all)]
#![allow(clippy::missing_errors_doc)]

use haraj_core::ListingRecord;
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use std::io::Write;
use thiserror::Error;

/// Column titles, in output order.
pub const HEADER: [&str; 7] = [
    "Title",
    "Price",
    "URL",
    "Location",
    "Phone",
    "Description",
    "Name",
];

/// Worksheet holding the exported rows.
pub const SHEET_NAME: &str = "Publications";

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

pub type Result<T> = std::result::Result<T, ExportError>;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("workbook write failed: {0}")]
    Xlsx(#[from] XlsxError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Attachment format requested by a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Xlsx,
    Csv,
}

impl ExportFormat {
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            Self::Csv => "text/csv; charset=utf-8",
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            Self::Xlsx => "publications.xlsx",
            Self::Csv => "publications.csv",
        }
    }

    /// Serialize `records` in this format.
    pub fn render(self, records: &[ListingRecord]) -> Result<Vec<u8>> {
        match self {
            Self::Xlsx => to_xlsx_bytes(records),
            Self::Csv => to_csv_bytes(records),
        }
    }
}

fn row(record: &ListingRecord) -> [&str; 7] {
    [
        record.title.as_str(),
        record.price.as_str(),
        record.url.as_str(),
        record.location.as_str(),
        record.phone.as_str(),
        record.description.as_str(),
        record.author_name.as_str(),
    ]
}

/// Write `records` as CSV to `writer`. Returns the number of data rows written.
pub fn write_listings<W: Write>(mut writer: W, records: &[ListingRecord]) -> Result<usize> {
    writer.write_all(UTF8_BOM)?;
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(HEADER)?;
    for record in records {
        csv.write_record(row(record))?;
    }
    csv.flush()?;
    Ok(records.len())
}

/// CSV export into an in-memory buffer.
pub fn to_csv_bytes(records: &[ListingRecord]) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    write_listings(&mut buffer, records)?;
    Ok(buffer)
}

/// Excel workbook export into an in-memory buffer.
pub fn to_xlsx_bytes(records: &[ListingRecord]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();

    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;
    for (col, title) in (0u16..).zip(HEADER) {
        sheet.write_string_with_format(0, col, title, &bold)?;
    }
    for (line, record) in (1u32..).zip(records) {
        for (col, value) in (0u16..).zip(row(record)) {
            sheet.write_string(line, col, value)?;
        }
    }

    Ok(workbook.save_to_buffer()?)
}
