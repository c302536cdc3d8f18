//! Error enum for the report-rendering layer.

use failure::Fail;

/// Everything that can go wrong loading locale tables or rendering a report.
#[derive(Debug, Fail)]
pub enum ReportError {
    /// A locale workbook could not be opened or parsed.
    #[fail(display = "locale table {} could not be read: {}", path, cause)]
    LocaleTableUnreadable {
        /// Path to the offending workbook.
        path: String,
        /// The underlying `calamine` error, rendered to text.
        cause: String,
    },
    /// A locale workbook had no first worksheet or no header row.
    #[fail(display = "locale table {} is empty", path)]
    LocaleTableEmpty {
        /// Path to the offending workbook.
        path: String,
    },
    /// The `.xlsx` report could not be written.
    #[fail(display = "report {} could not be written: {}", path, cause)]
    RenderFailed {
        /// Intended output path.
        path: String,
        /// The underlying `rust_xlsxwriter` error, rendered to text.
        cause: String,
    },
}
