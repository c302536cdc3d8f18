//! `.xlsx` rendering (§4.11): a two-sheet workbook, master-data and
//! findings, columns auto-sized to content.

use chrono::NaiveDateTime;
use rust_xlsxwriter::Workbook;
use std::path::Path;

use crate::aggregate::AggregatedReport;
use crate::locale::{AuditTrailLabels, DescriptionTable};
use crate::ReportError;
use saftcr_model::Finding;

/// File-level facts shown on the master-data sheet.
#[derive(Clone, Debug, Default)]
pub struct MasterData {
    /// National company identifier (CVR number or similar).
    pub company_id: String,
    /// Registered company name.
    pub company_name: String,
    /// Producing software's company name.
    pub software_company: String,
    /// Producing software's product description.
    pub software_description: String,
    /// Producing software's version string.
    pub software_version: String,
    /// The audit file's own creation timestamp, if known.
    pub file_created: Option<NaiveDateTime>,
    /// The audit file's modification timestamp, if known.
    pub file_modified: Option<NaiveDateTime>,
    /// When the audit file was last accessed on disk, if known.
    pub file_last_accessed: Option<NaiveDateTime>,
}

const FINDINGS_HEADER: [&str; 7] =
    ["Check", "Status", "Error row", "Error area", "Error element", "Technical error type", "Description"];

fn timestamp_cell(value: Option<NaiveDateTime>) -> String {
    value.map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string()).unwrap_or_default()
}

/// Render `report` to `path`, a two-sheet `.xlsx` workbook.
pub fn render(
    path: &Path,
    master: &MasterData,
    report: &AggregatedReport,
    descriptions: &DescriptionTable,
    audit_trail_labels: &AuditTrailLabels,
    lang: &str,
) -> Result<(), ReportError> {
    let mut workbook = Workbook::new();

    let master_sheet = workbook.add_worksheet();
    master_sheet.set_name("Master data").map_err(|e| render_failed(path, e))?;
    let rows: [(&str, String); 8] = [
        ("Company id", master.company_id.clone()),
        ("Company name", master.company_name.clone()),
        ("Software company", master.software_company.clone()),
        ("Software description", master.software_description.clone()),
        ("Software version", master.software_version.clone()),
        ("File created", timestamp_cell(master.file_created)),
        ("File modified", timestamp_cell(master.file_modified)),
        ("File last accessed", timestamp_cell(master.file_last_accessed)),
    ];
    for (row, (label, value)) in rows.iter().enumerate() {
        master_sheet.write_string(row as u32, 0, *label).map_err(|e| render_failed(path, e))?;
        master_sheet.write_string(row as u32, 1, value).map_err(|e| render_failed(path, e))?;
    }
    master_sheet.autofit();

    let findings_sheet = workbook.add_worksheet();
    findings_sheet.set_name("Findings").map_err(|e| render_failed(path, e))?;
    for (col, header) in FINDINGS_HEADER.iter().enumerate() {
        findings_sheet.write_string(0, col as u16, *header).map_err(|e| render_failed(path, e))?;
    }
    for (i, finding) in report.findings.iter().enumerate() {
        write_finding_row(findings_sheet, i as u32 + 1, finding, descriptions, audit_trail_labels, lang)
            .map_err(|e| render_failed(path, e))?;
    }
    findings_sheet.autofit();

    workbook.save(path).map_err(|e| render_failed(path, e))
}

fn write_finding_row(
    sheet: &mut rust_xlsxwriter::Worksheet,
    row: u32,
    finding: &Finding,
    descriptions: &DescriptionTable,
    audit_trail_labels: &AuditTrailLabels,
    lang: &str,
) -> Result<(), rust_xlsxwriter::XlsxError> {
    let code = finding.error_kind.code();
    let description = descriptions.describe(code, lang, &finding.parameters);
    let area = finding.audit_trail.as_deref().map(|trail| audit_trail_labels.label(trail, lang));

    sheet.write_string(row, 0, finding.check.to_string())?;
    sheet.write_string(row, 1, if finding.is_error() { "ERROR" } else { "OK" })?;
    match finding.source_row {
        Some(source_row) => sheet.write_number(row, 2, f64::from(source_row)).map(|_| ())?,
        None => sheet.write_string(row, 2, "").map(|_| ())?,
    };
    sheet.write_string(row, 3, &area.unwrap_or_default())?;
    sheet.write_string(row, 4, &finding.element_tag.clone().unwrap_or_default())?;
    sheet.write_string(row, 5, code)?;
    sheet.write_string(row, 6, &description)?;
    Ok(())
}

fn render_failed(path: &Path, cause: impl ToString) -> ReportError {
    ReportError::RenderFailed { path: path.display().to_string(), cause: cause.to_string() }
}
