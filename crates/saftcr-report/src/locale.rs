//! Locale tables (§4.11): two bundled `.xlsx` workbooks loaded once at
//! startup, each a simple `code -> per-language text` lookup.

use calamine::{open_workbook, Reader, Xlsx};
use std::collections::HashMap;
use std::path::Path;

use crate::ReportError;

fn load_table(path: &Path) -> Result<HashMap<(String, String), String>, ReportError> {
    let mut workbook: Xlsx<_> = open_workbook(path).map_err(|cause| ReportError::LocaleTableUnreadable {
        path: path.display().to_string(),
        cause: cause.to_string(),
    })?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ReportError::LocaleTableEmpty { path: path.display().to_string() })?
        .map_err(|cause| ReportError::LocaleTableUnreadable {
            path: path.display().to_string(),
            cause: cause.to_string(),
        })?;

    let mut rows = range.rows();
    let header = rows.next().ok_or_else(|| ReportError::LocaleTableEmpty { path: path.display().to_string() })?;
    let languages: Vec<String> = header.iter().skip(1).map(|cell| cell.to_string()).collect();

    let mut table = HashMap::new();
    for row in rows {
        let key = row.first().map(|c| c.to_string()).unwrap_or_default();
        if key.is_empty() {
            continue;
        }
        for (i, lang) in languages.iter().enumerate() {
            if let Some(cell) = row.get(i + 1) {
                table.insert((key.clone(), lang.clone()), cell.to_string());
            }
        }
    }
    Ok(table)
}

/// `error_kind.code() -> per-language message template`, with positional
/// `[1]`, `[2]`, ... placeholders.
#[derive(Debug, Default)]
pub struct DescriptionTable {
    templates: HashMap<(String, String), String>,
}

impl DescriptionTable {
    /// Load the description table from a bundled workbook.
    pub fn load(path: &Path) -> Result<Self, ReportError> {
        Ok(Self { templates: load_table(path)? })
    }

    /// Render `code`'s template in `lang`, substituting `parameters`
    /// positionally; numeric parameters are thousand-separated with two
    /// decimals. Falls back to the bare code if nothing is found.
    pub fn describe(&self, code: &str, lang: &str, parameters: &[String]) -> String {
        match self.templates.get(&(code.to_string(), lang.to_string())) {
            Some(template) => substitute(template, parameters),
            None => code.to_string(),
        }
    }
}

/// `audit-trail path -> per-language label`.
#[derive(Debug, Default)]
pub struct AuditTrailLabels {
    labels: HashMap<(String, String), String>,
}

impl AuditTrailLabels {
    /// Load the audit-trail label table from a bundled workbook.
    pub fn load(path: &Path) -> Result<Self, ReportError> {
        Ok(Self { labels: load_table(path)? })
    }

    /// The label for `path` in `lang`, falling back to the raw path.
    pub fn label(&self, path: &str, lang: &str) -> String {
        self.labels
            .get(&(path.to_string(), lang.to_string()))
            .cloned()
            .unwrap_or_else(|| path.to_string())
    }
}

fn substitute(template: &str, parameters: &[String]) -> String {
    let mut out = template.to_string();
    for (i, parameter) in parameters.iter().enumerate() {
        out = out.replace(&format!("[{}]", i + 1), &format_parameter(parameter));
    }
    out
}

fn format_parameter(raw: &str) -> String {
    match raw.trim().parse::<f64>() {
        Ok(value) => thousand_separated(value),
        Err(_) => raw.to_string(),
    }
}

fn thousand_separated(value: f64) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    let cents = (value.abs() * 100.0).round() as i64;
    let whole = cents / 100;
    let frac = cents % 100;

    let digits: Vec<char> = whole.to_string().chars().collect();
    let mut grouped = String::new();
    for (i, c) in digits.iter().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*c);
    }
    let grouped: String = grouped.chars().rev().collect();
    format!("{}{}.{:02}", sign, grouped, frac)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_positional_placeholders() {
        let template = "expected [1], got [2]";
        assert_eq!(substitute(template, &["100".to_string(), "99.5".to_string()]), "expected 100.00, got 99.50");
    }

    #[test]
    fn thousand_separated_groups_digits() {
        assert_eq!(thousand_separated(1234567.8), "1,234,567.80");
        assert_eq!(thousand_separated(-42.0), "-42.00");
    }

    #[test]
    fn non_numeric_parameter_passes_through() {
        assert_eq!(format_parameter("SALE"), "SALE");
    }
}
