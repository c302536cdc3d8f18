//! Orchestrator: ties every `saftcr-*` validator together into one file
//! analysis (§4.1-§4.11), and the process-wide state each run shares.

use std::collections::BTreeMap;
use std::path::Path;

use failure::Fail;
use saftcr_crypto::certificate::{self, CertOccurrence, CertificateCache, TrustedCertificates};
use saftcr_crypto::priority::SignaturePriority;
use saftcr_crypto::signature;
use saftcr_model::entities::CashTrans;
use saftcr_model::{Check, Finding};
use saftcr_report::{aggregate, render, AggregatedReport, AuditTrailLabels, DescriptionTable, MasterData};
use saftcr_schema::SchemaIndex;
use saftcr_xml::{naming, process_file, ProcessOutcome};

use crate::config::EngineConfig;

/// Checks the loader reports on when a file could not be read at all: the
/// value check never runs, so it is never reported, not even as `ok`.
const UNREADABLE_FILE_CHECKS: [Check; 4] = [Check::Naming, Check::Structure, Check::Certificate, Check::Signature];

/// Everything a run shares across every file it analyses: the schema and
/// trust set are loaded once, `signature_priority` accumulates across
/// files by design (§5), and `certificate_cache` avoids re-fetching a
/// leaf certificate seen in an earlier file.
pub struct EngineContext {
    pub schema: SchemaIndex,
    pub trust: TrustedCertificates,
    pub certificate_cache: CertificateCache,
    pub signature_priority: SignaturePriority,
    pub descriptions: DescriptionTable,
    pub audit_trail_labels: AuditTrailLabels,
    pub config: EngineConfig,
}

#[derive(Debug, Fail)]
pub enum AnalyzeError {
    #[fail(display = "could not determine the file's name")]
    NoFileStem,
    #[fail(display = "could not render the report: {}", _0)]
    RenderFailed(saftcr_report::ReportError),
}

/// The outcome of analysing one audit file: the computed prefix and the
/// path the rendered report was written to.
pub struct AnalysisOutcome {
    pub prefix: aggregate::Prefix,
    pub report_path: std::path::PathBuf,
}

/// Run every validator over the file at `path` and render the `.xlsx`
/// report into `output_dir`.
pub fn analyze_file(ctx: &EngineContext, path: &Path, output_dir: &Path) -> Result<AnalysisOutcome, AnalyzeError> {
    let stem = path.file_stem().and_then(|s| s.to_str()).ok_or(AnalyzeError::NoFileStem)?;

    let mut findings = Vec::new();
    if let Err(naming_finding) = naming::validate(stem) {
        findings.push(naming_finding);
    }

    let report = match process_file(path, &ctx.schema) {
        ProcessOutcome::Unreadable { findings: read_findings } => {
            findings.extend(read_findings);
            aggregate::aggregate_with_checks(findings, &UNREADABLE_FILE_CHECKS)
        }
        ProcessOutcome::Processed(mut parsed) => {
            findings.append(&mut parsed.findings);
            resolve_predefined_ids(&mut parsed.model);

            let occurrences = certificate_occurrences(&parsed.model.cash_trans);
            findings.extend(certificate::validate(&occurrences, &ctx.trust, &ctx.certificate_cache));

            let by_register = group_by_register(&parsed.model.cash_trans);
            findings.extend(signature::validate(
                &by_register,
                &parsed.model.metadata.company.id,
                &ctx.signature_priority,
                &ctx.certificate_cache,
            ));

            findings.extend(saftcr_rules::validate(
                &parsed.model.basics,
                &parsed.model.articles,
                &parsed.model.events,
                &parsed.model.event_reports,
                &parsed.model.cash_trans,
                ctx.config.skip_pre_first_z_for_x_reports,
            ));

            aggregate::aggregate(findings)
        }
    };

    let report_path = render_report(ctx, path, stem, output_dir, &report)?;
    Ok(AnalysisOutcome { prefix: report.prefix, report_path })
}

/// Resolve every transaction's `predefined_id` (from `trans_type`) and every
/// raise's `predefined_id` (from `raise_type`) against the file's own
/// `Basics` table, the way every other reference (`eventType`, `lineType`,
/// `paymentType`) is resolved in `saftcr-rules`. The Domain Model Extractor
/// leaves these fields unset since `saftcr-xml` has no business depending on
/// `saftcr-rules`'s lookup; the reconciliation (`Raise::tip_contribution`)
/// and predefined-basic checks need them populated before they run.
fn resolve_predefined_ids(model: &mut saftcr_xml::DomainModel) {
    let basics = model.basics.clone();
    for tran in &mut model.cash_trans {
        tran.predefined_id = saftcr_rules::basics::predefined_id(&basics, &tran.trans_type).map(str::to_string);
        for raise in &mut tran.raises {
            raise.predefined_id = saftcr_rules::basics::predefined_id(&basics, &raise.raise_type).map(str::to_string);
        }
    }
}

/// One `CertOccurrence` per transaction carrying a leaf certificate.
///
/// `transDate` missing or structurally healed extracts as the dummy date
/// sentinel rather than `None` (so reconciliation keeps a real, parseable
/// date to compare against); the Certificate Validator needs to see the
/// genuine absence instead, so it is translated back to `None` here.
fn certificate_occurrences(cash_trans: &[CashTrans]) -> Vec<CertOccurrence> {
    cash_trans
        .iter()
        .map(|tran| CertOccurrence {
            cert_pem: tran.cert.as_deref(),
            trans_date: if saftcr_model::dummy::is_sentinel(&tran.trans_date_raw) {
                None
            } else {
                Some(tran.datetime.date())
            },
            source_row: tran.source_row,
            audit_trail: Some("cashRegisters/cashRegister/cashTrans/trans/certificateData".to_string()),
        })
        .collect()
}

/// Group transactions by register, preserving file order within each
/// register: the Signature Validator verifies the chain in that order,
/// not sorted by `nr`.
fn group_by_register(cash_trans: &[CashTrans]) -> BTreeMap<String, Vec<CashTrans>> {
    let mut by_register: BTreeMap<String, Vec<CashTrans>> = BTreeMap::new();
    for tran in cash_trans {
        by_register.entry(tran.register_id.clone()).or_default().push(tran.clone());
    }
    by_register
}

fn render_report(
    ctx: &EngineContext,
    source_path: &Path,
    stem: &str,
    output_dir: &Path,
    report: &AggregatedReport,
) -> Result<std::path::PathBuf, AnalyzeError> {
    std::fs::create_dir_all(output_dir).map_err(|e| {
        AnalyzeError::RenderFailed(saftcr_report::ReportError::RenderFailed {
            path: output_dir.display().to_string(),
            cause: e.to_string(),
        })
    })?;

    let report_path = output_dir.join(format!("{}{}.xlsx", report.prefix.as_str(), stem));
    let master = master_data(source_path);
    render::render(&report_path, &master, report, &ctx.descriptions, &ctx.audit_trail_labels, &ctx.config.language)
        .map_err(AnalyzeError::RenderFailed)?;
    Ok(report_path)
}

fn master_data(source_path: &Path) -> MasterData {
    let metadata = std::fs::metadata(source_path).ok();
    MasterData {
        file_created: metadata.as_ref().and_then(file_time_to_naive_created),
        file_modified: metadata.as_ref().and_then(file_time_to_naive_modified),
        file_last_accessed: metadata.as_ref().and_then(file_time_to_naive_accessed),
        ..MasterData::default()
    }
}

fn file_time_to_naive_created(meta: &std::fs::Metadata) -> Option<chrono::NaiveDateTime> {
    meta.created().ok().map(system_time_to_naive)
}

fn file_time_to_naive_modified(meta: &std::fs::Metadata) -> Option<chrono::NaiveDateTime> {
    meta.modified().ok().map(system_time_to_naive)
}

fn file_time_to_naive_accessed(meta: &std::fs::Metadata) -> Option<chrono::NaiveDateTime> {
    meta.accessed().ok().map(system_time_to_naive)
}

fn system_time_to_naive(time: std::time::SystemTime) -> chrono::NaiveDateTime {
    let secs = time.duration_since(std::time::UNIX_EPOCH).map(|d| d.as_secs() as i64).unwrap_or(0);
    chrono::DateTime::from_timestamp(secs, 0).map(|dt| dt.naive_utc()).unwrap_or_else(|| {
        chrono::NaiveDate::from_ymd_opt(1970, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn sample_trans(register_id: &str, nr: &str) -> CashTrans {
        CashTrans {
            nr: nr.parse().unwrap_or(0.0),
            nr_raw: nr.to_string(),
            register_id: register_id.to_string(),
            trans_id: None,
            trans_type: "11001".to_string(),
            emp_id: None,
            amnt_incl: 0.0,
            amnt_excl: 0.0,
            amnt_incl_raw: String::new(),
            amnt_excl_raw: String::new(),
            datetime: NaiveDateTime::parse_from_str("2024-01-01T10:00:00", "%Y-%m-%dT%H:%M:%S").unwrap(),
            trans_date_raw: "2024-01-01".to_string(),
            trans_time_raw: "10:00:00".to_string(),
            void_trans: false,
            training_id: None,
            signature: None,
            cert: None,
            ct_lines: Vec::new(),
            payments: Vec::new(),
            raises: Vec::new(),
            ref_id: None,
            predefined_id: None,
            source_row: None,
        }
    }

    #[test]
    fn grouping_preserves_file_order_per_register() {
        let trans = vec![sample_trans("R1", "1"), sample_trans("R2", "1"), sample_trans("R1", "2")];
        let by_register = group_by_register(&trans);
        let r1 = &by_register["R1"];
        assert_eq!(r1.len(), 2);
        assert_eq!(r1[0].nr_raw, "1");
        assert_eq!(r1[1].nr_raw, "2");
    }

    #[test]
    fn certificate_occurrences_carry_one_per_transaction() {
        let trans = vec![sample_trans("R1", "1"), sample_trans("R1", "2")];
        let occurrences = certificate_occurrences(&trans);
        assert_eq!(occurrences.len(), 2);
    }

    #[test]
    fn resolve_predefined_ids_fills_cash_trans_from_basics() {
        let mut model = saftcr_xml::DomainModel {
            basics: vec![saftcr_model::entities::Basics {
                basic_type: "transType".to_string(),
                id: "11001".to_string(),
                desc: "Cash sale".to_string(),
                predefined_id: Some("11001".to_string()),
            }],
            cash_trans: vec![sample_trans("R1", "1")],
            ..Default::default()
        };
        resolve_predefined_ids(&mut model);
        assert_eq!(model.cash_trans[0].predefined_id.as_deref(), Some("11001"));
    }

    #[test]
    fn resolve_predefined_ids_also_fills_raises_from_basics() {
        let mut tran = sample_trans("R1", "1");
        tran.raises.push(saftcr_model::entities::Raise {
            raise_type: "TIP".to_string(),
            amnt: Some(12.5),
            predefined_id: None,
        });
        let mut model = saftcr_xml::DomainModel {
            basics: vec![
                saftcr_model::entities::Basics {
                    basic_type: "transType".to_string(),
                    id: "11001".to_string(),
                    desc: "Cash sale".to_string(),
                    predefined_id: Some("11001".to_string()),
                },
                saftcr_model::entities::Basics {
                    basic_type: "raiseType".to_string(),
                    id: "TIP".to_string(),
                    desc: "Tip".to_string(),
                    predefined_id: Some("10001".to_string()),
                },
            ],
            cash_trans: vec![tran],
            ..Default::default()
        };
        resolve_predefined_ids(&mut model);
        assert_eq!(model.cash_trans[0].raises[0].predefined_id.as_deref(), Some("10001"));
    }
}
