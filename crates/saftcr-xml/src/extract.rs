//! Domain Model Extractor: walks a healed tree into the typed entities
//! `saftcr-model` declares. Lazy in spirit — this is the one place that
//! decides the concrete element vocabulary the rest of the validator works
//! against; see the tag constants below for the assumed concrete grammar
//! (the distilled spec only names individual fields, not a full XSD).

use chrono::NaiveDateTime;
use saftcr_model::entities::*;
use saftcr_schema::line_map::{ElementId, LineMap};
use std::collections::BTreeMap;

use crate::tree::ElementTree;

/// Everything the Value Validator and Certificate/Signature Validators
/// need, built once per file.
#[derive(Clone, Debug, Default)]
pub struct DomainModel {
    pub metadata: Metadata,
    pub basics: Vec<Basics>,
    pub articles: Vec<Article>,
    pub employees: Vec<Employee>,
    pub events: Vec<Event>,
    pub event_reports: Vec<EventReport>,
    pub cash_trans: Vec<CashTrans>,
}

const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

fn text(tree: &ElementTree, id: ElementId) -> Option<&str> {
    tree.node(id).text.as_deref()
}

fn attr<'a>(tree: &'a ElementTree, id: ElementId, name: &str) -> Option<&'a str> {
    tree.node(id).attrs.get(name).map(|s| s.as_str())
}

fn child<'a>(tree: &'a ElementTree, parent: ElementId, tag: &str) -> Option<ElementId> {
    tree.children(parent).iter().copied().find(|&c| tree.tag(c) == tag)
}

fn children<'a>(tree: &'a ElementTree, parent: ElementId, tag: &str) -> Vec<ElementId> {
    tree.children(parent)
        .iter()
        .copied()
        .filter(|&c| tree.tag(c) == tag)
        .collect()
}

fn child_text(tree: &ElementTree, parent: ElementId, tag: &str) -> Option<String> {
    child(tree, parent, tag).and_then(|c| text(tree, c)).map(|s| s.to_string())
}

fn parse_f64(tree: &ElementTree, parent: ElementId, tag: &str) -> Option<f64> {
    child_text(tree, parent, tag).and_then(|s| s.trim().parse().ok())
}

fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, DATETIME_FORMAT).ok()
}

/// Fallback for a transaction whose `transDate` is missing or the
/// structural dummy sentinel; downstream checks recognise the sentinel
/// text and skip reconciliation for it regardless of this value.
fn sentinel_datetime() -> NaiveDateTime {
    parse_datetime(saftcr_model::dummy::DATE).expect("dummy::DATE parses with DATETIME_FORMAT")
}

/// Build the full domain model from a parsed (and already healed) tree.
pub fn extract(tree: &ElementTree, line_map: &LineMap) -> DomainModel {
    let root = tree.root();
    let mut model = DomainModel::default();

    if let Some(header) = child(tree, root, "header") {
        model.metadata.header = tree
            .children(header)
            .iter()
            .filter_map(|&c| text(tree, c).map(|t| (tree.tag(c).to_string(), t.to_string())))
            .collect::<BTreeMap<_, _>>();
        model.metadata.company.id = model.metadata.header.get("companyIdent").cloned().unwrap_or_default();
        model.metadata.company.name = model.metadata.header.get("companyName").cloned().unwrap_or_default();
        model.metadata.software.company =
            model.metadata.header.get("softwareCompanyName").cloned().unwrap_or_default();
        model.metadata.software.description =
            model.metadata.header.get("softwareDescription").cloned().unwrap_or_default();
        model.metadata.software.version =
            model.metadata.header.get("softwareVersion").cloned().unwrap_or_default();
    }

    if let Some(company) = child(tree, root, "company") {
        for addr in children(tree, company, "address") {
            model.metadata.addresses.push(Address {
                street_name: child_text(tree, addr, "streetName").unwrap_or_default(),
                city: child_text(tree, addr, "city").unwrap_or_default(),
                postal_code: child_text(tree, addr, "postalCode").unwrap_or_default(),
            });
        }
    }

    if let Some(basics_table) = child(tree, root, "basicsTable") {
        for basic in children(tree, basics_table, "basic") {
            model.basics.push(Basics {
                basic_type: attr(tree, basic, "type").unwrap_or_default().to_string(),
                id: child_text(tree, basic, "id").unwrap_or_default(),
                desc: child_text(tree, basic, "desc").unwrap_or_default(),
                predefined_id: child_text(tree, basic, "predefinedBasicID"),
            });
        }
    }

    if let Some(articles) = child(tree, root, "articles") {
        for article in children(tree, articles, "article") {
            model.articles.push(Article {
                art_id: child_text(tree, article, "artID").unwrap_or_default(),
                group_id: child_text(tree, article, "groupID"),
                desc: child_text(tree, article, "desc"),
                date: child_text(tree, article, "date").as_deref().and_then(parse_datetime),
            });
        }
    }

    if let Some(employees) = child(tree, root, "employees") {
        for employee in children(tree, employees, "employee") {
            model.employees.push(Employee {
                emp_id: child_text(tree, employee, "empID").unwrap_or_default(),
                names: child_text(tree, employee, "names").unwrap_or_default(),
                role: child_text(tree, employee, "role"),
                role_desc: child_text(tree, employee, "roleDesc"),
            });
        }
    }

    if let Some(events) = child(tree, root, "events") {
        for (i, event) in children(tree, events, "event").into_iter().enumerate() {
            model.events.push(Event {
                event_id: i.to_string(),
                basic_type: attr(tree, event, "eventType").unwrap_or_default().to_string(),
                trans_id: child_text(tree, event, "transID"),
                report: child_text(tree, event, "eventReport"),
                datetime: child_text(tree, event, "eventDate").as_deref().and_then(parse_datetime),
            });
        }
    }

    if let Some(registers) = child(tree, root, "cashRegisters") {
        for register in children(tree, registers, "cashRegister") {
            let register_id = child_text(tree, register, "registerID").unwrap_or_default();

            if let Some(reports) = child(tree, register, "eventReports") {
                for report in children(tree, reports, "eventReport") {
                    if let Some(er) = extract_event_report(tree, report, &register_id) {
                        model.event_reports.push(er);
                    }
                }
            }

            if let Some(trans_container) = child(tree, register, "cashTrans") {
                for trans in children(tree, trans_container, "trans") {
                    model.cash_trans.push(extract_cash_trans(tree, line_map, trans, &register_id));
                }
            }
        }
    }

    model
}

fn extract_event_report(tree: &ElementTree, report: ElementId, register_id: &str) -> Option<EventReport> {
    let report_type = match child_text(tree, report, "type").as_deref() {
        Some("Z") => ReportType::Z,
        Some("X") => ReportType::X,
        _ => return None,
    };
    let datetime = child_text(tree, report, "reportDate").as_deref().and_then(parse_datetime)?;

    Some(EventReport {
        report_id: child_text(tree, report, "reportID").unwrap_or_default(),
        register_id: register_id.to_string(),
        report_type,
        datetime,
        totals: EventReportTotals {
            cash_sale: parse_f64(tree, report, "totalCashSaleAmnt").unwrap_or(0.0),
            grand_total_cash_sale: parse_f64(tree, report, "grandTotalCashSaleAmnt").unwrap_or(0.0),
            tip: parse_f64(tree, report, "tipAmnt").unwrap_or(0.0),
            return_num: parse_f64(tree, report, "reportReturnNum").unwrap_or(0.0),
            return_amnt: parse_f64(tree, report, "reportReturnAmnt").unwrap_or(0.0),
            discount_num: parse_f64(tree, report, "discountNum").unwrap_or(0.0),
            discount_amnt: parse_f64(tree, report, "discountAmnt").unwrap_or(0.0),
        },
        report_datetime_start: None,
        grand_total_cash_sale_previous: None,
    })
}

fn extract_cash_trans(tree: &ElementTree, line_map: &LineMap, trans: ElementId, register_id: &str) -> CashTrans {
    let nr_raw = child_text(tree, trans, "nr").unwrap_or_default();
    let nr = saftcr_model::parsing::parse_nr(&nr_raw).value;

    let amnt_tp = child_text(tree, trans, "amntTp");
    let sign = if amnt_tp.as_deref() == Some("D") { -1.0 } else { 1.0 };
    let amnt_incl_raw = child_text(tree, trans, "transAmntIn").unwrap_or_default();
    let amnt_excl_raw = child_text(tree, trans, "transAmntEx").unwrap_or_default();
    let amnt_incl = sign * amnt_incl_raw.trim().parse::<f64>().unwrap_or(0.0);
    let amnt_excl = sign * amnt_excl_raw.trim().parse::<f64>().unwrap_or(0.0);
    let trans_date_raw = child_text(tree, trans, "transDate").unwrap_or_default();
    let trans_time_raw = child_text(tree, trans, "transTime").unwrap_or_default();

    let mut ct_lines = Vec::new();
    if let Some(lines) = child(tree, trans, "ctLines") {
        for line in children(tree, lines, "ctLine") {
            ct_lines.push(CtLine {
                line_type: attr(tree, line, "lineType").unwrap_or_default().to_string(),
                art_id: child_text(tree, line, "artID"),
                qnt: parse_f64(tree, line, "qnt"),
                desc: child_text(tree, line, "desc"),
                source_row: line_map.row_of(line),
            });
        }
    }

    let mut payments = Vec::new();
    if let Some(payment_container) = child(tree, trans, "payments") {
        for payment in children(tree, payment_container, "payment") {
            payments.push(Payment {
                payment_type: attr(tree, payment, "paymentType").unwrap_or_default().to_string(),
                amnt: parse_f64(tree, payment, "amnt"),
                payment_ref_id: child_text(tree, payment, "paymentRefID"),
                source_row: line_map.row_of(payment),
            });
        }
    }

    let mut raises = Vec::new();
    if let Some(raise_container) = child(tree, trans, "raises") {
        for raise in children(tree, raise_container, "raise") {
            raises.push(Raise {
                raise_type: attr(tree, raise, "raiseType").unwrap_or_default().to_string(),
                amnt: parse_f64(tree, raise, "amnt"),
                // Resolved against the Basics table once the whole document
                // is available; see `saftcr_cli::engine::resolve_predefined_ids`.
                predefined_id: None,
            });
        }
    }

    CashTrans {
        nr,
        nr_raw,
        register_id: register_id.to_string(),
        trans_id: child_text(tree, trans, "transID"),
        trans_type: attr(tree, trans, "transType").unwrap_or_default().to_string(),
        emp_id: child_text(tree, trans, "empID"),
        amnt_incl,
        amnt_excl,
        amnt_incl_raw,
        amnt_excl_raw,
        datetime: parse_datetime(&trans_date_raw).unwrap_or_else(sentinel_datetime),
        trans_date_raw,
        trans_time_raw,
        void_trans: child_text(tree, trans, "voidTrans").as_deref() == Some("true"),
        training_id: child_text(tree, trans, "trainingID"),
        signature: child_text(tree, trans, "signature"),
        cert: child_text(tree, trans, "certificateData"),
        ct_lines,
        payments,
        raises,
        ref_id: child_text(tree, trans, "refID"),
        predefined_id: None,
        source_row: line_map.row_of(trans),
    }
}
