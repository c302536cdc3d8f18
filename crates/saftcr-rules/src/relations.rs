//! Basics and article relation resolution (§4.7c, §4.7d).

use saftcr_model::entities::{Article, Basics, CashTrans, Event};
use saftcr_model::{Check, ErrorKind, Finding};

fn unresolved_basics(value: String, source_row: Option<u32>) -> Finding {
    Finding::error(Check::Value, ErrorKind::NoRelationToBasicsFound { value }).with_source_row_opt(source_row)
}

/// Every `eventType`/`lineType`/`paymentType`/`raiseType`/`transType` must
/// resolve against the `Basics` table.
pub fn check_basics(basics: &[Basics], events: &[Event], cash_trans: &[CashTrans]) -> Vec<Finding> {
    let mut findings = Vec::new();

    for event in events {
        if crate::basics::resolve(basics, &event.basic_type).is_none() {
            findings.push(unresolved_basics(event.basic_type.clone(), None));
        }
    }

    for trans in cash_trans {
        if crate::basics::resolve(basics, &trans.trans_type).is_none() {
            findings.push(unresolved_basics(trans.trans_type.clone(), trans.source_row));
        }
        for line in &trans.ct_lines {
            if crate::basics::resolve(basics, &line.line_type).is_none() {
                findings.push(unresolved_basics(line.line_type.clone(), line.source_row));
            }
        }
        for payment in &trans.payments {
            if crate::basics::resolve(basics, &payment.payment_type).is_none() {
                findings.push(unresolved_basics(payment.payment_type.clone(), payment.source_row));
            }
        }
        for raise in &trans.raises {
            if crate::basics::resolve(basics, &raise.raise_type).is_none() {
                findings.push(unresolved_basics(raise.raise_type.clone(), trans.source_row));
            }
        }
    }

    findings
}

/// Every `CTLine.artID` present must resolve against the `Article` table.
pub fn check_articles(articles: &[Article], cash_trans: &[CashTrans]) -> Vec<Finding> {
    let mut findings = Vec::new();
    for trans in cash_trans {
        for line in &trans.ct_lines {
            if let Some(art_id) = &line.art_id {
                if !articles.iter().any(|article| &article.art_id == art_id) {
                    findings.push(
                        Finding::error(Check::Value, ErrorKind::NoRelationToArticlesFound { value: art_id.clone() })
                            .with_source_row_opt(line.source_row),
                    );
                }
            }
        }
    }
    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use saftcr_model::entities::CtLine;

    fn basics() -> Vec<Basics> {
        vec![Basics {
            basic_type: "transType".to_string(),
            id: "1".to_string(),
            desc: "Sale".to_string(),
            predefined_id: Some("11001".to_string()),
        }]
    }

    #[test]
    fn unresolved_trans_type_reported() {
        let mut trans = crate::tests_support::sample_trans();
        trans.trans_type = "9".to_string();
        let findings = check_basics(&basics(), &[], &[trans]);
        assert_eq!(findings.len(), 1);
        assert_eq!(
            findings[0].error_kind,
            ErrorKind::NoRelationToBasicsFound { value: "9".to_string() }
        );
    }

    #[test]
    fn resolved_trans_type_is_clean() {
        let mut trans = crate::tests_support::sample_trans();
        trans.trans_type = "1".to_string();
        assert!(check_basics(&basics(), &[], &[trans]).is_empty());
    }

    #[test]
    fn unresolved_article_reported() {
        let mut trans = crate::tests_support::sample_trans();
        trans.ct_lines.push(CtLine {
            line_type: String::new(),
            art_id: Some("missing".to_string()),
            qnt: Some(1.0),
            desc: None,
            source_row: Some(4),
        });
        let findings = check_articles(&[], &[trans]);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].source_row, Some(4));
    }
}
