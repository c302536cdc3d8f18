//  Copyright (C) 2017-2019  The AXIOM TEAM Association.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as
// published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Value Validator: business-rule checks over the domain model built from a
//! healed audit file (§4.7 a-f). Every sub-check is a pure function over
//! `saftcr-model` entity slices, independent of the others; findings from
//! all of them simply accumulate.

pub mod basics;
pub mod mandatory;
pub mod numbering;
pub mod predefined;
pub mod reconciliation;
pub mod relations;

#[cfg(test)]
pub(crate) mod tests_support;

use saftcr_model::entities::{Article, Basics, CashTrans, Event, EventReport};
use saftcr_model::Finding;

/// Run every value-validation sub-check and return the accumulated findings.
///
/// `skip_pre_first_z_for_x_reports` governs report reconciliation's
/// pre-first-Z window behaviour (see `reconciliation::check`).
pub fn validate(
    basics: &[Basics],
    articles: &[Article],
    events: &[Event],
    event_reports: &[EventReport],
    cash_trans: &[CashTrans],
    skip_pre_first_z_for_x_reports: bool,
) -> Vec<Finding> {
    let mut findings = Vec::new();
    findings.extend(reconciliation::check(event_reports, cash_trans, skip_pre_first_z_for_x_reports));
    findings.extend(numbering::check(cash_trans));
    findings.extend(relations::check_basics(basics, events, cash_trans));
    findings.extend(relations::check_articles(articles, cash_trans));
    findings.extend(mandatory::check(basics, events, cash_trans));
    findings.extend(predefined::check(basics, events, cash_trans));
    findings
}
