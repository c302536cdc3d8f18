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

//! Report Aggregator, locale tables, and `.xlsx` rendering (§4.8, §4.11).

pub mod aggregate;
pub mod errors;
pub mod locale;
pub mod render;

pub use aggregate::{aggregate, AggregatedReport, Prefix};
pub use errors::ReportError;
pub use locale::{AuditTrailLabels, DescriptionTable};
pub use render::{render, MasterData};
