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

//! Data model for the SAF-T Cash Register validator.
//!
//! Hosts the [`Finding`] report record and the domain entities extracted
//! from an audit file (`Basics`, `Article`, `Employee`, `Event`,
//! `EventReport`, `CashTrans`, ...). This crate knows nothing about XML,
//! XSDs, certificates or signatures: it is the shared vocabulary every other
//! `saftcr-*` crate builds on.

pub mod check;
pub mod dummy;
pub mod entities;
pub mod error_kind;
pub mod finding;
pub mod parsing;

pub use check::Check;
pub use entities::*;
pub use error_kind::ErrorKind;
pub use finding::{Finding, Status};
