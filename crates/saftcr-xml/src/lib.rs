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

//! Document loading, healing, structural validation, naming validation, and
//! domain-model extraction for SAF-T Cash Register audit files.

pub mod extract;
pub mod loader;
pub mod naming;
pub mod structure;
pub mod tree;

pub use extract::DomainModel;
pub use loader::{LoadOutcome, LoadedDocument};
pub use tree::ElementTree;

use saftcr_model::finding::Finding;
use saftcr_schema::SchemaIndex;
use std::path::Path;

/// Everything downstream checks need: the healed tree, its Line Map, the
/// extracted domain entities, and every finding the loading/healing/
/// structural-repair steps produced along the way.
pub struct ParsedFile {
    pub tree: ElementTree,
    pub line_map: saftcr_schema::line_map::LineMap,
    pub model: DomainModel,
    pub findings: Vec<Finding>,
}

/// Outcome of processing one audit file path end to end through this
/// crate's stages (load → heal → structurally repair → extract).
pub enum ProcessOutcome {
    /// The file parsed (after zero or more healing steps) and was
    /// structurally repaired to the point the domain model could be built.
    Processed(ParsedFile),
    /// The file could not be parsed at all; structure/certificate/signature
    /// cannot run and the value check is skipped silently.
    Unreadable { findings: Vec<Finding> },
}

/// Load, heal, structurally repair, and extract the domain model from the
/// audit file at `path`.
pub fn process_file(path: &Path, schema: &SchemaIndex) -> ProcessOutcome {
    match loader::load(path, schema) {
        LoadOutcome::Unreadable { findings } => ProcessOutcome::Unreadable { findings },
        LoadOutcome::Loaded(mut loaded) => {
            let repair_findings =
                structure::validate_and_heal(&mut loaded.tree, &mut loaded.line_map, schema);
            let model = extract::extract(&loaded.tree, &loaded.line_map);

            let mut findings = loaded.healing_findings;
            findings.extend(repair_findings);

            ProcessOutcome::Processed(ParsedFile {
                tree: loaded.tree,
                line_map: loaded.line_map,
                model,
                findings,
            })
        }
    }
}
