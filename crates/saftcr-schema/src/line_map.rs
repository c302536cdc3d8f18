//! The Line Map: element-identity → original source row.
//!
//! Populated once during parsing. When the Structure Validator inserts a
//! dummy element to heal a content-model violation, it adds an entry whose
//! row equals the parent's row and marks it synthetic. Entries are never
//! overwritten once recorded; every later pass treats this as read-only.

use std::collections::HashMap;

/// Stable identity of one element instance within a parsed tree. `saftcr-xml`
/// assigns these as it builds its mutable tree; this crate only stores and
/// looks them up.
pub type ElementId = u32;

/// Where an element instance came from.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Origin {
    /// 1-based row in the original (pre-healing) source text.
    pub row: u32,
    /// `true` if this element was inserted by the Structure Validator rather
    /// than read from the file.
    pub synthetic: bool,
}

/// Maps element identity to [`Origin`].
#[derive(Clone, Debug, Default)]
pub struct LineMap {
    origins: HashMap<ElementId, Origin>,
}

impl LineMap {
    /// An empty map, grown during parsing.
    pub fn new() -> Self {
        LineMap::default()
    }

    /// Record an element read directly from the source at `row`.
    ///
    /// Panics if `id` was already recorded: the map is append-only and a
    /// double record means the caller assigned a non-unique id.
    pub fn record(&mut self, id: ElementId, row: u32) {
        let prior = self.origins.insert(
            id,
            Origin {
                row,
                synthetic: false,
            },
        );
        assert!(prior.is_none(), "LineMap::record: id {} already present", id);
    }

    /// Record a dummy element the Structure Validator inserted, inheriting
    /// `parent_row` as its row.
    pub fn record_synthetic(&mut self, id: ElementId, parent_row: u32) {
        let prior = self.origins.insert(
            id,
            Origin {
                row: parent_row,
                synthetic: true,
            },
        );
        assert!(
            prior.is_none(),
            "LineMap::record_synthetic: id {} already present",
            id
        );
    }

    /// Look up an element's origin.
    pub fn get(&self, id: ElementId) -> Option<Origin> {
        self.origins.get(&id).copied()
    }

    /// The source row to cite in a finding anchored on `id`, if known.
    pub fn row_of(&self, id: ElementId) -> Option<u32> {
        self.get(id).map(|o| o.row)
    }

    /// `true` if `id` was inserted by the Structure Validator rather than
    /// read from the file.
    pub fn is_synthetic(&self, id: ElementId) -> bool {
        self.get(id).map(|o| o.synthetic).unwrap_or(false)
    }

    /// Number of elements recorded, dummies included.
    pub fn len(&self) -> usize {
        self.origins.len()
    }

    /// `true` if nothing has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.origins.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_and_looks_up_real_rows() {
        let mut map = LineMap::new();
        map.record(1, 42);
        assert_eq!(map.row_of(1), Some(42));
        assert!(!map.is_synthetic(1));
    }

    #[test]
    fn synthetic_entries_inherit_parent_row() {
        let mut map = LineMap::new();
        map.record(1, 42);
        map.record_synthetic(2, 42);
        assert_eq!(map.row_of(2), Some(42));
        assert!(map.is_synthetic(2));
        assert!(!map.is_synthetic(1));
    }

    #[test]
    fn unknown_id_is_none() {
        let map = LineMap::new();
        assert_eq!(map.row_of(99), None);
        assert!(!map.is_synthetic(99));
    }

    #[test]
    #[should_panic(expected = "already present")]
    fn double_record_panics() {
        let mut map = LineMap::new();
        map.record(1, 1);
        map.record(1, 2);
    }
}
