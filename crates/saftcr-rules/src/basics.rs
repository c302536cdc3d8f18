//! Shared `Basics` table lookup: every reference type (`eventType`,
//! `lineType`, `paymentType`, `raiseType`, `transType`) resolves the same
//! way, first by `id`, falling back to `desc`.

use saftcr_model::entities::Basics;

/// Resolve `key` against `basics`, trying `id` first, then `desc`.
pub fn resolve<'a>(basics: &'a [Basics], key: &str) -> Option<&'a Basics> {
    basics
        .iter()
        .find(|b| b.id == key)
        .or_else(|| basics.iter().find(|b| b.desc == key))
}

/// The resolved predefined-basic code for `key`, if it resolves at all.
pub fn predefined_id<'a>(basics: &'a [Basics], key: &str) -> Option<&'a str> {
    resolve(basics, key).and_then(|b| b.predefined_id.as_deref())
}
