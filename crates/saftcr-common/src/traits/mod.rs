//! Small generic traits reused across the validator.

pub mod bool_ext;
