//! Diff-to-patch compilation for resume records.
//!
//! Given the record currently stored and a caller-proposed new version,
//! [`assembler::compile_patch`] computes the minimal set of mutations that
//! transforms one into the other: per-field Set operations for changed
//! scalars, positional Set/Remove/Add reconciliation for the four ordered
//! collections, and one unconditional Set of the `last_updated` timestamp.
//! The engine is a pure function of `(current, proposed)`; nothing here
//! touches storage or retains state between calls.

pub mod assembler;
pub mod diff;
pub mod entities;
pub mod path;
pub mod placeholder;
