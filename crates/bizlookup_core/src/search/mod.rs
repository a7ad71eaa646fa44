//! Search-bar logic: input classification and type-ahead suggestions.
//!
//! # Responsibility
//! - Classify raw input as VAT number, name query or nothing.
//! - Debounce name lookups and discard superseded results.

pub mod classifier;
pub mod suggest;
