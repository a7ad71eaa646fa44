//! Domain model for the business lookup core.
//!
//! # Responsibility
//! - Define the value types shared by classifier, directory and history code.
//!
//! # Invariants
//! - VAT numbers only exist in normalized form.
//! - History entries are never mutated after creation.

pub mod company;
pub mod history;
pub mod vat;
