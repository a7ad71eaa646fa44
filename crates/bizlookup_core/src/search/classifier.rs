//! Query classification for the search bar.
//!
//! # Responsibility
//! - Decide whether raw input is a VAT number, a name query or nothing.
//!
//! # Invariants
//! - VAT-shaped input with the wrong digit count is never an error; it falls
//!   through to name classification.
//! - Inputs under two characters never trigger a lookup.

use crate::model::vat::{strip_whitespace, VatNumber};
use serde::Serialize;

/// Minimum trimmed length for a name query to be looked up.
pub const MIN_NAME_QUERY_CHARS: usize = 2;

/// Classification of one search-bar input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum QueryKind {
    /// Nothing to look up.
    Empty,
    /// Normalized VAT number, `BE` + 10 digits.
    VatNumber(VatNumber),
    /// Trimmed name text of at least two characters.
    NamePrefix(String),
}

impl QueryKind {
    /// True when the input should feed the suggestion dropdown.
    pub fn wants_suggestions(&self) -> bool {
        matches!(self, Self::NamePrefix(_))
    }

    /// True when the input has a valid VAT number shape.
    pub fn is_valid_vat(&self) -> bool {
        matches!(self, Self::VatNumber(_))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// Classifies raw search-bar input.
///
/// 1. All whitespace is stripped; nothing left means `Empty`.
/// 2. `BE?` + exactly 10 digits means `VatNumber`, `BE` prepended if absent.
/// 3. Otherwise the trimmed input is a `NamePrefix` when it has at least
///    [`MIN_NAME_QUERY_CHARS`] characters, else `Empty`.
pub fn classify(raw: &str) -> QueryKind {
    if strip_whitespace(raw).is_empty() {
        return QueryKind::Empty;
    }

    if let Some(vat) = VatNumber::parse(raw) {
        return QueryKind::VatNumber(vat);
    }

    let trimmed = raw.trim();
    if trimmed.chars().count() >= MIN_NAME_QUERY_CHARS {
        QueryKind::NamePrefix(trimmed.to_string())
    } else {
        QueryKind::Empty
    }
}
