//! Belgian VAT number value type.
//!
//! # Responsibility
//! - Recognize VAT-shaped input and normalize it to `BE` + 10 digits.
//!
//! # Invariants
//! - A `VatNumber` can only be built through [`VatNumber::parse`], so holding
//!   one means the value is normalized.
//! - Only the `BE` literal is case-insensitive; digits are kept as typed.
//! - Digit-only input is accepted and treated as Belgian.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

const COUNTRY_PREFIX: &str = "BE";

static VAT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:[Bb][Ee])?([0-9]{10})$").expect("valid vat regex"));

/// Normalized Belgian VAT number (`BE0123456789`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VatNumber(String);

/// Input is not a Belgian VAT number after whitespace removal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidVatNumber(pub String);

impl Display for InvalidVatNumber {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "not a Belgian VAT number: `{}`", self.0)
    }
}

impl Error for InvalidVatNumber {}

impl VatNumber {
    /// Parses raw user input, ignoring all whitespace.
    ///
    /// Returns `None` when the stripped input is not `BE?` + exactly 10 digits.
    pub fn parse(raw: &str) -> Option<Self> {
        let compact = strip_whitespace(raw);
        let captures = VAT_RE.captures(&compact)?;
        let digits = captures.get(1)?.as_str();
        Some(Self(format!("{COUNTRY_PREFIX}{digits}")))
    }

    /// Returns the normalized form, e.g. `BE0123456789`.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the 10 digits without the country prefix.
    pub fn digits(&self) -> &str {
        &self.0[COUNTRY_PREFIX.len()..]
    }
}

impl Display for VatNumber {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for VatNumber {
    type Err = InvalidVatNumber;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value).ok_or_else(|| InvalidVatNumber(value.to_string()))
    }
}

impl AsRef<str> for VatNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for VatNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for VatNumber {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Removes every Unicode whitespace character.
pub(crate) fn strip_whitespace(raw: &str) -> String {
    raw.chars().filter(|ch| !ch.is_whitespace()).collect()
}

#[cfg(test)]
mod tests {
    use super::VatNumber;

    #[test]
    fn parse_prepends_country_prefix() {
        let vat = VatNumber::parse("0123456789").expect("digits should parse");
        assert_eq!(vat.as_str(), "BE0123456789");
        assert_eq!(vat.digits(), "0123456789");
    }

    #[test]
    fn parse_accepts_lowercase_prefix_and_inner_spaces() {
        let vat = VatNumber::parse(" be 0123 456 789 ").expect("spaced input should parse");
        assert_eq!(vat.as_str(), "BE0123456789");
    }

    #[test]
    fn parse_rejects_wrong_digit_counts() {
        assert!(VatNumber::parse("012345678").is_none());
        assert!(VatNumber::parse("BE01234567890").is_none());
        assert!(VatNumber::parse("NL0123456789").is_none());
        assert!(VatNumber::parse("").is_none());
    }

    #[test]
    fn serde_uses_normalized_string() {
        let vat: VatNumber = serde_json::from_str("\"be0403200393\"").unwrap();
        assert_eq!(serde_json::to_string(&vat).unwrap(), "\"BE0403200393\"");
        assert!(serde_json::from_str::<VatNumber>("\"12345\"").is_err());
    }
}
