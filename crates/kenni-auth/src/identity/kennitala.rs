//! Icelandic national identifier (kennitala) parsing.
//!
//! Layout of the ten digits `DDMMYY-RRCX`:
//!
//! - `DD` day of birth, plus 40 for companies (41-71)
//! - `MM` month, `YY` two-digit year
//! - `RR` sequence, `C` mod-11 check digit
//! - `X` century: `8` 1800s, `9` 1900s, `0` 2000s

use serde::{Deserialize, Serialize};
use time::{Date, Month};

const CHECK_WEIGHTS: [u32; 8] = [3, 2, 7, 6, 5, 4, 3, 2];
const COMPANY_DAY_OFFSET: u8 = 40;

/// Whether a kennitala belongs to a person or a legal entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KennitalaKind {
    /// A natural person.
    Individual,
    /// A company or other legal entity.
    Company,
}

impl KennitalaKind {
    /// Get the kind as a string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Individual => "individual",
            Self::Company => "company",
        }
    }

    /// Parse a kind from its stored string form.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "individual" => Some(Self::Individual),
            "company" => Some(Self::Company),
            _ => None,
        }
    }
}

impl std::fmt::Display for KennitalaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Facts derived from a kennitala.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NationalIdentity {
    /// The ten digits, without separator.
    pub kennitala: String,
    /// Person or company.
    pub kind: KennitalaKind,
    /// Date of birth (or registration, for companies).
    pub birth_date: Date,
}

/// Errors parsing a kennitala.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NationalIdError {
    /// Not ten digits (with an optional `-` after the sixth).
    #[error("Kennitala must be 10 digits")]
    InvalidFormat,

    /// The encoded date does not exist.
    #[error("Kennitala encodes an invalid date")]
    InvalidDate,

    /// The century digit is not 8, 9 or 0.
    #[error("Invalid century digit: {0}")]
    InvalidCentury(u8),

    /// The check digit does not match.
    #[error("Kennitala check digit mismatch")]
    ChecksumMismatch,
}

/// Parses a kennitala.
///
/// The mod-11 check digit is only verified when `verify_checksum` is set.
///
/// # Errors
///
/// Returns a [`NationalIdError`] describing the first problem found.
pub fn parse_kennitala(raw: &str, verify_checksum: bool) -> Result<NationalIdentity, NationalIdError> {
    let normalized = normalize(raw).ok_or(NationalIdError::InvalidFormat)?;
    let digits: Vec<u8> = normalized.bytes().map(|b| b - b'0').collect();

    let pair = |i: usize| digits[i] * 10 + digits[i + 1];
    let raw_day = pair(0);
    let month = pair(2);
    let short_year = i32::from(pair(4));

    let (kind, day) = match raw_day {
        1..=31 => (KennitalaKind::Individual, raw_day),
        41..=71 => (KennitalaKind::Company, raw_day - COMPANY_DAY_OFFSET),
        _ => return Err(NationalIdError::InvalidDate),
    };

    let century = match digits[9] {
        8 => 1800,
        9 => 1900,
        0 => 2000,
        other => return Err(NationalIdError::InvalidCentury(other)),
    };

    let month = Month::try_from(month).map_err(|_| NationalIdError::InvalidDate)?;
    let birth_date = Date::from_calendar_date(century + short_year, month, day)
        .map_err(|_| NationalIdError::InvalidDate)?;

    if verify_checksum && !checksum_matches(&digits) {
        return Err(NationalIdError::ChecksumMismatch);
    }

    Ok(NationalIdentity {
        kennitala: normalized,
        kind,
        birth_date,
    })
}

/// Masks all but the first six digits, for logs.
#[must_use]
pub fn mask_kennitala(kennitala: &str) -> String {
    let visible: String = kennitala.chars().take(6).collect();
    format!("{visible}-****")
}

fn normalize(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let compact = match raw.len() {
        10 => raw.to_string(),
        11 if raw.as_bytes()[6] == b'-' => format!("{}{}", &raw[..6], &raw[7..]),
        _ => return None,
    };
    compact
        .bytes()
        .all(|b| b.is_ascii_digit())
        .then_some(compact)
}

fn checksum_matches(digits: &[u8]) -> bool {
    let sum: u32 = CHECK_WEIGHTS
        .iter()
        .zip(digits)
        .map(|(w, d)| w * u32::from(*d))
        .sum();
    let check = match 11 - sum % 11 {
        11 => 0,
        10 => return false,
        c => c,
    };
    check == u32::from(digits[8])
}
