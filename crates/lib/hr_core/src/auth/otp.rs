//! One-time password generation and matching.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rand::{Rng, rng};
use serde::{Deserialize, Serialize};

use crate::models::auth::OtpRecord;

/// Smallest code issued (inclusive).
pub const OTP_MIN: u32 = 100_000;

/// Largest code issued (inclusive).
pub const OTP_MAX: u32 = 999_999;

/// Number of digits in every code.
pub const OTP_DIGITS: usize = 6;

/// Draw a six-digit code uniformly from `[100000, 999999]`.
///
/// Uses the thread-local CSPRNG, which is seeded from the OS and reseeds
/// itself; callers never seed it.
pub fn generate_otp() -> String {
    rng().random_range(OTP_MIN..=OTP_MAX).to_string()
}

/// Which unused records a supplied code may match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OtpMatchPolicy {
    /// Any unused, unexpired record for the principal.
    #[default]
    AnyUnused,
    /// Only the most recently requested unused record; earlier codes are
    /// implicitly superseded.
    MostRecent,
}

impl fmt::Display for OtpMatchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OtpMatchPolicy::AnyUnused => "any-unused",
            OtpMatchPolicy::MostRecent => "most-recent",
        })
    }
}

impl FromStr for OtpMatchPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "any-unused" => Ok(OtpMatchPolicy::AnyUnused),
            "most-recent" => Ok(OtpMatchPolicy::MostRecent),
            other => Err(format!(
                "unknown OTP match policy '{other}' (expected any-unused or most-recent)"
            )),
        }
    }
}

/// Whether `code` has the shape of an issued code. Cheap pre-check before
/// touching the store.
pub fn is_well_formed(code: &str) -> bool {
    code.len() == OTP_DIGITS && code.bytes().all(|b| b.is_ascii_digit())
}

/// Compare two codes without short-circuiting on the first differing byte.
pub(crate) fn codes_match(expected: &str, supplied: &str) -> bool {
    let (a, b) = (expected.as_bytes(), supplied.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Pick the record `supplied` unlocks at `now`, if any.
///
/// `records` are the principal's unused records in any order.
pub fn select_live<'a>(
    records: &'a [OtpRecord],
    supplied: &str,
    now: DateTime<Utc>,
    policy: OtpMatchPolicy,
) -> Option<&'a OtpRecord> {
    match policy {
        OtpMatchPolicy::AnyUnused => records
            .iter()
            .filter(|r| r.is_live(now))
            .find(|r| codes_match(&r.code, supplied)),
        OtpMatchPolicy::MostRecent => records
            .iter()
            .filter(|r| !r.is_used)
            .max_by_key(|r| (r.requested_at, r.id))
            .filter(|r| r.is_live(now) && codes_match(&r.code, supplied)),
    }
}
