use crate::error::PaymentError;
use chrono::{NaiveDate, Utc};
use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const TRACKING_PREFIX: &str = "PRCL";

const DATE_FORMAT: &str = "%Y%m%d";
const SUFFIX_BYTES: usize = 3;

/// Human-facing shipment identifier of the form `PRCL-YYYYMMDD-XXXXXX`.
///
/// The date segment is the UTC calendar date at generation time and the
/// suffix is six uppercase hexadecimal characters drawn from the OS random
/// source. Collisions are not checked.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TrackingId(String);

impl TrackingId {
    /// Generates a fresh tracking id for today's UTC date.
    pub fn generate() -> Self {
        let mut suffix = [0_u8; SUFFIX_BYTES];
        OsRng.fill_bytes(&mut suffix);
        Self::from_parts(Utc::now().date_naive(), suffix)
    }

    pub fn from_parts(date: NaiveDate, suffix: [u8; SUFFIX_BYTES]) -> Self {
        Self(format!(
            "{TRACKING_PREFIX}-{}-{}",
            date.format(DATE_FORMAT),
            hex::encode_upper(suffix)
        ))
    }

    /// The UTC date encoded in the identifier.
    pub fn date(&self) -> NaiveDate {
        // The format was checked on construction.
        NaiveDate::parse_from_str(&self.0[5..13], DATE_FORMAT).unwrap_or_default()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for TrackingId {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PaymentError::ValidationError(format!("Malformed tracking id: {s}"));

        let mut parts = s.split('-');
        let (Some(prefix), Some(date), Some(suffix), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };

        if prefix != TRACKING_PREFIX
            || date.len() != 8
            || !date.bytes().all(|b| b.is_ascii_digit())
            || NaiveDate::parse_from_str(date, DATE_FORMAT).is_err()
            || suffix.len() != SUFFIX_BYTES * 2
            || !suffix
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'A'..=b'F').contains(&b))
        {
            return Err(invalid());
        }

        Ok(Self(s.to_string()))
    }
}

impl TryFrom<String> for TrackingId {
    type Error = PaymentError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TrackingId> for String {
    fn from(id: TrackingId) -> Self {
        id.0
    }
}

impl fmt::Display for TrackingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
