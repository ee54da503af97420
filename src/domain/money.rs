use crate::error::PaymentError;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// Currencies whose smallest unit is the major unit (no minor-unit scaling).
const ZERO_DECIMAL_CURRENCIES: &[&str] = &[
    "bif", "clp", "djf", "gnf", "jpy", "kmf", "krw", "mga", "pyg", "rwf", "ugx", "vnd", "vuv",
    "xaf", "xof", "xpf",
];

/// Represents a strictly positive parcel cost in major currency units.
///
/// Wraps `rust_decimal::Decimal` so that a parcel can never be priced at zero
/// or below, whether it arrives from a client request or from storage.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Cost(Decimal);

impl Cost {
    pub fn new(value: Decimal) -> Result<Self, PaymentError> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(PaymentError::ValidationError(
                "Cost must be positive".to_string(),
            ))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Cost {
    type Error = PaymentError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Cost> for Decimal {
    fn from(cost: Cost) -> Self {
        cost.0
    }
}

/// Number of decimal places between the major and minor unit of `currency`.
pub fn minor_unit_exponent(currency: &str) -> u32 {
    let currency = currency.to_ascii_lowercase();
    if ZERO_DECIMAL_CURRENCIES.contains(&currency.as_str()) {
        0
    } else {
        2
    }
}

/// Converts a major-unit cost into the provider's integer minor units.
///
/// Any fractional minor-unit remainder is truncated, so `12.999` USD becomes
/// `1299`. Amounts that truncate to zero are rejected.
pub fn to_minor_units(cost: Cost, currency: &str) -> Result<i64, PaymentError> {
    let scale = Decimal::from(10_i64.pow(minor_unit_exponent(currency)));
    let minor = cost
        .value()
        .checked_mul(scale)
        .and_then(|scaled| scaled.trunc().to_i64())
        .ok_or_else(|| PaymentError::ValidationError("Cost is too large".to_string()))?;

    if minor < 1 {
        return Err(PaymentError::ValidationError(
            "Cost is below the smallest chargeable amount".to_string(),
        ));
    }
    Ok(minor)
}

/// Converts a provider minor-unit amount back into major units.
pub fn from_minor_units(minor: i64, currency: &str) -> Decimal {
    Decimal::new(minor, minor_unit_exponent(currency)).normalize()
}
