//! Tiered transport fee for at-home (mobile) services.
//!
//! | Distance            | Fee |
//! |---------------------|-----|
//! | `d <= 10 km`        | 0   |
//! | `10 < d <= 25 km`   | 15  |
//! | `d > 25 km`         | 20  |
//!
//! The 20 tier is a hard cap. Long trips are for the provider to decline,
//! not for the client to block.

use rust_decimal::Decimal;

use crate::geo::{distance_km, Coordinate};

const FREE_RADIUS_KM: f64 = 10.0;
const MID_RADIUS_KM: f64 = 25.0;
const MID_FEE: i64 = 15;
const MAX_FEE: i64 = 20;

/// `true` for a distance the fee table is defined on: finite and not negative.
#[must_use]
pub fn is_valid_distance(distance_km: f64) -> bool {
    distance_km.is_finite() && distance_km >= 0.0
}

/// Fee for a trip of `distance_km` kilometres.
///
/// Distances outside [`is_valid_distance`] are charged nothing.
#[must_use]
pub fn fee_for(distance_km: f64) -> Decimal {
    if !is_valid_distance(distance_km) || distance_km <= FREE_RADIUS_KM {
        Decimal::ZERO
    } else if distance_km <= MID_RADIUS_KM {
        Decimal::from(MID_FEE)
    } else {
        Decimal::from(MAX_FEE)
    }
}

/// Derived transport quote. Recomputed whenever the address or provider
/// changes, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportQuote {
    /// `None` when the distance could not be computed.
    pub distance_km: Option<f64>,
    pub fee: Decimal,
    /// Soft, informational error. Never blocks the booking.
    pub error: Option<String>,
}

impl TransportQuote {
    /// Quote for a provider that does not travel: no distance, no fee.
    #[must_use]
    pub fn not_applicable() -> Self {
        Self {
            distance_km: None,
            fee: Decimal::ZERO,
            error: None,
        }
    }

    /// Quote for a known distance. An invalid distance yields an unresolved
    /// quote instead of a fee.
    #[must_use]
    pub fn from_distance(distance_km: f64) -> Self {
        if !is_valid_distance(distance_km) {
            return Self::unresolved(format!("invalid distance: {distance_km} km"));
        }
        Self {
            distance_km: Some(distance_km),
            fee: fee_for(distance_km),
            error: None,
        }
    }

    #[must_use]
    pub fn unresolved(reason: impl Into<String>) -> Self {
        Self {
            distance_km: None,
            fee: Decimal::ZERO,
            error: Some(reason.into()),
        }
    }

    /// `true` when the quote should appear as a line item on the booking.
    #[must_use]
    pub fn has_fee_line(&self) -> bool {
        self.distance_km.is_some() && !self.fee.is_zero()
    }
}

/// Build a transport quote from whatever location data is available.
///
/// Only mobile services are charged. Missing coordinates on either side
/// produce a zero-fee quote carrying a soft error.
#[must_use]
pub fn quote_transport(
    mobile_service: bool,
    provider: Option<Coordinate>,
    customer: Option<Coordinate>,
) -> TransportQuote {
    if !mobile_service {
        return TransportQuote::not_applicable();
    }
    match (provider, customer) {
        (Some(p), Some(c)) if p.is_valid() && c.is_valid() => {
            TransportQuote::from_distance(distance_km(p, c))
        }
        (None, _) => TransportQuote::unresolved("provider location is unknown"),
        _ => TransportQuote::unresolved("address could not be located"),
    }
}
