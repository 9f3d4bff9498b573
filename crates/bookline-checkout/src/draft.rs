//! What the UI collects before "pay now", and what it gets back after.

use bookline_core::{Coordinate, PaymentMethod, Provider, ServiceOffering};
use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;

use crate::error::CheckoutError;

/// Fields accumulated by the booking screens. Consumed by value by the
/// checkout, so one draft backs exactly one transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingDraft {
    pub provider_id: String,
    pub provider_name: String,
    /// First entry is the primary service.
    pub services: Vec<ServiceOffering>,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub address: String,
    pub notes: Option<String>,
    pub payment_method: PaymentMethod,
    /// Provider travels to `address`; enables the transport fee.
    pub mobile_service: bool,
    /// Known provider location. Falls back to the cached provider list.
    pub provider_location: Option<Coordinate>,
    /// Distance already computed by the UI, if any.
    pub transport_distance_km: Option<f64>,
    /// Already-geocoded customer address, if any.
    pub customer_location: Option<Coordinate>,
}

impl BookingDraft {
    /// Draft for `provider` with one selected service.
    #[must_use]
    pub fn for_provider(
        provider: &Provider,
        service: ServiceOffering,
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
        address: impl Into<String>,
        payment_method: PaymentMethod,
    ) -> Self {
        Self {
            provider_id: provider.id.clone(),
            provider_name: provider.name.clone(),
            services: vec![service],
            date,
            start_time,
            end_time,
            address: address.into(),
            notes: None,
            payment_method,
            mobile_service: provider.offers_mobile_service,
            provider_location: provider.location,
            transport_distance_km: None,
            customer_location: None,
        }
    }

    #[must_use]
    pub fn service_price(&self) -> Decimal {
        self.services.iter().map(|s| s.price).sum()
    }

    #[must_use]
    pub fn is_multi_service(&self) -> bool {
        self.services.len() > 1
    }

    #[must_use]
    pub fn service_names(&self) -> String {
        self.services
            .iter()
            .map(|s| s.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// A booking carries a single `date`, so the time window must start and
    /// end on that day. Windows crossing midnight are rejected.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::InvalidDraft`] naming the first missing or
    /// inconsistent field.
    pub fn validate(&self) -> Result<(), CheckoutError> {
        let invalid = |reason: &str| Err(CheckoutError::InvalidDraft(reason.to_string()));
        if self.provider_id.trim().is_empty() {
            return invalid("no provider selected");
        }
        if self.services.is_empty() {
            return invalid("no service selected");
        }
        if self.services.iter().any(|s| s.price.is_sign_negative()) {
            return invalid("service price cannot be negative");
        }
        if self.address.trim().is_empty() {
            return invalid("address is required");
        }
        if self.end_time <= self.start_time {
            return invalid("time window must end after it starts on the same day");
        }
        if self
            .transport_distance_km
            .is_some_and(|d| !d.is_finite() || d < 0.0)
        {
            return invalid("transport distance is not a valid number");
        }
        Ok(())
    }
}

/// Summary shown on the confirmation screen after a successful payment.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingConfirmation {
    pub booking_id: String,
    pub provider_name: String,
    pub service_name: String,
    pub total_price: Decimal,
    pub amount_paid: Decimal,
    pub transport_fee: Decimal,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub address: String,
    pub payment_method: PaymentMethod,
    pub multi_service: bool,
}
