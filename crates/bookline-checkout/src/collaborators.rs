//! External collaborators of the checkout.
//!
//! Geocoding and payment confirmation are awaited steps of the transaction.
//! Notifications and analytics are fire-and-forget side channels: their
//! methods are synchronous, return nothing, and must not block.

use async_trait::async_trait;
use bookline_core::Coordinate;
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeocodeError {
    #[error("no match for address")]
    NotFound,

    #[error("geocoding service unavailable: {0}")]
    Unavailable(String),
}

/// Address string to coordinate. Best-effort.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, address: &str) -> Result<Coordinate, GeocodeError>;
}

/// Terminal result of the provider's confirmation flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentOutcome {
    Succeeded,
    Failed(String),
    Canceled,
}

/// Opaque payment-confirmation flow.
///
/// Implementations present their UI on a context supplied by the host; the
/// checkout only awaits the outcome. Never retried automatically.
#[async_trait]
pub trait PaymentSheet: Send + Sync {
    async fn confirm(&self, client_secret: &str) -> PaymentOutcome;
}

pub trait NotificationSink: Send + Sync {
    fn notify_payment_success(&self, booking_id: &str, amount: Decimal);
    fn notify_payment_failed(&self, booking_id: &str);
    /// `amount` is `None` when a full refund was requested and the backend
    /// did not report the refunded amount.
    fn notify_refund_processed(&self, booking_id: &str, amount: Option<Decimal>);
}

pub trait AnalyticsSink: Send + Sync {
    fn log_event(&self, name: &str, params: &[(&str, String)]);
    fn record_error(&self, error: &(dyn std::error::Error + Send + Sync), context: &[(&str, String)]);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl NotificationSink for NoopNotifier {
    fn notify_payment_success(&self, _booking_id: &str, _amount: Decimal) {}
    fn notify_payment_failed(&self, _booking_id: &str) {}
    fn notify_refund_processed(&self, _booking_id: &str, _amount: Option<Decimal>) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAnalytics;

impl AnalyticsSink for NoopAnalytics {
    fn log_event(&self, _name: &str, _params: &[(&str, String)]) {}
    fn record_error(
        &self,
        _error: &(dyn std::error::Error + Send + Sync),
        _context: &[(&str, String)],
    ) {
    }
}

/// Analytics sink that writes events to the `tracing` log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAnalytics;

impl AnalyticsSink for TracingAnalytics {
    fn log_event(&self, name: &str, params: &[(&str, String)]) {
        tracing::info!(event = name, params = ?params, "analytics event");
    }

    fn record_error(&self, error: &(dyn std::error::Error + Send + Sync), context: &[(&str, String)]) {
        tracing::warn!(error = %error, context = ?context, "analytics error report");
    }
}
