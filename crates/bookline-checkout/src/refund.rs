//! Refund of a paid booking.

use std::sync::Arc;

use bookline_api::{BookingApi, RefundRequest, RefundResponse};
use rust_decimal::Decimal;

use crate::collaborators::{AnalyticsSink, NoopAnalytics, NotificationSink};
use crate::error::CheckoutError;
use crate::presentation::present;
use crate::ui::{UiDispatcher, UiEvent};

#[derive(Clone)]
pub struct RefundFlow {
    api: BookingApi,
    notifier: Arc<dyn NotificationSink>,
    analytics: Arc<dyn AnalyticsSink>,
    ui: UiDispatcher,
}

impl RefundFlow {
    #[must_use]
    pub fn new(api: BookingApi, notifier: Arc<dyn NotificationSink>, ui: UiDispatcher) -> Self {
        Self {
            api,
            notifier,
            analytics: Arc::new(NoopAnalytics),
            ui,
        }
    }

    #[must_use]
    pub fn with_analytics(mut self, analytics: Arc<dyn AnalyticsSink>) -> Self {
        self.analytics = analytics;
        self
    }

    /// Refund `payment_intent_id`, in full when `amount` is `None`.
    ///
    /// On success fires `notify_refund_processed` with the refunded amount
    /// (as reported by the backend, else as requested) and posts a notice.
    /// A full refund whose amount the backend omits is reported without one.
    /// On failure posts one error message, unless the request was cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::Refund`] wrapping the backend error.
    pub async fn refund(
        &self,
        booking_id: &str,
        payment_intent_id: &str,
        amount: Option<Decimal>,
    ) -> Result<RefundResponse, CheckoutError> {
        let _processing = self.ui.begin_processing();
        let request = RefundRequest {
            payment_intent_id: payment_intent_id.to_string(),
            amount,
            reason: None,
        };

        match self.api.refund_payment(&request).await {
            Ok(response) => {
                let refunded = response.amount.or(amount);
                match refunded {
                    Some(value) => tracing::info!(
                        booking_id,
                        payment_intent_id,
                        amount = %value,
                        "refund processed"
                    ),
                    None => tracing::warn!(
                        booking_id,
                        payment_intent_id,
                        "refund processed; backend did not report the amount"
                    ),
                }
                self.notifier.notify_refund_processed(booking_id, refunded);
                let mut params = vec![("booking_id", booking_id.to_string())];
                if let Some(value) = refunded {
                    params.push(("amount", value.to_string()));
                }
                self.analytics.log_event("refund_processed", &params);
                self.ui.send(UiEvent::ShowNotice(match refunded {
                    Some(value) => {
                        format!("Refund of {value} processed for booking {booking_id}.")
                    }
                    None => format!("Refund processed for booking {booking_id}."),
                }));
                Ok(response)
            }
            Err(source) => {
                let err = CheckoutError::Refund {
                    payment_intent_id: payment_intent_id.to_string(),
                    source,
                };
                if !err.is_superseded() {
                    tracing::warn!(booking_id, error = %err, "refund failed");
                    self.analytics.record_error(
                        &err,
                        &[
                            ("action", err.action().to_string()),
                            ("booking_id", booking_id.to_string()),
                        ],
                    );
                }
                if let Some(shown) = present(&err) {
                    self.ui.send(UiEvent::ShowError(shown));
                }
                Err(err)
            }
        }
    }
}

impl std::fmt::Debug for RefundFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefundFlow")
            .field("api", &self.api)
            .finish_non_exhaustive()
    }
}
