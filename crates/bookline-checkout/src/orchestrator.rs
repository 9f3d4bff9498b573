//! The "pay now" transaction.
//!
//! One call to [`CheckoutOrchestrator::pay_now`] walks a single draft through
//! geocoding, amount computation, booking creation, payment-intent creation
//! (only when the backend did not return a client secret) and payment
//! confirmation. Steps run strictly in order. Every terminal outcome ends the
//! processing indicator and shows at most one message; superseded
//! transactions end silently.
//!
//! A booking that was created but never paid is left as is. No compensating
//! cancellation is issued.

use std::sync::Arc;

use bookline_api::{
    ApiError, BookingApi, CancellationToken, CreateBookingRequest, PaymentIntentRequest,
};
use bookline_core::{amount_due, quote_transport, AmountBreakdown, Coordinate, TransportQuote};
use uuid::Uuid;

use crate::collaborators::{
    AnalyticsSink, Geocoder, NoopAnalytics, NoopNotifier, NotificationSink, PaymentOutcome,
    PaymentSheet,
};
use crate::draft::{BookingConfirmation, BookingDraft};
use crate::error::CheckoutError;
use crate::presentation::present;
use crate::refund::RefundFlow;
use crate::state::CheckoutState;
use crate::ui::{UiDispatcher, UiEvent};

const DEFAULT_CURRENCY: &str = "EUR";

/// What happened to one transaction. The UI has already been told; the
/// report is for the caller's own bookkeeping and for tests.
#[derive(Debug, Clone)]
pub struct CheckoutReport {
    /// Also sent as the booking's `Idempotency-Key`.
    pub transaction_id: Uuid,
    pub state: CheckoutState,
    /// Every state visited, starting at [`CheckoutState::Idle`].
    pub trail: Vec<CheckoutState>,
    pub booking_id: Option<String>,
    pub quote: Option<TransportQuote>,
    pub amounts: Option<AmountBreakdown>,
    pub result: Result<BookingConfirmation, CheckoutError>,
}

impl CheckoutReport {
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.state == CheckoutState::Completed
    }
}

/// Per-transaction bookkeeping. Owned by a single `pay_now` call.
struct Transaction {
    id: Uuid,
    state: CheckoutState,
    trail: Vec<CheckoutState>,
    booking_id: Option<String>,
    quote: Option<TransportQuote>,
    amounts: Option<AmountBreakdown>,
}

impl Transaction {
    fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            state: CheckoutState::Idle,
            trail: vec![CheckoutState::Idle],
            booking_id: None,
            quote: None,
            amounts: None,
        }
    }

    fn advance(&mut self, next: CheckoutState) {
        let legal = self.state.can_transition_to(next);
        debug_assert!(legal, "illegal checkout transition {} -> {next}", self.state);
        if !legal {
            tracing::warn!(
                transaction_id = %self.id,
                from = %self.state,
                to = %next,
                "illegal checkout transition"
            );
        }
        tracing::info!(transaction_id = %self.id, from = %self.state, state = %next, "checkout state");
        self.state = next;
        self.trail.push(next);
    }

    fn into_report(self, result: Result<BookingConfirmation, CheckoutError>) -> CheckoutReport {
        CheckoutReport {
            transaction_id: self.id,
            state: self.state,
            trail: self.trail,
            booking_id: self.booking_id,
            quote: self.quote,
            amounts: self.amounts,
            result,
        }
    }
}

/// Drives checkout transactions. Holds no per-transaction state, so one
/// orchestrator can run several transactions concurrently.
#[derive(Clone)]
pub struct CheckoutOrchestrator {
    api: BookingApi,
    geocoder: Arc<dyn Geocoder>,
    payment_sheet: Arc<dyn PaymentSheet>,
    notifier: Arc<dyn NotificationSink>,
    analytics: Arc<dyn AnalyticsSink>,
    ui: UiDispatcher,
    currency: String,
}

impl CheckoutOrchestrator {
    /// Orchestrator with no-op notification and analytics sinks and `EUR`
    /// as the currency.
    #[must_use]
    pub fn new(
        api: BookingApi,
        geocoder: Arc<dyn Geocoder>,
        payment_sheet: Arc<dyn PaymentSheet>,
        ui: UiDispatcher,
    ) -> Self {
        Self {
            api,
            geocoder,
            payment_sheet,
            notifier: Arc::new(NoopNotifier),
            analytics: Arc::new(NoopAnalytics),
            ui,
            currency: DEFAULT_CURRENCY.to_string(),
        }
    }

    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn NotificationSink>) -> Self {
        self.notifier = notifier;
        self
    }

    #[must_use]
    pub fn with_analytics(mut self, analytics: Arc<dyn AnalyticsSink>) -> Self {
        self.analytics = analytics;
        self
    }

    #[must_use]
    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    /// Refund flow sharing this orchestrator's backend, sinks and UI channel.
    #[must_use]
    pub fn refunds(&self) -> RefundFlow {
        RefundFlow::new(self.api.clone(), Arc::clone(&self.notifier), self.ui.clone())
            .with_analytics(Arc::clone(&self.analytics))
    }

    /// Run one checkout to a terminal state.
    pub async fn pay_now(&self, draft: BookingDraft) -> CheckoutReport {
        self.pay_now_cancellable(draft, CancellationToken::new()).await
    }

    /// Like [`CheckoutOrchestrator::pay_now`], but cancelling `cancel`
    /// abandons the transaction at the next backend call or step boundary.
    /// An abandoned transaction ends in [`CheckoutState::Canceled`] without
    /// showing an error. Payment confirmation, once started, always runs to
    /// its outcome.
    pub async fn pay_now_cancellable(
        &self,
        draft: BookingDraft,
        cancel: CancellationToken,
    ) -> CheckoutReport {
        let _processing = self.ui.begin_processing();
        let mut tx = Transaction::new();
        tracing::info!(
            transaction_id = %tx.id,
            provider_id = %draft.provider_id,
            payment_method = %draft.payment_method,
            "checkout started"
        );

        let result = self.run(&mut tx, draft, &cancel).await;
        self.finish(&mut tx, &result);
        tx.into_report(result)
    }

    async fn run(
        &self,
        tx: &mut Transaction,
        draft: BookingDraft,
        cancel: &CancellationToken,
    ) -> Result<BookingConfirmation, CheckoutError> {
        draft.validate()?;

        tx.advance(CheckoutState::GeocodingAddress);
        let (quote, customer_location) = self.resolve_transport(tx.id, &draft).await;
        tx.quote = Some(quote.clone());
        if cancel.is_cancelled() {
            return Err(CheckoutError::Superseded { booking_id: None });
        }

        tx.advance(CheckoutState::ComputingAmount);
        let amounts = amount_due(draft.service_price(), quote.fee, draft.payment_method);
        tx.amounts = Some(amounts);

        tx.advance(CheckoutState::CreatingBooking);
        let payload = self.booking_payload(&draft, &quote, customer_location, &amounts);
        let created = self
            .api
            .create_booking(&payload, &tx.id.to_string(), Some(cancel))
            .await
            .map_err(|err| match err {
                ApiError::Cancelled => CheckoutError::Superseded { booking_id: None },
                other => CheckoutError::BookingCreation(other),
            })?;
        let booking_id = created.booking.id.clone();
        tx.booking_id = Some(booking_id.clone());
        tracing::info!(transaction_id = %tx.id, booking_id = %booking_id, "booking created");

        let client_secret = match created.client_secret.filter(|s| !s.trim().is_empty()) {
            Some(secret) => secret,
            None => {
                tx.advance(CheckoutState::EnsuringPaymentIntent);
                let intent = PaymentIntentRequest {
                    booking_id: booking_id.clone(),
                    amount: amounts.amount_due,
                    currency: self.currency.clone(),
                };
                let response = self
                    .api
                    .create_payment_intent(&intent, Some(cancel))
                    .await
                    .map_err(|err| match err {
                        ApiError::Cancelled => CheckoutError::Superseded {
                            booking_id: Some(booking_id.clone()),
                        },
                        other => CheckoutError::PaymentIntent {
                            booking_id: booking_id.clone(),
                            source: other,
                        },
                    })?;
                if response.client_secret.trim().is_empty() {
                    return Err(CheckoutError::PaymentIntent {
                        booking_id,
                        source: ApiError::DecodingError(
                            "payment intent response has a blank client secret".to_string(),
                        ),
                    });
                }
                response.client_secret
            }
        };
        if cancel.is_cancelled() {
            return Err(CheckoutError::Superseded {
                booking_id: Some(booking_id),
            });
        }

        tx.advance(CheckoutState::ConfirmingPayment);
        match self.payment_sheet.confirm(&client_secret).await {
            PaymentOutcome::Succeeded => Ok(BookingConfirmation {
                booking_id,
                provider_name: draft.provider_name.clone(),
                service_name: draft.service_names(),
                total_price: amounts.total,
                amount_paid: amounts.amount_due,
                transport_fee: quote.fee,
                date: draft.date,
                start_time: draft.start_time,
                end_time: draft.end_time,
                address: draft.address.clone(),
                payment_method: draft.payment_method,
                multi_service: draft.is_multi_service(),
            }),
            PaymentOutcome::Failed(message) => Err(CheckoutError::PaymentFailed {
                booking_id,
                message,
            }),
            PaymentOutcome::Canceled => Err(CheckoutError::PaymentCanceled { booking_id }),
        }
    }

    /// Best-effort location step. Never fails: a missing coordinate yields a
    /// zero-fee quote with a soft error.
    async fn resolve_transport(
        &self,
        transaction_id: Uuid,
        draft: &BookingDraft,
    ) -> (TransportQuote, Option<Coordinate>) {
        let customer = match draft.customer_location {
            Some(known) => Some(known),
            None => match self.geocoder.geocode(&draft.address).await {
                Ok(found) => Some(found),
                Err(err) => {
                    tracing::warn!(
                        transaction_id = %transaction_id,
                        error = %err,
                        "geocoding failed; continuing without transport fee"
                    );
                    None
                }
            },
        };

        if !draft.mobile_service {
            return (TransportQuote::not_applicable(), customer);
        }
        if let Some(km) = draft.transport_distance_km {
            return (TransportQuote::from_distance(km), customer);
        }

        let provider = draft.provider_location.or_else(|| {
            self.api
                .cached_provider(&draft.provider_id)
                .and_then(|p| p.location)
        });
        let quote = quote_transport(true, provider, customer);
        if let Some(reason) = &quote.error {
            tracing::warn!(transaction_id = %transaction_id, reason = %reason, "transport fee not applied");
        }
        (quote, customer)
    }

    fn booking_payload(
        &self,
        draft: &BookingDraft,
        quote: &TransportQuote,
        customer_location: Option<Coordinate>,
        amounts: &AmountBreakdown,
    ) -> CreateBookingRequest {
        CreateBookingRequest {
            provider_id: draft.provider_id.clone(),
            service_id: draft
                .services
                .first()
                .map(|s| s.id.clone())
                .unwrap_or_default(),
            service_ids: draft.services.iter().map(|s| s.id.clone()).collect(),
            date: draft.date,
            start_time: draft.start_time.format("%H:%M").to_string(),
            end_time: draft.end_time.format("%H:%M").to_string(),
            address: draft.address.clone(),
            notes: draft.notes.clone().filter(|n| !n.trim().is_empty()),
            payment_method: draft.payment_method,
            currency: self.currency.clone(),
            service_price: amounts.service_price,
            total_amount: amounts.total,
            amount_due: amounts.amount_due,
            deposit_amount: amounts.deposit,
            transport_distance_km: quote.distance_km,
            transport_fee: quote.has_fee_line().then_some(quote.fee),
            customer_location,
        }
    }

    /// Terminal bookkeeping: state, notifications, analytics, UI.
    fn finish(&self, tx: &mut Transaction, result: &Result<BookingConfirmation, CheckoutError>) {
        let transaction_id = tx.id.to_string();
        match result {
            Ok(confirmation) => {
                tx.advance(CheckoutState::Completed);
                self.notifier
                    .notify_payment_success(&confirmation.booking_id, confirmation.amount_paid);
                self.analytics.log_event(
                    "payment_succeeded",
                    &[
                        ("transaction_id", transaction_id),
                        ("booking_id", confirmation.booking_id.clone()),
                        ("amount", confirmation.amount_paid.to_string()),
                        ("payment_method", confirmation.payment_method.to_string()),
                    ],
                );
                self.ui
                    .send(UiEvent::NavigateToConfirmation(confirmation.clone()));
            }
            Err(err) if err.is_superseded() => {
                tx.advance(CheckoutState::Canceled);
                tracing::info!(transaction_id = %tx.id, "checkout abandoned");
            }
            Err(err) => {
                if let CheckoutError::PaymentCanceled { booking_id } = err {
                    tx.advance(CheckoutState::Canceled);
                    self.notifier.notify_payment_failed(booking_id);
                    self.analytics.log_event(
                        "payment_canceled",
                        &[
                            ("transaction_id", transaction_id),
                            ("booking_id", booking_id.clone()),
                        ],
                    );
                } else {
                    tx.advance(CheckoutState::Failed);
                    if let CheckoutError::PaymentFailed { booking_id, .. } = err {
                        self.notifier.notify_payment_failed(booking_id);
                    }
                    let mut context = vec![
                        ("action", err.action().to_string()),
                        ("transaction_id", transaction_id),
                    ];
                    if let Some(booking_id) = err.booking_id() {
                        context.push(("booking_id", booking_id.to_string()));
                    }
                    self.analytics.record_error(err, &context);
                    tracing::warn!(transaction_id = %tx.id, action = err.action(), error = %err, "checkout failed");
                }
                if let Some(shown) = present(err) {
                    self.ui.send(UiEvent::ShowError(shown));
                }
            }
        }
    }
}

impl std::fmt::Debug for CheckoutOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutOrchestrator")
            .field("api", &self.api)
            .field("currency", &self.currency)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transaction_records_trail() {
        let mut tx = Transaction::new();
        tx.advance(CheckoutState::GeocodingAddress);
        tx.advance(CheckoutState::ComputingAmount);
        let report = tx.into_report(Err(CheckoutError::Superseded { booking_id: None }));
        assert_eq!(
            report.trail,
            vec![
                CheckoutState::Idle,
                CheckoutState::GeocodingAddress,
                CheckoutState::ComputingAmount,
            ]
        );
        assert_eq!(report.state, CheckoutState::ComputingAmount);
        assert!(!report.is_completed());
    }

    #[test]
    fn transaction_ids_are_unique() {
        assert_ne!(Transaction::new().id, Transaction::new().id);
    }
}
