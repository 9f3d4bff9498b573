//! Booking-payment checkout: geocode, price, book, pay.
//!
//! [`CheckoutOrchestrator::pay_now`] drives one transaction through
//! [`CheckoutState`]s, talking to the backend through
//! [`bookline_api::BookingApi`] and to the outside world through the
//! collaborator traits in [`collaborators`]. UI-owned state is only touched
//! through [`UiDispatcher`] messages.

pub mod collaborators;
pub mod draft;
pub mod error;
pub mod geocoder;
pub mod orchestrator;
pub mod presentation;
pub mod refund;
pub mod state;
pub mod ui;

pub use collaborators::{
    AnalyticsSink, GeocodeError, Geocoder, NoopAnalytics, NoopNotifier, NotificationSink,
    PaymentOutcome, PaymentSheet, TracingAnalytics,
};
pub use draft::{BookingConfirmation, BookingDraft};
pub use error::CheckoutError;
pub use geocoder::HttpGeocoder;
pub use orchestrator::{CheckoutOrchestrator, CheckoutReport};
pub use presentation::{present, present_api, UserFacingError};
pub use refund::RefundFlow;
pub use state::CheckoutState;
pub use ui::{ui_channel, ProcessingGuard, UiDispatcher, UiEvent};
