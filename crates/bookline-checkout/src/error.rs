use bookline_api::ApiError;
use thiserror::Error;

/// Why a checkout or refund did not complete.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    #[error("booking draft is incomplete: {0}")]
    InvalidDraft(String),

    #[error("booking could not be created: {0}")]
    BookingCreation(#[source] ApiError),

    /// The booking exists server-side but has no payment intent.
    #[error("payment could not be prepared for booking {booking_id}: {source}")]
    PaymentIntent {
        booking_id: String,
        #[source]
        source: ApiError,
    },

    /// The booking exists server-side, unpaid.
    #[error("payment failed for booking {booking_id}: {message}")]
    PaymentFailed { booking_id: String, message: String },

    /// The booking exists server-side, unpaid.
    #[error("payment canceled for booking {booking_id}")]
    PaymentCanceled { booking_id: String },

    /// A backend request was superseded (the user left the flow).
    #[error("checkout abandoned")]
    Superseded { booking_id: Option<String> },

    #[error("refund failed for payment {payment_intent_id}: {source}")]
    Refund {
        payment_intent_id: String,
        #[source]
        source: ApiError,
    },
}

impl CheckoutError {
    /// Booking id when the booking was created before the failure.
    #[must_use]
    pub fn booking_id(&self) -> Option<&str> {
        match self {
            CheckoutError::PaymentIntent { booking_id, .. }
            | CheckoutError::PaymentFailed { booking_id, .. }
            | CheckoutError::PaymentCanceled { booking_id } => Some(booking_id),
            CheckoutError::Superseded { booking_id } => booking_id.as_deref(),
            CheckoutError::InvalidDraft(_)
            | CheckoutError::BookingCreation(_)
            | CheckoutError::Refund { .. } => None,
        }
    }

    /// The underlying API error, if the failure came from the backend.
    #[must_use]
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            CheckoutError::BookingCreation(source)
            | CheckoutError::PaymentIntent { source, .. }
            | CheckoutError::Refund { source, .. } => Some(source),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_superseded(&self) -> bool {
        matches!(self, CheckoutError::Superseded { .. })
            || self.api_error().is_some_and(ApiError::is_cancelled)
    }

    /// Analytics action tag for the step that failed.
    #[must_use]
    pub const fn action(&self) -> &'static str {
        match self {
            CheckoutError::InvalidDraft(_) => "validate_draft",
            CheckoutError::BookingCreation(_) => "create_booking",
            CheckoutError::PaymentIntent { .. } => "create_payment_intent",
            CheckoutError::PaymentFailed { .. } | CheckoutError::PaymentCanceled { .. } => {
                "confirm_payment"
            }
            CheckoutError::Superseded { .. } => "superseded",
            CheckoutError::Refund { .. } => "refund_payment",
        }
    }
}
