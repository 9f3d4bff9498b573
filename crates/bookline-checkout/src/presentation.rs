//! Mapping from backend and checkout errors to what the user is shown.
//!
//! This is the only place the UI-facing taxonomy is derived. Superseded
//! requests map to `None` and never reach error display.

use bookline_api::ApiError;

use crate::error::CheckoutError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserFacingError {
    NetworkUnavailable,
    /// The session layer should refresh the token or log out.
    SessionExpired,
    BookingCreationFailed(Option<String>),
    PaymentSetupFailed(Option<String>),
    PaymentFailed(String),
    PaymentCancelled,
    RefundFailed(Option<String>),
    InvalidBooking(String),
    Unexpected,
}

impl UserFacingError {
    /// One actionable sentence for the user.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            UserFacingError::NetworkUnavailable => {
                "No internet connection. Check your connection and try again.".to_string()
            }
            UserFacingError::SessionExpired => {
                "Your session has expired. Please sign in again.".to_string()
            }
            UserFacingError::BookingCreationFailed(detail) => {
                with_detail("We couldn't create your booking.", detail.as_deref())
            }
            UserFacingError::PaymentSetupFailed(detail) => {
                with_detail("We couldn't prepare the payment.", detail.as_deref())
            }
            UserFacingError::PaymentFailed(message) => format!("Payment failed: {message}"),
            UserFacingError::PaymentCancelled => {
                "Payment was cancelled. Your booking is not paid yet.".to_string()
            }
            UserFacingError::RefundFailed(detail) => {
                with_detail("The refund could not be processed.", detail.as_deref())
            }
            UserFacingError::InvalidBooking(reason) => {
                format!("Please complete your booking: {reason}.")
            }
            UserFacingError::Unexpected => {
                "Something went wrong. Please try again.".to_string()
            }
        }
    }
}

impl std::fmt::Display for UserFacingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message())
    }
}

fn with_detail(headline: &str, detail: Option<&str>) -> String {
    match detail {
        Some(detail) if !detail.trim().is_empty() => format!("{headline} {detail}"),
        _ => format!("{headline} Please try again."),
    }
}

/// Connectivity and session errors read the same whatever step failed.
/// Returns `None` for cancelled requests and for errors that need the step
/// to phrase them.
fn common(error: &ApiError) -> Option<UserFacingError> {
    match error {
        ApiError::NoNetwork => Some(UserFacingError::NetworkUnavailable),
        ApiError::Unauthorized => Some(UserFacingError::SessionExpired),
        _ => None,
    }
}

/// Map a bare [`ApiError`], e.g. from a list screen.
#[must_use]
pub fn present_api(error: &ApiError) -> Option<UserFacingError> {
    if error.is_cancelled() {
        return None;
    }
    Some(common(error).unwrap_or(UserFacingError::Unexpected))
}

/// Map a checkout failure. `None` means nothing should be displayed.
#[must_use]
pub fn present(error: &CheckoutError) -> Option<UserFacingError> {
    if error.is_superseded() {
        return None;
    }
    let shown = match error {
        CheckoutError::InvalidDraft(reason) => UserFacingError::InvalidBooking(reason.clone()),
        CheckoutError::BookingCreation(source) => common(source).unwrap_or_else(|| {
            UserFacingError::BookingCreationFailed(source.server_message().map(str::to_string))
        }),
        CheckoutError::PaymentIntent { source, .. } => common(source).unwrap_or_else(|| {
            UserFacingError::PaymentSetupFailed(source.server_message().map(str::to_string))
        }),
        CheckoutError::PaymentFailed { message, .. } => UserFacingError::PaymentFailed(message.clone()),
        CheckoutError::PaymentCanceled { .. } => UserFacingError::PaymentCancelled,
        CheckoutError::Refund { source, .. } => common(source).unwrap_or_else(|| {
            UserFacingError::RefundFailed(source.server_message().map(str::to_string))
        }),
        CheckoutError::Superseded { .. } => return None,
    };
    Some(shown)
}
