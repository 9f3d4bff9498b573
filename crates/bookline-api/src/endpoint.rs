//! Endpoint registry: every backend operation the client knows about.
//!
//! The mapping from [`Endpoint`] to verb and path template is an exhaustive
//! `match`, so adding a variant without a route fails to compile. Path
//! parameters are percent-encoded as single segments.

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use reqwest::Method;

/// Characters escaped inside one path segment (RFC 3986 `pchar` complement).
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Which per-call timeout applies when the caller does not pick one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutClass {
    Default,
    Slow,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Providers,
    Provider { id: String },
    ProviderServices { provider_id: String },
    Bookings,
    Booking { id: String },
    CreateBooking,
    CancelBooking { id: String },
    Offers,
    CreatePaymentIntent,
    RefundPayment { payment_intent_id: String },
}

impl Endpoint {
    /// Path template relative to the API root, `{name}` marking parameters.
    #[must_use]
    pub const fn template(&self) -> &'static str {
        match self {
            Endpoint::Providers => "providers",
            Endpoint::Provider { .. } => "providers/{id}",
            Endpoint::ProviderServices { .. } => "providers/{id}/services",
            Endpoint::Bookings => "bookings",
            Endpoint::Booking { .. } => "bookings/{id}",
            Endpoint::CreateBooking => "bookings",
            Endpoint::CancelBooking { .. } => "bookings/{id}/cancel",
            Endpoint::Offers => "offers",
            Endpoint::CreatePaymentIntent => "payments/intent",
            Endpoint::RefundPayment { .. } => "payments/{id}/refund",
        }
    }

    #[must_use]
    pub fn method(&self) -> Method {
        match self {
            Endpoint::Providers
            | Endpoint::Provider { .. }
            | Endpoint::ProviderServices { .. }
            | Endpoint::Bookings
            | Endpoint::Booking { .. }
            | Endpoint::Offers => Method::GET,
            Endpoint::CreateBooking
            | Endpoint::CreatePaymentIntent
            | Endpoint::RefundPayment { .. } => Method::POST,
            Endpoint::CancelBooking { .. } => Method::PATCH,
        }
    }

    #[must_use]
    pub const fn timeout_class(&self) -> TimeoutClass {
        match self {
            Endpoint::CreateBooking | Endpoint::RefundPayment { .. } => TimeoutClass::Slow,
            _ => TimeoutClass::Default,
        }
    }

    /// Concrete relative path with parameters substituted and encoded.
    #[must_use]
    pub fn path(&self) -> String {
        let template = self.template();
        match self.path_param() {
            Some(value) => {
                let encoded = utf8_percent_encode(value, SEGMENT).to_string();
                template.replace("{id}", &encoded)
            }
            None => template.to_string(),
        }
    }

    /// Short, stable name used in logs and analytics.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Endpoint::Providers => "list_providers",
            Endpoint::Provider { .. } => "get_provider",
            Endpoint::ProviderServices { .. } => "list_provider_services",
            Endpoint::Bookings => "list_bookings",
            Endpoint::Booking { .. } => "get_booking",
            Endpoint::CreateBooking => "create_booking",
            Endpoint::CancelBooking { .. } => "cancel_booking",
            Endpoint::Offers => "list_offers",
            Endpoint::CreatePaymentIntent => "create_payment_intent",
            Endpoint::RefundPayment { .. } => "refund_payment",
        }
    }

    fn path_param(&self) -> Option<&str> {
        match self {
            Endpoint::Provider { id }
            | Endpoint::Booking { id }
            | Endpoint::CancelBooking { id }
            | Endpoint::ProviderServices { provider_id: id }
            | Endpoint::RefundPayment {
                payment_intent_id: id,
            } => Some(id),
            Endpoint::Providers
            | Endpoint::Bookings
            | Endpoint::CreateBooking
            | Endpoint::Offers
            | Endpoint::CreatePaymentIntent => None,
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.method(), self.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_endpoints_are_gets() {
        for ep in [Endpoint::Providers, Endpoint::Bookings, Endpoint::Offers] {
            assert_eq!(ep.method(), Method::GET, "{ep:?}");
        }
    }

    #[test]
    fn create_booking_posts_to_bookings() {
        assert_eq!(Endpoint::CreateBooking.method(), Method::POST);
        assert_eq!(Endpoint::CreateBooking.path(), "bookings");
        assert_eq!(Endpoint::CreateBooking.timeout_class(), TimeoutClass::Slow);
    }

    #[test]
    fn payment_intent_route() {
        assert_eq!(Endpoint::CreatePaymentIntent.method(), Method::POST);
        assert_eq!(Endpoint::CreatePaymentIntent.path(), "payments/intent");
    }

    #[test]
    fn path_parameters_are_substituted() {
        let ep = Endpoint::CancelBooking {
            id: "b-42".to_string(),
        };
        assert_eq!(ep.path(), "bookings/b-42/cancel");
        assert_eq!(ep.method(), Method::PATCH);

        let ep = Endpoint::RefundPayment {
            payment_intent_id: "pi_123".to_string(),
        };
        assert_eq!(ep.path(), "payments/pi_123/refund");
    }

    #[test]
    fn path_parameters_cannot_escape_their_segment() {
        let ep = Endpoint::Provider {
            id: "../admin?x=1".to_string(),
        };
        assert_eq!(ep.path(), "providers/..%2Fadmin%3Fx=1");
    }

    #[test]
    fn display_shows_verb_and_path() {
        let ep = Endpoint::Booking {
            id: "b1".to_string(),
        };
        assert_eq!(ep.to_string(), "GET bookings/b1");
    }
}
