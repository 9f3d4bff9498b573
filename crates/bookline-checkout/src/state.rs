//! Checkout state machine.
//!
//! ```text
//! Idle -> GeocodingAddress -> ComputingAmount -> CreatingBooking
//!      -> [EnsuringPaymentIntent] -> ConfirmingPayment
//!      -> Completed | Failed | Canceled
//! ```
//!
//! `Failed` is reachable from `Idle` (invalid draft) and from every step that
//! talks to the backend or the payment provider. `Canceled` is reachable
//! from the same steps when the payment is canceled or a request is
//! superseded.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckoutState {
    Idle,
    GeocodingAddress,
    ComputingAmount,
    CreatingBooking,
    EnsuringPaymentIntent,
    ConfirmingPayment,
    Completed,
    Failed,
    Canceled,
}

impl CheckoutState {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            CheckoutState::Completed | CheckoutState::Failed | CheckoutState::Canceled
        )
    }

    #[must_use]
    pub const fn can_transition_to(self, next: CheckoutState) -> bool {
        use CheckoutState::{
            Canceled, Completed, ComputingAmount, ConfirmingPayment, CreatingBooking,
            EnsuringPaymentIntent, Failed, GeocodingAddress, Idle,
        };
        matches!(
            (self, next),
            (Idle, GeocodingAddress | Failed)
                | (GeocodingAddress, ComputingAmount | Canceled)
                | (ComputingAmount, CreatingBooking)
                | (CreatingBooking, EnsuringPaymentIntent | ConfirmingPayment | Failed | Canceled)
                | (EnsuringPaymentIntent, ConfirmingPayment | Failed | Canceled)
                | (ConfirmingPayment, Completed | Failed | Canceled)
        )
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            CheckoutState::Idle => "idle",
            CheckoutState::GeocodingAddress => "geocoding_address",
            CheckoutState::ComputingAmount => "computing_amount",
            CheckoutState::CreatingBooking => "creating_booking",
            CheckoutState::EnsuringPaymentIntent => "ensuring_payment_intent",
            CheckoutState::ConfirmingPayment => "confirming_payment",
            CheckoutState::Completed => "completed",
            CheckoutState::Failed => "failed",
            CheckoutState::Canceled => "canceled",
        }
    }
}

impl std::fmt::Display for CheckoutState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::CheckoutState::*;
    use super::*;

    #[test]
    fn happy_path_transitions_are_legal() {
        let path = [
            Idle,
            GeocodingAddress,
            ComputingAmount,
            CreatingBooking,
            EnsuringPaymentIntent,
            ConfirmingPayment,
            Completed,
        ];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn intent_step_is_optional() {
        assert!(CreatingBooking.can_transition_to(ConfirmingPayment));
    }

    #[test]
    fn amount_must_precede_booking() {
        assert!(!GeocodingAddress.can_transition_to(CreatingBooking));
        assert!(!Idle.can_transition_to(CreatingBooking));
        assert!(!ComputingAmount.can_transition_to(Failed));
    }

    #[test]
    fn completion_requires_payment_confirmation() {
        for from in [Idle, GeocodingAddress, ComputingAmount, CreatingBooking, EnsuringPaymentIntent] {
            assert!(!from.can_transition_to(Completed), "{from} -> completed");
        }
    }

    #[test]
    fn terminal_states_are_final() {
        for terminal in [Completed, Failed, Canceled] {
            assert!(terminal.is_terminal());
            for next in [Idle, GeocodingAddress, CreatingBooking, Completed, Failed, Canceled] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }
}
