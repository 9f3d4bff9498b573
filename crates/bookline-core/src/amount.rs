//! Amount computation for the checkout. Pure, no I/O.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::types::PaymentMethod;

/// Share of the total collected up front when the customer pays cash on site.
pub const CASH_DEPOSIT_RATE: Decimal = Decimal::from_parts(20, 0, 0, false, 2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmountBreakdown {
    pub service_price: Decimal,
    pub transport_fee: Decimal,
    pub total: Decimal,
    /// What the payment provider is asked to charge now.
    pub amount_due: Decimal,
    /// Set only for cash payments; equal to `amount_due`.
    pub deposit: Option<Decimal>,
}

/// Round to the two-decimal currency precision, midpoints away from zero.
#[must_use]
pub fn round_currency(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// `total = service_price + transport_fee`; card pays the total, cash pays a
/// [`CASH_DEPOSIT_RATE`] deposit of it.
#[must_use]
pub fn amount_due(
    service_price: Decimal,
    transport_fee: Decimal,
    method: PaymentMethod,
) -> AmountBreakdown {
    let total = round_currency(service_price + transport_fee);
    let (amount_due, deposit) = match method {
        PaymentMethod::Card => (total, None),
        PaymentMethod::Cash => {
            let deposit = round_currency(total * CASH_DEPOSIT_RATE);
            (deposit, Some(deposit))
        }
    };
    AmountBreakdown {
        service_price,
        transport_fee,
        total,
        amount_due,
        deposit,
    }
}
