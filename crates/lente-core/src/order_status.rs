//! # Order Payment Status
//!
//! ```text
//!   total_paid = payment_entry + Σ payment_history.amount
//!
//!   total_paid == 0            → pending
//!   0 < total_paid < price     → partially_paid
//!   total_paid >= price        → paid   (over-payment included)
//!   price == 0                 → paid
//! ```

use crate::money::Money;
use crate::types::{Order, OrderPaymentStatus};

/// Resolves the payment status from the order price and what was paid.
///
/// An order with `final_price == 0` is treated as paid, even with nothing
/// paid against it.
pub fn resolve(final_price: Money, total_paid: Money) -> OrderPaymentStatus {
    if total_paid >= final_price && total_paid.is_positive() {
        OrderPaymentStatus::Paid
    } else if total_paid.is_positive() {
        OrderPaymentStatus::PartiallyPaid
    } else if final_price.is_positive() {
        OrderPaymentStatus::Pending
    } else {
        // Zero-priced order (warranty replacement, courtesy lens).
        OrderPaymentStatus::Paid
    }
}

/// Resolves the status of an order from its own entry and history.
pub fn resolve_order(order: &Order) -> OrderPaymentStatus {
    resolve(order.final_price, order.total_paid())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(price: i64, paid: &[i64]) -> OrderPaymentStatus {
        let total: Money = paid.iter().map(|c| Money::from_cents(*c)).sum();
        resolve(Money::from_cents(price), total)
    }

    #[test]
    fn test_thresholds() {
        assert_eq!(status(10_000, &[]), OrderPaymentStatus::Pending);
        assert_eq!(status(10_000, &[4_000]), OrderPaymentStatus::PartiallyPaid);
        assert_eq!(status(10_000, &[10_000]), OrderPaymentStatus::Paid);
        assert_eq!(status(10_000, &[15_000]), OrderPaymentStatus::Paid);
        assert_eq!(status(10_000, &[6_000, 4_000]), OrderPaymentStatus::Paid);
        assert_eq!(status(10_000, &[1]), OrderPaymentStatus::PartiallyPaid);
    }

    #[test]
    fn test_zero_priced_order_is_paid() {
        assert_eq!(status(0, &[]), OrderPaymentStatus::Paid);
    }
}
