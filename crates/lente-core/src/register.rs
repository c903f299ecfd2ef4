//! # Register Math
//!
//! How a settled payment moves a session's totals, and how a session is
//! balanced at close.
//!
//! ## Posting Rules
//! ```text
//! ┌──────────────────┬───────────────────────────────────────────────────┐
//! │ payment_type     │ effect on the open session                        │
//! ├──────────────────┼───────────────────────────────────────────────────┤
//! │ sale             │ sales.<method> += amount, sales.total += amount   │
//! │ debt_payment     │ payments.received += amount                       │
//! │ expense          │ payments.made += amount                           │
//! └──────────────────┴───────────────────────────────────────────────────┘
//!
//!  expected = opening + sales.total + payments.received - payments.made
//!  variance = closing - expected          (recorded, never rejected)
//! ```
//!
//! Cancelling a settled payment applies the exact inverse posting.

use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::types::{CashRegisterSession, MovementTotals, PaymentMethod, PaymentType, SalesTotals};

// =============================================================================
// Posting
// =============================================================================

/// A single movement against a session's totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Posting {
    Sale { method: PaymentMethod, amount: Money },
    DebtPayment { amount: Money },
    Expense { amount: Money },
}

impl Posting {
    /// Maps a payment to the posting it produces.
    pub fn for_payment(payment_type: PaymentType, method: PaymentMethod, amount: Money) -> Self {
        match payment_type {
            PaymentType::Sale => Posting::Sale { method, amount },
            PaymentType::DebtPayment => Posting::DebtPayment { amount },
            PaymentType::Expense => Posting::Expense { amount },
        }
    }

    pub fn amount(&self) -> Money {
        match self {
            Posting::Sale { amount, .. }
            | Posting::DebtPayment { amount }
            | Posting::Expense { amount } => *amount,
        }
    }
}

// =============================================================================
// Register Totals
// =============================================================================

/// The mutable part of a session: sales and movement totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterTotals {
    pub sales: SalesTotals,
    pub payments: MovementTotals,
}

impl RegisterTotals {
    pub fn of(session: &CashRegisterSession) -> Self {
        RegisterTotals {
            sales: session.sales,
            payments: session.payments,
        }
    }

    /// Applies a posting.
    pub fn apply(&mut self, posting: Posting) {
        self.post(posting, posting.amount());
    }

    /// Applies the inverse of a posting.
    pub fn reverse(&mut self, posting: Posting) {
        self.post(posting, -posting.amount());
    }

    fn post(&mut self, posting: Posting, delta: Money) {
        match posting {
            Posting::Sale { method, .. } => {
                *self.sales.slot_mut(method) += delta;
                self.sales.total += delta;
            }
            Posting::DebtPayment { .. } => self.payments.received += delta,
            Posting::Expense { .. } => self.payments.made += delta,
        }
    }

    /// Money that moved through the register during the session.
    pub fn net_movement(&self) -> Money {
        self.sales.total + self.payments.received - self.payments.made
    }
}

// =============================================================================
// Closing
// =============================================================================

/// Figures recorded on a session when it closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosingFigures {
    pub expected_balance: Money,
    pub variance: Money,
}

/// `opening + sales.total + payments.received - payments.made`.
pub fn expected_balance(session: &CashRegisterSession) -> Money {
    session.opening_balance + RegisterTotals::of(session).net_movement()
}

/// Balances a session against the physically counted amount.
///
/// ## Example
/// ```rust
/// use chrono::Utc;
/// use lente_core::money::Money;
/// use lente_core::register::{closing_figures, Posting, RegisterTotals};
/// use lente_core::types::{CashRegisterSession, PaymentMethod};
///
/// let mut session = CashRegisterSession::open(Money::from_cents(10_000), "ana", None, Utc::now());
/// let mut totals = RegisterTotals::of(&session);
/// totals.apply(Posting::Sale { method: PaymentMethod::Cash, amount: Money::from_cents(5_000) });
/// session.sales = totals.sales;
///
/// let figures = closing_figures(&session, Money::from_cents(14_000));
/// assert_eq!(figures.expected_balance.cents(), 15_000);
/// assert_eq!(figures.variance.cents(), -1_000);
/// ```
pub fn closing_figures(session: &CashRegisterSession, closing_balance: Money) -> ClosingFigures {
    let expected = expected_balance(session);
    ClosingFigures {
        expected_balance: expected,
        variance: closing_balance - expected,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn cents(c: i64) -> Money {
        Money::from_cents(c)
    }

    #[test]
    fn test_sale_posting_hits_method_and_total() {
        let mut totals = RegisterTotals::default();
        totals.apply(Posting::for_payment(PaymentType::Sale, PaymentMethod::Cash, cents(5_000)));
        totals.apply(Posting::for_payment(PaymentType::Sale, PaymentMethod::Check, cents(2_500)));

        assert_eq!(totals.sales.cash, cents(5_000));
        assert_eq!(totals.sales.check, cents(2_500));
        assert_eq!(totals.sales.total, cents(7_500));
        assert_eq!(totals.payments, MovementTotals::default());
    }

    #[test]
    fn test_movements() {
        let mut totals = RegisterTotals::default();
        totals.apply(Posting::for_payment(PaymentType::DebtPayment, PaymentMethod::Pix, cents(3_000)));
        totals.apply(Posting::for_payment(PaymentType::Expense, PaymentMethod::Cash, cents(1_200)));

        assert_eq!(totals.payments.received, cents(3_000));
        assert_eq!(totals.payments.made, cents(1_200));
        assert_eq!(totals.sales.total, Money::zero());
        assert_eq!(totals.net_movement(), cents(1_800));
    }

    #[test]
    fn test_reverse_restores_previous_totals() {
        let mut totals = RegisterTotals::default();
        let posting = Posting::Sale {
            method: PaymentMethod::Cash,
            amount: cents(5_000),
        };
        totals.apply(posting);
        assert_eq!(totals.sales.cash, cents(5_000));
        assert_eq!(totals.sales.total, cents(5_000));

        totals.reverse(posting);
        assert_eq!(totals, RegisterTotals::default());
    }

    #[test]
    fn test_closing_with_variance() {
        let mut session = CashRegisterSession::open(cents(10_000), "ana", None, Utc::now());
        let mut totals = RegisterTotals::of(&session);
        totals.apply(Posting::Sale {
            method: PaymentMethod::Cash,
            amount: cents(5_000),
        });
        session.sales = totals.sales;
        session.payments = totals.payments;

        let figures = closing_figures(&session, cents(14_000));
        assert_eq!(figures.expected_balance, cents(15_000));
        assert_eq!(figures.variance, cents(-1_000));
    }

    #[test]
    fn test_expected_balance_counts_expenses() {
        let mut session = CashRegisterSession::open(cents(20_000), "ana", None, Utc::now());
        session.sales.total = cents(10_000);
        session.payments.received = cents(2_000);
        session.payments.made = cents(4_000);

        assert_eq!(expected_balance(&session), cents(28_000));
        assert_eq!(closing_figures(&session, cents(28_000)).variance, Money::zero());
    }
}
