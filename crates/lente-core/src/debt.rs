//! # Client Debt
//!
//! Client debt is never stored as a source of truth. It is recomputed from
//! the client's orders and cached on the client row.
//!
//! ## Aggregation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  for each order of the client                                           │
//! │     skip if cancelled or deleted                                        │
//! │     debt(order) = max(0, final_price - (entry + Σ history))             │
//! │                                                                         │
//! │  total_debt = Σ debt(order)            always >= 0, idempotent          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Allocation
//! A debt payment recorded without an order is spread across the client's
//! orders that still owe money, oldest first. Each allocation becomes one
//! payment-history entry on that order.

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{ClientDebtPlan, Order, OrderPayment, PaymentInstallment};
use crate::validation::ValidationResult;

// =============================================================================
// Aggregation
// =============================================================================

/// Debt owed on a single order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDebt {
    pub order_id: String,
    pub debt: Money,
}

/// Result of aggregating a client's orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebtReport {
    pub total_debt: Money,
    /// Orders that still owe money, in input order.
    pub orders: Vec<OrderDebt>,
    /// History entries of every counted order, oldest first.
    pub payment_history: Vec<OrderPayment>,
}

/// Aggregates debt across orders. Pure and idempotent.
pub fn compute_debt(orders: &[Order]) -> DebtReport {
    let mut total_debt = Money::zero();
    let mut with_debt = Vec::new();
    let mut payment_history = Vec::new();

    for order in orders.iter().filter(|o| o.counts_for_debt()) {
        let debt = order.outstanding();
        if debt.is_positive() {
            total_debt += debt;
            with_debt.push(OrderDebt {
                order_id: order.id.clone(),
                debt,
            });
        }
        payment_history.extend(order.payment_history.iter().cloned());
    }

    payment_history.sort_by(|a, b| a.paid_at.cmp(&b.paid_at));

    DebtReport {
        total_debt,
        orders: with_debt,
        payment_history,
    }
}

// =============================================================================
// Allocation
// =============================================================================

/// Portion of a debt payment assigned to one order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub order_id: String,
    pub amount: Money,
}

/// Spreads `amount` across orders that still owe, oldest first.
///
/// Fails when `amount` exceeds the client's outstanding debt, so a payment
/// never leaves unallocated money behind.
///
/// ## Example
/// ```rust,ignore
/// // orders owe 60,00 (oldest) and 100,00
/// let plan = allocate(Money::from_cents(8_000), &orders)?;
/// // → [60,00 to the oldest, 20,00 to the next]
/// ```
pub fn allocate(amount: Money, orders: &[Order]) -> ValidationResult<Vec<Allocation>> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "amount".to_string(),
        });
    }

    let mut owing: Vec<&Order> = orders
        .iter()
        .filter(|o| o.counts_for_debt() && o.outstanding().is_positive())
        .collect();
    owing.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

    let outstanding: Money = owing.iter().map(|o| o.outstanding()).sum();
    if amount > outstanding {
        return Err(ValidationError::Conflict {
            field: "amount".to_string(),
            reason: format!("exceeds outstanding debt of {}", outstanding),
        });
    }

    let mut remaining = amount;
    let mut plan = Vec::new();
    for order in owing {
        if remaining.is_zero() {
            break;
        }
        let portion = remaining.min(order.outstanding());
        plan.push(Allocation {
            order_id: order.id.clone(),
            amount: portion,
        });
        remaining -= portion;
    }

    Ok(plan)
}

// =============================================================================
// Installment Schedule
// =============================================================================

/// Builds the installment rows for a debt-generating plan.
///
/// The amount is split evenly in centavos with the remainder on the last
/// installment. Explicit due dates win; otherwise installment `n` is due `n`
/// months after `issued_on`.
pub fn schedule_installments(
    payment_id: &str,
    amount: Money,
    plan: &ClientDebtPlan,
    issued_on: NaiveDate,
) -> ValidationResult<Vec<PaymentInstallment>> {
    let parts = amount.split(plan.installments);

    parts
        .into_iter()
        .enumerate()
        .map(|(i, part)| {
            let number = i as u32 + 1;
            let due_date = match plan.due_dates.get(i) {
                Some(date) => *date,
                None => issued_on.checked_add_months(Months::new(number)).ok_or_else(|| {
                    ValidationError::InvalidFormat {
                        field: "client_debt.due_dates".to_string(),
                        reason: "due date out of range".to_string(),
                    }
                })?,
            };
            Ok(PaymentInstallment {
                id: uuid::Uuid::new_v4().to_string(),
                payment_id: payment_id.to_string(),
                number,
                total: plan.installments,
                amount: part,
                due_date,
            })
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ClientKind, OrderPaymentStatus, OrderStatus, PaymentMethod};
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn test_schedule_monthly_with_remainder_on_last() {
        let plan = ClientDebtPlan {
            generate_debt: true,
            installments: 3,
            due_dates: vec![],
        };
        let issued = NaiveDate::from_ymd_opt(2026, 1, 31).unwrap();
        let rows = schedule_installments("p1", Money::from_cents(10_000), &plan, issued).unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows.iter().map(|r| r.amount.cents()).collect::<Vec<_>>(), vec![3_333, 3_333, 3_334]);
        assert_eq!(rows[0].due_date, NaiveDate::from_ymd_opt(2026, 2, 28).unwrap());
        assert_eq!(rows[1].due_date, NaiveDate::from_ymd_opt(2026, 3, 31).unwrap());
        assert_eq!(rows[2].number, 3);
        assert!(rows.iter().all(|r| r.total == 3 && r.payment_id == "p1"));
    }

    #[test]
    fn test_schedule_uses_explicit_dates() {
        let due = vec![
            NaiveDate::from_ymd_opt(2026, 5, 10).unwrap(),
            NaiveDate::from_ymd_opt(2026, 6, 10).unwrap(),
        ];
        let plan = ClientDebtPlan {
            generate_debt: true,
            installments: 2,
            due_dates: due.clone(),
        };
        let issued = NaiveDate::from_ymd_opt(2026, 4, 1).unwrap();
        let rows = schedule_installments("p1", Money::from_cents(5_001), &plan, issued).unwrap();
        assert_eq!(rows.iter().map(|r| r.due_date).collect::<Vec<_>>(), due);
        assert_eq!(rows[1].amount.cents(), 2_501);
    }

    fn order(id: &str, age_days: i64, price: i64, entry: i64, paid: &[i64]) -> Order {
        let created = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap() + Duration::days(age_days);
        Order {
            id: id.to_string(),
            client_id: "client-1".to_string(),
            client_kind: ClientKind::Customer,
            final_price: Money::from_cents(price),
            payment_entry: Money::from_cents(entry),
            status: OrderStatus::Open,
            payment_status: OrderPaymentStatus::Pending,
            payment_history: paid
                .iter()
                .enumerate()
                .map(|(i, amount)| OrderPayment {
                    id: format!("{id}-h{i}"),
                    order_id: id.to_string(),
                    payment_id: None,
                    amount: Money::from_cents(*amount),
                    method: PaymentMethod::Cash,
                    paid_at: created + Duration::hours(i as i64 + 1),
                })
                .collect(),
            is_deleted: false,
            created_at: created,
        }
    }

    #[test]
    fn test_compute_debt_sums_outstanding() {
        let orders = vec![
            order("a", 0, 10_000, 2_000, &[3_000]),
            order("b", 1, 5_000, 0, &[]),
        ];
        let report = compute_debt(&orders);
        assert_eq!(report.total_debt.cents(), 10_000);
        assert_eq!(report.orders.len(), 2);
        assert_eq!(report.payment_history.len(), 1);
    }

    #[test]
    fn test_overpaid_order_contributes_zero() {
        let orders = vec![
            order("a", 0, 10_000, 0, &[15_000]),
            order("b", 1, 3_000, 0, &[]),
        ];
        let report = compute_debt(&orders);
        assert_eq!(report.total_debt.cents(), 3_000);
        assert_eq!(report.orders, vec![OrderDebt { order_id: "b".to_string(), debt: Money::from_cents(3_000) }]);
    }

    #[test]
    fn test_cancelled_and_deleted_orders_are_ignored() {
        let mut cancelled = order("a", 0, 10_000, 0, &[]);
        cancelled.status = OrderStatus::Cancelled;
        let mut deleted = order("b", 1, 10_000, 0, &[]);
        deleted.is_deleted = true;

        let report = compute_debt(&[cancelled, deleted]);
        assert_eq!(report.total_debt, Money::zero());
        assert!(report.orders.is_empty());
    }

    #[test]
    fn test_compute_debt_is_idempotent() {
        let orders = vec![order("a", 0, 10_000, 1_000, &[2_000]), order("b", 3, 800, 0, &[])];
        assert_eq!(compute_debt(&orders), compute_debt(&orders));
        assert!(!compute_debt(&orders).total_debt.is_negative());
    }

    #[test]
    fn test_allocate_oldest_first() {
        let orders = vec![
            order("newer", 5, 10_000, 0, &[]),
            order("older", 0, 10_000, 4_000, &[]),
        ];
        let plan = allocate(Money::from_cents(8_000), &orders).unwrap();
        assert_eq!(
            plan,
            vec![
                Allocation { order_id: "older".to_string(), amount: Money::from_cents(6_000) },
                Allocation { order_id: "newer".to_string(), amount: Money::from_cents(2_000) },
            ]
        );
    }

    #[test]
    fn test_allocate_skips_paid_orders() {
        let orders = vec![order("paid", 0, 5_000, 5_000, &[]), order("owing", 1, 5_000, 0, &[])];
        let plan = allocate(Money::from_cents(5_000), &orders).unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].order_id, "owing");
    }

    #[test]
    fn test_allocate_rejects_overpayment() {
        let orders = vec![order("a", 0, 5_000, 0, &[])];
        let err = allocate(Money::from_cents(5_001), &orders).unwrap_err();
        assert!(matches!(err, ValidationError::Conflict { .. }));

        let err = allocate(Money::from_cents(100), &[]).unwrap_err();
        assert!(matches!(err, ValidationError::Conflict { .. }));
    }
}
