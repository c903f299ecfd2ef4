//! # Validation Module
//!
//! Input rules applied before any write. A failed validation never leaves
//! partial state behind because it runs before the storage transaction.
//!
//! ## Validation Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Layer 1: HTTP handler        - shape / deserialization                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE         - amounts, payloads, type/method combos   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: SQLite              - CHECK constraints, single open register │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use lente_core::money::Money;
//! use lente_core::types::{NewPayment, PaymentDetails, PaymentType};
//! use lente_core::validation::validate_new_payment;
//!
//! let sale = NewPayment::new(Money::from_cents(5_000), PaymentType::Sale, PaymentDetails::Cash, "ana");
//! assert!(validate_new_payment(&sale).is_ok());
//!
//! let expense = NewPayment::new(Money::from_cents(900), PaymentType::Expense, PaymentDetails::Cash, "ana");
//! assert!(validate_new_payment(&expense).is_err()); // category missing
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{
    CheckDetails, ClientDebtPlan, CompensationStatus, Installments, NewPayment, PaymentType,
};
use crate::{MAX_INSTALLMENTS, MAX_TEXT_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Rejects empty or whitespace-only values.
pub fn validate_required(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Caps free-text length.
pub fn validate_text(field: &str, value: &str) -> ValidationResult<()> {
    if value.chars().count() > MAX_TEXT_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_TEXT_LEN,
        });
    }
    Ok(())
}

pub fn validate_optional_text(field: &str, value: Option<&str>) -> ValidationResult<()> {
    match value {
        Some(v) => validate_text(field, v),
        None => Ok(()),
    }
}

// =============================================================================
// Money Validators
// =============================================================================

/// Payment amounts must be strictly positive.
pub fn validate_payment_amount(amount: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "amount".to_string(),
        });
    }
    Ok(())
}

/// Opening and closing balances may be zero but not negative.
pub fn validate_balance(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Payload Validators
// =============================================================================

/// All identifying check fields are mandatory. New checks start pending.
pub fn validate_check_details(check: &CheckDetails) -> ValidationResult<()> {
    validate_required("check.bank", &check.bank)?;
    validate_required("check.check_number", &check.check_number)?;
    validate_required("check.account_holder", &check.account_holder)?;
    validate_required("check.branch", &check.branch)?;
    validate_required("check.account_number", &check.account_number)?;

    if check.compensation_status != CompensationStatus::Pending {
        return Err(ValidationError::NotAllowed {
            field: "check.compensation_status".to_string(),
            allowed: vec![CompensationStatus::Pending.as_str().to_string()],
        });
    }
    if let Some(presentation) = check.presentation_date {
        if presentation < check.check_date {
            return Err(ValidationError::Conflict {
                field: "check.presentation_date".to_string(),
                reason: "cannot be before the check date".to_string(),
            });
        }
    }
    Ok(())
}

/// Installment count within bounds, explicit due dates ascending and one per
/// installment.
/// Checks a debt plan against the payment amount. A debt-generating plan
/// needs at least one centavo per installment.
pub fn validate_client_debt_plan(plan: &ClientDebtPlan, amount: Money) -> ValidationResult<()> {
    if plan.installments == 0 || plan.installments > MAX_INSTALLMENTS {
        return Err(ValidationError::OutOfRange {
            field: "client_debt.installments".to_string(),
            min: 1,
            max: i64::from(MAX_INSTALLMENTS),
        });
    }

    if plan.generate_debt && amount.cents() < i64::from(plan.installments) {
        return Err(ValidationError::OutOfRange {
            field: "client_debt.installments".to_string(),
            min: 1,
            max: amount.cents().clamp(1, i64::from(MAX_INSTALLMENTS)),
        });
    }

    if !plan.due_dates.is_empty() {
        if plan.due_dates.len() != plan.installments as usize {
            return Err(ValidationError::Conflict {
                field: "client_debt.due_dates".to_string(),
                reason: format!("expected {} due dates", plan.installments),
            });
        }
        if plan.due_dates.windows(2).any(|w| w[1] < w[0]) {
            return Err(ValidationError::Conflict {
                field: "client_debt.due_dates".to_string(),
                reason: "must be in ascending order".to_string(),
            });
        }
    }
    Ok(())
}

pub fn validate_installments(installments: &Installments) -> ValidationResult<()> {
    if installments.total == 0 || installments.total > MAX_INSTALLMENTS {
        return Err(ValidationError::OutOfRange {
            field: "installments.total".to_string(),
            min: 1,
            max: i64::from(MAX_INSTALLMENTS),
        });
    }
    if installments.current == 0 || installments.current > installments.total {
        return Err(ValidationError::OutOfRange {
            field: "installments.current".to_string(),
            min: 1,
            max: i64::from(installments.total),
        });
    }
    if !installments.value.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "installments.value".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Payment Validator
// =============================================================================

/// Validates a payment before it is recorded.
///
/// ## Rules
/// ```text
/// amount > 0                                  always
/// created_by present                          always
/// category present                            expense
/// customer_id or legacy_client_id present     debt_payment
/// not both customer_id and legacy_client_id   always
/// check fields present, status pending        check
/// client_debt plan valid, client present,     bank_slip / promissory_note
///   not on an expense                           with generate_debt
/// ```
pub fn validate_new_payment(input: &NewPayment) -> ValidationResult<()> {
    validate_payment_amount(input.amount)?;
    validate_required("created_by", &input.created_by)?;
    validate_optional_text("description", input.description.as_deref())?;
    validate_optional_text("category", input.category.as_deref())?;

    if input.customer_id.is_some() && input.legacy_client_id.is_some() {
        return Err(ValidationError::Conflict {
            field: "customer_id".to_string(),
            reason: "a payment belongs to either a customer or a legacy client".to_string(),
        });
    }

    match input.payment_type {
        PaymentType::Expense => {
            let category = input.category.as_deref().unwrap_or_default();
            validate_required("category", category)?;
        }
        PaymentType::DebtPayment => {
            let client = input.client_id().unwrap_or_default();
            validate_required("customer_id", client)?;
        }
        PaymentType::Sale => {}
    }

    if let Some(installments) = &input.installments {
        validate_installments(installments)?;
    }

    if let crate::types::PaymentDetails::Check(check) = &input.details {
        validate_check_details(check)?;
    }

    if let Some(plan) = input.details.client_debt() {
        validate_client_debt_plan(plan, input.amount)?;
        if plan.generate_debt {
            if input.payment_type == PaymentType::Expense {
                return Err(ValidationError::Conflict {
                    field: "client_debt".to_string(),
                    reason: "expenses cannot generate client debt".to_string(),
                });
            }
            validate_required("customer_id", input.client_id().unwrap_or_default())?;
        }
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BankSlipDetails, PaymentDetails, PromissoryNoteDetails};
    use chrono::NaiveDate;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 11, d).unwrap()
    }

    fn check() -> CheckDetails {
        CheckDetails {
            bank: "237".to_string(),
            check_number: "000042".to_string(),
            check_date: date(1),
            account_holder: "Carlos Prado".to_string(),
            branch: "0450".to_string(),
            account_number: "11223-4".to_string(),
            presentation_date: None,
            compensation_status: CompensationStatus::Pending,
            rejection_reason: None,
        }
    }

    fn payment(payment_type: PaymentType, details: PaymentDetails) -> NewPayment {
        NewPayment::new(Money::from_cents(10_000), payment_type, details, "ana")
    }

    fn plan(installments: u32, due_dates: Vec<NaiveDate>) -> ClientDebtPlan {
        ClientDebtPlan {
            generate_debt: true,
            installments,
            due_dates,
        }
    }

    #[test]
    fn test_amount_must_be_positive() {
        let mut input = payment(PaymentType::Sale, PaymentDetails::Cash);
        input.amount = Money::zero();
        assert_eq!(
            validate_new_payment(&input),
            Err(ValidationError::MustBePositive { field: "amount".to_string() })
        );
        input.amount = Money::from_cents(-1);
        assert!(validate_new_payment(&input).is_err());
    }

    #[test]
    fn test_expense_requires_category() {
        let mut input = payment(PaymentType::Expense, PaymentDetails::Cash);
        assert!(validate_new_payment(&input).is_err());
        input.category = Some("  ".to_string());
        assert!(validate_new_payment(&input).is_err());
        input.category = Some("courier".to_string());
        assert!(validate_new_payment(&input).is_ok());
    }

    #[test]
    fn test_debt_payment_requires_client() {
        let mut input = payment(PaymentType::DebtPayment, PaymentDetails::Pix);
        assert!(validate_new_payment(&input).is_err());
        input.legacy_client_id = Some("legacy-7".to_string());
        assert!(validate_new_payment(&input).is_ok());

        input.customer_id = Some("cust-1".to_string());
        assert!(matches!(
            validate_new_payment(&input),
            Err(ValidationError::Conflict { .. })
        ));
    }

    #[test]
    fn test_check_payload() {
        assert!(validate_new_payment(&payment(PaymentType::Sale, PaymentDetails::Check(check()))).is_ok());

        let mut blank_bank = check();
        blank_bank.bank = String::new();
        assert!(validate_check_details(&blank_bank).is_err());

        let mut already_compensated = check();
        already_compensated.compensation_status = CompensationStatus::Compensated;
        assert!(validate_check_details(&already_compensated).is_err());

        let mut presented_early = check();
        presented_early.check_date = date(10);
        presented_early.presentation_date = Some(date(2));
        assert!(validate_check_details(&presented_early).is_err());
    }

    #[test]
    fn test_client_debt_plan() {
        let amount = Money::from_cents(10_000);
        assert!(validate_client_debt_plan(&plan(3, vec![]), amount).is_ok());
        assert!(validate_client_debt_plan(&plan(2, vec![date(1), date(15)]), amount).is_ok());
        assert!(validate_client_debt_plan(&plan(0, vec![]), amount).is_err());
        assert!(validate_client_debt_plan(&plan(MAX_INSTALLMENTS + 1, vec![]), amount).is_err());
        assert!(validate_client_debt_plan(&plan(2, vec![date(1)]), amount).is_err());
        assert!(validate_client_debt_plan(&plan(2, vec![date(15), date(1)]), amount).is_err());
    }

    #[test]
    fn test_plan_needs_a_centavo_per_installment() {
        let three = plan(3, vec![]);
        assert!(validate_client_debt_plan(&three, Money::from_cents(3)).is_ok());
        assert!(validate_client_debt_plan(&three, Money::from_cents(2)).is_err());

        let no_debt = ClientDebtPlan { generate_debt: false, ..three };
        assert!(validate_client_debt_plan(&no_debt, Money::from_cents(2)).is_ok());

        let mut note = payment(
            PaymentType::Sale,
            PaymentDetails::PromissoryNote(PromissoryNoteDetails {
                number: None,
                client_debt: Some(plan(3, vec![])),
            }),
        );
        note.customer_id = Some("cust-1".to_string());
        note.amount = Money::from_cents(2);
        assert!(matches!(
            validate_new_payment(&note),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_generate_debt_needs_client_and_not_expense() {
        let slip = PaymentDetails::BankSlip(BankSlipDetails {
            client_debt: Some(plan(2, vec![])),
            ..Default::default()
        });
        let mut sale = payment(PaymentType::Sale, slip.clone());
        assert!(validate_new_payment(&sale).is_err());
        sale.customer_id = Some("cust-1".to_string());
        assert!(validate_new_payment(&sale).is_ok());

        let mut expense = payment(PaymentType::Expense, slip);
        expense.category = Some("rent".to_string());
        expense.customer_id = Some("cust-1".to_string());
        assert!(matches!(
            validate_new_payment(&expense),
            Err(ValidationError::Conflict { .. })
        ));

        let note = PaymentDetails::PromissoryNote(PromissoryNoteDetails {
            number: Some("NP-1".to_string()),
            client_debt: Some(plan(4, vec![])),
        });
        let mut note_sale = payment(PaymentType::Sale, note);
        note_sale.customer_id = Some("cust-1".to_string());
        assert!(validate_new_payment(&note_sale).is_ok());
    }

    #[test]
    fn test_installments() {
        let ok = Installments { current: 1, total: 3, value: Money::from_cents(100) };
        assert!(validate_installments(&ok).is_ok());
        assert!(validate_installments(&Installments { current: 4, ..ok }).is_err());
        assert!(validate_installments(&Installments { current: 0, ..ok }).is_err());
        assert!(validate_installments(&Installments { value: Money::zero(), ..ok }).is_err());
    }

    #[test]
    fn test_balances_and_text() {
        assert!(validate_balance("opening_balance", Money::zero()).is_ok());
        assert!(validate_balance("opening_balance", Money::from_cents(-1)).is_err());
        assert!(validate_text("observations", &"x".repeat(MAX_TEXT_LEN)).is_ok());
        assert!(validate_text("observations", &"x".repeat(MAX_TEXT_LEN + 1)).is_err());
    }
}
