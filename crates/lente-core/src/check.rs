//! # Check Compensation
//!
//! ```text
//!            ┌──────────────► compensated (terminal)
//!   pending ─┤
//!            └──────────────► rejected    (terminal, reason required)
//! ```
//!
//! Compensation is a sub-ledger: the check was already counted into the
//! register when it was received. A compensated check completes the
//! payment; a rejected one leaves the payment pending for follow-up.

use crate::error::{CoreError, CoreResult};
use crate::types::{CheckDetails, CompensationStatus};
use crate::validation::validate_text;

/// Validates and applies a compensation transition to the check payload.
///
/// `pending -> pending` is accepted as a no-op. Anything leaving a terminal
/// state is an [`CoreError::InvalidTransition`]. A rejection without a
/// non-blank reason is [`CoreError::MissingReason`].
pub fn transition(
    details: &mut CheckDetails,
    next: CompensationStatus,
    reason: Option<&str>,
) -> CoreResult<()> {
    let current = details.compensation_status;

    match (current, next) {
        (CompensationStatus::Pending, CompensationStatus::Pending) => Ok(()),
        (CompensationStatus::Pending, CompensationStatus::Compensated) => {
            details.compensation_status = CompensationStatus::Compensated;
            details.rejection_reason = None;
            Ok(())
        }
        (CompensationStatus::Pending, CompensationStatus::Rejected) => {
            let reason = reason.map(str::trim).filter(|r| !r.is_empty());
            let Some(reason) = reason else {
                return Err(CoreError::MissingReason);
            };
            validate_text("rejection_reason", reason)?;

            details.compensation_status = CompensationStatus::Rejected;
            details.rejection_reason = Some(reason.to_string());
            Ok(())
        }
        (from, to) => Err(CoreError::InvalidTransition {
            entity: "check compensation",
            from: from.as_str().to_string(),
            to: to.as_str().to_string(),
        }),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn check() -> CheckDetails {
        CheckDetails {
            bank: "001".to_string(),
            check_number: "000777".to_string(),
            check_date: NaiveDate::from_ymd_opt(2026, 10, 20).unwrap(),
            account_holder: "Joana Lima".to_string(),
            branch: "1234".to_string(),
            account_number: "99887-1".to_string(),
            presentation_date: None,
            compensation_status: CompensationStatus::Pending,
            rejection_reason: None,
        }
    }

    #[test]
    fn test_pending_to_compensated() {
        let mut details = check();
        transition(&mut details, CompensationStatus::Compensated, None).unwrap();
        assert_eq!(details.compensation_status, CompensationStatus::Compensated);
    }

    #[test]
    fn test_rejection_requires_reason() {
        let mut details = check();
        let err = transition(&mut details, CompensationStatus::Rejected, None).unwrap_err();
        assert!(matches!(err, CoreError::MissingReason));

        let err = transition(&mut details, CompensationStatus::Rejected, Some("   ")).unwrap_err();
        assert!(matches!(err, CoreError::MissingReason));
        assert_eq!(details.compensation_status, CompensationStatus::Pending);

        transition(&mut details, CompensationStatus::Rejected, Some(" insufficient funds ")).unwrap();
        assert_eq!(details.compensation_status, CompensationStatus::Rejected);
        assert_eq!(details.rejection_reason.as_deref(), Some("insufficient funds"));
    }

    #[test]
    fn test_terminal_states_refuse_changes() {
        let mut details = check();
        transition(&mut details, CompensationStatus::Compensated, None).unwrap();

        let err =
            transition(&mut details, CompensationStatus::Rejected, Some("late")).unwrap_err();
        assert!(matches!(err, CoreError::InvalidTransition { .. }));

        let err = transition(&mut details, CompensationStatus::Pending, None).unwrap_err();
        assert!(matches!(err, CoreError::InvalidTransition { .. }));

        let mut rejected = check();
        transition(&mut rejected, CompensationStatus::Rejected, Some("stopped")).unwrap();
        let err = transition(&mut rejected, CompensationStatus::Compensated, None).unwrap_err();
        assert!(matches!(err, CoreError::InvalidTransition { .. }));
        assert_eq!(rejected.rejection_reason.as_deref(), Some("stopped"));
    }

    #[test]
    fn test_pending_to_pending_is_noop() {
        let mut details = check();
        transition(&mut details, CompensationStatus::Pending, None).unwrap();
        assert_eq!(details, check());
    }
}
