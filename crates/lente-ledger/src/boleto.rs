//! # Boleto Service
//!
//! Ties bank-slip payments to boletos registered at the bank.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  issue_for_payment(id, payer)                                           │
//! │     payment pending bank_slip, no nosso número yet                     │
//! │     gateway.generate ──err──► GATEWAY_ERROR (payment untouched)        │
//! │         │ ok                                                            │
//! │         ▼                                                               │
//! │     store nosso número / barcode / pdf on the bank-slip payload         │
//! │                                                                         │
//! │  reconcile(id)                                                          │
//! │     gateway.status ──timeout──► GATEWAY_ERROR (payment stays pending)  │
//! │         │ PAID                                                          │
//! │         ▼                                                               │
//! │     PaymentLedger::confirm ──► settled into the open session           │
//! │                                                                         │
//! │  cancel_boleto(id, reason)                                              │
//! │     gateway.cancel ──ok──► PaymentLedger::cancel                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! No database transaction is held across a gateway call.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Days, NaiveDate, Utc};
use serde::Serialize;
use tracing::{info, warn};

use lente_core::validation::validate_required;
use lente_core::{
    BankSlipDetails, PaymentDetails, PaymentMethod, PaymentStatus, PaymentTransaction,
    ValidationError,
};
use lente_db::Database;
use lente_gateway::{
    BoletoClient, BoletoRequest, BoletoStatus, BoletoStatusReport, CancelReason, GatewayResult,
    GeneratedBoleto, Payer,
};

use crate::error::{ServiceError, ServiceResult};
use crate::payments::PaymentLedger;
use crate::settings::LedgerSettings;

/// The three bank operations the ledger needs.
#[async_trait]
pub trait BoletoGateway: Send + Sync {
    async fn generate(&self, request: &BoletoRequest) -> GatewayResult<GeneratedBoleto>;

    async fn status(&self, nosso_numero: &str) -> GatewayResult<BoletoStatusReport>;

    async fn cancel(&self, nosso_numero: &str, reason: CancelReason) -> GatewayResult<()>;
}

#[async_trait]
impl BoletoGateway for BoletoClient {
    async fn generate(&self, request: &BoletoRequest) -> GatewayResult<GeneratedBoleto> {
        self.generate_boleto(request).await
    }

    async fn status(&self, nosso_numero: &str) -> GatewayResult<BoletoStatusReport> {
        self.get_boleto_status(nosso_numero).await
    }

    async fn cancel(&self, nosso_numero: &str, reason: CancelReason) -> GatewayResult<()> {
        self.cancel_boleto(nosso_numero, reason).await
    }
}

/// Result of polling the bank for one payment.
#[derive(Debug, Clone, Serialize)]
pub struct Reconciliation {
    pub payment: PaymentTransaction,
    pub boleto: BoletoStatusReport,
    /// The poll settled the payment.
    pub confirmed: bool,
}

#[derive(Clone)]
pub struct BoletoService {
    db: Database,
    ledger: PaymentLedger,
    gateway: Arc<dyn BoletoGateway>,
    settings: LedgerSettings,
}

impl std::fmt::Debug for BoletoService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoletoService")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl BoletoService {
    pub fn new(
        db: Database,
        ledger: PaymentLedger,
        gateway: Arc<dyn BoletoGateway>,
        settings: LedgerSettings,
    ) -> Self {
        BoletoService {
            db,
            ledger,
            gateway,
            settings,
        }
    }

    /// Registers a boleto for a pending bank-slip payment and stores the
    /// returned identifiers on it.
    ///
    /// `due_date` defaults to today plus `boleto_due_days`.
    pub async fn issue_for_payment(
        &self,
        payment_id: &str,
        payer: Payer,
        due_date: Option<NaiveDate>,
    ) -> ServiceResult<PaymentTransaction> {
        let payment = self.ledger.get_by_id(payment_id).await?;
        let slip = pending_slip(&payment)?;

        if let Some(existing) = &slip.nosso_numero {
            return Err(ValidationError::Conflict {
                field: "nosso_numero".to_string(),
                reason: format!("boleto {existing} already issued for this payment"),
            }
            .into());
        }

        let due_date = match due_date {
            Some(date) => date,
            None => Utc::now()
                .date_naive()
                .checked_add_days(Days::new(u64::from(self.settings.boleto_due_days)))
                .ok_or_else(|| ValidationError::InvalidFormat {
                    field: "due_date".to_string(),
                    reason: "due date out of range".to_string(),
                })?,
        };

        let request = BoletoRequest {
            amount: payment.amount,
            due_date,
            your_number: your_number(&payment.id),
            payer,
            instructions: Vec::new(),
        };

        let boleto = self.gateway.generate(&request).await.map_err(|e| {
            warn!(payment_id = %payment_id, code = e.code, "Boleto registration failed");
            e
        })?;

        let details = PaymentDetails::BankSlip(BankSlipDetails {
            nosso_numero: Some(boleto.nosso_numero.clone()),
            barcode_line: Some(boleto.barcode_line),
            human_readable_line: Some(boleto.human_readable_line),
            pdf_url: boleto.pdf_url,
            ..slip.clone()
        });

        let payments = self.db.payments();
        let mut tx = self.db.begin().await?;
        let stored = payments
            .update_details(
                &mut tx,
                payment_id,
                PaymentStatus::Pending,
                &details,
                PaymentStatus::Pending,
                Utc::now(),
            )
            .await?;
        if !stored {
            // Registered at the bank but the payment moved on; the number
            // is logged so it can be written off by hand.
            warn!(
                payment_id = %payment_id,
                nosso_numero = %boleto.nosso_numero,
                "Payment changed while its boleto was being registered"
            );
            return Err(ServiceError::Conflict {
                entity: "payment",
                id: payment_id.to_string(),
            });
        }
        let updated = payments
            .get_by_id(&mut tx, payment_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("payment", payment_id))?;
        tx.commit().await?;

        info!(
            payment_id = %payment_id,
            nosso_numero = %boleto.nosso_numero,
            due_date = %due_date,
            "Boleto issued"
        );
        Ok(updated)
    }

    /// Polls the bank and confirms the payment once the boleto is paid.
    pub async fn reconcile(&self, payment_id: &str) -> ServiceResult<Reconciliation> {
        let payment = self.ledger.get_by_id(payment_id).await?;
        let nosso_numero = issued_number(&payment)?;

        let report = self.gateway.status(&nosso_numero).await.map_err(|e| {
            if e.is_timeout() {
                warn!(payment_id = %payment_id, "Boleto status timed out, payment left pending");
            }
            e
        })?;

        if report.status == BoletoStatus::Paid && payment.status == PaymentStatus::Pending {
            if let Some(paid) = report.paid_amount.filter(|paid| *paid != payment.amount) {
                warn!(
                    payment_id = %payment_id,
                    expected = %payment.amount,
                    paid = %paid,
                    "Boleto paid with a different amount"
                );
            }
            let confirmed = self.ledger.confirm(payment_id).await?;
            return Ok(Reconciliation {
                payment: confirmed,
                boleto: report,
                confirmed: true,
            });
        }

        if report.status.is_final() && payment.status == PaymentStatus::Pending {
            info!(
                payment_id = %payment_id,
                status = %report.status,
                "Boleto closed at the bank without payment"
            );
        }

        Ok(Reconciliation {
            payment,
            boleto: report,
            confirmed: false,
        })
    }

    /// Writes the boleto off at the bank, then cancels the payment.
    pub async fn cancel_boleto(
        &self,
        payment_id: &str,
        reason: CancelReason,
        cancelled_by: &str,
    ) -> ServiceResult<PaymentTransaction> {
        validate_required("cancelled_by", cancelled_by)?;

        let payment = self.ledger.get_by_id(payment_id).await?;
        if payment.status == PaymentStatus::Cancelled {
            return Err(ServiceError::AlreadyCancelled {
                payment_id: payment.id,
            });
        }
        let nosso_numero = issued_number(&payment)?;

        self.gateway.cancel(&nosso_numero, reason).await?;
        self.ledger.cancel(payment_id, cancelled_by).await
    }
}

fn pending_slip(payment: &PaymentTransaction) -> ServiceResult<&BankSlipDetails> {
    let PaymentDetails::BankSlip(slip) = &payment.details else {
        return Err(ValidationError::NotAllowed {
            field: "payment_method".to_string(),
            allowed: vec![PaymentMethod::BankSlip.as_str().to_string()],
        }
        .into());
    };
    if payment.status != PaymentStatus::Pending {
        return Err(ServiceError::InvalidTransition {
            entity: "boleto",
            from: payment.status.as_str().to_string(),
            to: "issued".to_string(),
        });
    }
    Ok(slip)
}

fn issued_number(payment: &PaymentTransaction) -> ServiceResult<String> {
    match &payment.details {
        PaymentDetails::BankSlip(BankSlipDetails {
            nosso_numero: Some(nn),
            ..
        }) => Ok(nn.clone()),
        PaymentDetails::BankSlip(_) => Err(ValidationError::Required {
            field: "nosso_numero".to_string(),
        }
        .into()),
        _ => Err(ValidationError::NotAllowed {
            field: "payment_method".to_string(),
            allowed: vec![PaymentMethod::BankSlip.as_str().to_string()],
        }
        .into()),
    }
}

/// Banks cap "seu número" at 15 characters.
fn your_number(payment_id: &str) -> String {
    payment_id
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .take(15)
        .collect::<String>()
        .to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_your_number_is_short_alphanumeric() {
        let n = your_number("3f2b9c1e-8d4a-4b6f-9e21-7c0d5a4b3e10");
        assert_eq!(n, "3F2B9C1E8D4A4B6");
        assert_eq!(n.len(), 15);
    }
}
