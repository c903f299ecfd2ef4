//! # Boleto Types
//!
//! Domain-facing request/response types plus the wire shapes exchanged with
//! the bank API. Amounts stay in [`Money`] until the wire boundary, where
//! they become decimal numbers with two places.
//!
//! ## Wire Mapping
//! ```text
//! BoletoRequest ──► WireBoletoRequest (camelCase, codes from config)
//!                     POST {base}/boletos
//! GeneratedBoleto ◄── WireBoleto {nossoNumero, codigoBarras, linhaDigitavel, ...}
//! BoletoStatusReport ◄── WireBoletoStatus {situacao, valorPago, dataPagamento}
//! ```

use chrono::NaiveDate;
use lente_core::Money;
use serde::{Deserialize, Serialize};

use crate::config::GatewayConfig;
use crate::error::{GatewayError, GatewayResult};

// =============================================================================
// Domain Types
// =============================================================================

/// Who pays the boleto.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payer {
    /// CPF or CNPJ, digits only.
    pub document: String,
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    /// Two-letter state code.
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub zip_code: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// What the caller asks to be registered. Beneficiary data comes from
/// [`GatewayConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoletoRequest {
    pub amount: Money,
    pub due_date: NaiveDate,
    /// Our own reference for the boleto ("seu número"), usually the
    /// payment id or a short code derived from it.
    pub your_number: String,
    pub payer: Payer,
    #[serde(default)]
    pub instructions: Vec<String>,
}

impl BoletoRequest {
    pub fn validate(&self) -> GatewayResult<()> {
        if !self.amount.is_positive() {
            return Err(GatewayError::invalid_request("amount must be positive"));
        }
        if self.your_number.trim().is_empty() {
            return Err(GatewayError::invalid_request("your_number is required"));
        }
        let digits = self.payer.document.chars().filter(char::is_ascii_digit).count();
        if digits != 11 && digits != 14 {
            return Err(GatewayError::invalid_request(
                "payer document must be a CPF (11 digits) or CNPJ (14 digits)",
            ));
        }
        if self.payer.name.trim().is_empty() {
            return Err(GatewayError::invalid_request("payer name is required"));
        }
        Ok(())
    }
}

/// Identifiers returned once the bank registers a boleto.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedBoleto {
    pub nosso_numero: String,
    pub barcode_line: String,
    pub human_readable_line: String,
    pub pdf_url: Option<String>,
    pub qr_code: Option<String>,
}

/// Bank-side lifecycle of a boleto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BoletoStatus {
    Registered,
    WrittenOff,
    Paid,
    Overdue,
    Protested,
    Cancelled,
}

impl BoletoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BoletoStatus::Registered => "REGISTERED",
            BoletoStatus::WrittenOff => "WRITTEN_OFF",
            BoletoStatus::Paid => "PAID",
            BoletoStatus::Overdue => "OVERDUE",
            BoletoStatus::Protested => "PROTESTED",
            BoletoStatus::Cancelled => "CANCELLED",
        }
    }

    /// No further bank-side change is expected.
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            BoletoStatus::Paid | BoletoStatus::WrittenOff | BoletoStatus::Cancelled
        )
    }
}

impl std::fmt::Display for BoletoStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoletoStatusReport {
    pub nosso_numero: String,
    pub status: BoletoStatus,
    pub paid_amount: Option<Money>,
    pub paid_at: Option<NaiveDate>,
}

/// Fixed set of reasons the bank accepts for cancelling (writing off) a
/// boleto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CancelReason {
    /// Paid through another channel (cash at the store, PIX, ...).
    PaidElsewhere,
    IssuedInError,
    CustomerRequest,
    /// Replaced by a renegotiated boleto.
    Renegotiated,
}

// =============================================================================
// Wire Types
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireBoletoRequest {
    pub numero_cooperativa: String,
    pub codigo_posto: String,
    pub codigo_beneficiario: String,
    pub pagador: WirePayer,
    pub boleto: WireBoletoBlock,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub instrucoes: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WirePayer {
    pub numero_cpf_cnpj: String,
    pub nome: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endereco: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cidade: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uf: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cep: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireBoletoBlock {
    /// Decimal reais, two places.
    pub valor: f64,
    pub data_vencimento: NaiveDate,
    pub seu_numero: String,
    pub especie_documento: &'static str,
}

impl WireBoletoRequest {
    /// Builds the wire body. Beneficiary codes come only from `config`.
    pub fn build(config: &GatewayConfig, request: &BoletoRequest) -> Self {
        let payer = &request.payer;
        WireBoletoRequest {
            numero_cooperativa: config.cooperative_code.clone(),
            codigo_posto: config.post_code.clone(),
            codigo_beneficiario: config.beneficiary_code.clone(),
            pagador: WirePayer {
                numero_cpf_cnpj: payer.document.chars().filter(char::is_ascii_digit).collect(),
                nome: payer.name.clone(),
                endereco: payer.address.clone(),
                cidade: payer.city.clone(),
                uf: payer.state.clone(),
                cep: payer.zip_code.clone(),
                email: payer.email.clone(),
            },
            boleto: WireBoletoBlock {
                valor: money_to_wire(request.amount),
                data_vencimento: request.due_date,
                seu_numero: request.your_number.clone(),
                especie_documento: "DM",
            },
            instrucoes: request.instructions.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireBoleto {
    pub nosso_numero: String,
    pub codigo_barras: String,
    pub linha_digitavel: String,
    #[serde(default)]
    pub pdf_url: Option<String>,
    #[serde(default)]
    pub qr_code: Option<String>,
}

impl From<WireBoleto> for GeneratedBoleto {
    fn from(wire: WireBoleto) -> Self {
        GeneratedBoleto {
            nosso_numero: wire.nosso_numero,
            barcode_line: wire.codigo_barras,
            human_readable_line: wire.linha_digitavel,
            pdf_url: wire.pdf_url,
            qr_code: wire.qr_code,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireBoletoStatus {
    pub nosso_numero: String,
    pub situacao: BoletoStatus,
    #[serde(default)]
    pub valor_pago: Option<serde_json::Number>,
    #[serde(default)]
    pub data_pagamento: Option<NaiveDate>,
}

impl TryFrom<WireBoletoStatus> for BoletoStatusReport {
    type Error = GatewayError;

    fn try_from(wire: WireBoletoStatus) -> GatewayResult<Self> {
        let paid_amount = wire
            .valor_pago
            .map(|n| {
                Money::parse_decimal(&n.to_string()).ok_or_else(|| {
                    GatewayError::decode(format!("valorPago is not a valid amount: {n}"))
                })
            })
            .transpose()?;

        Ok(BoletoStatusReport {
            nosso_numero: wire.nosso_numero,
            status: wire.situacao,
            paid_amount,
            paid_at: wire.data_pagamento,
        })
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct WireCancelRequest {
    pub motivo: CancelReason,
}

/// Converts centavos to the decimal number the bank expects.
pub(crate) fn money_to_wire(amount: Money) -> f64 {
    amount.cents() as f64 / 100.0
}
