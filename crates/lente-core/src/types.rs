//! # Domain Types
//!
//! Core domain types used throughout the settlement engine.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌──────────────────────┐        ┌──────────────────────────┐          │
//! │  │ CashRegisterSession  │◄───────│   PaymentTransaction     │          │
//! │  │  ──────────────────  │ cash_  │  ──────────────────────  │          │
//! │  │  status open/closed  │ regis- │  amount (Money)          │          │
//! │  │  sales {per method}  │ ter_id │  payment_type            │          │
//! │  │  payments {rcv,made} │        │  status                  │          │
//! │  │  version (CAS)       │        │  details: PaymentDetails │          │
//! │  └──────────────────────┘        └────────────┬─────────────┘          │
//! │                                               │ order_id                │
//! │                                  ┌────────────▼─────────────┐          │
//! │  ┌──────────────────────┐        │         Order            │          │
//! │  │       Client         │◄───────│  final_price             │          │
//! │  │  total_debt (cache)  │ client │  payment_entry           │          │
//! │  └──────────────────────┘  _id   │  payment_history[]       │          │
//! │                                  └──────────────────────────┘          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! Every entity is keyed by a UUID v4 string. Soft-deleted rows keep their
//! id and are hidden from reads.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

// =============================================================================
// Payment Method
// =============================================================================

/// How money changed hands.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Credit,
    Debit,
    Cash,
    Pix,
    BankSlip,
    PromissoryNote,
    Check,
}

impl PaymentMethod {
    /// Every method, in display order.
    pub const ALL: [PaymentMethod; 7] = [
        PaymentMethod::Cash,
        PaymentMethod::Credit,
        PaymentMethod::Debit,
        PaymentMethod::Pix,
        PaymentMethod::Check,
        PaymentMethod::BankSlip,
        PaymentMethod::PromissoryNote,
    ];

    /// Money is in hand the moment the payment is recorded.
    pub const fn is_instantaneous(&self) -> bool {
        matches!(
            self,
            PaymentMethod::Cash | PaymentMethod::Credit | PaymentMethod::Debit | PaymentMethod::Pix
        )
    }

    /// Whether a payment with this method is counted into the register when
    /// it is created.
    ///
    /// Checks are counted at creation even though they start `pending`;
    /// compensation only tracks whether the bank honored them. Bank slips
    /// and promissory notes are counted when confirmed.
    pub const fn settles_on_creation(&self) -> bool {
        self.is_instantaneous() || matches!(self, PaymentMethod::Check)
    }

    /// Methods that may carry a client-debt installment plan.
    pub const fn supports_client_debt(&self) -> bool {
        matches!(self, PaymentMethod::BankSlip | PaymentMethod::PromissoryNote)
    }

    /// Initial status of a freshly recorded payment.
    pub const fn initial_status(&self) -> PaymentStatus {
        if self.is_instantaneous() {
            PaymentStatus::Completed
        } else {
            PaymentStatus::Pending
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Credit => "credit",
            PaymentMethod::Debit => "debit",
            PaymentMethod::Cash => "cash",
            PaymentMethod::Pix => "pix",
            PaymentMethod::BankSlip => "bank_slip",
            PaymentMethod::PromissoryNote => "promissory_note",
            PaymentMethod::Check => "check",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PaymentMethod::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "payment_method".to_string(),
                allowed: PaymentMethod::ALL.iter().map(|m| m.as_str().to_string()).collect(),
            })
    }
}

// =============================================================================
// Payment Type / Status
// =============================================================================

/// What the money was for.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    /// Payment for an order at the counter.
    Sale,
    /// Client paying down an existing debt.
    DebtPayment,
    /// Money leaving the register (supplies, courier, ...).
    Expense,
}

/// Lifecycle of a payment.
///
/// ```text
///   pending ──confirm/compensate──► completed
///      │                               │
///      └──────────cancel──────────┬────┘
///                                 ▼
///                             cancelled (terminal)
/// ```
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Cancelled,
}

impl PaymentStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Cancelled => "cancelled",
        }
    }
}

// =============================================================================
// Register Status
// =============================================================================

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum RegisterStatus {
    Open,
    Closed,
}

impl RegisterStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            RegisterStatus::Open => "open",
            RegisterStatus::Closed => "closed",
        }
    }
}

// =============================================================================
// Register Totals
// =============================================================================

/// Sales received during a session, per method plus the grand total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SalesTotals {
    pub total: Money,
    pub cash: Money,
    pub credit: Money,
    pub debit: Money,
    pub pix: Money,
    pub bank_slip: Money,
    pub promissory_note: Money,
    pub check: Money,
}

impl SalesTotals {
    /// Returns the running total for one method.
    pub fn by_method(&self, method: PaymentMethod) -> Money {
        match method {
            PaymentMethod::Cash => self.cash,
            PaymentMethod::Credit => self.credit,
            PaymentMethod::Debit => self.debit,
            PaymentMethod::Pix => self.pix,
            PaymentMethod::BankSlip => self.bank_slip,
            PaymentMethod::PromissoryNote => self.promissory_note,
            PaymentMethod::Check => self.check,
        }
    }

    pub(crate) fn slot_mut(&mut self, method: PaymentMethod) -> &mut Money {
        match method {
            PaymentMethod::Cash => &mut self.cash,
            PaymentMethod::Credit => &mut self.credit,
            PaymentMethod::Debit => &mut self.debit,
            PaymentMethod::Pix => &mut self.pix,
            PaymentMethod::BankSlip => &mut self.bank_slip,
            PaymentMethod::PromissoryNote => &mut self.promissory_note,
            PaymentMethod::Check => &mut self.check,
        }
    }
}

/// Non-sale movements: debt payments received and expenses paid out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MovementTotals {
    pub received: Money,
    pub made: Money,
}

// =============================================================================
// Cash Register Session
// =============================================================================

/// A bounded period during which one physical register accepts payments.
///
/// Only one non-deleted session may be open at a time. Totals are only
/// mutated while open; a closed session is frozen.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CashRegisterSession {
    pub id: String,
    pub status: RegisterStatus,

    #[ts(as = "String")]
    pub opened_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub closed_at: Option<DateTime<Utc>>,

    pub opening_balance: Money,
    /// Physically counted amount at close.
    pub closing_balance: Option<Money>,
    /// `opening + sales.total + payments.received - payments.made`, stored at close.
    pub expected_balance: Option<Money>,
    /// `closing - expected`, stored at close. Never rejected, only recorded.
    pub variance: Option<Money>,

    pub sales: SalesTotals,
    pub payments: MovementTotals,

    pub opened_by: String,
    pub closed_by: Option<String>,
    pub observations: Option<String>,

    /// Optimistic concurrency counter, bumped on every totals mutation.
    pub version: i64,

    pub is_deleted: bool,
    #[ts(as = "Option<String>")]
    pub deleted_at: Option<DateTime<Utc>>,
    pub deleted_by: Option<String>,
}

impl CashRegisterSession {
    /// Creates a freshly opened session with zeroed totals.
    pub fn open(
        opening_balance: Money,
        opened_by: impl Into<String>,
        observations: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        CashRegisterSession {
            id: uuid::Uuid::new_v4().to_string(),
            status: RegisterStatus::Open,
            opened_at: now,
            closed_at: None,
            opening_balance,
            closing_balance: None,
            expected_balance: None,
            variance: None,
            sales: SalesTotals::default(),
            payments: MovementTotals::default(),
            opened_by: opened_by.into(),
            closed_by: None,
            observations,
            version: 0,
            is_deleted: false,
            deleted_at: None,
            deleted_by: None,
        }
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.status == RegisterStatus::Open
    }
}

// =============================================================================
// Method Payloads
// =============================================================================

/// Outcome of presenting a check to the bank.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum CompensationStatus {
    #[default]
    Pending,
    Compensated,
    Rejected,
}

impl CompensationStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            CompensationStatus::Pending => "pending",
            CompensationStatus::Compensated => "compensated",
            CompensationStatus::Rejected => "rejected",
        }
    }
}

/// Check data captured at the counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CheckDetails {
    pub bank: String,
    pub check_number: String,
    #[ts(as = "String")]
    pub check_date: NaiveDate,
    pub account_holder: String,
    pub branch: String,
    pub account_number: String,
    #[ts(as = "Option<String>")]
    #[serde(default)]
    pub presentation_date: Option<NaiveDate>,
    #[serde(default)]
    pub compensation_status: CompensationStatus,
    #[serde(default)]
    pub rejection_reason: Option<String>,
}

/// Installment plan that turns a bank slip or promissory note into client debt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ClientDebtPlan {
    pub generate_debt: bool,
    pub installments: u32,
    /// Explicit due dates, one per installment. Empty means monthly from
    /// the payment date.
    #[ts(as = "Vec<String>")]
    #[serde(default)]
    pub due_dates: Vec<NaiveDate>,
}

/// Bank slip (boleto) data. Gateway identifiers are filled in after issue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BankSlipDetails {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub bank: Option<String>,
    #[serde(default)]
    pub nosso_numero: Option<String>,
    #[serde(default)]
    pub barcode_line: Option<String>,
    #[serde(default)]
    pub human_readable_line: Option<String>,
    #[serde(default)]
    pub pdf_url: Option<String>,
    #[serde(default)]
    pub client_debt: Option<ClientDebtPlan>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PromissoryNoteDetails {
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default)]
    pub client_debt: Option<ClientDebtPlan>,
}

/// Method-specific payload. Exactly one shape per method.
///
/// Serialized with the method as the tag:
/// `{"method":"check","bank":"001",...}` or `{"method":"pix"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum PaymentDetails {
    Cash,
    Credit,
    Debit,
    Pix,
    Check(CheckDetails),
    BankSlip(BankSlipDetails),
    PromissoryNote(PromissoryNoteDetails),
}

impl PaymentDetails {
    pub fn method(&self) -> PaymentMethod {
        match self {
            PaymentDetails::Cash => PaymentMethod::Cash,
            PaymentDetails::Credit => PaymentMethod::Credit,
            PaymentDetails::Debit => PaymentMethod::Debit,
            PaymentDetails::Pix => PaymentMethod::Pix,
            PaymentDetails::Check(_) => PaymentMethod::Check,
            PaymentDetails::BankSlip(_) => PaymentMethod::BankSlip,
            PaymentDetails::PromissoryNote(_) => PaymentMethod::PromissoryNote,
        }
    }

    pub fn client_debt(&self) -> Option<&ClientDebtPlan> {
        match self {
            PaymentDetails::BankSlip(d) => d.client_debt.as_ref(),
            PaymentDetails::PromissoryNote(d) => d.client_debt.as_ref(),
            _ => None,
        }
    }

    pub fn compensation_status(&self) -> Option<CompensationStatus> {
        match self {
            PaymentDetails::Check(c) => Some(c.compensation_status),
            _ => None,
        }
    }
}

// =============================================================================
// Payment Transaction
// =============================================================================

/// Installment position of a single payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Installments {
    pub current: u32,
    pub total: u32,
    pub value: Money,
}

/// One money movement recorded against a register session.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentTransaction {
    pub id: String,
    pub amount: Money,
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
    pub payment_type: PaymentType,
    pub payment_method: PaymentMethod,
    pub status: PaymentStatus,

    /// Session open when the payment was recorded.
    pub cash_register_id: String,
    /// Session whose totals carry this payment. `None` until it settles.
    pub settled_register_id: Option<String>,

    pub order_id: Option<String>,
    pub customer_id: Option<String>,
    pub legacy_client_id: Option<String>,
    pub institution_id: Option<String>,
    pub installments: Option<Installments>,
    pub description: Option<String>,
    pub category: Option<String>,

    pub details: PaymentDetails,

    pub created_by: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancelled_by: Option<String>,

    pub is_deleted: bool,
    #[ts(as = "Option<String>")]
    pub deleted_at: Option<DateTime<Utc>>,
    pub deleted_by: Option<String>,
}

impl PaymentTransaction {
    /// Whether this payment is currently counted in a session's totals.
    #[inline]
    pub fn is_settled(&self) -> bool {
        self.settled_register_id.is_some()
    }

    /// The client this payment belongs to, customer first.
    pub fn client_id(&self) -> Option<&str> {
        self.customer_id
            .as_deref()
            .or(self.legacy_client_id.as_deref())
    }
}

/// Input for recording a payment. The method is carried by `details`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewPayment {
    pub amount: Money,
    pub payment_type: PaymentType,
    pub details: PaymentDetails,
    /// Defaults to now.
    #[ts(as = "Option<String>")]
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub legacy_client_id: Option<String>,
    #[serde(default)]
    pub institution_id: Option<String>,
    #[serde(default)]
    pub installments: Option<Installments>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    pub created_by: String,
}

impl NewPayment {
    /// A minimal payment; remaining fields are set with struct update syntax.
    pub fn new(
        amount: Money,
        payment_type: PaymentType,
        details: PaymentDetails,
        created_by: impl Into<String>,
    ) -> Self {
        NewPayment {
            amount,
            payment_type,
            details,
            date: None,
            order_id: None,
            customer_id: None,
            legacy_client_id: None,
            institution_id: None,
            installments: None,
            description: None,
            category: None,
            created_by: created_by.into(),
        }
    }

    #[inline]
    pub fn method(&self) -> PaymentMethod {
        self.details.method()
    }

    pub fn client_id(&self) -> Option<&str> {
        self.customer_id
            .as_deref()
            .or(self.legacy_client_id.as_deref())
    }
}

/// One row of a generated installment schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentInstallment {
    pub id: String,
    pub payment_id: String,
    pub number: u32,
    pub total: u32,
    pub amount: Money,
    #[ts(as = "String")]
    pub due_date: NaiveDate,
}

// =============================================================================
// Orders & Clients
// =============================================================================

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Open,
    Delivered,
    Cancelled,
}

/// Derived from the order's price and what has been paid against it.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderPaymentStatus {
    Pending,
    PartiallyPaid,
    Paid,
}

/// Clients migrated from the previous system are kept apart from new ones.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ClientKind {
    Customer,
    Legacy,
}

/// One entry of an order's payment history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderPayment {
    pub id: String,
    pub order_id: String,
    /// Ledger payment that produced this entry, if any.
    pub payment_id: Option<String>,
    pub amount: Money,
    pub method: PaymentMethod,
    #[ts(as = "String")]
    pub paid_at: DateTime<Utc>,
}

/// The slice of an order the settlement engine needs.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Order {
    pub id: String,
    pub client_id: String,
    pub client_kind: ClientKind,
    pub final_price: Money,
    /// Down payment taken when the order was placed.
    pub payment_entry: Money,
    pub status: OrderStatus,
    pub payment_status: OrderPaymentStatus,
    pub payment_history: Vec<OrderPayment>,
    pub is_deleted: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Entry plus every history amount.
    pub fn total_paid(&self) -> Money {
        self.payment_entry + self.payment_history.iter().map(|p| p.amount).sum::<Money>()
    }

    /// What the client still owes on this order, never negative.
    pub fn outstanding(&self) -> Money {
        (self.final_price - self.total_paid()).non_negative()
    }

    /// Cancelled and deleted orders never contribute debt.
    pub fn counts_for_debt(&self) -> bool {
        !self.is_deleted && self.status != OrderStatus::Cancelled
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Client {
    pub id: String,
    pub kind: ClientKind,
    pub name: String,
    /// Cached result of the debt aggregation.
    pub total_debt: Money,
    #[ts(as = "Option<String>")]
    pub debt_updated_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Listing
// =============================================================================

/// 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub page: u32,
    pub limit: u32,
}

impl Page {
    pub fn new(page: u32, limit: u32) -> Self {
        Page { page, limit }
    }

    /// Clamps page to >= 1 and limit to 1..=MAX_PAGE_SIZE.
    pub fn normalized(self) -> Self {
        Page {
            page: self.page.max(1),
            limit: self.limit.clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn offset(&self) -> i64 {
        let p = self.normalized();
        i64::from(p.page - 1) * i64::from(p.limit)
    }
}

impl Default for Page {
    fn default() -> Self {
        Page {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

/// A page of results plus the total matching count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
}

impl<T> Paginated<T> {
    pub fn total_pages(&self) -> i64 {
        if self.limit == 0 {
            return 0;
        }
        let limit = i64::from(self.limit);
        (self.total + limit - 1) / limit
    }
}

/// Filters for listing payments. Unset fields don't constrain.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentFilter {
    pub payment_type: Option<PaymentType>,
    pub method: Option<PaymentMethod>,
    pub status: Option<PaymentStatus>,
    pub cash_register_id: Option<String>,
    /// Inclusive lower bound on the payment date.
    pub from: Option<DateTime<Utc>>,
    /// Exclusive upper bound on the payment date.
    pub to: Option<DateTime<Utc>>,
    pub customer_id: Option<String>,
    pub compensation_status: Option<CompensationStatus>,
}

/// Filters for listing register sessions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterFilter {
    pub status: Option<RegisterStatus>,
    /// Inclusive lower bound on `opened_at`.
    pub from: Option<DateTime<Utc>>,
    /// Exclusive upper bound on `opened_at`.
    pub to: Option<DateTime<Utc>>,
}

// =============================================================================
// Unit Tests
// =============================================================================
