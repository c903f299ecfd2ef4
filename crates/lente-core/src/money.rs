//! # Money Module
//!
//! Provides the `Money` type: a signed count of centavos.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  REGISTER CLOSING WITH FLOATS                                           │
//! │                                                                         │
//! │    opening 100.10 + sales 0.20 = 100.30000000000001                     │
//! │    counted 100.30 → variance -0.00000000000001  ❌ phantom variance     │
//! │                                                                         │
//! │  WITH CENTAVOS                                                          │
//! │    10010 + 20 = 10030, counted 10030 → variance 0                       │
//! │                                                                         │
//! │  Installments: R$ 100,00 in 3 → 33,33 + 33,33 + 33,34                  │
//! │    the leftover centavo is placed explicitly on the last installment   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use lente_core::money::Money;
//!
//! let entry = Money::from_cents(5_000);          // R$ 50,00
//! let rest = Money::from_reais_centavos(99, 90); // R$ 99,90
//! assert_eq!((entry + rest).cents(), 14_990);
//! assert_eq!(Money::parse_decimal("149.90"), Some(Money::from_cents(14_990)));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in centavos.
///
/// ## Where Money Flows
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  PaymentTransaction.amount ──┬──► SalesTotals.<method> / .total         │
/// │                              ├──► MovementTotals.received / .made       │
/// │                              └──► OrderPayment.amount ──► ClientDebt    │
/// │                                                                         │
/// │  Gateway wire amounts (150.5) are converted at the adapter boundary     │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from centavos.
    ///
    /// ## Example
    /// ```rust
    /// use lente_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // R$ 10,99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from reais and centavos.
    ///
    /// For negative amounts only `reais` carries the sign:
    /// `from_reais_centavos(-5, 50)` is -R$ 5,50.
    #[inline]
    pub const fn from_reais_centavos(reais: i64, centavos: i64) -> Self {
        if reais < 0 {
            Money(reais * 100 - centavos)
        } else {
            Money(reais * 100 + centavos)
        }
    }

    /// Parses a decimal string with at most two fractional digits.
    ///
    /// Accepts `.` as the decimal separator (`"150"`, `"150.5"`, `"-3.25"`).
    /// Returns `None` for anything else, including a third decimal place.
    ///
    /// ## Example
    /// ```rust
    /// use lente_core::money::Money;
    ///
    /// assert_eq!(Money::parse_decimal("150.5"), Some(Money::from_cents(15_050)));
    /// assert_eq!(Money::parse_decimal("1.005"), None);
    /// assert_eq!(Money::parse_decimal("abc"), None);
    /// ```
    pub fn parse_decimal(input: &str) -> Option<Money> {
        let input = input.trim();
        let (negative, digits) = match input.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, input),
        };

        let (whole, fraction) = match digits.split_once('.') {
            Some((w, f)) => (w, f),
            None => (digits, ""),
        };

        if whole.is_empty() || fraction.len() > 2 {
            return None;
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit())
        {
            return None;
        }

        let reais: i64 = whole.parse().ok()?;
        let centavos: i64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().ok()? * 10,
            _ => fraction.parse().ok()?,
        };

        let cents = reais.checked_mul(100)?.checked_add(centavos)?;
        Some(Money(if negative { -cents } else { cents }))
    }

    /// Returns the value in centavos.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the whole reais portion (truncated toward zero).
    #[inline]
    pub const fn reais(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the centavos portion (always 0-99).
    #[inline]
    pub const fn centavos_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Clamps negative values to zero.
    ///
    /// Used by debt math: an over-paid order owes nothing, it never owes a
    /// negative amount.
    #[inline]
    pub const fn non_negative(&self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            *self
        }
    }

    /// Splits the amount into `parts` installments.
    ///
    /// Every installment gets the truncated share; the remainder lands on
    /// the last one so the parts always sum back to the original amount.
    ///
    /// ## Example
    /// ```rust
    /// use lente_core::money::Money;
    ///
    /// let parts = Money::from_cents(10_000).split(3);
    /// assert_eq!(parts, vec![
    ///     Money::from_cents(3_333),
    ///     Money::from_cents(3_333),
    ///     Money::from_cents(3_334),
    /// ]);
    /// ```
    pub fn split(&self, parts: u32) -> Vec<Money> {
        if parts == 0 {
            return Vec::new();
        }

        let n = i64::from(parts);
        let share = self.0 / n;
        let remainder = self.0 - share * n;

        let mut result = vec![Money(share); parts as usize];
        if let Some(last) = result.last_mut() {
            last.0 += remainder;
        }
        result
    }

    /// Formats the amount as a plain decimal string (`"150.50"`).
    pub fn to_decimal_string(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        format!("{}{}.{:02}", sign, self.reais().abs(), self.centavos_part())
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Brazilian real formatting: `R$ 1.234,56`, `-R$ 5,50`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let digits = self.reais().abs().to_string();

        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(ch);
        }

        write!(f, "{}R$ {},{:02}", sign, grouped, self.centavos_part())
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + *m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
