//! # Money Module
//!
//! Provides the `Money` type for prices, costs and ledger values.
//!
//! ## Why Decimal Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  Weighted-average costing divides on every receipt:                    │
//! │    (100 × 10.50 + 450) / 150 must be exactly 10.00                     │
//! │                                                                         │
//! │  OUR SOLUTION: base-10 Decimal, full precision internally,             │
//! │  rounded to cents only at presentation time                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use bakery_core::money::Money;
//! use rust_decimal::Decimal;
//!
//! let price = Money::new(1050, 2); // 10.50
//! let total = price.times(Decimal::from(3));
//! assert_eq!(total, Money::new(3150, 2));
//! ```

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary amount in the single system currency.
///
/// ## Design Decisions
/// - **Decimal**: exact arithmetic; average costs keep full precision
/// - **Signed**: profit can be negative
/// - **Serialized as string**: no precision loss across the API boundary
///
/// ## Where Money is Used
/// ```text
/// Purchase.price_per_unit ──► Stock.avg_cost ──► ProductionUsage.total_cost
///                                                        │
/// Product tier price ──► OrderItem.unit_price ──► Order.total_price
///                                                        │
///                                      Order.profit = total_price - cost_of_goods
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Money(#[ts(type = "string")] Decimal);

impl Money {
    /// Creates a Money value from a mantissa and a scale.
    ///
    /// ## Example
    /// ```rust
    /// use bakery_core::money::Money;
    ///
    /// let price = Money::new(1099, 2); // 10.99
    /// assert_eq!(price.to_string(), "10.99");
    /// ```
    #[inline]
    pub fn new(num: i64, scale: u32) -> Self {
        Money(Decimal::new(num, scale))
    }

    /// Creates a Money value from whole currency units.
    #[inline]
    pub fn from_units(units: i64) -> Self {
        Money(Decimal::from(units))
    }

    /// Wraps a decimal amount.
    #[inline]
    pub const fn from_decimal(amount: Decimal) -> Self {
        Money(amount)
    }

    /// Returns the underlying decimal amount (full precision).
    #[inline]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    /// Checks if the value is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Returns the absolute value.
    #[inline]
    pub fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Multiplies a per-unit amount by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use bakery_core::money::Money;
    /// use rust_decimal::Decimal;
    ///
    /// let avg_cost = Money::from_units(10);
    /// let consumed = Decimal::new(12, 0); // 12 kg
    /// assert_eq!(avg_cost.times(consumed), Money::from_units(120));
    /// ```
    #[inline]
    pub fn times(&self, qty: Decimal) -> Self {
        Money(self.0 * qty)
    }

    /// Like [`Money::times`], but `None` when the product overflows.
    #[inline]
    pub fn checked_times(&self, qty: Decimal) -> Option<Self> {
        self.0.checked_mul(qty).map(Money)
    }

    /// Adds two amounts, `None` on overflow.
    #[inline]
    pub fn checked_add(&self, other: Money) -> Option<Self> {
        self.0.checked_add(other.0).map(Money)
    }

    /// Divides an amount by a quantity, giving a per-unit amount.
    ///
    /// Returns `None` when `qty` is zero.
    pub fn per(&self, qty: Decimal) -> Option<Self> {
        self.0.checked_div(qty).map(Money)
    }

    /// Applies a percentage markup: `self * (1 + percent / 100)`.
    ///
    /// ## Example
    /// ```rust
    /// use bakery_core::money::Money;
    /// use rust_decimal::Decimal;
    ///
    /// let base = Money::from_units(100);
    /// assert_eq!(base.with_markup(Decimal::from(40)), Money::from_units(140));
    /// ```
    pub fn with_markup(&self, percent: Decimal) -> Self {
        Money(self.0 * (Decimal::ONE + percent / Decimal::ONE_HUNDRED))
    }

    /// Rounds to cents using Bankers Rounding (round half to even).
    ///
    /// ## Bankers Rounding Explained
    /// ```text
    /// ┌─────────────────────────────────────────────────────────────────────┐
    /// │  Standard rounding always rounds 0.5 UP, causing systematic bias.  │
    /// │  Bankers Rounding rounds 0.5 to nearest EVEN number:               │
    /// │    0.125 → 0.12, 0.135 → 0.14                                       │
    /// └─────────────────────────────────────────────────────────────────────┘
    /// ```
    pub fn round_cents(&self) -> Self {
        Money(
            self.0
                .round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven),
        )
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Shows the amount rounded to cents, always with two decimals.
///
/// ## Note
/// This is for logs and reports. Ledger values keep full precision.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut rounded = self.round_cents().0;
        rounded.rescale(2);
        f.pad(&rounded.to_string())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Money(amount)
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

// =============================================================================
// Unit Tests
// =============================================================================
