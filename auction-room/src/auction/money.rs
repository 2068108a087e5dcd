// Fixed-point crore amounts for bids, budgets and prices.

use std::fmt;

use derive_more::{Add, AddAssign, Sub, SubAssign, Sum};
use serde::{Deserialize, Serialize};

/// Hundredths per crore. `Crores(225)` is 2.25 Cr.
pub const CRORE_SCALE: i64 = 100;

/// A monetary amount in crores, stored as hundredths so that bid increments
/// such as 0.25 compare exactly.
///
/// On the wire it is a plain JSON number (`2.25`).
#[derive(
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Add,
    Sub,
    AddAssign,
    SubAssign,
    Sum,
    Serialize,
    Deserialize,
)]
#[serde(from = "f64", into = "f64")]
pub struct Crores(i64);

impl Crores {
    pub const ZERO: Crores = Crores(0);

    /// Build an amount from a raw hundredths count.
    #[inline]
    pub const fn from_hundredths(hundredths: i64) -> Self {
        Crores(hundredths)
    }

    /// Build an amount from a decimal value, rounding to the nearest hundredth.
    #[inline]
    pub fn from_f64(value: f64) -> Self {
        Crores((value * CRORE_SCALE as f64).round() as i64)
    }

    #[inline]
    pub fn hundredths(self) -> i64 {
        self.0
    }

    #[inline]
    pub fn to_f64(self) -> f64 {
        self.0 as f64 / CRORE_SCALE as f64
    }

    #[inline]
    pub fn is_positive(self) -> bool {
        self.0 > 0
    }
}

impl From<f64> for Crores {
    fn from(value: f64) -> Self {
        Crores::from_f64(value)
    }
}

impl From<Crores> for f64 {
    fn from(value: Crores) -> Self {
        value.to_f64()
    }
}

impl fmt::Debug for Crores {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cr({self})")
    }
}

impl fmt::Display for Crores {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let scale = CRORE_SCALE as u64;
        write!(f, "{sign}{}.{:02}", abs / scale, abs % scale)
    }
}
