//! Loyalty points amount type.

use serde::{Deserialize, Serialize};

/// A quantity of loyalty points.
///
/// Backed by an `i64` so ledger balances and deltas share one type; order
/// totals and transaction amounts are always positive, which callers enforce
/// at construction sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Points(i64);

impl Points {
    /// Creates a points amount from a raw value.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns zero points.
    pub fn zero() -> Self {
        Self(0)
    }

    /// Returns the raw point value.
    pub fn value(&self) -> i64 {
        self.0
    }

    /// Returns true if the amount is strictly positive.
    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Multiplies by a quantity.
    pub fn multiply(&self, quantity: u32) -> Points {
        Points(self.0 * i64::from(quantity))
    }
}

impl Default for Points {
    fn default() -> Self {
        Self::zero()
    }
}

impl std::fmt::Display for Points {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} pts", self.0)
    }
}

impl std::ops::Add for Points {
    type Output = Points;

    fn add(self, rhs: Self) -> Self::Output {
        Points(self.0 + rhs.0)
    }
}

impl std::ops::Sub for Points {
    type Output = Points;

    fn sub(self, rhs: Self) -> Self::Output {
        Points(self.0 - rhs.0)
    }
}

impl std::ops::AddAssign for Points {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl std::ops::SubAssign for Points {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction() {
        let p = Points::new(500);
        assert_eq!(p.value(), 500);
        assert!(p.is_positive());
        assert!(Points::zero().is_zero());
        assert_eq!(Points::default(), Points::zero());
    }

    #[test]
    fn test_arithmetic() {
        let a = Points::new(1000);
        let b = Points::new(250);

        assert_eq!((a + b).value(), 1250);
        assert_eq!((a - b).value(), 750);
        assert_eq!(b.multiply(4).value(), 1000);
    }

    #[test]
    fn test_assign_ops() {
        let mut p = Points::new(100);
        p += Points::new(50);
        assert_eq!(p.value(), 150);
        p -= Points::new(25);
        assert_eq!(p.value(), 125);
    }

    #[test]
    fn test_display() {
        assert_eq!(Points::new(1500).to_string(), "1500 pts");
    }

    #[test]
    fn test_ordering() {
        assert!(Points::new(100) < Points::new(200));
    }

    #[test]
    fn test_serde_transparent() {
        let json = serde_json::to_string(&Points::new(750)).unwrap();
        assert_eq!(json, "750");
    }
}
