use std::{
    fmt::{Debug, Display},
    iter::Sum,
    str::FromStr,
};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

const DECIMALS: u32 = 2;
const SCALE: i64 = 10i64.pow(DECIMALS);

/// Fixed-point currency value with two fractional digits, stored as a raw i64.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Decimal(i64);

impl Decimal {
    pub fn int(value: i64) -> Decimal {
        Decimal(value * SCALE)
    }

    pub fn zero() -> Decimal {
        Decimal(0)
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn inner(&self) -> i64 {
        self.0
    }

    pub fn min(self, other: Decimal) -> Decimal {
        Decimal(self.0.min(other.0))
    }

    /// `self * numerator / denominator` computed in i128, so a near-one
    /// ratio keeps full cent precision.
    pub fn mul_div(self, numerator: Decimal, denominator: Decimal) -> Decimal {
        let value = (self.0 as i128 * numerator.0 as i128) / denominator.0 as i128;
        Decimal(value as i64)
    }

    pub fn max(self, other: Decimal) -> Decimal {
        Decimal(self.0.max(other.0))
    }
}

impl Debug for Decimal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let value = self.0 as f64 / SCALE as f64;
        write!(f, "{:.2}", value)
    }
}

impl Display for Decimal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let value = self.0 as f64 / SCALE as f64;
        write!(f, "{:.2}", value)
    }
}

impl From<f64> for Decimal {
    fn from(value: f64) -> Self {
        Decimal((value * SCALE as f64) as i64)
    }
}

impl From<u32> for Decimal {
    fn from(value: u32) -> Self {
        Decimal::int(value as i64)
    }
}

impl TryFrom<&str> for Decimal {
    type Error = ParseDecimalError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let val = value.parse::<f64>().map_err(|_| ParseDecimalError)?;
        Ok(Decimal((val * SCALE as f64) as i64))
    }
}

impl FromStr for Decimal {
    type Err = ParseDecimalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::try_from(s)
    }
}

impl std::ops::Add for Decimal {
    type Output = Decimal;

    fn add(self, other: Decimal) -> Decimal {
        Decimal(self.0 + other.0)
    }
}

impl std::ops::Sub for Decimal {
    type Output = Decimal;

    fn sub(self, other: Decimal) -> Decimal {
        Decimal(self.0 - other.0)
    }
}

impl std::ops::Mul for Decimal {
    type Output = Decimal;

    fn mul(self, other: Decimal) -> Decimal {
        Decimal((self.0 * other.0) / SCALE)
    }
}

impl std::ops::Div for Decimal {
    type Output = Decimal;

    fn div(self, other: Decimal) -> Decimal {
        Decimal((self.0 * SCALE) / other.0)
    }
}

impl std::ops::AddAssign for Decimal {
    fn add_assign(&mut self, other: Decimal) {
        self.0 += other.0;
    }
}

impl std::ops::SubAssign for Decimal {
    fn sub_assign(&mut self, other: Decimal) {
        self.0 -= other.0;
    }
}

impl Sum for Decimal {
    fn sum<I: Iterator<Item = Decimal>>(iter: I) -> Decimal {
        iter.fold(Decimal::zero(), |acc, x| acc + x)
    }
}

#[derive(Debug)]
pub struct ParseDecimalError;

impl std::fmt::Display for ParseDecimalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Failed to parse decimal value")
    }
}

impl std::error::Error for ParseDecimalError {}

impl Serialize for Decimal {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i64(self.0)
    }
}

impl<'de> Deserialize<'de> for Decimal {
    fn deserialize<D>(deserializer: D) -> Result<Decimal, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = i64::deserialize(deserializer)?;
        Ok(Decimal(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!("123456.00", format!("{}", Decimal::int(123456)));
        assert_eq!("-123456.00", format!("{}", Decimal::int(-123456)));
        assert_eq!("0.00", format!("{}", Decimal::zero()));
        assert_eq!("0.05", format!("{}", Decimal::from(0.05)));
    }

    #[test]
    fn test_rate_math() {
        let revenue = Decimal::int(12_000_000);
        let rate = Decimal::from(0.05);
        assert_eq!(Decimal::int(600_000), revenue * rate);
    }

    #[test]
    fn test_div() {
        let cap = Decimal::int(100);
        let total = Decimal::int(400);
        assert_eq!(Decimal::from(0.25), cap / total);
    }

    #[test]
    fn test_parse() {
        assert_eq!(Decimal::int(42), "42".parse().unwrap());
        assert_eq!(Decimal::from(0.8), "0.8".parse().unwrap());
        assert!("not a number".parse::<Decimal>().is_err());
    }

    #[test]
    fn test_mul_div() {
        let value = Decimal::int(1_300_000);
        let cap = Decimal::int(5_000_000);
        let total = Decimal::int(13_000_000);
        assert_eq!(Decimal::int(500_000), value.mul_div(cap, total));
    }

    #[test]
    fn test_sum_min_max() {
        let total: Decimal = [Decimal::int(1), Decimal::int(2), Decimal::int(3)]
            .into_iter()
            .sum();
        assert_eq!(Decimal::int(6), total);
        assert_eq!(Decimal::int(1), Decimal::int(1).min(Decimal::int(2)));
        assert_eq!(Decimal::int(2), Decimal::int(1).max(Decimal::int(2)));
    }
}
