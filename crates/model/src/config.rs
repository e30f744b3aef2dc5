use std::env;
use std::str::FromStr;

use eyre::{bail, Context as _, Result};
use serde::{Deserialize, Serialize};

use crate::decimal::Decimal;

/// A revenue bracket with its own bonus rate, applied progressively to the
/// portion of total qualifying revenue falling inside the bracket.
#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
pub struct RevenueTier {
    pub min_revenue: Decimal,
    pub max_revenue: Decimal,
    pub rate: Decimal,
}

/// Base salary amounts by tenure tier, lowest first.
#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
pub struct BaseSalaryTable {
    pub tier_1: Decimal,
    pub tier_2: Decimal,
    pub tier_3: Decimal,
    pub tier_4: Decimal,
}

impl BaseSalaryTable {
    pub fn for_tenure(&self, years: i32) -> Decimal {
        match years {
            y if y >= 5 => self.tier_4,
            y if y >= 3 => self.tier_3,
            y if y >= 1 => self.tier_2,
            _ => self.tier_1,
        }
    }
}

/// Commission settings, loaded once at process start and read-only after.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CommissionConfig {
    pub package_rate: Decimal,
    pub class_rate: Decimal,
    pub personal_rate: Decimal,
    pub performance_rate: Decimal,
    pub attendance_rate: Decimal,
    /// Minimum active-student count for the performance bonus.
    pub min_students: u32,
    /// Minimum held/expected session ratio for the attendance bonus.
    pub min_attendance: Decimal,
    /// Maximum total commission payable to one trainer in one period.
    pub monthly_cap: Decimal,
    /// Ordered ascending by `min_revenue`.
    pub tiers: Vec<RevenueTier>,
    pub base_salaries: BaseSalaryTable,
}

impl CommissionConfig {
    pub fn from_env() -> Result<CommissionConfig> {
        let defaults = CommissionConfig::default();
        let config = CommissionConfig {
            package_rate: env_or("PAYROLL_PACKAGE_RATE", defaults.package_rate)?,
            class_rate: env_or("PAYROLL_CLASS_RATE", defaults.class_rate)?,
            personal_rate: env_or("PAYROLL_PERSONAL_RATE", defaults.personal_rate)?,
            performance_rate: env_or("PAYROLL_PERFORMANCE_RATE", defaults.performance_rate)?,
            attendance_rate: env_or("PAYROLL_ATTENDANCE_RATE", defaults.attendance_rate)?,
            min_students: env_or("PAYROLL_MIN_STUDENTS", defaults.min_students)?,
            min_attendance: env_or("PAYROLL_MIN_ATTENDANCE", defaults.min_attendance)?,
            monthly_cap: env_or("PAYROLL_MONTHLY_CAP", defaults.monthly_cap)?,
            tiers: defaults.tiers,
            base_salaries: defaults.base_salaries,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.monthly_cap.is_negative() || self.monthly_cap.is_zero() {
            bail!("Monthly cap must be positive: {}", self.monthly_cap);
        }
        for rate in [
            self.package_rate,
            self.class_rate,
            self.personal_rate,
            self.performance_rate,
            self.attendance_rate,
            self.min_attendance,
        ] {
            if rate.is_negative() {
                bail!("Rates must be non-negative: {}", rate);
            }
        }
        let mut last_min = None;
        for tier in &self.tiers {
            if tier.max_revenue <= tier.min_revenue {
                bail!(
                    "Empty revenue tier: {}..{}",
                    tier.min_revenue,
                    tier.max_revenue
                );
            }
            if let Some(last_min) = last_min {
                if tier.min_revenue <= last_min {
                    bail!("Revenue tiers must be ordered by min revenue");
                }
            }
            last_min = Some(tier.min_revenue);
        }
        Ok(())
    }
}

impl Default for CommissionConfig {
    fn default() -> Self {
        CommissionConfig {
            package_rate: Decimal::from(0.05),
            class_rate: Decimal::from(0.10),
            personal_rate: Decimal::from(0.20),
            performance_rate: Decimal::from(0.03),
            attendance_rate: Decimal::from(0.02),
            min_students: 10,
            min_attendance: Decimal::from(0.8),
            monthly_cap: Decimal::int(5_000_000),
            tiers: vec![
                RevenueTier {
                    min_revenue: Decimal::int(10_000_000),
                    max_revenue: Decimal::int(30_000_000),
                    rate: Decimal::from(0.06),
                },
                RevenueTier {
                    min_revenue: Decimal::int(30_000_000),
                    max_revenue: Decimal::int(60_000_000),
                    rate: Decimal::from(0.07),
                },
                RevenueTier {
                    min_revenue: Decimal::int(60_000_000),
                    max_revenue: Decimal::int(1_000_000_000),
                    rate: Decimal::from(0.08),
                },
            ],
            base_salaries: BaseSalaryTable {
                tier_1: Decimal::int(2_500_000),
                tier_2: Decimal::int(3_000_000),
                tier_3: Decimal::int(3_500_000),
                tier_4: Decimal::int(4_200_000),
            },
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(value) => value
            .parse()
            .with_context(|| format!("Failed to parse {}", name)),
        Err(_) => Ok(default),
    }
}
