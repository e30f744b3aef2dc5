use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use eyre::Result;
use model::{
    config::CommissionConfig,
    decimal::Decimal,
    period::Period,
    salary::CommissionBreakdown,
    session::Session,
    trainer::Trainer,
};
use mongodb::bson::oid::ObjectId;
use storage::{
    booking::BookingStore,
    enrollment::EnrollmentStore,
    gym_class::GymClassStore,
    sales::{ClassSaleStore, PackageSaleStore},
};

/// Per-trainer revenue totals for one period. Absent data shows up as
/// zeroes, never as an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RevenueSummary {
    pub package_revenue: Decimal,
    pub class_revenue: Decimal,
    pub personal_revenue: Decimal,
    pub active_students: u32,
    pub expected_sessions: u32,
    pub held_sessions: u32,
}

impl RevenueSummary {
    /// Revenue that counts towards the performance/attendance bonuses and
    /// the tier table.
    pub fn qualifying_revenue(&self) -> Decimal {
        self.package_revenue + self.class_revenue
    }
}

#[derive(Clone)]
pub struct Commission {
    packages: PackageSaleStore,
    classes: ClassSaleStore,
    enrollments: EnrollmentStore,
    bookings: BookingStore,
    gym_classes: GymClassStore,
    config: Arc<CommissionConfig>,
}

impl Commission {
    pub(crate) fn new(
        packages: PackageSaleStore,
        classes: ClassSaleStore,
        enrollments: EnrollmentStore,
        bookings: BookingStore,
        gym_classes: GymClassStore,
        config: Arc<CommissionConfig>,
    ) -> Self {
        Commission {
            packages,
            classes,
            enrollments,
            bookings,
            gym_classes,
            config,
        }
    }

    pub async fn compute(
        &self,
        session: &mut Session,
        trainer: &Trainer,
        period: Period,
    ) -> Result<CommissionBreakdown> {
        let summary = self.summarize(session, trainer, period).await?;
        Ok(breakdown(&summary, &self.config))
    }

    /// Read-only aggregation of the trainer's qualifying revenue sources.
    pub async fn summarize(
        &self,
        session: &mut Session,
        trainer: &Trainer,
        period: Period,
    ) -> Result<RevenueSummary> {
        let (from, to) = period.range()?;

        // Package sales are attributed to the trainer through the buyer's
        // enrollment in one of the trainer's classes.
        let enrollments = self
            .enrollments
            .overlapping(session, trainer.id, from, to)
            .await?;
        let students: HashSet<ObjectId> = enrollments
            .iter()
            .map(|enrollment| enrollment.student)
            .collect();

        let package_revenue = self
            .packages
            .paid_in_range(session, from, to)
            .await?
            .iter()
            .filter(|sale| students.contains(&sale.buyer))
            .map(|sale| sale.amount)
            .sum();

        let class_revenue = self
            .classes
            .standalone_by_trainer(session, trainer.id, from, to)
            .await?
            .iter()
            .map(|sale| sale.amount)
            .sum();

        let personal_classes: Vec<ObjectId> = self
            .gym_classes
            .by_trainer(session, trainer.id)
            .await?
            .iter()
            .filter(|class| class.is_personal())
            .map(|class| class.id)
            .collect();

        let bookings = self
            .bookings
            .confirmed_by_trainer(session, trainer.id, from, to)
            .await?;

        let mut personal_revenue = Decimal::zero();
        if !personal_classes.is_empty() {
            personal_revenue = self
                .classes
                .paid_by_classes(session, &personal_classes, from, to)
                .await?
                .iter()
                .map(|sale| sale.amount)
                .sum();
            let personal_ids: HashSet<ObjectId> = personal_classes.iter().copied().collect();
            personal_revenue += bookings
                .iter()
                .filter(|booking| personal_ids.contains(&booking.class_id))
                .map(|booking| booking.price)
                .sum();
        }

        let expected_sessions = trainer
            .weekly_slots
            .iter()
            .map(|slot| period.weekday_count(slot.weekday))
            .sum();
        let held_slots: HashSet<(ObjectId, DateTime<Utc>)> = bookings
            .iter()
            .map(|booking| (booking.class_id, booking.start_at))
            .collect();

        Ok(RevenueSummary {
            package_revenue,
            class_revenue,
            personal_revenue,
            active_students: students.len() as u32,
            expected_sessions,
            held_sessions: held_slots.len() as u32,
        })
    }
}

/// Turns revenue totals into the final capped breakdown. Pure: for fixed
/// inputs and configuration the result is reproducible bit-for-bit.
pub fn breakdown(summary: &RevenueSummary, config: &CommissionConfig) -> CommissionBreakdown {
    let mut result = CommissionBreakdown {
        package: summary.package_revenue * config.package_rate,
        class: summary.class_revenue * config.class_rate,
        personal: summary.personal_revenue * config.personal_rate,
        performance: Decimal::zero(),
        attendance: Decimal::zero(),
    };

    let qualifying = summary.qualifying_revenue();
    if summary.active_students >= config.min_students {
        result.performance = qualifying * config.performance_rate;
    }
    if summary.expected_sessions > 0 {
        let ratio = Decimal::int(summary.held_sessions as i64)
            / Decimal::int(summary.expected_sessions as i64);
        if ratio >= config.min_attendance {
            result.attendance = qualifying * config.attendance_rate;
        }
    }

    result.clamp(config.monthly_cap);
    result.performance += tier_bonus(qualifying, config);
    result.clamp(config.monthly_cap);
    result.normalize(config.monthly_cap);
    result
}

/// Progressive bonus over the configured revenue tiers. Each tier pays
/// `(tier rate - base package rate)` on the slice of revenue inside it.
fn tier_bonus(revenue: Decimal, config: &CommissionConfig) -> Decimal {
    let mut bonus = Decimal::zero();
    for tier in &config.tiers {
        if revenue <= tier.min_revenue {
            break;
        }
        let portion = revenue.min(tier.max_revenue) - tier.min_revenue;
        bonus += portion * (tier.rate - config.package_rate);
    }
    bonus
}

#[cfg(test)]
mod tests {
    use model::config::RevenueTier;
    use proptest::prelude::*;

    use super::*;

    fn flat_config() -> CommissionConfig {
        CommissionConfig {
            tiers: vec![],
            ..CommissionConfig::default()
        }
    }

    #[test]
    fn test_package_only_scenario() {
        // 12,000,000 of package revenue at 5%, student count below the
        // bonus threshold, no tiers: commission is exactly 600,000.
        let config = flat_config();
        let summary = RevenueSummary {
            package_revenue: Decimal::int(12_000_000),
            active_students: config.min_students - 1,
            ..RevenueSummary::default()
        };

        let result = breakdown(&summary, &config);
        assert_eq!(Decimal::int(600_000), result.package);
        assert_eq!(Decimal::int(600_000), result.total());
    }

    #[test]
    fn test_performance_gate() {
        let config = flat_config();
        let mut summary = RevenueSummary {
            package_revenue: Decimal::int(1_000_000),
            active_students: config.min_students,
            ..RevenueSummary::default()
        };

        let with_bonus = breakdown(&summary, &config);
        assert_eq!(
            Decimal::int(1_000_000) * config.performance_rate,
            with_bonus.performance
        );

        summary.active_students = config.min_students - 1;
        let without_bonus = breakdown(&summary, &config);
        assert!(without_bonus.performance.is_zero());
    }

    #[test]
    fn test_attendance_gate() {
        let config = flat_config();
        let mut summary = RevenueSummary {
            class_revenue: Decimal::int(2_000_000),
            expected_sessions: 10,
            held_sessions: 8,
            ..RevenueSummary::default()
        };

        let with_bonus = breakdown(&summary, &config);
        assert_eq!(
            Decimal::int(2_000_000) * config.attendance_rate,
            with_bonus.attendance
        );

        summary.held_sessions = 7;
        let without_bonus = breakdown(&summary, &config);
        assert!(without_bonus.attendance.is_zero());
    }

    #[test]
    fn test_no_schedule_means_no_attendance_bonus() {
        let config = flat_config();
        let summary = RevenueSummary {
            class_revenue: Decimal::int(2_000_000),
            expected_sessions: 0,
            held_sessions: 0,
            ..RevenueSummary::default()
        };
        assert!(breakdown(&summary, &config).attendance.is_zero());
    }

    #[test]
    fn test_tier_bonus_is_progressive() {
        let config = CommissionConfig::default();
        // 12M of revenue crosses into the first tier (10M..30M at 6%):
        // bonus = 2M * (6% - 5%) = 20,000 on top of the performance slot.
        let revenue = Decimal::int(12_000_000);
        assert_eq!(Decimal::int(20_000), tier_bonus(revenue, &config));

        // 35M spans two tiers: 20M * 1% + 5M * 2% = 300,000.
        let revenue = Decimal::int(35_000_000);
        assert_eq!(Decimal::int(300_000), tier_bonus(revenue, &config));

        // Below the first tier there is no bonus.
        assert!(tier_bonus(Decimal::int(9_000_000), &config).is_zero());
    }

    #[test]
    fn test_cap_applies_to_breakdown_total() {
        let mut config = flat_config();
        config.monthly_cap = Decimal::int(500_000);
        let summary = RevenueSummary {
            package_revenue: Decimal::int(50_000_000),
            class_revenue: Decimal::int(50_000_000),
            active_students: config.min_students,
            expected_sessions: 10,
            held_sessions: 10,
            ..RevenueSummary::default()
        };

        let result = breakdown(&summary, &config);
        assert_eq!(config.monthly_cap, result.total());
    }

    proptest! {
        #[test]
        fn prop_tier_bonus_is_monotonic(low in 0i64..200_000_000, delta in 0i64..200_000_000) {
            let config = CommissionConfig::default();
            let smaller = tier_bonus(Decimal::int(low), &config);
            let larger = tier_bonus(Decimal::int(low + delta), &config);
            prop_assert!(larger >= smaller);
        }

        #[test]
        fn prop_breakdown_never_exceeds_cap(
            package in 0i64..100_000_000,
            class in 0i64..100_000_000,
            personal in 0i64..100_000_000,
            students in 0u32..50,
            held in 0u32..30,
        ) {
            let config = CommissionConfig::default();
            let summary = RevenueSummary {
                package_revenue: Decimal::int(package),
                class_revenue: Decimal::int(class),
                personal_revenue: Decimal::int(personal),
                active_students: students,
                expected_sessions: 20,
                held_sessions: held,
            };
            let result = breakdown(&summary, &config);
            prop_assert!(result.total() <= config.monthly_cap);
            prop_assert!(!result.package.is_negative());
            prop_assert!(!result.class.is_negative());
            prop_assert!(!result.personal.is_negative());
            prop_assert!(!result.performance.is_negative());
            prop_assert!(!result.attendance.is_negative());
        }
    }

    #[test]
    fn test_negative_revenue_is_clamped() {
        // Adversarial upstream data: refunds can push revenue negative.
        let config = flat_config();
        let summary = RevenueSummary {
            package_revenue: Decimal::int(-3_000_000),
            class_revenue: Decimal::int(1_000_000),
            ..RevenueSummary::default()
        };
        let result = breakdown(&summary, &config);
        assert!(result.package.is_zero());
        assert!(!result.total().is_negative());
    }

    #[test]
    fn test_tier_walk_stops_at_revenue() {
        let config = CommissionConfig {
            tiers: vec![
                RevenueTier {
                    min_revenue: Decimal::int(1_000_000),
                    max_revenue: Decimal::int(2_000_000),
                    rate: Decimal::from(0.06),
                },
                RevenueTier {
                    min_revenue: Decimal::int(2_000_000),
                    max_revenue: Decimal::int(3_000_000),
                    rate: Decimal::from(0.07),
                },
            ],
            ..CommissionConfig::default()
        };
        // Revenue inside the first tier never touches the second.
        let bonus = tier_bonus(Decimal::int(1_500_000), &config);
        assert_eq!(Decimal::int(500_000) * Decimal::from(0.01), bonus);
    }
}
