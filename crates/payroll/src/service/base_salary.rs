use chrono::{DateTime, Utc};
use model::{config::BaseSalaryTable, decimal::Decimal, trainer::Trainer};

/// Maps trainer tenure to a base-salary tier. A missing trainer record gets
/// the lowest tier instead of failing the batch.
pub fn resolve(trainer: Option<&Trainer>, now: DateTime<Utc>, table: &BaseSalaryTable) -> Decimal {
    match trainer {
        Some(trainer) => table.for_tenure(trainer.tenure_years(now)),
        None => table.tier_1,
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone as _;
    use model::config::CommissionConfig;
    use mongodb::bson::oid::ObjectId;

    use super::*;

    fn trainer(joined_year: i32) -> Trainer {
        Trainer {
            id: ObjectId::new(),
            name: "Boris".to_string(),
            email: "boris@example.com".to_string(),
            joined_at: Utc.with_ymd_and_hms(joined_year, 3, 1, 0, 0, 0).unwrap(),
            is_active: true,
            weekly_slots: vec![],
        }
    }

    #[test]
    fn test_tenure_tiers() {
        let table = CommissionConfig::default().base_salaries;
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();

        assert_eq!(table.tier_1, resolve(Some(&trainer(2024)), now, &table));
        assert_eq!(table.tier_2, resolve(Some(&trainer(2023)), now, &table));
        assert_eq!(table.tier_2, resolve(Some(&trainer(2022)), now, &table));
        assert_eq!(table.tier_3, resolve(Some(&trainer(2021)), now, &table));
        assert_eq!(table.tier_4, resolve(Some(&trainer(2019)), now, &table));
    }

    #[test]
    fn test_missing_trainer_gets_lowest_tier() {
        let table = CommissionConfig::default().base_salaries;
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        assert_eq!(table.tier_1, resolve(None, now, &table));
    }
}
