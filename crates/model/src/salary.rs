use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::{decimal::Decimal, period::Period};

/// One payroll entry per (trainer, period). The commission is stored as a
/// single amount; the component breakdown is transient.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SalaryRecord {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub trainer: ObjectId,
    pub period: Period,
    pub base_salary: Decimal,
    pub commission: Decimal,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    /// None means unpaid.
    #[serde(with = "opt_chrono_datetime_as_bson_datetime")]
    pub paid_at: Option<DateTime<Utc>>,
}

impl SalaryRecord {
    pub fn total(&self) -> Decimal {
        self.base_salary + self.commission
    }

    pub fn is_paid(&self) -> bool {
        self.paid_at.is_some()
    }
}

/// Five-part decomposition of one trainer's monthly commission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommissionBreakdown {
    pub package: Decimal,
    pub class: Decimal,
    pub personal: Decimal,
    pub performance: Decimal,
    pub attendance: Decimal,
}

impl CommissionBreakdown {
    pub fn total(&self) -> Decimal {
        self.package + self.class + self.personal + self.performance + self.attendance
    }

    /// Clamps every component to `[0, cap]`.
    pub fn clamp(&mut self, cap: Decimal) {
        for component in self.components_mut() {
            if component.is_negative() {
                warn!("Negative commission component {} clamped to zero", component);
                *component = Decimal::zero();
            } else if *component > cap {
                warn!("Commission component {} capped at {}", component, cap);
                *component = cap;
            }
        }
    }

    /// Scales all components down by the same factor so the total equals
    /// `cap` exactly. No-op when the total is already within the cap.
    pub fn normalize(&mut self, cap: Decimal) {
        let total = self.total();
        if total <= cap || total.is_zero() {
            return;
        }
        for component in self.components_mut() {
            *component = component.mul_div(cap, total);
        }
        // Integer truncation can leave the scaled total a few cents short of
        // the cap; the remainder goes to the largest component.
        let residue = cap - self.total();
        if !residue.is_zero() {
            if let Some(largest) = self
                .components_mut()
                .into_iter()
                .max_by_key(|component| **component)
            {
                *largest += residue;
            }
        }
    }

    fn components_mut(&mut self) -> [&mut Decimal; 5] {
        [
            &mut self.package,
            &mut self.class,
            &mut self.personal,
            &mut self.performance,
            &mut self.attendance,
        ]
    }
}

mod opt_chrono_datetime_as_bson_datetime {
    use bson::DateTime as BsonDateTime;
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serialize as _, Serializer};

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value
            .map(BsonDateTime::from_chrono)
            .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<BsonDateTime>::deserialize(deserializer)?.map(BsonDateTime::to_chrono))
    }
}
