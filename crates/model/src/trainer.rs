use bson::oid::ObjectId;
use chrono::{DateTime, Datelike as _, Utc, Weekday};
use serde::{Deserialize, Serialize};

/// A staff member eligible for base salary and commission.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Trainer {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    pub email: String,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub joined_at: DateTime<Utc>,
    pub is_active: bool,
    /// Weekly recurring schedule, used to derive the expected session count.
    #[serde(default)]
    pub weekly_slots: Vec<WeeklySlot>,
}

impl Trainer {
    /// Tenure in whole calendar years.
    pub fn tenure_years(&self, now: DateTime<Utc>) -> i32 {
        now.year() - self.joined_at.year()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
pub struct WeeklySlot {
    pub weekday: Weekday,
    pub start_hour: u8,
    pub duration_min: u32,
}
