use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Decimal;

/// A package sale. Packages are not tied to a trainer at sale time;
/// attribution goes through the buyer's class enrollments.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PackageSale {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub buyer: ObjectId,
    pub amount: Decimal,
    pub paid: bool,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub sold_at: DateTime<Utc>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub valid_from: DateTime<Utc>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub valid_to: DateTime<Utc>,
}

/// A sale of a single class, optionally bundled into a package.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ClassSale {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub class_id: ObjectId,
    pub trainer: ObjectId,
    pub buyer: ObjectId,
    pub amount: Decimal,
    pub paid: bool,
    /// Set when the sale was part of a package deal; such sales are not
    /// standalone class revenue.
    pub part_of_package: Option<ObjectId>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub sold_at: DateTime<Utc>,
}

/// A student's enrollment in a class taught by a trainer.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Enrollment {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub class_id: ObjectId,
    pub trainer: ObjectId,
    pub student: ObjectId,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub start_at: DateTime<Utc>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub end_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Canceled,
}

/// A booking of a single session slot.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Booking {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub class_id: ObjectId,
    pub trainer: ObjectId,
    pub student: ObjectId,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub start_at: DateTime<Utc>,
    pub price: Decimal,
    pub status: BookingStatus,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GymClass {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    pub trainer: ObjectId,
    pub capacity: u32,
}

impl GymClass {
    /// Personal (1-on-1) sessions are detected by capacity or by name.
    pub fn is_personal(&self) -> bool {
        if self.capacity <= 1 {
            return true;
        }
        let name = self.name.to_lowercase();
        name.contains("personal") || name.contains("1:1") || name.contains("1-on-1")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class(name: &str, capacity: u32) -> GymClass {
        GymClass {
            id: ObjectId::new(),
            name: name.to_string(),
            trainer: ObjectId::new(),
            capacity,
        }
    }

    #[test]
    fn test_personal_detection() {
        assert!(class("Stretching", 1).is_personal());
        assert!(class("Personal training", 10).is_personal());
        assert!(class("Boxing 1:1", 2).is_personal());
        assert!(!class("Group yoga", 12).is_personal());
    }
}
