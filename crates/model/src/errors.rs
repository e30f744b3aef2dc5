use bson::oid::ObjectId;
use thiserror::Error;

use crate::period::Period;

#[derive(Error, Debug)]
pub enum PayrollError {
    #[error("Invalid period: {0}")]
    InvalidPeriod(String),
    #[error("Salaries already generated for period {0}")]
    AlreadyGenerated(Period),
    #[error("No eligible trainers for period {0}")]
    NoEligibleTrainers(Period),
    #[error("Salary record not found: {0}")]
    SalaryNotFound(ObjectId),
    #[error("Salary record already paid: {0}")]
    AlreadyPaid(ObjectId),
    #[error("Common error: {0}")]
    Eyre(#[from] eyre::Error),
    #[error("Mongo error: {0}")]
    MongoError(#[from] mongodb::error::Error),
}
