pub mod base_salary;
pub mod cache;
pub mod commission;
pub mod lock;
pub mod notify;
pub mod salaries;
