pub mod config;
pub mod decimal;
pub mod errors;
pub mod period;
pub mod salary;
pub mod sales;
pub mod session;
pub mod trainer;
