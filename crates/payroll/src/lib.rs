use std::sync::Arc;
use std::time::Duration;

use model::config::CommissionConfig;
use service::cache::SalaryCache;
use service::commission::Commission;
use service::lock::PeriodLocks;
use service::notify::NotificationDispatcher;
use service::salaries::Salaries;
use storage::Storage;

pub mod service;

const CACHE_TTL: Duration = Duration::from_secs(15 * 60);

#[derive(Clone)]
pub struct Payroll {
    pub salaries: Salaries,
    pub commission: Commission,
}

impl Payroll {
    pub fn new(
        storage: Storage,
        config: CommissionConfig,
        dispatcher: NotificationDispatcher,
    ) -> Payroll {
        let config = Arc::new(config);
        let commission = Commission::new(
            storage.package_sales,
            storage.class_sales,
            storage.enrollments,
            storage.bookings,
            storage.classes,
            config.clone(),
        );
        let salaries = Salaries::new(
            storage.db,
            storage.salaries,
            storage.trainers,
            commission.clone(),
            Arc::new(PeriodLocks::default()),
            SalaryCache::new(CACHE_TTL),
            dispatcher,
            config,
        );
        Payroll {
            salaries,
            commission,
        }
    }
}
