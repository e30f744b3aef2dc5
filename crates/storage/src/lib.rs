pub mod booking;
pub mod enrollment;
pub mod gym_class;
pub mod salary;
pub mod sales;
pub mod session;
pub mod trainer;

use booking::BookingStore;
use enrollment::EnrollmentStore;
use eyre::Result;
use gym_class::GymClassStore;
use salary::SalaryStore;
use sales::{ClassSaleStore, PackageSaleStore};
use session::Db;
use trainer::TrainerStore;

const DB_NAME: &str = "payroll_db";

#[derive(Clone)]
pub struct Storage {
    pub db: Db,
    pub salaries: SalaryStore,
    pub trainers: TrainerStore,
    pub package_sales: PackageSaleStore,
    pub class_sales: ClassSaleStore,
    pub enrollments: EnrollmentStore,
    pub bookings: BookingStore,
    pub classes: GymClassStore,
}

impl Storage {
    pub async fn new(uri: &str) -> Result<Self> {
        let db = Db::new(uri, DB_NAME).await?;
        let salaries = SalaryStore::new(&db).await?;
        let trainers = TrainerStore::new(&db).await?;
        let package_sales = PackageSaleStore::new(&db).await?;
        let class_sales = ClassSaleStore::new(&db).await?;
        let enrollments = EnrollmentStore::new(&db).await?;
        let bookings = BookingStore::new(&db).await?;
        let classes = GymClassStore::new(&db).await?;

        Ok(Storage {
            db,
            salaries,
            trainers,
            package_sales,
            class_sales,
            enrollments,
            bookings,
            classes,
        })
    }
}
