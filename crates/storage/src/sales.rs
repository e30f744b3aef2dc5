use std::sync::Arc;

use bson::{doc, oid::ObjectId};
use chrono::{DateTime, Utc};
use eyre::Result;
use model::{
    sales::{ClassSale, PackageSale},
    session::Session,
};
use mongodb::{Collection, IndexModel};

use crate::session::Db;

const PACKAGE_COLLECTION: &str = "package_sales";
const CLASS_COLLECTION: &str = "class_sales";

#[derive(Clone)]
pub struct PackageSaleStore {
    sales: Arc<Collection<PackageSale>>,
}

impl PackageSaleStore {
    pub(crate) async fn new(db: &Db) -> Result<Self> {
        let sales: Collection<PackageSale> = db.collection(PACKAGE_COLLECTION);
        sales
            .create_index(IndexModel::builder().keys(doc! { "sold_at": 1 }).build())
            .await?;
        sales
            .create_index(IndexModel::builder().keys(doc! { "buyer": 1 }).build())
            .await?;
        Ok(PackageSaleStore {
            sales: Arc::new(sales),
        })
    }

    pub async fn paid_in_range(
        &self,
        session: &mut Session,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<PackageSale>> {
        let filter = doc! {
            "paid": true,
            "sold_at": {
                "$gte": from,
                "$lt": to,
            }
        };
        let mut cursor = self.sales.find(filter).session(&mut *session).await?;

        let mut sales = Vec::new();
        while let Some(sale) = cursor.next(&mut *session).await {
            sales.push(sale?);
        }
        Ok(sales)
    }
}

#[derive(Clone)]
pub struct ClassSaleStore {
    sales: Arc<Collection<ClassSale>>,
}

impl ClassSaleStore {
    pub(crate) async fn new(db: &Db) -> Result<Self> {
        let sales: Collection<ClassSale> = db.collection(CLASS_COLLECTION);
        sales
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "trainer": 1, "sold_at": 1 })
                    .build(),
            )
            .await?;
        sales
            .create_index(IndexModel::builder().keys(doc! { "class_id": 1 }).build())
            .await?;
        Ok(ClassSaleStore {
            sales: Arc::new(sales),
        })
    }

    /// Paid class sales that were not bundled into a package.
    pub async fn standalone_by_trainer(
        &self,
        session: &mut Session,
        trainer: ObjectId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<ClassSale>> {
        let filter = doc! {
            "trainer": trainer,
            "paid": true,
            "part_of_package": null,
            "sold_at": {
                "$gte": from,
                "$lt": to,
            }
        };
        let mut cursor = self.sales.find(filter).session(&mut *session).await?;

        let mut sales = Vec::new();
        while let Some(sale) = cursor.next(&mut *session).await {
            sales.push(sale?);
        }
        Ok(sales)
    }

    pub async fn paid_by_classes(
        &self,
        session: &mut Session,
        class_ids: &[ObjectId],
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<ClassSale>> {
        let filter = doc! {
            "class_id": { "$in": class_ids.to_vec() },
            "paid": true,
            "sold_at": {
                "$gte": from,
                "$lt": to,
            }
        };
        let mut cursor = self.sales.find(filter).session(&mut *session).await?;

        let mut sales = Vec::new();
        while let Some(sale) = cursor.next(&mut *session).await {
            sales.push(sale?);
        }
        Ok(sales)
    }
}
