use std::sync::Arc;

use bson::{doc, oid::ObjectId};
use chrono::{DateTime, Utc};
use eyre::{bail, Result};
use model::{decimal::Decimal, period::Period, salary::SalaryRecord, session::Session};
use mongodb::{options::IndexOptions, Collection, IndexModel};

use crate::session::Db;

const COLLECTION: &str = "salaries";

#[derive(Clone)]
pub struct SalaryStore {
    salaries: Arc<Collection<SalaryRecord>>,
}

impl SalaryStore {
    pub(crate) async fn new(db: &Db) -> Result<Self> {
        let salaries: Collection<SalaryRecord> = db.collection(COLLECTION);
        // One record per (trainer, period); the cross-process idempotency
        // backstop for generation.
        salaries
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "trainer": 1, "period": 1 })
                    .options(IndexOptions::builder().unique(true).build())
                    .build(),
            )
            .await?;
        salaries
            .create_index(IndexModel::builder().keys(doc! { "period": 1 }).build())
            .await?;
        Ok(SalaryStore {
            salaries: Arc::new(salaries),
        })
    }

    pub async fn insert_many(
        &self,
        session: &mut Session,
        records: &[SalaryRecord],
    ) -> Result<()> {
        self.salaries
            .insert_many(records)
            .session(&mut *session)
            .await?;
        Ok(())
    }

    pub async fn count_by_period(&self, session: &mut Session, period: Period) -> Result<u64> {
        Ok(self
            .salaries
            .count_documents(doc! { "period": period.to_string() })
            .session(&mut *session)
            .await?)
    }

    pub async fn exists(
        &self,
        session: &mut Session,
        trainer: ObjectId,
        period: Period,
    ) -> Result<bool> {
        Ok(self
            .salaries
            .find_one(doc! { "trainer": trainer, "period": period.to_string() })
            .session(&mut *session)
            .await?
            .is_some())
    }

    pub async fn get(&self, session: &mut Session, id: ObjectId) -> Result<Option<SalaryRecord>> {
        Ok(self
            .salaries
            .find_one(doc! { "_id": id })
            .session(&mut *session)
            .await?)
    }

    pub async fn find_by_period(
        &self,
        session: &mut Session,
        period: Period,
    ) -> Result<Vec<SalaryRecord>> {
        let mut cursor = self
            .salaries
            .find(doc! { "period": period.to_string() })
            .sort(doc! { "trainer": 1 })
            .session(&mut *session)
            .await?;

        let mut records = Vec::new();
        while let Some(record) = cursor.next(&mut *session).await {
            records.push(record?);
        }
        Ok(records)
    }

    pub async fn total_expense(&self, session: &mut Session, period: Period) -> Result<Decimal> {
        let records = self.find_by_period(session, period).await?;
        Ok(records.iter().map(SalaryRecord::total).sum())
    }

    pub async fn set_paid(
        &self,
        session: &mut Session,
        id: ObjectId,
        paid_at: DateTime<Utc>,
    ) -> Result<()> {
        let result = self
            .salaries
            .update_one(
                doc! { "_id": id, "paid_at": null },
                doc! { "$set": { "paid_at": paid_at } },
            )
            .session(&mut *session)
            .await?;
        if result.modified_count == 0 {
            bail!("Failed to mark salary {} as paid", id);
        }
        Ok(())
    }

    pub async fn delete(&self, session: &mut Session, id: ObjectId) -> Result<()> {
        let result = self
            .salaries
            .delete_one(doc! { "_id": id })
            .session(&mut *session)
            .await?;
        if result.deleted_count == 0 {
            bail!("Failed to delete salary {}", id);
        }
        Ok(())
    }
}
