use std::sync::Arc;

use bson::{doc, oid::ObjectId};
use chrono::{DateTime, Utc};
use eyre::Result;
use model::{sales::Enrollment, session::Session};
use mongodb::{Collection, IndexModel};

use crate::session::Db;

const COLLECTION: &str = "enrollments";

#[derive(Clone)]
pub struct EnrollmentStore {
    enrollments: Arc<Collection<Enrollment>>,
}

impl EnrollmentStore {
    pub(crate) async fn new(db: &Db) -> Result<Self> {
        let enrollments: Collection<Enrollment> = db.collection(COLLECTION);
        enrollments
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "trainer": 1, "start_at": 1 })
                    .build(),
            )
            .await?;
        enrollments
            .create_index(IndexModel::builder().keys(doc! { "student": 1 }).build())
            .await?;
        Ok(EnrollmentStore {
            enrollments: Arc::new(enrollments),
        })
    }

    /// Enrollments taught by the trainer whose date range overlaps `[from, to)`.
    pub async fn overlapping(
        &self,
        session: &mut Session,
        trainer: ObjectId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Enrollment>> {
        let filter = doc! {
            "trainer": trainer,
            "start_at": { "$lt": to },
            "end_at": { "$gte": from },
        };
        let mut cursor = self.enrollments.find(filter).session(&mut *session).await?;

        let mut enrollments = Vec::new();
        while let Some(enrollment) = cursor.next(&mut *session).await {
            enrollments.push(enrollment?);
        }
        Ok(enrollments)
    }
}
