use std::sync::Arc;

use bson::{doc, oid::ObjectId};
use chrono::{DateTime, Utc};
use eyre::Result;
use model::{sales::Booking, session::Session};
use mongodb::{Collection, IndexModel};

use crate::session::Db;

const COLLECTION: &str = "bookings";

#[derive(Clone)]
pub struct BookingStore {
    bookings: Arc<Collection<Booking>>,
}

impl BookingStore {
    pub(crate) async fn new(db: &Db) -> Result<Self> {
        let bookings: Collection<Booking> = db.collection(COLLECTION);
        bookings
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "trainer": 1, "start_at": 1 })
                    .build(),
            )
            .await?;
        Ok(BookingStore {
            bookings: Arc::new(bookings),
        })
    }

    pub async fn confirmed_by_trainer(
        &self,
        session: &mut Session,
        trainer: ObjectId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Booking>> {
        let filter = doc! {
            "trainer": trainer,
            "status": "Confirmed",
            "start_at": {
                "$gte": from,
                "$lt": to,
            }
        };
        let mut cursor = self.bookings.find(filter).session(&mut *session).await?;

        let mut bookings = Vec::new();
        while let Some(booking) = cursor.next(&mut *session).await {
            bookings.push(booking?);
        }
        Ok(bookings)
    }
}
