use std::sync::Arc;

use bson::{doc, oid::ObjectId};
use eyre::Result;
use futures_util::stream::TryStreamExt as _;
use model::{session::Session, trainer::Trainer};
use mongodb::{Collection, IndexModel};

use crate::session::Db;

const COLLECTION: &str = "trainers";

#[derive(Clone)]
pub struct TrainerStore {
    trainers: Arc<Collection<Trainer>>,
}

impl TrainerStore {
    pub(crate) async fn new(db: &Db) -> Result<Self> {
        let trainers: Collection<Trainer> = db.collection(COLLECTION);
        trainers
            .create_index(IndexModel::builder().keys(doc! { "is_active": 1 }).build())
            .await?;
        Ok(TrainerStore {
            trainers: Arc::new(trainers),
        })
    }

    /// Active roster, ordered by id so generation runs are deterministic.
    pub async fn active(&self, session: &mut Session) -> Result<Vec<Trainer>> {
        let mut cursor = self
            .trainers
            .find(doc! { "is_active": true })
            .sort(doc! { "_id": 1 })
            .session(&mut *session)
            .await?;
        Ok(cursor.stream(&mut *session).try_collect().await?)
    }

    pub async fn get(&self, session: &mut Session, id: ObjectId) -> Result<Option<Trainer>> {
        Ok(self
            .trainers
            .find_one(doc! { "_id": id })
            .session(&mut *session)
            .await?)
    }
}
