use std::sync::Arc;

use bson::{doc, oid::ObjectId};
use eyre::Result;
use model::{sales::GymClass, session::Session};
use mongodb::{Collection, IndexModel};

use crate::session::Db;

const COLLECTION: &str = "gym_classes";

#[derive(Clone)]
pub struct GymClassStore {
    classes: Arc<Collection<GymClass>>,
}

impl GymClassStore {
    pub(crate) async fn new(db: &Db) -> Result<Self> {
        let classes: Collection<GymClass> = db.collection(COLLECTION);
        classes
            .create_index(IndexModel::builder().keys(doc! { "trainer": 1 }).build())
            .await?;
        Ok(GymClassStore {
            classes: Arc::new(classes),
        })
    }

    pub async fn by_trainer(&self, session: &mut Session, trainer: ObjectId) -> Result<Vec<GymClass>> {
        let mut cursor = self
            .classes
            .find(doc! { "trainer": trainer })
            .session(&mut *session)
            .await?;

        let mut classes = Vec::new();
        while let Some(class) = cursor.next(&mut *session).await {
            classes.push(class?);
        }
        Ok(classes)
    }
}
