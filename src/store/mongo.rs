use async_trait::async_trait;
use bson::{doc, oid::ObjectId, Bson, Document};
use futures::TryStreamExt;
use mongodb::{Collection, Database};
use tracing::{debug, warn};

use super::{DocumentStore, Record, StoreError, MAX_BATCH_SIZE};

/// `DocumentStore` over one MongoDB database.
///
/// Ids are matched both as plain strings and, when they parse as one, as
/// ObjectIds, so documents created by application code and by seeding are
/// addressed the same way.
#[derive(Clone)]
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn collection(&self, name: &str) -> Collection<Document> {
        self.db.collection(name)
    }
}

fn id_variants(id: &str) -> Vec<Bson> {
    let mut keys = vec![Bson::String(id.to_string())];
    if let Ok(oid) = ObjectId::parse_str(id) {
        keys.push(Bson::ObjectId(oid));
    }
    keys
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn fetch_all(&self, collection: &str) -> Result<Vec<Record>, StoreError> {
        let cursor = self.collection(collection).find(doc! {}).await?;
        let docs: Vec<Document> = cursor.try_collect().await?;

        let mut records = Vec::with_capacity(docs.len());
        for raw in docs {
            match Record::from_document(raw) {
                Some(record) => records.push(record),
                None => warn!(collection, "skipping document without a usable _id"),
            }
        }
        Ok(records)
    }

    async fn delete_batch(&self, collection: &str, ids: &[String]) -> Result<(), StoreError> {
        if ids.len() > MAX_BATCH_SIZE {
            return Err(StoreError::BatchTooLarge {
                size: ids.len(),
                limit: MAX_BATCH_SIZE,
            });
        }
        if ids.is_empty() {
            return Ok(());
        }

        let keys: Vec<Bson> = ids.iter().flat_map(|id| id_variants(id)).collect();
        let result = self
            .collection(collection)
            .delete_many(doc! { "_id": { "$in": keys } })
            .await?;

        debug!(
            collection,
            requested = ids.len(),
            deleted = result.deleted_count,
            "batch committed"
        );
        Ok(())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Record>, StoreError> {
        let found = self
            .collection(collection)
            .find_one(doc! { "_id": { "$in": id_variants(id) } })
            .await?;

        Ok(found.and_then(Record::from_document))
    }

    async fn set(&self, collection: &str, record: &Record) -> Result<(), StoreError> {
        let coll = self.collection(collection);
        let existing = coll
            .find_one(doc! { "_id": { "$in": id_variants(&record.id) } })
            .await?;

        let mut body = record.fields.clone();
        match existing.and_then(|found| found.get("_id").cloned()) {
            // Keep the stored _id type so a replace never forks the document.
            Some(raw_id) => {
                body.insert("_id", raw_id.clone());
                coll.replace_one(doc! { "_id": raw_id }, body).await?;
            }
            None => {
                body.insert("_id", record.id.clone());
                coll.insert_one(body).await?;
            }
        }
        Ok(())
    }
}
