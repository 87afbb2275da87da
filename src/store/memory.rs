use async_trait::async_trait;
use bson::Document;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;

use super::{DocumentStore, Record, StoreError, MAX_BATCH_SIZE};

/// In-process store used by tests and rehearsals.
///
/// Batch commits are numbered from 1 in call order; ordinals registered with
/// [`MemoryStore::reject_batch`] fail without touching any document.
#[derive(Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<String, BTreeMap<String, Document>>>,
    rejected_batches: HashSet<usize>,
    batch_calls: AtomicUsize,
    committed: Mutex<Vec<usize>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(mut self, collection: &str, records: Vec<Record>) -> Self {
        let docs = self
            .collections
            .get_mut()
            .entry(collection.to_string())
            .or_default();
        for record in records {
            docs.insert(record.id, record.fields);
        }
        self
    }

    pub fn reject_batch(mut self, ordinal: usize) -> Self {
        self.rejected_batches.insert(ordinal);
        self
    }

    pub async fn ids(&self, collection: &str) -> Vec<String> {
        self.collections
            .lock()
            .await
            .get(collection)
            .map(|docs| docs.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub async fn len(&self, collection: &str) -> usize {
        self.collections
            .lock()
            .await
            .get(collection)
            .map(BTreeMap::len)
            .unwrap_or(0)
    }

    /// Sizes of the batches that committed, in order.
    pub async fn committed_batches(&self) -> Vec<usize> {
        self.committed.lock().await.clone()
    }

    pub fn batch_calls(&self) -> usize {
        self.batch_calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn fetch_all(&self, collection: &str) -> Result<Vec<Record>, StoreError> {
        let collections = self.collections.lock().await;
        Ok(collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, fields)| Record::new(id.clone(), fields.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn delete_batch(&self, collection: &str, ids: &[String]) -> Result<(), StoreError> {
        if ids.len() > MAX_BATCH_SIZE {
            return Err(StoreError::BatchTooLarge {
                size: ids.len(),
                limit: MAX_BATCH_SIZE,
            });
        }

        let ordinal = self.batch_calls.fetch_add(1, Ordering::Relaxed) + 1;
        if self.rejected_batches.contains(&ordinal) {
            return Err(StoreError::Rejected(format!(
                "batch {} refused by store",
                ordinal
            )));
        }

        let mut collections = self.collections.lock().await;
        if let Some(docs) = collections.get_mut(collection) {
            for id in ids {
                docs.remove(id);
            }
        }
        self.committed.lock().await.push(ids.len());
        Ok(())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Record>, StoreError> {
        let collections = self.collections.lock().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|fields| Record::new(id, fields.clone())))
    }

    async fn set(&self, collection: &str, record: &Record) -> Result<(), StoreError> {
        self.collections
            .lock()
            .await
            .entry(collection.to_string())
            .or_default()
            .insert(record.id.clone(), record.fields.clone());
        Ok(())
    }
}
