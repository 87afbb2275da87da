use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use validator::Validate;

use crate::error::SweepError;
use crate::services::guard::Clearance;
use crate::store::{DocumentStore, Record};

/// A typed document living in a fixed collection.
pub trait Model: Serialize + DeserializeOwned + Validate {
    const COLLECTION: &'static str;

    fn id(&self) -> &str;
}

pub fn to_record<M: Model>(model: &M) -> Result<Record, SweepError> {
    let doc = bson::to_document(model)?;
    Record::from_document(doc).ok_or_else(|| {
        SweepError::Serialization(format!("{} model has no _id", M::COLLECTION))
    })
}

pub fn from_record<M: Model>(record: Record) -> Result<M, SweepError> {
    Ok(bson::from_document(record.into_document())?)
}

pub struct Crud<'a, S: DocumentStore + ?Sized, M: Model> {
    store: &'a S,
    _model: PhantomData<M>,
}

impl<'a, S: DocumentStore + ?Sized, M: Model> Crud<'a, S, M> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            _model: PhantomData,
        }
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<M>, SweepError> {
        self.store
            .get(M::COLLECTION, id)
            .await?
            .map(from_record)
            .transpose()
    }

    /// Validates, then writes the whole document.
    pub async fn upsert(&self, model: &M, _clearance: &Clearance) -> Result<(), SweepError> {
        model.validate()?;
        let record = to_record(model)?;
        self.store.set(M::COLLECTION, &record).await?;
        Ok(())
    }
}
