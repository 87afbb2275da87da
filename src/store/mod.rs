//! Document store boundary.
//!
//! The reconciliation core only needs four things from a store: a full
//! snapshot read of a collection, a bounded batch delete, and point
//! get/set of whole documents. Field-level updates are never issued.

use async_trait::async_trait;
use bson::{Bson, Document};
use thiserror::Error;

pub mod memory;
pub mod mongo;

/// Largest number of deletes the store accepts in one batch commit.
pub const MAX_BATCH_SIZE: usize = 500;

/// Shown in place of a missing or null field.
pub const PLACEHOLDER: &str = "N/A";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),
    #[error("Batch of {size} deletes exceeds the limit of {limit}")]
    BatchTooLarge { size: usize, limit: usize },
    #[error("Batch rejected: {0}")]
    Rejected(String),
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Reads every document currently in `collection`.
    async fn fetch_all(&self, collection: &str) -> Result<Vec<Record>, StoreError>;

    /// Deletes `ids` as one unit. Ids that no longer exist are ignored.
    async fn delete_batch(&self, collection: &str, ids: &[String]) -> Result<(), StoreError>;

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Record>, StoreError>;

    /// Writes the whole document, replacing any existing one with the same id.
    async fn set(&self, collection: &str, record: &Record) -> Result<(), StoreError>;
}

/// A document keyed by an opaque string id.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: String,
    pub fields: Document,
}

impl Record {
    pub fn new(id: impl Into<String>, fields: Document) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Splits `_id` off a raw document. Returns `None` when the id is absent
    /// or of a type that has no string form.
    pub fn from_document(mut doc: Document) -> Option<Self> {
        let id = doc.remove("_id").and_then(|raw| id_to_string(&raw))?;
        Some(Self { id, fields: doc })
    }

    pub fn into_document(self) -> Document {
        let mut doc = Document::new();
        doc.insert("_id", self.id);
        doc.extend(self.fields);
        doc
    }

    /// Resolves a dotted path such as `providers.openai.label`.
    pub fn lookup(&self, path: &str) -> Option<&Bson> {
        let mut parts = path.split('.');
        let mut current = self.fields.get(parts.next()?)?;
        for part in parts {
            current = match current {
                Bson::Document(inner) => inner.get(part)?,
                _ => return None,
            };
        }
        Some(current)
    }

    pub fn str_field(&self, path: &str) -> Option<&str> {
        match self.lookup(path)? {
            Bson::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// A reference field as an id string, whether stored as a string or an
    /// ObjectId. The value is not trimmed.
    pub fn ref_field(&self, path: &str) -> Option<String> {
        self.lookup(path).and_then(id_to_string)
    }

    /// Renders a field for console output. Sub-documents show only their
    /// keys so credential values never reach the terminal.
    pub fn display_field(&self, path: &str) -> String {
        match self.lookup(path) {
            None | Some(Bson::Null) => PLACEHOLDER.to_string(),
            Some(Bson::String(s)) => s.clone(),
            Some(Bson::ObjectId(oid)) => oid.to_hex(),
            Some(Bson::DateTime(dt)) => dt
                .try_to_rfc3339_string()
                .unwrap_or_else(|_| dt.to_string()),
            Some(Bson::Document(inner)) => {
                let keys: Vec<&str> = inner.keys().map(String::as_str).collect();
                format!("{{{}}}", keys.join(", "))
            }
            Some(Bson::Array(items)) => format!("[{} items]", items.len()),
            Some(other) => other.to_string(),
        }
    }
}

pub(crate) fn id_to_string(raw: &Bson) -> Option<String> {
    match raw {
        Bson::String(s) => Some(s.clone()),
        Bson::ObjectId(oid) => Some(oid.to_hex()),
        Bson::Int32(n) => Some(n.to_string()),
        Bson::Int64(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::{doc, oid::ObjectId};

    #[test]
    fn object_ids_become_hex_strings() {
        let oid = ObjectId::new();
        let record = Record::from_document(doc! { "_id": oid, "name": "Acme" }).unwrap();
        assert_eq!(record.id, oid.to_hex());
        assert!(record.fields.get("_id").is_none());
    }

    #[test]
    fn nested_documents_display_keys_only() {
        let record = Record::new(
            "k1",
            doc! { "providers": { "openai": { "key": "sk-secret" }, "groq": { "key": "gsk" } } },
        );
        let shown = record.display_field("providers");
        assert_eq!(shown, "{openai, groq}");
        assert!(!shown.contains("secret"));
        assert_eq!(record.display_field("providers.openai.key"), "sk-secret");
    }

    #[test]
    fn missing_fields_use_placeholder() {
        let record = Record::new("o1", doc! { "status": Bson::Null });
        assert_eq!(record.display_field("name"), PLACEHOLDER);
        assert_eq!(record.display_field("status"), PLACEHOLDER);
    }
}
