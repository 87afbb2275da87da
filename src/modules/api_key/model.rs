use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use validator::Validate;

use crate::modules::crud::Model;

/// A provider credential. `key_ref` names where the secret lives; the
/// secret itself is never written by these tools.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProviderKey {
    pub label: String,
    pub key_ref: String,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyDocument {
    #[serde(rename = "_id")]
    #[validate(length(min = 1, message = "API key document id cannot be empty"))]
    pub id: String,
    #[validate(length(min = 1, message = "API keys must belong to an organization"))]
    pub organization_id: String,
    #[serde(default)]
    pub providers: BTreeMap<String, ProviderKey>,
}

impl ApiKeyDocument {
    pub fn new(id: impl Into<String>, organization_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            organization_id: organization_id.into(),
            providers: BTreeMap::new(),
        }
    }

    pub fn with_provider(mut self, provider: &str, label: &str, key_ref: impl Into<String>) -> Self {
        self.providers.insert(
            provider.to_string(),
            ProviderKey {
                label: label.to_string(),
                key_ref: key_ref.into(),
                created_at: Utc::now(),
            },
        );
        self
    }
}

impl Model for ApiKeyDocument {
    const COLLECTION: &'static str = "api_keys";

    fn id(&self) -> &str {
        &self.id
    }
}
