use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::modules::crud::Model;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    #[serde(rename = "_id")]
    #[validate(length(min = 1, message = "Organization id cannot be empty"))]
    pub id: String,
    #[validate(length(min = 1, max = 120, message = "Organization name must be 1-120 characters"))]
    pub name: String,
    pub status: String,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl Organization {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            status: "active".to_string(),
            created_at: Utc::now(),
        }
    }
}

impl Model for Organization {
    const COLLECTION: &'static str = "organizations";

    fn id(&self) -> &str {
        &self.id
    }
}
