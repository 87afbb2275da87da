use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::modules::crud::Model;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Validate)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    #[validate(length(min = 1, message = "User id cannot be empty"))]
    pub id: String,
    #[validate(email(message = "Invalid email"))]
    pub email: String,
    #[validate(length(min = 1, max = 80, message = "Display name must be 1-80 characters"))]
    pub display_name: String,
    #[validate(length(min = 1, message = "User must belong to an organization"))]
    pub organization_id: String,
    pub role: String,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(
        id: impl Into<String>,
        email: impl Into<String>,
        display_name: impl Into<String>,
        organization_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            display_name: display_name.into(),
            organization_id: organization_id.into(),
            role: "member".to_string(),
            created_at: Utc::now(),
        }
    }

    pub fn admin(mut self) -> Self {
        self.role = "admin".to_string();
        self
    }
}

impl Model for User {
    const COLLECTION: &'static str = "users";

    fn id(&self) -> &str {
        &self.id
    }
}
