use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::modules::crud::Model;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Validate)]
#[serde(rename_all = "camelCase")]
pub struct WebsiteConfig {
    #[serde(rename = "_id")]
    #[validate(length(min = 1, message = "Website config id cannot be empty"))]
    pub id: String,
    #[validate(length(min = 1, message = "Website config must belong to an organization"))]
    pub organization_id: String,
    #[validate(length(min = 1, max = 120, message = "Site name must be 1-120 characters"))]
    pub site_name: String,
    pub theme: String,
    pub published: bool,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl WebsiteConfig {
    /// One config per organization, keyed by the organization id.
    pub fn for_organization(organization_id: impl Into<String>, site_name: impl Into<String>) -> Self {
        let organization_id = organization_id.into();
        Self {
            id: organization_id.clone(),
            organization_id,
            site_name: site_name.into(),
            theme: "default".to_string(),
            published: false,
            updated_at: Utc::now(),
        }
    }
}

impl Model for WebsiteConfig {
    const COLLECTION: &'static str = "website_configs";

    fn id(&self) -> &str {
        &self.id
    }
}
