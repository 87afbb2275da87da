//! Demo data seeding.
//!
//! Seeding writes into shared stores, so it only runs with a clearance that
//! carries an explicit operator confirmation, whatever the environment.

use serde::Serialize;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::error::SweepError;
use crate::modules::api_key::model::ApiKeyDocument;
use crate::modules::crud::{Crud, Model};
use crate::modules::organization::model::Organization;
use crate::modules::user::model::User;
use crate::modules::website_config::model::WebsiteConfig;
use crate::services::guard::Clearance;
use crate::store::DocumentStore;

pub const DEMO_PROVIDERS: &[(&str, &str)] = &[("openai", "OpenAI"), ("anthropic", "Anthropic")];

#[derive(Debug, Clone)]
pub struct SeedPlan {
    pub organization: Organization,
    pub users: Vec<User>,
    pub api_keys: ApiKeyDocument,
    pub website: WebsiteConfig,
}

impl SeedPlan {
    /// A demo organization with one admin plus members, placeholder
    /// provider key references, and an unpublished website config.
    pub fn demo(org_id: &str, org_name: &str, emails: &[String]) -> Self {
        let users = emails
            .iter()
            .enumerate()
            .map(|(i, email)| {
                let name = email.split('@').next().unwrap_or(email.as_str());
                let user = User::new(format!("{}-user-{}", org_id, i + 1), email, name, org_id);
                if i == 0 {
                    user.admin()
                } else {
                    user
                }
            })
            .collect();

        let api_keys = DEMO_PROVIDERS.iter().fold(
            ApiKeyDocument::new(format!("{}-keys", org_id), org_id),
            |doc, (provider, label)| doc.with_provider(provider, label, format!("demo-{}", Uuid::new_v4())),
        );

        Self {
            organization: Organization::new(org_id, org_name),
            users,
            api_keys,
            website: WebsiteConfig::for_organization(org_id, org_name),
        }
    }

    /// Field validation for every model, plus every document pointing at
    /// the plan's organization.
    pub fn validate(&self) -> Result<(), SweepError> {
        self.organization.validate()?;
        self.api_keys.validate()?;
        self.website.validate()?;
        for user in &self.users {
            user.validate()?;
        }

        let org_id = self.organization.id.as_str();
        let stray = self
            .users
            .iter()
            .map(|u| (User::COLLECTION, u.id.as_str(), u.organization_id.as_str()))
            .chain([
                (ApiKeyDocument::COLLECTION, self.api_keys.id.as_str(), self.api_keys.organization_id.as_str()),
                (WebsiteConfig::COLLECTION, self.website.id.as_str(), self.website.organization_id.as_str()),
            ])
            .find(|(_, _, org)| *org != org_id);

        if let Some((collection, id, org)) = stray {
            return Err(SweepError::Config(format!(
                "{}/{} references organization `{}`, expected `{}`",
                collection, id, org, org_id
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Default, Serialize)]
pub struct SeedReport {
    /// `(collection, id)` per document written, in write order.
    pub written: Vec<(String, String)>,
}

impl SeedReport {
    fn record<M: Model>(&mut self, model: &M) {
        self.written
            .push((M::COLLECTION.to_string(), model.id().to_string()));
    }
}

pub struct Seeder<'a, S: DocumentStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: DocumentStore + ?Sized> Seeder<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub async fn seed(&self, plan: &SeedPlan, clearance: &Clearance) -> Result<SeedReport, SweepError> {
        if !clearance.is_confirmed() {
            return Err(SweepError::ConfirmationRequired {
                target: clearance.target().to_string(),
            });
        }
        plan.validate()?;

        info!(
            target = %clearance.target(),
            organization = %plan.organization.id,
            users = plan.users.len(),
            "seeding demo data"
        );

        let mut report = SeedReport::default();

        Crud::<S, Organization>::new(self.store)
            .upsert(&plan.organization, clearance)
            .await?;
        report.record(&plan.organization);

        let users = Crud::<S, User>::new(self.store);
        for user in &plan.users {
            users.upsert(user, clearance).await?;
            report.record(user);
        }

        Crud::<S, ApiKeyDocument>::new(self.store)
            .upsert(&plan.api_keys, clearance)
            .await?;
        report.record(&plan.api_keys);

        Crud::<S, WebsiteConfig>::new(self.store)
            .upsert(&plan.website, clearance)
            .await?;
        report.record(&plan.website);

        Ok(report)
    }
}
