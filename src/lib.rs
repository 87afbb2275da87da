pub mod config;
pub mod error;
pub mod modules;
pub mod services;
pub mod store;

pub use error::SweepError;

use config::credentials::{CredentialSource, Credentials};
use config::settings::Settings;
use services::guard::{Clearance, ConfirmationPolicy, ProductionGuard, Target};
use services::identity::IdentityClient;
use services::reconcile::{ReconcilePlan, ReconcileReport, Reconciler};
use store::mongo::MongoStore;

/// Everything one script invocation needs, opened once and owned by it.
pub struct AppState {
    pub settings: Settings,
    pub credentials: Credentials,
    pub source: CredentialSource,
    pub store: MongoStore,
    pub guard: ProductionGuard,
}

impl AppState {
    pub async fn connect() -> Result<Self, SweepError> {
        let settings = Settings::from_env()?;
        let (credentials, source) = Credentials::load(&settings.key_files)?;
        let db = config::database::connect(&credentials).await?;

        Ok(Self {
            guard: ProductionGuard::from_settings(&settings),
            store: MongoStore::new(db),
            settings,
            credentials,
            source,
        })
    }

    pub fn target(&self) -> Target {
        Target::new(self.credentials.project_id.clone(), self.settings.environment)
    }

    pub fn identity(&self) -> Result<IdentityClient, SweepError> {
        Ok(IdentityClient::from_credentials(&self.credentials)?)
    }

    pub fn clearance(&self, policy: ConfirmationPolicy) -> Result<Clearance, SweepError> {
        self.guard.authorize_interactive(&self.target(), policy)
    }

    /// Previews the plan, then deletes the previewed set unless this is a
    /// dry run or there is nothing to delete. Ids from
    /// `DOCSWEEP_PROTECTED_IDS` are always protected.
    pub async fn reconcile(&self, plan: ReconcilePlan) -> Result<ReconcileReport, SweepError> {
        Reconciler::new(&self.store)
            .with_batch_limit(self.settings.batch_limit)
            .run(plan, &self.settings, || self.clearance(ConfirmationPolicy::ProductionOnly))
            .await
    }
}
