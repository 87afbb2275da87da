use bson::{oid::ObjectId, Bson};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::SweepError;
use crate::services::guard::Clearance;
use crate::services::inspector::{InspectionReport, ORGANIZATIONS};
use crate::store::DocumentStore;

#[derive(Debug, Default, Serialize)]
pub struct RepairReport {
    pub collection: String,
    pub repaired: Vec<String>,
    /// Orphans deleted or re-pointed since the inspection ran.
    pub skipped: Vec<String>,
}

pub struct Repairer<'a, S: DocumentStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: DocumentStore + ?Sized> Repairer<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Points every orphan in `inspection` at `fallback_org`, rewriting each
    /// document whole. Only top-level reference fields are supported. An
    /// ObjectId reference stays an ObjectId when the fallback parses as one.
    pub async fn reassign_orphans(
        &self,
        inspection: &InspectionReport,
        fallback_org: &str,
        clearance: &Clearance,
    ) -> Result<RepairReport, SweepError> {
        if self.store.get(ORGANIZATIONS, fallback_org).await?.is_none() {
            return Err(SweepError::RecordNotFound {
                collection: ORGANIZATIONS.to_string(),
                id: fallback_org.to_string(),
            });
        }

        let collection = inspection.collection.as_str();
        let mut report = RepairReport {
            collection: collection.to_string(),
            ..Default::default()
        };

        for orphan in &inspection.orphans {
            if orphan.field.contains('.') {
                return Err(SweepError::Config(format!(
                    "cannot repair nested reference field `{}`",
                    orphan.field
                )));
            }

            let Some(mut record) = self.store.get(collection, &orphan.id).await? else {
                warn!(collection, id = %orphan.id, "orphan vanished before repair");
                report.skipped.push(orphan.id.clone());
                continue;
            };

            if record.ref_field(&orphan.field).as_deref() != Some(orphan.missing.as_str()) {
                warn!(collection, id = %orphan.id, "reference changed since inspection");
                report.skipped.push(orphan.id.clone());
                continue;
            }

            let replacement = match record.lookup(&orphan.field) {
                Some(Bson::ObjectId(_)) => ObjectId::parse_str(fallback_org)
                    .map(Bson::ObjectId)
                    .unwrap_or_else(|_| Bson::String(fallback_org.to_string())),
                _ => Bson::String(fallback_org.to_string()),
            };
            record.fields.insert(orphan.field.clone(), replacement);
            self.store.set(collection, &record).await?;
            report.repaired.push(orphan.id.clone());
        }

        info!(
            target = %clearance.target(),
            collection,
            repaired = report.repaired.len(),
            skipped = report.skipped.len(),
            "orphan repair finished"
        );
        Ok(report)
    }
}
