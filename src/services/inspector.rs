//! Read-only counterpart of reconciliation: prints records and reports
//! references that point at ids missing from their target collection.

use serde::Serialize;
use std::collections::HashSet;
use tracing::{info, warn};

use crate::error::SweepError;
use crate::store::{DocumentStore, Record};

pub const ORGANIZATIONS: &str = "organizations";
pub const ORGANIZATION_REF: &str = "organizationId";

#[derive(Debug, Clone)]
pub struct ReferenceCheck {
    pub field: String,
    pub target_collection: String,
}

impl ReferenceCheck {
    pub fn new(field: impl Into<String>, target_collection: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            target_collection: target_collection.into(),
        }
    }

    /// `organizationId` → `organizations`, the check every org-scoped
    /// collection needs.
    pub fn organization() -> Self {
        Self::new(ORGANIZATION_REF, ORGANIZATIONS)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Orphan {
    pub id: String,
    pub field: String,
    pub missing: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct InspectionReport {
    pub collection: String,
    pub lines: Vec<String>,
    pub orphans: Vec<Orphan>,
}

impl InspectionReport {
    pub fn scanned(&self) -> usize {
        self.lines.len()
    }
}

/// `id | field=value | ...`, with placeholders for missing fields.
pub fn project(record: &Record, fields: &[&str]) -> String {
    let mut line = record.id.clone();
    for field in fields {
        line.push_str(&format!(" | {}={}", field, record.display_field(field)));
    }
    line
}

/// Records whose reference is set but absent from `known`. ObjectId
/// references compare by hex form; strings compare as stored. Missing or
/// empty references are not orphans.
pub fn find_orphans(records: &[Record], check: &ReferenceCheck, known: &HashSet<String>) -> Vec<Orphan> {
    records
        .iter()
        .filter_map(|record| {
            let reference = record.ref_field(&check.field)?;
            if reference.is_empty() || known.contains(&reference) {
                return None;
            }
            Some(Orphan {
                id: record.id.clone(),
                field: check.field.clone(),
                missing: reference,
            })
        })
        .collect()
}

pub struct Inspector<'a, S: DocumentStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: DocumentStore + ?Sized> Inspector<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub async fn inspect(
        &self,
        collection: &str,
        fields: &[&str],
        reference: Option<&ReferenceCheck>,
    ) -> Result<InspectionReport, SweepError> {
        let records = self.store.fetch_all(collection).await?;
        let lines = records.iter().map(|r| project(r, fields)).collect();

        let orphans = match reference {
            Some(check) => {
                let known: HashSet<String> = if check.target_collection == collection {
                    records.iter().map(|r| r.id.clone()).collect()
                } else {
                    self.store
                        .fetch_all(&check.target_collection)
                        .await?
                        .into_iter()
                        .map(|r| r.id)
                        .collect()
                };
                find_orphans(&records, check, &known)
            }
            None => Vec::new(),
        };

        for orphan in &orphans {
            warn!(
                collection,
                id = %orphan.id,
                missing = %orphan.missing,
                "dangling {}", orphan.field
            );
        }
        info!(
            collection,
            scanned = records.len(),
            orphans = orphans.len(),
            "inspection finished"
        );

        Ok(InspectionReport {
            collection: collection.to_string(),
            lines,
            orphans,
        })
    }
}
