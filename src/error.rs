use thiserror::Error;

use crate::services::identity::IdentityError;
use crate::store::StoreError;

/// Failures surfaced to a script's outermost boundary.
///
/// A rule trying to delete a protected id is not represented here: that case
/// is clamped to "keep" and listed in the report instead.
#[derive(Error, Debug)]
pub enum SweepError {
    #[error("Connection failed: {0}")]
    Connection(String),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Record not found: {collection}/{id}")]
    RecordNotFound { collection: String, id: String },
    #[error("{failed} record(s) in `{collection}` were not deleted (rejected batches: {batches:?})")]
    PartialBatchFailure {
        collection: String,
        failed: usize,
        batches: Vec<usize>,
    },
    #[error("Target {target} needs confirmation: set DOCSWEEP_CONFIRM={target}")]
    ConfirmationRequired { target: String },
    #[error("Confirmation `{given}` does not match target `{expected}`")]
    ConfirmationMismatch { expected: String, given: String },
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Identity service error: {0}")]
    Identity(#[from] IdentityError),
    #[error("Validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<bson::ser::Error> for SweepError {
    fn from(e: bson::ser::Error) -> Self {
        SweepError::Serialization(e.to_string())
    }
}

impl From<bson::de::Error> for SweepError {
    fn from(e: bson::de::Error) -> Self {
        SweepError::Serialization(e.to_string())
    }
}
