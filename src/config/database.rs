use bson::doc;
use mongodb::{Client, Database};
use tracing::info;

use crate::config::credentials::Credentials;
use crate::error::SweepError;

/// Opens the session and pings it, so a bad URI or unreachable server fails
/// here rather than halfway through a run.
pub async fn connect(credentials: &Credentials) -> Result<Database, SweepError> {
    let client = Client::with_uri_str(&credentials.mongodb_uri)
        .await
        .map_err(|e| SweepError::Connection(e.to_string()))?;

    let db = client.database(&credentials.database);
    db.run_command(doc! { "ping": 1 }).await.map_err(|e| {
        SweepError::Connection(format!("ping to `{}` failed: {}", credentials.database, e))
    })?;

    info!(
        database = %credentials.database,
        project = %credentials.project_id,
        "connected to document store"
    );
    Ok(db)
}
