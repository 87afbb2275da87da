//! Run with: cargo run --bin purge_api_keys
//!
//! Deletes every API-key document except those listed in
//! DOCSWEEP_PROTECTED_IDS. Refuses to run with an empty list.

use anyhow::{bail, Context};
use docsweep::config;
use docsweep::modules::api_key::model::ApiKeyDocument;
use docsweep::modules::crud::Model;
use docsweep::services::reconcile::ReconcilePlan;
use docsweep::services::rule::MembershipRule;
use docsweep::AppState;
use std::process;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    config::logging::init();

    if let Err(e) = run().await {
        eprintln!("❌ {:#}", e);
        process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    println!("Connecting to document store...");
    let state = AppState::connect().await.context("could not open a session")?;
    println!("✓ Connected to {} ({})", state.target(), state.source);

    let keep = &state.settings.protected_ids;
    if keep.is_empty() {
        bail!("DOCSWEEP_PROTECTED_IDS is empty; refusing to delete every API key");
    }

    println!("Keeping {} API-key document(s):", keep.len());
    for id in keep {
        println!("  - {}", id);
    }

    let plan = ReconcilePlan::new(
        ApiKeyDocument::COLLECTION,
        MembershipRule::protect_ids(keep.iter().cloned()),
    );
    let report = state.reconcile(plan).await?;

    println!("\n{}", report.summary());
    for id in &report.deleted_ids {
        println!("  ✓ deleted: {}", id);
    }
    for id in &report.failures {
        println!("  ✗ not deleted: {}", id);
    }
    report.ensure_complete()?;

    println!("\n✓ Purge complete!");
    Ok(())
}
