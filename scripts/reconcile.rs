//! Run with: cargo run --bin reconcile
//!
//! Applies the plan named by DOCSWEEP_PLAN (default `reconcile-plan.json`):
//!
//! ```json
//! {
//!   "collection": "organizations",
//!   "rule": { "kind": "deny_pattern", "field": "name", "terms": ["Test"], "matching": "substring" },
//!   "protected": ["default-org"]
//! }
//! ```

use anyhow::Context;
use docsweep::config;
use docsweep::services::reconcile::{ReconcilePlan, ReconcileReport};
use docsweep::AppState;
use std::env;
use std::path::PathBuf;
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
    let path = PathBuf::from(
        env::var("DOCSWEEP_PLAN").unwrap_or_else(|_| "reconcile-plan.json".to_string()),
    );
    let plan = ReconcilePlan::from_json_file(&path)?;
    println!("Loaded plan for `{}` from {}", plan.collection, path.display());

    println!("Connecting to document store...");
    let state = AppState::connect().await.context("could not open a session")?;
    println!("✓ Connected to {} ({})", state.target(), state.source);

    let report = state.reconcile(plan).await?;
    print_report(&report);
    report.ensure_complete()?;

    println!("\n✓ Reconciliation complete!");
    Ok(())
}

fn print_report(report: &ReconcileReport) {
    println!("\n{}", report.summary());
    for id in &report.pending {
        println!("  would delete: {}", id);
    }
    for id in &report.deleted_ids {
        println!("  ✓ deleted: {}", id);
    }
    for id in &report.clamped {
        println!("  protected, kept: {}", id);
    }
    for id in &report.failures {
        println!("  ✗ not deleted: {}", id);
    }
}
