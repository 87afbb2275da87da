//! Run with: cargo run --bin cleanup_test_orgs
//!
//! Deletes organizations whose name contains a test marker. Ids listed in
//! DOCSWEEP_PROTECTED_IDS survive regardless.

use anyhow::Context;
use docsweep::config;
use docsweep::services::inspector::ORGANIZATIONS;
use docsweep::services::reconcile::ReconcilePlan;
use docsweep::services::rule::MembershipRule;
use docsweep::AppState;
use std::process;

const TEST_NAME_MARKERS: &[&str] = &["Test"];

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

    let plan = ReconcilePlan::new(
        ORGANIZATIONS,
        MembershipRule::deny_name_containing(TEST_NAME_MARKERS.iter().copied()),
    );

    println!("Removing organizations named like {:?}...", TEST_NAME_MARKERS);
    let report = state.reconcile(plan).await?;

    println!("\n{}", report.summary());
    for id in &report.pending {
        println!("  would delete: {}", id);
    }
    for id in &report.deleted_ids {
        println!("  ✓ deleted: {}", id);
    }
    for id in &report.failures {
        println!("  ✗ not deleted: {}", id);
    }
    report.ensure_complete()?;

    println!("\n✓ Cleanup complete!");
    Ok(())
}
