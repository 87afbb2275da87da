//! Run with: cargo run --bin repair_orphans
//!
//! Re-points users, API keys and website configs whose organization no
//! longer exists at DOCSWEEP_FALLBACK_ORG_ID.

use anyhow::Context;
use docsweep::config;
use docsweep::services::guard::ConfirmationPolicy;
use docsweep::services::inspector::{Inspector, ReferenceCheck};
use docsweep::services::repair::Repairer;
use docsweep::AppState;
use std::env;
use std::process;

const ORG_SCOPED: &[&str] = &["users", "api_keys", "website_configs"];

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
    let fallback = env::var("DOCSWEEP_FALLBACK_ORG_ID")
        .context("DOCSWEEP_FALLBACK_ORG_ID must name an existing organization")?;

    println!("Connecting to document store...");
    let state = AppState::connect().await.context("could not open a session")?;
    println!("✓ Connected to {} ({})", state.target(), state.source);

    let inspector = Inspector::new(&state.store);
    let check = ReferenceCheck::organization();

    let mut inspections = Vec::new();
    for collection in ORG_SCOPED {
        let inspection = inspector.inspect(collection, &[], Some(&check)).await?;
        println!("{}: {} orphan(s)", collection, inspection.orphans.len());
        for orphan in &inspection.orphans {
            println!("  {} → {} (was {})", orphan.id, fallback, orphan.missing);
        }
        if !inspection.orphans.is_empty() {
            inspections.push(inspection);
        }
    }

    if inspections.is_empty() || state.settings.dry_run {
        println!("\n✓ Nothing repaired");
        return Ok(());
    }

    let clearance = state.clearance(ConfirmationPolicy::ProductionOnly)?;
    let repairer = Repairer::new(&state.store);
    for inspection in &inspections {
        let report = repairer
            .reassign_orphans(inspection, &fallback, &clearance)
            .await?;
        println!(
            "✓ {}: repaired {}, skipped {}",
            report.collection,
            report.repaired.len(),
            report.skipped.len()
        );
        for id in &report.skipped {
            println!("  - {} skipped (changed since inspection)", id);
        }
    }

    println!("\n✓ Repair complete!");
    Ok(())
}
