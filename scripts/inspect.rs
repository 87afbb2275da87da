//! Run with: cargo run --bin inspect
//!
//! Read-only: lists organizations, users, API keys and website configs, and
//! flags documents whose `organizationId` points at a missing organization.

use anyhow::Context;
use docsweep::config;
use docsweep::services::inspector::{Inspector, ReferenceCheck, ORGANIZATIONS};
use docsweep::AppState;
use std::process;

const TARGETS: &[(&str, &[&str], bool)] = &[
    (ORGANIZATIONS, &["name", "status", "createdAt"], false),
    ("users", &["email", "displayName", "organizationId", "role"], true),
    ("api_keys", &["organizationId", "providers"], true),
    ("website_configs", &["organizationId", "siteName", "published"], true),
];

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

    let inspector = Inspector::new(&state.store);
    let org_check = ReferenceCheck::organization();
    let mut orphan_total = 0;

    for (collection, fields, check_refs) in TARGETS {
        let reference = check_refs.then_some(&org_check);
        let report = inspector
            .inspect(collection, fields, reference)
            .await
            .with_context(|| format!("inspecting `{}`", collection))?;

        println!("\n=== {} ({}) ===", collection, report.scanned());
        for line in &report.lines {
            println!("  {}", line);
        }
        for orphan in &report.orphans {
            println!(
                "  ⚠️  orphan {}: {}={} does not exist",
                orphan.id, orphan.field, orphan.missing
            );
        }
        orphan_total += report.orphans.len();
    }

    println!("\n✓ Inspection complete ({} orphan reference(s))", orphan_total);
    Ok(())
}
