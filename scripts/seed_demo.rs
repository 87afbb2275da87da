//! Run with: cargo run --bin seed_demo
//!
//! Writes a demo organization with users, API-key placeholders and a
//! website config. Always asks for DOCSWEEP_CONFIRM=<environment>:<project>,
//! in every environment.

use anyhow::Context;
use docsweep::config;
use docsweep::config::settings::parse_list;
use docsweep::services::guard::ConfirmationPolicy;
use docsweep::services::seed::{SeedPlan, Seeder};
use docsweep::AppState;
use std::env;
use std::process;

const DEFAULT_ORG_ID: &str = "demo-org";
const DEFAULT_ORG_NAME: &str = "Demo Org";
const DEFAULT_EMAILS: &str = "owner@demo.example,member@demo.example";

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
    let org_id = env::var("SEED_ORG_ID").unwrap_or_else(|_| DEFAULT_ORG_ID.to_string());
    let org_name = env::var("SEED_ORG_NAME").unwrap_or_else(|_| DEFAULT_ORG_NAME.to_string());
    let emails = parse_list(&env::var("SEED_USER_EMAILS").unwrap_or_else(|_| DEFAULT_EMAILS.to_string()));

    let plan = SeedPlan::demo(&org_id, &org_name, &emails);
    plan.validate().context("seed data is invalid")?;

    println!("Connecting to document store...");
    let state = AppState::connect().await.context("could not open a session")?;
    println!("✓ Connected to {} ({})", state.target(), state.source);

    let clearance = state.clearance(ConfirmationPolicy::Always)?;
    let report = Seeder::new(&state.store).seed(&plan, &clearance).await?;

    for (collection, id) in &report.written {
        println!("  ✓ {}/{}", collection, id);
    }
    println!("\n✓ Seeded {} document(s)", report.written.len());
    Ok(())
}
