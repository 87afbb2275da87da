//! Run with: cargo run --bin user_admin
//!
//! USER_ADMIN_ACTION picks the operation:
//!   lookup | disable | set-password | reset-link | token | list
//! USER_ADMIN_EMAILS is a comma-separated list of target accounts.
//! `set-password` reads the new password from USER_ADMIN_NEW_PASSWORD.

use anyhow::{bail, Context};
use docsweep::config;
use docsweep::config::settings::parse_list;
use docsweep::services::accounts::{AccountLine, AccountOutcome, Accounts};
use docsweep::services::guard::ConfirmationPolicy;
use docsweep::AppState;
use std::env;
use std::process;

const DEFAULT_PAGE_SIZE: u32 = 1000;

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
    let action = env::var("USER_ADMIN_ACTION").unwrap_or_else(|_| "lookup".to_string());
    let emails = parse_list(&env::var("USER_ADMIN_EMAILS").unwrap_or_default());

    let state = AppState::connect().await.context("could not open a session")?;
    let identity = state.identity().context("identity service is not configured")?;
    let accounts = Accounts::new(&identity);
    println!("✓ Connected to {} ({})", state.target(), state.source);

    if action == "list" {
        let page_size = env::var("USER_ADMIN_PAGE_SIZE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_PAGE_SIZE);
        let users = accounts.list_all(page_size).await?;
        for user in &users {
            println!(
                "  {} | {} | disabled={}",
                user.uid,
                user.email.as_deref().unwrap_or("N/A"),
                user.disabled
            );
        }
        println!("\n✓ {} user(s)", users.len());
        return Ok(());
    }

    if emails.is_empty() {
        bail!("USER_ADMIN_EMAILS is empty");
    }

    let lines = match action.as_str() {
        "lookup" => accounts.lookup(&emails).await,
        "reset-link" => accounts.reset_links(&emails).await,
        "disable" => {
            let clearance = state.clearance(ConfirmationPolicy::ProductionOnly)?;
            accounts.disable(&emails, &clearance).await
        }
        "token" => {
            let clearance = state.clearance(ConfirmationPolicy::ProductionOnly)?;
            accounts.sign_in_tokens(&emails, &clearance).await
        }
        "set-password" => {
            let password = env::var("USER_ADMIN_NEW_PASSWORD")
                .context("USER_ADMIN_NEW_PASSWORD must be set")?;
            let clearance = state.clearance(ConfirmationPolicy::ProductionOnly)?;
            accounts.set_password(&emails, &password, &clearance).await?
        }
        other => bail!("unknown USER_ADMIN_ACTION `{}`", other),
    };

    report(&lines)
}

fn report(lines: &[AccountLine]) -> anyhow::Result<()> {
    for line in lines {
        println!("  {}", line);
    }

    let failed = lines
        .iter()
        .filter(|l| matches!(l.outcome, AccountOutcome::Failed(_)))
        .count();
    if failed > 0 {
        bail!("{} account operation(s) failed", failed);
    }

    println!("\n✓ Done ({} ok)", lines.iter().filter(|l| l.is_ok()).count());
    Ok(())
}
