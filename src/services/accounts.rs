//! Per-user account operations. Each email is handled on its own: a user
//! that does not exist is reported on its line and the run continues.

use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use tracing::{info, warn};

use crate::error::SweepError;
use crate::services::guard::Clearance;
use crate::services::identity::{IdentityError, IdentityProvider, IdentityUser, UserUpdate};

/// The identity service rejects shorter passwords.
pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", content = "detail", rename_all = "snake_case")]
pub enum AccountOutcome {
    Done(String),
    NotFound,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountLine {
    pub email: String,
    pub outcome: AccountOutcome,
}

impl AccountLine {
    pub fn is_ok(&self) -> bool {
        matches!(self.outcome, AccountOutcome::Done(_))
    }
}

impl fmt::Display for AccountLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            AccountOutcome::Done(detail) => write!(f, "✓ {}: {}", self.email, detail),
            AccountOutcome::NotFound => write!(f, "- {}: not found", self.email),
            AccountOutcome::Failed(reason) => write!(f, "✗ {}: {}", self.email, reason),
        }
    }
}

fn describe(user: &IdentityUser) -> String {
    format!(
        "uid={} name={} disabled={} verified={}",
        user.uid,
        user.display_name.as_deref().unwrap_or("N/A"),
        user.disabled,
        user.email_verified
    )
}

pub struct Accounts<'a, P: IdentityProvider + ?Sized> {
    provider: &'a P,
}

impl<'a, P: IdentityProvider + ?Sized> Accounts<'a, P> {
    pub fn new(provider: &'a P) -> Self {
        Self { provider }
    }

    async fn for_each_user<F, Fut>(&self, emails: &[String], op: F) -> Vec<AccountLine>
    where
        F: Fn(String, IdentityUser) -> Fut,
        Fut: Future<Output = Result<String, IdentityError>>,
    {
        let mut lines = Vec::with_capacity(emails.len());

        for email in emails {
            let outcome = match self.provider.get_user_by_email(email).await {
                Ok(user) => match op(email.clone(), user).await {
                    Ok(detail) => AccountOutcome::Done(detail),
                    Err(e) => {
                        warn!(email = %email, error = %e, "account operation failed");
                        AccountOutcome::Failed(e.to_string())
                    }
                },
                Err(IdentityError::UserNotFound(_)) => {
                    info!(email = %email, "user not found");
                    AccountOutcome::NotFound
                }
                Err(e) => {
                    warn!(email = %email, error = %e, "lookup failed");
                    AccountOutcome::Failed(e.to_string())
                }
            };
            lines.push(AccountLine {
                email: email.clone(),
                outcome,
            });
        }

        lines
    }

    pub async fn lookup(&self, emails: &[String]) -> Vec<AccountLine> {
        self.for_each_user(emails, |_, user| async move {
            Ok::<_, IdentityError>(describe(&user))
        })
        .await
    }

    pub async fn disable(&self, emails: &[String], clearance: &Clearance) -> Vec<AccountLine> {
        info!(target = %clearance.target(), users = emails.len(), "disabling users");
        let provider = self.provider;
        let update = UserUpdate {
            disabled: Some(true),
            ..Default::default()
        };
        let update = &update;

        self.for_each_user(emails, |_, user| async move {
            provider.update_user(&user.uid, update).await?;
            Ok::<_, IdentityError>(format!("disabled uid={}", user.uid))
        })
        .await
    }

    /// Sets the same password on every listed account. The password is
    /// supplied by the caller, never stored in source.
    pub async fn set_password(
        &self,
        emails: &[String],
        password: &str,
        clearance: &Clearance,
    ) -> Result<Vec<AccountLine>, SweepError> {
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(SweepError::Config(format!(
                "password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        info!(target = %clearance.target(), users = emails.len(), "resetting passwords");
        let provider = self.provider;
        let update = UserUpdate {
            password: Some(password.to_string()),
            ..Default::default()
        };
        let update = &update;

        Ok(self
            .for_each_user(emails, |_, user| async move {
                provider.update_user(&user.uid, update).await?;
                Ok::<_, IdentityError>(format!("password updated for uid={}", user.uid))
            })
            .await)
    }

    pub async fn reset_links(&self, emails: &[String]) -> Vec<AccountLine> {
        let provider = self.provider;
        self.for_each_user(emails, |email, _| async move {
            provider.password_reset_link(&email).await
        })
        .await
    }

    /// Mints sign-in tokens. Tokens grant access, so they go through the
    /// guard like writes do.
    pub async fn sign_in_tokens(&self, emails: &[String], clearance: &Clearance) -> Vec<AccountLine> {
        info!(target = %clearance.target(), users = emails.len(), "minting sign-in tokens");
        let provider = self.provider;
        self.for_each_user(emails, |_, user| async move {
            provider.create_custom_token(&user.uid).await
        })
        .await
    }

    /// Follows page tokens until the listing is exhausted. A token the
    /// service already handed out ends the listing.
    pub async fn list_all(&self, page_size: u32) -> Result<Vec<IdentityUser>, SweepError> {
        let mut users = Vec::new();
        let mut seen = HashSet::new();
        let mut token: Option<String> = None;

        loop {
            let page = self.provider.list_users(page_size, token.as_deref()).await?;
            users.extend(page.users);
            match page.next_page_token {
                Some(next) if seen.insert(next.clone()) => token = Some(next),
                Some(next) => {
                    warn!(token = %next, "page token repeated; stopping listing");
                    break;
                }
                None => break,
            }
        }

        Ok(users)
    }
}
