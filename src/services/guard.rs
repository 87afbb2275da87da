//! Production guard.
//!
//! Every library operation that writes to the store or the identity service
//! takes a [`Clearance`], and the only way to obtain one is
//! [`ProductionGuard::authorize`]. Production targets need a structured
//! `<environment>:<project_id>` confirmation; seeding needs one everywhere.

use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::io::{self, BufRead, IsTerminal, Write};
use std::str::FromStr;
use tracing::{info, warn};

use crate::config::settings::Settings;
use crate::error::SweepError;

pub const CONFIRM_VAR: &str = "DOCSWEEP_CONFIRM";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "staging" | "stage" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(format!("unknown environment `{}`", other)),
        }
    }
}

/// The project a run writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub project_id: String,
    pub environment: Environment,
}

impl Target {
    pub fn new(project_id: impl Into<String>, environment: Environment) -> Self {
        Self {
            project_id: project_id.into(),
            environment,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.environment, self.project_id)
    }
}

/// Operator statement naming the environment and project being written to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    pub environment: Environment,
    pub project_id: String,
}

impl FromStr for Confirmation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (environment, project_id) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| "expected `<environment>:<project_id>`".to_string())?;
        let project_id = project_id.trim();
        if project_id.is_empty() {
            return Err("project id is empty".to_string());
        }
        Ok(Self {
            environment: environment.parse()?,
            project_id: project_id.to_string(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationPolicy {
    ProductionOnly,
    Always,
}

/// Issued by [`ProductionGuard`]; mutating operations require one.
#[derive(Debug, Clone)]
pub struct Clearance {
    target: Target,
    confirmed: bool,
}

impl Clearance {
    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Whether an operator confirmation was checked, as opposed to the
    /// target simply not needing one.
    pub fn is_confirmed(&self) -> bool {
        self.confirmed
    }
}

#[derive(Debug, Clone)]
pub struct ProductionGuard {
    patterns: Vec<String>,
}

impl ProductionGuard {
    pub fn new(patterns: Vec<String>) -> Self {
        Self {
            patterns: patterns
                .into_iter()
                .map(|p| p.trim().to_ascii_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.production_patterns.clone())
    }

    fn project_looks_like_production(&self, project_id: &str) -> bool {
        let project_id = project_id.to_ascii_lowercase();
        self.patterns.iter().any(|p| project_id.contains(p.as_str()))
    }

    pub fn is_production(&self, target: &Target) -> bool {
        target.environment == Environment::Production
            || self.project_looks_like_production(&target.project_id)
    }

    /// The environment a confirmation must name. A project id matching a
    /// production pattern counts as production whatever the settings say.
    pub fn effective_environment(&self, target: &Target) -> Environment {
        if self.is_production(target) {
            Environment::Production
        } else {
            target.environment
        }
    }

    pub fn requires_confirmation(&self, target: &Target, policy: ConfirmationPolicy) -> bool {
        match policy {
            ConfirmationPolicy::Always => true,
            ConfirmationPolicy::ProductionOnly => self.is_production(target),
        }
    }

    pub fn authorize(
        &self,
        target: &Target,
        policy: ConfirmationPolicy,
        confirmation: Option<&Confirmation>,
    ) -> Result<Clearance, SweepError> {
        let expected = Target::new(target.project_id.clone(), self.effective_environment(target));

        if expected.environment != target.environment {
            warn!(
                project = %target.project_id,
                configured = %target.environment,
                "project id matches a production pattern; treating target as production"
            );
        }

        if !self.requires_confirmation(target, policy) {
            return Ok(Clearance {
                target: expected,
                confirmed: false,
            });
        }

        let confirmation = confirmation.ok_or_else(|| SweepError::ConfirmationRequired {
            target: expected.to_string(),
        })?;

        if confirmation.environment != expected.environment
            || confirmation.project_id != expected.project_id
        {
            return Err(SweepError::ConfirmationMismatch {
                expected: expected.to_string(),
                given: format!("{}:{}", confirmation.environment, confirmation.project_id),
            });
        }

        info!(target = %expected, "write access confirmed");
        Ok(Clearance {
            target: expected,
            confirmed: true,
        })
    }

    /// Like [`authorize`](Self::authorize), sourcing the confirmation from
    /// `DOCSWEEP_CONFIRM` or, on a terminal, from a typed prompt. Nothing is
    /// asked when the policy does not need it.
    pub fn authorize_interactive(
        &self,
        target: &Target,
        policy: ConfirmationPolicy,
    ) -> Result<Clearance, SweepError> {
        if !self.requires_confirmation(target, policy) {
            return self.authorize(target, policy, None);
        }

        let expected = Target::new(target.project_id.clone(), self.effective_environment(target));
        let raw = match env::var(CONFIRM_VAR) {
            Ok(raw) => Some(raw),
            Err(_) => prompt(&expected)?,
        };

        let confirmation = raw
            .map(|raw| {
                raw.parse::<Confirmation>()
                    .map_err(|_| SweepError::ConfirmationMismatch {
                        expected: expected.to_string(),
                        given: raw.trim().to_string(),
                    })
            })
            .transpose()?;

        self.authorize(target, policy, confirmation.as_ref())
    }
}

fn prompt(expected: &Target) -> Result<Option<String>, SweepError> {
    if !io::stdin().is_terminal() {
        return Ok(None);
    }

    print!(
        "⚠️  This run writes to {}. Type `{}` to continue: ",
        expected.project_id, expected
    );
    io::stdout()
        .flush()
        .map_err(|e| SweepError::Config(e.to_string()))?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|e| SweepError::Config(e.to_string()))?;

    let line = line.trim();
    Ok((!line.is_empty()).then(|| line.to_string()))
}
