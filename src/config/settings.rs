use std::collections::BTreeSet;
use std::env;
use std::path::PathBuf;

use crate::error::SweepError;
use crate::services::guard::Environment;
use crate::store::MAX_BATCH_SIZE;

/// Key files tried, in order, after `DOCSWEEP_KEY_FILE`.
pub const DEFAULT_KEY_FILES: &[&str] = &["docsweep-key.json", ".docsweep/key.json"];

pub const DEFAULT_PRODUCTION_PATTERN: &str = "prod";

/// Non-secret run settings. Secrets live in [`super::credentials`].
#[derive(Debug, Clone)]
pub struct Settings {
    pub environment: Environment,
    pub batch_limit: usize,
    pub dry_run: bool,
    pub protected_ids: BTreeSet<String>,
    pub production_patterns: Vec<String>,
    pub key_files: Vec<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            environment: Environment::Development,
            batch_limit: MAX_BATCH_SIZE,
            dry_run: false,
            protected_ids: BTreeSet::new(),
            production_patterns: vec![DEFAULT_PRODUCTION_PATTERN.to_string()],
            key_files: DEFAULT_KEY_FILES.iter().map(PathBuf::from).collect(),
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, SweepError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, SweepError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Settings::default();

        if let Some(raw) = lookup("DOCSWEEP_ENVIRONMENT") {
            settings.environment = raw
                .parse()
                .map_err(|e: String| SweepError::Config(format!("DOCSWEEP_ENVIRONMENT: {}", e)))?;
        }

        if let Some(raw) = lookup("DOCSWEEP_BATCH_LIMIT") {
            let limit: usize = raw.trim().parse().map_err(|_| {
                SweepError::Config(format!("DOCSWEEP_BATCH_LIMIT `{}` is not a number", raw))
            })?;
            if limit == 0 || limit > MAX_BATCH_SIZE {
                return Err(SweepError::Config(format!(
                    "DOCSWEEP_BATCH_LIMIT must be between 1 and {}, got {}",
                    MAX_BATCH_SIZE, limit
                )));
            }
            settings.batch_limit = limit;
        }

        if let Some(raw) = lookup("DOCSWEEP_DRY_RUN") {
            settings.dry_run = parse_flag("DOCSWEEP_DRY_RUN", &raw)?;
        }

        if let Some(raw) = lookup("DOCSWEEP_PROTECTED_IDS") {
            settings.protected_ids = parse_list(&raw).into_iter().collect();
        }

        if let Some(raw) = lookup("DOCSWEEP_PRODUCTION_PATTERNS") {
            let patterns = parse_list(&raw);
            if !patterns.is_empty() {
                settings.production_patterns = patterns;
            }
        }

        if let Some(path) = lookup("DOCSWEEP_KEY_FILE").filter(|p| !p.trim().is_empty()) {
            settings.key_files.insert(0, PathBuf::from(path.trim()));
        }

        Ok(settings)
    }
}

/// Unrecognized values are an error, so a typo never turns a rehearsal into
/// a real run.
fn parse_flag(name: &str, raw: &str) -> Result<bool, SweepError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(SweepError::Config(format!(
            "{} must be one of 1/true/yes/on or 0/false/no/off, got `{}`",
            name, other
        ))),
    }
}

pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
