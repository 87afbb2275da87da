use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::warn;

use crate::store::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Matching {
    #[default]
    Exact,
    Substring,
}

/// Decides, per record and without cross-record state, whether it stays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MembershipRule {
    /// Keep exactly these ids.
    AllowList { ids: BTreeSet<String> },
    /// Delete records whose `field` (the id when `None`) matches any term.
    DenyPattern {
        #[serde(default)]
        field: Option<String>,
        terms: Vec<String>,
        #[serde(default)]
        matching: Matching,
    },
    /// Keep these ids and treat them as protected; delete everything else.
    ProtectedSet { ids: BTreeSet<String> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Keep,
    Delete,
}

fn collect_ids<I, S>(ids: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    ids.into_iter().map(Into::into).collect()
}

impl MembershipRule {
    pub fn allow_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        MembershipRule::AllowList {
            ids: collect_ids(ids),
        }
    }

    pub fn protect_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        MembershipRule::ProtectedSet {
            ids: collect_ids(ids),
        }
    }

    pub fn deny_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        MembershipRule::DenyPattern {
            field: None,
            terms: ids.into_iter().map(Into::into).collect(),
            matching: Matching::Exact,
        }
    }

    pub fn deny_field_containing<I, S>(field: &str, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        MembershipRule::DenyPattern {
            field: Some(field.to_string()),
            terms: terms.into_iter().map(Into::into).collect(),
            matching: Matching::Substring,
        }
    }

    pub fn deny_name_containing<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::deny_field_containing("name", terms)
    }

    pub fn evaluate(&self, record: &Record) -> Verdict {
        match self {
            MembershipRule::AllowList { ids } | MembershipRule::ProtectedSet { ids } => {
                if ids.contains(&record.id) {
                    Verdict::Keep
                } else {
                    Verdict::Delete
                }
            }
            MembershipRule::DenyPattern {
                field,
                terms,
                matching,
            } => {
                let subject = match field {
                    Some(path) => match record.str_field(path) {
                        Some(value) => value,
                        None => return Verdict::Keep,
                    },
                    None => record.id.as_str(),
                };

                // An empty term would match every record in substring mode.
                let hit = terms.iter().filter(|t| !t.is_empty()).any(|term| match matching {
                    Matching::Exact => subject == term,
                    Matching::Substring => subject.contains(term.as_str()),
                });

                if hit {
                    Verdict::Delete
                } else {
                    Verdict::Keep
                }
            }
        }
    }

    /// Ids the rule itself declares untouchable.
    pub fn protected_ids(&self) -> impl Iterator<Item = &String> {
        let ids = match self {
            MembershipRule::ProtectedSet { ids } => Some(ids),
            _ => None,
        };
        ids.into_iter().flatten()
    }
}

#[derive(Debug, Default)]
pub struct Partition {
    pub keep: Vec<Record>,
    pub delete: Vec<Record>,
    /// Ids the rule marked for deletion but the protected set kept.
    pub clamped: Vec<String>,
}

/// Splits `records` into keep and delete. Every record lands in exactly one
/// side, and nothing in `protected` lands in `delete`.
pub fn partition(
    records: Vec<Record>,
    rule: &MembershipRule,
    protected: &BTreeSet<String>,
) -> Partition {
    let mut result = Partition::default();

    for record in records {
        match rule.evaluate(&record) {
            Verdict::Delete if protected.contains(&record.id) => {
                warn!(id = %record.id, "rule matched a protected id; keeping it");
                result.clamped.push(record.id.clone());
                result.keep.push(record);
            }
            Verdict::Delete => result.delete.push(record),
            Verdict::Keep => result.keep.push(record),
        }
    }

    result
}
