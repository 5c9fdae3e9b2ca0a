//! Section order: an explicit render parameter rather than a hard-coded sequence.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::resume::SectionKey;

/// Order of the built-in sections. Custom sections always follow, in data order.
///
/// Always a permutation of all seven keys: construction appends any key the caller
/// left out, in default order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionOrder(Vec<SectionKey>);

impl Default for SectionOrder {
    /// Summary, Experience, Education, Achievements, Projects, Skills, Languages.
    fn default() -> Self {
        Self(SectionKey::ALL.to_vec())
    }
}

impl SectionOrder {
    /// Builds an order from a prefix of keys. Duplicates are rejected.
    pub fn new(keys: Vec<SectionKey>) -> Result<Self, AppError> {
        let mut ordered: Vec<SectionKey> = Vec::with_capacity(SectionKey::ALL.len());
        for key in keys {
            if ordered.contains(&key) {
                return Err(AppError::Validation(format!(
                    "Section '{key}' appears more than once in the section order"
                )));
            }
            ordered.push(key);
        }
        for key in SectionKey::ALL {
            if !ordered.contains(&key) {
                ordered.push(key);
            }
        }
        Ok(Self(ordered))
    }

    pub fn keys(&self) -> &[SectionKey] {
        &self.0
    }
}

impl FromStr for SectionOrder {
    type Err = AppError;

    /// Parses a comma-separated list such as `"summary,experience,projects"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let keys = s
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(SectionKey::from_str)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(keys)
    }
}

impl fmt::Display for SectionOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.0.iter().map(SectionKey::as_str).collect();
        f.write_str(&names.join(","))
    }
}
