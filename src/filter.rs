//! Name filters and rename templates shared by the migration steps.

use anyhow::{Context, Result};
use regex::Regex;

/// Optional include and exclude patterns, matched with `find` semantics.
#[derive(Debug, Clone, Default)]
pub struct NameFilter {
    include: Option<Regex>,
    exclude: Option<Regex>,
}

/// Why a name was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    NotIncluded,
    Excluded,
}

impl NameFilter {
    pub fn new(include: Option<&str>, exclude: Option<&str>) -> Result<Self> {
        let compile = |pattern: Option<&str>, which: &str| -> Result<Option<Regex>> {
            pattern
                .filter(|p| !p.is_empty())
                .map(|p| {
                    Regex::new(p).with_context(|| format!("Invalid {} pattern: {}", which, p))
                })
                .transpose()
        };

        Ok(Self {
            include: compile(include, "include")?,
            exclude: compile(exclude, "exclude")?,
        })
    }

    /// `Ok(())` when the name passes, otherwise the reason it was rejected.
    pub fn check(&self, name: &str) -> std::result::Result<(), Rejection> {
        if let Some(include) = &self.include {
            if !include.is_match(name) {
                return Err(Rejection::NotIncluded);
            }
        }
        if let Some(exclude) = &self.exclude {
            if exclude.is_match(name) {
                return Err(Rejection::Excluded);
            }
        }
        Ok(())
    }

    pub fn allows(&self, name: &str) -> bool {
        self.check(name).is_ok()
    }
}

/// Destination name template; `{name}` is replaced by the source name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameTemplate(String);

impl RenameTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    pub fn render(&self, name: &str) -> String {
        self.0.replace("{name}", name)
    }
}

impl Default for RenameTemplate {
    fn default() -> Self {
        Self("{name}".to_string())
    }
}
