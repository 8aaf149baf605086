//! Repository ignore list
//!
//! Matching is by exact repository name. The owning organization is not
//! considered, so `acme/scratch` and `other/scratch` are ignored together.

use std::collections::HashSet;

use crate::config::Config;

/// Set of repository names excluded from mirroring
#[derive(Debug, Clone, Default)]
pub struct IgnoreList {
    names: HashSet<String>,
}

impl IgnoreList {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.ignored_names())
    }

    /// Whether a repository named `repo` is excluded, whatever its owner
    pub fn is_ignored(&self, repo: &str) -> bool {
        self.names.contains(repo)
    }
}
