//! Repository discovery
//!
//! Walks the forge's organization → repository → push mirror hierarchy and
//! returns the complete working set before anything is modified.

use anyhow::{Context, Result};
use futures::TryStreamExt;
use tracing::{debug, info, warn};

use crate::filter::IgnoreList;
use crate::gitea::GiteaClient;

/// A repository selected for mirroring, with its current push mirrors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoDescriptor {
    /// Repository name (e.g., "core")
    pub name: String,

    /// Owning organization (e.g., "acme")
    pub owner: String,

    /// Remote names of the push mirrors registered right now
    pub mirrors: Vec<String>,
}

impl RepoDescriptor {
    /// Get display name (owner/name format)
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

/// Discovery of repositories eligible for mirroring
pub struct Discovery<'a> {
    client: &'a GiteaClient,
    ignore: &'a IgnoreList,
    org: Option<String>,
}

impl<'a> Discovery<'a> {
    pub fn new(client: &'a GiteaClient, ignore: &'a IgnoreList) -> Self {
        Self {
            client,
            ignore,
            org: None,
        }
    }

    /// Only walk the given organization
    pub fn with_org(mut self, org: Option<String>) -> Self {
        self.org = org;
        self
    }

    /// Organizations to walk
    async fn organizations(&self) -> Result<Vec<String>> {
        let orgs: Vec<String> = self
            .client
            .organizations()
            .try_collect()
            .await
            .context("Failed to list organizations")?;

        match &self.org {
            Some(wanted) => {
                let selected: Vec<String> = orgs.into_iter().filter(|org| org == wanted).collect();
                if selected.is_empty() {
                    warn!("Organization {} not found", wanted);
                }
                Ok(selected)
            }
            None => Ok(orgs),
        }
    }

    /// Walk every organization and collect the repositories to mirror
    ///
    /// The result is fully materialized; no write happens while listing.
    pub async fn discover(&self) -> Result<Vec<RepoDescriptor>> {
        let organizations = self.organizations().await?;
        info!("Found {} organizations", organizations.len());

        let mut repos = Vec::new();

        for owner in organizations {
            let names: Vec<String> = self
                .client
                .org_repositories(&owner)
                .try_filter(|name| {
                    let ignored = self.ignore.is_ignored(name);
                    if ignored {
                        debug!("Ignoring repository {}/{}", owner, name);
                    }
                    futures::future::ready(!ignored)
                })
                .try_collect()
                .await
                .with_context(|| format!("Failed to list repositories of {}", owner))?;

            for name in names {
                let mirrors: Vec<String> = self
                    .client
                    .push_mirrors(&owner, &name)
                    .try_collect()
                    .await
                    .with_context(|| format!("Failed to list push mirrors of {}/{}", owner, name))?;

                debug!("{}/{} has {} push mirrors", owner, name, mirrors.len());

                repos.push(RepoDescriptor {
                    name,
                    owner: owner.clone(),
                    mirrors,
                });
            }
        }

        info!("Found {} repositories to mirror", repos.len());
        Ok(repos)
    }
}
