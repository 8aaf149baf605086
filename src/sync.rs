//! Sync Engine - Recreates push mirrors repository by repository
//!
//! Discovery finishes before the first write. Each confirmed repository then
//! has all of its push mirrors deleted, in listing order, followed by one new
//! mirror per configured destination, in configuration order. The first
//! failure aborts the run; changes already applied are kept.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::config::Config;
use crate::discovery::{Discovery, RepoDescriptor};
use crate::filter::IgnoreList;
use crate::gitea::{CreatePushMirror, GiteaClient};
use crate::prompt::Confirmer;

/// What happened to a single repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoOutcome {
    /// The operator declined
    Skipped { repo: String },
    /// Old mirrors deleted and new ones created
    Synced {
        repo: String,
        deleted: usize,
        created: usize,
    },
    /// Dry run: what a real run would do
    Planned {
        repo: String,
        would_delete: Vec<String>,
        would_create: Vec<String>,
    },
}

/// Results from a complete sync run
#[derive(Debug, Clone)]
pub struct SyncSummary {
    pub total_repositories: usize,
    pub synced: usize,
    pub skipped: usize,
    pub planned: usize,
    pub mirrors_deleted: usize,
    pub mirrors_created: usize,
    pub duration: Duration,
    pub results: Vec<RepoOutcome>,
}

impl SyncSummary {
    fn compile(results: Vec<RepoOutcome>, duration: Duration) -> Self {
        let mut summary = Self {
            total_repositories: results.len(),
            synced: 0,
            skipped: 0,
            planned: 0,
            mirrors_deleted: 0,
            mirrors_created: 0,
            duration,
            results: Vec::new(),
        };

        for outcome in &results {
            match outcome {
                RepoOutcome::Skipped { .. } => summary.skipped += 1,
                RepoOutcome::Synced {
                    deleted, created, ..
                } => {
                    summary.synced += 1;
                    summary.mirrors_deleted += deleted;
                    summary.mirrors_created += created;
                }
                RepoOutcome::Planned { .. } => summary.planned += 1,
            }
        }

        summary.results = results;
        summary
    }

    /// One-line totals for the end of a run
    pub fn report(&self, dry_run: bool) -> String {
        if dry_run {
            format!(
                "Dry run completed in {:.2}s: {} repositories would be synced",
                self.duration.as_secs_f64(),
                self.planned
            )
        } else {
            format!(
                "Sync completed in {:.2}s: {} synced, {} skipped, {} mirrors deleted, {} mirrors created",
                self.duration.as_secs_f64(),
                self.synced,
                self.skipped,
                self.mirrors_deleted,
                self.mirrors_created
            )
        }
    }
}

/// Run options
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// Report what would change without prompting or writing
    pub dry_run: bool,
    /// Only walk this organization
    pub org: Option<String>,
}

/// The engine that replaces push mirrors
pub struct SyncEngine<'a> {
    config: &'a Config,
    client: GiteaClient,
    ignore: IgnoreList,
}

impl<'a> SyncEngine<'a> {
    /// Create a new sync engine with the given configuration
    pub fn new(config: &'a Config) -> Result<Self> {
        let client = GiteaClient::new(config).context("Failed to create Gitea client")?;
        Ok(Self {
            config,
            client,
            ignore: IgnoreList::from_config(config),
        })
    }

    /// List the repositories a run would touch
    pub async fn discover(&self, org: Option<String>) -> Result<Vec<RepoDescriptor>> {
        Discovery::new(&self.client, &self.ignore)
            .with_org(org)
            .discover()
            .await
    }

    /// Run a complete sync: discover, then confirm and apply per repository
    pub async fn run(
        &self,
        options: &SyncOptions,
        confirmer: &mut dyn Confirmer,
    ) -> Result<SyncSummary> {
        let start_time = Instant::now();

        info!("Listing repositories on {}", self.client.api_url());
        let repos = self.discover(options.org.clone()).await?;

        let mut results = Vec::with_capacity(repos.len());
        for repo in &repos {
            let outcome = if options.dry_run {
                self.plan_repository(repo)
            } else {
                self.sync_repository(repo, confirmer).await?
            };
            results.push(outcome);
        }

        let summary = SyncSummary::compile(results, start_time.elapsed());
        info!("{}", summary.report(options.dry_run));

        Ok(summary)
    }

    /// Confirm, then replace the push mirrors of one repository
    pub async fn sync_repository(
        &self,
        repo: &RepoDescriptor,
        confirmer: &mut dyn Confirmer,
    ) -> Result<RepoOutcome> {
        let full_name = repo.full_name();

        if !confirmer.confirm(repo)? {
            info!("Skipping {}", full_name);
            return Ok(RepoOutcome::Skipped { repo: full_name });
        }

        for mirror in &repo.mirrors {
            info!("Deleting push mirror {} of {}", mirror, full_name);
            self.client
                .delete_push_mirror(&repo.owner, &repo.name, mirror)
                .await
                .with_context(|| format!("Failed to delete push mirror {} of {}", mirror, full_name))?;
        }

        for server in &self.config.remote_git_servers {
            let mirror = CreatePushMirror::new(server, &repo.owner, &repo.name);
            info!("Creating push mirror {} -> {}", full_name, mirror.remote_address);

            let reply = self
                .client
                .create_push_mirror(&repo.owner, &repo.name, &mirror)
                .await
                .with_context(|| {
                    format!(
                        "Failed to create push mirror {} -> {}",
                        full_name, mirror.remote_address
                    )
                })?;
            debug!("Gitea replied: {:?}", reply);
        }

        Ok(RepoOutcome::Synced {
            repo: full_name,
            deleted: repo.mirrors.len(),
            created: self.config.remote_git_servers.len(),
        })
    }

    /// Describe what `sync_repository` would do, without doing it
    pub fn plan_repository(&self, repo: &RepoDescriptor) -> RepoOutcome {
        let would_create: Vec<String> = self
            .config
            .remote_git_servers
            .iter()
            .map(|server| server.remote_address(&repo.owner, &repo.name))
            .collect();

        info!(
            "[dry-run] {}: delete {:?}, create {:?}",
            repo.full_name(),
            repo.mirrors,
            would_create
        );

        RepoOutcome::Planned {
            repo: repo.full_name(),
            would_delete: repo.mirrors.clone(),
            would_create,
        }
    }
}
