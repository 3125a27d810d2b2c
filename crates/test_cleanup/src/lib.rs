//! Test container cleanup utilities.
//!
//! The container harness removes every container when its test finishes, but
//! a test process that is killed (CI timeout, Ctrl-C) never gets that far.
//! This crate finds containers left behind by such runs, using the naming
//! convention from `test_utils`, and removes them. It can be used both
//! programmatically and via CLI binaries.

use anyhow::{Context, Result};
use bollard::Docker;
use bollard::container::{ListContainersOptions, RemoveContainerOptions};
use bollard::models::ContainerSummary;
use chrono::{DateTime, TimeDelta, Utc};
use std::env;
use test_utils::{DEFAULT_NAME_PREFIX, NAME_PREFIX_ENV, is_harness_container, is_pr_container};
use tracing::{debug, error, info, warn};

/// Configuration for cleanup operations loaded from environment variables.
#[derive(Debug, Clone)]
pub struct CleanupConfig {
    /// Prefix the harness uses for container names
    pub name_prefix: String,
}

impl CleanupConfig {
    /// Load cleanup configuration from environment variables.
    ///
    /// Optional environment variables:
    /// - `CONTAINERS_NAME_PREFIX`: container name prefix (default: `itest`)
    pub fn from_env() -> Result<Self> {
        let name_prefix =
            env::var(NAME_PREFIX_ENV).unwrap_or_else(|_| DEFAULT_NAME_PREFIX.to_string());

        if !test_utils::is_valid_name_prefix(&name_prefix) {
            anyhow::bail!(
                "{} must start with a letter or digit and contain only [a-zA-Z0-9_.-], got '{}'",
                NAME_PREFIX_ENV,
                name_prefix
            );
        }

        Ok(Self { name_prefix })
    }
}

/// A container created by the harness, as reported by Docker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessContainer {
    pub id: String,
    /// Container name without Docker's leading `/`
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl HarnessContainer {
    /// Build from a Docker container summary.
    ///
    /// Returns `None` when the container has no id, no creation time, or no
    /// name carrying `prefix`.
    pub fn from_summary(prefix: &str, summary: &ContainerSummary) -> Option<Self> {
        let id = summary.id.clone()?;
        let created_at = DateTime::from_timestamp(summary.created?, 0)?;
        let name = summary
            .names
            .as_ref()?
            .iter()
            .find(|name| is_harness_container(prefix, name))?;

        Some(Self {
            id,
            name: name.trim_start_matches('/').to_string(),
            created_at,
        })
    }
}

/// Creation time before which a container counts as orphaned.
///
/// Fails when `max_age_hours` reaches past the range `chrono` can represent.
pub fn orphan_cutoff(now: DateTime<Utc>, max_age_hours: u64) -> Result<DateTime<Utc>> {
    i64::try_from(max_age_hours)
        .ok()
        .and_then(TimeDelta::try_hours)
        .and_then(|age| now.checked_sub_signed(age))
        .with_context(|| format!("max age of {} hours is out of range", max_age_hours))
}

/// Containers created before `cutoff`.
pub fn select_orphans(
    containers: &[HarnessContainer],
    cutoff: DateTime<Utc>,
) -> Vec<&HarnessContainer> {
    containers
        .iter()
        .filter(|c| c.created_at < cutoff)
        .collect()
}

/// Containers created under pull request `pr_number`, regardless of age.
pub fn select_pr_containers<'a>(
    prefix: &str,
    containers: &'a [HarnessContainer],
    pr_number: u32,
) -> Vec<&'a HarnessContainer> {
    containers
        .iter()
        .filter(|c| is_pr_container(prefix, &c.name, pr_number))
        .collect()
}

/// Container cleanup operations against the local Docker daemon.
pub struct ContainerCleanup {
    docker: Docker,
    name_prefix: String,
}

impl ContainerCleanup {
    /// Create a new cleanup instance.
    ///
    /// # Arguments
    ///
    /// * `docker` - Connected Docker client
    /// * `name_prefix` - Prefix of harness container names
    pub fn new(docker: Docker, name_prefix: String) -> Self {
        Self {
            docker,
            name_prefix,
        }
    }

    /// Connect to the local Docker daemon using `config`.
    pub fn connect(config: &CleanupConfig) -> Result<Self> {
        let docker =
            Docker::connect_with_local_defaults().context("Failed to connect to Docker daemon")?;
        Ok(Self::new(docker, config.name_prefix.clone()))
    }

    /// List all harness containers, running or not.
    pub async fn list_harness_containers(&self) -> Result<Vec<HarnessContainer>> {
        let summaries = self
            .docker
            .list_containers(Some(ListContainersOptions::<String> {
                all: true,
                ..Default::default()
            }))
            .await
            .map_err(|err| {
                error!(error = %err, "Failed to list containers");
                err
            })
            .context("Failed to list containers")?;

        let containers: Vec<HarnessContainer> = summaries
            .iter()
            .filter_map(|s| HarnessContainer::from_summary(&self.name_prefix, s))
            .collect();

        debug!(
            total = summaries.len(),
            harness = containers.len(),
            prefix = self.name_prefix,
            "Listed containers"
        );
        Ok(containers)
    }

    /// Find and remove orphaned harness containers.
    ///
    /// Removes containers whose name carries the harness prefix and that were
    /// created more than `max_age_hours` ago.
    pub async fn cleanup_orphaned_containers(&self, max_age_hours: u64) -> Result<Vec<String>> {
        info!(
            prefix = self.name_prefix,
            max_age_hours = max_age_hours,
            "Searching for orphaned test containers"
        );

        let cutoff_time = orphan_cutoff(Utc::now(), max_age_hours)?;
        let containers = self.list_harness_containers().await?;
        let orphans = select_orphans(&containers, cutoff_time);

        for container in containers.iter().filter(|c| c.created_at >= cutoff_time) {
            debug!(
                name = container.name,
                created_at = %container.created_at,
                "Container is too new, skipping"
            );
        }

        Ok(self.remove_all(orphans).await)
    }

    /// Find and remove harness containers created by a specific PR.
    ///
    /// # Arguments
    ///
    /// * `pr_number` - The PR number to clean up containers for
    pub async fn cleanup_pr_containers(&self, pr_number: u32) -> Result<Vec<String>> {
        info!(
            prefix = self.name_prefix,
            pr_number = pr_number,
            "Searching for test containers from PR {}",
            pr_number
        );

        let containers = self.list_harness_containers().await?;
        let targets = select_pr_containers(&self.name_prefix, &containers, pr_number);

        Ok(self.remove_all(targets).await)
    }

    /// Remove each container, skipping the ones that fail.
    async fn remove_all(&self, targets: Vec<&HarnessContainer>) -> Vec<String> {
        let mut removed = Vec::new();
        for container in targets {
            info!(
                name = container.name,
                created_at = %container.created_at,
                "Found test container, attempting removal"
            );
            if self.remove_container(container).await.is_ok() {
                removed.push(container.name.clone());
            }
        }

        info!(removed_count = removed.len(), "Cleanup completed");
        removed
    }

    async fn remove_container(&self, container: &HarnessContainer) -> Result<()> {
        match self
            .docker
            .remove_container(
                &container.id,
                Some(RemoveContainerOptions {
                    force: true,
                    ..Default::default()
                }),
            )
            .await
        {
            Ok(()) => {
                info!(name = container.name, "✓ Removed test container");
                Ok(())
            }
            Err(err) => {
                warn!(
                    name = container.name,
                    error = %err,
                    "Failed to remove test container - it may already be gone"
                );
                Err(err).context("Failed to remove container")
            }
        }
    }
}

/// Initialize logging for the cleanup binaries.
pub fn init_logging() {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
