//! Cleanup test containers created by a specific PR.
//!
//! This binary removes harness containers created during a specific pull
//! request's CI runs. It's designed to be run from GitHub Actions when a PR is
//! closed or merged, on runners that keep their Docker state between jobs.
//!
//! Usage:
//!   cleanup-pr <pr_number>
//!
//! Environment variables:
//! - CONTAINERS_NAME_PREFIX: container name prefix (default: "itest")

use anyhow::Context;
use std::env;
use test_cleanup::{CleanupConfig, ContainerCleanup};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    test_cleanup::init_logging();

    let pr_number: u32 = env::args()
        .nth(1)
        .context("Usage: cleanup-pr <pr_number>")?
        .parse()
        .context("pr_number must be a positive integer")?;

    println!("🧹 PR-Based Test Container Cleanup");
    println!("==================================");
    println!();

    let config = CleanupConfig::from_env()?;

    println!("📋 Configuration:");
    println!("   Name prefix: {}", config.name_prefix);
    println!("   PR Number: #{}", pr_number);
    println!();

    let cleanup = ContainerCleanup::connect(&config)?;

    println!("🔍 Searching for containers from PR #{}...", pr_number);
    let removed = cleanup.cleanup_pr_containers(pr_number).await?;

    println!();
    println!("✅ Cleanup completed!");
    println!("   Removed {} containers", removed.len());

    for name in &removed {
        println!("   - {}", name);
    }

    Ok(())
}
