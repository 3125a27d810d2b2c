//! Cleanup orphaned test containers.
//!
//! This binary removes harness containers older than a specified age. It's
//! designed to be run on CI runners between jobs or manually after an aborted
//! local test run.
//!
//! Usage:
//!   cleanup-orphans [max_age_hours]
//!
//! Environment variables:
//! - CONTAINERS_NAME_PREFIX: container name prefix (default: "itest")

use std::env;
use test_cleanup::{CleanupConfig, ContainerCleanup};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    test_cleanup::init_logging();

    // Get max age from command line args, default to 1 hour
    let max_age_hours: u64 = env::args().nth(1).and_then(|s| s.parse().ok()).unwrap_or(1);

    println!("🧹 Test Container Cleanup");
    println!("=========================");
    println!();

    let config = CleanupConfig::from_env()?;

    println!("📋 Configuration:");
    println!("   Name prefix: {}", config.name_prefix);
    println!("   Max age: {} hours", max_age_hours);
    println!();

    let cleanup = ContainerCleanup::connect(&config)?;

    println!("🔍 Searching for orphaned test containers...");
    let removed = cleanup.cleanup_orphaned_containers(max_age_hours).await?;

    println!();
    println!("✅ Cleanup completed!");
    println!("   Removed {} containers", removed.len());

    if !removed.is_empty() {
        println!();
        println!("📋 Removed containers:");
        for name in &removed {
            println!("   - {}", name);
        }
    } else {
        println!("   No containers found older than {} hours", max_age_hours);
    }

    Ok(())
}
