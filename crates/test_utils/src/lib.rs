//! Test utilities shared by the container harness and the cleanup tools.
//!
//! This crate owns the naming convention for test containers. Names carry
//! the CI context they were created in so that leftovers can be traced back
//! to a pull request and removed.

use chrono::Utc;
use std::env;
use uuid::Uuid;

/// Environment variable overriding the container name prefix.
pub const NAME_PREFIX_ENV: &str = "CONTAINERS_NAME_PREFIX";

/// Prefix used for container names when none is configured.
pub const DEFAULT_NAME_PREFIX: &str = "itest";

const MAX_LABEL_LEN: usize = 40;

/// Extract workflow context from GitHub Actions environment for container naming.
///
/// Returns:
/// - `pr{number}` for pull request workflows (e.g., "pr123")
/// - `main` for pushes to main/master branch
/// - the sanitized branch name for other branch pushes
/// - `local` for local development
///
/// Uses GITHUB_REF environment variable which contains:
/// - `refs/pull/{number}/merge` for pull requests
/// - `refs/heads/{branch}` for branch pushes
pub fn get_workflow_context() -> String {
    workflow_context_from(env::var("GITHUB_REF").ok().as_deref())
}

/// Same as [`get_workflow_context`] for an explicit `GITHUB_REF` value.
pub fn workflow_context_from(github_ref: Option<&str>) -> String {
    let Some(github_ref) = github_ref else {
        return "local".to_string();
    };

    if let Some(rest) = github_ref.strip_prefix("refs/pull/") {
        if let Some(pr_num) = rest.split('/').next().filter(|n| !n.is_empty()) {
            return format!("pr{}", sanitize_label(pr_num));
        }
    } else if let Some(branch) = github_ref.strip_prefix("refs/heads/") {
        if branch == "main" || branch == "master" {
            return "main".to_string();
        }
        return sanitize_label(branch);
    }

    "local".to_string()
}

/// Generate a unique container name following the naming convention.
///
/// Format: `{prefix}-{context}-{timestamp}-{label}-{random}`
///
/// Where context is the value of [`get_workflow_context`] and label is
/// sanitized to lowercase letters, digits and dashes.
///
/// # Examples
///
/// ```
/// use test_utils::generate_container_name;
///
/// let name = generate_container_name("itest", "redis");
/// // Result: itest-pr123-20240108-120000-redis-a1b2c3 (in PR)
/// // Result: itest-local-20240108-120000-redis-a1b2c3 (local)
/// assert!(name.starts_with("itest-"));
/// ```
pub fn generate_container_name(prefix: &str, label: &str) -> String {
    let context = get_workflow_context();
    let timestamp = Utc::now().format("%Y%m%d-%H%M%S");
    let random_suffix = Uuid::new_v4().simple().to_string()[..6].to_lowercase();
    format!(
        "{}-{}-{}-{}-{}",
        prefix,
        context,
        timestamp,
        sanitize_label(label),
        random_suffix
    )
}

/// Reduce `label` to `[a-z0-9-]`, collapsing runs of other characters into a
/// single dash.
pub fn sanitize_label(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    for c in label.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }

    let trimmed: String = out
        .trim_matches('-')
        .chars()
        .take(MAX_LABEL_LEN)
        .collect();
    let trimmed = trimmed.trim_end_matches('-');
    if trimmed.is_empty() {
        "container".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Check whether a container name was generated with `prefix`.
///
/// Docker reports names with a leading `/`, which is ignored.
pub fn is_harness_container(prefix: &str, name: &str) -> bool {
    let name = name.strip_prefix('/').unwrap_or(name);
    name.strip_prefix(prefix)
        .is_some_and(|rest| rest.starts_with('-'))
}

/// Check whether a container was created under pull request `pr_number`.
pub fn is_pr_container(prefix: &str, name: &str, pr_number: u32) -> bool {
    let name = name.strip_prefix('/').unwrap_or(name);
    name.starts_with(&format!("{}-pr{}-", prefix, pr_number))
}

/// Check that `prefix` is usable at the start of a Docker container name.
pub fn is_valid_name_prefix(prefix: &str) -> bool {
    let mut chars = prefix.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphanumeric() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
