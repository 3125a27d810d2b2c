//! Test containers for integration tests.
//!
//! This crate starts Docker containers from integration tests, resolves the
//! host ports they are reachable on, and makes sure every container is removed
//! when the test that created it finishes. Container lifecycle is delegated to
//! `testcontainers`; this crate adds ordered request options, per-test cleanup
//! through [`TestScope`], and fail-fast error reporting.
//!
//! ```no_run
//! use container_harness::{ExecContext, TestScope, new_container, port, with_ports};
//!
//! # async fn talks_to_redis() {
//! container_harness::init_test_logging();
//!
//! TestScope::run("talks_to_redis", |t| async move {
//!     let ctx = ExecContext::background();
//!     let redis = new_container(&ctx, &t, "redis:7", [with_ports(["6379/tcp"])]).await;
//!     let host_port = port(&ctx, &t, &redis, "6379/tcp".parse().unwrap()).await;
//!     println!("redis is reachable on localhost:{host_port}");
//! })
//! .await;
//! # }
//! ```

pub mod config;
pub mod container;
pub mod context;
pub mod docker;
pub mod errors;
pub mod image;
pub mod port;
pub mod provisioner;
pub mod request;
pub mod scope;

pub use config::HarnessConfig;
pub use container::{
    Container, new_container, new_container_with, port, try_new_container, try_new_container_with,
    try_port,
};
pub use context::ExecContext;
pub use docker::{DockerContainer, DockerProvisioner};
pub use errors::{ContainerError, ContainerResult};
pub use image::ImageReference;
pub use port::{ExposedPort, Protocol};
pub use provisioner::{Provisioner, RunningContainer};
pub use request::{
    ContainerOption, ContainerRequest, WaitStrategy, with_cmd, with_env, with_name, with_network,
    with_ports, with_startup_timeout, with_wait_for,
};
pub use scope::TestScope;

/// Initialize test logging.
///
/// Installs a `tracing` subscriber filtered by `RUST_LOG` that writes through
/// the test harness's captured output. Safe to call from every test.
pub fn init_test_logging() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_test_writer()
        .try_init();
}
