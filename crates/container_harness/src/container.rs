//! Creating test containers and resolving their ports.
//!
//! Every container created here is paired with exactly one cleanup action on
//! the owning [`TestScope`]; the action terminates the container after the
//! test and its subtests finish, whether they passed or not.

use crate::context::ExecContext;
use crate::docker::{DockerContainer, DockerProvisioner};
use crate::errors::ContainerResult;
use crate::port::ExposedPort;
use crate::provisioner::{Provisioner, RunningContainer};
use crate::request::{ContainerOption, ContainerRequest};
use crate::scope::TestScope;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

#[cfg(test)]
#[path = "container_tests.rs"]
mod tests;

/// A running container owned by one test.
pub struct Container<C: RunningContainer> {
    inner: Arc<C>,
}

impl<C: RunningContainer> Container<C> {
    pub fn id(&self) -> &str {
        self.inner.id()
    }

    /// The provisioner-specific container.
    pub fn inner(&self) -> &C {
        &self.inner
    }
}

impl<C: RunningContainer> fmt::Debug for Container<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container").field("id", &self.id()).finish()
    }
}

/// Start a container on the local Docker daemon, failing the test on error.
///
/// # Examples
///
/// ```no_run
/// use container_harness::{ExecContext, ExposedPort, TestScope, new_container, port, with_ports};
///
/// # async fn example() {
/// TestScope::run("redis_roundtrip", |t| async move {
///     let ctx = ExecContext::background();
///     let redis = new_container(&ctx, &t, "redis:7", [with_ports(["6379/tcp"])]).await;
///     let host_port = port(&ctx, &t, &redis, ExposedPort::tcp(6379)).await;
///     println!("redis listening on localhost:{host_port}");
/// })
/// .await;
/// # }
/// ```
pub async fn new_container(
    ctx: &ExecContext,
    t: &TestScope,
    image: &str,
    options: impl IntoIterator<Item = ContainerOption>,
) -> Container<DockerContainer> {
    let provisioner = match DockerProvisioner::from_env() {
        Ok(provisioner) => provisioner,
        Err(e) => t.fatal(format!("error creating container: {}", e)),
    };
    new_container_with(ctx, t, &provisioner, image, options).await
}

/// Like [`new_container`] but returns the error instead of failing the test.
pub async fn try_new_container(
    ctx: &ExecContext,
    t: &TestScope,
    image: &str,
    options: impl IntoIterator<Item = ContainerOption>,
) -> ContainerResult<Container<DockerContainer>> {
    let provisioner = DockerProvisioner::from_env()?;
    try_new_container_with(ctx, t, &provisioner, image, options).await
}

/// Start a container with an explicit provisioner, failing the test on error.
pub async fn new_container_with<P: Provisioner>(
    ctx: &ExecContext,
    t: &TestScope,
    provisioner: &P,
    image: &str,
    options: impl IntoIterator<Item = ContainerOption>,
) -> Container<P::Container> {
    match try_new_container_with(ctx, t, provisioner, image, options).await {
        Ok(container) => container,
        Err(e) => t.fatal(format!("error creating container: {}", e)),
    }
}

/// Start a container with an explicit provisioner.
///
/// On success the termination cleanup is registered on `t` before returning.
/// A failing termination is reported through [`TestScope::fatal`] when the
/// cleanup runs.
pub async fn try_new_container_with<P: Provisioner>(
    ctx: &ExecContext,
    t: &TestScope,
    provisioner: &P,
    image: &str,
    options: impl IntoIterator<Item = ContainerOption>,
) -> ContainerResult<Container<P::Container>> {
    let request = ContainerRequest::new(image).apply(options);
    let running = Arc::new(ctx.run(provisioner.start(request)).await?);

    let cleanup_ctx = ctx.clone();
    let cleanup_scope = t.clone();
    let target = Arc::clone(&running);
    t.cleanup(move || async move {
        debug!(
            test = cleanup_scope.name(),
            container_id = target.id(),
            "Removing test container"
        );
        if let Err(e) = cleanup_ctx.run(target.terminate()).await {
            cleanup_scope.fatal(format!("error terminating container: {}", e));
        }
    });

    Ok(Container { inner: running })
}

/// Host port mapped to `exposed`, failing the test on error.
pub async fn port<C: RunningContainer>(
    ctx: &ExecContext,
    t: &TestScope,
    container: &Container<C>,
    exposed: ExposedPort,
) -> String {
    match try_port(ctx, container, exposed).await {
        Ok(port) => port,
        Err(e) => t.fatal(format!("error getting mapped port: {}", e)),
    }
}

/// Host port mapped to `exposed`, as a decimal string.
pub async fn try_port<C: RunningContainer>(
    ctx: &ExecContext,
    container: &Container<C>,
    exposed: ExposedPort,
) -> ContainerResult<String> {
    let mapped = ctx.run(container.inner.mapped_port(exposed)).await?;
    Ok(mapped.to_string())
}
