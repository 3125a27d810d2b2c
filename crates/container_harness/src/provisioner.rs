//! Provisioning facility interface.
//!
//! The harness never talks to a container engine directly. It hands a
//! [`ContainerRequest`] to a [`Provisioner`] and gets back a
//! [`RunningContainer`] that can resolve port mappings and be terminated.
//! [`crate::DockerProvisioner`] is the production implementation.

use crate::errors::ContainerResult;
use crate::port::ExposedPort;
use crate::request::ContainerRequest;
use async_trait::async_trait;

/// Creates and starts containers.
#[async_trait]
pub trait Provisioner: Send + Sync {
    type Container: RunningContainer;

    /// Create a container from `request` and start it.
    ///
    /// Returns only once the container is running and its wait strategy, if
    /// any, is satisfied.
    async fn start(&self, request: ContainerRequest) -> ContainerResult<Self::Container>;
}

/// A container started by a [`Provisioner`].
#[async_trait]
pub trait RunningContainer: Send + Sync + 'static {
    /// Engine-assigned container identifier.
    fn id(&self) -> &str;

    /// Host port the engine mapped to `port`.
    ///
    /// Queries the live container every time.
    async fn mapped_port(&self, port: ExposedPort) -> ContainerResult<u16>;

    /// Stop and remove the container.
    async fn terminate(&self) -> ContainerResult<()>;
}
