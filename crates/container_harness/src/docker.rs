//! Docker provisioning through `testcontainers`.

use crate::config::HarnessConfig;
use crate::errors::{ContainerError, ContainerResult};
use crate::port::ExposedPort;
use crate::provisioner::{Provisioner, RunningContainer};
use crate::request::{ContainerRequest, WaitStrategy};
use async_trait::async_trait;
use testcontainers::core::WaitFor;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, GenericImage, ImageExt, TestcontainersError};
use tokio::sync::Mutex;
use tracing::{debug, info};

#[cfg(test)]
#[path = "docker_tests.rs"]
mod tests;

/// Starts containers on the local Docker daemon.
#[derive(Debug, Clone, Default)]
pub struct DockerProvisioner {
    config: HarnessConfig,
}

impl DockerProvisioner {
    pub fn new(config: HarnessConfig) -> Self {
        Self { config }
    }

    /// Provisioner configured from `CONTAINERS_*` environment variables.
    pub fn from_env() -> ContainerResult<Self> {
        Ok(Self::new(HarnessConfig::from_env()?))
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Translate a harness request into a `testcontainers` request.
    fn build_request(
        &self,
        request: &ContainerRequest,
    ) -> ContainerResult<testcontainers::ContainerRequest<GenericImage>> {
        let image = request.image_reference()?;
        let ports = request.parsed_ports()?;

        let mut generic = GenericImage::new(image.repository(), image.tag());
        for port in ports {
            generic = generic.with_exposed_port(port.into());
        }
        if let Some(strategy) = &request.wait_for {
            generic = generic.with_wait_for(wait_for(strategy));
        }

        let name = request.name.clone().unwrap_or_else(|| {
            test_utils::generate_container_name(&self.config.name_prefix, image.short_name())
        });
        let startup_timeout = request
            .startup_timeout
            .unwrap_or(self.config.startup_timeout);

        let mut built = generic
            .with_container_name(name)
            .with_startup_timeout(startup_timeout);
        for (key, value) in &request.env {
            built = built.with_env_var(key, value);
        }
        if !request.cmd.is_empty() {
            built = built.with_cmd(request.cmd.clone());
        }
        if let Some(network) = &request.network {
            built = built.with_network(network);
        }

        Ok(built)
    }
}

#[async_trait]
impl Provisioner for DockerProvisioner {
    type Container = DockerContainer;

    async fn start(&self, request: ContainerRequest) -> ContainerResult<DockerContainer> {
        let built = self.build_request(&request)?;

        info!(
            image = %request.image,
            ports = ?request.exposed_ports,
            "Starting container"
        );

        let container = built.start().await.map_err(|e| ContainerError::Provision {
            image: request.image.clone(),
            reason: e.to_string(),
        })?;

        let id = container.id().to_string();
        info!(image = %request.image, container_id = %id, "Container started");

        Ok(DockerContainer {
            id,
            container: Mutex::new(Some(container)),
        })
    }
}

/// A running Docker container.
///
/// Holds the `testcontainers` handle until [`RunningContainer::terminate`]
/// removes it.
#[derive(Debug)]
pub struct DockerContainer {
    id: String,
    container: Mutex<Option<ContainerAsync<GenericImage>>>,
}

#[async_trait]
impl RunningContainer for DockerContainer {
    fn id(&self) -> &str {
        &self.id
    }

    async fn mapped_port(&self, port: ExposedPort) -> ContainerResult<u16> {
        let guard = self.container.lock().await;
        let container = guard.as_ref().ok_or_else(|| ContainerError::NotRunning {
            container_id: self.id.clone(),
        })?;

        let mapped = container
            .get_host_port_ipv4(port)
            .await
            .map_err(|e| port_error(&self.id, port, e))?;

        debug!(container_id = %self.id, port = %port, mapped, "Resolved mapped port");
        Ok(mapped)
    }

    async fn terminate(&self) -> ContainerResult<()> {
        let container = self
            .container
            .lock()
            .await
            .take()
            .ok_or_else(|| ContainerError::NotRunning {
                container_id: self.id.clone(),
            })?;

        info!(container_id = %self.id, "Terminating container");
        container.rm().await.map_err(|e| ContainerError::Termination {
            container_id: self.id.clone(),
            reason: e.to_string(),
        })?;

        info!(container_id = %self.id, "✓ Container stopped and removed");
        Ok(())
    }
}

fn wait_for(strategy: &WaitStrategy) -> WaitFor {
    match strategy {
        WaitStrategy::StdoutMessage(message) => WaitFor::message_on_stdout(message.as_str()),
        WaitStrategy::StderrMessage(message) => WaitFor::message_on_stderr(message.as_str()),
        WaitStrategy::Duration(length) => WaitFor::Duration { length: *length },
        WaitStrategy::Healthcheck => WaitFor::healthcheck(),
    }
}

fn port_error(container_id: &str, port: ExposedPort, error: TestcontainersError) -> ContainerError {
    match error {
        TestcontainersError::PortNotExposed { .. } => ContainerError::PortNotMapped {
            container_id: container_id.to_string(),
            port: port.to_string(),
        },
        other => ContainerError::PortResolution {
            container_id: container_id.to_string(),
            port: port.to_string(),
            reason: other.to_string(),
        },
    }
}
