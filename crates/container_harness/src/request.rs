//! Container requests and the options that shape them.
//!
//! A [`ContainerRequest`] starts out holding only an image reference. Each
//! [`ContainerOption`] mutates it in place, in the order the caller supplied
//! them, so a later option overrides whatever an earlier one set for the same
//! field.
//!
//! ```
//! use container_harness::{with_env, with_ports, ContainerRequest};
//!
//! let request = ContainerRequest::new("redis:7").apply([
//!     with_ports(["6379/tcp"]),
//!     with_env("REDIS_ARGS", "--save ''"),
//! ]);
//!
//! assert_eq!(request.exposed_ports, vec!["6379/tcp".to_string()]);
//! ```

use crate::errors::ContainerResult;
use crate::image::ImageReference;
use crate::port::ExposedPort;
use std::fmt;
use std::time::Duration;

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;

/// Condition the provisioning facility waits for, after the container is
/// running, before handing it back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitStrategy {
    /// A line containing the message appears on stdout.
    StdoutMessage(String),
    /// A line containing the message appears on stderr.
    StderrMessage(String),
    /// A fixed delay.
    Duration(Duration),
    /// The image's Docker healthcheck reports healthy.
    Healthcheck,
}

/// Desired configuration for a test container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerRequest {
    /// Image reference, e.g. `redis:7`.
    pub image: String,

    /// Exposed ports in `<number>/<protocol>` form.
    pub exposed_ports: Vec<String>,

    /// Environment variables in insertion order, one entry per key.
    pub env: Vec<(String, String)>,

    /// Command override. Empty keeps the image default.
    pub cmd: Vec<String>,

    pub network: Option<String>,

    /// Explicit container name. When unset a run-scoped name is generated.
    pub name: Option<String>,

    pub wait_for: Option<WaitStrategy>,

    /// Overrides the harness-wide startup timeout.
    pub startup_timeout: Option<Duration>,
}

impl ContainerRequest {
    /// Create a request holding only the image reference.
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            ..Default::default()
        }
    }

    /// Apply options in order.
    pub fn apply(mut self, options: impl IntoIterator<Item = ContainerOption>) -> Self {
        for option in options {
            option.apply(&mut self);
        }
        self
    }

    /// Set an environment variable, replacing an earlier value for the same key.
    pub fn set_env(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.env.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.env.push((key, value)),
        }
    }

    pub fn image_reference(&self) -> ContainerResult<ImageReference> {
        self.image.parse()
    }

    /// Parse every exposed port; the first invalid entry is an error.
    pub fn parsed_ports(&self) -> ContainerResult<Vec<ExposedPort>> {
        self.exposed_ports.iter().map(|p| p.parse()).collect()
    }
}

/// A deferred mutation of a [`ContainerRequest`].
pub struct ContainerOption(Box<dyn FnOnce(&mut ContainerRequest) + Send>);

impl ContainerOption {
    /// Wrap an arbitrary mutation.
    pub fn new(f: impl FnOnce(&mut ContainerRequest) + Send + 'static) -> Self {
        Self(Box::new(f))
    }

    pub fn apply(self, request: &mut ContainerRequest) {
        (self.0)(request)
    }
}

impl fmt::Debug for ContainerOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ContainerOption(..)")
    }
}

/// Replace the exposed-ports list wholesale.
pub fn with_ports<I, S>(ports: I) -> ContainerOption
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let ports: Vec<String> = ports.into_iter().map(Into::into).collect();
    ContainerOption::new(move |request| request.exposed_ports = ports)
}

/// Set one environment variable.
pub fn with_env(key: impl Into<String>, value: impl Into<String>) -> ContainerOption {
    let key = key.into();
    let value = value.into();
    ContainerOption::new(move |request| request.set_env(key, value))
}

/// Replace the container command.
pub fn with_cmd<I, S>(cmd: I) -> ContainerOption
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let cmd: Vec<String> = cmd.into_iter().map(Into::into).collect();
    ContainerOption::new(move |request| request.cmd = cmd)
}

pub fn with_network(network: impl Into<String>) -> ContainerOption {
    let network = network.into();
    ContainerOption::new(move |request| request.network = Some(network))
}

pub fn with_name(name: impl Into<String>) -> ContainerOption {
    let name = name.into();
    ContainerOption::new(move |request| request.name = Some(name))
}

pub fn with_wait_for(strategy: WaitStrategy) -> ContainerOption {
    ContainerOption::new(move |request| request.wait_for = Some(strategy))
}

pub fn with_startup_timeout(timeout: Duration) -> ContainerOption {
    ContainerOption::new(move |request| request.startup_timeout = Some(timeout))
}
