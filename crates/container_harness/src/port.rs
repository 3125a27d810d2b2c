//! Exposed port specifications.
//!
//! Ports are written the way Docker writes them: `6379/tcp`, `53/udp`. A bare
//! number such as `8080` means TCP.

use crate::errors::ContainerError;
use std::fmt;
use std::str::FromStr;
use testcontainers::core::ContainerPort;

#[cfg(test)]
#[path = "port_tests.rs"]
mod tests;

/// Transport protocol of an exposed port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Protocol {
    #[default]
    Tcp,
    Udp,
    Sctp,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Tcp => "tcp",
            Protocol::Udp => "udp",
            Protocol::Sctp => "sctp",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A container-internal port plus its transport protocol.
///
/// # Examples
///
/// ```
/// use container_harness::{ExposedPort, Protocol};
///
/// let port: ExposedPort = "6379/tcp".parse().unwrap();
/// assert_eq!(port, ExposedPort::tcp(6379));
///
/// let dns: ExposedPort = "53/UDP".parse().unwrap();
/// assert_eq!(dns.protocol(), Protocol::Udp);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExposedPort {
    number: u16,
    protocol: Protocol,
}

impl ExposedPort {
    pub fn new(number: u16, protocol: Protocol) -> Self {
        Self { number, protocol }
    }

    pub fn tcp(number: u16) -> Self {
        Self::new(number, Protocol::Tcp)
    }

    pub fn udp(number: u16) -> Self {
        Self::new(number, Protocol::Udp)
    }

    pub fn number(&self) -> u16 {
        self.number
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }
}

impl fmt::Display for ExposedPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.number, self.protocol)
    }
}

impl FromStr for ExposedPort {
    type Err = ContainerError;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ContainerError::InvalidPort {
            spec: spec.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = spec.trim();
        let (number, protocol) = match trimmed.split_once('/') {
            Some((number, protocol)) => (number, Some(protocol)),
            None => (trimmed, None),
        };

        if number.is_empty() || !number.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("port must be a number between 1 and 65535"));
        }
        let number: u16 = number
            .parse()
            .map_err(|_| invalid("port must be a number between 1 and 65535"))?;
        if number == 0 {
            return Err(invalid("port must be a number between 1 and 65535"));
        }

        let protocol = match protocol.map(|p| p.to_ascii_lowercase()) {
            None => Protocol::Tcp,
            Some(p) => match p.as_str() {
                "tcp" => Protocol::Tcp,
                "udp" => Protocol::Udp,
                "sctp" => Protocol::Sctp,
                _ => return Err(invalid("protocol must be one of tcp, udp, sctp")),
            },
        };

        Ok(Self { number, protocol })
    }
}

impl From<u16> for ExposedPort {
    fn from(number: u16) -> Self {
        Self::tcp(number)
    }
}

impl From<ExposedPort> for ContainerPort {
    fn from(port: ExposedPort) -> Self {
        match port.protocol {
            Protocol::Tcp => ContainerPort::Tcp(port.number),
            Protocol::Udp => ContainerPort::Udp(port.number),
            Protocol::Sctp => ContainerPort::Sctp(port.number),
        }
    }
}
