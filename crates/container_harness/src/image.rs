//! Image references.

use crate::errors::ContainerError;
use std::fmt;
use std::str::FromStr;

#[cfg(test)]
#[path = "image_tests.rs"]
mod tests;

const DEFAULT_TAG: &str = "latest";

/// A Docker image reference split into repository and tag.
///
/// Accepts `[registry[:port]/]repository[:tag]`. The tag defaults to
/// `latest`. A colon before the last `/` belongs to the registry host, not the
/// tag. Digest pinned references are not supported.
///
/// # Examples
///
/// ```
/// use container_harness::ImageReference;
///
/// let image: ImageReference = "redis:7".parse().unwrap();
/// assert_eq!(image.repository(), "redis");
/// assert_eq!(image.tag(), "7");
///
/// let image: ImageReference = "localhost:5000/team/api".parse().unwrap();
/// assert_eq!(image.repository(), "localhost:5000/team/api");
/// assert_eq!(image.tag(), "latest");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    repository: String,
    tag: String,
}

impl ImageReference {
    pub fn repository(&self) -> &str {
        &self.repository
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Last path component of the repository, e.g. `api` for `ghcr.io/org/api`.
    pub fn short_name(&self) -> &str {
        self.repository
            .rsplit('/')
            .next()
            .unwrap_or(&self.repository)
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.repository, self.tag)
    }
}

impl FromStr for ImageReference {
    type Err = ContainerError;

    fn from_str(reference: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ContainerError::InvalidImage {
            reference: reference.to_string(),
            reason: reason.to_string(),
        };

        if reference.is_empty() {
            return Err(invalid("image reference is empty"));
        }
        if reference.chars().any(char::is_whitespace) {
            return Err(invalid("image reference contains whitespace"));
        }
        if reference.contains('@') {
            return Err(invalid("digest references are not supported"));
        }

        let path_start = reference.rfind('/').map(|i| i + 1).unwrap_or(0);
        let (repository, tag) = match reference[path_start..].rfind(':') {
            Some(i) => {
                let split = path_start + i;
                (&reference[..split], &reference[split + 1..])
            }
            None => (reference, DEFAULT_TAG),
        };

        if tag.is_empty() {
            return Err(invalid("tag is empty"));
        }
        if repository.is_empty() || repository.ends_with('/') {
            return Err(invalid("repository name is empty"));
        }

        Ok(Self {
            repository: repository.to_string(),
            tag: tag.to_string(),
        })
    }
}
