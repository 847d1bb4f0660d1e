//! Image reference parsing and canonicalization.

use md5::{Digest, Md5};

use crate::error::{Error, Result};

/// Default registry prepended to bare references.
pub const DEFAULT_REGISTRY: &str = "index.docker.io";
/// API endpoint answering for docker.io references.
pub const DOCKER_API_HOST: &str = "registry-1.docker.io";

/// A canonical image reference of the form `registry/path/name:tag`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub registry: String,
    pub repository: String,
    pub tag: String,
}

impl ImageRef {
    /// Parse a user supplied reference and normalize it:
    /// a first path segment without a dot means the default registry is
    /// prepended; a single-segment repository on a docker registry gets
    /// `library/` inserted; a missing tag defaults to `latest`.
    pub fn parse(image: &str) -> Result<Self> {
        if image.is_empty()
            || !image.chars().all(|c| {
                c.is_ascii_alphanumeric()
                    || c == '/'
                    || c == ':'
                    || c == '.'
                    || c == '-'
                    || c == '_'
            })
        {
            return Err(Error::BadReference(image.to_string()));
        }

        let mut segments: Vec<&str> = image.split('/').collect();

        let registry = if segments.len() > 1 && segments[0].contains('.') {
            segments.remove(0).to_string()
        } else {
            DEFAULT_REGISTRY.to_string()
        };

        if segments.is_empty() || segments.iter().any(|s| s.is_empty()) {
            return Err(Error::BadReference(image.to_string()));
        }

        let last = segments.pop().unwrap();
        let (name, tag) = match last.split_once(':') {
            Some((name, tag)) if !name.is_empty() && !tag.is_empty() => (name, tag.to_string()),
            None => (last, "latest".to_string()),
            _ => return Err(Error::BadReference(image.to_string())),
        };

        let mut repo_segments: Vec<String> = segments.iter().map(|s| s.to_string()).collect();
        repo_segments.push(name.to_string());

        // single-segment repositories on docker registries live under library/
        if repo_segments.len() == 1 && registry.contains("docker") {
            repo_segments.insert(0, "library".to_string());
        }

        Ok(Self {
            registry,
            repository: repo_segments.join("/"),
            tag,
        })
    }

    /// The canonical reference string, `registry/repository:tag`.
    pub fn canonical(&self) -> String {
        format!("{}/{}:{}", self.registry, self.repository, self.tag)
    }

    /// Stable on-disk identity of this reference: md5 of the canonical
    /// string. The image's directory under the image store carries this name.
    pub fn id(&self) -> String {
        format!("{:x}", Md5::digest(self.canonical().as_bytes()))
    }

    /// Host answering the registry v2 API for this reference.
    pub fn api_host(&self) -> &str {
        if self.registry.contains("docker") {
            DOCKER_API_HOST
        } else {
            &self.registry
        }
    }

    /// URL of the image manifest.
    pub fn manifest_url(&self) -> String {
        format!(
            "https://{}/v2/{}/manifests/{}",
            self.api_host(),
            self.repository,
            self.tag
        )
    }

    /// URL of a blob of this image.
    pub fn blob_url(&self, digest: &str) -> String {
        format!(
            "https://{}/v2/{}/blobs/{}",
            self.api_host(),
            self.repository,
            digest
        )
    }

    /// Whether pulls from this registry need the docker auth token dance.
    pub fn needs_docker_token(&self) -> bool {
        self.registry.contains("docker")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_name_canonicalization() {
        let r = ImageRef::parse("alpine").unwrap();
        assert_eq!(r.canonical(), "index.docker.io/library/alpine:latest");
    }

    #[test]
    fn test_foreign_registry_keeps_path() {
        let r = ImageRef::parse("ghcr.io/x/y").unwrap();
        assert_eq!(r.canonical(), "ghcr.io/x/y:latest");
        assert_eq!(r.api_host(), "ghcr.io");
        assert!(!r.needs_docker_token());
    }

    #[test]
    fn test_docker_io_inserts_library() {
        let r = ImageRef::parse("docker.io/foo:v1").unwrap();
        assert_eq!(r.canonical(), "docker.io/library/foo:v1");
        assert_eq!(r.api_host(), DOCKER_API_HOST);
        assert!(r.needs_docker_token());
    }

    #[test]
    fn test_id_is_md5_of_canonical() {
        let r = ImageRef::parse("alpine").unwrap();
        // md5("index.docker.io/library/alpine:latest")
        assert_eq!(r.id(), "ff727edbcbe60df2bd6a89cf65d6db2b");
    }

    #[test]
    fn test_manifest_and_blob_urls() {
        let r = ImageRef::parse("alpine:3.18").unwrap();
        assert_eq!(
            r.manifest_url(),
            "https://registry-1.docker.io/v2/library/alpine/manifests/3.18"
        );
        assert_eq!(
            r.blob_url("sha256:abc"),
            "https://registry-1.docker.io/v2/library/alpine/blobs/sha256:abc"
        );
    }

    #[test]
    fn test_malformed_references_rejected() {
        assert!(ImageRef::parse("").is_err());
        assert!(ImageRef::parse("bad image").is_err());
        assert!(ImageRef::parse("name:").is_err());
        assert!(ImageRef::parse("a//b").is_err());
    }
}
