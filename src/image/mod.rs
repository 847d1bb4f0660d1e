//! Image acquisition and deduplicated storage.

pub mod pull;
pub mod reference;
pub mod store;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use md5::{Digest, Md5};
use serde::Deserialize;

use crate::error::Error;
use crate::paths::Paths;
use crate::template;

/// Returns the md5sum based ID for the given image reference. A value that
/// already names an image directory is returned unchanged. A reference that
/// fails to normalize is hashed as given.
pub fn get_id(paths: &Paths, image: &str) -> String {
    if paths.image_path(image).exists() {
        return image.to_string();
    }

    reference::ImageRef::parse(image)
        .map(|r| r.id())
        .unwrap_or_else(|_| format!("{:x}", Md5::digest(image.as_bytes())))
}

/// Returns the image directory for the given image name or id.
pub fn get_path(paths: &Paths, image: &str) -> PathBuf {
    paths.image_path(&get_id(paths, image))
}

/// The slice of an OCI image config the engine consumes when building
/// containers: default environment and command.
#[derive(Debug, Default, Deserialize)]
pub struct ImageConfig {
    #[serde(default)]
    pub config: RuntimeConfig,
}

#[derive(Debug, Default, Deserialize)]
pub struct RuntimeConfig {
    #[serde(rename = "Env", default)]
    pub env: Vec<String>,
    #[serde(rename = "Cmd", default)]
    pub cmd: Vec<String>,
    #[serde(rename = "Entrypoint", default)]
    pub entrypoint: Vec<String>,
}

/// Load the stored `config.json` of an image.
pub fn load_config(paths: &Paths, image: &str) -> Result<ImageConfig> {
    let path = get_path(paths, image).join("config.json");
    let content = fs::read(&path).map_err(|_| Error::NotFound {
        kind: "image",
        name: image.to_string(),
    })?;

    serde_json::from_slice(&content)
        .map_err(|e| Error::InvalidConfig(format!("image config: {}", e)).into())
}

/// Return a JSON dump or a formatted string describing the input images.
/// A format string is resolved against the image's stored `config.json`.
pub fn inspect(paths: &Paths, images: &[String], format: &str) -> Result<String> {
    let mut result = String::new();

    for image in images {
        let path = get_path(paths, image).join("config.json");
        let content = fs::read(&path).map_err(|_| Error::NotFound {
            kind: "image",
            name: image.to_string(),
        })?;
        let config: serde_json::Value =
            serde_json::from_slice(&content).context("malformed image config")?;

        if !format.is_empty() {
            result += &template::render(format, &config);
            continue;
        }

        result += &serde_json::to_string_pretty(&config)?;
        result += "\n";
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_id_hashes_canonical_reference() {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths {
            home: dir.path().to_path_buf(),
        };

        // "alpine" and its canonical form share an identity
        assert_eq!(
            get_id(&paths, "alpine"),
            get_id(&paths, "index.docker.io/library/alpine:latest")
        );
        assert_eq!(get_id(&paths, "alpine"), "ff727edbcbe60df2bd6a89cf65d6db2b");
    }

    #[test]
    fn test_get_id_passes_known_ids_through() {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths {
            home: dir.path().to_path_buf(),
        };

        let id = get_id(&paths, "alpine");
        fs::create_dir_all(paths.image_path(&id)).unwrap();
        assert_eq!(get_id(&paths, &id), id);
    }

    #[test]
    fn test_get_id_never_empty() {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths {
            home: dir.path().to_path_buf(),
        };

        // even a reference that fails to normalize maps to a real directory
        let id = get_id(&paths, "not a valid ref");
        assert_eq!(id.len(), 32);
    }
}
