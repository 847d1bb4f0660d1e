//! The persisted per-container configuration.
//!
//! Note that this is NOT an OCI runtime config. The engine is registry and
//! image compliant, but containers are described by this flat structure.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Namespace setting: share the host's namespace.
pub const HOST: &str = "host";
/// Namespace setting: create a private namespace.
pub const PRIVATE: &str = "private";
/// User namespace setting: map the caller's uid to root inside.
pub const KEEP_ID: &str = "keep-id";

/// Persisted description of one container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub env: Vec<String>,
    pub cgroup: String,
    pub created: String,
    pub gidmap: String,
    pub hostname: String,
    pub id: String,
    pub image: String,
    pub ipc: String,
    pub names: String,
    pub network: String,
    pub pid: String,
    pub privileged: bool,
    /// Computed on read, never authoritative on disk.
    #[serde(default)]
    pub size: String,
    /// Computed on read, never authoritative on disk.
    #[serde(default)]
    pub status: String,
    pub time: String,
    pub uidmap: String,
    pub user: String,
    pub userns: String,
    pub workdir: String,
    pub stopsignal: String,
    pub mounts: Vec<String>,
    pub labels: Vec<String>,
    pub entrypoint: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            env: vec![
                "TERM=xterm".to_string(),
                "PATH=/.local/bin:/bin:/usr/local/sbin:/usr/local/bin:/usr/sbin:/usr/bin:/sbin:/bin"
                    .to_string(),
            ],
            cgroup: PRIVATE.to_string(),
            created: "none".to_string(),
            gidmap: String::new(),
            hostname: String::new(),
            id: String::new(),
            image: String::new(),
            ipc: PRIVATE.to_string(),
            names: String::new(),
            network: PRIVATE.to_string(),
            pid: PRIVATE.to_string(),
            privileged: false,
            size: String::new(),
            status: String::new(),
            time: PRIVATE.to_string(),
            uidmap: String::new(),
            user: "root:root".to_string(),
            userns: PRIVATE.to_string(),
            workdir: "/".to_string(),
            stopsignal: "SIGTERM".to_string(),
            mounts: vec![],
            labels: vec![],
            entrypoint: vec!["/bin/sh".to_string()],
        }
    }
}

impl Config {
    /// Deserialize a config from raw JSON bytes.
    pub fn from_slice(input: &[u8]) -> Result<Self> {
        serde_json::from_slice(input).map_err(|e| Error::InvalidConfig(e.to_string()))
    }

    /// Load a config from its file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read(path).map_err(|_| Error::NotFound {
            kind: "container config",
            name: path.display().to_string(),
        })?;
        Self::from_slice(&content)
    }

    /// Persist the config, starting from a clean file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_vec_pretty(self)
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;

        log::debug!("save config: writing {:?}", path);
        let _ = fs::remove_file(path);
        fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_round_trip() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config");

        let mut config = Config::default();
        config.id = "0123abcd".into();
        config.names = "web".into();
        config.image = "index.docker.io/library/alpine:latest".into();
        config.mounts = vec!["/data:/data:ro".into()];
        config.labels = vec!["app=web".into()];
        config.entrypoint = vec!["sh".into(), "-c".into(), "echo hi".into()];

        config.save(&path)?;
        let loaded = Config::load(&path)?;
        assert_eq!(loaded, config);
        Ok(())
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.userns, PRIVATE);
        assert_eq!(config.stopsignal, "SIGTERM");
        assert_eq!(config.workdir, "/");
        assert_eq!(config.entrypoint, vec!["/bin/sh"]);
    }

    #[test]
    fn test_malformed_config_rejected() {
        assert!(Config::from_slice(b"{not json").is_err());
    }
}
