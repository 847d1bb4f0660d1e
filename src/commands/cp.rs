//! Copy files between a container and the local filesystem.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::container;
use crate::error::Error;
use crate::paths::Paths;
use crate::process::fake_root::{self, PrivilegeState};
use crate::utils;

#[derive(Args, Debug)]
pub struct Cp {
    /// Source path, optionally container:path
    source: String,
    /// Destination path, optionally container:path
    destination: String,
}

impl Cp {
    pub fn exec(self, paths: &Paths, state: &PrivilegeState) -> Result<()> {
        if fake_root::ensure_fake_root(state, true)? {
            return Ok(());
        }

        let src = resolve(paths, &self.source)?;
        let dest = resolve(paths, &self.destination)?;

        utils::copy_file(&src, &dest)
    }
}

/// Resolve a `container:path` argument into the container's rootfs;
/// anything without a prefix is a host path.
fn resolve(paths: &Paths, arg: &str) -> Result<PathBuf> {
    match arg.split_once(':') {
        Some((container, file)) => {
            if !container::get_dir(paths, container).exists() {
                return Err(Error::NotFound {
                    kind: "container",
                    name: container.to_string(),
                }
                .into());
            }

            Ok(container::get_rootfs_dir(paths, container).join(file.trim_start_matches('/')))
        }
        None => Ok(PathBuf::from(arg)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_paths() {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths {
            home: dir.path().to_path_buf(),
        };

        // plain host path passes through
        assert_eq!(
            resolve(&paths, "/tmp/file").unwrap(),
            PathBuf::from("/tmp/file")
        );

        // unknown container is an error
        assert!(resolve(&paths, "ghost:/etc/hosts").is_err());

        // known container resolves into its rootfs
        let id = container::get_id(&paths, "web");
        std::fs::create_dir_all(paths.container_path(&id)).unwrap();
        assert_eq!(
            resolve(&paths, "web:/etc/hosts").unwrap(),
            paths.container_path(&id).join("rootfs/etc/hosts")
        );
    }
}
