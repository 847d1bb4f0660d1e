//! Remove one or more containers.

use std::env;
use std::fs;
use std::process::Command;

use anyhow::Result;
use clap::Args;

use crate::container;
use crate::error::Error;
use crate::paths::Paths;
use crate::process::fake_root::{self, PrivilegeState};
use crate::utils;

#[derive(Args, Debug)]
pub struct Rm {
    /// Force remove container, stopping it first
    #[arg(short, long)]
    force: bool,
    /// Remove all containers
    #[arg(short, long)]
    all: bool,
    /// Containers to remove
    containers: Vec<String>,
}

impl Rm {
    pub fn exec(self, paths: &Paths, state: &PrivilegeState) -> Result<()> {
        if self.force {
            let self_exe = env::args()
                .next()
                .unwrap_or_else(|| "/proc/self/exe".to_string());
            Command::new(self_exe)
                .args(["stop", "-f"])
                .args(&self.containers)
                .status()?;
        }

        if fake_root::ensure_fake_root(state, true)? {
            return Ok(());
        }

        let mut targets = self.containers.clone();

        if self.all {
            targets = fs::read_dir(paths.container_dir())
                .map_err(|_| Error::NotFound {
                    kind: "container",
                    name: "(none)".to_string(),
                })?
                .flatten()
                .map(|e| e.file_name().to_string_lossy().to_string())
                .collect();
        }

        if targets.is_empty() {
            return Err(Error::NotFound {
                kind: "container",
                name: "(none specified)".to_string(),
            }
            .into());
        }

        for target in &targets {
            if container::is_running(paths, target) {
                return Err(Error::AlreadyRunning(target.clone()).into());
            }

            let target_dir = container::get_dir(paths, target);
            if !target_dir.exists() {
                return Err(Error::NotFound {
                    kind: "container",
                    name: target.clone(),
                }
                .into());
            }

            utils::umount_all(&target_dir.join("rootfs"))?;

            log::debug!("deleting: {} in {:?}", target, target_dir);
            fs::remove_dir_all(&target_dir)?;
            fs::remove_dir_all(paths.volume_dir().join(container::get_id(paths, target))).ok();

            println!("{}", target);
        }

        Ok(())
    }
}
