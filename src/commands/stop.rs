//! Stop one or more running containers.

use std::fs;
use std::process::Command;

use anyhow::Result;
use clap::Args;

use crate::container;
use crate::container::config::Config;
use crate::error::Error;
use crate::paths::Paths;

#[derive(Args, Debug)]
pub struct Stop {
    /// Stop all running containers
    #[arg(short, long)]
    all: bool,
    /// Force stop running container (use SIGKILL instead of SIGTERM)
    #[arg(short, long)]
    force: bool,
    /// Seconds to wait before forcefully exiting the container
    #[arg(short, long, default_value_t = 10)]
    timeout: u32,
    /// Containers to stop
    containers: Vec<String>,
}

impl Stop {
    pub fn exec(self, paths: &Paths) -> Result<()> {
        let mut targets = self.containers.clone();

        if self.all {
            targets = fs::read_dir(paths.container_dir())?
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
            if !container::get_dir(paths, target).exists() {
                return Err(Error::NotFound {
                    kind: "container",
                    name: target.clone(),
                }
                .into());
            }

            log::debug!("stopping: {}", target);

            if container::get_pid(paths, target).is_none() {
                log::debug!("container {} already stopped", target);
                continue;
            }

            let config_path = container::get_dir(paths, target).join("config");
            let config = match Config::load(&config_path) {
                Ok(config) => config,
                Err(_) => {
                    // invalid container, have rm sweep it away
                    log::warn!("found invalid container {}, cleaning up", target);
                    Command::new("/proc/self/exe")
                        .args(["rm", target.as_str()])
                        .status()?;
                    continue;
                }
            };

            container::stop(paths, target, self.force, self.timeout, &config.stopsignal)?;

            println!("{}", target);
        }

        Ok(())
    }
}
