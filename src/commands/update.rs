//! Update the configuration of a stopped container.

use std::fs;

use anyhow::{bail, Result};
use clap::Args;

use crate::container;
use crate::container::config::Config;
use crate::error::Error;
use crate::paths::Paths;

#[derive(Args, Debug)]
pub struct Update {
    /// Show configuration for container
    #[arg(long)]
    config_dump: bool,
    /// Reset blank configuration for container
    #[arg(long)]
    config_reset: bool,
    /// cgroup namespace to use
    #[arg(long)]
    cgroup: Option<String>,
    /// Overwrite command to execute when starting the container
    #[arg(long)]
    entrypoint: Option<String>,
    /// IPC namespace to use
    #[arg(long)]
    ipc: Option<String>,
    /// Connect a container to a network
    #[arg(long)]
    network: Option<String>,
    /// pid namespace to use
    #[arg(long)]
    pid: Option<String>,
    /// Give extended privileges to the container
    #[arg(long)]
    privileged: Option<String>,
    /// time namespace to use
    #[arg(long)]
    time: Option<String>,
    /// user namespace to use
    #[arg(long)]
    userns: Option<String>,
    /// Set environment variables in container
    #[arg(short, long)]
    env: Option<Vec<String>>,
    /// Set metadata on container
    #[arg(long)]
    label: Option<Vec<String>>,
    /// Bind mount a volume into the container
    #[arg(short, long)]
    volume: Option<Vec<String>>,
    /// Set container hostname
    #[arg(long)]
    hostname: Option<String>,
    /// Container to update
    container: String,
}

impl Update {
    pub fn exec(self, paths: &Paths) -> Result<()> {
        let config_path = container::get_dir(paths, &self.container).join("config");
        if !config_path.exists() {
            return Err(Error::NotFound {
                kind: "container",
                name: self.container.clone(),
            }
            .into());
        }

        let raw = fs::read_to_string(&config_path)?;
        let mut config = Config::from_slice(raw.as_bytes())?;

        if self.config_dump {
            println!("{}", raw);
            return Ok(());
        }

        if container::is_running(paths, &self.container) {
            bail!("container {} is running, stop it first", self.container);
        }

        if self.config_reset {
            log::debug!("resetting container {} to default config", config.names);

            let defaults = Config {
                id: container::get_id(paths, &self.container),
                names: config.names,
                image: config.image,
                hostname: config.hostname,
                userns: config.userns,
                ..Default::default()
            };

            return Ok(defaults.save(&config_path)?);
        }

        if self.userns.is_some() {
            bail!("userns cannot be changed after creation");
        }

        if let Some(entrypoint) = &self.entrypoint {
            config.entrypoint = entrypoint.split(' ').map(String::from).collect();
        }
        if let Some(privileged) = &self.privileged {
            config.privileged = privileged.parse()?;
        }
        if let Some(ipc) = self.ipc {
            config.ipc = ipc;
        }
        if let Some(network) = self.network {
            config.network = network;
        }
        if let Some(cgroup) = self.cgroup {
            config.cgroup = cgroup;
        }
        if let Some(time) = self.time {
            config.time = time;
        }
        if let Some(pid) = self.pid {
            config.pid = pid;
        }
        if let Some(hostname) = self.hostname {
            config.hostname = hostname;
        }
        if let Some(env) = self.env {
            config.env = env;
        }
        if let Some(volume) = self.volume {
            config.mounts = volume;
        }
        if let Some(label) = self.label {
            config.labels = label;
        }

        log::debug!("saving config to {:?}", config_path);
        config.save(&config_path)?;

        log::debug!("configured {} successfully", self.container);
        log::warn!(
            "please stop {} and start again to take effect",
            self.container
        );

        println!("{}", self.container);

        Ok(())
    }
}
