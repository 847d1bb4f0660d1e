//! Start one or more existing containers.

use std::fs;
use std::thread;

use anyhow::{bail, Result};
use clap::Args;

use crate::container;
use crate::container::config::Config;
use crate::error::Error;
use crate::paths::Paths;
use crate::process::fake_root::{self, PrivilegeState};
use crate::process::launcher;

#[derive(Args, Debug)]
pub struct Start {
    /// Start all containers regardless of their state or configuration
    #[arg(short, long)]
    all: bool,
    /// Keep process in foreground
    #[arg(short, long)]
    interactive: bool,
    /// Allocate a pseudo-TTY
    #[arg(short, long)]
    tty: bool,
    /// Containers to start
    containers: Vec<String>,
}

impl Start {
    pub fn exec(self, paths: &Paths, state: &PrivilegeState) -> Result<()> {
        if fake_root::ensure_fake_root(state, self.interactive)? {
            return Ok(());
        }

        let mut targets = self.containers.clone();

        if self.all {
            targets = fs::read_dir(paths.container_dir())?
                .flatten()
                .map(|e| e.file_name().to_string_lossy().to_string())
                .collect();
        }

        if targets.is_empty() {
            bail!("no container specified");
        }

        let mut workers = Vec::new();

        for target in targets {
            if container::is_running(paths, &target) {
                return Err(Error::AlreadyRunning(target).into());
            }

            let config_path = container::get_dir(paths, &target).join("config");
            if !config_path.exists() {
                return Err(Error::NotFound {
                    kind: "container",
                    name: target,
                }
                .into());
            }

            let config = Config::load(&config_path)?;
            log::debug!("starting: {}", target);

            let paths = paths.clone();
            let state = state.clone();
            let interactive = self.interactive;
            let tty = self.tty;
            workers.push(thread::spawn(move || {
                launcher::start(&paths, &state, interactive, tty, &config)
            }));
        }

        for worker in workers {
            match worker.join() {
                Ok(result) => result?,
                Err(_) => bail!("container runner panicked"),
            }
        }

        Ok(())
    }
}
