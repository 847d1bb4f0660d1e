//! Create a container and start it right away.

use std::fs;

use anyhow::Result;
use clap::Args;

use crate::commands::create::CreateOptions;
use crate::container;
use crate::container::config::Config;
use crate::container::rootfs;
use crate::error::Error;
use crate::image;
use crate::paths::Paths;
use crate::process::fake_root::{self, PrivilegeState};
use crate::process::launcher;

#[derive(Args, Debug)]
pub struct Run {
    /// Run the container in the background
    #[arg(short, long)]
    detach: bool,
    /// Keep process in foreground
    #[arg(short, long)]
    interactive: bool,
    /// Allocate a pseudo-TTY
    #[arg(short, long)]
    tty: bool,
    /// Delete container at the end of execution
    #[arg(long)]
    rm: bool,
    #[command(flatten)]
    options: CreateOptions,
}

impl Run {
    pub fn exec(self, paths: &Paths, state: &PrivilegeState) -> Result<()> {
        let interactive = self.interactive && !self.detach;
        let tty = self.tty && !self.detach;

        if fake_root::ensure_fake_root(state, interactive || tty)? {
            return Ok(());
        }

        let create_config = self.options.to_config(paths, state)?;
        let name = create_config.names.clone();

        if container::get_dir(paths, &name).join("config").exists() {
            return Err(Error::AlreadyExists {
                kind: "container",
                name,
            }
            .into());
        }

        if self.options.pull {
            log::debug!("pulling image: {}", self.options.image);
            image::pull::pull(paths, &self.options.image, false)?;
        }

        log::debug!("preparing rootfs for: {}", name);
        let image_ref = create_config.image.clone();
        rootfs::create_rootfs(paths, state, &image_ref, &name, create_config)?;

        let config = Config::load(&container::get_dir(paths, &name).join("config"))?;

        log::debug!("starting: {}", name);
        let result = launcher::start(paths, state, interactive, tty, &config);

        if self.rm {
            let _ = fs::remove_dir_all(container::get_dir(paths, &name));
            let _ = fs::remove_dir_all(paths.volume_dir().join(container::get_id(paths, &name)));
        }

        result
    }
}
