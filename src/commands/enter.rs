//! Hidden phase command: runs inside the container's fresh namespaces and
//! becomes the container process.

use anyhow::Result;
use clap::Args;

use crate::container::config::Config;
use crate::paths::Paths;
use crate::process::fake_root::PrivilegeState;
use crate::process::launcher;

#[derive(Args, Debug)]
pub struct Enter {
    /// Serialized container config
    #[arg(long)]
    config: String,
    /// Run the entrypoint under the pty agent
    #[arg(long)]
    tty: bool,
}

impl Enter {
    pub fn exec(self, paths: &Paths, state: &PrivilegeState) -> Result<()> {
        let config = Config::from_slice(self.config.as_bytes())?;

        launcher::enter(paths, state, &config, self.tty)
    }
}
