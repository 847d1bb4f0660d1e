//! Rename a container.

use anyhow::Result;
use clap::Args;

use crate::container;
use crate::paths::Paths;
use crate::process::fake_root::{self, PrivilegeState};

#[derive(Args, Debug)]
pub struct Rename {
    /// Current container name
    old_name: String,
    /// New container name
    new_name: String,
}

impl Rename {
    pub fn exec(self, paths: &Paths, state: &PrivilegeState) -> Result<()> {
        if fake_root::ensure_fake_root(state, true)? {
            return Ok(());
        }

        container::rename(paths, &self.old_name, &self.new_name)
    }
}
