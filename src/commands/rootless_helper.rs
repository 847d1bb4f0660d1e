//! Hidden phase command: execute the wrapped command as fake root.
//!
//! Without `--child` this is the mapping parent; with it, the mapping child
//! running inside the new user namespace.

use anyhow::Result;
use clap::Args;

use crate::process::fake_root::{self, PrivilegeState};

#[derive(Args, Debug)]
pub struct RootlessHelper {
    /// Run the mapping-child phase
    #[arg(long)]
    child: bool,
    /// The command to wrap
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    arguments: Vec<String>,
}

impl RootlessHelper {
    pub fn exec(self, state: &PrivilegeState) -> Result<()> {
        if self.child {
            fake_root::helper_child(state, &self.arguments)
        } else {
            fake_root::helper_parent(state, &self.arguments)
        }
    }
}
