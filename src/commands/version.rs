//! Show engine version.

use std::process::Command;

use anyhow::Result;
use clap::Args;

use crate::paths::Paths;

#[derive(Args, Debug)]
pub struct Version {}

impl Version {
    pub fn exec(self, paths: &Paths) -> Result<()> {
        println!("lilipod version: {}", crate::VERSION);

        if let Ok(output) = Command::new(paths.bin_dir().join("pty"))
            .arg("version")
            .output()
        {
            if output.status.success() {
                println!(
                    "lilipod pty agent version: {}",
                    String::from_utf8_lossy(&output.stdout).trim()
                );
            }
        }

        Ok(())
    }
}
