//! Pull an image from a registry.

use anyhow::Result;
use clap::Args;

use crate::image;
use crate::paths::Paths;

#[derive(Args, Debug)]
pub struct Pull {
    /// Suppress output
    #[arg(short, long)]
    quiet: bool,
    /// Images to pull
    #[arg(required = true)]
    images: Vec<String>,
}

impl Pull {
    pub fn exec(self, paths: &Paths) -> Result<()> {
        for image in &self.images {
            let id = image::pull::pull(paths, image, self.quiet)?;
            println!("{}", id);
        }

        Ok(())
    }
}
