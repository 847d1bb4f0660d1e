//! Remove images from local storage.

use std::fs;

use anyhow::Result;
use clap::Args;

use crate::error::Error;
use crate::image;
use crate::paths::Paths;

#[derive(Args, Debug)]
pub struct Rmi {
    /// Remove all images
    #[arg(short, long)]
    all: bool,
    /// Images to remove
    images: Vec<String>,
}

impl Rmi {
    pub fn exec(self, paths: &Paths) -> Result<()> {
        if self.all {
            fs::remove_dir_all(paths.image_dir())?;
            return Ok(());
        }

        if self.images.is_empty() {
            return Err(Error::NotFound {
                kind: "image",
                name: "(none specified)".to_string(),
            }
            .into());
        }

        for img in &self.images {
            let target_dir = image::get_path(paths, img);
            if !target_dir.exists() {
                return Err(Error::NotFound {
                    kind: "image",
                    name: img.clone(),
                }
                .into());
            }

            log::debug!("deleting: {}", img);
            fs::remove_dir_all(&target_dir)?;

            println!("{}", img);
        }

        Ok(())
    }
}
