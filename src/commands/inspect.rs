//! Inspect a container or image.

use anyhow::{bail, Result};
use clap::Args;

use crate::container;
use crate::image;
use crate::paths::Paths;

#[derive(Args, Debug)]
pub struct Inspect {
    /// Show container size
    #[arg(short, long)]
    size: bool,
    /// Pretty-print output using a format template
    #[arg(long)]
    format: Option<String>,
    /// Type of object to inspect
    #[arg(short = 't', long = "type", default_value = "container")]
    object_type: String,
    /// Objects to inspect
    #[arg(required = true)]
    objects: Vec<String>,
}

impl Inspect {
    pub fn exec(self, paths: &Paths) -> Result<()> {
        if self.size && self.object_type == "image" {
            bail!("size is not supported for type image");
        }

        let mut format = self.format.clone().unwrap_or_default();
        if !format.is_empty() && !format.ends_with('\n') {
            format.push('\n');
        }

        // compatibility with docker-style template paths
        format = format.replace(".State.Status", ".Status");
        format = format.replace(".Config.Env", ".Env");

        let output = match self.object_type.as_str() {
            "container" => container::inspect(paths, &self.objects, self.size, &format)?,
            "image" => image::inspect(paths, &self.objects, &format)?,
            _ => bail!("unsupported inspect type"),
        };

        if output.is_empty() {
            bail!("no such object: {:?}", self.objects);
        }

        println!("{}", output);

        Ok(())
    }
}
