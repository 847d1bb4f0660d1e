//! List images in local storage.

use std::fs;
use std::io::{self, Write};

use anyhow::Result;
use clap::Args;
use tabwriter::TabWriter;

use crate::image::store;
use crate::paths::Paths;
use crate::utils;

#[derive(Args, Debug)]
pub struct Images {
    /// Display image digests
    #[arg(long)]
    digests: bool,
    /// Do not truncate data
    #[arg(long)]
    no_trunc: bool,
    /// Display only image IDs
    #[arg(short, long)]
    quiet: bool,
}

impl Images {
    pub fn exec(self, paths: &Paths) -> Result<()> {
        let entries = match fs::read_dir(paths.image_dir()) {
            Ok(entries) => entries,
            Err(_) => {
                eprintln!("no images found");
                return Ok(());
            }
        };

        let mut content = String::new();
        for entry in entries.flatten() {
            let image = entry.file_name().to_string_lossy().to_string();

            if self.quiet {
                println!("{}", image);
                continue;
            }

            self.image_row(paths, &image, &mut content)?;
        }

        if self.quiet {
            return Ok(());
        }

        let mut tw = TabWriter::new(io::stdout());
        if self.digests {
            writeln!(tw, "REPOSITORY\tTAG\tDIGEST\tIMAGE ID\tSIZE")?;
        } else {
            writeln!(tw, "REPOSITORY\tTAG\tIMAGE ID\tSIZE")?;
        }
        write!(tw, "{}", content)?;
        tw.flush()?;

        Ok(())
    }

    fn image_row(&self, paths: &Paths, image: &str, content: &mut String) -> Result<()> {
        let image_dir = paths.image_path(image);

        let image_name = match fs::read_to_string(image_dir.join("image_name")) {
            Ok(name) => name,
            Err(_) => {
                // an image dir without its name file is debris from an
                // aborted pull, sweep it and carry on
                log::warn!("found invalid image {}, cleaning up", image);
                fs::remove_dir_all(&image_dir)?;
                return Ok(());
            }
        };

        let (repository, tag) = image_name
            .trim()
            .rsplit_once(':')
            .map(|(r, t)| (r.to_string(), t.to_string()))
            .unwrap_or((image_name.trim().to_string(), String::new()));

        let size = utils::disk_usage_megabytes(&image_dir)?;

        if self.digests {
            let mut checksum = store::digest_sha256(&image_dir.join("manifest.json"))
                .unwrap_or_default();
            if !self.no_trunc {
                checksum.truncate(12);
            }

            content.push_str(&format!(
                "{}\t{}\tsha256:{}\t{}\t{}\n",
                repository, tag, checksum, image, size
            ));
            return Ok(());
        }

        content.push_str(&format!("{}\t{}\t{}\t{}\n", repository, tag, image, size));
        Ok(())
    }
}
