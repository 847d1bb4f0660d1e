//! List containers.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};

use anyhow::Result;
use clap::Args;
use tabwriter::TabWriter;

use crate::container::{self, FILTER_SEPARATOR};
use crate::paths::Paths;
use crate::template;

#[derive(Args, Debug)]
pub struct Ps {
    /// Show all containers, not only running ones
    #[arg(short, long)]
    all: bool,
    /// Do not truncate data
    #[arg(long)]
    no_trunc: bool,
    /// Do not print headers
    #[arg(long)]
    noheading: bool,
    /// Display only container IDs
    #[arg(short, long)]
    quiet: bool,
    /// Display the total file sizes
    #[arg(short, long)]
    size: bool,
    /// Pretty-print output using a format template
    #[arg(long)]
    format: Option<String>,
    /// Filter output based on conditions given
    #[arg(short, long)]
    filter: Vec<String>,
}

impl Ps {
    pub fn exec(self, paths: &Paths) -> Result<()> {
        let filters = parse_filters(&self.filter);

        let entries = match fs::read_dir(paths.container_dir()) {
            Ok(entries) => entries,
            Err(_) => {
                eprintln!("no containers found");
                return Ok(());
            }
        };

        let mut content = String::new();

        for entry in entries.flatten() {
            let dir_name = entry.file_name().to_string_lossy().to_string();

            if self.quiet {
                println!("{}", container::get_id(paths, &dir_name));
                continue;
            }

            self.container_row(paths, &dir_name, &filters, &mut content)?;
        }

        if self.format.is_some() || self.quiet {
            return Ok(());
        }

        let mut tw = TabWriter::new(io::stdout());
        if !self.noheading {
            if self.size {
                writeln!(
                    tw,
                    "CONTAINER ID\tIMAGE\tCOMMAND\tCREATED\tSTATUS\tLABELS\tNAMES\tSIZE"
                )?;
            } else {
                writeln!(tw, "CONTAINER ID\tIMAGE\tCOMMAND\tCREATED\tSTATUS\tLABELS\tNAMES")?;
            }
        }
        write!(tw, "{}", content)?;
        tw.flush()?;

        Ok(())
    }

    fn container_row(
        &self,
        paths: &Paths,
        dir_name: &str,
        filters: &HashMap<String, String>,
        content: &mut String,
    ) -> Result<()> {
        let config = match container::get_container_info(paths, dir_name, self.size, filters)? {
            Some(config) => config,
            None => return Ok(()),
        };

        if let Some(format) = &self.format {
            let record = serde_json::to_value(&config)?;
            println!("{}", template::render(format, &record));
            return Ok(());
        }

        if config.status != "running" && !self.all {
            return Ok(());
        }

        let mut labels = config.labels.join(",");
        if labels.len() > 16 && !self.no_trunc {
            labels.truncate(15);
            labels.push_str("...");
        }

        let mut command = config.entrypoint.join(" ");
        if command.len() > 16 && !self.no_trunc {
            command.truncate(15);
            command.push_str("...");
        }

        if self.size {
            content.push_str(&format!(
                "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\n",
                dir_name,
                config.image,
                command,
                config.created,
                config.status,
                labels,
                config.names,
                config.size
            ));
        } else {
            content.push_str(&format!(
                "{}\t{}\t{}\t{}\t{}\t{}\t{}\n",
                dir_name, config.image, command, config.created, config.status, labels, config.names
            ));
        }

        Ok(())
    }
}

/// Split `key=value` filter arguments into a map; repeated label filters
/// accumulate behind the separator.
fn parse_filters(input: &[String]) -> HashMap<String, String> {
    let mut filters = HashMap::new();

    for filter in input {
        let (name, value) = match filter.split_once('=') {
            Some((name, value)) => (name, value),
            None => continue,
        };

        match name {
            "label" => {
                filters
                    .entry("label".to_string())
                    .and_modify(|existing: &mut String| {
                        existing.push(FILTER_SEPARATOR);
                        existing.push_str(value);
                    })
                    .or_insert_with(|| value.to_string());
            }
            "status" | "name" | "id" => {
                filters.insert(name.to_string(), value.to_string());
            }
            other => {
                log::warn!("invalid filter {}, skipping", other);
                log::warn!("valid filters are: label, status, name, id");
            }
        }
    }

    filters
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_filters() {
        let input = vec![
            "name=web".to_string(),
            "label=a=1".to_string(),
            "label=b=2".to_string(),
            "bogus=x".to_string(),
        ];
        let filters = parse_filters(&input);

        assert_eq!(filters.get("name").map(String::as_str), Some("web"));
        assert_eq!(
            filters.get("label").cloned(),
            Some(format!("a=1{}b=2", FILTER_SEPARATOR))
        );
        assert!(!filters.contains_key("bogus"));
    }
}
