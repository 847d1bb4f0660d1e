//! Fetch the logs of a container.
//!
//! The log file carries one line per captured stream chunk in
//! `<unix-seconds>:<out|err>:<message>` form; lines are replayed onto the
//! matching stream, optionally filtered by a time window and optionally
//! prefixed with an RFC3339-nano timestamp.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::thread::sleep;
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use clap::Args;

use crate::container;
use crate::error::Error;
use crate::paths::Paths;

#[derive(Args, Debug)]
pub struct Logs {
    /// Follow log output
    #[arg(short, long)]
    follow: bool,
    /// Show timestamps
    #[arg(short, long)]
    timestamps: bool,
    /// Show logs since input timestamp
    #[arg(long)]
    since: Option<String>,
    /// Show logs until input timestamp
    #[arg(long)]
    until: Option<String>,
    /// Container to read logs from
    container: String,
}

impl Logs {
    pub fn exec(self, paths: &Paths) -> Result<()> {
        if !container::get_dir(paths, &self.container).exists() {
            return Err(Error::NotFound {
                kind: "container",
                name: self.container.clone(),
            }
            .into());
        }

        let file = File::open(container::get_dir(paths, &self.container).join("current-logs"))?;

        let since = self.since.as_deref().map(convert).unwrap_or(0);
        let mut until = self.until.as_deref().map(convert).unwrap_or(0);
        if until <= 0 {
            until = i64::MAX;
        }

        read_log(file, since, until, self.follow, self.timestamps)
    }
}

/// Replay the log file between the two timestamps, onto stdout or stderr
/// depending on each line's stream tag. With `follow` the reader keeps
/// polling for appended lines like `tail -f`.
fn read_log(
    file: File,
    since: i64,
    until: i64,
    follow: bool,
    timestamps: bool,
) -> Result<()> {
    let mut reader = BufReader::new(file);
    let mut line = String::new();

    loop {
        line.clear();
        let read = reader.read_line(&mut line)?;
        if read == 0 {
            if follow {
                // without this sleep the loop would hog the cpu
                sleep(Duration::from_millis(250));
                continue;
            }
            break;
        }

        let (stamp, stream, content) = match parse_line(&line) {
            Some(parsed) => parsed,
            None => continue,
        };

        let content = if timestamps {
            let rendered = Utc
                .timestamp_opt(stamp, 0)
                .single()
                .map(|t| t.to_rfc3339_opts(SecondsFormat::Nanos, true))
                .unwrap_or_default();
            format!("{} {}", rendered, content)
        } else {
            content.to_string()
        };

        if stamp >= since && stamp <= until {
            if stream == "err" {
                write!(io::stderr(), "{}", content)?;
            } else {
                write!(io::stdout(), "{}", content)?;
            }
        }
    }

    Ok(())
}

/// Split a log line at its first two colons.
fn parse_line(line: &str) -> Option<(i64, &str, &str)> {
    let mut parts = line.splitn(3, ':');
    let stamp = parts.next()?.parse().ok()?;
    let stream = parts.next()?;
    let content = parts.next()?;

    Some((stamp, stream, content))
}

/// Convert a user supplied timestamp into unix seconds, accepting the
/// handful of formats the CLI documents. Unparseable input yields 0.
fn convert(input: &str) -> i64 {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(input) {
        return parsed.timestamp();
    }

    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(input, format) {
            return parsed.and_utc().timestamp();
        }
    }

    // date with explicit offset, e.g. 2024-01-02Z or 2024-01-02+02:00
    if input.len() > 10 && input.is_char_boundary(10) {
        let (date, offset) = input.split_at(10);
        if let Ok(parsed) = DateTime::parse_from_rfc3339(&format!("{}T00:00:00{}", date, offset)) {
            return parsed.timestamp();
        }
    }

    if let Ok(parsed) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return parsed
            .and_hms_opt(0, 0, 0)
            .map(|t| t.and_utc().timestamp())
            .unwrap_or(0);
    }

    0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line() {
        let (stamp, stream, content) = parse_line("1700000000:out:hello world\n").unwrap();
        assert_eq!(stamp, 1700000000);
        assert_eq!(stream, "out");
        assert_eq!(content, "hello world\n");

        // message colons stay in the content
        let (_, _, content) = parse_line("1700000000:err:a:b:c\n").unwrap();
        assert_eq!(content, "a:b:c\n");

        assert!(parse_line("garbage\n").is_none());
    }

    #[test]
    fn test_convert_formats() {
        assert_eq!(convert("1970-01-01T00:00:00Z"), 0);
        assert_eq!(convert("2023-11-14T22:13:20Z"), 1700000000);
        assert_eq!(convert("2023-11-14T22:13:20"), 1700000000);
        assert_eq!(convert("2023-11-14"), 1699920000);
        assert_eq!(convert("2023-11-14+02:00"), 1699912800);
        assert_eq!(convert("not a date"), 0);
    }
}
