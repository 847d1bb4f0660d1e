//! Level-filtered logging to stderr behind the `log` facade.

use std::io::{stderr, Write};

use anyhow::Result;
use log::{LevelFilter, Log, Metadata, Record};
use once_cell::sync::OnceCell;

static LILIPOD_LOGGER: OnceCell<LilipodLogger> = OnceCell::new();

/// Initialize the global logger with the level given on the command line.
/// Accepted levels are `mute`, `error`, `warn`, `debug` and `trace`;
/// anything else falls back to `warn`.
pub fn init(log_level: &str) -> Result<()> {
    let level_filter = match log_level.to_lowercase().as_str() {
        "mute" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" | "warning" => LevelFilter::Warn,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Warn,
    };

    let logger = LILIPOD_LOGGER.get_or_init(|| LilipodLogger {
        level: level_filter.to_level(),
    });
    // set_logger fails when called twice in-process; the level is already
    // in place then, so the error can be ignored.
    let _ = log::set_logger(logger).map(|()| log::set_max_level(level_filter));

    Ok(())
}

/// The level the logger was initialized with, in the spelling understood by
/// `init`. Used to propagate `--log-level` across re-execs.
pub fn level() -> &'static str {
    match log::max_level() {
        LevelFilter::Off => "mute",
        LevelFilter::Error => "error",
        LevelFilter::Warn => "warn",
        LevelFilter::Info | LevelFilter::Debug => "debug",
        LevelFilter::Trace => "trace",
    }
}

struct LilipodLogger {
    level: Option<log::Level>,
}

impl Log for LilipodLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        if let Some(level) = self.level {
            metadata.level() <= level
        } else {
            false
        }
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let tag = match record.level() {
                log::Level::Error => "[error]",
                log::Level::Warn => "[warn]",
                _ => "[debug]",
            };
            let msg = match (record.file(), record.line()) {
                (Some(file), Some(line)) => {
                    format!("{}:{} {} {}", file, line, tag, record.args())
                }
                (_, _) => format!("{} {}", tag, record.args()),
            };
            let _ = writeln!(stderr(), "{}", msg);
        }
    }

    fn flush(&self) {
        let _ = stderr().flush();
    }
}
