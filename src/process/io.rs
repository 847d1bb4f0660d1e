//! Stdio handling for container child processes.
//!
//! Three start modes: tty (inherit the terminal), interactive (pipe and
//! relay both output streams), detached (background the child as a session
//! leader and capture its streams into the container's log file).

use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Read, Write};
use std::os::unix::process::CommandExt;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::process::discovery;

/// Run the command on the caller's terminal and wait for it.
pub fn run_with_tty(
    cmd: &mut Command,
    after_spawn: impl FnOnce(i32) -> Result<()>,
) -> Result<()> {
    log::debug!("tty specified, inheriting stdio");

    let mut child = cmd.spawn().context("failed to spawn child")?;
    after_spawn(child.id() as i32)?;

    wait_status(&mut child)
}

/// Forward the caller's stdin and relay the child's stdout/stderr.
pub fn run_interactive(
    cmd: &mut Command,
    after_spawn: impl FnOnce(i32) -> Result<()>,
) -> Result<()> {
    log::debug!("interactive but no tty, setting up pipes");

    cmd.stdin(Stdio::inherit())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = cmd.spawn().context("failed to spawn child")?;
    after_spawn(child.id() as i32)?;

    let stdout = child.stdout.take().context("child stdout missing")?;
    let stderr = child.stderr.take().context("child stderr missing")?;

    let out = thread::spawn(move || relay(stdout, io::stdout()));
    let err = thread::spawn(move || relay(stderr, io::stderr()));

    let status = wait_status(&mut child);
    let _ = out.join();
    let _ = err.join();

    status
}

/// Run the command in the background, appending its timestamped output to
/// `logfile`. The calling process stays alive as the log pump and exits when
/// the child disappears.
pub fn run_detached(
    cmd: &mut Command,
    logfile: &Path,
    after_spawn: impl FnOnce(i32) -> Result<()>,
) -> Result<()> {
    log::debug!("not interactive and no tty, capturing output to {:?}", logfile);

    // start fresh on every run
    File::create(logfile).with_context(|| format!("failed to truncate {:?}", logfile))?;

    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    unsafe {
        cmd.pre_exec(|| {
            nix::unistd::setsid().map_err(io::Error::from)?;
            Ok(())
        });
    }

    let mut child = cmd.spawn().context("failed to spawn child")?;
    after_spawn(child.id() as i32)?;

    let stdout = child.stdout.take().context("child stdout missing")?;
    let stderr = child.stderr.take().context("child stderr missing")?;

    let sink = Arc::new(Mutex::new(
        OpenOptions::new().append(true).open(logfile)?,
    ));

    let out_sink = Arc::clone(&sink);
    let out = thread::spawn(move || capture(stdout, "out", &out_sink));
    let err_sink = Arc::clone(&sink);
    let err = thread::spawn(move || capture(stderr, "err", &err_sink));

    // exit with the child if it disappears without its pipes closing
    let child_pid = child.id() as i32;
    let reaped = Arc::new(AtomicBool::new(false));
    let watchdog_flag = Arc::clone(&reaped);
    thread::spawn(move || loop {
        thread::sleep(Duration::from_secs(5));
        if watchdog_flag.load(Ordering::Relaxed) {
            return;
        }
        if !discovery::is_pid_running(child_pid) {
            std::process::exit(0);
        }
    });

    let _ = out.join();
    let _ = err.join();

    let status = wait_status(&mut child);
    reaped.store(true, Ordering::Relaxed);
    status
}

/// Spawn the command fully detached as its own session leader, without
/// waiting for it.
pub fn detach(cmd: &mut Command) -> Result<Child> {
    unsafe {
        cmd.pre_exec(|| {
            nix::unistd::setsid().map_err(io::Error::from)?;
            Ok(())
        });
    }

    cmd.spawn().context("failed to spawn detached child")
}

/// Tag and append one stream, line by line. Each line is flushed so `logs
/// -f` sees output promptly; capture ends when the pipe reaches EOF.
fn capture(stream: impl Read, tag: &str, sink: &Mutex<File>) {
    let reader = BufReader::new(stream);
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(_) => break,
        };

        let stamped = format!("{}:{}:{}\n", chrono::Utc::now().timestamp(), tag, line);
        if let Ok(mut file) = sink.lock() {
            if file.write_all(stamped.as_bytes()).is_err() {
                log::error!("could not log output line");
            }
            let _ = file.flush();
        }
    }
}

fn relay(mut from: impl Read, mut to: impl Write) {
    let _ = io::copy(&mut from, &mut to);
}

fn wait_status(child: &mut Child) -> Result<()> {
    let status = child.wait().context("failed to wait for child")?;
    if !status.success() {
        bail!("child exited with {}", status);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_detached_log_format() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let logfile = dir.path().join("current-logs");

        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg("echo A; echo B 1>&2");
        run_detached(&mut cmd, &logfile, |_| Ok(()))?;

        let content = std::fs::read_to_string(&logfile)?;
        let mut out_lines = 0;
        let mut err_lines = 0;
        for line in content.lines() {
            let mut parts = line.splitn(3, ':');
            let stamp: i64 = parts.next().unwrap().parse().expect("unix timestamp");
            assert!(stamp > 0);
            match parts.next().unwrap() {
                "out" => {
                    out_lines += 1;
                    assert_eq!(parts.next(), Some("A"));
                }
                "err" => {
                    err_lines += 1;
                    assert_eq!(parts.next(), Some("B"));
                }
                other => panic!("unknown stream tag {}", other),
            }
        }
        assert_eq!((out_lines, err_lines), (1, 1));
        Ok(())
    }

    #[test]
    fn test_run_detached_truncates_previous_logs() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let logfile = dir.path().join("current-logs");
        std::fs::write(&logfile, "1:out:stale\n")?;

        let mut cmd = Command::new("true");
        run_detached(&mut cmd, &logfile, |_| Ok(()))?;

        let content = std::fs::read_to_string(&logfile)?;
        assert!(!content.contains("stale"));
        Ok(())
    }

    #[test]
    fn test_run_with_tty_propagates_failure() {
        let mut cmd = Command::new("false");
        assert!(run_with_tty(&mut cmd, |_| Ok(())).is_err());
    }
}
