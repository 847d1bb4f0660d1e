//! Container lifecycle: identity, discovery, info rows, stop, exec and
//! rename.

pub mod config;
pub mod mounts;
pub mod rootfs;

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use std::thread::sleep;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Local;
use md5::{Digest, Md5};
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;

use crate::error::Error;
use crate::paths::Paths;
use crate::process::discovery::{Locator, ProcLocator};
use crate::process::launcher::PTY_AGENT_PATH;
use crate::process::user;
use crate::template;
use crate::utils;

/// Separator joining multiple values of one filter key.
pub const FILTER_SEPARATOR: char = '\0';

/// Timestamp format recorded in `created`.
pub const CREATED_FORMAT: &str = "%Y.%m.%d %H:%M:%S";

/// Returns the md5sum based ID for the given container name. If a known ID
/// is passed, it is returned unchanged, so names and IDs resolve alike.
pub fn get_id(paths: &Paths, name: &str) -> String {
    if paths.container_path(name).exists() {
        return name.to_string();
    }

    format!("{:x}", Md5::digest(name.as_bytes()))
}

/// The directory holding the container's config and rootfs.
pub fn get_dir(paths: &Paths, name: &str) -> PathBuf {
    paths.container_path(&get_id(paths, name))
}

/// The container's rootfs directory.
pub fn get_rootfs_dir(paths: &Paths, name: &str) -> PathBuf {
    get_dir(paths, name).join("rootfs")
}

/// Pid of the process running the container, found by scanning `/proc` for
/// the container's identity file.
pub fn get_pid(paths: &Paths, name: &str) -> Option<i32> {
    let id = get_id(paths, name);
    ProcLocator.find(&id)
}

/// Whether the container name or id is running.
pub fn is_running(paths: &Paths, name: &str) -> bool {
    get_pid(paths, name).is_some()
}

/// Load a container's config enriched with its observed state.
///
/// A malformed config means the container dir is garbage; it is swept via a
/// self-invoked `rm` and `None` is returned so listing continues. `None` is
/// also returned when the config does not match the filters.
pub fn get_container_info(
    paths: &Paths,
    container: &str,
    size: bool,
    filters: &HashMap<String, String>,
) -> Result<Option<config::Config>> {
    let config_path = paths.container_path(container).join("config");

    let mut conf = match config::Config::load(&config_path) {
        Ok(conf) => conf,
        Err(_) => {
            log::warn!("found invalid container {}, cleaning up", container);
            let _ = Command::new("/proc/self/exe")
                .args(["rm", container])
                .status();
            return Ok(None);
        }
    };

    conf.status = observed_status(paths, &conf).to_string();

    if !filter_container(&conf, filters) {
        return Ok(None);
    }

    if size {
        conf.size = utils::disk_usage_megabytes(&paths.container_path(container))?;
    }

    Ok(Some(conf))
}

/// The container's state as observable from disk and `/proc`: running when a
/// live process carries its identity file, created when it was never
/// started (no identity file in the rootfs yet), stopped otherwise.
pub fn observed_status(paths: &Paths, conf: &config::Config) -> &'static str {
    if is_running(paths, &conf.names) {
        return "running";
    }

    if paths
        .container_path(&conf.id)
        .join("rootfs/run/.containerenv")
        .exists()
    {
        "stopped"
    } else {
        "created"
    }
}

/// Whether a container's config matches every given filter.
pub fn filter_container(conf: &config::Config, filters: &HashMap<String, String>) -> bool {
    if filters.is_empty() {
        return true;
    }

    let mut matched = 0;

    for (name, filter) in filters {
        match name.as_str() {
            "label" => {
                for filter_label in filter.split(FILTER_SEPARATOR) {
                    if conf.labels.iter().any(|l| l == filter_label) {
                        matched += 1;
                    }
                }
            }
            "status" => {
                if conf.status == *filter {
                    matched += 1;
                }
            }
            "name" => {
                if conf.names == *filter {
                    matched += 1;
                }
            }
            "id" => {
                if conf.id == *filter {
                    matched += 1;
                }
            }
            other => {
                log::warn!("invalid filter {}, skipping", other);
                log::warn!("valid filters are: label, status, name, id");
            }
        }
    }

    matched >= filters.len()
}

/// Change the name of a container, moving its directory and rewriting the
/// identity fields of its config.
pub fn rename(paths: &Paths, old_name: &str, new_name: &str) -> Result<()> {
    if !get_dir(paths, old_name).exists() {
        return Err(Error::NotFound {
            kind: "container",
            name: old_name.to_string(),
        }
        .into());
    }

    if get_dir(paths, new_name).exists() {
        return Err(Error::AlreadyExists {
            kind: "container",
            name: new_name.to_string(),
        }
        .into());
    }

    let old_dir = get_dir(paths, old_name);
    let new_id = format!("{:x}", Md5::digest(new_name.as_bytes()));
    let new_dir = paths.container_path(&new_id);

    log::debug!("renaming {} to {}", old_name, new_name);
    fs::rename(&old_dir, &new_dir)
        .with_context(|| format!("cannot rename {} to {}", old_name, new_name))?;

    let config_path = new_dir.join("config");
    let mut conf = config::Config::load(&config_path)?;
    conf.names = new_name.to_string();
    conf.id = new_id;
    conf.created = Local::now().format(CREATED_FORMAT).to_string();

    Ok(conf.save(&config_path)?)
}

/// Resolve a configured `stop-signal` value. A number is taken as-is;
/// otherwise the handful of signals services are customarily stopped with
/// are understood by name, with or without the SIG prefix.
fn resolve_stop_signal(name: &str) -> Result<Signal> {
    let upper = name.to_ascii_uppercase();

    if let Ok(number) = upper.parse::<i32>() {
        return Signal::try_from(number)
            .map_err(|_| Error::InvalidConfig(format!("{} is not a valid signal", name)).into());
    }

    let signal = match upper.strip_prefix("SIG").unwrap_or(&upper) {
        "HUP" => Signal::SIGHUP,
        "INT" => Signal::SIGINT,
        "QUIT" => Signal::SIGQUIT,
        "KILL" => Signal::SIGKILL,
        "USR1" => Signal::SIGUSR1,
        "USR2" => Signal::SIGUSR2,
        "TERM" => Signal::SIGTERM,
        "STOP" => Signal::SIGSTOP,
        "CONT" => Signal::SIGCONT,
        "WINCH" => Signal::SIGWINCH,
        _ => {
            return Err(
                Error::InvalidConfig(format!("{} is not a valid stop signal", name)).into(),
            )
        }
    };

    Ok(signal)
}

/// Stop a running container: deliver its stop signal, poll once a second up
/// to `timeout` seconds, then SIGKILL whatever survived. With `force` the
/// SIGKILL is immediate.
pub fn stop(paths: &Paths, name: &str, force: bool, timeout: u32, stop_signal: &str) -> Result<()> {
    log::debug!("stopping container {}", name);

    let stop_signal = if stop_signal.is_empty() {
        "SIGTERM"
    } else {
        stop_signal
    };

    let pid = get_pid(paths, name).ok_or_else(|| Error::NotRunning(name.to_string()))?;
    log::debug!("container pid is {}", pid);

    if force {
        kill(Pid::from_raw(pid), Signal::SIGKILL)?;
        return Ok(());
    }

    kill(Pid::from_raw(pid), resolve_stop_signal(stop_signal)?)?;

    let mut remaining = timeout;
    loop {
        if remaining == 0 {
            log::warn!("timeout exceeded, force killing");
            kill(Pid::from_raw(pid), Signal::SIGKILL)?;
            return Ok(());
        }

        sleep(Duration::from_secs(1));

        if get_pid(paths, name).is_none() {
            break;
        }

        remaining -= 1;
    }

    Ok(())
}

/// Run a command inside a running container by entering its namespaces with
/// the host `nsenter`.
pub fn exec(
    paths: &Paths,
    pid: i32,
    interactive: bool,
    tty: bool,
    conf: &config::Config,
) -> Result<()> {
    use crate::container::config::PRIVATE;
    use crate::process::io;

    let mut args: Vec<String> = vec![
        "-m".into(),
        "-u".into(),
        "-U".into(),
        "--preserve-credentials".into(),
    ];

    if conf.ipc == PRIVATE {
        args.push("-i".into());
    }
    if conf.network == PRIVATE {
        args.push("-n".into());
    }
    if conf.pid == PRIVATE {
        args.push("-p".into());
    }

    let (uid, gid) = user::get_uid_gid(&conf.user);
    args.push("-S".into());
    args.push(uid.to_string());
    args.push("-G".into());
    args.push(gid.to_string());
    args.push(format!("-r/proc/{}/root", pid));
    args.push(format!("-w/proc/{}/root{}", pid, conf.workdir));
    args.push("-t".into());
    args.push(pid.to_string());

    if tty {
        args.push(PTY_AGENT_PATH.to_string());
    }
    args.extend(conf.entrypoint.iter().cloned());

    log::debug!("executing nsenter: {:?}", args);

    let mut cmd = Command::new("nsenter");
    cmd.args(&args);
    cmd.env_clear();
    cmd.envs(conf.env.iter().filter_map(|e| e.split_once('=')));

    if tty {
        return io::run_with_tty(&mut cmd, |_| Ok(()));
    }

    if interactive {
        return io::run_interactive(&mut cmd, |_| Ok(()));
    }

    let logfile = get_dir(paths, &conf.names).join("current-logs");
    io::run_detached(&mut cmd, &logfile, |_| Ok(()))
}

/// Return a JSON dump or a formatted string describing the input
/// containers.
pub fn inspect(paths: &Paths, containers: &[String], size: bool, format: &str) -> Result<String> {
    let mut result = String::new();

    for container in containers {
        let id = get_id(paths, container);
        let config_path = paths.container_path(&id).join("config");

        let mut conf = config::Config::load(&config_path)?;

        conf.status = observed_status(paths, &conf).to_string();

        if size {
            conf.size = utils::disk_usage_megabytes(&paths.container_path(&id))?;
        }

        if !format.is_empty() {
            let record = serde_json::to_value(&conf)?;
            result += &template::render(format, &record);
            continue;
        }

        result += &serde_json::to_string_pretty(&conf)?;
        result += "\n";
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_paths() -> (tempfile::TempDir, Paths) {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths {
            home: dir.path().to_path_buf(),
        };
        (dir, paths)
    }

    #[test]
    fn test_get_id_is_md5_hex() {
        let (_dir, paths) = temp_paths();
        // md5("web")
        assert_eq!(get_id(&paths, "web"), "2567a5ec9705eb7ac2c984033e06189d");
        assert_eq!(get_id(&paths, "web").len(), 32);
    }

    #[test]
    fn test_get_id_passes_known_ids_through() {
        let (_dir, paths) = temp_paths();
        let id = get_id(&paths, "web");
        fs::create_dir_all(paths.container_path(&id)).unwrap();
        assert_eq!(get_id(&paths, &id), id);
    }

    #[test]
    fn test_resolve_stop_signal() {
        assert_eq!(resolve_stop_signal("SIGTERM").unwrap(), Signal::SIGTERM);
        assert_eq!(resolve_stop_signal("term").unwrap(), Signal::SIGTERM);
        assert_eq!(resolve_stop_signal("usr1").unwrap(), Signal::SIGUSR1);
        assert_eq!(resolve_stop_signal("9").unwrap(), Signal::SIGKILL);
        assert!(resolve_stop_signal("SIGRAINBOW").is_err());
        assert!(resolve_stop_signal("").is_err());
    }

    #[test]
    fn test_filter_matching() {
        let conf = config::Config {
            names: "web".into(),
            id: "abc".into(),
            status: "running".into(),
            labels: vec!["app=web".into(), "tier=front".into()],
            ..Default::default()
        };

        let mut filters = HashMap::new();
        assert!(filter_container(&conf, &filters));

        filters.insert("name".to_string(), "web".to_string());
        assert!(filter_container(&conf, &filters));

        filters.insert("status".to_string(), "stopped".to_string());
        assert!(!filter_container(&conf, &filters));

        filters.clear();
        filters.insert(
            "label".to_string(),
            format!("app=web{}tier=front", FILTER_SEPARATOR),
        );
        assert!(filter_container(&conf, &filters));

        filters.clear();
        filters.insert("label".to_string(), "app=db".to_string());
        assert!(!filter_container(&conf, &filters));
    }

    #[test]
    fn test_rename_moves_dir_and_rewrites_config() -> Result<()> {
        let (_dir, paths) = temp_paths();

        let old_dir = get_dir(&paths, "old");
        fs::create_dir_all(&old_dir)?;
        let conf = config::Config {
            id: get_id(&paths, "old"),
            names: "old".into(),
            ..Default::default()
        };
        conf.save(&old_dir.join("config"))?;

        rename(&paths, "old", "new")?;

        assert!(!old_dir.exists());
        let new_conf = config::Config::load(&get_dir(&paths, "new").join("config"))?;
        assert_eq!(new_conf.names, "new");
        assert_eq!(new_conf.id, get_id(&paths, "new"));
        Ok(())
    }

    #[test]
    fn test_rename_rejects_existing_destination() -> Result<()> {
        let (_dir, paths) = temp_paths();
        fs::create_dir_all(get_dir(&paths, "a"))?;
        fs::create_dir_all(get_dir(&paths, "b"))?;

        assert!(rename(&paths, "a", "b").is_err());
        assert!(rename(&paths, "missing", "c").is_err());
        Ok(())
    }
}
