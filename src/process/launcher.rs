//! Starting containers: namespace creation, keep-id mapping and the final
//! `enter` phase that builds the mount tree and execs the entrypoint.

use std::env;
use std::ffi::CString;
use std::fs;
use std::io;
use std::os::unix::process::CommandExt;
use std::path::Path;
use std::process::Command;
use std::thread::sleep;
use std::time::Duration;

use anyhow::{Context, Result};
use nix::sys::signal::Signal;
use nix::unistd;

use crate::capabilities;
use crate::container::config::{Config, HOST, KEEP_ID};
use crate::container::mounts;
use crate::error::Error;
use crate::logger;
use crate::paths::Paths;
use crate::process::fake_root::PrivilegeState;
use crate::process::idmap::{self, SubIdMap};
use crate::process::io as procio;
use crate::process::user;
use crate::syscall::linux::LinuxSyscall;
use crate::syscall::Syscall;
use crate::utils;

/// Path inside the container where the pty agent is injected.
pub const PTY_AGENT_PATH: &str = "/sbin/pty";

/// Subordinate range assumed when a container predates the maps being
/// recorded in its config.
const FALLBACK_ID_MAP: &str = "1000:100000:65536";

/// Clone flags for the container child, derived from its config. UTS and
/// mount namespaces are always fresh; a user namespace is added for keep-id
/// unless running as real root; the rest follow their `private` settings.
pub fn clone_flags_for(config: &Config, rootful: bool) -> libc::c_int {
    use crate::container::config::PRIVATE;

    let mut flags = libc::CLONE_NEWUTS | libc::CLONE_NEWNS;

    if config.userns == KEEP_ID && !rootful {
        flags |= libc::CLONE_NEWUSER;
    }
    if config.ipc == PRIVATE {
        flags |= libc::CLONE_NEWIPC;
    }
    if config.network == PRIVATE {
        flags |= libc::CLONE_NEWNET;
    }
    if config.pid == PRIVATE {
        flags |= libc::CLONE_NEWPID;
    }
    if config.cgroup == PRIVATE {
        flags |= libc::CLONE_NEWCGROUP;
    }
    if config.time == PRIVATE {
        flags |= libc::CLONE_NEWTIME;
    }

    flags
}

/// The keep-id maps for a container, from its config or the fallback.
fn keep_id_maps(config: &Config) -> Result<(SubIdMap, SubIdMap)> {
    let uid_map = if config.uidmap.is_empty() {
        log::warn!("cannot find uidmap, defaulting to {}", FALLBACK_ID_MAP);
        FALLBACK_ID_MAP.parse()?
    } else {
        config.uidmap.parse()?
    };

    let gid_map = if config.gidmap.is_empty() {
        log::warn!("cannot find gidmap, defaulting to {}", FALLBACK_ID_MAP);
        FALLBACK_ID_MAP.parse()?
    } else {
        config.gidmap.parse()?
    };

    Ok((uid_map, gid_map))
}

/// Start the container described by `config`.
///
/// With tty the session runs on the caller's terminal under the pty agent;
/// interactive relays the output streams; otherwise the child is detached
/// and its output captured into `current-logs`.
pub fn start(
    paths: &Paths,
    state: &PrivilegeState,
    interactive: bool,
    tty: bool,
    config: &Config,
) -> Result<()> {
    let container_dir = paths.container_path(&config.id);
    let rootfs = container_dir.join("rootfs");

    log::debug!("injecting pty agent");
    let agent = fs::read(paths.bin_dir().join("pty"))
        .map_err(|_| Error::DependencyMissing("pty agent".to_string()))?;
    let agent_dest = rootfs.join(PTY_AGENT_PATH.trim_start_matches('/'));
    if let Some(parent) = agent_dest.parent() {
        fs::create_dir_all(parent)?;
    }
    utils::write_file(&agent_dest, &agent, 0o755)?;

    let config_json =
        serde_json::to_string(config).map_err(|e| Error::InvalidConfig(e.to_string()))?;

    let mut cmd = Command::new("/proc/self/exe");
    cmd.args(["--log-level", logger::level()]);
    cmd.args(state.to_args());
    cmd.arg("enter");
    cmd.args(["--config", &config_json]);
    if tty {
        cmd.arg("--tty");
    }

    let keep_id = config.userns == KEEP_ID && !state.rootful;
    let flags = clone_flags_for(config, state.rootful);

    unsafe {
        cmd.pre_exec(move || {
            let _ = prctl::set_death_signal(Signal::SIGTERM as isize);
            if libc::unshare(flags) != 0 {
                return Err(io::Error::last_os_error());
            }
            Ok(())
        });
    }

    // for keep-id the child stalls inside `enter` until this process has
    // written its maps; entry into the new namespace is observed through
    // /proc, so no signalling is needed
    let maps = if keep_id {
        Some(keep_id_maps(config)?)
    } else {
        None
    };

    let after_spawn = move |pid: i32| -> Result<()> {
        if let Some((uid_map, gid_map)) = &maps {
            idmap::wait_for_unshared(pid)?;
            idmap::write_keep_id_maps(pid, uid_map, gid_map)?;
        }
        Ok(())
    };

    log::debug!("starting the container, executing {:?}", cmd);

    if tty {
        procio::run_with_tty(&mut cmd, after_spawn)
    } else if interactive {
        procio::run_interactive(&mut cmd, after_spawn)
    } else {
        procio::run_detached(&mut cmd, &container_dir.join("current-logs"), after_spawn)
    }
}

/// The final phase, running inside the container's fresh namespaces: build
/// the mount tree, pivot into the rootfs, confine the process and exec the
/// entrypoint.
pub fn enter(paths: &Paths, state: &PrivilegeState, config: &Config, tty: bool) -> Result<()> {
    let syscall = LinuxSyscall;

    if config.userns == KEEP_ID && !state.rootful {
        wait_for_keep_id_mapping(&syscall)?;
    }

    log::debug!("setting up rootfs in {:?}", paths.container_path(&config.id));
    mounts::setup_rootfs(paths, config, &syscall)?;

    let rootfs = paths.container_path(&config.id).join("rootfs");
    syscall.pivot_rootfs(&rootfs).map_err(|e| Error::PivotFailed {
        path: rootfs.clone(),
        reason: e.to_string(),
    })?;

    if config.cgroup != HOST {
        mounts::setup_cgroupfs(config, &syscall).context("setup cgroupfs")?;
    }

    log::debug!("chdir to workdir: {}", config.workdir);
    unistd::chdir(Path::new(&config.workdir))?;

    log::debug!("setting container hostname to {}", config.hostname);
    syscall.set_hostname(&config.hostname)?;

    log::debug!("become user: {}", config.user);
    let (uid, gid) = user::as_ids(&config.user);
    syscall.become_user(uid, gid)?;

    for pair in &config.env {
        if let Some((key, value)) = pair.split_once('=') {
            env::set_var(key, value);
        }
    }

    capabilities::apply_bounded(&syscall)?;

    let envp: Vec<CString> = config
        .env
        .iter()
        .map(|e| CString::new(e.as_str()).unwrap_or_default())
        .collect();

    if tty {
        let mut args = vec![PTY_AGENT_PATH.to_string()];
        args.extend(config.entrypoint.iter().cloned());
        log::debug!("tty requested, execute entrypoint with agent: {:?}", args);

        let argv: Vec<CString> = args
            .iter()
            .map(|a| CString::new(a.as_str()).unwrap_or_default())
            .collect();
        unistd::execve(&argv[0], &argv, &envp)?;
    } else {
        log::debug!("execute entrypoint: {:?}", config.entrypoint);
        let argv: Vec<CString> = config
            .entrypoint
            .iter()
            .map(|a| CString::new(a.as_str()).unwrap_or_default())
            .collect();
        unistd::execvpe(&argv[0], &argv, &envp)?;
    }

    // exec replaces the process, reaching this point means it failed
    Err(Error::NotFound {
        kind: "entrypoint",
        name: config.entrypoint.first().cloned().unwrap_or_default(),
    }
    .into())
}

/// Wait for the parent to write the keep-id maps, then take namespace root.
fn wait_for_keep_id_mapping(syscall: &dyn Syscall) -> Result<()> {
    while fs::read_to_string("/proc/self/uid_map")
        .unwrap_or_default()
        .trim()
        .is_empty()
    {
        sleep(Duration::from_millis(5));
    }

    syscall.become_user(unistd::Uid::from_raw(0), unistd::Gid::from_raw(0))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clone_flags_private_defaults() {
        let config = Config {
            userns: KEEP_ID.to_string(),
            ..Default::default()
        };
        let flags = clone_flags_for(&config, false);

        assert_ne!(flags & libc::CLONE_NEWUTS, 0);
        assert_ne!(flags & libc::CLONE_NEWNS, 0);
        assert_ne!(flags & libc::CLONE_NEWUSER, 0);
        assert_ne!(flags & libc::CLONE_NEWIPC, 0);
        assert_ne!(flags & libc::CLONE_NEWNET, 0);
        assert_ne!(flags & libc::CLONE_NEWPID, 0);
        assert_ne!(flags & libc::CLONE_NEWCGROUP, 0);
        assert_ne!(flags & libc::CLONE_NEWTIME, 0);
    }

    #[test]
    fn test_clone_flags_host_namespaces() {
        let config = Config {
            ipc: HOST.to_string(),
            network: HOST.to_string(),
            pid: HOST.to_string(),
            cgroup: HOST.to_string(),
            time: HOST.to_string(),
            ..Default::default()
        };
        let flags = clone_flags_for(&config, false);

        assert_eq!(flags, libc::CLONE_NEWUTS | libc::CLONE_NEWNS);
    }

    #[test]
    fn test_keep_id_under_rootful_skips_userns() {
        let config = Config {
            userns: KEEP_ID.to_string(),
            ..Default::default()
        };
        let flags = clone_flags_for(&config, true);
        assert_eq!(flags & libc::CLONE_NEWUSER, 0);
    }

    #[test]
    fn test_keep_id_maps_fallback() {
        let config = Config::default();
        let (uid_map, gid_map) = keep_id_maps(&config).unwrap();
        assert_eq!(uid_map.to_string(), FALLBACK_ID_MAP);
        assert_eq!(gid_map.to_string(), FALLBACK_ID_MAP);

        let config = Config {
            uidmap: "1000:524288:65536".into(),
            gidmap: "1000:524288:65536".into(),
            ..Default::default()
        };
        let (uid_map, _) = keep_id_maps(&config).unwrap();
        assert_eq!(uid_map.sub_start, 524288);
    }
}
