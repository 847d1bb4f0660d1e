//! The fake-root dance.
//!
//! Creating a user namespace and mapping subordinate ids into it requires a
//! cooperating parent outside the namespace. The engine re-execs itself
//! through the hidden `rootless-helper` subcommand to cross that boundary;
//! all phase state travels in argv, never in the environment.
//!
//! Phases:
//! - ensure_fake_root: re-exec under the helper (or under `unshare -m` for
//!   real root) unless the current process is already privileged.
//! - helper parent: fork the child into new user+mount namespaces, wait for
//!   its SIGCHLD, apply the subordinate maps with newuidmap/newgidmap,
//!   then wait and propagate the exit status.
//! - helper child: signal the parent, poll until the mapping makes it root,
//!   then exec the wrapped command with `--fake-root` prepended.

use std::env;
use std::ffi::CString;
use std::process::{exit, Command};
use std::thread::sleep;
use std::time::Duration;

use anyhow::{Context, Result};
use nix::sys::signal::{kill, sigprocmask, SigSet, SigmaskHow, Signal};
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::{self, fork, ForkResult};

use crate::logger;
use crate::process::idmap::{self, SubIdMap};
use crate::process::io;

/// Privilege state of the current process, decoded from the hidden global
/// CLI flags.
#[derive(Debug, Clone, Default)]
pub struct PrivilegeState {
    /// Inside a prepared, id-mapped user namespace.
    pub fake_root: bool,
    /// Real root, mount namespace already unshared.
    pub rootful: bool,
    /// Subordinate uid range computed by the first process in the chain.
    pub uid_map: Option<String>,
    /// Subordinate gid range computed by the first process in the chain.
    pub gid_map: Option<String>,
}

impl PrivilegeState {
    /// The argv fragment that reproduces this state across a re-exec.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if self.fake_root {
            args.push("--fake-root".to_string());
        }
        if self.rootful {
            args.push("--rootful".to_string());
        }
        if let Some(map) = &self.uid_map {
            args.push("--uid-map".to_string());
            args.push(map.clone());
        }
        if let Some(map) = &self.gid_map {
            args.push("--gid-map".to_string());
            args.push(map.clone());
        }
        args
    }
}

/// Ensure the calling command runs as root or fake-root.
///
/// Returns true when the work was delegated to a re-exec'd helper; the
/// caller must then return without doing anything else. Returns false when
/// the current process is already privileged and should proceed.
pub fn ensure_fake_root(state: &PrivilegeState, interactive: bool) -> Result<bool> {
    log::debug!("ensuring we're either root or fake-root");

    if state.fake_root || state.rootful {
        return Ok(false);
    }

    let original_args: Vec<String> = env::args().skip(1).collect();

    let mut cmd = if unistd::geteuid().is_root() {
        // real root only needs its own mount namespace
        let mut cmd = Command::new("unshare");
        cmd.arg("-m")
            .arg("/proc/self/exe")
            .arg("--rootful")
            .args(&original_args);
        cmd
    } else {
        let (uid_map, gid_map) = idmap::get_subid_ranges()?;

        let mut cmd = Command::new("/proc/self/exe");
        cmd.args(["--log-level", logger::level()])
            .arg("rootless-helper")
            .args(["--uid-map", &uid_map.to_string()])
            .args(["--gid-map", &gid_map.to_string()])
            .arg("--")
            .args(&original_args);
        cmd
    };

    log::debug!("executing {:?}", cmd);

    if interactive {
        io::run_with_tty(&mut cmd, |_| Ok(()))?;
        return Ok(true);
    }

    // detached path: the helper survives this process as the session leader
    io::detach(&mut cmd)?;
    sleep(Duration::from_millis(250));

    Ok(true)
}

/// MappingParent: fork the child into fresh user and mount namespaces, wait
/// for its readiness signal, write the subordinate maps from outside, then
/// propagate its exit status.
pub fn helper_parent(state: &PrivilegeState, arguments: &[String]) -> Result<()> {
    let uid_map: SubIdMap = state
        .uid_map
        .as_deref()
        .context("rootless-helper needs --uid-map")?
        .parse()?;
    let gid_map: SubIdMap = state
        .gid_map
        .as_deref()
        .context("rootless-helper needs --gid-map")?
        .parse()?;

    log::debug!("parent: preparing to fork child");

    let mut sigchld = SigSet::empty();
    sigchld.add(Signal::SIGCHLD);
    sigprocmask(SigmaskHow::SIG_BLOCK, Some(&sigchld), None)?;

    match unsafe { fork()? } {
        ForkResult::Child => {
            let result = (|| -> Result<()> {
                let _ = prctl::set_death_signal(Signal::SIGTERM as isize);
                nix::sched::unshare(
                    nix::sched::CloneFlags::CLONE_NEWUSER | nix::sched::CloneFlags::CLONE_NEWNS,
                )?;

                let mut args: Vec<String> = vec![
                    "/proc/self/exe".to_string(),
                    "--log-level".to_string(),
                    logger::level().to_string(),
                    "--uid-map".to_string(),
                    uid_map.to_string(),
                    "--gid-map".to_string(),
                    gid_map.to_string(),
                    "rootless-helper".to_string(),
                    "--child".to_string(),
                    "--".to_string(),
                ];
                args.extend(arguments.iter().cloned());

                let argv: Vec<CString> = args
                    .iter()
                    .map(|a| CString::new(a.as_str()).unwrap_or_default())
                    .collect();
                unistd::execv(&argv[0], &argv)?;
                Ok(())
            })();

            log::error!("helper child failed before exec: {:?}", result);
            unsafe { libc::_exit(127) }
        }
        ForkResult::Parent { child } => {
            log::debug!("parent: waiting for child to start");
            sigchld.wait()?;

            log::debug!("parent: child is ready, setting uid/gid mappings");
            idmap::run_newidmap("newuidmap", child.as_raw(), &uid_map)?;
            idmap::run_newidmap("newgidmap", child.as_raw(), &gid_map)?;

            sigprocmask(SigmaskHow::SIG_UNBLOCK, Some(&sigchld), None)?;

            log::debug!("parent: waiting for child completion");
            match waitpid(child, None)? {
                WaitStatus::Exited(_, code) => exit(code),
                WaitStatus::Signaled(_, _, _) => exit(1),
                status => anyhow::bail!("unexpected child status {:?}", status),
            }
        }
    }
}

/// MappingChild: runs inside the new namespaces. Signal the parent that the
/// mapping can be written, wait to become root, then exec the wrapped
/// command with the fake-root marker prepended.
pub fn helper_child(state: &PrivilegeState, arguments: &[String]) -> Result<()> {
    log::debug!("child: notify the parent that we're ready");
    kill(unistd::getppid(), Signal::SIGCHLD)?;

    log::debug!("child: waiting for uid/gid map to be complete");
    while !unistd::getuid().is_root() || unistd::getegid().as_raw() != 0 {
        sleep(Duration::from_millis(5));
    }

    log::debug!("child: now we're fake root");

    let mut args: Vec<String> = vec![
        "/proc/self/exe".to_string(),
        "--log-level".to_string(),
        logger::level().to_string(),
        "--fake-root".to_string(),
    ];
    if let Some(map) = &state.uid_map {
        args.push("--uid-map".to_string());
        args.push(map.clone());
    }
    if let Some(map) = &state.gid_map {
        args.push("--gid-map".to_string());
        args.push(map.clone());
    }
    args.extend(arguments.iter().cloned());

    log::debug!("child: execve the input command: {:?}", args);

    let argv: Vec<CString> = args
        .iter()
        .map(|a| CString::new(a.as_str()).unwrap_or_default())
        .collect();
    unistd::execv(&argv[0], &argv)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_args_round_trip() {
        let state = PrivilegeState {
            fake_root: true,
            rootful: false,
            uid_map: Some("1000:100000:65536".to_string()),
            gid_map: Some("1000:100000:65536".to_string()),
        };
        assert_eq!(
            state.to_args(),
            vec![
                "--fake-root",
                "--uid-map",
                "1000:100000:65536",
                "--gid-map",
                "1000:100000:65536"
            ]
        );

        let empty = PrivilegeState::default();
        assert!(empty.to_args().is_empty());
    }
}
