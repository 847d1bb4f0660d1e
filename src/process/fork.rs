//! Thin wrapper around the clone syscall.

use anyhow::Result;
use nix::sched;
use nix::unistd::Pid;

/// Clone the current process into the namespaces selected by `clone_flags`
/// and run `cb` there.
///
/// Unlike fork, clone requires the caller to allocate the stack; 1MB is
/// plenty for the short-lived helpers spawned here. SIGCHLD is passed so the
/// child is reapable like a forked one.
pub fn clone(cb: sched::CloneCb, clone_flags: sched::CloneFlags) -> Result<Pid> {
    const STACK_SIZE: usize = 1024 * 1024;
    let mut stack = vec![0u8; STACK_SIZE];

    let signal = nix::sys::signal::Signal::SIGCHLD;
    let pid = unsafe { sched::clone(cb, &mut stack, clone_flags, Some(signal as i32))? };

    Ok(pid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use nix::sched::CloneFlags;
    use nix::sys::wait::{waitpid, WaitStatus};
    use nix::unistd;

    #[test]
    fn test_clone_child_runs_in_new_pid_namespace() -> Result<()> {
        // user namespace is needed for the test to run without root
        let flags = CloneFlags::CLONE_NEWPID | CloneFlags::CLONE_NEWUSER;
        let pid = super::clone(
            Box::new(|| {
                if unistd::getpid() == unistd::Pid::from_raw(1) {
                    0
                } else {
                    -1
                }
            }),
            flags,
        )?;

        if let WaitStatus::Exited(_, exit_code) = waitpid(pid, None)? {
            assert_eq!(0, exit_code, "child saw a pid other than 1");
            return Ok(());
        }

        bail!("child did not exit cleanly")
    }
}
