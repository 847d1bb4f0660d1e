//! Discovery of running containers.
//!
//! The engine keeps no registry of live containers. A container is running
//! iff some process' `/proc/<pid>/root/run/.containerenv` mentions its ID;
//! scanning for that is the engine's only source of truth.

use std::fs;
use std::path::PathBuf;

/// Maps a container ID to the pid of its live process, if any.
pub trait Locator {
    fn find(&self, id: &str) -> Option<i32>;
}

/// The production locator: walk `/proc` and look for the container identity
/// file through each process' root.
pub struct ProcLocator;

impl Locator for ProcLocator {
    fn find(&self, id: &str) -> Option<i32> {
        let processes = procfs::process::all_processes().ok()?;

        for process in processes.flatten() {
            let pid = process.pid();
            let env_file = PathBuf::from(format!("/proc/{}/root/run/.containerenv", pid));

            let content = match fs::read_to_string(&env_file) {
                Ok(content) => content,
                Err(_) => continue,
            };

            if content.contains(id) {
                return Some(pid);
            }
        }

        None
    }
}

/// Whether the pid is alive and not a zombie. A zombie has an empty cmdline,
/// so the read doubles as the liveness check.
pub fn is_pid_running(pid: i32) -> bool {
    match fs::read(format!("/proc/{}/cmdline", pid)) {
        Ok(content) => !content.is_empty(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapLocator(HashMap<String, i32>);

    impl Locator for MapLocator {
        fn find(&self, id: &str) -> Option<i32> {
            self.0.get(id).copied()
        }
    }

    #[test]
    fn test_locator_contract() {
        let mut known = HashMap::new();
        known.insert("cafebabe".to_string(), 4242);
        let locator = MapLocator(known);

        assert_eq!(locator.find("cafebabe"), Some(4242));
        assert_eq!(locator.find("deadbeef"), None);
    }

    #[test]
    fn test_own_pid_is_running() {
        assert!(is_pid_running(std::process::id() as i32));
        // pid 0 never has a cmdline
        assert!(!is_pid_running(0));
    }
}
