//! Subordinate uid/gid ranges and the two mappings derived from them.
//!
//! The outer mapping (written by `newuidmap`/`newgidmap` from outside the
//! namespace) makes the caller appear as root. The inner keep-id mapping
//! (written directly into `/proc/<pid>/{uid,gid}_map` by the fake-root
//! parent) shifts container root onto the subordinate range so files
//! extracted there stay reachable.

use std::fmt;
use std::fs;
use std::process::Command;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use nix::unistd;

use crate::error::Error;

/// One subordinate id range, `<id>:<sub_start>:<sub_count>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubIdMap {
    pub id: u32,
    pub sub_start: u32,
    pub sub_count: u32,
}

impl FromStr for SubIdMap {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 3 {
            bail!("invalid id map '{}', expected id:start:count", s);
        }

        Ok(Self {
            id: parts[0].parse().context("invalid id in map")?,
            sub_start: parts[1].parse().context("invalid start in map")?,
            sub_count: parts[2].parse().context("invalid count in map")?,
        })
    }
}

impl fmt::Display for SubIdMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.id, self.sub_start, self.sub_count)
    }
}

impl SubIdMap {
    /// Arguments for `newuidmap`/`newgidmap`: the caller's own id becomes
    /// root inside the namespace, the subordinate range covers the rest.
    pub fn newidmap_args(&self, pid: i32) -> Vec<String> {
        vec![
            pid.to_string(),
            "0".to_string(),
            self.id.to_string(),
            "1".to_string(),
            "1".to_string(),
            self.sub_start.to_string(),
            self.sub_count.to_string(),
        ]
    }

    /// The keep-id mapping written into `/proc/<pid>/uid_map` (one triple
    /// per line): namespace root lands on the subordinate range, the
    /// caller's id maps back onto the parent namespace's root.
    pub fn keep_id_lines(&self) -> String {
        format!(
            "0 1 {}\n{} 0 1\n{} {} {}\n",
            self.id,
            self.id,
            self.id + 1,
            self.id + 1,
            self.sub_count.saturating_sub(self.id),
        )
    }
}

/// Discover the caller's subordinate uid and gid ranges via the `getsubids`
/// host helper. Returned maps are prefixed with the caller's own ids.
pub fn get_subid_ranges() -> Result<(SubIdMap, SubIdMap)> {
    let uid = unistd::getuid();
    let gid = unistd::getgid();
    let user = unistd::User::from_uid(uid)
        .ok()
        .flatten()
        .map(|u| u.name)
        .unwrap_or_else(|| uid.to_string());

    let uid_range = getsubids_range(&[&user])?;
    let gid_range = getsubids_range(&["-g", &user])?;

    Ok((
        SubIdMap {
            id: uid.as_raw(),
            sub_start: uid_range.0,
            sub_count: uid_range.1,
        },
        SubIdMap {
            id: gid.as_raw(),
            sub_start: gid_range.0,
            sub_count: gid_range.1,
        },
    ))
}

fn getsubids_range(args: &[&str]) -> Result<(u32, u32)> {
    let output = Command::new("getsubids")
        .args(args)
        .output()
        .map_err(|_| Error::DependencyMissing("getsubids".to_string()))?;

    if !output.status.success() {
        bail!(
            "getsubids failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    parse_getsubids(&stdout)
}

/// Parse a `getsubids` line, `0: <user> <start> <count>`.
fn parse_getsubids(output: &str) -> Result<(u32, u32)> {
    let fields: Vec<&str> = output.trim().split_whitespace().collect();
    if fields.len() < 4 {
        bail!("unexpected getsubids output: '{}'", output.trim());
    }

    let start = fields[fields.len() - 2]
        .parse()
        .context("invalid subid start")?;
    let count = fields[fields.len() - 1]
        .parse()
        .context("invalid subid count")?;

    Ok((start, count))
}

/// Wait until a child has entered its fresh user namespace. A namespace
/// without mappings presents an empty `uid_map`, so the transition is
/// observable from outside without any signalling.
pub fn wait_for_unshared(pid: i32) -> Result<()> {
    loop {
        match fs::read_to_string(format!("/proc/{}/uid_map", pid)) {
            Ok(content) if content.trim().is_empty() => return Ok(()),
            Ok(_) => std::thread::sleep(std::time::Duration::from_millis(5)),
            Err(_) => {
                return Err(Error::MapFailed {
                    pid,
                    reason: "child vanished before its namespace was mapped".to_string(),
                }
                .into())
            }
        }
    }
}

/// Write the keep-id mappings of a child process from the privileged side of
/// its user namespace. `setgroups` is opened up first so the gid map is
/// accepted with supplementary groups enabled.
pub fn write_keep_id_maps(pid: i32, uid_map: &SubIdMap, gid_map: &SubIdMap) -> Result<()> {
    log::debug!("setting uidmap of {} to {:?}", pid, uid_map);

    let write = |file: &str, content: &str| -> Result<()> {
        fs::write(format!("/proc/{}/{}", pid, file), content).map_err(|e| {
            Error::MapFailed {
                pid,
                reason: format!("{}: {}", file, e),
            }
            .into()
        })
    };

    write("setgroups", "allow")?;
    write("uid_map", &uid_map.keep_id_lines())?;
    write("gid_map", &gid_map.keep_id_lines())?;

    Ok(())
}

/// Apply the outer mapping to a waiting child via the setuid map helpers.
pub fn run_newidmap(binary: &str, pid: i32, map: &SubIdMap) -> Result<()> {
    let output = Command::new(binary)
        .args(map.newidmap_args(pid))
        .output()
        .map_err(|_| Error::DependencyMissing(binary.to_string()))?;

    if !output.status.success() {
        return Err(Error::MapFailed {
            pid,
            reason: format!(
                "{}: {}",
                binary,
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        }
        .into());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display_round_trip() {
        let map: SubIdMap = "1000:100000:65536".parse().unwrap();
        assert_eq!(map.id, 1000);
        assert_eq!(map.sub_start, 100000);
        assert_eq!(map.sub_count, 65536);
        assert_eq!(map.to_string(), "1000:100000:65536");

        assert!("1000:100000".parse::<SubIdMap>().is_err());
        assert!("a:b:c".parse::<SubIdMap>().is_err());
    }

    #[test]
    fn test_newidmap_args() {
        let map: SubIdMap = "1000:100000:65536".parse().unwrap();
        assert_eq!(
            map.newidmap_args(42),
            vec!["42", "0", "1000", "1", "1", "100000", "65536"]
        );
    }

    #[test]
    fn test_keep_id_lines() {
        let map: SubIdMap = "1000:100000:65536".parse().unwrap();
        assert_eq!(map.keep_id_lines(), "0 1 1000\n1000 0 1\n1001 1001 64536\n");
    }

    #[test]
    fn test_parse_getsubids_output() {
        let (start, count) = parse_getsubids("0: alice 100000 65536\n").unwrap();
        assert_eq!(start, 100000);
        assert_eq!(count, 65536);

        assert!(parse_getsubids("garbage").is_err());
    }
}
