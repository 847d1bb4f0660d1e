//! An interface trait so that the rest of the engine can call the kernel
//! primitives it needs without having to worry about their implementation
//! details. Tests substitute a recording implementation.

pub mod linux;
#[cfg(test)]
pub mod test;

use std::any::Any;
use std::path::Path;

use anyhow::Result;
use caps::{errors::CapsError, CapsHashSet};
use nix::mount::MsFlags;
use nix::sched::CloneFlags;
use nix::unistd::{Gid, Uid};

/// Kernel functionality required for container management.
pub trait Syscall {
    fn as_any(&self) -> &dyn Any;
    fn mount(
        &self,
        source: Option<&Path>,
        target: &Path,
        fstype: Option<&str>,
        flags: MsFlags,
        data: Option<&str>,
    ) -> Result<(), nix::Error>;
    fn unshare(&self, flags: CloneFlags) -> Result<()>;
    fn pivot_rootfs(&self, path: &Path) -> Result<()>;
    fn set_hostname(&self, hostname: &str) -> Result<()>;
    /// Switch to the container user without shedding the capabilities still
    /// needed to confine the process afterwards.
    fn become_user(&self, uid: Uid, gid: Gid) -> Result<()>;
    /// Confine the process to the given capability set: nothing outside it
    /// stays effective, permitted or in the bounding set.
    fn apply_capabilities(&self, keep: &CapsHashSet) -> Result<(), CapsError>;
    fn exists(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;
}
