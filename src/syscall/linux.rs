//! Implements the Syscall trait for Linux systems.

use std::any::Any;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use caps::{errors::CapsError, CapSet, CapsHashSet};
use nix::mount::{umount2, MntFlags, MsFlags};
use nix::sched::{unshare, CloneFlags};
use nix::unistd;
use nix::unistd::{pivot_root, sethostname, Gid, Uid};

use super::Syscall;

#[derive(Clone)]
pub struct LinuxSyscall;

impl Syscall for LinuxSyscall {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn mount(
        &self,
        source: Option<&Path>,
        target: &Path,
        fstype: Option<&str>,
        flags: MsFlags,
        data: Option<&str>,
    ) -> Result<(), nix::Error> {
        nix::mount::mount(source, target, fstype, flags, data)
    }

    fn unshare(&self, flags: CloneFlags) -> Result<()> {
        unshare(flags)?;
        Ok(())
    }

    /// Make the given path the root of the mount namespace.
    ///
    /// The old root is stacked on `<path>/.pivot_root`, lazily unmounted and
    /// the directory removed, so nothing of the host tree stays reachable.
    fn pivot_rootfs(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            bail!("pivot root: rootfs {} does not exist", path.display());
        }

        let pivot_dir = path.join(".pivot_root");
        let _ = fs::remove_dir(&pivot_dir);
        fs::create_dir_all(&pivot_dir)
            .with_context(|| format!("pivot root: can't create {:?}", pivot_dir))?;

        pivot_root(path, &pivot_dir).with_context(|| "pivot root syscall failed")?;

        // the old root now lives under /.pivot_root of the new root
        let old_root = Path::new("/.pivot_root");
        umount2(old_root, MntFlags::MNT_DETACH)
            .with_context(|| "failed to unmount the old root")?;
        fs::remove_dir(old_root).with_context(|| "failed to clean up the old root dir")?;

        Ok(())
    }

    fn set_hostname(&self, hostname: &str) -> Result<()> {
        if let Err(e) = sethostname(hostname) {
            bail!("failed to set {} as hostname: {:?}", hostname, e)
        }
        Ok(())
    }

    fn become_user(&self, uid: Uid, gid: Gid) -> Result<()> {
        // leaving namespace root clears the permitted set on setuid, which
        // would empty the keep set before it can be applied
        let hold_caps = !uid.is_root();

        if hold_caps {
            if let Err(e) = prctl::set_keep_capabilities(true) {
                bail!("failed to retain capabilities across setuid: {}", e);
            }
        }

        unistd::setgid(gid)?;
        unistd::setuid(uid)?;

        if hold_caps {
            if let Err(e) = prctl::set_keep_capabilities(false) {
                bail!("failed to reset capability retention: {}", e);
            }
        }

        Ok(())
    }

    fn apply_capabilities(&self, keep: &CapsHashSet) -> Result<(), CapsError> {
        // raise the keep set first: shrinking the bounding set needs
        // CAP_SETPCAP effective, which may only be sitting in permitted
        caps::set(None, CapSet::Effective, keep)?;

        // the bounding set cannot be assigned, only shrunk one capability at
        // a time; walk only what the running kernel actually knows
        for cap in caps::runtime::thread_all_supported().difference(keep) {
            caps::drop(None, CapSet::Bounding, *cap)?;
        }

        caps::set(None, CapSet::Permitted, keep)?;
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }
}
