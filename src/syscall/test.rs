//! Recording Syscall implementation used by tests to assert on the mount
//! plan without touching the kernel.

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::Result;
use caps::{errors::CapsError, CapsHashSet};
use nix::mount::MsFlags;
use nix::sched::CloneFlags;
use nix::unistd::{Gid, Uid};

use super::Syscall;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MountArgs {
    pub source: Option<PathBuf>,
    pub target: PathBuf,
    pub fstype: Option<String>,
    pub flags: MsFlags,
    pub data: Option<String>,
}

#[derive(Default)]
pub struct TestHelperSyscall {
    mount_args: RefCell<Vec<MountArgs>>,
    unshare_args: RefCell<Vec<CloneFlags>>,
    hostname_args: RefCell<Vec<String>>,
    become_user_args: RefCell<Vec<(Uid, Gid)>>,
    apply_capabilities_args: RefCell<Vec<CapsHashSet>>,
    pivot_args: RefCell<Vec<PathBuf>>,
    /// Paths reported as plain files by `is_dir`; everything else is a dir.
    pub file_paths: RefCell<HashSet<PathBuf>>,
}

impl Syscall for TestHelperSyscall {
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
        self.mount_args.borrow_mut().push(MountArgs {
            source: source.map(|p| p.to_path_buf()),
            target: target.to_path_buf(),
            fstype: fstype.map(|s| s.to_owned()),
            flags,
            data: data.map(|s| s.to_owned()),
        });
        Ok(())
    }

    fn unshare(&self, flags: CloneFlags) -> Result<()> {
        self.unshare_args.borrow_mut().push(flags);
        Ok(())
    }

    fn pivot_rootfs(&self, path: &Path) -> Result<()> {
        self.pivot_args.borrow_mut().push(path.to_path_buf());
        Ok(())
    }

    fn set_hostname(&self, hostname: &str) -> Result<()> {
        self.hostname_args.borrow_mut().push(hostname.to_owned());
        Ok(())
    }

    fn become_user(&self, uid: Uid, gid: Gid) -> Result<()> {
        self.become_user_args.borrow_mut().push((uid, gid));
        Ok(())
    }

    fn apply_capabilities(&self, keep: &CapsHashSet) -> Result<(), CapsError> {
        self.apply_capabilities_args.borrow_mut().push(keep.clone());
        Ok(())
    }

    fn exists(&self, _path: &Path) -> bool {
        true
    }

    fn is_dir(&self, path: &Path) -> bool {
        !self.file_paths.borrow().contains(path)
    }
}

impl TestHelperSyscall {
    pub fn get_mount_args(&self) -> Vec<MountArgs> {
        self.mount_args.borrow().clone()
    }

    pub fn get_unshare_args(&self) -> Vec<CloneFlags> {
        self.unshare_args.borrow().clone()
    }

    pub fn get_hostname_args(&self) -> Vec<String> {
        self.hostname_args.borrow().clone()
    }

    pub fn get_become_user_args(&self) -> Vec<(Uid, Gid)> {
        self.become_user_args.borrow().clone()
    }

    pub fn get_apply_capabilities_args(&self) -> Vec<CapsHashSet> {
        self.apply_capabilities_args.borrow().clone()
    }

    pub fn get_pivot_args(&self) -> Vec<PathBuf> {
        self.pivot_args.borrow().clone()
    }

    pub fn mark_as_file(&self, path: &Path) {
        self.file_paths.borrow_mut().insert(path.to_path_buf());
    }
}
