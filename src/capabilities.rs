//! Handles management of capabilities.

use std::str::FromStr;

use anyhow::Result;
use caps::{Capability, CapsHashSet};

use crate::syscall::Syscall;

/// Capabilities a container keeps; everything else is dropped from the
/// bounding set before the entrypoint is executed.
pub const KEEP_CAPS: [&str; 14] = [
    "chown",
    "dac_override",
    "fsetid",
    "fowner",
    "mknod",
    "net_raw",
    "setgid",
    "setuid",
    "setfcap",
    "setpcap",
    "net_bind_service",
    "sys_chroot",
    "kill",
    "audit_write",
];

/// Converts a list of capability names into a caps hash set.
pub fn to_set(names: &[&str]) -> Result<CapsHashSet> {
    let mut capabilities = CapsHashSet::new();
    for name in names {
        let cap = Capability::from_str(&format!("CAP_{}", name.to_uppercase()))?;
        capabilities.insert(cap);
    }
    Ok(capabilities)
}

/// Confine the calling process to the keep set; everything outside it is
/// removed from the effective, bounding and permitted sets.
pub fn apply_bounded(syscall: &dyn Syscall) -> Result<()> {
    let keep = to_set(&KEEP_CAPS)?;
    log::debug!("bounding capabilities to {:?}", keep);

    syscall.apply_capabilities(&keep)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syscall::test::TestHelperSyscall;

    #[test]
    fn test_keep_caps_resolve() {
        let set = to_set(&KEEP_CAPS).unwrap();
        assert_eq!(set.len(), KEEP_CAPS.len());
        assert!(set.contains(&Capability::CAP_SYS_CHROOT));
        assert!(!set.contains(&Capability::CAP_SYS_ADMIN));
    }

    #[test]
    fn test_apply_bounded_confines_to_keep_set() {
        let syscall = TestHelperSyscall::default();
        apply_bounded(&syscall).unwrap();

        let args = syscall.get_apply_capabilities_args();
        assert_eq!(args, vec![to_set(&KEEP_CAPS).unwrap()]);
    }
}
