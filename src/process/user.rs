//! Resolution of the `--user` spec into numeric ids.

use nix::unistd::{Gid, Group, Uid, User};

/// Resolve a user spec in `name|uid[:group|gid]` form into a uid/gid pair.
/// Names are looked up in the host passwd/group databases; anything that
/// fails to resolve defaults to root.
pub fn get_uid_gid(spec: &str) -> (u32, u32) {
    let (username, groupname) = match spec.split_once(':') {
        Some((user, group)) => (user, group),
        None => (spec, spec),
    };

    let uid = match username.parse::<u32>() {
        Ok(uid) => Some(uid),
        Err(_) => User::from_name(username)
            .ok()
            .flatten()
            .map(|u| u.uid.as_raw()),
    };

    let gid = match groupname.parse::<u32>() {
        Ok(gid) => Some(gid),
        Err(_) => Group::from_name(groupname)
            .ok()
            .flatten()
            .map(|g| g.gid.as_raw()),
    };

    match (uid, gid) {
        (Some(uid), Some(gid)) => (uid, gid),
        // if only the user resolved, reuse its primary ids
        (Some(uid), None) => match User::from_uid(Uid::from_raw(uid)).ok().flatten() {
            Some(user) => (user.uid.as_raw(), user.gid.as_raw()),
            None => (uid, uid),
        },
        _ => (0, 0),
    }
}

/// Convenience wrappers for the syscall layer.
pub fn as_ids(spec: &str) -> (Uid, Gid) {
    let (uid, gid) = get_uid_gid(spec);
    (Uid::from_raw(uid), Gid::from_raw(gid))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_specs() {
        assert_eq!(get_uid_gid("1000:1000"), (1000, 1000));
        assert_eq!(get_uid_gid("0:0"), (0, 0));
        assert_eq!(get_uid_gid("1234"), (1234, 1234));
    }

    #[test]
    fn test_root_by_name() {
        // root exists in any passwd database
        assert_eq!(get_uid_gid("root:root"), (0, 0));
    }

    #[test]
    fn test_unknown_user_defaults_to_root() {
        assert_eq!(get_uid_gid("definitely-not-a-user-xyz"), (0, 0));
    }
}
