//! The container's mount tree.
//!
//! Runs inside the container's fresh mount namespace, before pivot-root. The
//! order is load bearing: privatize, then proc/dev/tmp, ipc, resolv.conf,
//! read-write passthroughs, masked paths, user volumes, devpts, and finally
//! the identity file under /run.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use nix::mount::MsFlags;

use crate::container::config::{Config, HOST, PRIVATE};
use crate::error::Error;
use crate::image;
use crate::paths::Paths;
use crate::syscall::Syscall;

/// Limit access to host's kernel stuff -> /dev/null.
const MASKED_FILES: [&str; 5] = [
    "/proc/kcore",
    "/proc/keys",
    "/proc/latency_stats",
    "/proc/timer_list",
    "/proc/timer_stats",
];

/// Limit access to host's kernel stuff -> empty tmpfs.
const MASKED_DIRS: [&str; 6] = [
    "/proc/acpi",
    "/proc/scsi",
    "/sys/dev/block",
    "/sys/firmware",
    "/sys/fs/selinux",
    "/sys/kernel",
];

/// We want access, but read-only is ok.
const READ_ONLY_PATHS: [&str; 6] = [
    "/proc/asound",
    "/proc/bus",
    "/proc/fs",
    "/proc/irq",
    "/proc/sys",
    "/proc/sysrq-trigger",
];

/// Files and directories sourced from the host for the containerized system
/// to work with.
const READ_WRITE_PATHS: [&str; 7] = [
    "/dev/console",
    "/dev/full",
    "/dev/random",
    "/dev/tty",
    "/dev/urandom",
    "/dev/zero",
    "/sys",
];

/// Set up the rootfs defined in `conf`, including `/run/.containerenv`.
pub fn setup_rootfs(paths: &Paths, conf: &Config, syscall: &dyn Syscall) -> Result<()> {
    let rootfs = paths.container_path(&conf.id).join("rootfs");

    // make the rootfs a private mount so nothing we do below propagates out
    log::debug!("remounting {:?} as private", rootfs);
    syscall
        .mount(
            Some(rootfs.as_path()),
            &rootfs,
            None,
            MsFlags::MS_BIND | MsFlags::MS_REC,
            None,
        )
        .map_err(|e| mount_err(&rootfs, e))?;
    syscall
        .mount(
            None,
            &rootfs,
            None,
            MsFlags::MS_PRIVATE | MsFlags::MS_REC,
            None,
        )
        .map_err(|e| mount_err(&rootfs, e))?;
    syscall
        .mount(
            None,
            Path::new("/"),
            None,
            MsFlags::MS_PRIVATE | MsFlags::MS_REC,
            None,
        )
        .map_err(|e| mount_err(Path::new("/"), e))?;

    log::debug!("setting up basic mounts");
    setup_mounts(&rootfs, conf, syscall)?;

    log::debug!("setting up volumes");
    setup_volumes(paths, &rootfs, conf, syscall)?;

    log::debug!("setting up pty on {:?}", rootfs);
    setup_pty(&rootfs, syscall)?;

    log::debug!("populating /run/.containerenv");
    write_container_env(paths, &rootfs, conf)?;

    Ok(())
}

/// Basic mountpoints: /proc, /dev, /tmp, /dev/shm, /dev/mqueue,
/// /etc/resolv.conf and the read-write host passthroughs. Private settings
/// get fresh filesystem instances, host settings get binds.
fn setup_mounts(rootfs: &Path, conf: &Config, syscall: &dyn Syscall) -> Result<()> {
    if conf.pid == PRIVATE {
        log::debug!("mounting new procfs on /proc");
        mount_proc(&rootfs.join("proc"), syscall)?;
    } else {
        log::debug!("binding host /proc");
        mount_bind(Path::new("/proc"), &rootfs.join("proc"), syscall)?;
    }

    mount_bind(Path::new("/dev"), &rootfs.join("dev"), syscall)?;

    mount_tmpfs(&rootfs.join("tmp"), syscall)?;

    if conf.ipc == PRIVATE {
        mount_shm(&rootfs.join("dev/shm"), syscall)?;
        mount_mqueue(&rootfs.join("dev/mqueue"), syscall)?;
    } else {
        mount_bind(Path::new("/dev/shm"), &rootfs.join("dev/shm"), syscall)?;
        mount_bind(Path::new("/dev/mqueue"), &rootfs.join("dev/mqueue"), syscall)?;
    }

    if conf.network == HOST {
        mount_bind(
            Path::new("/etc/resolv.conf"),
            &rootfs.join("etc/resolv.conf"),
            syscall,
        )?;
    }

    for mount in READ_WRITE_PATHS {
        let src = Path::new(mount);
        if syscall.exists(src) {
            mount_bind(src, &join_rootfs(rootfs, mount), syscall)?;
        }
    }

    if !conf.privileged {
        log::debug!("container is not privileged, setting up masked mounts");
        setup_masked_mounts(rootfs, syscall)?;
    }

    Ok(())
}

/// In unprivileged containers kernel interfaces are made read-only or masked
/// behind /dev/null binds and empty tmpfs instances.
fn setup_masked_mounts(rootfs: &Path, syscall: &dyn Syscall) -> Result<()> {
    for mount in READ_ONLY_PATHS {
        let src = Path::new(mount);
        if syscall.exists(src) {
            mount_bind_ro(src, &join_rootfs(rootfs, mount), syscall)?;
        }
    }

    for mount in MASKED_FILES {
        if syscall.exists(Path::new(mount)) {
            mount_bind_ro(Path::new("/dev/null"), &join_rootfs(rootfs, mount), syscall)?;
        }
    }

    for mount in MASKED_DIRS {
        if syscall.exists(Path::new(mount)) {
            mount_tmpfs(&join_rootfs(rootfs, mount), syscall)?;
        }
    }

    Ok(())
}

/// A user supplied volume or mount entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VolumeSpec {
    /// `--mount type=..,source=..,destination=..[,readonly][,bind-propagation=..]`
    Mount {
        typ: String,
        source: String,
        destination: String,
        readonly: bool,
        propagation: String,
    },
    /// `-v src:dst[:mode]`
    Bind {
        source: String,
        destination: String,
        mode: String,
    },
    /// `-v path` with no source: backed by an empty dir under the volumes
    /// store.
    Anonymous { destination: String },
}

/// Parse one entry of `Config::mounts`. Empty entries yield `None`.
pub fn parse_volume_spec(raw: &str) -> Option<VolumeSpec> {
    if raw.is_empty() {
        return None;
    }

    let fields: Vec<&str> = raw.split(',').collect();
    if fields.len() > 1 && raw.contains('=') {
        let mut typ = String::new();
        let mut source = String::new();
        let mut destination = String::new();
        let mut readonly = false;
        let mut propagation = String::new();

        for field in fields {
            if let Some(value) = field.strip_prefix("type=") {
                typ = value.to_string();
            } else if let Some(value) = field.strip_prefix("source=") {
                source = value.to_string();
            } else if let Some(value) = field.strip_prefix("destination=") {
                destination = value.to_string();
            } else if field.starts_with("readonly") {
                readonly = true;
            } else if let Some(value) = field.strip_prefix("bind-propagation=") {
                propagation = value.to_string();
            }
        }

        return Some(VolumeSpec::Mount {
            typ,
            source,
            destination,
            readonly,
            propagation,
        });
    }

    let parts: Vec<&str> = raw.split(':').collect();
    match parts.len() {
        1 => Some(VolumeSpec::Anonymous {
            destination: parts[0].to_string(),
        }),
        _ => Some(VolumeSpec::Bind {
            source: parts[0].to_string(),
            destination: parts[1].to_string(),
            mode: parts.get(2).unwrap_or(&"rw").to_string(),
        }),
    }
}

/// Propagation name to mount flags.
fn propagation_flags(propagation: &str) -> MsFlags {
    match propagation {
        "private" => MsFlags::MS_PRIVATE,
        "rprivate" => MsFlags::MS_REC | MsFlags::MS_PRIVATE,
        "rshared" => MsFlags::MS_REC | MsFlags::MS_SHARED,
        "rslave" => MsFlags::MS_REC | MsFlags::MS_SLAVE,
        "shared" => MsFlags::MS_SHARED,
        "slave" => MsFlags::MS_SLAVE,
        _ => MsFlags::empty(),
    }
}

/// The custom mounts and volumes specified at create time.
fn setup_volumes(
    paths: &Paths,
    rootfs: &Path,
    conf: &Config,
    syscall: &dyn Syscall,
) -> Result<()> {
    for volume in &conf.mounts {
        let spec = match parse_volume_spec(volume) {
            Some(spec) => spec,
            None => continue,
        };

        match spec {
            VolumeSpec::Mount {
                typ,
                source,
                destination,
                readonly,
                propagation,
            } => {
                log::debug!("setting up mount {}", volume);
                let dest = join_rootfs(rootfs, &destination);

                let mut flags = propagation_flags(&propagation);
                if readonly {
                    flags |= MsFlags::MS_RDONLY;
                }

                match typ.as_str() {
                    "tmpfs" => mount_tmpfs(&dest, syscall)?,
                    "bind" => {
                        flags |= MsFlags::MS_BIND | MsFlags::MS_REC;
                        mount_with_flags(Path::new(&source), &dest, flags, syscall)?;
                    }
                    other => {
                        return Err(Error::InvalidConfig(format!(
                            "unsupported mount type {} in {}",
                            other, volume
                        ))
                        .into())
                    }
                }
            }
            VolumeSpec::Anonymous { destination } => {
                log::debug!("setting up anonymous volume {}", destination);
                let src = paths.volume_dir().join(&conf.id).join(&destination);
                fs::create_dir_all(&src)
                    .with_context(|| format!("failed to create volume dir {:?}", src))?;
                mount_bind(&src, &join_rootfs(rootfs, &destination), syscall)?;
            }
            VolumeSpec::Bind {
                source,
                destination,
                mode,
            } => {
                let mut flags = MsFlags::MS_BIND | MsFlags::MS_REC;
                if mode.contains("ro") {
                    flags |= MsFlags::MS_RDONLY;
                }
                if mode.contains("rslave") {
                    flags |= MsFlags::MS_SLAVE | MsFlags::MS_REC;
                }
                if mode.contains("rshared") {
                    flags |= MsFlags::MS_SHARED | MsFlags::MS_REC;
                }
                if mode.contains("rprivate") {
                    flags |= MsFlags::MS_PRIVATE | MsFlags::MS_REC;
                }

                let src = Path::new(&source);
                if !syscall.exists(src) {
                    return Err(Error::NotFound {
                        kind: "volume source",
                        name: source.clone(),
                    }
                    .into());
                }

                log::debug!("setting up mount: {} on {} as {}", source, destination, mode);
                mount_with_flags(src, &join_rootfs(rootfs, &destination), flags, syscall)?;
            }
        }
    }

    Ok(())
}

/// A new devpts instance, with /dev/pts/ptmx bound over /dev/ptmx.
fn setup_pty(rootfs: &Path, syscall: &dyn Syscall) -> Result<()> {
    mount_devpts(&rootfs.join("dev/pts"), syscall)?;
    mount_bind(
        &rootfs.join("dev/pts/ptmx"),
        &rootfs.join("dev/ptmx"),
        syscall,
    )?;
    Ok(())
}

/// Runs after pivot-root for `cgroup=private`: blank /sys/fs/cgroup with a
/// tmpfs, mount a fresh cgroup2 on it and move this process into a dedicated
/// scope so init systems inside don't trip over foreign pids.
pub fn setup_cgroupfs(conf: &Config, syscall: &dyn Syscall) -> Result<()> {
    let cgroup_root = Path::new("/sys/fs/cgroup");
    mount_tmpfs(cgroup_root, syscall)?;
    syscall
        .mount(
            Some(Path::new("cgroup2")),
            cgroup_root,
            Some("cgroup2"),
            MsFlags::empty(),
            None,
        )
        .map_err(|e| mount_err(cgroup_root, e))?;

    let scope = scope_dir(conf);
    fs::create_dir_all(&scope)?;
    fs::write(scope.join("cgroup.procs"), b"0")?;

    Ok(())
}

/// The dedicated cgroup scope a started container is moved into.
pub fn scope_dir(conf: &Config) -> PathBuf {
    Path::new("/sys/fs/cgroup").join(format!("container-{}.scope", conf.names))
}

/// The identity file scanned by pid discovery.
fn write_container_env(paths: &Paths, rootfs: &Path, conf: &Config) -> Result<()> {
    let run_dir = rootfs.join("run");
    fs::create_dir_all(&run_dir)?;

    let info = format!(
        "engine=\"lilipod-{}\"\nname=\"{}\"\nid=\"{}\"\nimage=\"{}\"\nimageid=\"{}\"\n",
        crate::VERSION,
        conf.names,
        conf.id,
        conf.image,
        image::get_id(paths, &conf.image),
    );

    fs::write(run_dir.join(".containerenv"), info)?;
    Ok(())
}

// ---------------------------------------------------------------------------

fn mount_err(target: &Path, source: nix::Error) -> anyhow::Error {
    Error::MountFailed {
        target: target.to_path_buf(),
        source,
    }
    .into()
}

fn join_rootfs(rootfs: &Path, inside: &str) -> PathBuf {
    rootfs.join(inside.trim_start_matches('/'))
}

/// Prepare the destination and bind `src` onto it with the given flags.
fn mount_with_flags(
    src: &Path,
    dest: &Path,
    flags: MsFlags,
    syscall: &dyn Syscall,
) -> Result<()> {
    if !syscall.exists(src) {
        return Err(Error::NotFound {
            kind: "mount source",
            name: src.display().to_string(),
        }
        .into());
    }

    if syscall.is_dir(src) {
        fs::create_dir_all(dest)?;
    } else {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        if !dest.exists() {
            fs::File::create(dest)?;
        }
    }

    syscall
        .mount(Some(src), dest, Some("bind"), flags, None)
        .map_err(|e| mount_err(dest, e))
}

fn mount_bind(src: &Path, dest: &Path, syscall: &dyn Syscall) -> Result<()> {
    log::debug!("performing bind mount {:?} {:?}", src, dest);
    mount_with_flags(
        src,
        dest,
        MsFlags::MS_BIND | MsFlags::MS_REC | MsFlags::MS_PRIVATE,
        syscall,
    )
}

fn mount_bind_ro(src: &Path, dest: &Path, syscall: &dyn Syscall) -> Result<()> {
    log::debug!("performing read-only bind mount {:?} {:?}", src, dest);
    mount_with_flags(
        src,
        dest,
        MsFlags::MS_BIND
            | MsFlags::MS_REC
            | MsFlags::MS_RDONLY
            | MsFlags::MS_NOSUID
            | MsFlags::MS_NOEXEC
            | MsFlags::MS_NODEV
            | MsFlags::MS_PRIVATE,
        syscall,
    )
}

fn mount_tmpfs(dest: &Path, syscall: &dyn Syscall) -> Result<()> {
    let _ = fs::create_dir_all(dest);
    syscall
        .mount(
            Some(Path::new("tmpfs")),
            dest,
            Some("tmpfs"),
            MsFlags::empty(),
            None,
        )
        .map_err(|e| mount_err(dest, e))
}

fn mount_proc(dest: &Path, syscall: &dyn Syscall) -> Result<()> {
    let _ = fs::create_dir_all(dest);
    syscall
        .mount(
            Some(Path::new("proc")),
            dest,
            Some("proc"),
            MsFlags::MS_NOEXEC | MsFlags::MS_NOSUID | MsFlags::MS_NODEV,
            None,
        )
        .map_err(|e| mount_err(dest, e))
}

fn mount_shm(dest: &Path, syscall: &dyn Syscall) -> Result<()> {
    let _ = fs::create_dir_all(dest);
    syscall
        .mount(
            Some(Path::new("shm")),
            dest,
            Some("tmpfs"),
            MsFlags::MS_NOEXEC | MsFlags::MS_NOSUID | MsFlags::MS_NODEV,
            Some("mode=1777,size=65536k"),
        )
        .map_err(|e| mount_err(dest, e))
}

fn mount_mqueue(dest: &Path, syscall: &dyn Syscall) -> Result<()> {
    let _ = fs::create_dir_all(dest);
    syscall
        .mount(
            Some(Path::new("mqueue")),
            dest,
            Some("mqueue"),
            MsFlags::MS_NOEXEC | MsFlags::MS_NOSUID | MsFlags::MS_NODEV,
            None,
        )
        .map_err(|e| mount_err(dest, e))
}

fn mount_devpts(dest: &Path, syscall: &dyn Syscall) -> Result<()> {
    let _ = fs::create_dir_all(dest);
    syscall
        .mount(
            Some(Path::new("devpts")),
            dest,
            Some("devpts"),
            MsFlags::MS_NOEXEC | MsFlags::MS_NOSUID,
            Some("newinstance,ptmxmode=0666,mode=0620"),
        )
        .map_err(|e| mount_err(dest, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syscall::test::TestHelperSyscall;

    fn sample_config(dir: &Path) -> (Paths, Config) {
        let paths = Paths {
            home: dir.to_path_buf(),
        };
        let config = Config {
            id: "cafebabe".into(),
            names: "test".into(),
            image: "index.docker.io/library/alpine:latest".into(),
            ..Default::default()
        };
        (paths, config)
    }

    #[test]
    fn test_setup_rootfs_order() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let (paths, config) = sample_config(dir.path());
        let rootfs = paths.container_path(&config.id).join("rootfs");
        fs::create_dir_all(&rootfs)?;

        let syscall = TestHelperSyscall::default();
        syscall.mark_as_file(Path::new("/etc/resolv.conf"));
        syscall.mark_as_file(Path::new("/dev/null"));
        for f in MASKED_FILES.iter().chain(READ_WRITE_PATHS[..6].iter()) {
            syscall.mark_as_file(Path::new(f));
        }

        setup_rootfs(&paths, &config, &syscall)?;

        let mounts = syscall.get_mount_args();

        // privatization comes first: rootfs self-bind, rootfs rprivate, / rprivate
        assert_eq!(mounts[0].target, rootfs);
        assert_eq!(mounts[0].flags, MsFlags::MS_BIND | MsFlags::MS_REC);
        assert_eq!(mounts[1].flags, MsFlags::MS_PRIVATE | MsFlags::MS_REC);
        assert_eq!(mounts[2].target, PathBuf::from("/"));

        // then procfs (private pid default), /dev bind and /tmp tmpfs
        assert_eq!(mounts[3].target, rootfs.join("proc"));
        assert_eq!(mounts[3].fstype.as_deref(), Some("proc"));
        assert_eq!(mounts[4].target, rootfs.join("dev"));
        assert_eq!(mounts[4].source, Some(PathBuf::from("/dev")));
        assert_eq!(mounts[5].target, rootfs.join("tmp"));
        assert_eq!(mounts[5].fstype.as_deref(), Some("tmpfs"));

        // private ipc mounts fresh shm and mqueue instances
        assert_eq!(mounts[6].target, rootfs.join("dev/shm"));
        assert_eq!(mounts[6].data.as_deref(), Some("mode=1777,size=65536k"));
        assert_eq!(mounts[7].target, rootfs.join("dev/mqueue"));
        assert_eq!(mounts[7].fstype.as_deref(), Some("mqueue"));

        // devpts instance then ptmx bind come last before .containerenv
        let n = mounts.len();
        assert_eq!(mounts[n - 2].target, rootfs.join("dev/pts"));
        assert_eq!(
            mounts[n - 2].data.as_deref(),
            Some("newinstance,ptmxmode=0666,mode=0620")
        );
        assert_eq!(mounts[n - 1].target, rootfs.join("dev/ptmx"));
        assert_eq!(
            mounts[n - 1].source,
            Some(rootfs.join("dev/pts/ptmx"))
        );

        // network defaults to private: no resolv.conf bind anywhere
        assert!(!mounts
            .iter()
            .any(|m| m.source == Some(PathBuf::from("/etc/resolv.conf"))));

        // masked files are /dev/null binds
        assert!(mounts.iter().any(|m| {
            m.target == rootfs.join("proc/kcore")
                && m.source == Some(PathBuf::from("/dev/null"))
                && m.flags.contains(MsFlags::MS_RDONLY)
        }));

        // identity file written under run/
        let env = fs::read_to_string(rootfs.join("run/.containerenv"))?;
        assert!(env.contains("name=\"test\""));
        assert!(env.contains("id=\"cafebabe\""));
        Ok(())
    }

    #[test]
    fn test_host_network_binds_resolv_conf() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let (paths, mut config) = sample_config(dir.path());
        config.network = HOST.to_string();
        let rootfs = paths.container_path(&config.id).join("rootfs");
        fs::create_dir_all(&rootfs)?;

        let syscall = TestHelperSyscall::default();
        syscall.mark_as_file(Path::new("/etc/resolv.conf"));
        syscall.mark_as_file(Path::new("/dev/null"));

        setup_rootfs(&paths, &config, &syscall)?;

        assert!(syscall
            .get_mount_args()
            .iter()
            .any(|m| m.target == rootfs.join("etc/resolv.conf")));
        Ok(())
    }

    #[test]
    fn test_privileged_skips_masked_mounts() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let (paths, mut config) = sample_config(dir.path());
        config.privileged = true;
        let rootfs = paths.container_path(&config.id).join("rootfs");
        fs::create_dir_all(&rootfs)?;

        let syscall = TestHelperSyscall::default();
        setup_rootfs(&paths, &config, &syscall)?;

        assert!(!syscall
            .get_mount_args()
            .iter()
            .any(|m| m.target == rootfs.join("proc/kcore")));
        Ok(())
    }

    #[test]
    fn test_volume_spec_parsing() {
        assert_eq!(parse_volume_spec(""), None);
        assert_eq!(
            parse_volume_spec("data"),
            Some(VolumeSpec::Anonymous {
                destination: "data".into()
            })
        );
        assert_eq!(
            parse_volume_spec("/src:/dst"),
            Some(VolumeSpec::Bind {
                source: "/src".into(),
                destination: "/dst".into(),
                mode: "rw".into()
            })
        );
        assert_eq!(
            parse_volume_spec("/src:/dst:ro"),
            Some(VolumeSpec::Bind {
                source: "/src".into(),
                destination: "/dst".into(),
                mode: "ro".into()
            })
        );
        assert_eq!(
            parse_volume_spec(
                "type=bind,source=/a,destination=/b,readonly,bind-propagation=rslave"
            ),
            Some(VolumeSpec::Mount {
                typ: "bind".into(),
                source: "/a".into(),
                destination: "/b".into(),
                readonly: true,
                propagation: "rslave".into()
            })
        );
    }

    #[test]
    fn test_anonymous_volume_backing_dir() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let (paths, mut config) = sample_config(dir.path());
        config.mounts = vec!["scratch".into()];
        let rootfs = paths.container_path(&config.id).join("rootfs");
        fs::create_dir_all(&rootfs)?;

        let syscall = TestHelperSyscall::default();
        syscall.mark_as_file(Path::new("/dev/null"));
        setup_rootfs(&paths, &config, &syscall)?;

        let backing = paths.volume_dir().join(&config.id).join("scratch");
        assert!(backing.is_dir());
        assert!(syscall.get_mount_args().iter().any(|m| {
            m.source == Some(backing.clone()) && m.target == rootfs.join("scratch")
        }));
        Ok(())
    }

    #[test]
    fn test_volume_mode_flags() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let (paths, mut config) = sample_config(dir.path());
        config.mounts = vec!["/src:/dst:ro,rslave".into()];
        let rootfs = paths.container_path(&config.id).join("rootfs");
        fs::create_dir_all(&rootfs)?;

        let syscall = TestHelperSyscall::default();
        setup_rootfs(&paths, &config, &syscall)?;

        let mount = syscall
            .get_mount_args()
            .into_iter()
            .find(|m| m.target == rootfs.join("dst"))
            .expect("volume mount missing");
        assert!(mount.flags.contains(MsFlags::MS_RDONLY));
        assert!(mount.flags.contains(MsFlags::MS_SLAVE));
        assert!(mount.flags.contains(MsFlags::MS_BIND | MsFlags::MS_REC));
        Ok(())
    }

    #[test]
    fn test_cgroupfs_scope_naming() {
        let config = Config {
            names: "web".into(),
            ..Default::default()
        };
        assert_eq!(
            scope_dir(&config),
            PathBuf::from("/sys/fs/cgroup/container-web.scope")
        );
    }
}
