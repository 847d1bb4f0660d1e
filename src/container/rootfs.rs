//! Building a chrootable rootfs out of an image's layers.

use std::fs;
use std::path::Path;
use std::process::Command;
use std::thread::sleep;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use nix::sched::CloneFlags;
use nix::sys::signal::Signal;
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd;

use crate::container::config::{Config, KEEP_ID};
use crate::container::get_dir;
use crate::image;
use crate::image::pull::Manifest;
use crate::paths::Paths;
use crate::process::fake_root::PrivilegeState;
use crate::process::fork;
use crate::process::idmap::{self, SubIdMap};

/// Generate a rootfs for a new container from an image reference, pulling
/// the image first when it is not in the store.
///
/// Layers are unpacked in manifest order; `keep-id` extraction happens in a
/// transient mapped user namespace so layer files end up owned by ids the
/// caller can reach. The finished config is persisted into the container
/// dir, with env and entrypoint defaults merged in from the image.
pub fn create_rootfs(
    paths: &Paths,
    state: &PrivilegeState,
    image_ref: &str,
    name: &str,
    mut config: Config,
) -> Result<()> {
    log::debug!("preparing rootfs for new container {}", name);

    let rootfs = get_dir(paths, name).join("rootfs");
    fs::create_dir_all(&rootfs)?;

    log::debug!("looking up image {}", image_ref);
    let image_dir = image::get_path(paths, image_ref);
    if !image_dir.exists() {
        image::pull::pull(paths, image_ref, false)?;
    }

    log::debug!("reading {}'s manifest", image_ref);
    let manifest_raw = fs::read(image_dir.join("manifest.json"))
        .with_context(|| format!("failed to read manifest of {}", image_ref))?;
    let manifest: Manifest =
        serde_json::from_slice(&manifest_raw).context("malformed image manifest")?;

    log::debug!("extracting image's layers");
    for layer in &manifest.layers {
        let digest_hex = layer.digest.strip_prefix("sha256:").unwrap_or(&layer.digest);
        let layer_file = image_dir.join(format!("{}.tar.gz", digest_hex));

        log::debug!("extracting layer {:?} in {:?}", layer_file, rootfs);
        untar_layer(&layer_file, &rootfs, &config.userns, state)?;
    }

    log::debug!("populating config defaults from the image");
    let image_config = image::load_config(paths, image_ref)?;

    config.env.extend(image_config.config.env.iter().cloned());
    config.env.push(format!("HOSTNAME={}", config.hostname));
    config.env.push("TERM=xterm".to_string());

    if config.entrypoint.is_empty() {
        log::debug!("entrypoint not specified, falling back to the image command");
        config.entrypoint = image_config.config.cmd.clone();
    }

    config.uidmap = state.uid_map.clone().unwrap_or_default();
    config.gidmap = state.gid_map.clone().unwrap_or_default();

    log::debug!("saving config");
    config.save(&get_dir(paths, name).join("config"))?;

    Ok(())
}

/// Untar one layer into the target directory, excluding device nodes.
///
/// With `keep-id` the extraction runs inside a transient user namespace
/// whose maps mirror the container's, so the unpacked files are owned by the
/// subordinate range rather than by ids invisible to the caller.
pub fn untar_layer(
    layer: &Path,
    target: &Path,
    userns: &str,
    state: &PrivilegeState,
) -> Result<()> {
    if userns != KEEP_ID {
        let output = Command::new("tar")
            .arg("--exclude=dev/*")
            .arg("-xf")
            .arg(layer)
            .arg("-C")
            .arg(target)
            .output()
            .context("failed to run tar")?;

        if !output.status.success() {
            bail!(
                "tar failed on {:?}: {}",
                layer,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        return Ok(());
    }

    let uid_map: SubIdMap = state
        .uid_map
        .as_deref()
        .context("keep-id extraction needs a uid map")?
        .parse()?;
    let gid_map: SubIdMap = state
        .gid_map
        .as_deref()
        .context("keep-id extraction needs a gid map")?
        .parse()?;

    let script = format!(
        "mkdir -p {target} && chown -R root:root {target} && tar --exclude=dev/* -xf {layer} -C {target}",
        target = target.display(),
        layer = layer.display(),
    );

    log::debug!("keep-id extraction of {:?}", layer);

    let child = fork::clone(
        Box::new(|| {
            let _ = prctl::set_death_signal(Signal::SIGTERM as isize);

            // wait for the parent to write the maps
            while fs::read_to_string("/proc/self/uid_map")
                .unwrap_or_default()
                .trim()
                .is_empty()
            {
                sleep(Duration::from_millis(5));
            }

            // become namespace root before touching the rootfs
            let root_uid = unistd::Uid::from_raw(0);
            let root_gid = unistd::Gid::from_raw(0);
            if unistd::setresgid(root_gid, root_gid, root_gid).is_err()
                || unistd::setresuid(root_uid, root_uid, root_uid).is_err()
            {
                return -1;
            }

            match Command::new("/bin/sh").arg("-c").arg(&script).status() {
                Ok(status) if status.success() => 0,
                _ => 1,
            }
        }),
        CloneFlags::CLONE_NEWUTS | CloneFlags::CLONE_NEWNS | CloneFlags::CLONE_NEWUSER,
    )?;

    idmap::wait_for_unshared(child.as_raw())?;
    idmap::write_keep_id_maps(child.as_raw(), &uid_map, &gid_map)?;

    match waitpid(child, None)? {
        WaitStatus::Exited(_, 0) => Ok(()),
        status => bail!("keep-id extraction of {:?} failed: {:?}", layer, status),
    }
}
