//! Small filesystem and process helpers shared across the engine.

use std::ffi::CString;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::thread::sleep;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use nix::mount::umount;
use nix::unistd;

/// Write `content` to `path` with the given mode, replacing any previous
/// content.
pub fn write_file<P: AsRef<Path>>(path: P, content: &[u8], mode: u32) -> Result<()> {
    let path = path.as_ref();
    fs::write(path, content).with_context(|| format!("failed to write {:?}", path))?;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))?;
    Ok(())
}

/// Write `content` to `path` via a temporary sibling followed by a rename, so
/// that readers never observe a partially written file.
pub fn write_file_atomic<P: AsRef<Path>>(path: P, content: &[u8], mode: u32) -> Result<()> {
    let path = path.as_ref();
    let tmp = path.with_extension("tmp");
    write_file(&tmp, content, mode)?;
    fs::rename(&tmp, path).with_context(|| format!("failed to publish {:?}", path))?;
    Ok(())
}

/// Replace the current process image, searching `PATH` for the program.
pub fn do_exec(path: &str, args: &[String]) -> Result<()> {
    let p = CString::new(path.to_string())?;
    let a: Vec<CString> = args
        .iter()
        .map(|s| CString::new(s.to_string()).unwrap_or_default())
        .collect();

    unistd::execvp(&p, &a)?;
    Ok(())
}

/// Looks up the location of a binary in `PATH`.
pub fn lookup_binary(binary: &str) -> Option<PathBuf> {
    let paths = std::env::var("PATH").ok()?;
    paths
        .split_terminator(':')
        .map(|p| PathBuf::from(p).join(binary))
        .find(|p| p.exists())
}

/// Disk usage for a directory tree, rendered as `X.00 MB`.
pub fn disk_usage_megabytes(path: &Path) -> Result<String> {
    fn walk(path: &Path, total: &mut u64) -> std::io::Result<()> {
        for entry in fs::read_dir(path)? {
            let entry = entry?;
            let meta = entry.metadata()?;
            if meta.is_dir() {
                // ignore unreadable subtrees, matching du -s behavior
                let _ = walk(&entry.path(), total);
            } else {
                *total += meta.len();
            }
        }
        Ok(())
    }

    let mut total = 0u64;
    walk(path, &mut total).with_context(|| format!("failed to walk {:?}", path))?;

    let size = (total as f64 / 1024.0 / 1024.0).round();
    Ok(format!("{:.2} MB", size))
}

/// Copy a file to `dest`, preserving the source mode. When `dest` is a
/// directory the source basename is appended.
pub fn copy_file(src: &Path, dest: &Path) -> Result<()> {
    let meta = fs::metadata(src).with_context(|| format!("failed to stat {:?}", src))?;
    if !meta.is_file() {
        bail!("{:?} is not a regular file", src);
    }

    let dest = if dest.is_dir() {
        dest.join(src.file_name().context("source has no file name")?)
    } else {
        dest.to_path_buf()
    };

    let content = fs::read(src)?;
    write_file(&dest, &content, meta.permissions().mode() & 0o7777)
}

/// Whether `path` appears as a mountpoint in `/proc/mounts`.
pub fn is_mountpoint(path: &Path) -> bool {
    let mounts = match fs::read_to_string("/proc/mounts") {
        Ok(m) => m,
        Err(_) => return false,
    };

    let needle = path.to_string_lossy();
    mounts
        .lines()
        .filter_map(|line| line.split(' ').nth(1))
        .any(|mountpoint| mountpoint == needle)
}

/// Unmount `dest` and everything stacked on it, retrying until it ceases to
/// be a mountpoint.
pub fn umount_all(dest: &Path) -> Result<()> {
    loop {
        if !is_mountpoint(dest) {
            log::debug!("{:?} not a mountpoint", dest);
            break;
        }

        umount(dest).with_context(|| format!("failed to unmount {:?}", dest))?;
        sleep(Duration::from_millis(500));
    }

    Ok(())
}

/// Returns a random `xxxxxx_xxxxxx` container name.
pub fn random_name() -> String {
    // no external randomness needed for a default name, sub-second time bits
    // are unique enough for colliding `create` calls to be caught by the
    // config existence check
    let letters: Vec<char> = "abcdefghijklmnopqrstuvwxyz0123456789".chars().collect();
    let mut seed = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
        ^ (std::process::id() as u64) << 32;

    let mut next = || {
        // xorshift64
        seed ^= seed << 13;
        seed ^= seed >> 7;
        seed ^= seed << 17;
        letters[(seed % letters.len() as u64) as usize]
    };

    let mut name = String::with_capacity(13);
    for i in 0..13 {
        if i == 6 {
            name.push('_');
        } else {
            name.push(next());
        }
    }

    name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_file_atomic_replaces_content() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let target = dir.path().join("config");

        write_file_atomic(&target, b"first", 0o644)?;
        write_file_atomic(&target, b"second", 0o644)?;

        assert_eq!(fs::read(&target)?, b"second");
        assert!(!target.with_extension("tmp").exists());
        Ok(())
    }

    #[test]
    fn test_disk_usage_format() -> Result<()> {
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join("blob"), vec![0u8; 3 * 1024 * 1024])?;

        assert_eq!(disk_usage_megabytes(dir.path())?, "3.00 MB");
        Ok(())
    }

    #[test]
    fn test_copy_file_into_directory() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let src = dir.path().join("data");
        fs::write(&src, b"payload")?;
        let dest = dir.path().join("sub");
        fs::create_dir(&dest)?;

        copy_file(&src, &dest)?;
        assert_eq!(fs::read(dest.join("data"))?, b"payload");
        Ok(())
    }

    #[test]
    fn test_random_name_shape() {
        let name = random_name();
        assert_eq!(name.len(), 13);
        assert_eq!(name.chars().nth(6), Some('_'));
    }
}
