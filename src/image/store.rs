//! Content-addressed blob handling for the image store.
//!
//! Blob files are published into an image directory only after their SHA-256
//! matches the digest in their filename. Identical layers across images are
//! deduplicated with hard links, so removing one image only drops a link
//! count.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};

/// Name of the staging directory for in-flight downloads inside an image dir.
pub const TEMP_DIR: &str = ".temp";

/// Streamed SHA-256 of a file, as lowercase hex.
pub fn digest_sha256(path: &Path) -> Result<String> {
    let mut file =
        fs::File::open(path).with_context(|| format!("failed to open {:?}", path))?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;

    Ok(format!("{:x}", hasher.finalize()))
}

/// Whether the file's SHA-256 equals the expected hex digest.
pub fn verify(path: &Path, expected_hex: &str) -> bool {
    match digest_sha256(path) {
        Ok(digest) => digest == expected_hex,
        Err(_) => false,
    }
}

/// Walk the image store looking for blobs with the given filename, to
/// hard-link instead of re-downloading.
pub fn find_existing_layer(image_dir: &Path, filename: &str) -> Vec<PathBuf> {
    let mut matching = Vec::new();
    walk(image_dir, filename, &mut matching);
    matching
}

fn walk(dir: &Path, filename: &str, matching: &mut Vec<PathBuf>) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return,
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            walk(&path, filename, matching);
        } else if entry.file_name().to_string_lossy() == filename {
            matching.push(path);
        }
    }
}

/// Hard-link the first candidate matching the expected digest to `target`.
/// Returns whether a link was made; when false the caller downloads.
pub fn dedup_link(target: &Path, expected_hex: &str, candidates: &[PathBuf]) -> Result<bool> {
    for candidate in candidates {
        if candidate == target {
            continue;
        }

        if verify(candidate, expected_hex) {
            fs::hard_link(candidate, target)
                .with_context(|| format!("failed to link {:?} to {:?}", candidate, target))?;
            return Ok(true);
        }
    }

    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::MetadataExt;

    // sha256("layer data")
    const LAYER_DIGEST: &str =
        "0d3eb24ff27d4d2dcbc99a3e5f1ef71d1bd44a8d2d3b92f2d5a2d3f0b1c0a063";

    fn sha256_hex(data: &[u8]) -> String {
        format!("{:x}", Sha256::digest(data))
    }

    #[test]
    fn test_digest_and_verify() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let blob = dir.path().join("blob.tar.gz");
        fs::write(&blob, b"layer data")?;

        let digest = digest_sha256(&blob)?;
        assert_eq!(digest, sha256_hex(b"layer data"));
        assert!(verify(&blob, &digest));
        assert!(!verify(&blob, LAYER_DIGEST.replace('0', "1").as_str()));
        Ok(())
    }

    #[test]
    fn test_find_existing_layer_walks_subdirs() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let image_a = dir.path().join("aaaa");
        let image_b = dir.path().join("bbbb");
        fs::create_dir_all(&image_a)?;
        fs::create_dir_all(&image_b)?;
        fs::write(image_a.join("cafe.tar.gz"), b"abc")?;
        fs::write(image_b.join("cafe.tar.gz"), b"abc")?;
        fs::write(image_b.join("beef.tar.gz"), b"def")?;

        let found = find_existing_layer(dir.path(), "cafe.tar.gz");
        assert_eq!(found.len(), 2);
        Ok(())
    }

    #[test]
    fn test_dedup_link_shares_inode() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let image_a = dir.path().join("aaaa");
        let image_b = dir.path().join("bbbb");
        fs::create_dir_all(&image_a)?;
        fs::create_dir_all(&image_b)?;

        let digest = sha256_hex(b"shared layer");
        let existing = image_a.join(format!("{}.tar.gz", digest));
        fs::write(&existing, b"shared layer")?;

        let target = image_b.join(format!("{}.tar.gz", digest));
        let linked = dedup_link(&target, &digest, &[existing.clone()])?;
        assert!(linked);
        assert_eq!(
            fs::metadata(&existing)?.ino(),
            fs::metadata(&target)?.ino()
        );
        Ok(())
    }

    #[test]
    fn test_dedup_link_rejects_corrupt_candidates() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let corrupt = dir.path().join("corrupt.tar.gz");
        fs::write(&corrupt, b"not the right bytes")?;

        let target = dir.path().join("target.tar.gz");
        let linked = dedup_link(&target, &sha256_hex(b"real bytes"), &[corrupt])?;
        assert!(!linked);
        assert!(!target.exists());
        Ok(())
    }
}
