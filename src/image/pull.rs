//! Pulling OCI images from remote registries.
//!
//! The puller fetches the v2 manifest (doing the bearer-token dance for
//! docker.io), then brings every layer into the image directory by the
//! cheapest means available: keep a verified file already in place, hard-link
//! a verified copy from another image, or stream the blob into a `.temp`
//! staging dir, verify it and rename it into place.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};
use serde::Deserialize;

use crate::error::Error;
use crate::image::reference::ImageRef;
use crate::image::store;
use crate::paths::Paths;

const MANIFEST_V2: &str = "application/vnd.docker.distribution.manifest.v2+json";

/// Image manifest as served by the registry v2 API.
#[derive(Debug, Deserialize)]
pub struct Manifest {
    pub config: Descriptor,
    #[serde(default)]
    pub layers: Vec<Descriptor>,
}

#[derive(Debug, Deserialize)]
pub struct Descriptor {
    #[serde(rename = "mediaType", default)]
    pub media_type: String,
    #[serde(default)]
    pub size: i64,
    pub digest: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: Option<String>,
    access_token: Option<String>,
}

// Directory removed by the SIGINT handler while a pull is in flight.
static CLEANUP_DIR: Mutex<Option<PathBuf>> = Mutex::new(None);

extern "C" fn interrupt_cleanup(_: libc::c_int) {
    if let Ok(guard) = CLEANUP_DIR.lock() {
        if let Some(dir) = guard.as_ref() {
            let _ = fs::remove_dir_all(dir);
        }
    }
    std::process::exit(130);
}

fn arm_interrupt_cleanup(dir: &Path) -> Result<()> {
    *CLEANUP_DIR.lock().unwrap() = Some(dir.to_path_buf());

    let action = SigAction::new(
        SigHandler::Handler(interrupt_cleanup),
        SaFlags::empty(),
        SigSet::empty(),
    );
    unsafe { sigaction(Signal::SIGINT, &action) }.context("failed to set SIGINT handler")?;

    Ok(())
}

fn disarm_interrupt_cleanup() {
    *CLEANUP_DIR.lock().unwrap() = None;
}

/// Pull the given image into the image store and return its ID.
///
/// Layers already present and verified are skipped, so re-pulling an image
/// performs no blob downloads beyond the manifest and token. If `quiet` is
/// set no progress output is printed.
pub fn pull(paths: &Paths, image: &str, quiet: bool) -> Result<String> {
    let reference = ImageRef::parse(image)?;
    let canonical = reference.canonical();

    if !quiet {
        println!("pulling image manifest: {}", canonical);
    }

    let client = reqwest::blocking::Client::builder()
        .build()
        .context("failed to build http client")?;

    let token = if reference.needs_docker_token() {
        Some(fetch_docker_token(&client, &reference)?)
    } else {
        None
    };

    let manifest_raw = fetch_manifest(&client, &reference, token.as_deref())?;
    let manifest: Manifest =
        serde_json::from_slice(&manifest_raw).map_err(|e| Error::ManifestFetch {
            reference: canonical.clone(),
            reason: format!("malformed manifest: {}", e),
        })?;

    if manifest.layers.is_empty() {
        return Err(Error::ManifestFetch {
            reference: canonical,
            reason: "manifest carries no layers (multi-arch index?)".into(),
        }
        .into());
    }

    let target_dir = paths.image_path(&reference.id());
    fs::create_dir_all(&target_dir)?;

    // a partial image dir is useless, remove it when interrupted
    arm_interrupt_cleanup(&target_dir)?;

    let mut keep_files = vec![
        "manifest.json".to_string(),
        "config.json".to_string(),
        "image_name".to_string(),
    ];
    for layer in &manifest.layers {
        let file_name = download_layer(paths, &target_dir, &client, &reference, layer, token.as_deref(), quiet)?;
        keep_files.push(file_name);
    }

    log::debug!("{} layers successfully saved", manifest.layers.len());
    log::debug!("cleaning up unwanted files");

    for entry in fs::read_dir(&target_dir)?.flatten() {
        let name = entry.file_name().to_string_lossy().to_string();
        if !keep_files.contains(&name) {
            log::debug!("found unwanted file {}, removing", name);
            let path = entry.path();
            if path.is_dir() {
                fs::remove_dir_all(&path)?;
            } else {
                fs::remove_file(&path)?;
            }
        }
    }

    if !quiet {
        println!("saving manifest for {}", canonical);
    }
    crate::utils::write_file(target_dir.join("manifest.json"), &manifest_raw, 0o644)?;

    if !quiet {
        println!("saving config for {}", canonical);
    }
    let config_dest = target_dir.join("config.json");
    let config_hex = manifest
        .config
        .digest
        .strip_prefix("sha256:")
        .unwrap_or(&manifest.config.digest);
    // an already verified config makes a re-pull free of blob reads
    if !(config_dest.exists() && store::verify(&config_dest, config_hex)) {
        let config_raw =
            fetch_blob(&client, &reference, &manifest.config.digest, token.as_deref())?;
        crate::utils::write_file(&config_dest, &config_raw, 0o644)?;
    }

    if !quiet {
        println!("saving metadata for {}", canonical);
    }
    crate::utils::write_file(target_dir.join("image_name"), canonical.as_bytes(), 0o644)?;

    disarm_interrupt_cleanup();

    if !quiet {
        println!("done");
    }

    Ok(reference.id())
}

/// Fetch a pull token from auth.docker.io for the given repository.
fn fetch_docker_token(client: &reqwest::blocking::Client, reference: &ImageRef) -> Result<String> {
    let url = format!(
        "https://auth.docker.io/token?service=registry.docker.io&scope=repository:{}:pull",
        reference.repository
    );

    let response: TokenResponse = client
        .get(&url)
        .send()
        .and_then(|r| r.json())
        .map_err(|e| Error::ManifestFetch {
            reference: reference.canonical(),
            reason: format!("token fetch failed: {}", e),
        })?;

    response
        .token
        .or(response.access_token)
        .ok_or_else(|| {
            Error::ManifestFetch {
                reference: reference.canonical(),
                reason: "no token in auth response".into(),
            }
            .into()
        })
}

fn fetch_manifest(
    client: &reqwest::blocking::Client,
    reference: &ImageRef,
    token: Option<&str>,
) -> Result<Vec<u8>> {
    let mut request = client.get(reference.manifest_url()).header("Accept", MANIFEST_V2);
    if let Some(token) = token {
        request = request.bearer_auth(token);
    }

    let response = request.send().map_err(|e| Error::ManifestFetch {
        reference: reference.canonical(),
        reason: e.to_string(),
    })?;

    if !response.status().is_success() {
        return Err(Error::ManifestFetch {
            reference: reference.canonical(),
            reason: format!("registry answered {}", response.status()),
        }
        .into());
    }

    Ok(response.bytes().map(|b| b.to_vec()).map_err(|e| Error::ManifestFetch {
        reference: reference.canonical(),
        reason: e.to_string(),
    })?)
}

fn fetch_blob(
    client: &reqwest::blocking::Client,
    reference: &ImageRef,
    digest: &str,
    token: Option<&str>,
) -> Result<Vec<u8>> {
    let mut request = client.get(reference.blob_url(digest));
    if let Some(token) = token {
        request = request.bearer_auth(token);
    }

    let response = request.send().map_err(|e| Error::BlobFetch {
        digest: digest.to_string(),
        reason: e.to_string(),
    })?;

    if !response.status().is_success() {
        return Err(Error::BlobFetch {
            digest: digest.to_string(),
            reason: format!("registry answered {}", response.status()),
        }
        .into());
    }

    Ok(response.bytes().map(|b| b.to_vec()).map_err(|e| Error::BlobFetch {
        digest: digest.to_string(),
        reason: e.to_string(),
    })?)
}

/// Bring one layer into `target_dir` and return its file name.
fn download_layer(
    paths: &Paths,
    target_dir: &Path,
    client: &reqwest::blocking::Client,
    reference: &ImageRef,
    layer: &Descriptor,
    token: Option<&str>,
    quiet: bool,
) -> Result<String> {
    let digest_hex = layer
        .digest
        .strip_prefix("sha256:")
        .ok_or_else(|| Error::BadReference(layer.digest.clone()))?;
    let file_name = format!("{}.tar.gz", digest_hex);
    let target = target_dir.join(&file_name);

    if !quiet {
        eprintln!("pulling layer {}", file_name);
    }

    // a verified file already in place wins
    if target.exists() && store::verify(&target, digest_hex) {
        if !quiet {
            eprintln!("layer {} already exists, skipping", file_name);
        }
        return Ok(file_name);
    }

    // a verified copy under another image is hard-linked
    let candidates = store::find_existing_layer(&paths.image_dir(), &file_name);
    if store::dedup_link(&target, digest_hex, &candidates)? {
        if !quiet {
            eprintln!("layer {} already exists, linking", file_name);
        }
        return Ok(file_name);
    }

    // stage the download so a broken transfer never lands in the image dir
    let tmpdir = target_dir.join(store::TEMP_DIR);
    let _ = fs::remove_dir_all(&tmpdir);
    fs::create_dir_all(&tmpdir)?;

    let result = stream_blob_to(&tmpdir.join(&file_name), client, reference, layer, token)
        .and_then(|_| {
            let staged = tmpdir.join(&file_name);
            if !store::verify(&staged, digest_hex) {
                return Err(Error::DigestMismatch {
                    path: staged,
                    expected: digest_hex.to_string(),
                }
                .into());
            }
            fs::rename(&staged, &target)?;
            log::debug!("successfully checked layer: {}", file_name);
            Ok(())
        });

    let _ = fs::remove_dir_all(&tmpdir);
    result?;

    Ok(file_name)
}

fn stream_blob_to(
    dest: &Path,
    client: &reqwest::blocking::Client,
    reference: &ImageRef,
    layer: &Descriptor,
    token: Option<&str>,
) -> Result<()> {
    let mut request = client.get(reference.blob_url(&layer.digest));
    if let Some(token) = token {
        request = request.bearer_auth(token);
    }

    let mut response = request.send().map_err(|e| Error::BlobFetch {
        digest: layer.digest.clone(),
        reason: e.to_string(),
    })?;

    if !response.status().is_success() {
        return Err(Error::BlobFetch {
            digest: layer.digest.clone(),
            reason: format!("registry answered {}", response.status()),
        }
        .into());
    }

    let mut file = fs::File::create(dest)?;
    response
        .copy_to(&mut file)
        .map_err(|e| Error::BlobFetch {
            digest: layer.digest.clone(),
            reason: e.to_string(),
        })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_parsing() {
        let raw = r#"{
            "schemaVersion": 2,
            "mediaType": "application/vnd.docker.distribution.manifest.v2+json",
            "config": {
                "mediaType": "application/vnd.docker.container.image.v1+json",
                "size": 1469,
                "digest": "sha256:aaa"
            },
            "layers": [
                {
                    "mediaType": "application/vnd.docker.image.rootfs.diff.tar.gzip",
                    "size": 3401613,
                    "digest": "sha256:bbb"
                }
            ]
        }"#;

        let manifest: Manifest = serde_json::from_str(raw).unwrap();
        assert_eq!(manifest.config.digest, "sha256:aaa");
        assert_eq!(manifest.layers.len(), 1);
        assert_eq!(manifest.layers[0].size, 3401613);
    }

    #[test]
    fn test_token_response_both_spellings() {
        let a: TokenResponse = serde_json::from_str(r#"{"token": "t1"}"#).unwrap();
        assert_eq!(a.token.as_deref(), Some("t1"));
        let b: TokenResponse = serde_json::from_str(r#"{"access_token": "t2"}"#).unwrap();
        assert_eq!(b.access_token.as_deref(), Some("t2"));
    }
}
