//! Create but do not start a container.

use anyhow::Result;
use chrono::Local;
use clap::Args;

use crate::container;
use crate::container::config::{Config, KEEP_ID, PRIVATE};
use crate::container::rootfs;
use crate::error::Error;
use crate::image;
use crate::image::reference::ImageRef;
use crate::paths::Paths;
use crate::process::fake_root::{self, PrivilegeState};
use crate::utils;

/// Creation flags shared between `create` and `run`.
#[derive(Args, Debug, Clone)]
pub struct CreateOptions {
    /// Give extended privileges to the container
    #[arg(long)]
    pub privileged: bool,
    /// Pull image before running
    #[arg(long)]
    pub pull: bool,
    /// cgroup namespace to use
    #[arg(long, default_value = PRIVATE)]
    pub cgroupns: String,
    /// Overwrite command to execute when starting the container
    #[arg(long)]
    pub entrypoint: Option<String>,
    /// IPC namespace to use
    #[arg(long, default_value = PRIVATE)]
    pub ipc: String,
    /// Assign a name to the container
    #[arg(long)]
    pub name: Option<String>,
    /// Connect a container to a network
    #[arg(long, default_value = PRIVATE)]
    pub network: String,
    /// pid namespace to use
    #[arg(long, default_value = PRIVATE)]
    pub pid: String,
    /// time namespace to use
    #[arg(long, default_value = PRIVATE)]
    pub time: String,
    /// user namespace to use
    #[arg(long, default_value = KEEP_ID)]
    pub userns: String,
    /// Signal to stop the container
    #[arg(long, default_value = "SIGTERM")]
    pub stop_signal: String,
    /// Set environment variables in container
    #[arg(short, long)]
    pub env: Vec<String>,
    /// Set metadata on container
    #[arg(long)]
    pub label: Vec<String>,
    /// Bind mount a volume into the container
    #[arg(short, long)]
    pub volume: Vec<String>,
    /// Perform a mount into the container
    #[arg(long)]
    pub mount: Vec<String>,
    /// Set container hostname
    #[arg(long)]
    pub hostname: Option<String>,
    /// Username or UID (format: <name|uid>[:<group|gid>])
    #[arg(short, long, default_value = "root:root")]
    pub user: String,

    // inert, kept for CLI compatibility with podman/docker
    #[arg(long, hide = true)]
    pub security_opt: Option<String>,
    #[arg(long, hide = true)]
    pub pids_limit: Option<String>,

    /// Image to create the container from
    #[arg(required = true)]
    pub image: String,
    /// Command to run in the container
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

impl CreateOptions {
    /// Build the container config out of the flags, resolving the name,
    /// hostname and canonical image reference.
    pub fn to_config(&self, paths: &Paths, state: &PrivilegeState) -> Result<Config> {
        if state.rootful && self.userns == KEEP_ID {
            return Err(Error::InvalidConfig(
                "cannot use userns=keep-id in rootful mode, use private for it".to_string(),
            )
            .into());
        }

        let name = self.name.clone().unwrap_or_else(utils::random_name);
        let hostname = self.hostname.clone().unwrap_or_else(|| name.clone());

        // store the canonical reference unless an already-present image was
        // named by id
        let mut image_ref = self.image.clone();
        if !image::get_path(paths, &image_ref).exists() {
            if let Ok(parsed) = ImageRef::parse(&image_ref) {
                image_ref = parsed.canonical();
            }
        }

        let mut entrypoint = Vec::new();
        if let Some(custom) = &self.entrypoint {
            entrypoint.push(custom.clone());
        }
        entrypoint.extend(self.command.iter().cloned());

        let mut mounts = self.mount.clone();
        mounts.extend(self.volume.iter().cloned());

        Ok(Config {
            id: container::get_id(paths, &name),
            env: self.env.clone(),
            cgroup: self.cgroupns.clone(),
            created: Local::now().format(container::CREATED_FORMAT).to_string(),
            gidmap: String::new(),
            hostname,
            image: image_ref,
            ipc: self.ipc.clone(),
            names: name,
            network: self.network.clone(),
            pid: self.pid.clone(),
            privileged: self.privileged,
            size: String::new(),
            status: String::new(),
            time: self.time.clone(),
            uidmap: String::new(),
            user: self.user.clone(),
            userns: self.userns.clone(),
            workdir: "/".to_string(),
            stopsignal: self.stop_signal.clone(),
            mounts,
            labels: self.label.clone(),
            entrypoint,
        })
    }
}

#[derive(Args, Debug)]
pub struct Create {
    #[command(flatten)]
    options: CreateOptions,
}

impl Create {
    pub fn exec(self, paths: &Paths, state: &PrivilegeState) -> Result<()> {
        if fake_root::ensure_fake_root(state, true)? {
            return Ok(());
        }

        if self.options.pull {
            log::debug!("pulling image: {}", self.options.image);
            image::pull::pull(paths, &self.options.image, false)?;
        }

        let create_config = self.options.to_config(paths, state)?;
        let name = create_config.names.clone();

        if container::get_dir(paths, &name).join("config").exists() {
            return Err(Error::AlreadyExists {
                kind: "container",
                name,
            }
            .into());
        }

        log::debug!("preparing rootfs for: {}", name);
        let image_ref = create_config.image.clone();
        rootfs::create_rootfs(paths, state, &image_ref, &name, create_config)?;

        println!("{}", container::get_id(paths, &name));

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        options: CreateOptions,
    }

    fn parse(args: &[&str]) -> CreateOptions {
        Harness::try_parse_from(args).expect("parse failed").options
    }

    #[test]
    fn test_defaults_and_positionals() {
        let options = parse(&["create", "alpine", "sh", "-c", "echo hi"]);
        assert_eq!(options.image, "alpine");
        assert_eq!(options.command, vec!["sh", "-c", "echo hi"]);
        assert_eq!(options.userns, KEEP_ID);
        assert_eq!(options.ipc, PRIVATE);
        assert_eq!(options.user, "root:root");
        assert_eq!(options.stop_signal, "SIGTERM");
    }

    #[test]
    fn test_config_from_options() {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths {
            home: dir.path().to_path_buf(),
        };
        let state = PrivilegeState {
            fake_root: true,
            ..Default::default()
        };

        let options = parse(&[
            "create", "--name", "web", "-e", "A=1", "-v", "/tmp:/tmp", "--label", "x=y",
            "alpine", "sh",
        ]);
        let config = options.to_config(&paths, &state).unwrap();

        assert_eq!(config.names, "web");
        assert_eq!(config.hostname, "web");
        assert_eq!(config.id, container::get_id(&paths, "web"));
        assert_eq!(config.image, "index.docker.io/library/alpine:latest");
        assert_eq!(config.env, vec!["A=1"]);
        assert_eq!(config.mounts, vec!["/tmp:/tmp"]);
        assert_eq!(config.labels, vec!["x=y"]);
        assert_eq!(config.entrypoint, vec!["sh"]);
    }

    #[test]
    fn test_keep_id_rejected_in_rootful_mode() {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths {
            home: dir.path().to_path_buf(),
        };
        let state = PrivilegeState {
            rootful: true,
            ..Default::default()
        };

        let options = parse(&["create", "alpine"]);
        assert!(options.to_config(&paths, &state).is_err());
    }

    #[test]
    fn test_entrypoint_override_prepended() {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths {
            home: dir.path().to_path_buf(),
        };
        let state = PrivilegeState {
            fake_root: true,
            ..Default::default()
        };

        let options = parse(&["create", "--entrypoint", "/init", "alpine", "--serve"]);
        let config = options.to_config(&paths, &state).unwrap();
        assert_eq!(config.entrypoint, vec!["/init", "--serve"]);
    }
}
