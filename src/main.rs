//! Manage containers and images without root and without a daemon.

use std::env;
use std::fs;
use std::process::exit;

use anyhow::Result;
use clap::{Parser, Subcommand};

use lilipod::commands;
use lilipod::error::Error;
use lilipod::logger;
use lilipod::paths::Paths;
use lilipod::process::fake_root::PrivilegeState;
use lilipod::utils;

#[derive(Parser, Debug)]
#[command(name = "lilipod", version, about = "Manage containers and images")]
struct Opts {
    /// Log messages above specified level (mute, error, warn, debug, trace)
    #[arg(long, global = true, default_value = "warn", overrides_with = "log_level")]
    log_level: String,

    // hidden state of the privilege-crossing FSM, set on re-exec
    #[arg(long, global = true, hide = true)]
    fake_root: bool,
    #[arg(long, global = true, hide = true)]
    rootful: bool,
    #[arg(long, global = true, hide = true)]
    uid_map: Option<String>,
    #[arg(long, global = true, hide = true)]
    gid_map: Option<String>,

    #[command(subcommand)]
    subcmd: SubCommand,
}

#[derive(Subcommand, Debug)]
enum SubCommand {
    /// Copy files/folders between a container and the local filesystem
    Cp(commands::cp::Cp),
    /// Create but do not start a container
    Create(commands::create::Create),
    #[command(hide = true)]
    Enter(commands::enter::Enter),
    /// Run a command in a running container
    Exec(commands::exec::Exec),
    /// List images in local storage
    Images(commands::images::Images),
    /// Inspect a container or image
    Inspect(commands::inspect::Inspect),
    /// Fetch the logs of a container
    Logs(commands::logs::Logs),
    /// List containers
    Ps(commands::ps::Ps),
    /// Pull an image from a registry
    Pull(commands::pull::Pull),
    /// Rename a container
    Rename(commands::rename::Rename),
    /// Remove one or more containers
    Rm(commands::rm::Rm),
    /// Remove one or more images from local storage
    Rmi(commands::rmi::Rmi),
    #[command(hide = true, name = "rootless-helper")]
    RootlessHelper(commands::rootless_helper::RootlessHelper),
    /// Create and start a container
    Run(commands::run::Run),
    /// Start one or more containers
    Start(commands::start::Start),
    /// Stop one or more running containers
    Stop(commands::stop::Stop),
    /// Update the configuration of a container
    Update(commands::update::Update),
    /// Show lilipod version
    Version(commands::version::Version),
}

/// Create the data directories, make the internal bin dir reachable and
/// probe for the host helpers the engine cannot work without.
fn setup_environ(paths: &Paths) -> Result<()> {
    fs::create_dir_all(paths.bin_dir())?;
    fs::create_dir_all(paths.image_dir())?;
    fs::create_dir_all(paths.container_dir())?;
    fs::create_dir_all(paths.volume_dir())?;

    let path = format!(
        "{}:{}",
        paths.bin_dir().display(),
        env::var("PATH").unwrap_or_default()
    );
    env::set_var("PATH", path);

    // these have to be setuid/setcap host binaries, nothing we could carry
    for dep in ["getsubids", "newuidmap", "newgidmap"] {
        if utils::lookup_binary(dep).is_none() {
            return Err(Error::DependencyMissing(dep.to_string()).into());
        }
    }

    // these may be satisfied by static fallbacks under <home>/bin
    for dep in ["unshare", "nsenter", "tar"] {
        if utils::lookup_binary(dep).is_none() {
            log::warn!("failed to find dependency {}, some commands will not work", dep);
        }
    }

    Ok(())
}

fn main() {
    let opts = Opts::parse();

    if let Err(e) = logger::init(&opts.log_level) {
        eprintln!("log init failed: {:?}", e);
    }

    let paths = Paths::from_env();
    let state = PrivilegeState {
        fake_root: opts.fake_root,
        rootful: opts.rootful,
        uid_map: opts.uid_map.clone(),
        gid_map: opts.gid_map.clone(),
    };

    if let Err(e) = setup_environ(&paths) {
        eprintln!("{:#}", e);
        exit(1);
    }

    let result = match opts.subcmd {
        SubCommand::Cp(cmd) => cmd.exec(&paths, &state),
        SubCommand::Create(cmd) => cmd.exec(&paths, &state),
        SubCommand::Enter(cmd) => cmd.exec(&paths, &state),
        SubCommand::Exec(cmd) => cmd.exec(&paths),
        SubCommand::Images(cmd) => cmd.exec(&paths),
        SubCommand::Inspect(cmd) => cmd.exec(&paths),
        SubCommand::Logs(cmd) => cmd.exec(&paths),
        SubCommand::Ps(cmd) => cmd.exec(&paths),
        SubCommand::Pull(cmd) => cmd.exec(&paths),
        SubCommand::Rename(cmd) => cmd.exec(&paths, &state),
        SubCommand::Rm(cmd) => cmd.exec(&paths, &state),
        SubCommand::Rmi(cmd) => cmd.exec(&paths),
        SubCommand::RootlessHelper(cmd) => cmd.exec(&state),
        SubCommand::Run(cmd) => cmd.exec(&paths, &state),
        SubCommand::Start(cmd) => cmd.exec(&paths, &state),
        SubCommand::Stop(cmd) => cmd.exec(&paths),
        SubCommand::Update(cmd) => cmd.exec(&paths),
        SubCommand::Version(cmd) => cmd.exec(&paths),
    };

    if let Err(e) = result {
        eprintln!("{:#}", e);
        exit(1);
    }
}
