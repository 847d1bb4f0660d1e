//! Execute a command inside a running container.

use anyhow::Result;
use clap::Args;

use crate::container;
use crate::container::config::Config;
use crate::error::Error;
use crate::paths::Paths;

#[derive(Args, Debug)]
pub struct Exec {
    /// Run the exec session in detached mode (backgrounded)
    #[arg(short, long)]
    detach: bool,
    /// Keep STDIN open even if not attached
    #[arg(short, long)]
    interactive: bool,
    /// Allocate a pseudo-TTY
    #[arg(short, long)]
    tty: bool,
    /// Set environment variables in container
    #[arg(short, long)]
    env: Vec<String>,
    /// Username or UID (format: <name|uid>[:<group|gid>])
    #[arg(short, long, default_value = "root:root")]
    user: String,
    /// Working directory inside the container
    #[arg(short, long, default_value = "/")]
    workdir: String,

    // inert, kept for CLI compatibility with podman/docker
    #[arg(long, hide = true)]
    detach_keys: Option<String>,

    /// Container to enter
    container: String,
    /// Command to run
    #[arg(
        required = true,
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    command: Vec<String>,
}

impl Exec {
    pub fn exec(self, paths: &Paths) -> Result<()> {
        let mut detach = self.detach;
        let mut interactive = self.interactive;
        let mut tty = self.tty;

        if interactive || tty {
            detach = false;
        }
        if detach {
            interactive = false;
            tty = false;
        }

        if !container::get_dir(paths, &self.container).exists() {
            return Err(Error::NotFound {
                kind: "container",
                name: self.container.clone(),
            }
            .into());
        }

        let pid = container::get_pid(paths, &self.container)
            .ok_or_else(|| Error::NotRunning(self.container.clone()))?;

        let config_path = container::get_dir(paths, &self.container).join("config");
        let mut config = Config::load(&config_path)?;

        log::debug!("entering: {}", self.container);

        let mut env = vec![
            "TERM=xterm".to_string(),
            "PATH=/usr/local/sbin:/usr/local/bin:/usr/sbin:/usr/bin:/sbin:/bin".to_string(),
        ];
        env.extend(self.env.iter().cloned());

        config.user = self.user.clone();
        config.entrypoint = self.command.clone();
        config.env.extend(env);
        config.workdir = self.workdir.clone();

        container::exec(paths, pid, interactive, tty, &config)
    }
}
