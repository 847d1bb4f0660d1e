//! # lilipod
//! A rootless, daemonless container engine. It pulls OCI images from remote
//! registries, assembles them into chrootable root filesystems and launches
//! them inside a set of Linux namespaces with subuid/subgid remapping, without
//! requiring real root or a background daemon.
//!
//! Each CLI invocation is a short lived process. Commands that touch
//! namespaces re-exec the engine through the hidden `rootless-helper`
//! subcommand to become fake-root first, then once more through the hidden
//! `enter` subcommand to build the container's mount tree, pivot into it and
//! exec the entrypoint.

pub mod capabilities;
pub mod commands;
pub mod container;
pub mod error;
pub mod image;
pub mod logger;
pub mod paths;
pub mod process;
pub mod syscall;
pub mod template;
pub mod utils;

/// Engine version, stamped into `/run/.containerenv` of every container.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
