//! Process machinery: the privilege-crossing state machine, id mappings,
//! the low-level clone wrapper, stdio handling and pid discovery.
//!
//! The engine is daemonless; a command that needs namespaces walks this FSM
//! by re-exec, carrying its state in argv:
//!
//! ```text
//! Unprivileged -> MappingParent -> MappingChild -> ContainerParent -> ContainerChild
//! ```

pub mod discovery;
pub mod fake_root;
pub mod fork;
pub mod idmap;
pub mod io;
pub mod launcher;
pub mod user;
