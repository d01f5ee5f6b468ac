//! Privileged execution capability
//!
//! The installer never talks to an elevation mechanism directly. It goes
//! through the [`PrivilegedExecutor`] trait so the mechanism can be swapped
//! (sudo-style launcher, a platform binder service, a test fake).
//!
//! - [`CommandExecutor`]: runs argument vectors via `tokio::process`,
//!   optionally behind a launcher such as `sudo -n`
//! - [`UnavailableExecutor`]: stub that refuses everything

mod command;
mod traits;
mod unavailable;

pub use command::{CommandExecutor, Launcher};
pub use traits::{AuthorizationOutcome, ExecOutput, PrivilegedExecutor};
pub use unavailable::UnavailableExecutor;
