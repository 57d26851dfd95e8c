//! Window system adapter: responsibility and boundaries
//!
//! This module and its submodules only talk to the host window system:
//! enumerate top-level windows, report focus and recency, activate, close,
//! and move the pointer. They never decide which window to focus; that is
//! the Launcher's job.

mod dry_run;
mod sway;
mod x11;
mod r#trait;

pub use self::dry_run::DryRunWindowSystem;
pub use self::r#trait::{create_window_system, WindowSystem};
