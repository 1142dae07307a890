//! Live recomputation of diff totals.
//!
//! - [`Pipeline`] runs config → aggregate → evaluate once
//! - [`StatusIndicator`] holds the latest report and drops stale ones
//! - [`TriggerFilter`] decides which file-system events matter
//! - [`watch`] / [`drive`] tie them together with debouncing and
//!   single-flight runs

mod pipeline;
mod status;
mod trigger;
mod watch;

pub use pipeline::Pipeline;
pub use status::{RunTicket, StatusIndicator};
pub use trigger::{Trigger, TriggerFilter};
pub use watch::{drive, spawn_fs_watcher, watch, WatchOptions};
