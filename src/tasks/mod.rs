//! Background Tasks Module
//!
//! Contains background tasks that run periodically during gateway operation.
//!
//! # Tasks
//! - TTL Cleanup: Sweeps expired search and autocomplete entries

mod cleanup;

pub use cleanup::spawn_cleanup_task;
