//! Background Tasks Module
//!
//! Contains background tasks that run while an engine is started.
//!
//! # Tasks
//! - TTL Cleanup: Removes expired memory engine entries at configured intervals

mod cleanup;

pub(crate) use cleanup::spawn_cleanup_task;
