// src/monitor/mod.rs

//! Process supervision layer.
//!
//! This module starts the publisher process with `tokio::process::Command`,
//! mirrors its output to local sinks, and extracts the published URL.
//!
//! - [`spawn`] builds and spawns the child and wraps it in a [`ProcessHandle`].
//! - [`sink`] defines the [`LineSink`] seam plus the console implementation.
//! - [`slot`] is the write-once result slot shared between the stdout task
//!   and the waiting caller.
//! - [`stream_copy`] contains the per-stream read/forward/match loop.
//! - [`process_monitor`] ties it together in [`ProcessMonitor`].

pub mod process_monitor;
pub mod sink;
pub mod slot;
pub mod spawn;
pub mod stream_copy;

pub use process_monitor::ProcessMonitor;
pub use sink::{ConsoleSink, LineSink};
pub use slot::{result_slot, ResultSlot, ResultWaiter};
pub use spawn::{start, ProcessHandle};
pub use stream_copy::{spawn_stream_copy, Extractor};

/// Lifecycle of a [`ProcessMonitor`].
///
/// `Idle -> Spawned -> Streaming -> Matched -> Finished`, with `Failed` as the
/// terminal state for spawn errors, timeouts, cancellation and exits without
/// a match. There is no way back to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Idle,
    Spawned,
    Streaming,
    Matched,
    Finished,
    Failed,
}
