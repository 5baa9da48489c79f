//! Steward is a minimal lifecycle supervisor for a single long-running
//! background service. It provides a small CLI to start, stop, and check the
//! status of the managed process, plus a reset command that clears the
//! service's on-disk caches and database file. The managed process is
//! identified by its launch command, re-matched against the OS process table
//! on every operation, so a missing or stale PID record never wedges the
//! supervisor.

/// CLI interface.
pub mod cli;

/// Configuration management.
pub mod config;

/// Timing and file-name constants.
pub mod constants;

/// Error handling.
pub mod error;

/// Log tail helpers.
pub mod logs;

/// Process table scanning, spawning, and signal delivery.
pub mod process;

/// Status reporting.
pub mod status;

/// Supervisor operations: start, stop, status, reset.
pub mod supervisor;
