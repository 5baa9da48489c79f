//! Error handling for steward.
use std::path::PathBuf;

use thiserror::Error;

/// Defines all possible errors that can occur in the supervisor.
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// Error reading or accessing the configuration file.
    #[error("Failed to read config file: {0}")]
    ConfigRead(#[from] std::io::Error),

    /// Error parsing YAML configuration.
    #[error("Invalid YAML format: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    /// Start precondition violated: a live process already matches the
    /// launch signature.
    #[error("Service is already running (pid {pid})")]
    AlreadyRunning {
        /// PID of the live matching process.
        pid: u32,
    },

    /// Another invocation holds the start lock.
    #[error("Another steward invocation holds the start lock at {}", path.display())]
    LockHeld {
        /// Path of the contended lock file.
        path: PathBuf,
    },

    /// Error spawning the service process.
    #[error("Failed to launch '{command}': {source}")]
    Spawn {
        /// The launch command that failed.
        command: String,
        /// The underlying error that occurred.
        #[source]
        source: std::io::Error,
    },

    /// The service exited before the startup deadline elapsed.
    #[error("Service exited during startup ({status}); inspect {}", log.display())]
    StartFailed {
        /// Exit status reported by the child.
        status: String,
        /// Log sink to inspect for the failure cause.
        log: PathBuf,
    },

    /// Matching processes survived the forceful termination signal.
    #[error("Service did not stop after SIGKILL (pids {pids:?})")]
    StopFailed {
        /// PIDs still matching the launch signature.
        pids: Vec<u32>,
    },

    /// Cache/database deletion or log access was blocked.
    #[error("Filesystem operation failed at {}: {source}", path.display())]
    Filesystem {
        /// The artifact that could not be removed.
        path: PathBuf,
        /// The underlying error that occurred.
        #[source]
        source: std::io::Error,
    },

    /// Error for the PID record file.
    #[error("PID record error: {0}")]
    PidRecord(#[from] PidRecordError),

    /// Error delivering a signal.
    #[error("Failed to signal process: {0}")]
    Errno(#[from] nix::errno::Errno),
}

/// Error type for PID record operations.
#[derive(Debug, Error)]
pub enum PidRecordError {
    /// Error reading the PID record file.
    #[error("Failed to read PID record: {0}")]
    Read(#[from] std::io::Error),

    /// Error parsing the PID record contents.
    #[error("Failed to parse PID record: {0}")]
    Parse(#[from] std::num::ParseIntError),
}
