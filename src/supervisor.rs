//! Supervisor operations: start, stop, status, reset.
use std::{
    fs::{self, OpenOptions},
    io,
    path::{Path, PathBuf},
    thread,
    time::Instant,
};

use fs2::FileExt;
use tracing::{debug, error, info, warn};

use crate::{
    config::{Config, resolve_env},
    constants::{
        POLL_INTERVAL_INITIAL, POLL_INTERVAL_MAX, START_DEADLINE, STOP_KILL_DEADLINE,
        STOP_TERM_DEADLINE,
    },
    error::{PidRecordError, SupervisorError},
    logs,
    process,
    status::StatusReport,
};

/// Persisted last-known PID of the managed service: a plain-text file holding
/// one integer. Advisory only; the process-table scan is authoritative when
/// the two disagree, and staleness in either direction is tolerated.
#[derive(Debug, Clone)]
pub struct PidRecord {
    path: PathBuf,
}

impl PidRecord {
    /// Creates a record handle for the given path.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Reads the recorded PID. A missing file yields `None`.
    pub fn read(&self) -> Result<Option<u32>, PidRecordError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&self.path)?;
        let pid = contents.trim().parse::<u32>()?;
        Ok(Some(pid))
    }

    /// Writes the PID, creating parent directories as needed.
    pub fn write(&self, pid: u32) -> Result<(), PidRecordError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, format!("{pid}\n"))?;
        Ok(())
    }

    /// Deletes the record. Absence is not an error.
    pub fn remove(&self) -> Result<(), PidRecordError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// Outcome of a successful `stop`.
#[derive(Debug, PartialEq, Eq)]
pub enum StopOutcome {
    /// All matching processes were terminated.
    Stopped {
        /// PIDs that were signalled.
        terminated: Vec<u32>,
    },
    /// No matching process existed; stopping was a no-op.
    NotRunning,
}

/// Summary of a `reset`: the stop outcome plus every artifact removed.
#[derive(Debug)]
pub struct ResetSummary {
    /// Result of the best-effort stop.
    pub stop: StopOutcome,
    /// Paths deleted from disk.
    pub removed: Vec<PathBuf>,
}

/// Manages the lifecycle of exactly one named external service, identified by
/// re-scanning the OS process table for its launch signature on every
/// operation.
pub struct Supervisor {
    config: Config,
}

impl Supervisor {
    /// Creates a supervisor for the given configuration.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// The launch signature used to spawn and re-identify the service.
    pub fn signature(&self) -> &str {
        &self.config.service.command
    }

    /// Path of the service log sink.
    pub fn log_path(&self) -> PathBuf {
        self.config.log_path()
    }

    fn pid_record(&self) -> PidRecord {
        PidRecord::new(self.config.pid_path())
    }

    /// Launches the service if no live process matches the launch signature.
    ///
    /// The check-and-launch sequence runs under an exclusive advisory file
    /// lock so concurrent invocations cannot race past the precondition and
    /// launch twice. Returns the PID of the new process once it has survived
    /// the startup deadline.
    pub fn start(&self) -> Result<u32, SupervisorError> {
        let lock_path = self.config.lock_path();
        if let Some(parent) = lock_path.parent() {
            fs::create_dir_all(parent).map_err(|source| SupervisorError::Filesystem {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let lock_file = OpenOptions::new()
            .create(true)
            .write(true)
            .open(&lock_path)
            .map_err(|source| SupervisorError::Filesystem {
                path: lock_path.clone(),
                source,
            })?;
        lock_file
            .try_lock_exclusive()
            .map_err(|_| SupervisorError::LockHeld {
                path: lock_path.clone(),
            })?;

        let signature = self.signature();
        if let Some(pid) = process::matching_pids(signature).first() {
            return Err(SupervisorError::AlreadyRunning { pid: *pid });
        }

        let root = self.config.project_root();
        let envs = resolve_env(&self.config.service.env, &root);
        let log_path = self.config.log_path();
        if let Some(parent) = log_path.parent() {
            fs::create_dir_all(parent).map_err(|source| SupervisorError::Filesystem {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        info!("Starting service: {signature}");
        let mut child = process::spawn_detached(
            signature,
            &envs,
            &log_path,
            self.config.append_log(),
            &root,
        )
        .map_err(|source| SupervisorError::Spawn {
            command: signature.to_string(),
            source,
        })?;

        let pid = child.id();
        self.pid_record().write(pid)?;

        // Watch the held child handle on a bounded deadline; an exit inside
        // the window means the service failed startup.
        let deadline = Instant::now() + START_DEADLINE;
        let mut interval = POLL_INTERVAL_INITIAL;
        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    let _ = self.pid_record().remove();
                    return Err(SupervisorError::StartFailed {
                        status: status.to_string(),
                        log: log_path,
                    });
                }
                Ok(None) => {}
                Err(err) => {
                    error!("Failed to poll service startup: {err}");
                    break;
                }
            }
            if Instant::now() >= deadline {
                break;
            }
            thread::sleep(interval);
            interval = (interval * 2).min(POLL_INTERVAL_MAX);
        }

        // The handle is authoritative here; the scan only cross-checks that
        // later invocations will be able to re-discover the service.
        if !process::matching_pids(signature).contains(&pid) {
            warn!(
                "Service pid {pid} is alive but no longer matches its launch signature"
            );
        }

        info!("Service started (pid {pid}); output redirected to {log_path:?}");
        Ok(pid)
    }

    /// Terminates every live process matching the launch signature.
    ///
    /// Escalates from SIGTERM to SIGKILL once if matches survive the first
    /// deadline. Stopping an already-stopped service is a no-op success.
    pub fn stop(&self) -> Result<StopOutcome, SupervisorError> {
        let signature = self.signature();
        let matches = process::matching_pids(signature);
        self.pid_record().remove()?;

        if matches.is_empty() {
            debug!("No process matches '{signature}'; nothing to stop");
            return Ok(StopOutcome::NotRunning);
        }

        info!("Stopping {} process(es): {matches:?}", matches.len());
        for pid in &matches {
            process::terminate(*pid)?;
        }

        let cleared = process::wait_until(STOP_TERM_DEADLINE, || {
            process::matching_pids(signature).is_empty()
        });

        if !cleared {
            let survivors = process::matching_pids(signature);
            warn!("Service did not exit after SIGTERM; sending SIGKILL to {survivors:?}");
            for pid in &survivors {
                process::kill(*pid)?;
            }

            let cleared = process::wait_until(STOP_KILL_DEADLINE, || {
                process::matching_pids(signature).is_empty()
            });
            if !cleared {
                return Err(SupervisorError::StopFailed {
                    pids: process::matching_pids(signature),
                });
            }
        }

        Ok(StopOutcome::Stopped {
            terminated: matches,
        })
    }

    /// Reports the service state: liveness, PID, resource usage, and a log
    /// tail. Never mutates state.
    pub fn status(&self, lines: usize) -> Result<StatusReport, SupervisorError> {
        let matches = process::matching_pids(self.signature());

        let recorded = match self.pid_record().read() {
            Ok(pid) => pid,
            Err(err) => {
                warn!("Ignoring unreadable PID record: {err}");
                None
            }
        };

        // The scan is authoritative; the record only picks the reported PID
        // when several processes match.
        let pid = match recorded {
            Some(recorded) if matches.contains(&recorded) => Some(recorded),
            _ => matches.first().copied(),
        };

        let (cpu_percent, mem_percent) = match pid.and_then(process::sample_usage) {
            Some((cpu, mem)) => (Some(cpu), Some(mem)),
            None => (None, None),
        };

        let log_path = self.config.log_path();
        let recent_log = logs::tail_log(&log_path, lines).map_err(|source| {
            SupervisorError::Filesystem {
                path: log_path,
                source,
            }
        })?;

        Ok(StatusReport {
            running: pid.is_some(),
            pid,
            cpu_percent,
            mem_percent,
            recent_log,
        })
    }

    /// Stops the service (best-effort) and deletes the database file plus all
    /// configured cache directories. Missing artifacts are no-ops.
    pub fn reset(&self) -> Result<ResetSummary, SupervisorError> {
        let stop = self.stop()?;
        let mut removed = Vec::new();

        let database = self.config.database_path();
        match fs::remove_file(&database) {
            Ok(()) => {
                info!("Removed database file {database:?}");
                removed.push(database);
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!("Database file {database:?} absent; nothing to remove");
            }
            Err(source) => {
                return Err(SupervisorError::Filesystem {
                    path: database,
                    source,
                });
            }
        }

        let root = self.config.project_root();
        for name in self.config.cache_dir_names() {
            prune_cache_dirs(&root, &name, &mut removed)?;
        }

        Ok(ResetSummary { stop, removed })
    }
}

/// Recursively removes every directory named `name` under `dir`, collecting
/// the removed paths.
fn prune_cache_dirs(
    dir: &Path,
    name: &str,
    removed: &mut Vec<PathBuf>,
) -> Result<(), SupervisorError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(source) => {
            return Err(SupervisorError::Filesystem {
                path: dir.to_path_buf(),
                source,
            });
        }
    };

    for entry in entries {
        let entry = entry.map_err(|source| SupervisorError::Filesystem {
            path: dir.to_path_buf(),
            source,
        })?;
        let file_type = entry.file_type().map_err(|source| SupervisorError::Filesystem {
            path: entry.path(),
            source,
        })?;
        if !file_type.is_dir() {
            continue;
        }

        let path = entry.path();
        if entry.file_name() == *name {
            fs::remove_dir_all(&path).map_err(|source| SupervisorError::Filesystem {
                path: path.clone(),
                source,
            })?;
            removed.push(path);
        } else {
            prune_cache_dirs(&path, name, removed)?;
        }
    }

    Ok(())
}
