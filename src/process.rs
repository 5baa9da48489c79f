//! Process table scanning, detached spawning, and signal delivery.
//!
//! The managed service is identified by its launch signature: the exact
//! command string handed to the shell at start. Every operation re-scans the
//! process table for that signature instead of trusting a stored handle, so
//! the supervisor recovers cleanly from stale or missing PID records.

use std::{
    collections::HashMap,
    fs::OpenOptions,
    io,
    os::unix::process::CommandExt,
    path::Path,
    process::{Child, Command, Stdio},
    thread,
    time::{Duration, Instant},
};

use nix::{
    sys::signal::{self, Signal},
    unistd,
};
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System, UpdateKind};
use tracing::debug;

use crate::constants::{
    POLL_INTERVAL_INITIAL, POLL_INTERVAL_MAX, SHELL, SHELL_COMMAND_FLAG,
};

/// Returns the PIDs of all live processes whose command line contains the
/// launch signature, excluding the supervisor itself.
pub fn matching_pids(signature: &str) -> Vec<u32> {
    let mut system = System::new();
    // The default refresh kind skips command lines; request them explicitly.
    system.refresh_processes_specifics(
        ProcessesToUpdate::All,
        true,
        ProcessRefreshKind::nothing().with_cmd(UpdateKind::Always),
    );

    let own_pid = sysinfo::get_current_pid().ok();
    let mut pids = Vec::new();

    for (pid, process) in system.processes() {
        if Some(*pid) == own_pid {
            continue;
        }

        let cmdline = process
            .cmd()
            .iter()
            .map(|arg| arg.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ");
        if cmdline.contains(signature) {
            pids.push(pid.as_u32());
        }
    }

    pids.sort_unstable();
    pids
}

/// Samples CPU and memory usage for a PID, as percentages.
///
/// Requires two refreshes separated by sysinfo's minimum CPU update interval,
/// so this call blocks for roughly that long. Returns `None` if the process
/// disappears between samples.
pub fn sample_usage(pid: u32) -> Option<(f32, f32)> {
    let target = Pid::from_u32(pid);
    let mut system = System::new();
    system.refresh_memory();
    system.refresh_processes(ProcessesToUpdate::Some(&[target]), true);
    thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
    system.refresh_processes(ProcessesToUpdate::Some(&[target]), true);

    let process = system.process(target)?;
    let cpu = process.cpu_usage();
    let total = system.total_memory();
    let mem = if total > 0 {
        process.memory() as f32 * 100.0 / total as f32
    } else {
        0.0
    };

    Some((cpu, mem))
}

/// Launches the service detached from the controlling session, with
/// stdout/stderr redirected to the log sink.
pub fn spawn_detached(
    command: &str,
    envs: &HashMap<String, String>,
    log_path: &Path,
    append_log: bool,
    working_dir: &Path,
) -> io::Result<Child> {
    let mut options = OpenOptions::new();
    options.create(true);
    if append_log {
        options.append(true);
    } else {
        options.write(true).truncate(true);
    }
    let stdout_log = options.open(log_path)?;
    let stderr_log = stdout_log.try_clone()?;

    let mut cmd = Command::new(SHELL);
    cmd.arg(SHELL_COMMAND_FLAG)
        .arg(command)
        .current_dir(working_dir)
        .envs(envs)
        .stdin(Stdio::null())
        .stdout(Stdio::from(stdout_log))
        .stderr(Stdio::from(stderr_log));

    // Detach from the controlling session so the service outlives the
    // supervisor invocation.
    unsafe {
        cmd.pre_exec(|| {
            if libc::setsid() < 0 {
                return Err(io::Error::last_os_error());
            }
            Ok(())
        });
    }

    cmd.spawn()
}

/// Sends SIGTERM to a process. A process that already exited is not an error.
pub fn terminate(pid: u32) -> Result<(), nix::errno::Errno> {
    deliver(pid, Signal::SIGTERM)
}

/// Sends SIGKILL to a process. A process that already exited is not an error.
pub fn kill(pid: u32) -> Result<(), nix::errno::Errno> {
    deliver(pid, Signal::SIGKILL)
}

fn deliver(pid: u32, sig: Signal) -> Result<(), nix::errno::Errno> {
    match signal::kill(unistd::Pid::from_raw(pid as i32), sig) {
        Ok(()) => Ok(()),
        Err(nix::errno::Errno::ESRCH) => {
            debug!("Process {pid} exited before {sig} could be delivered");
            Ok(())
        }
        Err(err) => Err(err),
    }
}

/// Polls `condition` until it holds or `deadline` elapses, backing off
/// exponentially between polls. Returns whether the condition held.
pub fn wait_until<F>(deadline: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let end = Instant::now() + deadline;
    let mut interval = POLL_INTERVAL_INITIAL;

    loop {
        if condition() {
            return true;
        }
        if Instant::now() >= end {
            return false;
        }
        thread::sleep(interval);
        interval = (interval * 2).min(POLL_INTERVAL_MAX);
    }
}
