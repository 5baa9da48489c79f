//! Status reporting for the managed service.
use std::fmt;

use serde::Serialize;

/// Structured result of the `status` operation. Read-only: building a report
/// never mutates supervisor state.
#[derive(Debug, Serialize)]
pub struct StatusReport {
    /// Whether a live process matches the launch signature.
    pub running: bool,
    /// PID of the matching process, when running.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    /// CPU usage percentage, when running.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_percent: Option<f32>,
    /// Memory usage percentage, when running.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mem_percent: Option<f32>,
    /// Last lines of the service log; empty when the log sink is absent.
    pub recent_log: Vec<String>,
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.running {
            match self.pid {
                Some(pid) => writeln!(f, "● running (pid {pid})")?,
                None => writeln!(f, "● running")?,
            }
            if let (Some(cpu), Some(mem)) = (self.cpu_percent, self.mem_percent) {
                writeln!(f, "  cpu: {cpu:.1}%  mem: {mem:.1}%")?;
            }
        } else {
            writeln!(f, "○ stopped")?;
        }

        if self.recent_log.is_empty() {
            write!(f, "  log: (empty)")?;
        } else {
            write!(f, "  recent log:")?;
            for line in &self.recent_log {
                write!(f, "\n    {line}")?;
            }
        }

        Ok(())
    }
}
