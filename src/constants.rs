//! Constants and timing values for the steward supervisor.

use std::time::Duration;

/// Default configuration file name, resolved relative to the working
/// directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "steward.yaml";

/// Default PID record file name, resolved relative to the project root.
pub const DEFAULT_PID_FILE: &str = "steward.pid";

/// Lock file suffix appended to the PID record path. The lock serializes
/// concurrent `start` invocations around the check-and-launch sequence.
pub const LOCK_SUFFIX: &str = ".lock";

/// Default service log sink, resolved relative to the project root.
pub const DEFAULT_LOG_FILE: &str = "service.log";

/// Default database artifact removed by `reset`.
pub const DEFAULT_DATABASE_FILE: &str = "bot.db";

/// Default cache directory name pruned recursively by `reset`.
pub const DEFAULT_CACHE_DIR: &str = "__pycache__";

/// Shell used for launching the service command.
pub const SHELL: &str = "sh";

/// Shell argument flag for executing command strings.
pub const SHELL_COMMAND_FLAG: &str = "-c";

/// Maximum time to wait for a freshly launched service to survive startup
/// before declaring it alive.
pub const START_DEADLINE: Duration = Duration::from_secs(3);

/// Maximum time to wait for matching processes to exit after SIGTERM.
pub const STOP_TERM_DEADLINE: Duration = Duration::from_secs(5);

/// Maximum time to wait for survivors to exit after the SIGKILL escalation.
pub const STOP_KILL_DEADLINE: Duration = Duration::from_secs(2);

/// Initial interval between process-state polls. Doubles up to
/// [`POLL_INTERVAL_MAX`] while a deadline is pending.
pub const POLL_INTERVAL_INITIAL: Duration = Duration::from_millis(50);

/// Upper bound for the backoff between process-state polls.
pub const POLL_INTERVAL_MAX: Duration = Duration::from_millis(500);

/// Number of log lines included in a status report.
pub const STATUS_LOG_LINES: usize = 10;
