use tracing::error;
use tracing_subscriber::EnvFilter;

use steward::{
    cli::{Cli, Commands, parse_args},
    config::load_config,
    error::SupervisorError,
    supervisor::{StopOutcome, Supervisor},
};

fn main() {
    let args = parse_args();
    init_logging(&args);

    if let Err(err) = run(args.command) {
        error!("{err}");
        std::process::exit(1);
    }
}

fn run(command: Commands) -> Result<(), SupervisorError> {
    match command {
        Commands::Start { config } => {
            let supervisor = build_supervisor(&config)?;
            let pid = supervisor.start()?;
            println!(
                "Started '{}' (pid {pid}); logging to {}",
                supervisor.signature(),
                supervisor.log_path().display()
            );
        }
        Commands::Stop { config } => {
            let supervisor = build_supervisor(&config)?;
            match supervisor.stop()? {
                StopOutcome::Stopped { terminated } => {
                    println!("Stopped {} process(es): {terminated:?}", terminated.len());
                }
                StopOutcome::NotRunning => {
                    println!("Service is not running; nothing to stop");
                }
            }
        }
        Commands::Status {
            config,
            json,
            lines,
        } => {
            let supervisor = build_supervisor(&config)?;
            let report = supervisor.status(lines)?;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&report)
                        .expect("status report is serializable")
                );
            } else {
                println!("{report}");
            }
        }
        Commands::Reset { config } => {
            let supervisor = build_supervisor(&config)?;
            let summary = supervisor.reset()?;
            match summary.stop {
                StopOutcome::Stopped { terminated } => {
                    println!("Stopped {} process(es)", terminated.len());
                }
                StopOutcome::NotRunning => println!("Service was not running"),
            }
            if summary.removed.is_empty() {
                println!("No artifacts to remove");
            } else {
                for path in &summary.removed {
                    println!("Removed {}", path.display());
                }
            }
        }
    }

    Ok(())
}

fn build_supervisor(config_path: &str) -> Result<Supervisor, SupervisorError> {
    let config = load_config(Some(config_path))?;
    Ok(Supervisor::new(config))
}

fn init_logging(args: &Cli) {
    let filter = if let Some(level) = args.log_level {
        EnvFilter::new(level.as_str())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    // Diagnostics go to stderr so `status --json` stdout stays parseable.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
