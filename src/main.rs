use clap::Parser;
use log::{error, info};
use simple_signal::{self, Signal};
use thiserror::Error;
use tokio::process::Command;
use tokio::task;
use tokio_util::sync::CancellationToken;

mod config;
mod lid;
mod logging;
mod monitor;
mod scheduler;

use config::ConfFile;
use lid::GpioLidLine;
use monitor::Outcome;
use scheduler::ShutdownScheduler;

/// Argon ONE UP lid monitor: shuts the system down after the lid has been
/// closed for the number of seconds configured in /etc/argononeupd.conf.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Command to execute when the lid has been closed for the configured
    /// number of seconds
    #[arg(
        long = "shutdownCommand",
        short = 's',
        default_value = "shutdown -h now"
    )]
    shutdown_command: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    logging::init(&program_name())?;

    let cancellation_token = setup_signals();

    info!("starting - shutdown command is \"{}\"", args.shutdown_command);

    let line = match GpioLidLine::open() {
        Ok(line) => line,
        Err(err) => {
            error!("cannot set up lid switch line: {}", err);
            std::process::exit(1);
        }
    };

    let outcome = task::spawn_blocking({
        let stop = cancellation_token.clone();
        move || {
            let mut line = line;
            let mut scheduler = ShutdownScheduler::new(ConfFile::new());
            monitor::run(&mut line, &mut scheduler, &stop)
        }
    })
    .await?;

    if let Outcome::Fire { .. } = outcome {
        cancellation_token.cancel();

        if let Err(err) = run_shell_command(&args.shutdown_command).await {
            error!("error running shutdown command: {}", err);
        }
    }

    info!("exiting");

    Ok(())
}

fn program_name() -> String {
    std::env::current_exe()
        .ok()
        .and_then(|path| {
            path.file_name()
                .map(|name| name.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string())
}

fn setup_signals() -> CancellationToken {
    let cancellation_token = CancellationToken::new();

    // Sigint: Ctrl+C  Sigterm: service stop
    simple_signal::set_handler(&[Signal::Int, Signal::Term], {
        let cancellation_token_clone = cancellation_token.clone();
        move |_| {
            cancellation_token_clone.cancel();
        }
    });

    cancellation_token
}

async fn run_shell_command(command: &str) -> Result<(), CommandError> {
    let mut parts = command.split_whitespace();

    let program = parts.next().ok_or(CommandError::NoCommand)?;
    let arguments = parts.collect::<Vec<_>>();

    let mut process = Command::new(program).args(arguments).spawn()?;
    let exit_status = process.wait().await?;

    // Firing is complete once the command has run; a nonzero status is only
    // worth a log line.
    if !exit_status.success() {
        error!("shutdown command exited with {}", exit_status);
    }

    Ok(())
}

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Command is empty or whitespace.")]
    NoCommand,

    #[error("Command could not be run: {0}")]
    Spawn(#[from] std::io::Error),
}
