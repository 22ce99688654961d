use std::time::{Duration, Instant};

use log::{error, info};
use tokio_util::sync::CancellationToken;

use crate::config::TimeoutSource;
use crate::lid::{EdgeOutcome, LidLine, LidState};
use crate::scheduler::ShutdownScheduler;

/// Bounded wait per loop iteration; also bounds how quickly a termination
/// signal is observed when no edges arrive.
pub const POLL_QUANTUM: Duration = Duration::from_secs(1);

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The lid stayed closed for the armed timeout.
    Fire { timeout: Duration },
    /// The stop token cancelled the loop before any deadline fired.
    Stopped,
}

/// Drives the lid line and the scheduler until a deadline fires or the stop
/// token cancels. Blocking; run it on a blocking task. Firing is one-shot:
/// the loop terminates instead of rearming.
pub fn run<L, S>(
    line: &mut L,
    scheduler: &mut ShutdownScheduler<S>,
    stop: &CancellationToken,
) -> Outcome
where
    L: LidLine,
    S: TimeoutSource,
{
    let initial = match line.read_state() {
        Ok(state) => state,
        Err(err) => {
            error!("error reading lid state: {}", err);
            LidState::Unknown
        }
    };

    info!("lid initially {}", initial);
    scheduler.observe(initial, Instant::now());

    while !stop.is_cancelled() {
        match line.wait_edge(POLL_QUANTUM) {
            Ok(EdgeOutcome::Edge(state)) => {
                info!("lid {}", state);
                scheduler.observe(state, Instant::now());
            }
            Ok(EdgeOutcome::TimedOut) => {
                if let Some(timeout) = scheduler.due(Instant::now()) {
                    info!(
                        "lid has been closed for {} seconds, shutting down",
                        timeout.as_secs()
                    );
                    return Outcome::Fire { timeout };
                }
            }
            Err(err) => {
                error!("error waiting for lid event: {}", err);
            }
        }
    }

    Outcome::Stopped
}
