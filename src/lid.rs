use std::time::Duration;

use rppal::gpio::{Gpio, InputPin, Level, Trigger};
use thiserror::Error;

/// BCM line the lid switch is wired to.
const GPIO_LID_SWITCH: u8 = 27;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LidState {
    Unknown,
    Open,
    Closed,
}

impl std::fmt::Display for LidState {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            LidState::Open => write!(f, "opened"),
            LidState::Closed => write!(f, "closed"),
            LidState::Unknown => write!(f, "unknown"),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EdgeOutcome {
    Edge(LidState),
    TimedOut,
}

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum LineError {
    #[error("GPIO access failed: {0}")]
    Gpio(#[from] rppal::gpio::Error),
}

/// Capability the monitor loop depends on instead of a concrete hardware
/// binding. `read_state` seeds the loop once at startup; `wait_edge` blocks
/// until a decoded edge or the polling quantum elapses, whichever is first.
pub trait LidLine {
    fn read_state(&mut self) -> Result<LidState, LineError>;
    fn wait_edge(&mut self, timeout: Duration) -> Result<EdgeOutcome, LineError>;
}

pub struct GpioLidLine {
    pin: InputPin,
}

impl GpioLidLine {
    /// Requests the lid switch line with pull-up bias and both-edge
    /// detection. Failure here is fatal for the service.
    pub fn open() -> Result<GpioLidLine, LineError> {
        let gpio = Gpio::new()?;
        let mut pin = gpio.get(GPIO_LID_SWITCH)?.into_input_pullup();
        pin.set_interrupt(Trigger::Both)?;

        Ok(GpioLidLine { pin })
    }
}

// Pull-up bias: the switch shorts the line to ground when the lid closes.
fn level_to_state(level: Level) -> LidState {
    match level {
        Level::High => LidState::Open,
        Level::Low => LidState::Closed,
    }
}

impl LidLine for GpioLidLine {
    fn read_state(&mut self) -> Result<LidState, LineError> {
        Ok(level_to_state(self.pin.read()))
    }

    fn wait_edge(&mut self, timeout: Duration) -> Result<EdgeOutcome, LineError> {
        match self.pin.poll_interrupt(true, Some(timeout))? {
            Some(level) => Ok(EdgeOutcome::Edge(level_to_state(level))),
            None => Ok(EdgeOutcome::TimedOut),
        }
    }
}
