//! Simulated digital input

use std::time::Instant;

use crate::{DigitalInput, MotionError};

/// A simulated digital input.
///
/// The input reads as triggered from its trigger instant onwards. Tests can also force a state or
/// inject a read fault.
#[derive(Debug, Clone, Default)]
pub struct SimInput {
    index: usize,

    trigger_at: Option<Instant>,

    forced: Option<bool>,

    fault: Option<String>,

    num_reads: u64,
}

impl SimInput {
    pub(crate) fn new(index: usize) -> Self {
        Self {
            index,
            ..Default::default()
        }
    }

    /// Schedule the input to trigger at the given instant, or never if `None`.
    pub fn schedule(&mut self, trigger_at: Option<Instant>) {
        self.trigger_at = trigger_at;
    }

    pub fn trigger_at(&self) -> Option<Instant> {
        self.trigger_at
    }

    /// Override the input's state, or return to the scheduled behaviour with `None`.
    pub fn force(&mut self, state: Option<bool>) {
        self.forced = state;
    }

    /// Make every read fail until cleared with `None`.
    pub fn inject_fault(&mut self, reason: Option<&str>) {
        self.fault = reason.map(String::from);
    }

    /// Number of read attempts made on this input.
    pub fn num_reads(&self) -> u64 {
        self.num_reads
    }
}

impl DigitalInput for SimInput {
    fn index(&self) -> usize {
        self.index
    }

    fn read(&mut self) -> Result<bool, MotionError> {
        self.num_reads += 1;

        if let Some(ref reason) = self.fault {
            return Err(MotionError::InputRead { input: self.index, reason: reason.clone() })
        }

        if let Some(state) = self.forced {
            return Ok(state)
        }

        Ok(match self.trigger_at {
            Some(t) => Instant::now() >= t,
            None => false
        })
    }
}
