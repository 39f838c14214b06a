//! # Digital IO Interface

use crate::MotionError;

/// A boolean input read from the motion network, such as a beam-break sensor.
pub trait DigitalInput {

    /// Index of this input on its controller.
    fn index(&self) -> usize;

    /// Read the current state of the input. `true` means triggered.
    fn read(&mut self) -> Result<bool, MotionError>;
}
