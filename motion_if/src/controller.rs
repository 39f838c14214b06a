//! # Controller Interface

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Serialize, Deserialize};

use crate::{Axis, DigitalInput, MotionError};

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A motion controller owning a set of axes and digital inputs on one network.
pub trait Controller: Sized {

    /// Axis type provided by this controller
    type Axis: Axis;

    /// Digital input type provided by this controller
    type Input: DigitalInput;

    /// Create the controller and bring up its motion network.
    fn create_and_connect(params: &CreationParams) -> Result<Self, MotionError>;

    /// Number of axes available on the network.
    fn axis_count(&self) -> usize;

    /// Number of digital inputs available on the network.
    fn input_count(&self) -> usize;

    /// Get an axis by index.
    fn axis(&mut self, index: usize) -> Result<&mut Self::Axis, MotionError>;

    /// Get a digital input by index.
    fn input(&mut self, index: usize) -> Result<&mut Self::Input, MotionError>;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters used to create a controller.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CreationParams {
    /// Install path of the real-time motion process, e.g. `/rsi/`
    pub rmp_path: String,

    /// Name of the network interface the motion network is attached to, e.g. `enp1s0`
    pub nic_primary: String,
}
