//! # Motion control interface crate.
//!
//! Defines the interface the launch rig uses to talk to a motion controller: the controller
//! itself, its axes and its digital inputs. Hardware backends implement the traits in this crate,
//! and the `sim` backend provides a simulated controller for bench work and testing.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Axis configuration, motion profiles and the [`Axis`] trait
pub mod axis;

/// The [`Controller`] trait and network creation parameters
pub mod controller;

/// The [`DigitalInput`] trait
pub mod io;

/// Simulated motion controller
#[cfg(feature = "sim")]
pub mod sim;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use axis::{Axis, AxisConfig, LimitAction, MotionProfile};
pub use controller::{Controller, CreationParams};
pub use io::DigitalInput;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors reported by a motion controller.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum MotionError {
    #[error("Could not start the motion network on {nic:?}: {reason}")]
    NetworkStart {
        nic: String,
        reason: String
    },

    #[error("Axis {0} does not exist on this controller")]
    NoSuchAxis(usize),

    #[error("Digital input {0} does not exist on this controller")]
    NoSuchInput(usize),

    #[error("The amplifier on axis {0} is disabled")]
    AmpDisabled(usize),

    #[error("Drive fault on axis {axis}: {reason}")]
    DriveFault {
        axis: usize,
        reason: String
    },

    #[error("Hardware limit tripped on axis {axis}: target {target} is outside [{min}, {max}]")]
    LimitTripped {
        axis: usize,
        target: f64,
        min: f64,
        max: f64
    },

    #[error("Invalid motion profile: {0}")]
    InvalidProfile(String),

    #[error("Invalid axis configuration: {0}")]
    InvalidConfig(String),

    #[error("Could not read digital input {input}: {reason}")]
    InputRead {
        input: usize,
        reason: String
    },
}
