//! # Launch rig library.
//!
//! Everything the launch executable does apart from its main loop, exposed as a library so it can
//! be exercised against the simulated controller.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Launch cycle - one ramp/release/time/catch sequence and its report
pub mod cycle;

/// Parameters for the launch executable
pub mod params;

/// Projectile physics - speed from sensor timing and landing distance
pub mod physics;

/// Operator prompt for the ramp angle
pub mod prompt;

/// Rig - axis initialisation and sequencing on top of a motion controller
pub mod rig;

/// Sensor timing - polling the launch sensors for trigger times
pub mod sensors;
