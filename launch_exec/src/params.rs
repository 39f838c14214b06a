//! # Launch Executable Parameters

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;
use motion_if::{AxisConfig, CreationParams, sim::SimHwLimits};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Longest timeout, dwell or rest the parameters may ask for.
///
/// Units: seconds
pub const MAX_TIME_S: f64 = 3600.0;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters for the launch executable.
///
/// Each hardware variant of the rig (network interface, unit scaling, catcher fitted or not) is a
/// separate parameter file.
#[derive(Debug, Clone, Deserialize)]
pub struct LaunchExecParams {

    // ---- NETWORK ----

    /// Install path of the real-time motion process
    pub rmp_path: String,

    /// Network interface the motion network is attached to
    pub nic_primary: String,

    // ---- GEOMETRY ----

    /// Distance between the two launch sensors.
    ///
    /// Units: meters
    pub sensor_spacing_m: f64,

    /// Units: meters/second^2
    #[serde(default = "default_gravity")]
    pub gravity_mss: f64,

    /// Length of the catcher's rail, landing positions are clamped to it.
    ///
    /// Units: meters
    pub rail_length_m: f64,

    // ---- SENSORS ----

    /// Digital input indices of the first and second sensor
    pub sensor_inputs: [usize; 2],

    /// Units: seconds
    #[serde(default = "default_sensor_timeout")]
    pub sensor_timeout_s: f64,

    /// Units: seconds
    #[serde(default = "default_sensor_poll_period")]
    pub sensor_poll_period_s: f64,

    // ---- SEQUENCING ----

    /// Door position which holds the car at the top of the ramp.
    ///
    /// Units: door user units
    pub door_open_pos: f64,

    /// Door position which releases the car.
    ///
    /// Units: door user units
    pub door_closed_pos: f64,

    /// Time to wait after opening the door.
    ///
    /// Units: seconds
    pub door_open_dwell_s: f64,

    /// Time to wait after closing the door.
    ///
    /// Units: seconds
    pub door_close_dwell_s: f64,

    /// Time to wait between runs.
    ///
    /// Units: seconds
    pub cycle_rest_s: f64,

    /// Smallest ramp angle the operator may enter.
    ///
    /// Units: degrees
    #[serde(default)]
    pub min_ramp_angle_deg: f64,

    /// Largest ramp angle the operator may enter.
    ///
    /// Units: degrees
    #[serde(default = "default_max_ramp_angle")]
    pub max_ramp_angle_deg: f64,

    // ---- AXES ----

    pub ramp_axis: AxisParams,

    pub door_axis: AxisParams,

    /// The catcher is optional, without it runs are timed but not caught
    #[serde(default)]
    pub catcher_axis: Option<AxisParams>,

    // ---- SIMULATION ----

    #[serde(default)]
    pub sim: SimParams,
}

/// Parameters of a single axis.
#[derive(Debug, Clone, Deserialize)]
pub struct AxisParams {
    /// Index of the axis on the controller
    pub index: usize,

    #[serde(default)]
    pub config: AxisConfig,
}

/// Parameters of the simulated rig used when no motion network is present.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimParams {
    /// Distance from the gate to the first sensor.
    ///
    /// Units: meters
    pub ramp_length_m: f64,

    /// Limit switch positions on the simulated axes
    pub hw_limits: Vec<SimHwLimits>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for SimParams {
    fn default() -> Self {
        Self {
            ramp_length_m: 0.5,
            hw_limits: Vec::new()
        }
    }
}

impl LaunchExecParams {
    /// Parameters needed to create the motion controller.
    pub fn creation_params(&self) -> CreationParams {
        CreationParams {
            rmp_path: self.rmp_path.clone(),
            nic_primary: self.nic_primary.clone()
        }
    }

    /// Check values that would make the rig misbehave rather than fail.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.sensor_spacing_m > 0.0) {
            return Err(format!("sensor_spacing_m must be positive, found {}", self.sensor_spacing_m))
        }
        if !(self.gravity_mss > 0.0) {
            return Err(format!("gravity_mss must be positive, found {}", self.gravity_mss))
        }
        if !(self.rail_length_m >= 0.0) {
            return Err(format!("rail_length_m must not be negative, found {}", self.rail_length_m))
        }
        if !(self.sensor_timeout_s > 0.0) || !(self.sensor_poll_period_s > 0.0) {
            return Err(String::from("sensor timeout and poll period must be positive"))
        }
        let times = [
            ("sensor_timeout_s", self.sensor_timeout_s),
            ("sensor_poll_period_s", self.sensor_poll_period_s),
            ("door_open_dwell_s", self.door_open_dwell_s),
            ("door_close_dwell_s", self.door_close_dwell_s),
            ("cycle_rest_s", self.cycle_rest_s),
        ];
        for (name, t) in times.iter() {
            if !(*t >= 0.0 && *t <= MAX_TIME_S) {
                return Err(format!("{} must be in [0, {}] s, found {}", name, MAX_TIME_S, t))
            }
        }
        if self.sensor_inputs[0] == self.sensor_inputs[1] {
            return Err(String::from("the two sensors must use different inputs"))
        }
        if !(self.min_ramp_angle_deg <= self.max_ramp_angle_deg) {
            return Err(format!(
                "ramp angle range [{}, {}] is empty",
                self.min_ramp_angle_deg, self.max_ramp_angle_deg
            ))
        }

        let mut indices = vec![self.ramp_axis.index, self.door_axis.index];
        if let Some(ref c) = self.catcher_axis {
            indices.push(c.index);
        }
        let num_indices = indices.len();
        indices.sort_unstable();
        indices.dedup();
        if indices.len() != num_indices {
            return Err(String::from("each axis must have a different index"))
        }

        Ok(())
    }
}

fn default_gravity() -> f64 {
    9.81
}

fn default_sensor_timeout() -> f64 {
    5.0
}

fn default_sensor_poll_period() -> f64 {
    0.001
}

fn default_max_ramp_angle() -> f64 {
    90.0
}
