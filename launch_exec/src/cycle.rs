//! # Launch cycle
//!
//! One run of the rig: set the ramp, release the car, time it through the sensors, work out
//! where it lands and send the catcher there.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use log::{info, warn};
use serde::Serialize;

use motion_if::Controller;

use crate::{
    physics,
    rig::{AxisRole, LaunchRig},
    sensors::{self, SensorTiming}
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Record of a single run, archived as one CSV row.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunReport {
    pub run: u32,

    /// Units: degrees
    pub ramp_angle_deg: f64,

    /// Units: seconds since the start of the cycle
    pub t1_s: Option<f64>,

    /// Units: seconds since the start of the cycle
    pub t2_s: Option<f64>,

    /// Units: meters/second
    pub speed_ms: f64,

    /// Landing distance before clamping to the rail.
    ///
    /// Units: meters
    pub landing_raw_m: f64,

    /// Units: meters
    pub landing_m: f64,

    pub catcher_moved: bool,

    /// Number of motion commands which failed during this run
    pub move_failures: u32,

    /// Whether shutdown was requested part way through the run
    pub aborted: bool,
}

/// Statistics over all runs of a session, saved when the session ends.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    pub num_runs: u32,

    /// Runs in which both sensors saw the car
    pub num_detected: u32,

    pub num_aborted: u32,

    pub total_move_failures: u32,

    /// Mean speed over detected runs.
    ///
    /// Units: meters/second
    pub mean_speed_ms: Option<f64>,

    /// Units: meters/second
    pub max_speed_ms: Option<f64>,

    /// Units: meters
    pub max_landing_m: Option<f64>,

    #[serde(skip)]
    speed_sum_ms: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl RunReport {
    /// Whether both sensors saw the car.
    pub fn detected(&self) -> bool {
        self.t1_s.is_some() && self.t2_s.is_some()
    }
}

impl RunSummary {
    /// Add a run to the summary.
    pub fn record(&mut self, report: &RunReport) {
        self.num_runs += 1;
        self.total_move_failures += report.move_failures;

        if report.aborted {
            self.num_aborted += 1;
        }

        if !report.detected() {
            return
        }

        self.num_detected += 1;
        self.speed_sum_ms += report.speed_ms;
        self.mean_speed_ms = Some(self.speed_sum_ms / self.num_detected as f64);
        self.max_speed_ms = Some(
            self.max_speed_ms.map_or(report.speed_ms, |m| m.max(report.speed_ms))
        );
        self.max_landing_m = Some(
            self.max_landing_m.map_or(report.landing_m, |m| m.max(report.landing_m))
        );
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Run one launch cycle with the ramp at `ramp_angle_deg`.
///
/// Motion and sensor failures are logged and reflected in the report, they never end the cycle
/// early. If `stop` is raised while waiting on the sensors the catcher is not moved.
pub fn run_cycle<C: Controller>(
    rig: &mut LaunchRig<C>,
    run: u32,
    ramp_angle_deg: f64,
    stop: &AtomicBool
) -> RunReport {
    info!("--- Run {} ---", run);

    let failures_at_start = rig.move_failures();
    let epoch = Instant::now();

    let params = rig.params().clone();
    let timing = SensorTiming::from_params(&params);

    // ---- RAMP ----

    rig.move_to(AxisRole::Ramp, ramp_angle_deg);

    // ---- RELEASE ----

    if !rig.release_car() {
        warn!("Door did not close, the car may not have been released");
    }

    // ---- TIMING ----

    let times = sensors::time_sensors(
        rig.controller_mut(),
        params.sensor_inputs,
        epoch,
        &timing,
        stop
    );
    let aborted = stop.load(Ordering::Relaxed);

    // ---- PHYSICS ----

    let (t1, t2) = times.as_secs();
    let speed_ms = physics::calc_speed(params.sensor_spacing_m, t1, t2);
    let landing = physics::calc_landing(speed_ms, ramp_angle_deg, params.gravity_mss);
    let landing_m = physics::clamp_to_rail(landing.distance_m, params.rail_length_m);

    info!("Speed: {:.4} m/s | Landing: {:.4} m", speed_ms, landing_m);

    // ---- CATCH ----

    let catcher_moved = if aborted {
        warn!("Stop requested, catcher not moved");
        false
    }
    else if rig.has_catcher() {
        rig.move_to(AxisRole::Catcher, landing_m)
    }
    else {
        false
    };

    RunReport {
        run,
        ramp_angle_deg,
        t1_s: times.t1,
        t2_s: times.t2,
        speed_ms,
        landing_raw_m: landing.distance_m,
        landing_m,
        catcher_moved,
        move_failures: rig.move_failures() - failures_at_start,
        aborted
    }
}
