//! # Simulated Motion Controller
//!
//! Provides a [`Controller`] implementation which needs no motion network hardware. Axes follow
//! their commanded S-curve moves in real time, and the two launch sensors are driven by a simple
//! model of the rig: closing the gate releases a car which slides down the ramp and passes the
//! sensors at the times a frictionless slope would give.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod axis;
mod input;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::time::{Duration, Instant};
use log::{debug, info, warn};
use serde::{Serialize, Deserialize};

use crate::{Axis, Controller, CreationParams, MotionError};

pub use axis::{SimAxis, SimMove};
pub use input::SimInput;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A simulated motion controller.
#[derive(Debug)]
pub struct SimController {
    params: CreationParams,

    world: SimWorld,

    axes: Vec<SimAxis>,

    inputs: Vec<SimInput>,

    /// Gate move count already turned into a car run.
    last_gate_move: u64,
}

/// Physical layout of the simulated rig.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SimWorld {
    pub num_axes: usize,

    pub num_inputs: usize,

    /// Axis carrying the ramp, with positions in degrees
    pub ramp_axis: usize,

    /// Axis carrying the gate door
    pub gate_axis: usize,

    /// First and second sensor along the car's path
    pub sensor_inputs: [usize; 2],

    /// Distance the car slides from the gate to the first sensor.
    ///
    /// Units: meters
    pub ramp_length_m: f64,

    /// Units: meters
    pub sensor_spacing_m: f64,

    /// Units: meters/second^2
    pub gravity_mss: f64,

    /// Hardware limit switches fitted to the axes
    pub hw_limits: Vec<SimHwLimits>,
}

/// Positions of the limit switches on one simulated axis.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct SimHwLimits {
    pub axis: usize,

    /// Units: user units
    pub min: f64,

    /// Units: user units
    pub max: f64,
}

/// Timing of one simulated car run, relative to its release.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CarRun {
    pub sensor_1: Duration,
    pub sensor_2: Duration,
    pub exit_speed_ms: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for SimWorld {
    fn default() -> Self {
        Self {
            num_axes: 3,
            num_inputs: 2,
            ramp_axis: 0,
            gate_axis: 1,
            sensor_inputs: [0, 1],
            ramp_length_m: 0.5,
            sensor_spacing_m: 0.1,
            gravity_mss: 9.81,
            hw_limits: Vec::new()
        }
    }
}

impl SimWorld {
    /// Compute the run of a car released from rest on a ramp at `ramp_angle_deg`.
    ///
    /// Returns `None` if the ramp is not inclined, in which case the car never moves.
    pub fn car_run(&self, ramp_angle_deg: f64) -> Option<CarRun> {
        let slope_acc = self.gravity_mss * ramp_angle_deg.to_radians().sin();

        if !(slope_acc > 0.0) || !(self.ramp_length_m > 0.0) {
            return None
        }

        let t_ramp = (2.0 * self.ramp_length_m / slope_acc).sqrt();
        let exit_speed_ms = (2.0 * slope_acc * self.ramp_length_m).sqrt();
        let t_gap = self.sensor_spacing_m.max(0.0) / exit_speed_ms;

        Some(CarRun {
            sensor_1: Duration::from_secs_f64(t_ramp),
            sensor_2: Duration::from_secs_f64(t_ramp + t_gap),
            exit_speed_ms
        })
    }
}

impl SimController {
    /// Replace the simulated world, rebuilding the axes and inputs.
    ///
    /// Limit switches on axes the world doesn't have are ignored with a warning.
    pub fn with_world(mut self, world: SimWorld) -> Self {
        self.axes = (0..world.num_axes).map(SimAxis::new).collect();
        self.inputs = (0..world.num_inputs).map(SimInput::new).collect();

        for l in world.hw_limits.iter() {
            match self.axes.get_mut(l.axis) {
                Some(a) => a.set_hw_limits(l.min, l.max),
                None => warn!("Sim: limit switches given for missing axis {}", l.axis)
            }
        }

        self.world = world;
        self.last_gate_move = 0;
        self
    }

    pub fn creation_params(&self) -> &CreationParams {
        &self.params
    }

    /// Turn any new gate close into a scheduled car run.
    ///
    /// A gate opening resets both sensors, a gate closing releases the car at the start of the
    /// closing move.
    fn sync_world(&mut self) {
        let gate = match self.axes.get(self.world.gate_axis) {
            Some(g) => g,
            None => return
        };

        if gate.move_count() == self.last_gate_move {
            return
        }

        let gate_move = match gate.last_move() {
            Some(m) => *m,
            None => return
        };
        self.last_gate_move = gate.move_count();

        let run = if gate_move.is_negative() {
            let ramp_angle_deg = self.axes
                .get(self.world.ramp_axis)
                .map(|a| a.command_position())
                .unwrap_or(0.0);
            let run = self.world.car_run(ramp_angle_deg);
            info!(
                "Sim: car released with ramp at {:.2} deg, expected run {:?}",
                ramp_angle_deg, run
            );
            run
        }
        else {
            debug!("Sim: gate opening, sensors reset");
            None
        };

        let [s1, s2] = self.world.sensor_inputs;
        let release = gate_move.start;
        if let Some(input) = self.inputs.get_mut(s1) {
            input.schedule(run.map(|r| release + r.sensor_1));
        }
        if let Some(input) = self.inputs.get_mut(s2) {
            input.schedule(run.map(|r| release + r.sensor_2));
        }
    }
}

impl Controller for SimController {
    type Axis = SimAxis;
    type Input = SimInput;

    fn create_and_connect(params: &CreationParams) -> Result<Self, MotionError> {
        if params.nic_primary.trim().is_empty() {
            return Err(MotionError::NetworkStart {
                nic: params.nic_primary.clone(),
                reason: String::from("no network interface given")
            })
        }
        if params.rmp_path.trim().is_empty() {
            return Err(MotionError::NetworkStart {
                nic: params.nic_primary.clone(),
                reason: String::from("no RMP path given")
            })
        }

        info!(
            "Sim: motion network started on {} (RMP path {:?})",
            params.nic_primary, params.rmp_path
        );

        let ctrl = Self {
            params: params.clone(),
            world: SimWorld::default(),
            axes: Vec::new(),
            inputs: Vec::new(),
            last_gate_move: 0
        };

        Ok(ctrl.with_world(SimWorld::default()))
    }

    fn axis_count(&self) -> usize {
        self.axes.len()
    }

    fn input_count(&self) -> usize {
        self.inputs.len()
    }

    fn axis(&mut self, index: usize) -> Result<&mut SimAxis, MotionError> {
        self.axes.get_mut(index).ok_or(MotionError::NoSuchAxis(index))
    }

    fn input(&mut self, index: usize) -> Result<&mut SimInput, MotionError> {
        self.sync_world();
        self.inputs.get_mut(index).ok_or(MotionError::NoSuchInput(index))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{AxisConfig, DigitalInput, LimitAction, MotionProfile};

    fn creation_params() -> CreationParams {
        CreationParams {
            rmp_path: String::from("/rsi/"),
            nic_primary: String::from("enp1s0")
        }
    }

    fn fast() -> MotionProfile {
        MotionProfile {
            velocity: 1e4,
            acceleration: 1e7,
            deceleration: 1e7,
            jerk_pct: 0.0
        }
    }

    fn ready_controller() -> SimController {
        let mut ctrl = SimController::create_and_connect(&creation_params()).unwrap();
        for i in 0..ctrl.axis_count() {
            ctrl.axis(i).unwrap().amp_enable_set(true).unwrap();
        }
        ctrl
    }

    #[test]
    fn test_network_start() {
        let ctrl = SimController::create_and_connect(&creation_params()).unwrap();
        assert_eq!(ctrl.axis_count(), 3);
        assert_eq!(ctrl.input_count(), 2);

        let no_nic = CreationParams { nic_primary: String::new(), ..creation_params() };
        assert!(matches!(
            SimController::create_and_connect(&no_nic),
            Err(MotionError::NetworkStart { .. })
        ));
    }

    #[test]
    fn test_indices_checked() {
        let mut ctrl = ready_controller();
        assert!(matches!(ctrl.axis(3), Err(MotionError::NoSuchAxis(3))));
        assert!(matches!(ctrl.input(7), Err(MotionError::NoSuchInput(7))));
    }

    #[test]
    fn test_car_run_physics() {
        let world = SimWorld::default();

        // sin(30 deg) = 0.5, so the slope acceleration is g/2
        let run = world.car_run(30.0).unwrap();
        let expected_exit = (9.81f64 * 0.5).sqrt();
        assert!((run.exit_speed_ms - expected_exit).abs() < 1e-9);

        let gap = (run.sensor_2 - run.sensor_1).as_secs_f64();
        assert!((gap - 0.1 / expected_exit).abs() < 1e-6);

        assert!(world.car_run(0.0).is_none());
        assert!(world.car_run(-10.0).is_none());
    }

    #[test]
    fn test_gate_close_schedules_sensors() {
        let mut ctrl = ready_controller();

        ctrl.axis(0).unwrap().move_s_curve(30.0, Some(&fast())).unwrap();
        std::thread::sleep(Duration::from_millis(20));

        ctrl.axis(1).unwrap().move_s_curve(1.0, Some(&fast())).unwrap();
        assert!(ctrl.input(0).unwrap().trigger_at().is_none());

        ctrl.axis(1).unwrap().move_s_curve(0.0, Some(&fast())).unwrap();
        let t1 = ctrl.input(0).unwrap().trigger_at().unwrap();
        let t2 = ctrl.input(1).unwrap().trigger_at().unwrap();
        assert!(t2 > t1);
        assert_eq!(ctrl.input(0).unwrap().read(), Ok(false));

        // Reopening the gate resets the sensors
        ctrl.axis(1).unwrap().move_s_curve(1.0, Some(&fast())).unwrap();
        assert!(ctrl.input(0).unwrap().trigger_at().is_none());
        assert!(ctrl.input(1).unwrap().trigger_at().is_none());
    }

    #[test]
    fn test_world_limit_switches() {
        let world = SimWorld {
            hw_limits: vec![SimHwLimits { axis: 2, min: 0.0, max: 1.0 }],
            ..Default::default()
        };
        let mut ctrl = SimController::create_and_connect(&creation_params())
            .unwrap()
            .with_world(world);

        let catcher = ctrl.axis(2).unwrap();
        catcher.configure(&AxisConfig {
            hw_pos_limit_action: LimitAction::EStop,
            ..Default::default()
        }).unwrap();
        catcher.amp_enable_set(true).unwrap();

        assert!(catcher.move_s_curve(0.5, Some(&fast())).is_ok());
        assert!(matches!(
            catcher.move_s_curve(1.5, Some(&fast())),
            Err(MotionError::LimitTripped { axis: 2, .. })
        ));

        // Axes without switches move anywhere
        let ramp = ctrl.axis(0).unwrap();
        ramp.configure(&AxisConfig {
            hw_pos_limit_action: LimitAction::EStop,
            ..Default::default()
        }).unwrap();
        ramp.amp_enable_set(true).unwrap();
        assert!(ramp.move_s_curve(100.0, Some(&fast())).is_ok());
    }

    #[test]
    fn test_flat_ramp_never_triggers() {
        let mut ctrl = ready_controller();

        ctrl.axis(1).unwrap().move_s_curve(1.0, Some(&fast())).unwrap();
        ctrl.axis(1).unwrap().move_s_curve(0.0, Some(&fast())).unwrap();

        assert!(ctrl.input(0).unwrap().trigger_at().is_none());
        assert!(ctrl.input(1).unwrap().trigger_at().is_none());
    }
}
