//! # Launch rig
//!
//! Owns the motion controller and knows which axis does what. All motion on the rig goes through
//! [`LaunchRig`], which logs and counts failed moves instead of propagating them so that a single
//! bad move does not end a session.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::fmt;
use std::thread;
use log::{debug, error, info, warn};

use motion_if::{Axis, AxisConfig, Controller, MotionError};
use util::time::seconds_to_std;

use crate::params::{AxisParams, LaunchExecParams};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The launch rig: ramp, door and optional catcher on one controller.
pub struct LaunchRig<C: Controller> {
    ctrl: C,

    params: LaunchExecParams,

    /// Number of failed motion commands since the rig was created
    move_failures: u32,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// The job an axis does on the rig.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisRole {
    Ramp,
    Door,
    Catcher
}

/// Errors raised while bringing up the rig.
#[derive(Debug, thiserror::Error)]
pub enum RigError {
    #[error("Invalid rig parameters: {0}")]
    InvalidParams(String),

    #[error("Could not initialise the {role} axis: {source}")]
    AxisInit {
        role: AxisRole,
        source: MotionError
    },

    #[error("Sensor input {0} does not exist on the controller")]
    MissingInput(usize),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl fmt::Display for AxisRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AxisRole::Ramp => write!(f, "ramp"),
            AxisRole::Door => write!(f, "door"),
            AxisRole::Catcher => write!(f, "catcher")
        }
    }
}

impl<C: Controller> LaunchRig<C> {
    /// Take ownership of the controller and initialise every axis the rig uses.
    ///
    /// Each axis is configured, has its faults cleared, its amplifier enabled and its command
    /// position zeroed.
    pub fn new(ctrl: C, params: LaunchExecParams) -> Result<Self, RigError> {
        params.validate().map_err(RigError::InvalidParams)?;

        let mut rig = Self {
            ctrl,
            params,
            move_failures: 0
        };

        for index in rig.params.sensor_inputs.iter() {
            if *index >= rig.ctrl.input_count() {
                return Err(RigError::MissingInput(*index))
            }
        }

        rig.init_axes()?;

        Ok(rig)
    }

    /// Roles wired on this rig, in initialisation order.
    pub fn roles(&self) -> Vec<AxisRole> {
        let mut roles = vec![AxisRole::Ramp, AxisRole::Door];
        if self.params.catcher_axis.is_some() {
            roles.push(AxisRole::Catcher);
        }
        roles
    }

    pub fn has_catcher(&self) -> bool {
        self.params.catcher_axis.is_some()
    }

    pub fn params(&self) -> &LaunchExecParams {
        &self.params
    }

    pub fn controller_mut(&mut self) -> &mut C {
        &mut self.ctrl
    }

    /// Give the controller back, e.g. to shut it down.
    pub fn into_controller(self) -> C {
        self.ctrl
    }

    pub fn move_failures(&self) -> u32 {
        self.move_failures
    }

    /// Get the axis for a role, `None` if the role isn't wired.
    pub fn axis(&mut self, role: AxisRole) -> Option<Result<&mut C::Axis, MotionError>> {
        let index = self.axis_params(role)?.index;
        Some(self.ctrl.axis(index))
    }

    /// Command an S-curve move on one axis.
    ///
    /// Failures are logged and counted, and `false` is returned. No retry is attempted.
    pub fn move_to(&mut self, role: AxisRole, position: f64) -> bool {
        let result = match self.axis(role) {
            Some(axis) => axis.and_then(|a| a.move_s_curve(position, None)),
            None => {
                warn!("Move of {} axis requested but it is not wired", role);
                return false
            }
        };

        match result {
            Ok(_) => {
                info!("MoveSCurve {} -> {}", role, position);
                true
            },
            Err(e) => {
                error!("Move of {} axis to {} failed: {}", role, position, e);
                self.move_failures += 1;
                false
            }
        }
    }

    /// Open the door, wait, then close it to release the car.
    ///
    /// Returns `true` if the closing move, which releases the car, was issued.
    pub fn release_car(&mut self) -> bool {
        let open_pos = self.params.door_open_pos;
        let closed_pos = self.params.door_closed_pos;

        self.move_to(AxisRole::Door, open_pos);
        thread::sleep(seconds_to_std(self.params.door_open_dwell_s));

        let released = self.move_to(AxisRole::Door, closed_pos);
        thread::sleep(seconds_to_std(self.params.door_close_dwell_s));

        released
    }

    /// Disable the amplifier of every wired axis.
    ///
    /// Failures are logged and the remaining axes are still disabled.
    pub fn disable_all(&mut self) {
        for role in self.roles() {
            let result = match self.axis(role) {
                Some(axis) => axis.and_then(|a| a.amp_enable_set(false)),
                None => continue
            };

            match result {
                Ok(_) => debug!("{} amplifier disabled", role),
                Err(e) => error!("Could not disable the {} amplifier: {}", role, e)
            }
        }

        info!("Amplifiers disabled");
    }

    fn axis_params(&self, role: AxisRole) -> Option<&AxisParams> {
        match role {
            AxisRole::Ramp => Some(&self.params.ramp_axis),
            AxisRole::Door => Some(&self.params.door_axis),
            AxisRole::Catcher => self.params.catcher_axis.as_ref()
        }
    }

    /// Initialise every wired axis. If one fails, the amplifiers already enabled are disabled
    /// again before the error is returned.
    fn init_axes(&mut self) -> Result<(), RigError> {
        for role in self.roles() {
            if let Err(source) = self.init_axis(role) {
                error!("Could not initialise the {} axis, disabling the rig", role);
                self.disable_all();
                return Err(RigError::AxisInit { role, source })
            }
            info!("{} axis initialised", role);
        }

        Ok(())
    }

    fn init_axis(&mut self, role: AxisRole) -> Result<(), MotionError> {
        let (index, config): (usize, AxisConfig) = match self.axis_params(role) {
            Some(p) => (p.index, p.config.clone()),
            None => return Ok(())
        };

        debug!("Initialising {} axis (index {})", role, index);

        let axis = self.ctrl.axis(index)?;
        axis.configure(&config)?;
        axis.clear_faults()?;
        axis.amp_enable_set(true)?;
        axis.command_position_set(0.0)?;

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use motion_if::sim::SimController;
    use crate::params::test::test_params;

    fn rig(catcher: bool) -> LaunchRig<SimController> {
        let params = test_params(catcher);
        let ctrl = SimController::create_and_connect(&params.creation_params()).unwrap();
        LaunchRig::new(ctrl, params).unwrap()
    }

    #[test]
    fn test_init_enables_axes() {
        let mut rig = rig(true);
        assert_eq!(rig.roles(), vec![AxisRole::Ramp, AxisRole::Door, AxisRole::Catcher]);

        for i in 0..3 {
            let axis = rig.controller_mut().axis(i).unwrap();
            assert!(axis.amp_enabled());
            assert_eq!(axis.command_position(), 0.0);
        }
    }

    #[test]
    fn test_no_catcher() {
        let mut rig = rig(false);
        assert!(!rig.has_catcher());
        assert!(rig.axis(AxisRole::Catcher).is_none());
        assert!(!rig.move_to(AxisRole::Catcher, 0.5));

        // The unused axis is left alone
        assert!(!rig.controller_mut().axis(2).unwrap().amp_enabled());
    }

    #[test]
    fn test_move_failure_counted() {
        let mut rig = rig(true);
        rig.controller_mut().axis(0).unwrap().inject_fault("encoder loss");

        assert!(!rig.move_to(AxisRole::Ramp, 20.0));
        assert_eq!(rig.move_failures(), 1);
        assert!(rig.move_to(AxisRole::Door, 1.0));
        assert_eq!(rig.move_failures(), 1);
    }

    #[test]
    fn test_release_car() {
        let mut rig = rig(true);
        assert!(rig.release_car());

        let door = rig.controller_mut().axis(1).unwrap();
        assert_eq!(door.move_count(), 2);
        assert!(door.last_move().unwrap().is_negative());
    }

    #[test]
    fn test_disable_all() {
        let mut rig = rig(true);
        rig.disable_all();

        for i in 0..3 {
            assert!(!rig.controller_mut().axis(i).unwrap().amp_enabled());
        }
    }

    #[test]
    fn test_failed_init_disables_axes() {
        let mut params = test_params(true);
        params.catcher_axis.as_mut().unwrap().config.user_units = 0.0;

        let mut rig = LaunchRig {
            ctrl: SimController::create_and_connect(&params.creation_params()).unwrap(),
            params,
            move_failures: 0
        };

        assert!(matches!(
            rig.init_axes(),
            Err(RigError::AxisInit { role: AxisRole::Catcher, .. })
        ));
        for i in 0..3 {
            assert!(!rig.controller_mut().axis(i).unwrap().amp_enabled());
        }
    }

    #[test]
    fn test_setup_failures() {
        let mut params = test_params(true);
        params.sensor_inputs = [0, 5];
        let ctrl = SimController::create_and_connect(&params.creation_params()).unwrap();
        assert!(matches!(LaunchRig::new(ctrl, params), Err(RigError::MissingInput(5))));

        let mut params = test_params(true);
        params.catcher_axis.as_mut().unwrap().index = 7;
        let ctrl = SimController::create_and_connect(&params.creation_params()).unwrap();
        assert!(matches!(
            LaunchRig::new(ctrl, params),
            Err(RigError::AxisInit { role: AxisRole::Catcher, .. })
        ));
    }
}
