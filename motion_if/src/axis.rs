//! # Axis Interface

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Serialize, Deserialize};

use crate::MotionError;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A single motor/drive channel on the motion network.
///
/// Positions are in user units, i.e. encoder counts divided by [`AxisConfig::user_units`].
pub trait Axis {

    /// Index of this axis on its controller.
    fn index(&self) -> usize;

    /// Apply user unit scaling, error limit and hardware limit settings.
    fn configure(&mut self, config: &AxisConfig) -> Result<(), MotionError>;

    /// Clear any latched fault on the axis.
    fn clear_faults(&mut self) -> Result<(), MotionError>;

    /// Enable or disable the drive's power stage.
    fn amp_enable_set(&mut self, enable: bool) -> Result<(), MotionError>;

    /// Whether the drive's power stage is enabled.
    fn amp_enabled(&self) -> bool;

    /// Redefine the current command position without moving.
    fn command_position_set(&mut self, position: f64) -> Result<(), MotionError>;

    /// The current command position.
    fn command_position(&self) -> f64;

    /// Command an S-curve move to `target`.
    ///
    /// The call returns once the move has been issued, not when it completes. If `profile` is
    /// `None` the profile from the axis configuration is used.
    ///
    /// ## Errors
    /// - [`MotionError::AmpDisabled`] if the amplifier is not enabled
    /// - [`MotionError::DriveFault`] if the drive is faulted
    /// - [`MotionError::LimitTripped`] if the target lies beyond an active hardware limit
    fn move_s_curve(
        &mut self,
        target: f64,
        profile: Option<&MotionProfile>
    ) -> Result<(), MotionError>;

    /// Whether the last commanded move has finished.
    fn motion_done(&self) -> bool;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Configuration applied to an axis during initialisation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AxisConfig {
    /// Encoder counts per user unit.
    pub user_units: f64,

    /// Position error at which the error limit triggers.
    ///
    /// Units: user units
    pub error_limit_trigger: f64,

    /// Action taken when the error limit triggers.
    pub error_limit_action: LimitAction,

    /// Input state at which the negative hardware limit is considered active.
    pub hw_neg_limit_trigger_state: bool,

    /// Input state at which the positive hardware limit is considered active.
    pub hw_pos_limit_trigger_state: bool,

    pub hw_neg_limit_action: LimitAction,

    pub hw_pos_limit_action: LimitAction,

    /// How long a hardware limit must be held before it triggers.
    ///
    /// Units: seconds
    pub hw_limit_duration_s: f64,

    /// Default profile for moves issued without one.
    pub profile: MotionProfile,
}

/// Parameters of an S-curve move.
///
/// Units: user units per second (and per second squared)
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct MotionProfile {
    pub velocity: f64,

    pub acceleration: f64,

    pub deceleration: f64,

    /// Percentage (0 to 100) of the acceleration phase spent jerk limited. 0 is a trapezoidal
    /// profile.
    pub jerk_pct: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Action taken by the controller when a limit triggers.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitAction {
    /// Take no action, the limit is only reported
    None,

    /// Decelerate to a stop using the move's deceleration
    Stop,

    /// Stop as fast as possible
    EStop,

    /// Stop as fast as possible and disable the amplifier
    Abort
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for AxisConfig {
    fn default() -> Self {
        Self {
            user_units: 1.0,
            error_limit_trigger: 0.5,
            error_limit_action: LimitAction::None,
            hw_neg_limit_trigger_state: true,
            hw_pos_limit_trigger_state: true,
            hw_neg_limit_action: LimitAction::None,
            hw_pos_limit_action: LimitAction::None,
            hw_limit_duration_s: 2.0,
            profile: MotionProfile::default()
        }
    }
}

impl AxisConfig {
    /// Check the configuration is usable.
    pub fn validate(&self) -> Result<(), MotionError> {
        if !(self.user_units.is_finite() && self.user_units > 0.0) {
            return Err(MotionError::InvalidConfig(format!(
                "user units must be positive, found {}", self.user_units
            )))
        }
        if !(self.error_limit_trigger >= 0.0) {
            return Err(MotionError::InvalidConfig(format!(
                "error limit trigger must not be negative, found {}", self.error_limit_trigger
            )))
        }
        if !(self.hw_limit_duration_s >= 0.0) {
            return Err(MotionError::InvalidConfig(format!(
                "hardware limit duration must not be negative, found {}",
                self.hw_limit_duration_s
            )))
        }

        self.profile.validate()
    }
}

impl Default for MotionProfile {
    fn default() -> Self {
        Self {
            velocity: 100.0,
            acceleration: 1000.0,
            deceleration: 1000.0,
            jerk_pct: 50.0
        }
    }
}

impl MotionProfile {
    /// Check the profile is usable.
    pub fn validate(&self) -> Result<(), MotionError> {
        let positive = [
            ("velocity", self.velocity),
            ("acceleration", self.acceleration),
            ("deceleration", self.deceleration)
        ];

        for (name, value) in positive.iter() {
            if !(value.is_finite() && *value > 0.0) {
                return Err(MotionError::InvalidProfile(format!(
                    "{} must be positive, found {}", name, value
                )))
            }
        }

        if !(0.0..=100.0).contains(&self.jerk_pct) {
            return Err(MotionError::InvalidProfile(format!(
                "jerk percentage must be between 0 and 100, found {}", self.jerk_pct
            )))
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_profile_validation() {
        assert!(MotionProfile::default().validate().is_ok());

        let zero_vel = MotionProfile { velocity: 0.0, ..Default::default() };
        assert!(matches!(zero_vel.validate(), Err(MotionError::InvalidProfile(_))));

        let bad_jerk = MotionProfile { jerk_pct: 120.0, ..Default::default() };
        assert!(matches!(bad_jerk.validate(), Err(MotionError::InvalidProfile(_))));

        let nan_decel = MotionProfile { deceleration: f64::NAN, ..Default::default() };
        assert!(nan_decel.validate().is_err());
    }

    #[test]
    fn test_config_validation() {
        assert!(AxisConfig::default().validate().is_ok());

        let no_units = AxisConfig { user_units: 0.0, ..Default::default() };
        assert!(matches!(no_units.validate(), Err(MotionError::InvalidConfig(_))));
    }

    #[test]
    fn test_config_from_toml() {
        let config: AxisConfig = toml::from_str(r#"
            user_units = 186413.5111
            hw_pos_limit_action = "Abort"

            [profile]
            velocity = 30.0
        "#).unwrap();

        assert_eq!(config.user_units, 186413.5111);
        assert_eq!(config.hw_pos_limit_action, LimitAction::Abort);
        assert_eq!(config.hw_neg_limit_action, LimitAction::None);
        assert_eq!(config.profile.velocity, 30.0);
        assert_eq!(config.profile.acceleration, MotionProfile::default().acceleration);
    }
}
