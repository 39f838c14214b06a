//! Simulated axis

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::time::{Duration, Instant};
use log::{debug, warn};

use crate::{Axis, AxisConfig, LimitAction, MotionError, MotionProfile};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A simulated axis.
///
/// Position is held in encoder counts so that changing the user units rescales the position the
/// same way a real drive would.
#[derive(Debug, Clone)]
pub struct SimAxis {
    index: usize,

    config: AxisConfig,

    amp_enabled: bool,

    fault: Option<String>,

    /// Position at rest, or at the start of the active move.
    ///
    /// Units: counts
    origin_counts: f64,

    last_move: Option<SimMove>,

    /// Number of moves issued since creation.
    move_count: u64,

    /// Hardware limit switch positions in user units, `None` if the axis has no switches.
    hw_limits: Option<(f64, f64)>,
}

/// A move issued to a simulated axis.
#[derive(Debug, Clone, Copy)]
pub struct SimMove {
    /// Units: counts
    pub from_counts: f64,

    /// Units: counts
    pub to_counts: f64,

    pub start: Instant,

    profile: Trapezoid,
}

/// Trapezoidal velocity profile over a distance.
///
/// The S-curve's jerk limiting is approximated by reducing the acceleration and deceleration by
/// `1 + jerk_pct/100`, which stretches the ramps by the same factor a jerk limited profile would.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Trapezoid {
    distance: f64,
    v_peak: f64,
    acc: f64,
    dec: f64,
    t_acc: f64,
    t_cruise: f64,
    t_dec: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SimAxis {
    pub(crate) fn new(index: usize) -> Self {
        Self {
            index,
            config: AxisConfig::default(),
            amp_enabled: false,
            fault: None,
            origin_counts: 0.0,
            last_move: None,
            move_count: 0,
            hw_limits: None,
        }
    }

    /// Fault the drive, stopping any move in progress.
    pub fn inject_fault(&mut self, reason: &str) {
        warn!("Sim axis {}: injected fault: {}", self.index, reason);
        self.freeze();
        self.fault = Some(reason.to_string());
    }

    /// Set the positions of the hardware limit switches.
    ///
    /// Units: user units
    pub fn set_hw_limits(&mut self, min: f64, max: f64) {
        self.hw_limits = Some((min, max));
    }

    pub fn is_faulted(&self) -> bool {
        self.fault.is_some()
    }

    pub fn config(&self) -> &AxisConfig {
        &self.config
    }

    /// Current position in encoder counts.
    pub fn position_counts(&self) -> f64 {
        self.position_counts_at(Instant::now())
    }

    /// The last move issued to this axis, whether or not it has finished.
    pub fn last_move(&self) -> Option<&SimMove> {
        self.last_move.as_ref()
    }

    pub fn move_count(&self) -> u64 {
        self.move_count
    }

    fn position_counts_at(&self, now: Instant) -> f64 {
        match self.last_move {
            Some(ref m) => m.position_at(now),
            None => self.origin_counts
        }
    }

    /// Stop dead at the current position.
    fn freeze(&mut self) {
        self.origin_counts = self.position_counts();
        self.last_move = None;
    }

    fn check_limits(&mut self, target: f64) -> Result<(), MotionError> {
        let (min, max) = match self.hw_limits {
            Some(l) => l,
            None => return Ok(())
        };

        let action = if target > max {
            self.config.hw_pos_limit_action
        }
        else if target < min {
            self.config.hw_neg_limit_action
        }
        else {
            return Ok(())
        };

        if action == LimitAction::None {
            warn!(
                "Sim axis {}: target {} is beyond a hardware limit but the limit action is None",
                self.index, target
            );
            return Ok(())
        }

        self.fault = Some(format!("hardware limit ({:?})", action));
        if action == LimitAction::Abort {
            self.amp_enabled = false;
        }

        Err(MotionError::LimitTripped { axis: self.index, target, min, max })
    }
}

impl Axis for SimAxis {
    fn index(&self) -> usize {
        self.index
    }

    fn configure(&mut self, config: &AxisConfig) -> Result<(), MotionError> {
        config.validate()?;
        self.freeze();
        self.config = config.clone();
        debug!("Sim axis {}: configured with {:?}", self.index, self.config);
        Ok(())
    }

    fn clear_faults(&mut self) -> Result<(), MotionError> {
        self.fault = None;
        Ok(())
    }

    fn amp_enable_set(&mut self, enable: bool) -> Result<(), MotionError> {
        if enable {
            if let Some(ref reason) = self.fault {
                return Err(MotionError::DriveFault {
                    axis: self.index,
                    reason: reason.clone()
                })
            }
        }
        else {
            self.freeze();
        }

        self.amp_enabled = enable;
        Ok(())
    }

    fn amp_enabled(&self) -> bool {
        self.amp_enabled
    }

    fn command_position_set(&mut self, position: f64) -> Result<(), MotionError> {
        self.last_move = None;
        self.origin_counts = position * self.config.user_units;
        Ok(())
    }

    fn command_position(&self) -> f64 {
        self.position_counts() / self.config.user_units
    }

    fn move_s_curve(
        &mut self,
        target: f64,
        profile: Option<&MotionProfile>
    ) -> Result<(), MotionError> {
        if let Some(ref reason) = self.fault {
            return Err(MotionError::DriveFault { axis: self.index, reason: reason.clone() })
        }
        if !self.amp_enabled {
            return Err(MotionError::AmpDisabled(self.index))
        }
        if !target.is_finite() {
            return Err(MotionError::InvalidProfile(format!("target {} is not finite", target)))
        }

        let profile = profile.copied().unwrap_or(self.config.profile);
        profile.validate()?;

        self.check_limits(target)?;

        let now = Instant::now();
        let from_counts = self.position_counts_at(now);
        let to_counts = target * self.config.user_units;

        let trap = Trapezoid::plan(
            (to_counts - from_counts).abs(),
            &profile,
            self.config.user_units
        );

        debug!(
            "Sim axis {}: S-curve {} -> {} user units ({:.3} s)",
            self.index,
            from_counts / self.config.user_units,
            target,
            trap.duration_s()
        );

        self.origin_counts = from_counts;
        self.last_move = Some(SimMove { from_counts, to_counts, start: now, profile: trap });
        self.move_count += 1;

        Ok(())
    }

    fn motion_done(&self) -> bool {
        match self.last_move {
            Some(ref m) => m.is_done(Instant::now()),
            None => true
        }
    }
}

impl SimMove {
    /// Total duration of the move.
    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.profile.duration_s())
    }

    /// Instant at which the move finishes.
    pub fn end(&self) -> Instant {
        self.start + self.duration()
    }

    pub fn is_done(&self, now: Instant) -> bool {
        now >= self.end()
    }

    /// Whether the move goes towards lower positions.
    pub fn is_negative(&self) -> bool {
        self.to_counts < self.from_counts
    }

    fn position_at(&self, now: Instant) -> f64 {
        let t = now.saturating_duration_since(self.start).as_secs_f64();
        let travelled = self.profile.travelled(t);

        if self.is_negative() {
            self.from_counts - travelled
        }
        else {
            self.from_counts + travelled
        }
    }
}

impl Trapezoid {
    /// Plan a profile covering `distance` counts.
    pub(crate) fn plan(distance: f64, profile: &MotionProfile, user_units: f64) -> Self {
        let stretch = 1.0 + profile.jerk_pct / 100.0;
        let vel = profile.velocity * user_units;
        let acc = profile.acceleration * user_units / stretch;
        let dec = profile.deceleration * user_units / stretch;

        if distance <= 0.0 {
            return Self {
                distance: 0.0,
                v_peak: 0.0,
                acc,
                dec,
                t_acc: 0.0,
                t_cruise: 0.0,
                t_dec: 0.0
            }
        }

        // Distance needed to reach full velocity and stop again
        let ramp_dist = vel.powi(2) / (2.0 * acc) + vel.powi(2) / (2.0 * dec);

        let v_peak = if distance >= ramp_dist {
            vel
        }
        else {
            (2.0 * distance * acc * dec / (acc + dec)).sqrt()
        };

        let cruise_dist = (distance
            - v_peak.powi(2) / (2.0 * acc)
            - v_peak.powi(2) / (2.0 * dec)).max(0.0);

        Self {
            distance,
            v_peak,
            acc,
            dec,
            t_acc: v_peak / acc,
            t_cruise: cruise_dist / v_peak,
            t_dec: v_peak / dec
        }
    }

    pub(crate) fn duration_s(&self) -> f64 {
        self.t_acc + self.t_cruise + self.t_dec
    }

    /// Distance covered `t` seconds into the move.
    pub(crate) fn travelled(&self, t: f64) -> f64 {
        if t <= 0.0 {
            return 0.0
        }
        if t >= self.duration_s() {
            return self.distance
        }

        let d_acc = 0.5 * self.acc * self.t_acc.powi(2);

        let travelled = if t < self.t_acc {
            0.5 * self.acc * t.powi(2)
        }
        else if t < self.t_acc + self.t_cruise {
            d_acc + self.v_peak * (t - self.t_acc)
        }
        else {
            let td = t - self.t_acc - self.t_cruise;
            d_acc + self.v_peak * self.t_cruise + self.v_peak * td - 0.5 * self.dec * td.powi(2)
        };

        travelled.min(self.distance)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn profile(jerk_pct: f64) -> MotionProfile {
        MotionProfile {
            velocity: 10.0,
            acceleration: 100.0,
            deceleration: 100.0,
            jerk_pct
        }
    }

    fn enabled_axis() -> SimAxis {
        let mut axis = SimAxis::new(0);
        axis.amp_enable_set(true).unwrap();
        axis
    }

    #[test]
    fn test_trapezoid_reaches_velocity() {
        // 0.1 s to reach 10 u/s, 0.5 u covered by each ramp, 9 u cruising
        let trap = Trapezoid::plan(10.0, &profile(0.0), 1.0);
        assert!((trap.v_peak - 10.0).abs() < 1e-9);
        assert!((trap.duration_s() - 1.1).abs() < 1e-9);
        assert!((trap.travelled(0.05) - 0.125).abs() < 1e-9);
        assert!((trap.travelled(0.6) - 5.5).abs() < 1e-9);
        assert_eq!(trap.travelled(2.0), 10.0);
    }

    #[test]
    fn test_trapezoid_triangular() {
        // Too short to reach full velocity
        let trap = Trapezoid::plan(0.5, &profile(0.0), 1.0);
        assert!(trap.v_peak < 10.0);
        assert!(trap.t_cruise < 1e-12);
        assert!((trap.travelled(trap.duration_s() / 2.0) - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_jerk_stretches_move() {
        let trapezoidal = Trapezoid::plan(10.0, &profile(0.0), 1.0);
        let s_curve = Trapezoid::plan(10.0, &profile(100.0), 1.0);
        assert!(s_curve.duration_s() > trapezoidal.duration_s());
    }

    #[test]
    fn test_travel_monotonic() {
        let trap = Trapezoid::plan(3.0, &profile(50.0), 1.0);
        let mut last = 0.0;
        for i in 0..=100 {
            let d = trap.travelled(trap.duration_s() * i as f64 / 100.0);
            assert!(d >= last);
            last = d;
        }
        assert_eq!(last, 3.0);
    }

    #[test]
    fn test_move_requires_amp() {
        let mut axis = SimAxis::new(3);
        assert_eq!(axis.move_s_curve(1.0, None), Err(MotionError::AmpDisabled(3)));
    }

    #[test]
    fn test_fault_blocks_until_cleared() {
        let mut axis = enabled_axis();
        axis.inject_fault("overcurrent");

        assert!(matches!(axis.move_s_curve(1.0, None), Err(MotionError::DriveFault { .. })));
        assert!(axis.amp_enable_set(true).is_err());

        axis.clear_faults().unwrap();
        axis.amp_enable_set(true).unwrap();
        assert!(axis.move_s_curve(1.0, None).is_ok());
    }

    #[test]
    fn test_user_units_scaling() {
        let mut axis = enabled_axis();
        axis.configure(&AxisConfig { user_units: 1000.0, ..Default::default() }).unwrap();
        axis.command_position_set(2.0).unwrap();

        assert_eq!(axis.position_counts(), 2000.0);
        assert_eq!(axis.command_position(), 2.0);
    }

    #[test]
    fn test_move_completes() {
        let mut axis = enabled_axis();
        let fast = MotionProfile {
            velocity: 1000.0,
            acceleration: 1e6,
            deceleration: 1e6,
            jerk_pct: 0.0
        };
        axis.move_s_curve(1.0, Some(&fast)).unwrap();

        std::thread::sleep(Duration::from_millis(20));
        assert!(axis.motion_done());
        assert_eq!(axis.command_position(), 1.0);
        assert_eq!(axis.move_count(), 1);
    }

    #[test]
    fn test_hw_limits() {
        let mut axis = enabled_axis();
        axis.set_hw_limits(-1.0, 1.0);

        // Limit actions default to None so the move is allowed
        assert!(axis.move_s_curve(2.0, None).is_ok());

        axis.configure(&AxisConfig {
            hw_pos_limit_action: LimitAction::Abort,
            ..Default::default()
        }).unwrap();
        assert!(matches!(
            axis.move_s_curve(2.0, None),
            Err(MotionError::LimitTripped { axis: 0, .. })
        ));
        assert!(axis.is_faulted());
        assert!(!axis.amp_enabled());
    }
}
