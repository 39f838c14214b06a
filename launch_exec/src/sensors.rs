//! # Sensor timing
//!
//! The two launch sensors are polled in a spin-wait until they report the car or a timeout
//! elapses. Trigger times are given in seconds since the start of the cycle.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use log::{debug, warn};
use serde::Serialize;

use motion_if::{Controller, DigitalInput};
use util::time::seconds_to_std;

use crate::params::LaunchExecParams;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// How the sensors are polled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorTiming {
    pub timeout: Duration,
    pub poll_period: Duration,
}

/// Trigger times of the two sensors, `None` if a sensor did not trigger.
///
/// Units: seconds since the start of the cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SensorTimes {
    pub t1: Option<f64>,
    pub t2: Option<f64>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SensorTiming {
    pub fn from_params(params: &LaunchExecParams) -> Self {
        Self {
            timeout: seconds_to_std(params.sensor_timeout_s),
            poll_period: seconds_to_std(params.sensor_poll_period_s)
        }
    }
}

impl SensorTimes {
    /// Whether both sensors saw the car.
    pub fn detected(&self) -> bool {
        self.t1.is_some() && self.t2.is_some()
    }

    /// The trigger times for the physics, `(0.0, 0.0)` unless both sensors triggered.
    ///
    /// Times are measured from the start of the cycle, so a lone trigger can't be paired with
    /// zero without producing a speed.
    pub fn as_secs(&self) -> (f64, f64) {
        match (self.t1, self.t2) {
            (Some(t1), Some(t2)) => (t1, t2),
            _ => (0.0, 0.0)
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Wait for a digital input to read as triggered.
///
/// Returns the time of the first triggered read in seconds since `epoch`, or `None` if the
/// timeout elapsed or `stop` was raised first. A failed read counts as not triggered and polling
/// carries on.
pub fn wait_for_trigger<C: Controller>(
    ctrl: &mut C,
    input_index: usize,
    epoch: Instant,
    timing: &SensorTiming,
    stop: &AtomicBool
) -> Option<f64> {
    let start = Instant::now();
    let mut num_errors: u64 = 0;

    let result = loop {
        if stop.load(Ordering::Relaxed) {
            debug!("Stop requested while waiting for sensor {}", input_index);
            break None
        }

        let read = ctrl.input(input_index).and_then(|i| i.read());
        let now = Instant::now();

        match read {
            Ok(true) => break Some(now.duration_since(epoch).as_secs_f64()),
            Ok(false) => (),
            Err(e) => {
                if num_errors == 0 {
                    warn!("Sensor {} read failed: {}", input_index, e);
                }
                num_errors += 1;
            }
        }

        if now.duration_since(start) >= timing.timeout {
            warn!(
                "Sensor {} did not trigger within {:.1} s",
                input_index,
                timing.timeout.as_secs_f64()
            );
            break None
        }

        thread::sleep(timing.poll_period);
    };

    if num_errors > 0 {
        warn!("Sensor {}: {} failed reads during this wait", input_index, num_errors);
    }

    result
}

/// Wait for the first sensor and then the second.
///
/// The second sensor is polled even if the first timed out so that the report records what each
/// sensor saw.
pub fn time_sensors<C: Controller>(
    ctrl: &mut C,
    sensor_inputs: [usize; 2],
    epoch: Instant,
    timing: &SensorTiming,
    stop: &AtomicBool
) -> SensorTimes {
    let t1 = wait_for_trigger(ctrl, sensor_inputs[0], epoch, timing, stop);
    debug!("Sensor 1: {:?}", t1);

    let t2 = wait_for_trigger(ctrl, sensor_inputs[1], epoch, timing, stop);
    debug!("Sensor 2: {:?}", t2);

    SensorTimes { t1, t2 }
}

#[cfg(test)]
mod test {
    use super::*;
    use motion_if::{CreationParams, sim::SimController};

    fn controller() -> SimController {
        SimController::create_and_connect(&CreationParams {
            rmp_path: String::from("/rsi/"),
            nic_primary: String::from("enp1s0")
        }).unwrap()
    }

    fn timing(timeout_ms: u64) -> SensorTiming {
        SensorTiming {
            timeout: Duration::from_millis(timeout_ms),
            poll_period: Duration::from_millis(1)
        }
    }

    #[test]
    fn test_trigger_time() {
        let mut ctrl = controller();
        let epoch = Instant::now();
        ctrl.input(0).unwrap().schedule(Some(epoch + Duration::from_millis(30)));

        let t = wait_for_trigger(&mut ctrl, 0, epoch, &timing(1000), &AtomicBool::new(false))
            .unwrap();
        assert!(t >= 0.030);
        assert!(t < 0.5);
    }

    #[test]
    fn test_timeout() {
        let mut ctrl = controller();
        let start = Instant::now();

        let t = wait_for_trigger(&mut ctrl, 1, start, &timing(50), &AtomicBool::new(false));
        assert_eq!(t, None);
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn test_read_errors_do_not_abort() {
        let mut ctrl = controller();
        ctrl.input(0).unwrap().inject_fault(Some("noise"));

        let t = wait_for_trigger(
            &mut ctrl, 0, Instant::now(), &timing(30), &AtomicBool::new(false)
        );
        assert_eq!(t, None);
        assert!(ctrl.input(0).unwrap().num_reads() > 1);
    }

    #[test]
    fn test_stop_ends_wait() {
        let mut ctrl = controller();
        let start = Instant::now();

        let t = wait_for_trigger(&mut ctrl, 0, start, &timing(5000), &AtomicBool::new(true));
        assert_eq!(t, None);
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_time_sensors() {
        let mut ctrl = controller();
        let epoch = Instant::now();
        ctrl.input(0).unwrap().force(Some(true));
        ctrl.input(1).unwrap().schedule(Some(epoch + Duration::from_millis(20)));

        let times = time_sensors(&mut ctrl, [0, 1], epoch, &timing(1000), &AtomicBool::new(false));
        assert!(times.detected());

        let (t1, t2) = times.as_secs();
        assert!(t2 > t1);
    }

    #[test]
    fn test_missing_trigger_is_zero() {
        let times = SensorTimes { t1: Some(0.4), t2: None };
        assert!(!times.detected());
        assert_eq!(times.as_secs(), (0.0, 0.0));

        let times = SensorTimes { t1: None, t2: Some(2.05) };
        assert!(!times.detected());
        assert_eq!(times.as_secs(), (0.0, 0.0));

        let times = SensorTimes { t1: Some(0.4), t2: Some(0.5) };
        assert_eq!(times.as_secs(), (0.4, 0.5));
    }
}
