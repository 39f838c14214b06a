//! # Launch Rig Executable
//!
//! Drives the launch and catch rig:
//! - Ramp axis, set to the angle the operator enters before each run
//! - Gate door axis, opened then closed to release the car
//! - Catcher axis (optional), sent to the predicted landing point
//!
//! Usage: `launch_exec [PARAM_FILE]`, where `PARAM_FILE` is relative to the `params` directory and
//! defaults to `launch_exec.toml`.
//!
//! The executable runs until Ctrl-C or the end of operator input, then disables every amplifier
//! before exiting.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use std::env;
use std::sync::{Arc, atomic::{AtomicBool, Ordering}};
use std::thread;
use std::time::{Duration, Instant};
use log::{debug, error, info, warn};
use color_eyre::{Result, eyre::{WrapErr, eyre}};
use rustyline::DefaultEditor;

// Internal
use launch_lib::{
    cycle::{self, RunSummary},
    params::LaunchExecParams,
    prompt::{self, PromptOutcome},
    rig::LaunchRig,
};
use motion_if::{Controller, sim::{SimController, SimWorld}};
use util::{
    archive::Archiver,
    host,
    logger::{logger_init, LevelFilter},
    session::Session,
    time::seconds_to_std,
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Parameter file used when none is given on the command line.
const DEFAULT_PARAMS_FILE: &str = "launch_exec.toml";

/// Granularity of waits which must respond to a stop request.
const STOP_CHECK_PERIOD: Duration = Duration::from_millis(50);

// ------------------------------------------------------------------------------------------------
// MAIN
// ------------------------------------------------------------------------------------------------

fn main() -> Result<()> {

    // ---- EARLY INITIALISATION ----

    color_eyre::install()?;

    // Initialise session
    let session = Session::new(
        "launch_exec",
        "sessions"
    ).wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Trace, LevelFilter::Info, &session)
        .wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Launch Rig Executable\n");
    match host::get_uname() {
        Ok(u) => info!("Running on: {} {} ({})", u.sysname, u.release, u.machine),
        Err(e) => warn!("Could not get host information: {}", e)
    }
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let args: Vec<String> = env::args().collect();
    debug!("CLI arguments: {:?}", args);

    let params_file = match args.len() {
        1 => DEFAULT_PARAMS_FILE,
        2 => args[1].as_str(),
        n => return Err(eyre!("Expected zero or one argument, found {}", n - 1))
    };

    let params: LaunchExecParams = util::params::load(params_file)
        .wrap_err_with(|| format!("Could not load parameters from {}", params_file))?;

    info!("Parameters loaded from {}", params_file);

    // ---- SHUTDOWN HANDLING ----

    // The handler only raises the flag, the main loop does the actual shutdown
    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        ctrlc::set_handler(move || stop.store(true, Ordering::Relaxed))
            .wrap_err("Failed to install the Ctrl-C handler")?;
    }

    // ---- CONTROLLER INITIALISATION ----

    info!("Starting motion network on {}", params.nic_primary);

    let ctrl = SimController::create_and_connect(&params.creation_params())
        .wrap_err("Failed to create the motion controller")?
        .with_world(sim_world(&params));

    let mut rig = LaunchRig::new(ctrl, params)
        .wrap_err("Failed to initialise the rig")?;

    info!(
        "Rig initialised ({} axes, catcher {})",
        rig.roles().len(),
        if rig.has_catcher() { "fitted" } else { "not fitted" }
    );

    let mut arch_runs = Archiver::from_path(&session, "runs.csv")
        .wrap_err("Failed to create the runs archive")?;

    let mut editor = DefaultEditor::new()
        .wrap_err("Failed to initialise the operator prompt")?;

    // ---- MAIN LOOP ----

    info!("Initialisation complete, entering main loop");

    let mut summary = RunSummary::default();
    let mut run: u32 = 0;

    loop {
        if stop.load(Ordering::Relaxed) {
            info!("Stop requested");
            break
        }

        let (min, max) = (rig.params().min_ramp_angle_deg, rig.params().max_ramp_angle_deg);
        let ramp_angle_deg = match prompt::prompt_ramp_angle(&mut editor, min, max) {
            PromptOutcome::Angle(a) => a,
            PromptOutcome::Shutdown => {
                stop.store(true, Ordering::Relaxed);
                break
            }
        };

        // A Ctrl-C while typing is delivered as a signal once the prompt returns
        if stop.load(Ordering::Relaxed) {
            info!("Stop requested");
            break
        }

        run += 1;
        let report = cycle::run_cycle(&mut rig, run, ramp_angle_deg, &stop);

        summary.record(&report);
        if let Err(e) = arch_runs.serialise(&report) {
            warn!("Could not archive run {}: {}", run, e);
        }

        if report.aborted {
            break
        }

        let rest = seconds_to_std(rig.params().cycle_rest_s);
        if !sleep_unless_stopped(rest, &stop) {
            info!("Stop requested");
            break
        }
    }

    // ---- SHUTDOWN ----

    info!("Shutting down after {} runs", summary.num_runs);

    rig.disable_all();
    let ctrl = rig.into_controller();
    info!(
        "Releasing controller on {} ({} axes)",
        ctrl.creation_params().nic_primary,
        ctrl.axis_count()
    );
    drop(ctrl);

    if let Err(e) = session.save_json("summary.json", &summary) {
        error!("Could not save the run summary: {}", e);
    }

    info!("{} runs archived to {:?}", arch_runs.num_records(), arch_runs.path());
    session.exit();

    Ok(())
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Build the simulated rig to match the parameters.
fn sim_world(params: &LaunchExecParams) -> SimWorld {
    let mut axes = vec![params.ramp_axis.index, params.door_axis.index];
    if let Some(ref c) = params.catcher_axis {
        axes.push(c.index);
    }

    SimWorld {
        num_axes: axes.iter().max().map_or(0, |m| m + 1),
        num_inputs: params.sensor_inputs.iter().max().map_or(0, |m| m + 1),
        ramp_axis: params.ramp_axis.index,
        gate_axis: params.door_axis.index,
        sensor_inputs: params.sensor_inputs,
        ramp_length_m: params.sim.ramp_length_m,
        sensor_spacing_m: params.sensor_spacing_m,
        gravity_mss: params.gravity_mss,
        hw_limits: params.sim.hw_limits.clone()
    }
}

/// Sleep for `duration` in short steps. Returns `false` if a stop was requested during the sleep.
fn sleep_unless_stopped(duration: Duration, stop: &AtomicBool) -> bool {
    let end = Instant::now() + duration;

    loop {
        if stop.load(Ordering::Relaxed) {
            return false
        }

        let now = Instant::now();
        if now >= end {
            return true
        }

        thread::sleep(STOP_CHECK_PERIOD.min(end - now));
    }
}
