//! Generic logger utility functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use log::{self, info};
use fern;
use colored::{ColoredString, Colorize};
use thiserror::Error;

// Internal imports
use crate::session;

// Re-exports
pub use log::LevelFilter;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors associated with initialising the logger.
#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error("Expected a log level less than `INFO`, found `{0}`")]
    InvalidMinLogLevel(log::LevelFilter),

    #[error("Error initialising the log file: {0}")]
    LogFileInitError(std::io::Error),

    #[error("An error occured while setting up the logger: {0}")]
    FernInitError(log::SetLoggerError)
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Initialise the logger for this execution.
///
/// The log file receives every record down to `min_level`. The terminal is shared with the
/// operator prompt, so it only receives records at `console_level` or above.
///
/// # Notes
///
/// - `min_level` and `console_level` must be greater than `log::Level::Info`.
///
/// # Safety
///
/// - This function must only be called once to prevent corrupting logs.
pub fn logger_init(
    min_level: self::LevelFilter,
    console_level: self::LevelFilter,
    session: &session::Session
) -> Result<(), LoggerInitError> {

    for level in [min_level, console_level].iter() {
        if *level < log::Level::Info {
            return Err(LoggerInitError::InvalidMinLogLevel(*level))
        }
    }

    let log_file = fern::log_file(session.log_file_path.clone())
        .map_err(LoggerInitError::LogFileInitError)?;

    let console = fern::Dispatch::new()
        .level(console_level)
        .chain(std::io::stdout());

    let file = fern::Dispatch::new()
        .level(min_level)
        .chain(log_file);

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{:10.6} {}] {}",
                session::get_elapsed_seconds(),
                level_to_str(record.level()),
                format_body(record.level(), record.target(), message)
            ))
        })
        .level(min_level)
        .level_for("rustyline", LevelFilter::Warn)
        .chain(console)
        .chain(file)
        .apply()
        .map_err(LoggerInitError::FernInitError)?;

    info!("Logging initialised");
    info!("    Session epoch: {}", session::get_epoch());
    info!("    Log level: {:?} (console {:?})", min_level, console_level);
    info!("    Log file path: {:?}", session.log_file_path);

    Ok(())
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Get the string representation of a log level
fn level_to_str(level: log::Level) -> ColoredString {
    match level {
        log::Level::Trace => "TRC".dimmed().italic(),
        log::Level::Debug => "DBG".dimmed(),
        log::Level::Info  => "INF".normal(),
        log::Level::Warn  => "WRN".yellow(),
        log::Level::Error => "ERR".red().bold()
    }
}

/// Debug and trace records carry their target, everything else is just the message.
fn format_body(level: log::Level, target: &str, message: &std::fmt::Arguments) -> String {
    if level > log::Level::Info {
        format!("{}: {}", target, message)
    }
    else {
        format!("{}", message)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_level_to_str() {
        assert_eq!(level_to_str(log::Level::Info).to_string(), "INF");
        assert!(level_to_str(log::Level::Warn).to_string().contains("WRN"));
        assert!(level_to_str(log::Level::Error).to_string().contains("ERR"));
    }

    #[test]
    fn test_format_body() {
        assert_eq!(
            format_body(log::Level::Info, "launch_lib::rig", &format_args!("Ramp at {}", 20)),
            "Ramp at 20"
        );
        assert_eq!(
            format_body(log::Level::Trace, "launch_lib::rig", &format_args!("Ramp at {}", 20)),
            "launch_lib::rig: Ramp at 20"
        );
    }
}
