//! # Operator prompt
//!
//! Asks the operator for the ramp angle before each run.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{error, info, warn};
use rustyline::{error::ReadlineError, DefaultEditor};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

pub const PROMPT: &str = "Enter ramp angle (degrees): ";

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// What the operator asked for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PromptOutcome {
    /// Run with the ramp at this angle
    Angle(f64),

    /// Stop the rig, from Ctrl-C, end of input or a terminal error
    Shutdown
}

/// Reasons an entered angle is rejected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AngleError {
    #[error("\"{0}\" is not a number")]
    NotANumber(String),

    #[error("{0} is not a finite angle")]
    NotFinite(f64),

    #[error("{angle} is outside the allowed range [{min}, {max}] degrees")]
    OutOfRange {
        angle: f64,
        min: f64,
        max: f64
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Parse a line of operator input as a ramp angle within `[min, max]` degrees.
pub fn parse_ramp_angle(line: &str, min: f64, max: f64) -> Result<f64, AngleError> {
    let line = line.trim();

    let angle: f64 = line.parse()
        .map_err(|_| AngleError::NotANumber(line.to_string()))?;

    if !angle.is_finite() {
        return Err(AngleError::NotFinite(angle))
    }
    if angle < min || angle > max {
        return Err(AngleError::OutOfRange { angle, min, max })
    }

    Ok(angle)
}

/// Prompt until the operator enters a valid angle or asks to stop.
pub fn prompt_ramp_angle(editor: &mut DefaultEditor, min: f64, max: f64) -> PromptOutcome {
    loop {
        let line = match editor.readline(PROMPT) {
            Ok(l) => l,
            Err(ReadlineError::Interrupted) => {
                info!("Interrupted at the prompt");
                return PromptOutcome::Shutdown
            },
            Err(ReadlineError::Eof) => {
                info!("End of operator input");
                return PromptOutcome::Shutdown
            },
            Err(e) => {
                error!("Could not read operator input: {}", e);
                return PromptOutcome::Shutdown
            }
        };

        if line.trim().is_empty() {
            continue
        }

        if let Err(e) = editor.add_history_entry(line.as_str()) {
            warn!("Could not add prompt history entry: {}", e);
        }

        match parse_ramp_angle(&line, min, max) {
            Ok(a) => return PromptOutcome::Angle(a),
            Err(e) => warn!("Invalid ramp angle: {}", e)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_ramp_angle() {
        assert_eq!(parse_ramp_angle("20", 0.0, 90.0), Ok(20.0));
        assert_eq!(parse_ramp_angle("  37.5\n", 0.0, 90.0), Ok(37.5));
        assert_eq!(parse_ramp_angle("0", 0.0, 90.0), Ok(0.0));
        assert_eq!(parse_ramp_angle("90", 0.0, 90.0), Ok(90.0));
    }

    #[test]
    fn test_parse_ramp_angle_rejects() {
        assert_eq!(
            parse_ramp_angle("steep", 0.0, 90.0),
            Err(AngleError::NotANumber(String::from("steep")))
        );
        assert!(matches!(parse_ramp_angle("inf", 0.0, 90.0), Err(AngleError::NotFinite(_))));
        assert!(matches!(parse_ramp_angle("NaN", 0.0, 90.0), Err(AngleError::NotFinite(_))));
        assert!(matches!(
            parse_ramp_angle("91", 0.0, 90.0),
            Err(AngleError::OutOfRange { .. })
        ));
        assert!(matches!(
            parse_ramp_angle("-5", 0.0, 90.0),
            Err(AngleError::OutOfRange { .. })
        ));
    }
}
