//! Human-readable error descriptions and structured JSON error formatting.

use coaster_core::error::{BuildError, CoreError};
use coaster_hardware::error::HwError;

/// Stable category names used in JSON errors and exit codes.
fn category(err: &eyre::Report) -> &'static str {
    if err.downcast_ref::<BuildError>().is_some() {
        return "Config";
    }
    if err.downcast_ref::<HwError>().is_some() || err.downcast_ref::<CoreError>().is_some() {
        return "Hardware";
    }
    let lower = err.to_string().to_ascii_lowercase();
    if lower.contains("config") || lower.contains(" must ") {
        "Config"
    } else {
        "Error"
    }
}

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    if let Some(BuildError::InvalidConfig(msg)) = err.downcast_ref::<BuildError>() {
        return format!(
            "What happened: Invalid configuration ({msg}).\nLikely causes: Out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun. See etc/coaster.toml for a sample."
        );
    }

    if let Some(hw) = err.downcast_ref::<HwError>() {
        return match hw {
            HwError::Timeout | HwError::DataReadyTimeout => "What happened: HX711 did not produce data within the configured timeout.\nLikely causes: Wrong DT/SCK pins, wiring/power issues, or timeout configured too low.\nHow to fix: Check [hardware] pins in the config, verify power, and raise sampling.sensor_timeout_ms.".to_string(),
            HwError::Gpio(m) => format!(
                "What happened: Failed to initialize GPIO ({m}).\nLikely causes: Incorrect pin numbers or insufficient GPIO permissions.\nHow to fix: Fix hardware.hx711_dt / hardware.hx711_sck; ensure the process may access GPIO."
            ),
            HwError::Script { line, msg } => format!(
                "What happened: The weight script is invalid (line {line}: {msg}).\nHow to fix: Put one weight in grams per line; `#` starts a comment."
            ),
            HwError::Io(e) => format!(
                "What happened: Could not read a hardware or script file ({e}).\nHow to fix: Check the path and permissions."
            ),
        };
    }

    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.starts_with("read config") {
        return format!(
            "What happened: The config file could not be read.\nHow to fix: Pass --config FILE or create etc/coaster.toml. Original: {msg}"
        );
    }

    if lower.contains("invalid configuration") || lower.contains(" must ") {
        return format!(
            "What happened: Configuration is invalid.\nLikely causes: A key has the wrong type or an out-of-range value.\nHow to fix: Edit the TOML config and try again. Original: {msg}"
        );
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Config problems exit with 2, hardware problems with 3, anything else with 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    match category(err) {
        "Config" => 2,
        "Hardware" => 3,
        _ => 1,
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    serde_json::json!({ "reason": category(err), "message": humanize(err) }).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_errors_are_config_errors() {
        let r = eyre::Report::new(BuildError::InvalidConfig("rate_hz must be >= 1"));
        assert_eq!(exit_code_for_error(&r), 2);
        assert!(humanize(&r).contains("rate_hz must be >= 1"));
    }

    #[test]
    fn validation_messages_are_config_errors() {
        let r = eyre::eyre!("stability.window must be >= 1");
        assert_eq!(exit_code_for_error(&r), 2);
        let v: serde_json::Value = serde_json::from_str(&format_error_json(&r)).unwrap();
        assert_eq!(v["reason"], "Config");
    }

    #[test]
    fn hardware_errors_exit_3() {
        let r = eyre::Report::new(HwError::Script {
            line: 4,
            msg: "\"x\": invalid float literal".into(),
        });
        assert_eq!(exit_code_for_error(&r), 3);
        assert!(humanize(&r).contains("line 4"));
    }
}
