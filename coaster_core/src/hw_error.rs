//! Maps `Box<dyn Error>` from trait boundaries to typed `CoreError`.
//!
//! `Scale` and `Notifier` return `Box<dyn Error + Send + Sync>`; this module
//! converts those to `CoreError`, with an optional feature-gated path for
//! `coaster_hardware::HwError` downcasting.

use crate::error::CoreError;

/// Map a scale-read error to a typed `CoreError`.
///
/// Known hardware error types are downcast first, then the message text is
/// inspected.
pub fn map_scale_error(e: &(dyn std::error::Error + 'static)) -> CoreError {
    #[cfg(feature = "hardware-errors")]
    {
        use coaster_hardware::error::HwError;
        if let Some(hw) = e.downcast_ref::<HwError>() {
            return match hw {
                HwError::Timeout | HwError::DataReadyTimeout => CoreError::Timeout,
                other => CoreError::HardwareFault(other.to_string()),
            };
        }
    }

    let s = e.to_string();
    if s.to_lowercase().contains("timeout") {
        CoreError::Timeout
    } else {
        CoreError::Hardware(s)
    }
}

/// Map a notifier error to `CoreError::Transport`.
pub fn map_notify_error(e: &(dyn std::error::Error + 'static)) -> CoreError {
    CoreError::Transport(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_text_maps_to_timeout() {
        let e = std::io::Error::other("read timeout after 150ms");
        assert!(matches!(map_scale_error(&e), CoreError::Timeout));
    }

    #[test]
    fn other_text_maps_to_hardware() {
        let e = std::io::Error::other("bus fault");
        match map_scale_error(&e) {
            CoreError::Hardware(s) => assert_eq!(s, "bus fault"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[cfg(feature = "hardware-errors")]
    #[test]
    fn hw_error_downcasts() {
        let e = coaster_hardware::error::HwError::DataReadyTimeout;
        assert!(matches!(map_scale_error(&e), CoreError::Timeout));
        let e = coaster_hardware::error::HwError::Gpio("pin 21 busy".into());
        assert!(matches!(map_scale_error(&e), CoreError::HardwareFault(_)));
    }
}
