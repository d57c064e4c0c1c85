use std::time::Duration;
use tracing::trace;

use crate::CountSource;
use crate::error::{HwError, Result};
use crate::util::wait_until_low_with_timeout;

pub struct Hx711 {
    dt: rppal::gpio::InputPin,
    sck: rppal::gpio::OutputPin,
    gain_pulses: u8, // 25, 26, 27 based on gain/channel
}

impl Hx711 {
    pub fn new(
        dt_pin: rppal::gpio::InputPin,
        mut sck_pin: rppal::gpio::OutputPin,
        gain_pulses: u8,
    ) -> Result<Self> {
        sck_pin.set_low(); // clock idle low
        Ok(Self {
            dt: dt_pin,
            sck: sck_pin,
            gain_pulses,
        })
    }

    /// Open the two BCM pins from the `[hardware]` config section.
    pub fn open(hw: &coaster_config::Hardware) -> Result<Self> {
        let gpio = rppal::gpio::Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))?;
        let dt = gpio
            .get(hw.hx711_dt)
            .map_err(|e| HwError::Gpio(format!("dt pin {}: {e}", hw.hx711_dt)))?
            .into_input();
        let sck = gpio
            .get(hw.hx711_sck)
            .map_err(|e| HwError::Gpio(format!("sck pin {}: {e}", hw.hx711_sck)))?
            .into_output();
        Self::new(dt, sck, hw.gain_pulses)
    }

    pub fn read_with_timeout(&mut self, timeout: Duration) -> Result<i32> {
        // DT low means a conversion is ready.
        let dt = &self.dt;
        wait_until_low_with_timeout(|| dt.is_high(), timeout, Duration::from_micros(200))?;

        // Clock out 24 bits
        let mut value: i32 = 0;
        for _ in 0..24 {
            self.sck.set_high();
            spin_delay_100ns();
            value = (value << 1) | i32::from(self.dt.is_high());
            self.sck.set_low();
            spin_delay_100ns();
        }

        // Extra pulses select gain/channel for the next conversion.
        for _ in 0..self.gain_pulses.saturating_sub(24) {
            self.sck.set_high();
            spin_delay_100ns();
            self.sck.set_low();
            spin_delay_100ns();
        }

        // Sign extend 24-bit
        if (value & 0x80_0000) != 0 {
            value |= !0xFF_FFFF;
        }
        trace!(raw = value, "hx711 raw read");
        Ok(value)
    }
}

impl CountSource for Hx711 {
    fn read_counts(&mut self, timeout: Duration) -> Result<i32> {
        self.read_with_timeout(timeout)
    }
}

#[inline(always)]
fn spin_delay_100ns() {
    std::hint::spin_loop();
}
