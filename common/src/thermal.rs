use crate::config::FixtureConfig;
use crate::types::{ThermalMode, DUTY_MAX};

pub const ADC_MAX: u16 = 1023;

const KELVIN_OFFSET: f32 = 273.15;

/// Convert a raw ADC reading into a calibrated temperature using the
/// single-point beta approximation for the fixture's NTC divider.
///
/// Total over the whole ADC range: a shorted or open divider (raw 0 or
/// 1023) drives the divider math to an infinite or zero resistance,
/// which the approximation collapses to -273.15. Callers treat that as
/// an implausible-but-defined reading, never an error.
pub fn sample_celsius(config: &FixtureConfig, raw_adc: u16) -> f32 {
    let raw = f32::from(raw_adc.min(ADC_MAX));
    let voltage = (raw / f32::from(ADC_MAX)) * config.reference_mv;
    let resistance = ((config.reference_mv - voltage) * config.nominal_resistance_ohm) / voltage;

    let mut steinhart = (resistance / config.nominal_resistance_ohm).ln();
    steinhart /= config.beta_coefficient;
    steinhart += 1.0 / (config.nominal_temperature_c + KELVIN_OFFSET);
    1.0 / steinhart - KELVIN_OFFSET
}

/// Fan policy: Auto derives the duty from temperature, Manual pins it
/// to the last explicitly requested value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThermalController {
    mode: ThermalMode,
    manual_duty: u16,
}

impl Default for ThermalController {
    fn default() -> Self {
        Self {
            mode: ThermalMode::Auto,
            manual_duty: 0,
        }
    }
}

impl ThermalController {
    pub fn mode(&self) -> ThermalMode {
        self.mode
    }

    pub fn manual_duty(&self) -> u16 {
        self.manual_duty
    }

    /// Fan duty for the current tick. Auto saturates below
    /// `temp_low_c` and above `temp_high_c` and maps linearly in
    /// between, truncating toward zero like the rest of the duty math.
    pub fn compute_fan_duty(&self, config: &FixtureConfig, temperature_c: f32) -> u16 {
        if self.mode == ThermalMode::Manual {
            return self.manual_duty;
        }

        if temperature_c > config.temp_high_c {
            DUTY_MAX
        } else if temperature_c < config.temp_low_c {
            0
        } else {
            let span = config.temp_high_c - config.temp_low_c;
            let duty = (temperature_c - config.temp_low_c) * f32::from(DUTY_MAX) / span;
            (duty as i32).clamp(0, i32::from(DUTY_MAX)) as u16
        }
    }

    /// Arbitrate a fan update from the settings API: zero returns the
    /// controller to Auto, anything else pins Manual at that duty.
    /// The duty is clamped to the output range here, at input time, so
    /// a stored manual value can never exceed what the PWM stage
    /// accepts.
    pub fn apply_override(&mut self, value: u16) {
        if value == 0 {
            self.mode = ThermalMode::Auto;
        } else {
            self.mode = ThermalMode::Manual;
            self.manual_duty = value.min(DUTY_MAX);
        }
    }
}
