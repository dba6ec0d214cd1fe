use serde::{Deserialize, Serialize};

/// Fixed parameters of the fixture. Defaults match the shipped
/// hardware: a 10k NTC against a 3300 mV reference on a 10-bit ADC,
/// fan engaging between 40 and 60 degrees, one control tick per second.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureConfig {
    pub tick_period_ms: u64,
    pub temp_low_c: f32,
    pub temp_high_c: f32,
    pub reference_mv: f32,
    pub nominal_resistance_ohm: f32,
    pub nominal_temperature_c: f32,
    pub beta_coefficient: f32,
    pub timezone: String,
}

impl Default for FixtureConfig {
    fn default() -> Self {
        Self {
            tick_period_ms: 1_000,
            temp_low_c: 40.0,
            temp_high_c: 60.0,
            reference_mv: 3_300.0,
            nominal_resistance_ohm: 10_000.0,
            nominal_temperature_c: 25.0,
            beta_coefficient: 3_950.0,
            timezone: "Asia/Shanghai".to_string(),
        }
    }
}

impl FixtureConfig {
    pub fn sanitize(&mut self) {
        if !(self.temp_low_c.is_finite() && self.temp_high_c.is_finite())
            || self.temp_low_c >= self.temp_high_c
        {
            self.temp_low_c = 40.0;
            self.temp_high_c = 60.0;
        }
        if self.tick_period_ms == 0 {
            self.tick_period_ms = 1_000;
        }
        if !(self.beta_coefficient.is_finite() && self.beta_coefficient > 0.0) {
            self.beta_coefficient = 3_950.0;
        }
        if !(self.reference_mv.is_finite() && self.reference_mv > 0.0) {
            self.reference_mv = 3_300.0;
        }
        if !(self.nominal_resistance_ohm.is_finite() && self.nominal_resistance_ohm > 0.0) {
            self.nominal_resistance_ohm = 10_000.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_repairs_inverted_thresholds() {
        let mut config = FixtureConfig {
            temp_low_c: 70.0,
            temp_high_c: 50.0,
            ..FixtureConfig::default()
        };
        config.sanitize();

        assert_eq!(config.temp_low_c, 40.0);
        assert_eq!(config.temp_high_c, 60.0);
    }

    #[test]
    fn sanitize_repairs_divider_constants() {
        let mut config = FixtureConfig {
            reference_mv: 0.0,
            nominal_resistance_ohm: f32::NAN,
            ..FixtureConfig::default()
        };
        config.sanitize();

        assert_eq!(config.reference_mv, 3_300.0);
        assert_eq!(config.nominal_resistance_ohm, 10_000.0);

        // A repaired config keeps the sampler producing real readings.
        let temperature = crate::thermal::sample_celsius(&config, 512);
        assert!(temperature.is_finite());
    }

    #[test]
    fn sanitize_rejects_zero_tick_period() {
        let mut config = FixtureConfig {
            tick_period_ms: 0,
            ..FixtureConfig::default()
        };
        config.sanitize();

        assert_eq!(config.tick_period_ms, 1_000);
    }
}
