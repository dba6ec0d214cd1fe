use serde::Deserialize;

use crate::config::FixtureConfig;
use crate::preview::PreviewSequencer;
use crate::schedule::{ScheduleDelta, ScheduleTable};
use crate::thermal::{sample_celsius, ThermalController};
use crate::types::{Channel, ClockSample, FixtureStatus, OutputFrame, ThermalMode};

/// Partial settings update from the external UI. Every field is
/// optional; each colour channel applies independently when both the
/// hour and that channel's value are present.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct SettingsUpdate {
    pub hour: Option<i32>,
    pub white: Option<u16>,
    pub blue: Option<u16>,
    pub purple: Option<u16>,
    pub fan: Option<u16>,
}

/// Everything one control tick produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickOutput {
    pub frame: OutputFrame,
    pub temperature_c: f32,
    pub clock: ClockSample,
    pub preview_active: bool,
}

/// The fixture's control core: owns the schedule, the thermal
/// controller and the preview sequencer, and turns one clock/ADC
/// sample per period into one output frame. Mutations arrive through
/// `apply_update`, `reset_schedule` and `start_preview` only.
#[derive(Debug, Clone)]
pub struct LightEngine {
    config: FixtureConfig,
    schedule: ScheduleTable,
    thermal: ThermalController,
    preview: PreviewSequencer,
    last_output: TickOutput,
}

impl LightEngine {
    pub fn new(config: FixtureConfig, schedule: ScheduleTable) -> Self {
        Self {
            config,
            schedule,
            thermal: ThermalController::default(),
            preview: PreviewSequencer::default(),
            // Outputs stay dark until the first tick, like power-on.
            last_output: TickOutput {
                frame: OutputFrame::OFF,
                temperature_c: 0.0,
                clock: ClockSample::new(0, 0),
                preview_active: false,
            },
        }
    }

    pub fn config(&self) -> &FixtureConfig {
        &self.config
    }

    pub fn schedule(&self) -> &ScheduleTable {
        &self.schedule
    }

    pub fn thermal_mode(&self) -> ThermalMode {
        self.thermal.mode()
    }

    /// One control period: sample the sensor, derive the fan duty,
    /// pick the real or virtual time, interpolate the light channels.
    pub fn tick(&mut self, clock: ClockSample, raw_adc: u16) -> TickOutput {
        let temperature_c = sample_celsius(&self.config, raw_adc);
        let fan = self.thermal.compute_fan_duty(&self.config, temperature_c);

        let (effective, preview_active) = match self.preview.advance() {
            Some(virtual_hour) => (ClockSample::new(virtual_hour, 0), true),
            None => (clock, false),
        };

        let [white, blue, purple] =
            self.schedule
                .channel_duties(effective.hour, effective.minute, preview_active);

        let output = TickOutput {
            frame: OutputFrame {
                white,
                blue,
                purple,
                fan,
            },
            temperature_c,
            clock: effective,
            preview_active,
        };
        self.last_output = output;
        output
    }

    /// Apply a partial update. Accepted schedule mutations come back
    /// as deltas for the persistence collaborator; everything invalid
    /// is dropped silently. Takes effect on the next tick.
    pub fn apply_update(&mut self, update: SettingsUpdate) -> Vec<ScheduleDelta> {
        let mut deltas = Vec::new();

        if let Some(hour) = update.hour {
            for (channel, value) in [
                (Channel::White, update.white),
                (Channel::Blue, update.blue),
                (Channel::Purple, update.purple),
            ] {
                if let Some(value) = value {
                    deltas.extend(self.schedule.set_channel(hour, channel, value));
                }
            }
        }

        if let Some(fan) = update.fan {
            self.thermal.apply_override(fan);
        }

        deltas
    }

    /// Restore the factory curve. The caller is responsible for
    /// clearing the persisted overrides alongside.
    pub fn reset_schedule(&mut self) {
        self.schedule.reset();
    }

    pub fn start_preview(&mut self) {
        self.preview.start();
    }

    pub fn status(&self, time_synced: bool, timezone: &str) -> FixtureStatus {
        FixtureStatus {
            temperature: self.last_output.temperature_c,
            mode: self.thermal.mode().as_str(),
            manual_fan_duty: self.thermal.manual_duty(),
            preview_active: self.preview.is_active(),
            hour: self.last_output.clock.hour,
            minute: self.last_output.clock.minute,
            frame: self.last_output.frame,
            time_synced,
            timezone: timezone.to_string(),
        }
    }
}
