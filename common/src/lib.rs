pub mod config;
pub mod engine;
pub mod preview;
pub mod schedule;
pub mod thermal;
pub mod types;

pub use config::FixtureConfig;
pub use engine::{LightEngine, SettingsUpdate, TickOutput};
pub use preview::PreviewSequencer;
pub use schedule::{HourOverride, ScheduleDelta, ScheduleTable, DEFAULT_DAY_CURVE, HOURS_PER_DAY};
pub use thermal::{sample_celsius, ThermalController, ADC_MAX};
pub use types::{Channel, ClockSample, FixtureStatus, OutputFrame, ThermalMode, DUTY_MAX};
