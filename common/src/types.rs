use chrono::Timelike;
use serde::{Deserialize, Serialize};

/// PWM duty-cycle ceiling shared by every output channel.
pub const DUTY_MAX: u16 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ThermalMode {
    Auto,
    Manual,
}

impl ThermalMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "AUTO",
            Self::Manual => "MANUAL",
        }
    }
}

/// The three light channels, in table column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Channel {
    White,
    Blue,
    Purple,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Self::White, Self::Blue, Self::Purple];

    pub fn index(self) -> usize {
        match self {
            Self::White => 0,
            Self::Blue => 1,
            Self::Purple => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::White => "white",
            Self::Blue => "blue",
            Self::Purple => "purple",
        }
    }
}

/// Wall-clock position within the day, as supplied once per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockSample {
    pub hour: u8,
    pub minute: u8,
}

impl ClockSample {
    pub fn new(hour: u8, minute: u8) -> Self {
        Self {
            hour: hour % 24,
            minute: minute % 60,
        }
    }

    pub fn from_datetime<T: Timelike>(now: &T) -> Self {
        Self::new(now.hour() as u8, now.minute() as u8)
    }
}

/// One tick's worth of output duties for the PWM boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OutputFrame {
    pub white: u16,
    pub blue: u16,
    pub purple: u16,
    pub fan: u16,
}

impl OutputFrame {
    pub const OFF: OutputFrame = OutputFrame {
        white: 0,
        blue: 0,
        purple: 0,
        fan: 0,
    };
}

/// Status snapshot for the HTTP layer.
#[derive(Debug, Clone, Serialize)]
pub struct FixtureStatus {
    pub temperature: f32,
    pub mode: &'static str,
    #[serde(rename = "manualFanDuty")]
    pub manual_fan_duty: u16,
    #[serde(rename = "previewActive")]
    pub preview_active: bool,
    pub hour: u8,
    pub minute: u8,
    pub frame: OutputFrame,
    #[serde(rename = "timeSynced")]
    pub time_synced: bool,
    pub timezone: String,
}
