use serde::{Deserialize, Serialize};

use crate::types::{Channel, DUTY_MAX};

pub const HOURS_PER_DAY: usize = 24;

/// Factory day curve, one (white, blue, purple) set-point per hour.
/// Dark overnight, sunrise ramp from 09:00, full output at noon,
/// stepping back down through the evening.
pub const DEFAULT_DAY_CURVE: [[u16; 3]; HOURS_PER_DAY] = [
    [0, 0, 0],          // 00
    [0, 0, 0],          // 01
    [0, 0, 0],          // 02
    [0, 0, 0],          // 03
    [0, 0, 0],          // 04
    [0, 0, 0],          // 05
    [0, 0, 0],          // 06
    [0, 0, 0],          // 07
    [0, 0, 0],          // 08
    [200, 200, 0],      // 09
    [500, 500, 200],    // 10
    [900, 900, 300],    // 11
    [1000, 1000, 1000], // 12
    [1000, 1000, 800],  // 13
    [900, 900, 500],    // 14
    [800, 800, 300],    // 15
    [700, 800, 300],    // 16
    [600, 800, 300],    // 17
    [500, 800, 300],    // 18
    [400, 400, 250],    // 19
    [300, 300, 300],    // 20
    [0, 0, 0],          // 21
    [0, 0, 0],          // 22
    [0, 0, 0],          // 23
];

/// A single accepted schedule mutation, handed to the persistence
/// collaborator as a write-through record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScheduleDelta {
    pub hour: u8,
    pub channel: Channel,
    pub value: u16,
}

/// Persisted per-hour override. An absent field is the "unset"
/// sentinel: the factory value for that channel stays in effect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub white: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blue: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purple: Option<u16>,
}

impl HourOverride {
    pub fn is_empty(&self) -> bool {
        self.white.is_none() && self.blue.is_none() && self.purple.is_none()
    }

    pub fn channel(&self, channel: Channel) -> Option<u16> {
        match channel {
            Channel::White => self.white,
            Channel::Blue => self.blue,
            Channel::Purple => self.purple,
        }
    }

    pub fn set(&mut self, channel: Channel, value: u16) {
        match channel {
            Channel::White => self.white = Some(value),
            Channel::Blue => self.blue = Some(value),
            Channel::Purple => self.purple = Some(value),
        }
    }
}

/// The 24-hour brightness program. Always holds exactly 24 entries;
/// mutation goes through `set_channel`, which clamps values and
/// silently drops invalid hours (best-effort control loop, never an
/// error path).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleTable {
    entries: [[u16; 3]; HOURS_PER_DAY],
}

impl Default for ScheduleTable {
    fn default() -> Self {
        Self {
            entries: DEFAULT_DAY_CURVE,
        }
    }
}

impl ScheduleTable {
    pub fn entries(&self) -> &[[u16; 3]; HOURS_PER_DAY] {
        &self.entries
    }

    /// Set-points for the given hour of day. Out-of-range hours wrap,
    /// which also serves the `(hour + 1) % 24` midnight rollover.
    pub fn get(&self, hour: u8) -> [u16; 3] {
        self.entries[hour as usize % HOURS_PER_DAY]
    }

    /// Store one channel set-point. The value is clamped to the duty
    /// range before storage; an invalid hour leaves the table
    /// untouched and produces no delta.
    pub fn set_channel(&mut self, hour: i32, channel: Channel, value: u16) -> Option<ScheduleDelta> {
        if !(0..HOURS_PER_DAY as i32).contains(&hour) {
            return None;
        }

        let clamped = value.min(DUTY_MAX);
        self.entries[hour as usize][channel.index()] = clamped;
        Some(ScheduleDelta {
            hour: hour as u8,
            channel,
            value: clamped,
        })
    }

    /// Overlay persisted overrides onto the factory curve, called once
    /// at startup. Values are clamped the same way runtime updates are.
    pub fn apply_override(&mut self, hour: u8, overrides: HourOverride) {
        if hour as usize >= HOURS_PER_DAY {
            return;
        }
        for channel in Channel::ALL {
            if let Some(value) = overrides.channel(channel) {
                self.entries[hour as usize][channel.index()] = value.min(DUTY_MAX);
            }
        }
    }

    /// Restore the factory curve. Idempotent; clearing the persisted
    /// overrides is the store's job and happens independently.
    pub fn reset(&mut self) {
        self.entries = DEFAULT_DAY_CURVE;
    }

    /// Interpolated duties for the three channels at the given time.
    /// Each channel ramps independently from this hour's set-point
    /// toward the next hour's, by `minute / 60` of the way; preview
    /// forces the ramp to completion so the target hour shows at full
    /// value immediately.
    pub fn channel_duties(&self, hour: u8, minute: u8, preview_active: bool) -> [u16; 3] {
        let start = self.get(hour);
        let end = self.get(hour.wrapping_add(1) % HOURS_PER_DAY as u8);

        let progress = if preview_active {
            1.0
        } else {
            f32::from(minute % 60) / 60.0
        };

        let mut duties = [0u16; 3];
        for (i, duty) in duties.iter_mut().enumerate() {
            *duty = ramp(start[i], end[i], progress);
        }
        duties
    }
}

/// Directional ramp between two set-points. Truncates toward zero so
/// a rising ramp never overshoots `end` and a falling ramp never
/// undershoots it. For any `progress` in [0, 1] the result stays
/// between the two set-points.
fn ramp(start: u16, end: u16, progress: f32) -> u16 {
    let start = i32::from(start);
    let end = i32::from(end);

    let value = if end > start {
        start + (progress * (end - start) as f32) as i32
    } else if end < start {
        start - (progress * (start - end) as f32) as i32
    } else {
        start
    };

    value.clamp(0, i32::from(DUTY_MAX)) as u16
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn minute_zero_yields_start_values_exactly() {
        let table = ScheduleTable::default();

        assert_eq!(table.channel_duties(9, 0, false), [200, 200, 0]);
        assert_eq!(table.channel_duties(12, 0, false), [1000, 1000, 1000]);
    }

    #[test]
    fn ramp_is_directionally_monotone_and_bounded() {
        let table = ScheduleTable::default();

        // 09:00 -> 10:00 rises 200 -> 500 on white.
        let mut previous = 0;
        for minute in 0..60 {
            let [white, _, _] = table.channel_duties(9, minute, false);
            assert!(white >= 200 && white <= 500);
            assert!(white >= previous);
            previous = white;
        }

        // 13:00 -> 14:00 falls 800 -> 500 on purple.
        let mut previous = DUTY_MAX;
        for minute in 0..60 {
            let [_, _, purple] = table.channel_duties(13, minute, false);
            assert!(purple >= 500 && purple <= 800);
            assert!(purple <= previous);
            previous = purple;
        }
    }

    #[test]
    fn midpoint_of_rising_hour_is_halfway() {
        let table = ScheduleTable::default();

        // 10:30 sits halfway between {500,500,200} and {900,900,300}.
        assert_eq!(table.channel_duties(10, 30, false), [700, 700, 250]);
    }

    #[test]
    fn equal_set_points_hold_steady_all_hour() {
        let table = ScheduleTable::default();

        for minute in [0, 17, 42, 59] {
            assert_eq!(table.channel_duties(2, minute, false), [0, 0, 0]);
        }
    }

    #[test]
    fn preview_forces_full_progress() {
        let table = ScheduleTable::default();

        // Preview at virtual hour 11 shows hour 12's full values.
        assert_eq!(table.channel_duties(11, 0, true), [1000, 1000, 1000]);
    }

    #[test]
    fn hour_23_wraps_to_midnight() {
        let mut table = ScheduleTable::default();
        table.set_channel(0, Channel::White, 600);

        // 23:30 ramps white halfway from 0 toward hour 0's 600.
        assert_eq!(table.channel_duties(23, 30, false), [300, 0, 0]);
    }

    #[test]
    fn set_channel_clamps_to_duty_range() {
        let mut table = ScheduleTable::default();

        let delta = table.set_channel(9, Channel::White, 1500).unwrap();
        assert_eq!(
            delta,
            ScheduleDelta {
                hour: 9,
                channel: Channel::White,
                value: 1000
            }
        );
        assert_eq!(table.get(9), [1000, 200, 0]);
    }

    #[test]
    fn invalid_hour_is_a_silent_no_op() {
        let mut table = ScheduleTable::default();
        let before = table.clone();

        assert_eq!(table.set_channel(-1, Channel::White, 500), None);
        assert_eq!(table.set_channel(24, Channel::Blue, 500), None);
        assert_eq!(table, before);
    }

    #[test]
    fn overrides_round_trip_through_the_persisted_form() {
        let mut written = ScheduleTable::default();
        let mut overrides = HourOverride::default();
        for (channel, value) in [
            (Channel::White, 111),
            (Channel::Blue, 222),
            (Channel::Purple, 333),
        ] {
            let delta = written.set_channel(7, channel, value).unwrap();
            overrides.set(delta.channel, delta.value);
        }

        let mut loaded = ScheduleTable::default();
        loaded.apply_override(7, overrides);

        assert_eq!(loaded, written);
    }

    #[test]
    fn apply_override_clamps_and_ignores_bad_hours() {
        let mut table = ScheduleTable::default();
        table.apply_override(
            3,
            HourOverride {
                white: Some(4000),
                blue: None,
                purple: Some(10),
            },
        );
        table.apply_override(24, HourOverride::default());

        assert_eq!(table.get(3), [1000, 0, 10]);
    }

    #[test]
    fn reset_is_idempotent() {
        let mut table = ScheduleTable::default();
        table.set_channel(12, Channel::Purple, 1);

        table.reset();
        assert_eq!(table, ScheduleTable::default());
        table.reset();
        assert_eq!(table, ScheduleTable::default());
    }
}
