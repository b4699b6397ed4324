//! Calendar time, Julian day numbers and the animated time-of-day clock.

/// Julian day of the J2000.0 epoch (2000-01-01 12:00 TT).
pub const J2000: f64 = 2451545.0;

/// A calendar instant in UTC. `hour` is fractional and may leave `[0, 24)`;
/// the Julian day arithmetic absorbs the overflow.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DateTime {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    /// Fractional hours since UTC midnight.
    pub hour: f64,
}

impl DateTime {
    pub fn new(year: i32, month: u32, day: u32, hour: f64) -> Self {
        Self {
            year,
            month,
            day,
            hour,
        }
    }

    /// Build from a normalized time of day (`0.0` midnight, `0.5` noon).
    pub fn from_time_of_day(time_of_day: f64, year: i32, month: u32, day: u32) -> Self {
        Self::new(year, month, day, time_of_day.rem_euclid(1.0) * 24.0)
    }

    /// Local civil time shifted to UTC.
    pub fn from_local(year: i32, month: u32, day: u32, local_hour: f64, utc_offset: f64) -> Self {
        Self::new(year, month, day, local_hour - utc_offset)
    }

    /// Julian day number (Meeus, Gregorian calendar).
    pub fn julian_day(&self) -> f64 {
        julian_day(self.year, self.month, self.day, self.hour)
    }
}

/// Julian day for a Gregorian date and fractional UTC hour.
pub fn julian_day(year: i32, month: u32, day: u32, hour: f64) -> f64 {
    let (mut y, mut m) = (year as i64, month as i64);
    if m <= 2 {
        y -= 1;
        m += 12;
    }
    let a = y.div_euclid(100);
    let b = 2 - a + a.div_euclid(4);
    (365.25 * (y + 4716) as f64).floor() + (30.6001 * (m + 1) as f64).floor() + day as f64
        + b as f64
        - 1524.5
        + hour / 24.0
}

/// In-game time tracking for the day/night cycle.
#[derive(Clone, Debug)]
pub struct DayNightClock {
    /// Current time of day, normalized `[0.0, 1.0)`. 0.0 = midnight, 0.5 = noon.
    pub time_of_day: f64,
    /// Duration of one full day in real-time seconds.
    pub day_duration_seconds: f64,
    /// Whether the cycle is paused.
    pub paused: bool,
}

impl DayNightClock {
    /// Create a new clock starting at noon.
    pub fn new(day_duration_seconds: f64) -> Self {
        Self {
            time_of_day: 0.5,
            day_duration_seconds,
            paused: false,
        }
    }

    /// Clock starting at `hour` local time, frozen when the day duration is
    /// not positive.
    pub fn at_hour(hour: f64, day_duration_seconds: f64) -> Self {
        Self {
            time_of_day: (hour / 24.0).rem_euclid(1.0),
            day_duration_seconds,
            paused: day_duration_seconds <= 0.0,
        }
    }

    /// Advance the clock by `dt` real-time seconds. Returns whole days elapsed.
    pub fn tick(&mut self, dt: f64) -> u32 {
        if self.paused || self.day_duration_seconds <= 0.0 {
            return 0;
        }
        let advanced = self.time_of_day + dt / self.day_duration_seconds;
        self.time_of_day = advanced.rem_euclid(1.0);
        advanced.floor().max(0.0) as u32
    }

    /// Convert time-of-day to hours (0–24 range).
    pub fn hours(&self) -> f64 {
        self.time_of_day * 24.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_j2000_epoch() {
        let jd = DateTime::new(2000, 1, 1, 12.0).julian_day();
        assert!((jd - J2000).abs() < 1e-9, "J2000 = {jd}");
    }

    #[test]
    fn test_unix_epoch_noon() {
        let jd = DateTime::new(1970, 1, 1, 12.0).julian_day();
        assert!((jd - 2440588.0).abs() < 1e-9, "1970-01-01 noon = {jd}");
    }

    #[test]
    fn test_summer_solstice_2024() {
        let jd = DateTime::new(2024, 6, 21, 12.0).julian_day();
        assert!((jd - 2460483.0).abs() < 1e-9, "2024-06-21 noon = {jd}");
    }

    #[test]
    fn test_hour_contributes_fraction() {
        let midnight = DateTime::new(2024, 3, 1, 0.0).julian_day();
        let six = DateTime::new(2024, 3, 1, 6.0).julian_day();
        assert!((six - midnight - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_from_time_of_day() {
        let dt = DateTime::from_time_of_day(0.75, 2024, 6, 21);
        assert!((dt.hour - 18.0).abs() < 1e-9);
    }

    #[test]
    fn test_local_offset_crosses_midnight() {
        // 01:00 in UTC+2 is 23:00 UTC the previous day.
        let local = DateTime::from_local(2024, 6, 21, 1.0, 2.0).julian_day();
        let utc = DateTime::new(2024, 6, 20, 23.0).julian_day();
        assert!((local - utc).abs() < 1e-9);
    }

    #[test]
    fn test_clock_tick_wraps() {
        let mut clock = DayNightClock::new(100.0);
        clock.time_of_day = 0.9;
        let days = clock.tick(20.0);
        assert_eq!(days, 1);
        assert!((clock.time_of_day - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_paused_clock_does_not_advance() {
        let mut clock = DayNightClock::new(100.0);
        clock.paused = true;
        clock.tick(50.0);
        assert_eq!(clock.time_of_day, 0.5);
    }

    #[test]
    fn test_frozen_clock_at_hour() {
        let mut clock = DayNightClock::at_hour(6.0, 0.0);
        clock.tick(1000.0);
        assert!((clock.hours() - 6.0).abs() < 1e-9);
    }
}
