//! Calendar frequencies and period arithmetic
//!
//! Provides the temporal granularity abstraction used by record
//! construction:
//! - [`Frequency`]: a fixed step size (multiple of a base calendar unit)
//! - [`Period`]: a timestamp snapped to the start of its bucket
//! - [`is_uniform`]: the constant-spacing predicate over a period index
//! - [`Frequency::infer`]: step-size inference from raw timestamps

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, TsFrameError};

/// Base calendar unit of a [`Frequency`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FreqUnit {
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl FreqUnit {
    /// Canonical alias used in frequency strings
    pub fn alias(&self) -> &'static str {
        match self {
            FreqUnit::Second => "S",
            FreqUnit::Minute => "T",
            FreqUnit::Hour => "H",
            FreqUnit::Day => "D",
            FreqUnit::Week => "W",
            FreqUnit::Month => "M",
            FreqUnit::Quarter => "Q",
            FreqUnit::Year => "Y",
        }
    }
}

/// A fixed step size on the time axis, e.g. `2H` or `3M`
///
/// Multiples are calendar-aware: month, quarter and year steps follow the
/// calendar rather than a fixed duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Frequency {
    multiple: u32,
    unit: FreqUnit,
}

impl Frequency {
    /// Create a frequency; the multiple must be at least 1
    pub fn new(multiple: u32, unit: FreqUnit) -> Result<Self> {
        if multiple == 0 {
            return Err(TsFrameError::FrequencyError(
                "frequency multiple must be at least 1".to_string(),
            ));
        }
        Ok(Self { multiple, unit })
    }

    pub fn multiple(&self) -> u32 {
        self.multiple
    }

    pub fn unit(&self) -> FreqUnit {
        self.unit
    }

    /// Infer a frequency from at least two timestamps
    ///
    /// Calendar-month spacing is preferred over raw-duration spacing, so
    /// month-start data infers `M` rather than `31D`; multiples of twelve
    /// months collapse to years. Irregular or sub-second spacing is an
    /// error, never a guess.
    pub fn infer(timestamps: &[NaiveDateTime]) -> Result<Self> {
        if timestamps.len() < 2 {
            return Err(TsFrameError::FrequencyError(
                "at least two timestamps are required to infer a frequency".to_string(),
            ));
        }

        if let Some(freq) = Self::infer_calendar(timestamps) {
            return Ok(freq);
        }

        let step = timestamps[1] - timestamps[0];
        if step <= Duration::zero() {
            return Err(TsFrameError::FrequencyError(
                "timestamps are not strictly increasing".to_string(),
            ));
        }
        for (i, w) in timestamps.windows(2).enumerate() {
            if w[1] - w[0] != step {
                return Err(TsFrameError::FrequencyError(format!(
                    "irregular spacing at position {}: {}s then {}s",
                    i + 1,
                    step.num_seconds(),
                    (w[1] - w[0]).num_seconds()
                )));
            }
        }
        if step.subsec_nanos() != 0 {
            return Err(TsFrameError::FrequencyError(
                "sub-second spacing is not supported".to_string(),
            ));
        }

        let secs = step.num_seconds();
        let (multiple, unit) = if secs % 604_800 == 0 {
            (secs / 604_800, FreqUnit::Week)
        } else if secs % 86_400 == 0 {
            (secs / 86_400, FreqUnit::Day)
        } else if secs % 3_600 == 0 {
            (secs / 3_600, FreqUnit::Hour)
        } else if secs % 60 == 0 {
            (secs / 60, FreqUnit::Minute)
        } else {
            (secs, FreqUnit::Second)
        };
        Frequency::new(multiple as u32, unit)
    }

    // Calendar spacing holds when every consecutive pair is exactly k months
    // apart, k taken from the first pair.
    fn infer_calendar(timestamps: &[NaiveDateTime]) -> Option<Frequency> {
        let (t0, t1) = (timestamps[0], timestamps[1]);
        let k = (t1.year() as i64 - t0.year() as i64) * 12
            + (t1.month() as i64 - t0.month() as i64);
        if k <= 0 || k > u32::MAX as i64 {
            return None;
        }
        if !timestamps.windows(2).all(|w| w[1] == add_months(w[0], k)) {
            return None;
        }
        if k % 12 == 0 {
            Frequency::new((k / 12) as u32, FreqUnit::Year).ok()
        } else {
            Frequency::new(k as u32, FreqUnit::Month).ok()
        }
    }

    // Snap a timestamp to the start of its base-unit bucket. The multiple
    // affects stepping, not anchoring: a 3M period starts at its own month.
    pub(crate) fn floor(&self, t: NaiveDateTime) -> NaiveDateTime {
        let date = t.date();
        match self.unit {
            FreqUnit::Second => t.with_nanosecond(0).unwrap(),
            FreqUnit::Minute => date.and_hms_opt(t.hour(), t.minute(), 0).unwrap(),
            FreqUnit::Hour => date.and_hms_opt(t.hour(), 0, 0).unwrap(),
            FreqUnit::Day => date.and_hms_opt(0, 0, 0).unwrap(),
            FreqUnit::Week => {
                let monday =
                    date - Duration::days(date.weekday().num_days_from_monday() as i64);
                monday.and_hms_opt(0, 0, 0).unwrap()
            }
            FreqUnit::Month => first_of_month(date.year(), date.month()),
            FreqUnit::Quarter => {
                first_of_month(date.year(), (date.month() - 1) / 3 * 3 + 1)
            }
            FreqUnit::Year => first_of_month(date.year(), 1),
        }
    }

    // Advance by `steps * multiple` base units.
    pub(crate) fn advance(&self, t: NaiveDateTime, steps: i64) -> NaiveDateTime {
        let n = steps * self.multiple as i64;
        match self.unit {
            FreqUnit::Second => t + Duration::seconds(n),
            FreqUnit::Minute => t + Duration::minutes(n),
            FreqUnit::Hour => t + Duration::hours(n),
            FreqUnit::Day => t + Duration::days(n),
            FreqUnit::Week => t + Duration::weeks(n),
            FreqUnit::Month => add_months(t, n),
            FreqUnit::Quarter => add_months(t, 3 * n),
            FreqUnit::Year => add_months(t, 12 * n),
        }
    }
}

impl FromStr for Frequency {
    type Err = TsFrameError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let split = s
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(s.len());
        let (num, alias) = s.split_at(split);
        if alias.is_empty() {
            return Err(TsFrameError::FrequencyError(format!(
                "missing unit in frequency {s:?}"
            )));
        }
        let multiple: u32 = if num.is_empty() {
            1
        } else {
            num.parse().map_err(|_| {
                TsFrameError::FrequencyError(format!("invalid multiple in frequency {s:?}"))
            })?
        };
        let unit = match alias.to_ascii_uppercase().as_str() {
            "S" | "SEC" => FreqUnit::Second,
            "T" | "MIN" => FreqUnit::Minute,
            "H" => FreqUnit::Hour,
            "D" => FreqUnit::Day,
            "W" => FreqUnit::Week,
            "M" | "MS" => FreqUnit::Month,
            "Q" | "QS" => FreqUnit::Quarter,
            "A" | "Y" | "AS" | "YS" => FreqUnit::Year,
            other => {
                return Err(TsFrameError::FrequencyError(format!(
                    "unsupported frequency alias {other:?}"
                )))
            }
        };
        Frequency::new(multiple, unit)
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.multiple == 1 {
            write!(f, "{}", self.unit.alias())
        } else {
            write!(f, "{}{}", self.multiple, self.unit.alias())
        }
    }
}

/// A timestamp snapped to the start of a fixed-width bucket at a given
/// frequency; identifies one time slot on an entity's axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Period {
    start: NaiveDateTime,
    freq: Frequency,
}

impl Period {
    /// Snap a timestamp to its bucket start at the given frequency
    pub fn new(timestamp: NaiveDateTime, freq: Frequency) -> Self {
        Self {
            start: freq.floor(timestamp),
            freq,
        }
    }

    /// Bucket start timestamp
    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn freq(&self) -> Frequency {
        self.freq
    }

    /// Frequency alias string, e.g. `"3M"`
    pub fn freqstr(&self) -> String {
        self.freq.to_string()
    }

    /// The period exactly one step later
    pub fn next(&self) -> Period {
        Period {
            start: self.freq.advance(self.start, 1),
            freq: self.freq,
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.start, self.freq)
    }
}

/// True iff the index advances by exactly one period per step: strictly
/// increasing, constant spacing, no duplicates, no gaps.
///
/// An index with fewer than two entries is uniform by definition.
pub fn is_uniform(index: &[Period]) -> bool {
    index.windows(2).all(|w| w[1] == w[0].next())
}

fn first_of_month(year: i32, month: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

fn add_months(t: NaiveDateTime, months: i64) -> NaiveDateTime {
    let total = t.year() as i64 * 12 + (t.month() as i64 - 1) + months;
    let year = total.div_euclid(12) as i32;
    let month = (total.rem_euclid(12) + 1) as u32;
    let day = t.day().min(days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day)
        .unwrap()
        .and_time(t.time())
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let first = NaiveDate::from_ymd_opt(year, month, 1).unwrap();
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    next.unwrap().signed_duration_since(first).num_days() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    #[test]
    fn test_parse_and_display() {
        let freq: Frequency = "3M".parse().unwrap();
        assert_eq!(freq.multiple(), 3);
        assert_eq!(freq.unit(), FreqUnit::Month);
        assert_eq!(freq.to_string(), "3M");

        let freq: Frequency = "2h".parse().unwrap();
        assert_eq!(freq.to_string(), "2H");

        let freq: Frequency = "min".parse().unwrap();
        assert_eq!(freq.to_string(), "T");

        let freq: Frequency = "W".parse().unwrap();
        assert_eq!(freq.multiple(), 1);
        assert_eq!(freq.unit(), FreqUnit::Week);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!("3X".parse::<Frequency>().is_err());
        assert!("0D".parse::<Frequency>().is_err());
        assert!("12".parse::<Frequency>().is_err());
    }

    #[test]
    fn test_floor_calendar_units() {
        let freq: Frequency = "M".parse().unwrap();
        assert_eq!(freq.floor(dt("2021-03-17 13:45")), dt("2021-03-01 00:00"));

        let freq: Frequency = "Q".parse().unwrap();
        assert_eq!(freq.floor(dt("2021-05-17 13:45")), dt("2021-04-01 00:00"));

        // 2021-01-01 is a Friday
        let freq: Frequency = "W".parse().unwrap();
        assert_eq!(freq.floor(dt("2021-01-01 13:45")), dt("2020-12-28 00:00"));

        let freq: Frequency = "2H".parse().unwrap();
        assert_eq!(freq.floor(dt("2021-01-01 03:45")), dt("2021-01-01 03:00"));
    }

    #[test]
    fn test_advance_clamps_month_end() {
        let freq: Frequency = "M".parse().unwrap();
        assert_eq!(freq.advance(dt("2021-01-31 00:00"), 1), dt("2021-02-28 00:00"));
    }

    #[test]
    fn test_period_next_three_months() {
        let freq: Frequency = "3M".parse().unwrap();
        let period = Period::new(dt("2021-03-15 09:00"), freq);
        assert_eq!(period.start(), dt("2021-03-01 00:00"));
        assert_eq!(period.next().start(), dt("2021-06-01 00:00"));
        assert_eq!(period.freqstr(), "3M");
    }

    #[test]
    fn test_is_uniform_2h() {
        let freq: Frequency = "2H".parse().unwrap();
        let index: Vec<Period> = ["2021-01-01 00:00", "2021-01-01 02:00", "2021-01-01 04:00"]
            .iter()
            .map(|s| Period::new(dt(s), freq))
            .collect();
        assert!(is_uniform(&index));
    }

    #[test]
    fn test_is_uniform_rejects_violations() {
        let freq: Frequency = "2H".parse().unwrap();
        let cases = [
            ["2021-01-01 00:00", "2021-01-01 02:00", "2021-01-01 02:00"],
            ["2021-01-01 00:00", "2021-01-01 02:00", "2021-01-01 03:00"],
            ["2021-01-01 04:00", "2021-01-01 02:00", "2021-01-01 00:00"],
        ];
        for case in cases {
            let index: Vec<Period> =
                case.iter().map(|s| Period::new(dt(s), freq)).collect();
            assert!(!is_uniform(&index), "expected non-uniform: {case:?}");
        }
    }

    #[test]
    fn test_is_uniform_trivial_index() {
        let freq: Frequency = "D".parse().unwrap();
        assert!(is_uniform(&[]));
        assert!(is_uniform(&[Period::new(dt("2021-01-01 00:00"), freq)]));
    }

    #[test]
    fn test_infer_daily() {
        let ts = vec![
            dt("2021-01-01 00:00"),
            dt("2021-01-02 00:00"),
            dt("2021-01-03 00:00"),
        ];
        assert_eq!(Frequency::infer(&ts).unwrap().to_string(), "D");
    }

    #[test]
    fn test_infer_two_hourly() {
        let ts = vec![dt("2021-01-01 00:00"), dt("2021-01-01 02:00")];
        assert_eq!(Frequency::infer(&ts).unwrap().to_string(), "2H");
    }

    #[test]
    fn test_infer_three_monthly() {
        let ts = vec![
            dt("2021-02-01 00:00"),
            dt("2021-05-01 00:00"),
            dt("2021-08-01 00:00"),
        ];
        assert_eq!(Frequency::infer(&ts).unwrap().to_string(), "3M");
    }

    #[test]
    fn test_infer_yearly() {
        let ts = vec![dt("2020-06-01 00:00"), dt("2021-06-01 00:00")];
        assert_eq!(Frequency::infer(&ts).unwrap().to_string(), "Y");
    }

    #[test]
    fn test_infer_fails_on_irregular_spacing() {
        let ts = vec![
            dt("2021-01-01 00:00"),
            dt("2021-01-02 00:00"),
            dt("2021-01-04 00:00"),
        ];
        assert!(matches!(
            Frequency::infer(&ts),
            Err(TsFrameError::FrequencyError(_))
        ));
    }

    #[test]
    fn test_infer_needs_two_timestamps() {
        assert!(Frequency::infer(&[dt("2021-01-01 00:00")]).is_err());
    }
}
