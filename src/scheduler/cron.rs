//! Cron expression parsing and next-fire computation.
//!
//! Accepts `MIN HOUR DOM MON DOW` or `SEC MIN HOUR DOM MON DOW`.
//! Each field takes `*`, a value, a list (`1,4,7`), a range (`MON-FRI`),
//! or a step (`*/15`, `5-30/5`). `?` is accepted in the two day fields and
//! means "unrestricted". When both day fields are restricted a day must
//! match both.

use chrono::{DateTime, Datelike, Days, FixedOffset, NaiveTime, SubsecRound, TimeZone, Timelike};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Searching further than this many days ahead gives up (e.g. `0 0 31 2 *`).
const MAX_LOOKAHEAD_DAYS: u64 = 366 * 8;

const MONTH_NAMES: &[&str] = &["JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC"];
const DAY_NAMES: &[&str] = &["SUN", "MON", "TUE", "WED", "THU", "FRI", "SAT"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CronError {
    #[error("cron expression '{0}' must have 5 or 6 fields")]
    FieldCount(String),

    #[error("invalid {field} field '{value}'")]
    InvalidField { field: &'static str, value: String },

    #[error("{field} value {value} is outside {min}-{max}")]
    OutOfRange {
        field: &'static str,
        value: u32,
        min: u32,
        max: u32,
    },
}

struct FieldSpec {
    name: &'static str,
    min: u32,
    max: u32,
    names: &'static [&'static str],
    allows_question_mark: bool,
}

const SECONDS: FieldSpec = FieldSpec { name: "second", min: 0, max: 59, names: &[], allows_question_mark: false };
const MINUTES: FieldSpec = FieldSpec { name: "minute", min: 0, max: 59, names: &[], allows_question_mark: false };
const HOURS: FieldSpec = FieldSpec { name: "hour", min: 0, max: 23, names: &[], allows_question_mark: false };
const DAYS_OF_MONTH: FieldSpec = FieldSpec { name: "day-of-month", min: 1, max: 31, names: &[], allows_question_mark: true };
const MONTHS: FieldSpec = FieldSpec { name: "month", min: 1, max: 12, names: MONTH_NAMES, allows_question_mark: false };
// 7 is accepted as a second spelling of Sunday
const DAYS_OF_WEEK: FieldSpec = FieldSpec { name: "day-of-week", min: 0, max: 7, names: DAY_NAMES, allows_question_mark: true };

/// A parsed cron schedule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CronSchedule {
    expression: String,
    seconds: BTreeSet<u32>,
    minutes: BTreeSet<u32>,
    hours: BTreeSet<u32>,
    /// `None` when unrestricted (`*` or `?`)
    days_of_month: Option<BTreeSet<u32>>,
    months: BTreeSet<u32>,
    /// `None` when unrestricted; Sunday is 0
    days_of_week: Option<BTreeSet<u32>>,
}

impl CronSchedule {
    pub fn parse(expression: &str) -> Result<Self, CronError> {
        let fields: Vec<&str> = expression.split_whitespace().collect();
        let (seconds, rest) = match fields.len() {
            5 => (BTreeSet::from([0]), &fields[..]),
            6 => (parse_field(fields[0], &SECONDS)?.unwrap_or_else(|| full(&SECONDS)), &fields[1..]),
            _ => return Err(CronError::FieldCount(expression.to_string())),
        };

        let days_of_week = parse_field(rest[4], &DAYS_OF_WEEK)?
            .map(|days| days.into_iter().map(|d| d % 7).collect());

        Ok(Self {
            expression: expression.trim().to_string(),
            seconds,
            minutes: parse_field(rest[0], &MINUTES)?.unwrap_or_else(|| full(&MINUTES)),
            hours: parse_field(rest[1], &HOURS)?.unwrap_or_else(|| full(&HOURS)),
            days_of_month: parse_field(rest[2], &DAYS_OF_MONTH)?,
            months: parse_field(rest[3], &MONTHS)?.unwrap_or_else(|| full(&MONTHS)),
            days_of_week,
        })
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// First fire time strictly after `after`, in the same offset
    pub fn next_after<Tz: TimeZone>(&self, after: &DateTime<Tz>) -> Option<DateTime<Tz>> {
        let start = after.clone().trunc_subsecs(0) + chrono::Duration::seconds(1);
        let local = start.naive_local();
        let first_day = local.date();

        for offset in 0..=MAX_LOOKAHEAD_DAYS {
            let day = first_day.checked_add_days(Days::new(offset))?;
            if !self.matches_day(day) {
                continue;
            }

            let floor = if offset == 0 { local.time() } else { NaiveTime::default() };
            if let Some(time) = self.first_time_from(floor) {
                if let Some(fire) = after.timezone().from_local_datetime(&day.and_time(time)).earliest() {
                    return Some(fire);
                }
            }
        }

        None
    }

    /// The next `count` fire times after `after`
    pub fn upcoming(&self, after: &DateTime<FixedOffset>, count: usize) -> Vec<DateTime<FixedOffset>> {
        let mut fires = Vec::with_capacity(count);
        let mut cursor = *after;
        while fires.len() < count {
            match self.next_after(&cursor) {
                Some(next) => {
                    fires.push(next);
                    cursor = next;
                }
                None => break,
            }
        }
        fires
    }

    fn matches_day(&self, day: chrono::NaiveDate) -> bool {
        if !self.months.contains(&day.month()) {
            return false;
        }
        let dom_ok = self.days_of_month.as_ref().map_or(true, |days| days.contains(&day.day()));
        let dow_ok = self
            .days_of_week
            .as_ref()
            .map_or(true, |days| days.contains(&day.weekday().num_days_from_sunday()));
        dom_ok && dow_ok
    }

    fn first_time_from(&self, floor: NaiveTime) -> Option<NaiveTime> {
        for &h in self.hours.range(floor.hour()..) {
            let min_floor = if h == floor.hour() { floor.minute() } else { 0 };
            for &m in self.minutes.range(min_floor..) {
                let sec_floor = if h == floor.hour() && m == floor.minute() { floor.second() } else { 0 };
                if let Some(&s) = self.seconds.range(sec_floor..).next() {
                    return NaiveTime::from_hms_opt(h, m, s);
                }
            }
        }
        None
    }
}

impl FromStr for CronSchedule {
    type Err = CronError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for CronSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expression)
    }
}

fn full(spec: &FieldSpec) -> BTreeSet<u32> {
    (spec.min..=spec.max).collect()
}

/// `Ok(None)` means the field is unrestricted
fn parse_field(field: &str, spec: &FieldSpec) -> Result<Option<BTreeSet<u32>>, CronError> {
    let invalid = || CronError::InvalidField {
        field: spec.name,
        value: field.to_string(),
    };

    if field == "*" {
        return Ok(None);
    }
    if field == "?" {
        return if spec.allows_question_mark { Ok(None) } else { Err(invalid()) };
    }

    let mut values = BTreeSet::new();
    for part in field.split(',') {
        let (base, step) = match part.split_once('/') {
            Some((base, step)) => {
                let step: u32 = step.parse().map_err(|_| invalid())?;
                if step == 0 {
                    return Err(invalid());
                }
                (base, Some(step))
            }
            None => (part, None),
        };

        let (lo, hi) = if base == "*" {
            (spec.min, spec.max)
        } else if let Some((lo, hi)) = base.split_once('-') {
            (parse_value(lo, spec)?, parse_value(hi, spec)?)
        } else {
            let value = parse_value(base, spec)?;
            // `5/10` runs from 5 to the end of the range
            (value, if step.is_some() { spec.max } else { value })
        };

        if lo > hi {
            return Err(invalid());
        }
        values.extend((lo..=hi).step_by(step.unwrap_or(1) as usize));
    }

    Ok(Some(values))
}

fn parse_value(token: &str, spec: &FieldSpec) -> Result<u32, CronError> {
    let value = match token.parse::<u32>() {
        Ok(value) => value,
        Err(_) => spec
            .names
            .iter()
            .position(|name| name.eq_ignore_ascii_case(token))
            .map(|index| spec.min + index as u32)
            .ok_or_else(|| CronError::InvalidField {
                field: spec.name,
                value: token.to_string(),
            })?,
    };

    if value < spec.min || value > spec.max {
        return Err(CronError::OutOfRange {
            field: spec.name,
            value,
            min: spec.min,
            max: spec.max,
        });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn daily_fires_later_the_same_day_then_next_day() {
        let cron = CronSchedule::parse("0 0 9 * * ?").unwrap();
        assert_eq!(cron.next_after(&utc(2025, 3, 10, 8, 59, 59)), Some(utc(2025, 3, 10, 9, 0, 0)));
        assert_eq!(cron.next_after(&utc(2025, 3, 10, 9, 0, 0)), Some(utc(2025, 3, 11, 9, 0, 0)));
    }

    #[test]
    fn quarterly_reminder_fires_on_the_fifth_of_quarter_months() {
        let cron = CronSchedule::parse("0 0 9 5 1,4,7,10 ?").unwrap();
        assert_eq!(cron.next_after(&utc(2025, 1, 5, 9, 0, 0)), Some(utc(2025, 4, 5, 9, 0, 0)));
        assert_eq!(cron.next_after(&utc(2025, 11, 20, 0, 0, 0)), Some(utc(2026, 1, 5, 9, 0, 0)));
    }

    #[test]
    fn five_field_form_has_zero_seconds() {
        let cron = CronSchedule::parse("30 10 * * *").unwrap();
        assert_eq!(cron.next_after(&utc(2025, 3, 10, 10, 29, 10)), Some(utc(2025, 3, 10, 10, 30, 0)));
    }

    #[test]
    fn weekday_names_and_ranges() {
        let cron = CronSchedule::parse("0 9 * * MON-FRI").unwrap();
        // 2025-03-08 is a Saturday
        assert_eq!(cron.next_after(&utc(2025, 3, 8, 12, 0, 0)), Some(utc(2025, 3, 10, 9, 0, 0)));
    }

    #[test]
    fn sunday_as_seven() {
        let cron = CronSchedule::parse("0 9 * * 7").unwrap();
        // 2025-03-09 is a Sunday
        assert_eq!(cron.next_after(&utc(2025, 3, 8, 12, 0, 0)), Some(utc(2025, 3, 9, 9, 0, 0)));
    }

    #[test]
    fn both_day_fields_restricted_must_both_match() {
        let cron = CronSchedule::parse("0 0 13 * FRI").unwrap();
        assert_eq!(cron.next_after(&utc(2025, 1, 1, 0, 0, 0)), Some(utc(2025, 6, 13, 0, 0, 0)));
    }

    #[test]
    fn steps_and_month_names() {
        let cron = CronSchedule::parse("*/15 * * feb *").unwrap();
        assert_eq!(cron.next_after(&utc(2025, 1, 31, 23, 59, 0)), Some(utc(2025, 2, 1, 0, 0, 0)));
        assert_eq!(cron.next_after(&utc(2025, 2, 1, 0, 1, 0)), Some(utc(2025, 2, 1, 0, 15, 0)));
    }

    #[test]
    fn evaluated_in_fixed_offset() {
        let cron = CronSchedule::parse("0 0 9 * * ?").unwrap();
        let cet = FixedOffset::east_opt(3600).unwrap();
        let after = utc(2025, 3, 10, 7, 0, 0).with_timezone(&cet);
        let next = cron.next_after(&after).unwrap();
        assert_eq!(next.with_timezone(&Utc), utc(2025, 3, 10, 8, 0, 0));
    }

    #[test]
    fn impossible_date_yields_none() {
        let cron = CronSchedule::parse("0 0 31 2 *").unwrap();
        assert_eq!(cron.next_after(&utc(2025, 1, 1, 0, 0, 0)), None);
    }

    #[test]
    fn upcoming_lists_consecutive_fires() {
        let cron = CronSchedule::parse("0 0 10 * * ?").unwrap();
        let after = utc(2025, 3, 10, 11, 0, 0).fixed_offset();
        let fires = cron.upcoming(&after, 3);
        assert_eq!(fires.len(), 3);
        assert_eq!(fires[0].with_timezone(&Utc), utc(2025, 3, 11, 10, 0, 0));
        assert_eq!(fires[2].with_timezone(&Utc), utc(2025, 3, 13, 10, 0, 0));
    }

    #[test]
    fn rejects_malformed_expressions() {
        assert!(matches!(CronSchedule::parse("0 9 * *"), Err(CronError::FieldCount(_))));
        assert!(matches!(CronSchedule::parse("0 61 * * *"), Err(CronError::OutOfRange { .. })));
        assert!(matches!(CronSchedule::parse("? 9 * * *"), Err(CronError::InvalidField { .. })));
        assert!(matches!(CronSchedule::parse("*/0 9 * * *"), Err(CronError::InvalidField { .. })));
        assert!(matches!(CronSchedule::parse("0 9 * * FUNDAY"), Err(CronError::InvalidField { .. })));
        assert!(matches!(CronSchedule::parse("0 20-10 * * *"), Err(CronError::InvalidField { .. })));
    }
}
