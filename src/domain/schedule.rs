//! Cron-style schedules for the external job scheduler.
//!
//! A [`CronSchedule`] is five [`CronField`]s rendered as a standard
//! `minute hour day-of-month month day-of-week` expression. Field values are
//! kept sorted and deduplicated, so composing the same value twice yields
//! one well-formed field rather than `15,15`.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

/// Every month has at least this many days.
const SHORTEST_MONTH_DAYS: u8 = 28;

/// One cron field: either `*` or an explicit set of values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum CronField {
    /// Matches every value (`*`).
    #[default]
    Any,
    /// Matches only the listed values. Never empty.
    Values(BTreeSet<u8>),
}

impl CronField {
    /// Wildcard field.
    #[must_use]
    pub const fn any() -> Self {
        Self::Any
    }

    /// Field matching a single value.
    #[must_use]
    pub fn single(value: u8) -> Self {
        Self::Values(BTreeSet::from([value]))
    }

    /// Builds a field from optional values.
    ///
    /// `None` or an empty list means "any". Repeated values collapse.
    #[must_use]
    pub fn from_values(values: Option<&[u8]>) -> Self {
        match values {
            Some(values) if !values.is_empty() => Self::Values(values.iter().copied().collect()),
            _ => Self::Any,
        }
    }

    fn check_range(&self, name: &str, min: u8, max: u8) -> Result<(), GatewayError> {
        if let Self::Values(values) = self
            && let Some(bad) = values.iter().find(|v| **v < min || **v > max)
        {
            return Err(GatewayError::InvalidRequest(format!(
                "cron {name} value {bad} out of range {min}-{max}"
            )));
        }
        Ok(())
    }
}

impl fmt::Display for CronField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("*"),
            Self::Values(values) => {
                let mut first = true;
                for v in values {
                    if !first {
                        f.write_str(",")?;
                    }
                    write!(f, "{v}")?;
                    first = false;
                }
                Ok(())
            }
        }
    }
}

/// Five-field cron schedule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct CronSchedule {
    /// Minute (0-59).
    pub minutes: CronField,
    /// Hour (0-23).
    pub hours: CronField,
    /// Day of month (1-31).
    pub days_of_month: CronField,
    /// Month (1-12).
    pub months: CronField,
    /// Day of week (0-6, Sunday = 0).
    pub days_of_week: CronField,
}

impl CronSchedule {
    /// Schedule firing once a month on `day_of_month` at `hour:minute`.
    ///
    /// Days past the 28th fire on every day from the 28th up to
    /// `day_of_month`, so months too short for the charge day still fire on
    /// their last day. The callback decides which firing is due.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] if any value is out of range.
    pub fn monthly(day_of_month: u8, hour: u8, minute: u8) -> Result<Self, GatewayError> {
        let days_of_month = if day_of_month > SHORTEST_MONTH_DAYS {
            let days: Vec<u8> = (SHORTEST_MONTH_DAYS..=day_of_month).collect();
            CronField::from_values(Some(&days))
        } else {
            CronField::single(day_of_month)
        };
        let schedule = Self {
            minutes: CronField::single(minute),
            hours: CronField::single(hour),
            days_of_month,
            months: CronField::any(),
            days_of_week: CronField::any(),
        };
        schedule.validate()?;
        Ok(schedule)
    }

    /// Checks every field against its allowed range.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] on the first out-of-range value.
    pub fn validate(&self) -> Result<(), GatewayError> {
        self.minutes.check_range("minute", 0, 59)?;
        self.hours.check_range("hour", 0, 23)?;
        self.days_of_month.check_range("day-of-month", 1, 31)?;
        self.months.check_range("month", 1, 12)?;
        self.days_of_week.check_range("day-of-week", 0, 6)
    }
}

impl fmt::Display for CronSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {}",
            self.minutes, self.hours, self.days_of_month, self.months, self.days_of_week
        )
    }
}

impl std::str::FromStr for CronSchedule {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s.split_whitespace().collect();
        let [minutes, hours, days_of_month, months, days_of_week] = fields.as_slice() else {
            return Err(GatewayError::InvalidRequest(format!(
                "cron expression must have 5 fields: {s}"
            )));
        };
        let schedule = Self {
            minutes: parse_field(minutes)?,
            hours: parse_field(hours)?,
            days_of_month: parse_field(days_of_month)?,
            months: parse_field(months)?,
            days_of_week: parse_field(days_of_week)?,
        };
        schedule.validate()?;
        Ok(schedule)
    }
}

fn parse_field(raw: &str) -> Result<CronField, GatewayError> {
    if raw == "*" {
        return Ok(CronField::Any);
    }
    let values = raw
        .split(',')
        .map(|v| {
            v.parse::<u8>()
                .map_err(|_| GatewayError::InvalidRequest(format!("invalid cron value: {v}")))
        })
        .collect::<Result<Vec<u8>, _>>()?;
    Ok(CronField::from_values(Some(&values)))
}

impl Serialize for CronSchedule {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CronSchedule {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn monthly_renders_five_fields() {
        let Ok(schedule) = CronSchedule::monthly(15, 0, 0) else {
            panic!("valid schedule");
        };
        assert_eq!(schedule.to_string(), "0 0 15 * *");
    }

    #[test]
    fn repeated_values_are_deduplicated() {
        let field = CronField::from_values(Some(&[15, 3, 15]));
        assert_eq!(field.to_string(), "3,15");
        assert_eq!(CronField::from_values(Some(&[15, 15])), CronField::single(15));
    }

    #[test]
    fn missing_or_wildcard_input_is_any() {
        assert_eq!(CronField::from_values(None), CronField::Any);
        assert_eq!(CronField::from_values(Some(&[])), CronField::Any);
    }

    #[test]
    fn late_charge_day_fires_from_the_28th() {
        let Ok(schedule) = CronSchedule::monthly(31, 0, 0) else {
            panic!("valid schedule");
        };
        assert_eq!(schedule.to_string(), "0 0 28,29,30,31 * *");
        let Ok(schedule) = CronSchedule::monthly(29, 6, 30) else {
            panic!("valid schedule");
        };
        assert_eq!(schedule.to_string(), "30 6 28,29 * *");
        let Ok(schedule) = CronSchedule::monthly(28, 0, 0) else {
            panic!("valid schedule");
        };
        assert_eq!(schedule.to_string(), "0 0 28 * *");
    }

    #[test]
    fn out_of_range_day_is_rejected() {
        assert!(CronSchedule::monthly(0, 0, 0).is_err());
        assert!(CronSchedule::monthly(32, 0, 0).is_err());
        assert!(CronSchedule::monthly(31, 24, 0).is_err());
    }

    #[test]
    fn parses_rendered_expression() {
        let Ok(schedule) = "30 6 1,15 * *".parse::<CronSchedule>() else {
            panic!("valid expression");
        };
        assert_eq!(schedule.days_of_month, CronField::from_values(Some(&[1, 15])));
        assert_eq!(schedule.to_string(), "30 6 1,15 * *");
        assert!("* * *".parse::<CronSchedule>().is_err());
    }
}
