//! Résolution des dates de garde d'un mois et filtrage par cadence.

use crate::holidays::HolidayCalendar;
use crate::model::Recurrence;
use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Période cible au format `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Result<Self, String> {
        if !(1..=12).contains(&month) {
            return Err(format!("month out of range: {month}"));
        }
        Ok(Self { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (y, m) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| format!("expected YYYY-MM, got {s:?}"))?;
        let year = y.parse::<i32>().map_err(|e| format!("invalid year {y:?}: {e}"))?;
        let month = m.parse::<u32>().map_err(|e| format!("invalid month {m:?}: {e}"))?;
        Self::new(year, month)
    }
}

impl TryFrom<String> for YearMonth {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<YearMonth> for String {
    fn from(value: YearMonth) -> Self {
        value.to_string()
    }
}

/// Dates du mois tombant sur `weekday`, hors jours fériés, en ordre croissant.
///
/// Un mois invalide donne une séquence vide.
pub fn duty_dates(
    year: i32,
    month: u32,
    weekday: Weekday,
    holidays: &dyn HolidayCalendar,
) -> Vec<NaiveDate> {
    let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
        return Vec::new();
    };
    first
        .iter_days()
        .take_while(|d| d.month() == month)
        .filter(|d| d.weekday() == weekday && !holidays.is_holiday(*d))
        .collect()
}

/// Samedis éligibles du mois.
pub fn saturdays(period: YearMonth, holidays: &dyn HolidayCalendar) -> Vec<NaiveDate> {
    duty_dates(period.year, period.month, Weekday::Sat, holidays)
}

/// Sous-séquence des dates éligibles pour un lieu selon sa cadence.
pub fn dates_for_location(dates: &[NaiveDate], recurrence: Recurrence) -> Vec<NaiveDate> {
    match recurrence {
        Recurrence::Weekly | Recurrence::Unknown => dates.to_vec(),
        Recurrence::BiweeklyOdd => dates.iter().step_by(2).copied().collect(),
        Recurrence::BiweeklyEven => dates.iter().skip(1).step_by(2).copied().collect(),
        Recurrence::FirstOnly => dates.first().copied().into_iter().collect(),
        Recurrence::LastOnly => dates.last().copied().into_iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::holidays::{JapaneseHolidays, NoHolidays};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn saturdays_skip_holidays() {
        let period = YearMonth::new(2024, 11).unwrap();
        let dates = saturdays(period, &JapaneseHolidays);
        assert_eq!(
            dates,
            vec![d(2024, 11, 2), d(2024, 11, 9), d(2024, 11, 16), d(2024, 11, 30)]
        );
        assert_eq!(saturdays(period, &NoHolidays).len(), 5);
    }

    #[test]
    fn invalid_month_is_empty() {
        assert!(duty_dates(2025, 13, Weekday::Sat, &NoHolidays).is_empty());
    }

    #[test]
    fn recurrence_filters() {
        let dates = saturdays(YearMonth::new(2024, 11).unwrap(), &NoHolidays);
        assert_eq!(dates_for_location(&dates, Recurrence::BiweeklyOdd).len(), 3);
        assert_eq!(
            dates_for_location(&dates, Recurrence::BiweeklyEven),
            vec![d(2024, 11, 9), d(2024, 11, 23)]
        );
        assert_eq!(dates_for_location(&dates, Recurrence::FirstOnly), vec![d(2024, 11, 2)]);
        assert_eq!(dates_for_location(&dates, Recurrence::LastOnly), vec![d(2024, 11, 30)]);
        assert_eq!(dates_for_location(&dates, Recurrence::Unknown), dates);
        assert!(dates_for_location(&[], Recurrence::LastOnly).is_empty());
    }

    #[test]
    fn year_month_parsing() {
        let ym: YearMonth = "2025-03".parse().unwrap();
        assert_eq!(ym, YearMonth { year: 2025, month: 3 });
        assert_eq!(ym.to_string(), "2025-03");
        assert!("2025-00".parse::<YearMonth>().is_err());
        assert!("2025".parse::<YearMonth>().is_err());
        assert!(YearMonth::new(2024, 2).unwrap() < YearMonth::new(2024, 10).unwrap());
    }
}
