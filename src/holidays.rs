//! Jours fériés exclus du calendrier de garde.
//!
//! Le calendrier japonais suit les règles légales depuis 2000 : fêtes à
//! date fixe, « Happy Monday », équinoxes, anniversaire impérial selon
//! l'ère, dates spéciales 2019–2021, jour de report (férié tombant un
//! dimanche) et jour pris en sandwich entre deux fériés.

use chrono::{Datelike, NaiveDate, Weekday};
use std::collections::BTreeSet;
use tracing::warn;

/// Source de jours fériés.
pub trait HolidayCalendar {
    fn is_holiday(&self, date: NaiveDate) -> bool;
}

/// Aucun jour férié.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHolidays;

impl HolidayCalendar for NoHolidays {
    fn is_holiday(&self, _date: NaiveDate) -> bool {
        false
    }
}

/// Liste explicite de jours fériés.
#[derive(Debug, Default, Clone)]
pub struct HolidayList {
    dates: BTreeSet<NaiveDate>,
}

impl HolidayList {
    pub fn new(dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            dates: dates.into_iter().collect(),
        }
    }
}

impl HolidayCalendar for HolidayList {
    fn is_holiday(&self, date: NaiveDate) -> bool {
        self.dates.contains(&date)
    }
}

/// Jours fériés légaux japonais.
///
/// Années prises en charge : [`JP_SUPPORTED_YEARS`]. Les équinoxes sont
/// calculées par approximation et les règles sont celles de la loi en
/// vigueur fin 2024 ; hors de cette plage, seules les fêtes à date fixe et
/// les lundis sont connus, et l'absence d'équinoxe est journalisée.
#[derive(Debug, Default, Clone, Copy)]
pub struct JapaneseHolidays;

impl HolidayCalendar for JapaneseHolidays {
    fn is_holiday(&self, date: NaiveDate) -> bool {
        japanese_holidays(date.year()).contains(&date)
    }
}

/// Plage de validité du calcul des équinoxes.
pub const JP_SUPPORTED_YEARS: std::ops::RangeInclusive<i32> = 2000..=2099;

/// Tous les jours fériés japonais d'une année, reports compris.
pub fn japanese_holidays(year: i32) -> BTreeSet<NaiveDate> {
    let mut days = statutory(year);

    // jour pris en sandwich (hors dimanche)
    let sandwiched: Vec<NaiveDate> = days
        .iter()
        .filter_map(|d| d.succ_opt().and_then(|n| n.succ_opt()).map(|after| (*d, after)))
        .filter(|(_, after)| days.contains(after))
        .filter_map(|(d, _)| d.succ_opt())
        .filter(|mid| !days.contains(mid) && mid.weekday() != Weekday::Sun)
        .collect();
    days.extend(sandwiched);

    // report au premier jour non férié suivant
    let sundays: Vec<NaiveDate> = days
        .iter()
        .filter(|d| d.weekday() == Weekday::Sun)
        .copied()
        .collect();
    for sunday in sundays {
        let mut next = sunday.succ_opt();
        while let Some(day) = next {
            if !days.contains(&day) {
                days.insert(day);
                break;
            }
            next = day.succ_opt();
        }
    }

    days.retain(|d| d.year() == year);
    days
}

fn statutory(year: i32) -> BTreeSet<NaiveDate> {
    let mut days = BTreeSet::new();
    let mut fixed = |month: u32, day: u32| {
        if let Some(d) = NaiveDate::from_ymd_opt(year, month, day) {
            days.insert(d);
        }
    };

    fixed(1, 1);
    fixed(2, 11);
    fixed(4, 29);
    fixed(5, 3);
    fixed(5, 4);
    fixed(5, 5);
    fixed(11, 3);
    fixed(11, 23);

    match year {
        y if y >= 2020 => fixed(2, 23),
        2019 => {
            fixed(4, 30);
            fixed(5, 1);
            fixed(5, 2);
            fixed(10, 22);
        }
        _ => fixed(12, 23),
    }

    match year {
        2020 => {
            fixed(7, 23);
            fixed(7, 24);
            fixed(8, 10);
        }
        2021 => {
            fixed(7, 22);
            fixed(7, 23);
            fixed(8, 8);
        }
        _ => {
            if year >= 2016 {
                fixed(8, 11);
            }
        }
    }

    if let Some(d) = equinox(year, 3, 20.8431) {
        days.insert(d);
    }
    if let Some(d) = equinox(year, 9, 23.2488) {
        days.insert(d);
    }

    let olympic = year == 2020 || year == 2021;
    let mondays = [
        nth_monday(year, 1, 2),
        if year >= 2003 && !olympic {
            nth_monday(year, 7, 3)
        } else {
            None
        },
        if year >= 2003 {
            nth_monday(year, 9, 3)
        } else {
            None
        },
        if olympic { None } else { nth_monday(year, 10, 2) },
    ];
    days.extend(mondays.into_iter().flatten());

    days
}

fn nth_monday(year: i32, month: u32, n: u8) -> Option<NaiveDate> {
    NaiveDate::from_weekday_of_month_opt(year, month, Weekday::Mon, n)
}

/// Approximation valable de 1980 à 2099 ; `None` hors de [`JP_SUPPORTED_YEARS`].
fn equinox(year: i32, month: u32, base: f64) -> Option<NaiveDate> {
    if !JP_SUPPORTED_YEARS.contains(&year) {
        warn!(year, "equinox day unknown outside the supported years");
        return None;
    }
    let offset = f64::from(year - 1980);
    let day = (base + 0.242194 * offset - ((year - 1980) / 4) as f64).floor();
    NaiveDate::from_ymd_opt(year, month, day as u32)
}
