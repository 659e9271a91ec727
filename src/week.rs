//! Week window resolution.
//!
//! A [`WeekWindow`] is an inclusive 7-day range whose first day is a chosen
//! anchor weekday. The rollup uses Monday-start weeks; daily linking uses
//! Sunday-start weeks. Both go through the same type so the two conventions
//! only differ in the anchor they pass.
//!
//! All arithmetic is on [`NaiveDate`], so no timezone normalization can move
//! a date across a day boundary.

use crate::{Error, Result};
use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::Serialize;
use std::fmt;

/// Anchor used by the weekly rollup.
pub const ROLLUP_ANCHOR: Weekday = Weekday::Mon;

/// Anchor used when linking daily records into their week cohort.
pub const DAILY_ANCHOR: Weekday = Weekday::Sun;

/// How a run asked for its week.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeekSelector {
    /// The week containing an explicit date.
    Date(NaiveDate),
    /// An ISO week number; `year` falls back to the current year.
    IsoWeek { week: u32, year: Option<i32> },
    /// The week containing today.
    Current,
}

impl WeekSelector {
    /// Build a selector from optional CLI arguments.
    ///
    /// An explicit date wins over a week number. `year` is only meaningful
    /// together with `week`.
    pub fn from_args(date: Option<NaiveDate>, week: Option<u32>, year: Option<i32>) -> Self {
        match (date, week) {
            (Some(date), _) => WeekSelector::Date(date),
            (None, Some(week)) => WeekSelector::IsoWeek { week, year },
            (None, None) => WeekSelector::Current,
        }
    }

    /// Resolve into a Monday-start window, using `today` for the defaults.
    pub fn resolve(&self, today: NaiveDate) -> Result<WeekWindow> {
        match *self {
            WeekSelector::Date(date) => Ok(WeekWindow::containing(date, ROLLUP_ANCHOR)),
            WeekSelector::IsoWeek { week, year } => {
                WeekWindow::from_iso_week(year.unwrap_or_else(|| today.year()), week)
            }
            WeekSelector::Current => Ok(WeekWindow::containing(today, ROLLUP_ANCHOR)),
        }
    }
}

/// An inclusive 7-day date range starting on `anchor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WeekWindow {
    start: NaiveDate,
    end: NaiveDate,
    #[serde(skip)]
    anchor: Weekday,
    #[serde(skip)]
    iso: Option<(i32, u32)>,
}

impl WeekWindow {
    /// The window anchored on `anchor` that contains `date`.
    ///
    /// Steps back from `date` to the nearest `anchor` weekday on or before it.
    pub fn containing(date: NaiveDate, anchor: Weekday) -> Self {
        let back = days_since(date.weekday(), anchor);
        let start = date - Days::new(u64::from(back));
        Self::starting(start, anchor)
    }

    /// The Monday-start window for ISO week `week` of `year`.
    ///
    /// Week 1 is the week containing January 4th; later weeks are offset by
    /// whole weeks from its Monday.
    pub fn from_iso_week(year: i32, week: u32) -> Result<Self> {
        if !(1..=53).contains(&week) {
            return Err(Error::InvalidInput(format!(
                "ISO week must be 1-53, got {}",
                week
            )));
        }
        let fourth_jan = NaiveDate::from_ymd_opt(year, 1, 4)
            .ok_or_else(|| Error::InvalidInput(format!("year out of range: {}", year)))?;
        let week_one = WeekWindow::containing(fourth_jan, Weekday::Mon).start;
        let start = week_one
            .checked_add_days(Days::new(u64::from(week - 1) * 7))
            .ok_or_else(|| Error::InvalidInput(format!("week out of range: {}-W{}", year, week)))?;

        let mut window = Self::starting(start, Weekday::Mon);
        window.iso = Some((year, week));
        Ok(window)
    }

    fn starting(start: NaiveDate, anchor: Weekday) -> Self {
        Self {
            start,
            end: start + Days::new(6),
            anchor,
            iso: None,
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn anchor(&self) -> Weekday {
        self.anchor
    }

    /// Inclusive on both ends.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Display label: `ISO 2024-W01` for ISO selections, otherwise the range.
    pub fn label(&self) -> String {
        match self.iso {
            Some((year, week)) => format!("ISO {}-W{:02}", year, week),
            None => format!("{} → {}", self.start, self.end),
        }
    }
}

impl fmt::Display for WeekWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} → {}", self.start, self.end)
    }
}

/// Days to step back from `day` to reach the most recent `anchor` (0-6).
fn days_since(day: Weekday, anchor: Weekday) -> u32 {
    (7 + day.num_days_from_monday() - anchor.num_days_from_monday()) % 7
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_monday_window_contains_every_day_of_a_year() {
        let mut day = date(2023, 1, 1);
        while day < date(2025, 1, 1) {
            let window = WeekWindow::containing(day, Weekday::Mon);
            assert_eq!(window.start().weekday(), Weekday::Mon);
            assert!(window.contains(day), "{} not in {}", day, window);
            assert_eq!(window.end() - window.start(), chrono::Duration::days(6));
            day = day.succ_opt().unwrap();
        }
    }

    #[test]
    fn test_sunday_steps_back_six_days_for_monday_anchor() {
        let window = WeekWindow::containing(date(2024, 1, 7), Weekday::Mon);
        assert_eq!(window.start(), date(2024, 1, 1));
        assert_eq!(window.end(), date(2024, 1, 7));
    }

    #[test]
    fn test_sunday_anchor_starts_on_sunday() {
        // Wednesday 2024-01-03 belongs to the week of Sunday 2023-12-31
        let window = WeekWindow::containing(date(2024, 1, 3), Weekday::Sun);
        assert_eq!(window.start(), date(2023, 12, 31));
        assert_eq!(window.anchor(), Weekday::Sun);

        let window = WeekWindow::containing(date(2024, 1, 7), Weekday::Sun);
        assert_eq!(window.start(), date(2024, 1, 7));
    }

    #[test]
    fn test_window_bounds_are_inclusive() {
        let window = WeekWindow::containing(date(2024, 1, 1), Weekday::Mon);
        assert!(window.contains(date(2024, 1, 1)));
        assert!(window.contains(date(2024, 1, 7)));
        assert!(!window.contains(date(2024, 1, 8)));
        assert!(!window.contains(date(2023, 12, 31)));
    }

    #[test]
    fn test_iso_week_one_of_2021() {
        let window = WeekWindow::from_iso_week(2021, 1).unwrap();
        assert_eq!(window.start(), date(2021, 1, 4));
        assert_eq!(window.end(), date(2021, 1, 10));
        assert_eq!(window.label(), "ISO 2021-W01");
    }

    #[test]
    fn test_iso_week_one_can_start_in_previous_year() {
        // Jan 4 2026 is a Sunday, so week 1 starts Monday 2025-12-29
        let window = WeekWindow::from_iso_week(2026, 1).unwrap();
        assert_eq!(window.start(), date(2025, 12, 29));
    }

    #[test]
    fn test_iso_weeks_agree_with_chrono() {
        for year in 2015..2030 {
            for week in 1..=52 {
                let window = WeekWindow::from_iso_week(year, week).unwrap();
                let expected = NaiveDate::from_isoywd_opt(year, week, Weekday::Mon).unwrap();
                assert_eq!(window.start(), expected, "{}-W{}", year, week);
            }
        }
    }

    #[test]
    fn test_iso_week_out_of_range() {
        assert!(matches!(
            WeekWindow::from_iso_week(2024, 0),
            Err(Error::InvalidInput(_))
        ));
        assert!(WeekWindow::from_iso_week(2024, 54).is_err());
    }

    #[test]
    fn test_selector_resolution() {
        let today = date(2024, 5, 15);

        let window = WeekSelector::Current.resolve(today).unwrap();
        assert_eq!(window.start(), date(2024, 5, 13));
        assert_eq!(window.label(), "2024-05-13 → 2024-05-19");

        let window = WeekSelector::IsoWeek {
            week: 1,
            year: None,
        }
        .resolve(today)
        .unwrap();
        assert_eq!(window.start(), date(2024, 1, 1));

        let window = WeekSelector::from_args(Some(date(2024, 1, 3)), Some(9), None)
            .resolve(today)
            .unwrap();
        assert_eq!(window.start(), date(2024, 1, 1));
    }
}
