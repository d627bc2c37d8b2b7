//! Month grid construction for the calendar views.
//!
//! Weeks start on Monday. Cells outside the requested month are `None`
//! and must be rendered blank.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::fmt;

use crate::error::{LoungeError, Result};

/// One row of the grid, Monday first.
pub type Week = [Option<u32>; 7];

pub const WEEKDAY_NAMES: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Day numbers of a single month laid out week by week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthGrid {
    pub year: i32,
    pub month: u32,
    pub weeks: Vec<Week>,
}

impl MonthGrid {
    /// Number of real days in this month
    #[cfg(test)]
    pub fn day_count(&self) -> u32 {
        self.weeks
            .iter()
            .flatten()
            .filter_map(|cell| *cell)
            .max()
            .unwrap_or(0)
    }

    /// Calendar date of a day number, `None` when the day is outside the month
    pub fn date_of(&self, day: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, day)
    }

    /// ISO `YYYY-MM-DD` key for a day number
    pub fn iso_of(&self, day: u32) -> Option<String> {
        self.date_of(day).map(|d| d.format("%Y-%m-%d").to_string())
    }

    pub fn month_name(&self) -> &'static str {
        month_name(self.month)
    }

    /// (year, month) of the month before this one
    pub fn previous(&self) -> (i32, u32) {
        if self.month == 1 {
            (self.year - 1, 12)
        } else {
            (self.year, self.month - 1)
        }
    }

    /// (year, month) of the month after this one
    pub fn next(&self) -> (i32, u32) {
        if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        }
    }
}

impl fmt::Display for MonthGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {}", self.month_name(), self.year)?;
        let header: Vec<&str> = WEEKDAY_NAMES.iter().map(|d| &d[..2]).collect();
        writeln!(f, "{}", header.join(" "))?;
        for week in &self.weeks {
            let cells: Vec<String> = week
                .iter()
                .map(|cell| match cell {
                    Some(day) => format!("{:>2}", day),
                    None => "  ".to_string(),
                })
                .collect();
            writeln!(f, "{}", cells.join(" ").trim_end())?;
        }
        Ok(())
    }
}

pub fn month_name(month: u32) -> &'static str {
    match month {
        1..=12 => MONTH_NAMES[month as usize - 1],
        _ => "Unknown",
    }
}

/// Gregorian leap year rule
pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

fn check_month(month: u32) -> Result<()> {
    if (1..=12).contains(&month) {
        Ok(())
    } else {
        Err(LoungeError::InvalidArgument(format!(
            "month must be between 1 and 12, got {}",
            month
        )))
    }
}

pub fn days_in_month(year: i32, month: u32) -> Result<u32> {
    check_month(month)?;
    Ok(match month {
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 31,
    })
}

/// Inclusive first and last day of the month.
pub fn month_bounds(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate)> {
    let last_day = days_in_month(year, month)?;
    let out_of_range =
        || LoungeError::InvalidArgument(format!("year {} is out of the supported range", year));
    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(out_of_range)?;
    let last = NaiveDate::from_ymd_opt(year, month, last_day).ok_or_else(out_of_range)?;
    Ok((first, last))
}

/// Build the Monday-first day grid for a month.
///
/// Yields 4, 5 or 6 weeks of 7 cells each. Fails with `InvalidArgument`
/// when `month` is outside 1..=12.
pub fn build_month_grid(year: i32, month: u32) -> Result<MonthGrid> {
    let (first, last) = month_bounds(year, month)?;
    let offset = first.weekday().num_days_from_monday() as usize;

    let mut weeks = Vec::with_capacity(6);
    let mut week: Week = [None; 7];
    let mut col = offset;

    for day in 1..=last.day() {
        week[col] = Some(day);
        col += 1;
        if col == 7 {
            weeks.push(week);
            week = [None; 7];
            col = 0;
        }
    }
    if col > 0 {
        weeks.push(week);
    }

    Ok(MonthGrid { year, month, weeks })
}
