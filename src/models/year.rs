//! Academic year, holidays, and half-month blocks.
//!
//! The academic year runs July 1 through June 30 and is divided into 24
//! half-month blocks (July first-half = block 0, June second-half = 23).
//! Blocks are the unit of vacation and ambulatory assignment and of
//! rotation lookup.
//!
//! # Holiday blocks
//! Each listed holiday expands to a contiguous run of 1-4 calendar days:
//! - Thanksgiving: 4-day Thursday-Sunday block
//! - A Monday holiday: Saturday-Monday block
//! - A Friday holiday: Friday-Sunday block
//! - Anything else: the single day

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// Number of half-month blocks in an academic year.
pub const BLOCKS_PER_YEAR: u8 = 24;

/// Builds a date, falling back to the epoch floor for out-of-range input.
/// All call sites construct calendar-valid month/day pairs.
fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MIN)
}

/// A named holiday observed on a single calendar date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Holiday {
    /// Display name, e.g. "Thanksgiving".
    pub name: String,
    /// Observed date.
    pub date: NaiveDate,
}

impl Holiday {
    /// Creates a holiday.
    pub fn new(name: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            name: name.into(),
            date,
        }
    }
}

/// The contiguous run of calendar days a holiday expands to for coverage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HolidayBlock {
    /// Name of the holiday this block covers.
    pub name: String,
    /// Constituent days, chronological.
    pub days: Vec<NaiveDate>,
}

impl HolidayBlock {
    /// First day of the block.
    pub fn start(&self) -> NaiveDate {
        self.days.first().copied().unwrap_or(NaiveDate::MIN)
    }

    /// Whether a date falls inside the block.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.days.contains(&date)
    }
}

/// One academic year (July 1 of `start_year` through June 30).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcademicYear {
    /// Calendar year of the July 1 anchor.
    pub start_year: i32,
    /// Observed holidays, chronological.
    pub holidays: Vec<Holiday>,
}

impl AcademicYear {
    /// Creates an academic year with no holidays.
    pub fn new(start_year: i32) -> Self {
        Self {
            start_year,
            holidays: Vec::new(),
        }
    }

    /// Sets the holiday list.
    pub fn with_holidays(mut self, holidays: Vec<Holiday>) -> Self {
        self.holidays = holidays;
        self
    }

    /// Fills in the standard 13-holiday observance calendar.
    ///
    /// Used when the stored configuration carries no holiday list.
    pub fn with_default_holidays(self) -> Self {
        let start_year = self.start_year;
        self.with_holidays(default_holidays(start_year))
    }

    /// July 1 anchor.
    pub fn start(&self) -> NaiveDate {
        ymd(self.start_year, 7, 1)
    }

    /// June 30 of the following calendar year (inclusive).
    pub fn end(&self) -> NaiveDate {
        ymd(self.start_year + 1, 6, 30)
    }

    /// Whether a date falls inside the academic year.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start() && date <= self.end()
    }

    /// All days of the year, chronological.
    pub fn days(&self) -> Vec<NaiveDate> {
        let mut out = Vec::with_capacity(366);
        let mut d = self.start();
        while d <= self.end() {
            out.push(d);
            d += Duration::days(1);
        }
        out
    }

    /// All Saturdays of the year, chronological.
    pub fn saturdays(&self) -> Vec<NaiveDate> {
        self.days()
            .into_iter()
            .filter(|d| d.weekday() == Weekday::Sat)
            .collect()
    }

    /// Whether a date is one of the observed holiday dates.
    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holidays.iter().any(|h| h.date == date)
    }

    /// The holiday observed on a date, if any.
    pub fn holiday_on(&self, date: NaiveDate) -> Option<&Holiday> {
        self.holidays.iter().find(|h| h.date == date)
    }

    /// Expands every holiday to its coverage block, chronological.
    pub fn holiday_blocks(&self) -> Vec<HolidayBlock> {
        let mut blocks: Vec<HolidayBlock> = self.holidays.iter().map(expand_holiday).collect();
        blocks.sort_by_key(HolidayBlock::start);
        blocks
    }

    /// Whether a date falls inside any holiday block.
    pub fn in_holiday_block(&self, date: NaiveDate) -> bool {
        self.holiday_blocks().iter().any(|b| b.contains(date))
    }

    /// Half-month block index for a date (`0..24`), or `None` outside the year.
    pub fn block_of(&self, date: NaiveDate) -> Option<u8> {
        if !self.contains(date) {
            return None;
        }
        let month_index = (date.month() + 5) % 12; // July = 0
        let half = if date.day() <= 15 { 0 } else { 1 };
        Some((month_index * 2 + half) as u8)
    }

    /// First day of a block.
    pub fn block_start(&self, block: u8) -> NaiveDate {
        let month_index = u32::from(block / 2);
        let month = month_index % 12 + 7;
        let (year, month) = if month > 12 {
            (self.start_year + 1, month - 12)
        } else {
            (self.start_year, month)
        };
        let day = if block % 2 == 0 { 1 } else { 16 };
        ymd(year, month, day)
    }

    /// Last day of a block (inclusive).
    pub fn block_end(&self, block: u8) -> NaiveDate {
        if block % 2 == 0 {
            self.block_start(block) + Duration::days(14)
        } else if block + 1 >= BLOCKS_PER_YEAR {
            self.end()
        } else {
            self.block_start(block + 1) - Duration::days(1)
        }
    }

    /// All days of a block, chronological.
    pub fn block_days(&self, block: u8) -> Vec<NaiveDate> {
        let mut out = Vec::new();
        let mut d = self.block_start(block);
        while d <= self.block_end(block) {
            out.push(d);
            d += Duration::days(1);
        }
        out
    }

    /// Resolves a month/day anchor (e.g. the junior call start) to its
    /// date inside this academic year.
    pub fn anchor(&self, month: u32, day: u32) -> NaiveDate {
        let year = if month >= 7 {
            self.start_year
        } else {
            self.start_year + 1
        };
        ymd(year, month, day)
    }
}

/// Whether a date is a Saturday or Sunday.
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// The Saturday anchoring a weekend date, or `None` for a weekday.
pub fn weekend_start(date: NaiveDate) -> Option<NaiveDate> {
    match date.weekday() {
        Weekday::Sat => Some(date),
        Weekday::Sun => Some(date - Duration::days(1)),
        _ => None,
    }
}

/// Week-of-month ordinal for a date (1-5).
pub fn week_of_month(date: NaiveDate) -> u8 {
    ((date.day() - 1) / 7 + 1) as u8
}

/// Expands one holiday to its coverage block.
pub fn expand_holiday(holiday: &Holiday) -> HolidayBlock {
    let d = holiday.date;
    let days: Vec<NaiveDate> = if holiday.name.to_lowercase().contains("thanksgiving") {
        (0..4).map(|i| d + Duration::days(i)).collect()
    } else {
        match d.weekday() {
            Weekday::Mon => vec![d - Duration::days(2), d - Duration::days(1), d],
            Weekday::Fri => vec![d, d + Duration::days(1), d + Duration::days(2)],
            _ => vec![d],
        }
    };
    HolidayBlock {
        name: holiday.name.clone(),
        days,
    }
}

/// The `n`-th given weekday of a month (1-based).
fn nth_weekday(year: i32, month: u32, weekday: Weekday, n: u32) -> NaiveDate {
    let first = ymd(year, month, 1);
    let offset = (7 + weekday.num_days_from_monday() - first.weekday().num_days_from_monday()) % 7;
    first + Duration::days(i64::from(offset) + 7 * (i64::from(n) - 1))
}

/// The last given weekday of a month.
fn last_weekday(year: i32, month: u32, weekday: Weekday) -> NaiveDate {
    let fifth = nth_weekday(year, month, weekday, 5);
    if fifth.month() == month {
        fifth
    } else {
        fifth - Duration::days(7)
    }
}

/// Standard 13-holiday observance calendar for an academic year.
pub fn default_holidays(start_year: i32) -> Vec<Holiday> {
    let y0 = start_year;
    let y1 = start_year + 1;
    vec![
        Holiday::new("Independence Day", ymd(y0, 7, 4)),
        Holiday::new("Labor Day", nth_weekday(y0, 9, Weekday::Mon, 1)),
        Holiday::new("Indigenous Peoples' Day", nth_weekday(y0, 10, Weekday::Mon, 2)),
        Holiday::new("Veterans Day", ymd(y0, 11, 11)),
        Holiday::new("Thanksgiving", nth_weekday(y0, 11, Weekday::Thu, 4)),
        Holiday::new("Christmas Eve", ymd(y0, 12, 24)),
        Holiday::new("Christmas Day", ymd(y0, 12, 25)),
        Holiday::new("New Year's Eve", ymd(y0, 12, 31)),
        Holiday::new("New Year's Day", ymd(y1, 1, 1)),
        Holiday::new("Martin Luther King Jr. Day", nth_weekday(y1, 1, Weekday::Mon, 3)),
        Holiday::new("Presidents' Day", nth_weekday(y1, 2, Weekday::Mon, 3)),
        Holiday::new("Memorial Day", last_weekday(y1, 5, Weekday::Mon)),
        Holiday::new("Juneteenth", ymd(y1, 6, 19)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_year_bounds() {
        let year = AcademicYear::new(2025);
        assert_eq!(year.start(), d(2025, 7, 1));
        assert_eq!(year.end(), d(2026, 6, 30));
        assert!(year.contains(d(2026, 1, 15)));
        assert!(!year.contains(d(2025, 6, 30)));
        assert_eq!(year.days().len(), 365);
    }

    #[test]
    fn test_block_of() {
        let year = AcademicYear::new(2025);
        assert_eq!(year.block_of(d(2025, 7, 1)), Some(0));
        assert_eq!(year.block_of(d(2025, 7, 15)), Some(0));
        assert_eq!(year.block_of(d(2025, 7, 16)), Some(1));
        assert_eq!(year.block_of(d(2025, 12, 31)), Some(11));
        assert_eq!(year.block_of(d(2026, 1, 1)), Some(12));
        assert_eq!(year.block_of(d(2026, 6, 30)), Some(23));
        assert_eq!(year.block_of(d(2025, 5, 1)), None);
    }

    #[test]
    fn test_block_ranges_cover_year() {
        let year = AcademicYear::new(2025);
        let mut total = 0;
        for b in 0..BLOCKS_PER_YEAR {
            let days = year.block_days(b);
            assert!(!days.is_empty());
            for day in &days {
                assert_eq!(year.block_of(*day), Some(b), "day {day} in block {b}");
            }
            total += days.len();
        }
        assert_eq!(total, 365);
    }

    #[test]
    fn test_friday_holiday_expands_to_weekend() {
        // July 4, 2025 is a Friday.
        let block = expand_holiday(&Holiday::new("Independence Day", d(2025, 7, 4)));
        assert_eq!(
            block.days,
            vec![d(2025, 7, 4), d(2025, 7, 5), d(2025, 7, 6)]
        );
    }

    #[test]
    fn test_monday_holiday_expands_backward() {
        // Labor Day 2025 is Monday September 1.
        let block = expand_holiday(&Holiday::new("Labor Day", d(2025, 9, 1)));
        assert_eq!(
            block.days,
            vec![d(2025, 8, 30), d(2025, 8, 31), d(2025, 9, 1)]
        );
    }

    #[test]
    fn test_thanksgiving_four_day_block() {
        let block = expand_holiday(&Holiday::new("Thanksgiving", d(2025, 11, 27)));
        assert_eq!(block.days.len(), 4);
        assert_eq!(block.start(), d(2025, 11, 27));
        assert!(block.contains(d(2025, 11, 30)));
    }

    #[test]
    fn test_midweek_holiday_single_day() {
        // Christmas 2025 is a Thursday.
        let block = expand_holiday(&Holiday::new("Christmas Day", d(2025, 12, 25)));
        assert_eq!(block.days, vec![d(2025, 12, 25)]);
    }

    #[test]
    fn test_default_holidays() {
        let holidays = default_holidays(2025);
        assert_eq!(holidays.len(), 13);
        let thanksgiving = holidays.iter().find(|h| h.name == "Thanksgiving").unwrap();
        assert_eq!(thanksgiving.date, d(2025, 11, 27));
        let memorial = holidays.iter().find(|h| h.name == "Memorial Day").unwrap();
        assert_eq!(memorial.date, d(2026, 5, 25));
        let year = AcademicYear::new(2025).with_default_holidays();
        for h in &year.holidays {
            assert!(year.contains(h.date), "{} outside year", h.name);
        }
    }

    #[test]
    fn test_weekend_helpers() {
        assert!(is_weekend(d(2025, 7, 5)));
        assert!(!is_weekend(d(2025, 7, 7)));
        assert_eq!(weekend_start(d(2025, 7, 6)), Some(d(2025, 7, 5)));
        assert_eq!(weekend_start(d(2025, 7, 5)), Some(d(2025, 7, 5)));
        assert_eq!(weekend_start(d(2025, 7, 7)), None);
        assert_eq!(week_of_month(d(2025, 7, 1)), 1);
        assert_eq!(week_of_month(d(2025, 7, 15)), 3);
        assert_eq!(week_of_month(d(2025, 7, 31)), 5);
    }

    #[test]
    fn test_anchor_resolution() {
        let year = AcademicYear::new(2025);
        assert_eq!(year.anchor(8, 1), d(2025, 8, 1));
        assert_eq!(year.anchor(2, 1), d(2026, 2, 1));
    }
}
