//! Heart-failure coverage schedule (solution) model.
//!
//! Weekend coverage is keyed by the Saturday of each weekend; holiday
//! coverage is keyed by the first day of each holiday block. A day-level
//! override map takes precedence over both when resolving the effective
//! assignee.

use std::collections::{BTreeMap, HashMap};

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use super::year::{weekend_start, AcademicYear};

/// A holiday block assigned as a unit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HolidayBlockAssignment {
    /// Assigned fellow id.
    pub fellow: String,
    /// Constituent days, chronological.
    pub days: Vec<NaiveDate>,
}

/// A complete weekend/holiday HF coverage schedule.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HfSchedule {
    /// Weekend-start Saturday -> fellow id.
    pub weekends: BTreeMap<NaiveDate, String>,
    /// Holiday-block start -> assignment.
    pub holiday_blocks: BTreeMap<NaiveDate, HolidayBlockAssignment>,
    /// Fellow -> weekend assignment count (fair-distribution weekends only).
    pub weekend_counts: HashMap<String, u32>,
    /// Fellow -> holiday-day count.
    pub holiday_day_counts: HashMap<String, u32>,
    /// Day-level overrides; take precedence over block-level assignment.
    pub overrides: BTreeMap<NaiveDate, String>,
}

impl HfSchedule {
    /// Creates an empty schedule.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns a weekend (by its Saturday) and bumps the weekend count.
    pub fn assign_weekend(&mut self, saturday: NaiveDate, fellow: impl Into<String>) {
        let fellow = fellow.into();
        if let Some(previous) = self.weekends.insert(saturday, fellow.clone()) {
            if let Some(n) = self.weekend_counts.get_mut(&previous) {
                *n = n.saturating_sub(1);
            }
        }
        *self.weekend_counts.entry(fellow).or_insert(0) += 1;
    }

    /// Marks a weekend covered without counting it toward the new
    /// assignee's weekend tally (used when a holiday block spans the
    /// weekend). A displaced occupant's counted tally is released, same
    /// as [`assign_weekend`](Self::assign_weekend).
    pub fn mark_weekend_covered(&mut self, saturday: NaiveDate, fellow: impl Into<String>) {
        if let Some(previous) = self.weekends.insert(saturday, fellow.into()) {
            if let Some(n) = self.weekend_counts.get_mut(&previous) {
                *n = n.saturating_sub(1);
            }
        }
    }

    /// Assigns a holiday block atomically and bumps the holiday-day count
    /// by the block length.
    pub fn assign_holiday_block(&mut self, days: Vec<NaiveDate>, fellow: impl Into<String>) {
        let fellow = fellow.into();
        let Some(start) = days.first().copied() else {
            return;
        };
        if let Some(previous) = self.holiday_blocks.insert(
            start,
            HolidayBlockAssignment {
                fellow: fellow.clone(),
                days: days.clone(),
            },
        ) {
            if let Some(n) = self.holiday_day_counts.get_mut(&previous.fellow) {
                *n = n.saturating_sub(previous.days.len() as u32);
            }
            // The old holder's weekend marks were never counted; drop them
            // directly so re-marking does not release a tally they hold
            // from an ordinary weekend elsewhere.
            for day in &previous.days {
                if let Some(saturday) = weekend_start(*day) {
                    if self.weekends.get(&saturday).map(String::as_str)
                        == Some(previous.fellow.as_str())
                    {
                        self.weekends.remove(&saturday);
                    }
                }
            }
        }
        *self.holiday_day_counts.entry(fellow.clone()).or_insert(0) += days.len() as u32;
        // Saturday and Sunday resolve to the same weekend; mark it once so
        // the second mark cannot displace the first and release a tally.
        let mut saturdays: Vec<NaiveDate> =
            days.iter().filter_map(|day| weekend_start(*day)).collect();
        saturdays.dedup();
        for saturday in saturdays {
            self.mark_weekend_covered(saturday, fellow.clone());
        }
    }

    /// The holiday block containing a date, if any.
    pub fn holiday_block_containing(&self, date: NaiveDate) -> Option<&HolidayBlockAssignment> {
        self.holiday_blocks
            .values()
            .find(|b| b.days.contains(&date))
    }

    /// Effective assignee for a date: day override, then weekend map, then
    /// holiday block.
    pub fn effective_assignee(&self, date: NaiveDate) -> Option<&str> {
        if let Some(fellow) = self.overrides.get(&date) {
            return Some(fellow.as_str());
        }
        if let Some(saturday) = weekend_start(date) {
            if let Some(fellow) = self.weekends.get(&saturday) {
                return Some(fellow.as_str());
            }
        }
        self.holiday_block_containing(date)
            .map(|b| b.fellow.as_str())
    }

    /// Whether a fellow effectively covers any day of the weekend starting
    /// at `saturday` (override-aware).
    pub fn covers_weekend(&self, fellow: &str, saturday: NaiveDate) -> bool {
        [saturday, saturday + Duration::days(1)]
            .iter()
            .any(|d| self.effective_assignee(*d) == Some(fellow))
    }

    /// Whether assigning `fellow` to the weekend at `saturday` would give
    /// them consecutive weekends, checking both the previous and the next
    /// weekend against effective (override-aware) assignment.
    pub fn consecutive_weekend_conflict(&self, fellow: &str, saturday: NaiveDate) -> bool {
        self.covers_weekend(fellow, saturday - Duration::days(7))
            || self.covers_weekend(fellow, saturday + Duration::days(7))
    }

    /// Weekend count for a fellow.
    pub fn weekend_count(&self, fellow: &str) -> u32 {
        self.weekend_counts.get(fellow).copied().unwrap_or(0)
    }

    /// Holiday-day count for a fellow.
    pub fn holiday_day_count(&self, fellow: &str) -> u32 {
        self.holiday_day_counts.get(fellow).copied().unwrap_or(0)
    }

    /// Combined load used for holiday-pool tie-breaking.
    pub fn total_load(&self, fellow: &str) -> u32 {
        self.weekend_count(fellow) + self.holiday_day_count(fellow)
    }

    /// Latest date on or before `date` the fellow is effectively assigned,
    /// scanning weekends, holiday blocks, and overrides.
    pub fn last_assignment_before(&self, fellow: &str, date: NaiveDate) -> Option<NaiveDate> {
        let mut best: Option<NaiveDate> = None;
        let mut consider = |d: NaiveDate| {
            if d < date && best.is_none_or(|b| d > b) {
                best = Some(d);
            }
        };
        for (saturday, f) in &self.weekends {
            if f == fellow {
                consider(*saturday);
                consider(*saturday + Duration::days(1));
            }
        }
        for block in self.holiday_blocks.values() {
            if block.fellow == fellow {
                for d in &block.days {
                    consider(*d);
                }
            }
        }
        for (d, f) in &self.overrides {
            if f == fellow {
                consider(*d);
            }
        }
        best
    }

    /// Whether a fellow satisfies the minimum HF spacing before `date`.
    pub fn spacing_ok(&self, fellow: &str, date: NaiveDate, min_days: i64) -> bool {
        match self.last_assignment_before(fellow, date) {
            Some(last) => (date - last).num_days() >= min_days,
            None => true,
        }
    }

    /// Uncovered Saturdays among the given candidates.
    pub fn uncovered_weekends(&self, saturdays: &[NaiveDate]) -> Vec<NaiveDate> {
        saturdays
            .iter()
            .filter(|s| !self.weekends.contains_key(s))
            .copied()
            .collect()
    }

    /// Whether any day of a holiday block already resolves to an assignee.
    pub fn holiday_days_covered(&self, days: &[NaiveDate]) -> bool {
        days.iter().any(|d| self.effective_assignee(*d).is_some())
    }

    /// Convenience: the weekends of the year this schedule leaves uncovered.
    pub fn gaps(&self, year: &AcademicYear) -> Vec<NaiveDate> {
        self.uncovered_weekends(&year.saturdays())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_assign_weekend_counts() {
        let mut s = HfSchedule::new();
        s.assign_weekend(d(2025, 7, 12), "f1");
        s.assign_weekend(d(2025, 7, 26), "f1");
        assert_eq!(s.weekend_count("f1"), 2);
        // Reassigning transfers the count.
        s.assign_weekend(d(2025, 7, 26), "f2");
        assert_eq!(s.weekend_count("f1"), 1);
        assert_eq!(s.weekend_count("f2"), 1);
    }

    #[test]
    fn test_holiday_block_marks_weekends() {
        let mut s = HfSchedule::new();
        // Thanksgiving 2025: Thu Nov 27 - Sun Nov 30.
        let days = vec![
            d(2025, 11, 27),
            d(2025, 11, 28),
            d(2025, 11, 29),
            d(2025, 11, 30),
        ];
        s.assign_holiday_block(days, "f1");
        assert_eq!(s.holiday_day_count("f1"), 4);
        // Saturday Nov 29 weekend is marked covered without a weekend count.
        assert_eq!(s.weekends.get(&d(2025, 11, 29)).map(String::as_str), Some("f1"));
        assert_eq!(s.weekend_count("f1"), 0);
        assert_eq!(s.effective_assignee(d(2025, 11, 28)), Some("f1"));
    }

    #[test]
    fn test_holiday_block_releases_displaced_weekend_count() {
        let mut s = HfSchedule::new();
        // f1 holds a counted ordinary weekend assignment on the Saturday
        // that a later holiday block absorbs.
        s.assign_weekend(d(2025, 11, 29), "f1");
        assert_eq!(s.weekend_count("f1"), 1);
        let days = vec![
            d(2025, 11, 27),
            d(2025, 11, 28),
            d(2025, 11, 29),
            d(2025, 11, 30),
        ];
        s.assign_holiday_block(days, "f2");
        assert_eq!(s.effective_assignee(d(2025, 11, 29)), Some("f2"));
        assert_eq!(s.weekend_count("f1"), 0);
        assert_eq!(s.weekend_count("f2"), 0);
    }

    #[test]
    fn test_holiday_block_reassignment_keeps_other_weekend_counts() {
        let mut s = HfSchedule::new();
        // f1 has a counted weekend elsewhere plus the holiday block.
        s.assign_weekend(d(2025, 12, 13), "f1");
        let days = vec![
            d(2025, 11, 27),
            d(2025, 11, 28),
            d(2025, 11, 29),
            d(2025, 11, 30),
        ];
        s.assign_holiday_block(days.clone(), "f1");
        assert_eq!(s.weekend_count("f1"), 1);
        // Handing the block to f2 must not touch f1's unrelated tally.
        s.assign_holiday_block(days, "f2");
        assert_eq!(s.weekend_count("f1"), 1);
        assert_eq!(s.holiday_day_count("f1"), 0);
        assert_eq!(s.holiday_day_count("f2"), 4);
        assert_eq!(s.effective_assignee(d(2025, 11, 29)), Some("f2"));
    }

    #[test]
    fn test_override_precedence() {
        let mut s = HfSchedule::new();
        s.assign_weekend(d(2025, 7, 12), "f1");
        s.overrides.insert(d(2025, 7, 13), "f2".to_string());
        assert_eq!(s.effective_assignee(d(2025, 7, 12)), Some("f1"));
        assert_eq!(s.effective_assignee(d(2025, 7, 13)), Some("f2"));
    }

    #[test]
    fn test_consecutive_weekend_uses_effective_assignment() {
        let mut s = HfSchedule::new();
        s.assign_weekend(d(2025, 7, 12), "f1");
        assert!(s.consecutive_weekend_conflict("f1", d(2025, 7, 19)));
        assert!(s.consecutive_weekend_conflict("f1", d(2025, 7, 5)));
        assert!(!s.consecutive_weekend_conflict("f1", d(2025, 7, 26)));
        // An override on the Sunday alone creates the conflict.
        s.overrides.insert(d(2025, 7, 20), "f2".to_string());
        assert!(s.consecutive_weekend_conflict("f2", d(2025, 7, 12)));
    }

    #[test]
    fn test_spacing() {
        let mut s = HfSchedule::new();
        s.assign_weekend(d(2025, 7, 12), "f1");
        // Sunday July 13 is the effective last day.
        assert!(!s.spacing_ok("f1", d(2025, 7, 20), 13));
        assert!(s.spacing_ok("f1", d(2025, 7, 26), 13));
        assert!(s.spacing_ok("f2", d(2025, 7, 14), 13));
    }

    #[test]
    fn test_uncovered_weekends() {
        let mut s = HfSchedule::new();
        let sats = vec![d(2025, 7, 5), d(2025, 7, 12), d(2025, 7, 19)];
        s.assign_weekend(d(2025, 7, 12), "f1");
        assert_eq!(s.uncovered_weekends(&sats), vec![d(2025, 7, 5), d(2025, 7, 19)]);
    }
}
