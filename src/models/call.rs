//! Primary-call schedule (solution) model.
//!
//! Day -> fellow map plus denormalized per-fellow counts, split by equity
//! category. The count maps must always equal the true tally of `days`;
//! [`CallSchedule::audit`] detects drift introduced by historical edits and
//! [`CallSchedule::repair`] fixes it.

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use super::fellow::Fellow;
use super::rules::CallRules;
use super::year::{is_weekend, AcademicYear};

/// Fairness category of a calendar day.
///
/// A holiday that falls on a Friday counts as weekend-or-holiday; any other
/// Friday counts as a weekday. This categorization is load-bearing for the
/// equity math and must not be changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EquityCategory {
    /// Ordinary weekday call.
    Weekday,
    /// Weekend or holiday call.
    WeekendOrHoliday,
}

/// Equity category of a date within an academic year.
pub fn equity_category(year: &AcademicYear, date: NaiveDate) -> EquityCategory {
    if is_weekend(date) || year.is_holiday(date) {
        EquityCategory::WeekendOrHoliday
    } else {
        EquityCategory::Weekday
    }
}

/// Stored-versus-actual disagreement for one fellow's count.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CountDrift {
    /// Fellow id.
    pub fellow: String,
    /// Which count map disagrees ("total", "weekday", "weekend").
    pub field: String,
    /// Stored denormalized value.
    pub stored: u32,
    /// True tally from the day map.
    pub actual: u32,
}

/// A fellow whose true assignment count exceeds their quota.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuotaExcess {
    /// Fellow id.
    pub fellow: String,
    /// True assignment count.
    pub actual: u32,
    /// Configured quota for the fellow's tier.
    pub quota: u32,
}

/// Result of a count audit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CallAudit {
    /// Count-map entries that disagree with the day map.
    pub drift: Vec<CountDrift>,
    /// Fellows over their configured quota.
    pub over_quota: Vec<QuotaExcess>,
}

impl CallAudit {
    /// Whether the schedule passed the audit clean.
    pub fn is_clean(&self) -> bool {
        self.drift.is_empty() && self.over_quota.is_empty()
    }
}

/// A complete primary-call schedule.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CallSchedule {
    /// Calendar day -> assigned fellow id.
    pub days: BTreeMap<NaiveDate, String>,
    /// Fellow -> total assignment count.
    pub counts: HashMap<String, u32>,
    /// Fellow -> weekday-category count.
    pub weekday_counts: HashMap<String, u32>,
    /// Fellow -> weekend-or-holiday-category count.
    pub weekend_counts: HashMap<String, u32>,
}

impl CallSchedule {
    /// Creates an empty schedule.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns a fellow to a day and updates the count maps.
    pub fn assign(&mut self, year: &AcademicYear, date: NaiveDate, fellow: impl Into<String>) {
        let fellow = fellow.into();
        if let Some(previous) = self.days.insert(date, fellow.clone()) {
            Self::decrement(year, date, &previous, &mut self.counts, &mut self.weekday_counts, &mut self.weekend_counts);
        }
        *self.counts.entry(fellow.clone()).or_insert(0) += 1;
        match equity_category(year, date) {
            EquityCategory::Weekday => *self.weekday_counts.entry(fellow).or_insert(0) += 1,
            EquityCategory::WeekendOrHoliday => {
                *self.weekend_counts.entry(fellow).or_insert(0) += 1
            }
        }
    }

    /// Clears a day's assignment and updates the count maps.
    pub fn unassign(&mut self, year: &AcademicYear, date: NaiveDate) -> Option<String> {
        let fellow = self.days.remove(&date)?;
        Self::decrement(year, date, &fellow, &mut self.counts, &mut self.weekday_counts, &mut self.weekend_counts);
        Some(fellow)
    }

    fn decrement(
        year: &AcademicYear,
        date: NaiveDate,
        fellow: &str,
        counts: &mut HashMap<String, u32>,
        weekday_counts: &mut HashMap<String, u32>,
        weekend_counts: &mut HashMap<String, u32>,
    ) {
        if let Some(n) = counts.get_mut(fellow) {
            *n = n.saturating_sub(1);
        }
        let map = match equity_category(year, date) {
            EquityCategory::Weekday => weekday_counts,
            EquityCategory::WeekendOrHoliday => weekend_counts,
        };
        if let Some(n) = map.get_mut(fellow) {
            *n = n.saturating_sub(1);
        }
    }

    /// Fellow assigned on a day, if any.
    pub fn fellow_on(&self, date: NaiveDate) -> Option<&str> {
        self.days.get(&date).map(String::as_str)
    }

    /// All call dates for a fellow, chronological.
    pub fn calls_for(&self, fellow: &str) -> Vec<NaiveDate> {
        self.days
            .iter()
            .filter(|(_, f)| f.as_str() == fellow)
            .map(|(d, _)| *d)
            .collect()
    }

    /// Total assignment count for a fellow.
    pub fn count_for(&self, fellow: &str) -> u32 {
        self.counts.get(fellow).copied().unwrap_or(0)
    }

    /// Category count for a fellow.
    pub fn category_count(&self, fellow: &str, category: EquityCategory) -> u32 {
        let map = match category {
            EquityCategory::Weekday => &self.weekday_counts,
            EquityCategory::WeekendOrHoliday => &self.weekend_counts,
        };
        map.get(fellow).copied().unwrap_or(0)
    }

    /// Latest call date for a fellow strictly before `date`.
    pub fn last_call_before(&self, fellow: &str, date: NaiveDate) -> Option<NaiveDate> {
        self.days
            .range(..date)
            .rev()
            .find(|(_, f)| f.as_str() == fellow)
            .map(|(d, _)| *d)
    }

    /// Earliest call date for a fellow strictly after `date`.
    pub fn next_call_after(&self, fellow: &str, date: NaiveDate) -> Option<NaiveDate> {
        self.days
            .range(date..)
            .filter(|(d, _)| **d > date)
            .find(|(_, f)| f.as_str() == fellow)
            .map(|(d, _)| *d)
    }

    /// Whether a fellow holds the Saturday exactly 7 days before or after
    /// a Saturday `date`.
    pub fn adjacent_saturday(&self, fellow: &str, date: NaiveDate) -> bool {
        if date.weekday() != Weekday::Sat {
            return false;
        }
        [date - chrono::Duration::days(7), date + chrono::Duration::days(7)]
            .iter()
            .any(|d| self.fellow_on(*d) == Some(fellow))
    }

    /// True per-fellow tallies recomputed from the day map.
    fn recount(&self, year: &AcademicYear) -> (HashMap<String, u32>, HashMap<String, u32>, HashMap<String, u32>) {
        let mut counts: HashMap<String, u32> = HashMap::new();
        let mut weekday: HashMap<String, u32> = HashMap::new();
        let mut weekend: HashMap<String, u32> = HashMap::new();
        for (date, fellow) in &self.days {
            *counts.entry(fellow.clone()).or_insert(0) += 1;
            match equity_category(year, *date) {
                EquityCategory::Weekday => *weekday.entry(fellow.clone()).or_insert(0) += 1,
                EquityCategory::WeekendOrHoliday => {
                    *weekend.entry(fellow.clone()).or_insert(0) += 1
                }
            }
        }
        (counts, weekday, weekend)
    }

    /// Audits the count maps against the day map and per-tier quotas.
    ///
    /// Detects drift introduced by historical edits; never mutates.
    pub fn audit(&self, year: &AcademicYear, roster: &[Fellow], rules: &CallRules) -> CallAudit {
        let (counts, weekday, weekend) = self.recount(year);
        let mut audit = CallAudit::default();

        let mut fellows: Vec<&String> = self
            .counts
            .keys()
            .chain(self.weekday_counts.keys())
            .chain(self.weekend_counts.keys())
            .chain(counts.keys())
            .collect();
        fellows.sort_unstable();
        fellows.dedup();

        for fellow in fellows {
            let pairs = [
                ("total", self.counts.get(fellow), counts.get(fellow)),
                ("weekday", self.weekday_counts.get(fellow), weekday.get(fellow)),
                ("weekend", self.weekend_counts.get(fellow), weekend.get(fellow)),
            ];
            for (field, stored, actual) in pairs {
                let stored = stored.copied().unwrap_or(0);
                let actual = actual.copied().unwrap_or(0);
                if stored != actual {
                    audit.drift.push(CountDrift {
                        fellow: fellow.clone(),
                        field: field.to_string(),
                        stored,
                        actual,
                    });
                }
            }
        }

        for fellow in roster {
            let actual = counts.get(&fellow.id).copied().unwrap_or(0);
            let quota = rules.quota_for(fellow.level);
            if actual > quota {
                audit.over_quota.push(QuotaExcess {
                    fellow: fellow.id.clone(),
                    actual,
                    quota,
                });
            }
        }

        audit
    }

    /// Returns a repaired copy: counts recomputed from the day map, and the
    /// most recent excess assignments removed for any over-quota fellow.
    pub fn repair(&self, year: &AcademicYear, roster: &[Fellow], rules: &CallRules) -> CallSchedule {
        let mut fixed = self.clone();
        let (counts, weekday, weekend) = fixed.recount(year);
        fixed.counts = counts;
        fixed.weekday_counts = weekday;
        fixed.weekend_counts = weekend;

        for fellow in roster {
            let quota = rules.quota_for(fellow.level);
            let mut dates = fixed.calls_for(&fellow.id);
            while dates.len() as u32 > quota {
                if let Some(newest) = dates.pop() {
                    fixed.unassign(year, newest);
                }
            }
        }

        fixed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PgyLevel;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn year() -> AcademicYear {
        AcademicYear::new(2025).with_default_holidays()
    }

    #[test]
    fn test_equity_category() {
        let year = year();
        // July 4, 2025 is a Friday holiday: weekend-or-holiday.
        assert_eq!(
            equity_category(&year, d(2025, 7, 4)),
            EquityCategory::WeekendOrHoliday
        );
        // An ordinary Friday is a weekday.
        assert_eq!(
            equity_category(&year, d(2025, 7, 11)),
            EquityCategory::Weekday
        );
        // Saturday.
        assert_eq!(
            equity_category(&year, d(2025, 7, 12)),
            EquityCategory::WeekendOrHoliday
        );
        // Thanksgiving Thursday.
        assert_eq!(
            equity_category(&year, d(2025, 11, 27)),
            EquityCategory::WeekendOrHoliday
        );
    }

    #[test]
    fn test_assign_unassign_counts() {
        let year = year();
        let mut s = CallSchedule::new();
        s.assign(&year, d(2025, 7, 7), "f1"); // Monday
        s.assign(&year, d(2025, 7, 12), "f1"); // Saturday
        assert_eq!(s.count_for("f1"), 2);
        assert_eq!(s.category_count("f1", EquityCategory::Weekday), 1);
        assert_eq!(s.category_count("f1", EquityCategory::WeekendOrHoliday), 1);

        assert_eq!(s.unassign(&year, d(2025, 7, 12)), Some("f1".to_string()));
        assert_eq!(s.count_for("f1"), 1);
        assert_eq!(s.category_count("f1", EquityCategory::WeekendOrHoliday), 0);
        assert_eq!(s.unassign(&year, d(2025, 7, 12)), None);
    }

    #[test]
    fn test_reassign_replaces_occupant() {
        let year = year();
        let mut s = CallSchedule::new();
        s.assign(&year, d(2025, 7, 7), "f1");
        s.assign(&year, d(2025, 7, 7), "f2");
        assert_eq!(s.fellow_on(d(2025, 7, 7)), Some("f2"));
        assert_eq!(s.count_for("f1"), 0);
        assert_eq!(s.count_for("f2"), 1);
    }

    #[test]
    fn test_neighbor_queries() {
        let year = year();
        let mut s = CallSchedule::new();
        s.assign(&year, d(2025, 7, 7), "f1");
        s.assign(&year, d(2025, 7, 14), "f1");
        s.assign(&year, d(2025, 7, 10), "f2");
        assert_eq!(s.last_call_before("f1", d(2025, 7, 14)), Some(d(2025, 7, 7)));
        assert_eq!(s.next_call_after("f1", d(2025, 7, 7)), Some(d(2025, 7, 14)));
        assert_eq!(s.last_call_before("f1", d(2025, 7, 7)), None);
        assert_eq!(s.calls_for("f1"), vec![d(2025, 7, 7), d(2025, 7, 14)]);
    }

    #[test]
    fn test_adjacent_saturday() {
        let year = year();
        let mut s = CallSchedule::new();
        s.assign(&year, d(2025, 7, 12), "f1"); // Saturday
        assert!(s.adjacent_saturday("f1", d(2025, 7, 19)));
        assert!(s.adjacent_saturday("f1", d(2025, 7, 5)));
        assert!(!s.adjacent_saturday("f1", d(2025, 7, 26)));
        assert!(!s.adjacent_saturday("f2", d(2025, 7, 19)));
        // Non-Saturday dates never conflict.
        assert!(!s.adjacent_saturday("f1", d(2025, 7, 13)));
    }

    #[test]
    fn test_audit_detects_drift_and_excess() {
        let year = year();
        let roster = vec![Fellow::new("f1", "One", PgyLevel::Pgy5)];
        let mut rules = CallRules::default();
        rules.quotas.insert(PgyLevel::Pgy5, 2);

        let mut s = CallSchedule::new();
        s.assign(&year, d(2025, 7, 7), "f1");
        s.assign(&year, d(2025, 7, 14), "f1");
        s.assign(&year, d(2025, 7, 21), "f1");
        // Tamper with the denormalized count.
        s.counts.insert("f1".to_string(), 9);

        let audit = s.audit(&year, &roster, &rules);
        assert!(!audit.is_clean());
        assert!(audit
            .drift
            .iter()
            .any(|d| d.fellow == "f1" && d.field == "total" && d.stored == 9 && d.actual == 3));
        assert_eq!(audit.over_quota.len(), 1);
        assert_eq!(audit.over_quota[0].quota, 2);
    }

    #[test]
    fn test_repair_removes_newest_excess_and_is_idempotent() {
        let year = year();
        let roster = vec![Fellow::new("f1", "One", PgyLevel::Pgy5)];
        let mut rules = CallRules::default();
        rules.quotas.insert(PgyLevel::Pgy5, 2);

        let mut s = CallSchedule::new();
        s.assign(&year, d(2025, 7, 7), "f1");
        s.assign(&year, d(2025, 7, 14), "f1");
        s.assign(&year, d(2025, 7, 21), "f1");
        s.counts.insert("f1".to_string(), 9);

        let repaired = s.repair(&year, &roster, &rules);
        assert_eq!(repaired.count_for("f1"), 2);
        // The newest assignment was dropped.
        assert_eq!(repaired.fellow_on(d(2025, 7, 21)), None);
        assert_eq!(repaired.fellow_on(d(2025, 7, 7)), Some("f1"));
        assert!(repaired.audit(&year, &roster, &rules).is_clean());

        let twice = repaired.repair(&year, &roster, &rules);
        assert_eq!(twice.days, repaired.days);
        assert_eq!(twice.counts, repaired.counts);
    }
}
