//! Manual call-schedule edits.
//!
//! Every edit operation here builds a full preview of the schedule with the
//! proposed changes applied, then re-validates each affected fellow's entire
//! assignment list against that preview. Changes are never validated one at
//! a time against the pre-change state; sequential validation can reject
//! valid swaps (each half looks too close to the other's old day) or accept
//! invalid ones. Rejections return human-readable reasons and leave the
//! caller's schedule untouched.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

use crate::eligibility::{has_specialty_clinic_on, is_call_eligible, junior_exclusive};
use crate::models::{
    equity_category, is_weekend, AcademicYear, CallAudit, CallSchedule, Fellow, PgyLevel,
    RotationTable, RuleConfig, VACATION,
};

/// An accepted edit carries the replacement schedule; a rejected one
/// carries the reasons.
pub type EditResult = Result<CallSchedule, Vec<String>>;

/// A scored candidate partner-day for a swap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapSuggestion {
    pub date: NaiveDate,
    pub fellow: String,
    pub score: i64,
}

/// Validates and applies manual edits to a call schedule.
pub struct CallEditor<'a> {
    year: &'a AcademicYear,
    roster: &'a [Fellow],
    rotations: &'a RotationTable,
    rules: &'a RuleConfig,
}

impl<'a> CallEditor<'a> {
    pub fn new(
        year: &'a AcademicYear,
        roster: &'a [Fellow],
        rotations: &'a RotationTable,
        rules: &'a RuleConfig,
    ) -> Self {
        Self {
            year,
            roster,
            rotations,
            rules,
        }
    }

    /// Checks one (date, fellow) assignment against the schedule with that
    /// date's prior occupant subtracted out. Empty result means valid.
    pub fn validate_assignment(
        &self,
        schedule: &CallSchedule,
        date: NaiveDate,
        fellow: &str,
    ) -> Vec<String> {
        let mut preview = schedule.clone();
        preview.unassign(self.year, date);
        preview.assign(self.year, date, fellow);
        self.validate_fellow(&preview, fellow)
    }

    /// Assigns a fellow to a date, replacing any prior occupant.
    pub fn apply(&self, schedule: &CallSchedule, date: NaiveDate, fellow: &str) -> EditResult {
        if !self.year.contains(date) {
            return Err(vec![format!("{date} is outside the academic year")]);
        }
        let mut preview = schedule.clone();
        preview.unassign(self.year, date);
        preview.assign(self.year, date, fellow);
        let reasons = self.validate_fellow(&preview, fellow);
        if reasons.is_empty() {
            Ok(preview)
        } else {
            Err(reasons)
        }
    }

    /// Clears a date. Removals cannot violate a hard rule.
    pub fn remove(&self, schedule: &CallSchedule, date: NaiveDate) -> EditResult {
        let mut preview = schedule.clone();
        if preview.unassign(self.year, date).is_none() {
            return Err(vec![format!("no assignment on {date}")]);
        }
        Ok(preview)
    }

    /// Exchanges the occupants of two assigned days.
    pub fn swap_days(&self, schedule: &CallSchedule, a: NaiveDate, b: NaiveDate) -> EditResult {
        let Some(fellow_a) = schedule.fellow_on(a).map(str::to_string) else {
            return Err(vec![format!("no assignment on {a}")]);
        };
        let Some(fellow_b) = schedule.fellow_on(b).map(str::to_string) else {
            return Err(vec![format!("no assignment on {b}")]);
        };
        if fellow_a == fellow_b {
            return Err(vec![format!("{fellow_a} holds both {a} and {b}")]);
        }
        let mut preview = schedule.clone();
        preview.assign(self.year, a, fellow_b.clone());
        preview.assign(self.year, b, fellow_a.clone());
        let mut reasons = self.validate_fellow(&preview, &fellow_a);
        reasons.extend(self.validate_fellow(&preview, &fellow_b));
        if reasons.is_empty() {
            Ok(preview)
        } else {
            Err(reasons)
        }
    }

    /// Moves the occupant of one day to another. An occupied target turns
    /// the move into a swap.
    pub fn move_day(&self, schedule: &CallSchedule, from: NaiveDate, to: NaiveDate) -> EditResult {
        let Some(fellow) = schedule.fellow_on(from).map(str::to_string) else {
            return Err(vec![format!("no assignment on {from}")]);
        };
        if !self.year.contains(to) {
            return Err(vec![format!("{to} is outside the academic year")]);
        }
        if schedule.fellow_on(to).is_some() {
            return self.swap_days(schedule, from, to);
        }
        let mut preview = schedule.clone();
        preview.unassign(self.year, from);
        preview.assign(self.year, to, fellow.clone());
        let reasons = self.validate_fellow(&preview, &fellow);
        if reasons.is_empty() {
            Ok(preview)
        } else {
            Err(reasons)
        }
    }

    /// Scores candidate partner-days for swapping away one assignment.
    ///
    /// Same equity category earns +100; calendar closeness earns up to
    /// +50. When the source day is a Friday, weekend, or holiday, only
    /// junior-tier partners are considered, because those days are
    /// tier-reserved. Only swaps that validate are returned.
    pub fn suggest_swaps(
        &self,
        schedule: &CallSchedule,
        date: NaiveDate,
        limit: usize,
    ) -> Vec<SwapSuggestion> {
        let Some(source) = schedule.fellow_on(date).map(str::to_string) else {
            return Vec::new();
        };
        let tier_reserved = date.weekday() == Weekday::Fri
            || is_weekend(date)
            || self.year.is_holiday(date);
        let category = equity_category(self.year, date);

        let mut suggestions: Vec<SwapSuggestion> = Vec::new();
        for (&partner_day, partner) in &schedule.days {
            if partner_day == date || *partner == source {
                continue;
            }
            if tier_reserved
                && self
                    .fellow(partner)
                    .is_none_or(|f| f.level != PgyLevel::Pgy4)
            {
                continue;
            }
            if self.swap_days(schedule, date, partner_day).is_err() {
                continue;
            }
            let mut score: i64 = 0;
            if equity_category(self.year, partner_day) == category {
                score += 100;
            }
            let apart = (partner_day - date).num_days().abs();
            score += (50 - apart).max(0);
            suggestions.push(SwapSuggestion {
                date: partner_day,
                fellow: partner.clone(),
                score,
            });
        }
        suggestions.sort_by(|x, y| y.score.cmp(&x.score).then(x.date.cmp(&y.date)));
        suggestions.truncate(limit);
        suggestions
    }

    /// Recomputes true counts from the day map and flags quota excess.
    pub fn audit(&self, schedule: &CallSchedule) -> CallAudit {
        schedule.audit(self.year, self.roster, &self.rules.call)
    }

    /// Returns a copy with counts resynchronized and the newest excess
    /// assignments removed for any fellow over quota.
    pub fn repair_counts(&self, schedule: &CallSchedule) -> CallSchedule {
        schedule.repair(self.year, self.roster, &self.rules.call)
    }

    fn fellow(&self, id: &str) -> Option<&Fellow> {
        self.roster.iter().find(|f| f.id == id)
    }

    /// Validates a fellow's entire assignment list against a preview.
    fn validate_fellow(&self, preview: &CallSchedule, id: &str) -> Vec<String> {
        let Some(fellow) = self.fellow(id) else {
            return vec![format!("{id} is not on the roster")];
        };
        let mut reasons = Vec::new();
        let calls = preview.calls_for(id);

        let quota = self.rules.call.quota_for(fellow.level);
        if calls.len() as u32 > quota {
            reasons.push(format!(
                "{id} would exceed the {} quota of {quota} ({} assigned)",
                fellow.level.label(),
                calls.len()
            ));
        }

        for &date in &calls {
            if junior_exclusive(date, self.year, &self.rules.call)
                && fellow.level != PgyLevel::Pgy4
            {
                reasons.push(format!(
                    "{date} is reserved for {} fellows after the junior weekend cutoff",
                    PgyLevel::Pgy4.label()
                ));
            }
            if !is_call_eligible(fellow, date, self.year, self.rotations, self.rules) {
                reasons.push(self.ineligibility_reason(fellow, date));
            }
        }

        let spacing = self.rules.call.min_spacing_days;
        for pair in calls.windows(2) {
            if (pair[1] - pair[0]).num_days() < spacing {
                reasons.push(format!(
                    "{id} has call on {}, fewer than {spacing} days before {}",
                    pair[0], pair[1]
                ));
            }
        }

        if self.rules.call.no_consecutive_saturdays {
            let saturdays: Vec<NaiveDate> = calls
                .iter()
                .copied()
                .filter(|d| d.weekday() == Weekday::Sat)
                .collect();
            for pair in saturdays.windows(2) {
                if (pair[1] - pair[0]).num_days() == 7 {
                    reasons.push(format!(
                        "{id} would hold consecutive Saturdays {} and {}",
                        pair[0], pair[1]
                    ));
                }
            }
        }

        reasons
    }

    fn ineligibility_reason(&self, fellow: &Fellow, date: NaiveDate) -> String {
        let id = &fellow.id;
        if fellow.level == PgyLevel::Pgy4 {
            let start = self.year.anchor(
                self.rules.call.junior_call_start.0,
                self.rules.call.junior_call_start.1,
            );
            if date < start {
                return format!("{id} may not take call before {start}");
            }
        }
        if let Some(rotation) = self.rotations.rotation_on(id, date, self.year) {
            if rotation == VACATION {
                return format!("{id} is on vacation on {date}");
            }
            if self.rules.call.excluded_rotations.contains(rotation) {
                return format!("{id} is on {rotation} on {date}, which is excluded from call");
            }
            if self
                .rules
                .call
                .rotation_weekday_exclusions
                .get(rotation)
                .is_some_and(|days| days.contains(&date.weekday()))
            {
                return format!("{id} is on {rotation}, which takes no call on {}", date.weekday());
            }
        }
        if self.rules.call.pre_clinic_exclusion
            && has_specialty_clinic_on(
                fellow,
                date + Duration::days(1),
                self.year,
                self.rotations,
                self.rules,
            )
        {
            return format!("{id} has a specialty clinic on {}", date + Duration::days(1));
        }
        format!("{id} is not eligible for call on {date}")
    }
}
