//! Eligibility pool builder.
//!
//! Pure partition function: (date, roster, rotations, rules) -> candidate
//! fellows per tier plus the tier-priority order for that date. Called anew
//! for every date by every scheduler, so it carries no state and runs in
//! O(fellows).
//!
//! # Tier priority
//! Weekday priority varies by weekday. Weekends and holidays use a separate,
//! shorter list: before the junior weekend cutoff the Pgy4 tier is excluded
//! from weekend/holiday duty, and from the cutoff onward it becomes the
//! exclusive weekend/holiday tier.

use std::collections::HashMap;

use chrono::{Datelike, Duration, NaiveDate};

use crate::models::{
    is_weekend, AcademicYear, CallRules, Fellow, PgyLevel, RotationTable, RuleConfig, VACATION,
};

/// Candidate fellows partitioned by tier, with the tier order for one date.
#[derive(Debug, Clone)]
pub struct EligiblePools {
    /// Eligible fellow ids per tier, roster order.
    pub by_level: HashMap<PgyLevel, Vec<String>>,
    /// Tier priority order for this date, most preferred first.
    pub priority: Vec<PgyLevel>,
}

impl EligiblePools {
    /// The pool for one tier (empty when no fellow qualifies).
    pub fn pool(&self, level: PgyLevel) -> &[String] {
        self.by_level.get(&level).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All eligible ids flattened in tier-priority order.
    pub fn flattened(&self) -> Vec<&str> {
        self.priority
            .iter()
            .flat_map(|level| self.pool(*level).iter().map(String::as_str))
            .collect()
    }
}

/// Tier priority order for a date.
pub fn tier_priority(date: NaiveDate, year: &AcademicYear, rules: &CallRules) -> Vec<PgyLevel> {
    if is_weekend(date) || year.is_holiday(date) {
        let cutoff = year.anchor(rules.junior_weekend_cutoff.0, rules.junior_weekend_cutoff.1);
        if date >= cutoff {
            vec![PgyLevel::Pgy4]
        } else {
            rules.weekend_priority.clone()
        }
    } else {
        rules.priority_for(date.weekday()).to_vec()
    }
}

/// Whether a date's call slot is reserved exclusively for the junior tier
/// (a weekend or holiday on or after the configured cutoff).
pub fn junior_exclusive(date: NaiveDate, year: &AcademicYear, rules: &CallRules) -> bool {
    (is_weekend(date) || year.is_holiday(date))
        && date >= year.anchor(rules.junior_weekend_cutoff.0, rules.junior_weekend_cutoff.1)
}

/// Whether a fellow may take primary call on a date.
///
/// Applies, per fellow: excluded-rotation, vacation, junior call-start,
/// rotation weekday exclusions, and the pre-clinic fatigue rule (a fellow
/// who would hold a specialty clinic the next day is excluded).
pub fn is_call_eligible(
    fellow: &Fellow,
    date: NaiveDate,
    year: &AcademicYear,
    rotations: &RotationTable,
    rules: &RuleConfig,
) -> bool {
    if fellow.level == PgyLevel::Pgy4 {
        let start = year.anchor(rules.call.junior_call_start.0, rules.call.junior_call_start.1);
        if date < start {
            return false;
        }
    }
    if let Some(rotation) = rotations.rotation_on(&fellow.id, date, year) {
        if rotation == VACATION {
            return false;
        }
        if rules.call.excluded_rotations.contains(rotation) {
            return false;
        }
        if let Some(weekdays) = rules.call.rotation_weekday_exclusions.get(rotation) {
            if weekdays.contains(&date.weekday()) {
                return false;
            }
        }
    }
    if rules.call.pre_clinic_exclusion
        && has_specialty_clinic_on(fellow, date + Duration::days(1), year, rotations, rules)
    {
        return false;
    }
    true
}

/// Whether a fellow would hold a specialty clinic slot on a date, derived
/// from the configured clinic rules.
pub fn has_specialty_clinic_on(
    fellow: &Fellow,
    date: NaiveDate,
    year: &AcademicYear,
    rotations: &RotationTable,
    rules: &RuleConfig,
) -> bool {
    if !year.contains(date) || rotations.is_vacation_on(&fellow.id, date, year) {
        return false;
    }
    rules.clinic.specialty.iter().any(|rule| {
        rule.applies_on(date)
            && rule.levels.contains(&fellow.level)
            && rotations
                .rotation_on(&fellow.id, date, year)
                .is_some_and(|r| rule.rotations.contains(r))
    })
}

/// Builds the per-tier candidate pools and tier priority for one date.
pub fn eligible_pools(
    date: NaiveDate,
    year: &AcademicYear,
    roster: &[Fellow],
    rotations: &RotationTable,
    rules: &RuleConfig,
) -> EligiblePools {
    let mut by_level: HashMap<PgyLevel, Vec<String>> = HashMap::new();
    for fellow in roster {
        if is_call_eligible(fellow, date, year, rotations, rules) {
            by_level
                .entry(fellow.level)
                .or_default()
                .push(fellow.id.clone());
        }
    }
    EligiblePools {
        by_level,
        priority: tier_priority(date, year, &rules.call),
    }
}
