//! Clinic and ambulatory scheduler.
//!
//! Runs after the primary call schedule. Each day, three tiers run in
//! priority order, and a fellow assigned by an earlier tier is skipped by
//! later tiers for that day:
//!
//! 1. specialty clinics, each defined by a weekday, a week-of-month set,
//!    eligible rotations, and eligible tiers;
//! 2. general continuity clinic on a fellow's preferred weekday, unless
//!    they already hold a specialty clinic that calendar week;
//! 3. the block-level ambulatory fellow, chosen once per half-month block
//!    from a rotation-type priority list.
//!
//! Tie-breaking is deterministic throughout (assignment counts, then id)
//! so a rebuild from the same inputs reproduces the same schedule. A
//! separate auditor re-walks the year and reports coverage gaps without
//! fixing them.

use chrono::{Datelike, Duration, NaiveDate};
use tracing::{debug, info};

use crate::models::{
    AcademicYear, CallSchedule, ClinicSchedule, ClinicType, Fellow, RotationTable, RuleConfig,
    SpecialtyClinicRule, BLOCKS_PER_YEAR,
};

/// A required clinic slot or ambulatory block left unstaffed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClinicGap {
    /// A specialty clinic slot with no assignment.
    Specialty { date: NaiveDate, clinic: ClinicType },
    /// A half-month block with no ambulatory fellow.
    Ambulatory { block: u8 },
}

/// Result of a clinic build: the schedule plus its own gap report.
#[derive(Debug, Clone)]
pub struct ClinicBuildOutcome {
    pub schedule: ClinicSchedule,
    pub gaps: Vec<ClinicGap>,
}

/// Clinic and ambulatory scheduler over one academic year.
pub struct ClinicScheduler<'a> {
    year: &'a AcademicYear,
    roster: &'a [Fellow],
    rotations: &'a RotationTable,
    calls: &'a CallSchedule,
    rules: &'a RuleConfig,
}

impl<'a> ClinicScheduler<'a> {
    pub fn new(
        year: &'a AcademicYear,
        roster: &'a [Fellow],
        rotations: &'a RotationTable,
        calls: &'a CallSchedule,
        rules: &'a RuleConfig,
    ) -> Self {
        Self {
            year,
            roster,
            rotations,
            calls,
            rules,
        }
    }

    /// Builds the full-year clinic schedule and audits it.
    pub fn build(&self) -> ClinicBuildOutcome {
        let mut schedule = ClinicSchedule::new();
        for date in self.year.days() {
            self.assign_specialty(&mut schedule, date);
            self.assign_general(&mut schedule, date);
            if let Some(block) = self.year.block_of(date) {
                if date == self.year.block_start(block) {
                    self.assign_ambulatory(&mut schedule, block, date);
                }
            }
        }
        let gaps = self.audit_coverage(&schedule);
        info!(
            days = schedule.days.len(),
            ambulatory_blocks = schedule.ambulatory.len(),
            gaps = gaps.len(),
            "clinic schedule built"
        );
        ClinicBuildOutcome { schedule, gaps }
    }

    /// Tier 1: one fellow per specialty slot applying on this date.
    fn assign_specialty(&self, schedule: &mut ClinicSchedule, date: NaiveDate) {
        for rule in &self.rules.clinic.specialty {
            if !rule.applies_on(date) {
                continue;
            }
            let pick = self
                .roster
                .iter()
                .filter(|f| self.specialty_ok(schedule, f, date, rule))
                .min_by(|a, b| {
                    schedule
                        .specialty_total(&a.id)
                        .cmp(&schedule.specialty_total(&b.id))
                        .then(
                            schedule
                                .count_of(&a.id, rule.clinic)
                                .cmp(&schedule.count_of(&b.id, rule.clinic)),
                        )
                        .then(a.id.cmp(&b.id))
                });
            if let Some(fellow) = pick {
                schedule.assign(date, fellow.id.clone(), rule.clinic);
            } else {
                debug!(%date, clinic = ?rule.clinic, "specialty slot unstaffed");
            }
        }
    }

    fn specialty_ok(
        &self,
        schedule: &ClinicSchedule,
        fellow: &Fellow,
        date: NaiveDate,
        rule: &SpecialtyClinicRule,
    ) -> bool {
        rule.levels.contains(&fellow.level)
            && !schedule.has_clinic_on(&fellow.id, date)
            && !self.rotations.is_vacation_on(&fellow.id, date, self.year)
            && !self.post_call(&fellow.id, date)
            && self
                .rotations
                .rotation_on(&fellow.id, date, self.year)
                .is_some_and(|r| rule.rotations.contains(r))
    }

    /// Tier 2: general clinic on a fellow's preferred weekday.
    fn assign_general(&self, schedule: &mut ClinicSchedule, date: NaiveDate) {
        if !self.rules.clinic.general_weekdays.contains(&date.weekday()) {
            return;
        }
        for fellow in self.roster {
            if fellow.clinic_weekday != Some(date.weekday()) {
                continue;
            }
            if schedule.has_clinic_on(&fellow.id, date)
                || schedule.has_specialty_in_week(&fellow.id, date)
                || self.rotations.is_vacation_on(&fellow.id, date, self.year)
                || self.post_call(&fellow.id, date)
            {
                continue;
            }
            let excluded = self
                .rotations
                .rotation_on(&fellow.id, date, self.year)
                .is_some_and(|r| self.rules.clinic.general_excluded_rotations.contains(r));
            if !excluded {
                schedule.assign(date, fellow.id.clone(), ClinicType::General);
            }
        }
    }

    /// Tier 3: the block's ambulatory fellow, from the rotation priority
    /// list. The same fellow never takes two blocks in a row.
    fn assign_ambulatory(&self, schedule: &mut ClinicSchedule, block: u8, start: NaiveDate) {
        let rules = &self.rules.clinic;
        for rotation in &rules.ambulatory_rotation_priority {
            let pick = self
                .roster
                .iter()
                .filter(|f| rules.ambulatory_levels.contains(&f.level))
                .filter(|f| self.rotations.get(&f.id, block) == Some(rotation.as_str()))
                .filter(|f| schedule.ambulatory_count(&f.id) < rules.ambulatory_max)
                .filter(|f| !schedule.has_clinic_on(&f.id, start))
                .filter(|f| {
                    block == 0
                        || schedule.ambulatory.get(&(block - 1)).map(String::as_str)
                            != Some(f.id.as_str())
                })
                .min_by(|a, b| {
                    schedule
                        .ambulatory_count(&a.id)
                        .cmp(&schedule.ambulatory_count(&b.id))
                        .then(a.id.cmp(&b.id))
                });
            if let Some(fellow) = pick {
                debug!(block, fellow = %fellow.id, "ambulatory fellow assigned");
                schedule.assign_ambulatory(block, fellow.id.clone());
                return;
            }
        }
    }

    fn post_call(&self, fellow: &str, date: NaiveDate) -> bool {
        self.calls.fellow_on(date - Duration::days(1)) == Some(fellow)
    }

    /// Re-walks the year and reports every unstaffed required slot.
    pub fn audit_coverage(&self, schedule: &ClinicSchedule) -> Vec<ClinicGap> {
        let mut gaps = Vec::new();
        for date in self.year.days() {
            for rule in &self.rules.clinic.specialty {
                if rule.applies_on(date) && schedule.assignment_on(date, rule.clinic).is_none() {
                    gaps.push(ClinicGap::Specialty {
                        date,
                        clinic: rule.clinic,
                    });
                }
            }
        }
        for block in 0..BLOCKS_PER_YEAR {
            if !schedule.ambulatory.contains_key(&block) {
                gaps.push(ClinicGap::Ambulatory { block });
            }
        }
        gaps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PgyLevel;
    use chrono::Weekday;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn build(
        roster: &[Fellow],
        rotations: &RotationTable,
        calls: &CallSchedule,
    ) -> ClinicBuildOutcome {
        let year = AcademicYear::new(2025).with_default_holidays();
        let rules = RuleConfig::default();
        ClinicScheduler::new(&year, roster, rotations, calls, &rules).build()
    }

    #[test]
    fn test_specialty_rotates_between_eligible_fellows() {
        let roster = vec![
            Fellow::new("e1", "E1", PgyLevel::Pgy5),
            Fellow::new("e2", "E2", PgyLevel::Pgy5),
        ];
        // Both on EP for the first half of September (block 4).
        let rotations = RotationTable::new()
            .with_assignment("e1", 4, "EP")
            .with_assignment("e2", 4, "EP");
        let outcome = build(&roster, &rotations, &CallSchedule::new());

        // EP clinic runs every Thursday; Sep 4 and Sep 11 fall in block 4.
        let first = outcome.schedule.assignment_on(d(2025, 9, 4), ClinicType::Ep).unwrap();
        let second = outcome.schedule.assignment_on(d(2025, 9, 11), ClinicType::Ep).unwrap();
        assert_eq!(first.fellow, "e1"); // tie broken alphabetically
        assert_eq!(second.fellow, "e2"); // then lightest-loaded
    }

    #[test]
    fn test_post_call_fellow_skipped() {
        let year = AcademicYear::new(2025).with_default_holidays();
        let roster = vec![
            Fellow::new("e1", "E1", PgyLevel::Pgy5),
            Fellow::new("e2", "E2", PgyLevel::Pgy5),
        ];
        let rotations = RotationTable::new()
            .with_assignment("e1", 4, "EP")
            .with_assignment("e2", 4, "EP");
        // e1 holds primary call the Wednesday before the Sep 4 EP clinic.
        let mut calls = CallSchedule::new();
        calls.assign(&year, d(2025, 9, 3), "e1");
        let outcome = build(&roster, &rotations, &calls);

        let slot = outcome.schedule.assignment_on(d(2025, 9, 4), ClinicType::Ep).unwrap();
        assert_eq!(slot.fellow, "e2");
    }

    #[test]
    fn test_general_clinic_on_preferred_weekday() {
        let roster = vec![
            Fellow::new("g1", "G1", PgyLevel::Pgy4).with_clinic_weekday(Weekday::Fri)
        ];
        let rotations = RotationTable::new().with_assignment("g1", 4, "ELECTIVE");
        let outcome = build(&roster, &rotations, &CallSchedule::new());

        // Friday September 5 in block 4.
        let slot = outcome
            .schedule
            .assignment_on(d(2025, 9, 5), ClinicType::General)
            .unwrap();
        assert_eq!(slot.fellow, "g1");
        // No general clinic on a non-preferred weekday.
        assert!(outcome
            .schedule
            .assignment_on(d(2025, 9, 4), ClinicType::General)
            .is_none());
    }

    #[test]
    fn test_general_suppressed_by_specialty_same_week() {
        // g1 is the only EP fellow, so they take Thursday EP clinic and
        // must then skip their Friday general clinic that week.
        let roster = vec![
            Fellow::new("g1", "G1", PgyLevel::Pgy5).with_clinic_weekday(Weekday::Fri)
        ];
        let rotations = RotationTable::new().with_assignment("g1", 4, "EP");
        let outcome = build(&roster, &rotations, &CallSchedule::new());

        assert!(outcome
            .schedule
            .assignment_on(d(2025, 9, 4), ClinicType::Ep)
            .is_some());
        assert!(outcome
            .schedule
            .assignment_on(d(2025, 9, 5), ClinicType::General)
            .is_none());
    }

    #[test]
    fn test_general_excluded_rotation() {
        let roster = vec![
            Fellow::new("g1", "G1", PgyLevel::Pgy4).with_clinic_weekday(Weekday::Fri)
        ];
        let rotations = RotationTable::new().with_assignment("g1", 4, "CCU");
        let outcome = build(&roster, &rotations, &CallSchedule::new());
        assert!(outcome
            .schedule
            .assignment_on(d(2025, 9, 5), ClinicType::General)
            .is_none());
    }

    #[test]
    fn test_ambulatory_no_consecutive_blocks() {
        let roster = vec![Fellow::new("s1", "S1", PgyLevel::Pgy6)];
        let rotations = RotationTable::new()
            .with_assignment("s1", 4, "ELECTIVE")
            .with_assignment("s1", 5, "ELECTIVE");
        let outcome = build(&roster, &rotations, &CallSchedule::new());

        assert_eq!(outcome.schedule.ambulatory.get(&4).map(String::as_str), Some("s1"));
        assert!(outcome.schedule.ambulatory.get(&5).is_none());
        assert!(outcome.gaps.contains(&ClinicGap::Ambulatory { block: 5 }));
    }

    #[test]
    fn test_ambulatory_rotation_priority_and_tier() {
        let roster = vec![
            Fellow::new("s1", "S1", PgyLevel::Pgy6),
            Fellow::new("s2", "S2", PgyLevel::Pgy6),
            Fellow::new("m1", "M1", PgyLevel::Pgy5),
        ];
        // ELECTIVE outranks ECHO in the priority list; m1 is not senior.
        let rotations = RotationTable::new()
            .with_assignment("s1", 4, "ECHO")
            .with_assignment("s2", 4, "ELECTIVE")
            .with_assignment("m1", 4, "ELECTIVE");
        let outcome = build(&roster, &rotations, &CallSchedule::new());
        assert_eq!(outcome.schedule.ambulatory.get(&4).map(String::as_str), Some("s2"));
    }

    #[test]
    fn test_gap_report_flags_unstaffed_slots() {
        // Nobody qualifies for any clinic: every applicable slot and every
        // block shows up in the report.
        let roster = vec![Fellow::new("j1", "J1", PgyLevel::Pgy4)];
        let rotations = RotationTable::new();
        let outcome = build(&roster, &rotations, &CallSchedule::new());

        assert!(outcome.gaps.iter().any(|g| matches!(
            g,
            ClinicGap::Specialty { clinic: ClinicType::Ep, .. }
        )));
        assert_eq!(
            outcome
                .gaps
                .iter()
                .filter(|g| matches!(g, ClinicGap::Ambulatory { .. }))
                .count(),
            usize::from(BLOCKS_PER_YEAR)
        );
    }
}
