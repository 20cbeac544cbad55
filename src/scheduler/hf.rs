//! Heart-failure weekend and holiday coverage scheduler.
//!
//! Runs after the primary call schedule and fills HF coverage in five
//! phases, each only touching gaps the previous one left:
//!
//! 1. holiday blocks, assigned atomically with their inner weekend days
//!    marked covered;
//! 2. mandatory weekends for fellows on the HF rotation, one per
//!    half-month block;
//! 3. fair distribution of the remaining non-holiday weekends over up to
//!    `max_passes` passes, relaxing quota and then spacing when a pass
//!    stalls (the hard-cap tier's quota never relaxes);
//! 4. a final exhaustive pass with quota and spacing fully relaxed;
//! 5. manual overrides, validated against vacation, primary-call conflicts
//!    and the consecutive-weekend rule.
//!
//! Mandatory-weekend misses are reported separately from ordinary
//! uncovered weekends; they are the more severe diagnostic.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use tracing::{debug, info, warn};

use crate::models::{
    weekend_start, AcademicYear, CallSchedule, Fellow, HfSchedule, HolidayBlock, PgyLevel,
    RotationTable, RuleConfig, SeniorHolidayPolicy,
};

/// A fellow on the HF rotation who could not be given a weekend in one of
/// their rotation blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MandatoryMiss {
    pub fellow: String,
    pub block: u8,
}

/// Result of an HF coverage build.
#[derive(Debug, Clone)]
pub struct HfBuildOutcome {
    pub schedule: HfSchedule,
    /// Saturdays with no effective coverage, after every phase.
    pub uncovered: Vec<NaiveDate>,
    /// HF-rotation fellows who missed their per-block mandatory weekend.
    pub mandatory_missed: Vec<MandatoryMiss>,
    /// Holiday blocks nobody could take, by holiday name.
    pub uncovered_holidays: Vec<String>,
}

/// An accepted edit carries the replacement schedule; a rejected one
/// carries the reasons.
pub type HfEditResult = Result<HfSchedule, Vec<String>>;

/// Constraint relaxation level for the fair-distribution passes.
#[derive(Clone, Copy, PartialEq)]
enum Relax {
    None,
    Quota,
    QuotaAndSpacing,
}

/// HF coverage scheduler over one academic year.
pub struct HfScheduler<'a> {
    year: &'a AcademicYear,
    roster: &'a [Fellow],
    rotations: &'a RotationTable,
    calls: &'a CallSchedule,
    rules: &'a RuleConfig,
}

impl<'a> HfScheduler<'a> {
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

    /// Runs phases 1 through 4 and reports what remains.
    pub fn build(&self) -> HfBuildOutcome {
        let mut schedule = HfSchedule::new();
        let uncovered_holidays = self.assign_holiday_blocks(&mut schedule);
        let mandatory_missed = self.assign_mandatory_weekends(&mut schedule);
        self.fair_distribution(&mut schedule);
        self.exhaustive_pass(&mut schedule);

        let uncovered = schedule.gaps(self.year);
        info!(
            weekends = schedule.weekends.len(),
            holiday_blocks = schedule.holiday_blocks.len(),
            uncovered = uncovered.len(),
            mandatory_missed = mandatory_missed.len(),
            "hf coverage built"
        );
        HfBuildOutcome {
            schedule,
            uncovered,
            mandatory_missed,
            uncovered_holidays,
        }
    }

    /// Phase 1: holiday blocks, lowest holiday-day count first.
    fn assign_holiday_blocks(&self, schedule: &mut HfSchedule) -> Vec<String> {
        let mut uncovered = Vec::new();
        for block in self.year.holiday_blocks() {
            if schedule.holiday_days_covered(&block.days) {
                continue;
            }
            let pick = self
                .holiday_pool(schedule, &block)
                .into_iter()
                .min_by(|a, b| {
                    schedule
                        .holiday_day_count(&a.id)
                        .cmp(&schedule.holiday_day_count(&b.id))
                        .then(schedule.total_load(&a.id).cmp(&schedule.total_load(&b.id)))
                        .then(a.id.cmp(&b.id))
                });
            match pick {
                Some(fellow) => {
                    debug!(holiday = %block.name, fellow = %fellow.id, "holiday block assigned");
                    schedule.assign_holiday_block(block.days.clone(), fellow.id.clone());
                }
                None => {
                    warn!(holiday = %block.name, "holiday block uncovered");
                    uncovered.push(block.name.clone());
                }
            }
        }
        uncovered
    }

    /// Eligible fellows for one holiday block, per tier policy.
    fn holiday_pool(&self, schedule: &HfSchedule, block: &HolidayBlock) -> Vec<&Fellow> {
        let hf = &self.rules.hf;
        let mut levels = hf.holiday_levels.clone();
        if hf.senior_holiday_policy == SeniorHolidayPolicy::GeneralEligibility
            && !levels.contains(&PgyLevel::Pgy6)
        {
            levels.push(PgyLevel::Pgy6);
        }
        let pool: Vec<&Fellow> = self
            .roster
            .iter()
            .filter(|f| levels.contains(&f.level))
            .filter(|f| self.holiday_ok(schedule, f, &block.days))
            .collect();
        if pool.is_empty()
            && hf.senior_holiday_policy == SeniorHolidayPolicy::July4EmergencyOnly
            && block.name.to_lowercase().contains("independence")
        {
            return self
                .roster
                .iter()
                .filter(|f| f.level == PgyLevel::Pgy6)
                .filter(|f| self.holiday_ok(schedule, f, &block.days))
                .collect();
        }
        pool
    }

    fn holiday_ok(&self, schedule: &HfSchedule, fellow: &Fellow, days: &[NaiveDate]) -> bool {
        let Some(&start) = days.first() else {
            return false;
        };
        if self.calls.fellow_on(start - Duration::days(1)) == Some(fellow.id.as_str()) {
            return false;
        }
        for &day in days {
            if self.rotation_blocked(fellow, day)
                || self.calls.fellow_on(day) == Some(fellow.id.as_str())
            {
                return false;
            }
        }
        schedule.spacing_ok(&fellow.id, start, self.rules.hf.min_spacing_days)
    }

    /// Phase 2: one weekend per HF-rotation block per fellow.
    fn assign_mandatory_weekends(&self, schedule: &mut HfSchedule) -> Vec<MandatoryMiss> {
        let mut missed = Vec::new();
        for fellow in self.roster {
            for block in self.rotations.blocks_on(&fellow.id, &self.rules.hf.rotation) {
                let saturdays: Vec<NaiveDate> = self
                    .year
                    .block_days(block)
                    .into_iter()
                    .filter(|d| d.weekday() == Weekday::Sat)
                    .collect();
                if saturdays
                    .iter()
                    .any(|s| schedule.covers_weekend(&fellow.id, *s))
                {
                    continue;
                }

                let pick = saturdays
                    .iter()
                    .filter(|s| !self.year.in_holiday_block(**s))
                    .find(|s| self.weekend_ok(schedule, fellow, **s, Relax::Quota));
                // Holiday weekends only as a fallback, and only for tiers
                // the holiday policy admits.
                let pick = pick.or_else(|| {
                    if !self.holiday_tier(fellow.level) {
                        return None;
                    }
                    saturdays
                        .iter()
                        .filter(|s| self.year.in_holiday_block(**s))
                        .find(|s| self.weekend_ok(schedule, fellow, **s, Relax::Quota))
                });

                match pick {
                    Some(&saturday) => {
                        debug!(fellow = %fellow.id, %saturday, "mandatory hf weekend");
                        schedule.assign_weekend(saturday, fellow.id.clone());
                    }
                    None => {
                        warn!(fellow = %fellow.id, block, "mandatory hf weekend missed");
                        missed.push(MandatoryMiss {
                            fellow: fellow.id.clone(),
                            block,
                        });
                    }
                }
            }
        }
        missed
    }

    fn holiday_tier(&self, level: PgyLevel) -> bool {
        let hf = &self.rules.hf;
        hf.holiday_levels.contains(&level)
            || (level == PgyLevel::Pgy6
                && hf.senior_holiday_policy == SeniorHolidayPolicy::GeneralEligibility)
    }

    /// Phase 3: fair passes over the remaining non-holiday weekends.
    fn fair_distribution(&self, schedule: &mut HfSchedule) {
        let mut relax = Relax::None;
        for pass in 0..self.rules.hf.max_passes {
            let open = self.open_saturdays(schedule);
            if open.is_empty() {
                return;
            }
            let mut assigned = 0u32;
            for saturday in open {
                let mut candidates: Vec<&Fellow> = self
                    .roster
                    .iter()
                    .filter(|f| self.weekend_ok(schedule, f, saturday, relax))
                    .collect();
                candidates.sort_by(|a, b| {
                    let last = |f: &Fellow| {
                        schedule
                            .last_assignment_before(&f.id, saturday)
                            .unwrap_or(NaiveDate::MIN)
                    };
                    schedule
                        .weekend_count(&a.id)
                        .cmp(&schedule.weekend_count(&b.id))
                        .then(last(a).cmp(&last(b)))
                        .then(a.id.cmp(&b.id))
                });
                if let Some(fellow) = candidates.first() {
                    schedule.assign_weekend(saturday, fellow.id.clone());
                    assigned += 1;
                }
            }
            debug!(pass, assigned, "hf fair-distribution pass");
            if assigned == 0 {
                relax = match relax {
                    Relax::None => {
                        warn!("hf distribution stalled; relaxing quotas");
                        Relax::Quota
                    }
                    Relax::Quota => {
                        warn!("hf distribution stalled; relaxing spacing");
                        Relax::QuotaAndSpacing
                    }
                    Relax::QuotaAndSpacing => return,
                };
            }
        }
    }

    /// Phase 4: anything still open goes to the first fellow in roster
    /// order who physically can take it.
    fn exhaustive_pass(&self, schedule: &mut HfSchedule) {
        for saturday in schedule.uncovered_weekends(&self.year.saturdays()) {
            let pick = self
                .roster
                .iter()
                .find(|f| self.weekend_ok(schedule, f, saturday, Relax::QuotaAndSpacing));
            if let Some(fellow) = pick {
                warn!(%saturday, fellow = %fellow.id, "weekend filled by exhaustive pass");
                schedule.assign_weekend(saturday, fellow.id.clone());
            }
        }
    }

    /// Non-holiday Saturdays still uncovered.
    fn open_saturdays(&self, schedule: &HfSchedule) -> Vec<NaiveDate> {
        schedule
            .uncovered_weekends(&self.year.saturdays())
            .into_iter()
            .filter(|s| !self.year.in_holiday_block(*s))
            .collect()
    }

    fn rotation_blocked(&self, fellow: &Fellow, date: NaiveDate) -> bool {
        if self.rotations.is_vacation_on(&fellow.id, date, self.year) {
            return true;
        }
        self.rotations
            .rotation_on(&fellow.id, date, self.year)
            .is_some_and(|r| self.rules.hf.excluded_rotations.contains(r))
    }

    /// Hard-rule filter for assigning one weekend, under a relaxation
    /// level. The hard-cap tier's quota holds at every level.
    fn weekend_ok(
        &self,
        schedule: &HfSchedule,
        fellow: &Fellow,
        saturday: NaiveDate,
        relax: Relax,
    ) -> bool {
        if schedule.weekends.contains_key(&saturday) {
            return false;
        }
        let sunday = saturday + Duration::days(1);
        if self.rotation_blocked(fellow, saturday) || self.rotation_blocked(fellow, sunday) {
            return false;
        }
        for day in [saturday - Duration::days(1), saturday, sunday] {
            if self.calls.fellow_on(day) == Some(fellow.id.as_str()) {
                return false;
            }
        }
        if schedule.consecutive_weekend_conflict(&fellow.id, saturday) {
            return false;
        }
        let hf = &self.rules.hf;
        let quota_applies = relax == Relax::None || fellow.level == hf.hard_cap_level;
        if quota_applies && schedule.weekend_count(&fellow.id) >= hf.quota_for(fellow.level) {
            return false;
        }
        if relax != Relax::QuotaAndSpacing
            && !schedule.spacing_ok(&fellow.id, saturday, hf.min_spacing_days)
        {
            return false;
        }
        true
    }

    /// Phase 5: a day-level override, taking precedence over block-level
    /// assignment for that date.
    pub fn set_override(
        &self,
        schedule: &HfSchedule,
        date: NaiveDate,
        fellow: &str,
    ) -> HfEditResult {
        let mut preview = schedule.clone();
        preview.overrides.insert(date, fellow.to_string());
        let reasons = self.validate_manual(&preview, fellow, &[date]);
        if reasons.is_empty() {
            Ok(preview)
        } else {
            Err(reasons)
        }
    }

    /// Phase 5: rewrites a whole weekend, clearing any day overrides on it.
    pub fn set_weekend(
        &self,
        schedule: &HfSchedule,
        saturday: NaiveDate,
        fellow: &str,
    ) -> HfEditResult {
        if saturday.weekday() != Weekday::Sat {
            return Err(vec![format!("{saturday} is not a Saturday")]);
        }
        let sunday = saturday + Duration::days(1);
        let mut preview = schedule.clone();
        preview.overrides.remove(&saturday);
        preview.overrides.remove(&sunday);
        preview.assign_weekend(saturday, fellow);
        let reasons = self.validate_manual(&preview, fellow, &[saturday, sunday]);
        if reasons.is_empty() {
            Ok(preview)
        } else {
            Err(reasons)
        }
    }

    /// Phase 5: rewrites a whole holiday block, clearing any day overrides
    /// inside it.
    pub fn set_holiday_block(
        &self,
        schedule: &HfSchedule,
        start: NaiveDate,
        fellow: &str,
    ) -> HfEditResult {
        let Some(block) = self
            .year
            .holiday_blocks()
            .into_iter()
            .find(|b| b.contains(start))
        else {
            return Err(vec![format!("{start} is not inside a holiday block")]);
        };
        let mut preview = schedule.clone();
        for day in &block.days {
            preview.overrides.remove(day);
        }
        preview.assign_holiday_block(block.days.clone(), fellow);
        let reasons = self.validate_manual(&preview, fellow, &block.days);
        if reasons.is_empty() {
            Ok(preview)
        } else {
            Err(reasons)
        }
    }

    /// Manual-edit validation: vacation, primary-call conflicts on the day
    /// and the day before, and the effective consecutive-weekend rule.
    fn validate_manual(
        &self,
        preview: &HfSchedule,
        fellow: &str,
        days: &[NaiveDate],
    ) -> Vec<String> {
        if !self.roster.iter().any(|f| f.id == fellow) {
            return vec![format!("{fellow} is not on the roster")];
        }
        let mut reasons = Vec::new();
        for &day in days {
            if self.rotations.is_vacation_on(fellow, day, self.year) {
                reasons.push(format!("{fellow} is on vacation on {day}"));
            }
            if self.calls.fellow_on(day) == Some(fellow) {
                reasons.push(format!("{fellow} has primary call on {day}"));
            }
            if self.calls.fellow_on(day - Duration::days(1)) == Some(fellow) {
                reasons.push(format!(
                    "{fellow} has primary call on {}, the day before {day}",
                    day - Duration::days(1)
                ));
            }
            if let Some(saturday) = weekend_start(day) {
                if preview.consecutive_weekend_conflict(fellow, saturday) {
                    reasons.push(format!(
                        "{fellow} would cover consecutive weekends around {saturday}"
                    ));
                }
            }
        }
        reasons.sort();
        reasons.dedup();
        reasons
    }
}
