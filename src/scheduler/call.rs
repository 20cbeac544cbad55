//! Primary call scheduler.
//!
//! Builds the full-year day-to-fellow call map in chronological order. For
//! each day the eligible pool is partitioned by tier (see
//! [`crate::eligibility`]); within the first tier that survives the hard
//! filters (quota, spacing, consecutive-Saturday rule) a fellow is picked by
//! equity-weighted random selection, weight `1 / (same-category count + 1)`.
//! When every priority tier is empty the scheduler falls back across tiers,
//! except on weekends and holidays past the junior cutoff, which are
//! reserved exclusively for the junior tier.
//!
//! Days that cannot be covered go through a windowed repair pass: the
//! assignments in a five-day radius around the gap are cleared and a bounded
//! backtracking search looks for any full re-assignment of the window. Days
//! still unresolved are reported as uncovered, never dropped.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use crate::eligibility::{eligible_pools, junior_exclusive};
use crate::models::{
    equity_category, AcademicYear, CallSchedule, Fellow, PgyLevel, RotationTable, RuleConfig,
};

/// Radius of the repair window around an uncovered day.
const REPAIR_WINDOW_DAYS: i64 = 5;
/// Placement-try ceiling for one window repair.
const REPAIR_TRY_LIMIT: u32 = 10_000;

/// Result of a call-schedule build.
#[derive(Debug, Clone)]
pub struct CallBuildOutcome {
    pub schedule: CallSchedule,
    /// Days no fellow could cover, after repair.
    pub uncovered: Vec<NaiveDate>,
    /// Days the windowed repair pass resolved.
    pub repaired: Vec<NaiveDate>,
}

/// Primary call scheduler over one academic year.
pub struct CallScheduler<'a> {
    year: &'a AcademicYear,
    roster: &'a [Fellow],
    rotations: &'a RotationTable,
    rules: &'a RuleConfig,
    seed: u64,
}

struct RepairFrame {
    options: Vec<String>,
    chosen: usize,
}

impl<'a> CallScheduler<'a> {
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
            seed: 0,
        }
    }

    /// Sets the random seed for equity-weighted selection.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Builds the schedule for every day of the year.
    pub fn build(&self) -> CallBuildOutcome {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut schedule = CallSchedule::new();
        let mut failed = Vec::new();

        for date in self.year.days() {
            match self.pick_for(&mut rng, &schedule, date) {
                Some(fellow) => schedule.assign(self.year, date, fellow),
                None => {
                    debug!(%date, "no call candidate; deferring to repair");
                    failed.push(date);
                }
            }
        }

        let mut uncovered = Vec::new();
        let mut repaired = Vec::new();
        for date in failed {
            if self.repair_window(&mut schedule, date) {
                repaired.push(date);
            } else {
                warn!(%date, "call day uncovered after window repair");
                uncovered.push(date);
            }
        }

        info!(
            days = schedule.days.len(),
            uncovered = uncovered.len(),
            repaired = repaired.len(),
            "call schedule built"
        );
        CallBuildOutcome {
            schedule,
            uncovered,
            repaired,
        }
    }

    /// Hard-rule filter shared by the greedy pass and the repair search.
    fn admissible(&self, schedule: &CallSchedule, fellow: &Fellow, date: NaiveDate) -> bool {
        if schedule.count_for(&fellow.id) >= self.rules.call.quota_for(fellow.level) {
            return false;
        }
        let spacing = self.rules.call.min_spacing_days;
        if let Some(last) = schedule.last_call_before(&fellow.id, date) {
            if (date - last).num_days() < spacing {
                return false;
            }
        }
        if let Some(next) = schedule.next_call_after(&fellow.id, date) {
            if (next - date).num_days() < spacing {
                return false;
            }
        }
        if self.rules.call.no_consecutive_saturdays
            && date.weekday() == Weekday::Sat
            && schedule.adjacent_saturday(&fellow.id, date)
        {
            return false;
        }
        true
    }

    /// Picks a fellow for one day, or `None` when no tier yields a
    /// candidate.
    fn pick_for(
        &self,
        rng: &mut StdRng,
        schedule: &CallSchedule,
        date: NaiveDate,
    ) -> Option<String> {
        let pools = eligible_pools(date, self.year, self.roster, self.rotations, self.rules);
        for level in &pools.priority {
            let survivors = self.survivors(schedule, pools.pool(*level), date);
            if !survivors.is_empty() {
                return self.pick_weighted(rng, schedule, date, &survivors);
            }
        }
        if junior_exclusive(date, self.year, &self.rules.call) {
            return None;
        }
        for level in PgyLevel::ALL {
            if pools.priority.contains(&level) {
                continue;
            }
            let survivors = self.survivors(schedule, pools.pool(level), date);
            if !survivors.is_empty() {
                return self.pick_weighted(rng, schedule, date, &survivors);
            }
        }
        None
    }

    fn survivors(&self, schedule: &CallSchedule, pool: &[String], date: NaiveDate) -> Vec<String> {
        pool.iter()
            .filter_map(|id| self.roster.iter().find(|f| &f.id == id))
            .filter(|f| self.admissible(schedule, f, date))
            .map(|f| f.id.clone())
            .collect()
    }

    /// Equity-weighted random selection: weight `1 / (category count + 1)`.
    fn pick_weighted(
        &self,
        rng: &mut StdRng,
        schedule: &CallSchedule,
        date: NaiveDate,
        candidates: &[String],
    ) -> Option<String> {
        let category = equity_category(self.year, date);
        let weights: Vec<f64> = candidates
            .iter()
            .map(|id| 1.0 / f64::from(schedule.category_count(id, category) + 1))
            .collect();
        let total: f64 = weights.iter().sum();
        if total <= 0.0 {
            return candidates.first().cloned();
        }
        let mut roll = rng.random_range(0.0..total);
        for (id, weight) in candidates.iter().zip(&weights) {
            if roll < *weight {
                return Some(id.clone());
            }
            roll -= weight;
        }
        candidates.last().cloned()
    }

    /// Candidates for a window day during repair, sorted by ascending
    /// equity-category count.
    fn repair_candidates(&self, schedule: &CallSchedule, date: NaiveDate) -> Vec<String> {
        let pools = eligible_pools(date, self.year, self.roster, self.rotations, self.rules);
        let category = equity_category(self.year, date);
        let mut ids: Vec<String> = if junior_exclusive(date, self.year, &self.rules.call) {
            pools.pool(PgyLevel::Pgy4).to_vec()
        } else {
            PgyLevel::ALL
                .into_iter()
                .flat_map(|level| pools.pool(level).iter().cloned())
                .collect()
        };
        ids.retain(|id| {
            self.roster
                .iter()
                .find(|f| &f.id == id)
                .is_some_and(|f| self.admissible(schedule, f, date))
        });
        ids.sort_by(|a, b| {
            schedule
                .category_count(a, category)
                .cmp(&schedule.category_count(b, category))
                .then(a.cmp(b))
        });
        ids
    }

    /// Clears a window around an uncovered day and backtrack-searches for a
    /// full re-assignment. Rolls back when none exists within the bound.
    fn repair_window(&self, schedule: &mut CallSchedule, target: NaiveDate) -> bool {
        let snapshot = schedule.clone();
        let window: Vec<NaiveDate> = (-REPAIR_WINDOW_DAYS..=REPAIR_WINDOW_DAYS)
            .map(|offset| target + Duration::days(offset))
            .filter(|d| self.year.contains(*d))
            .collect();
        for day in &window {
            schedule.unassign(self.year, *day);
        }

        let mut tries: u32 = 0;
        let mut stack: Vec<RepairFrame> = Vec::with_capacity(window.len());
        while stack.len() < window.len() {
            let date = window[stack.len()];
            let mut frame = RepairFrame {
                options: self.repair_candidates(schedule, date),
                chosen: 0,
            };
            loop {
                if let Some(id) = frame.options.get(frame.chosen) {
                    tries += 1;
                    if tries > REPAIR_TRY_LIMIT {
                        *schedule = snapshot;
                        return false;
                    }
                    schedule.assign(self.year, date, id.clone());
                    stack.push(frame);
                    break;
                }
                let Some(mut prev) = stack.pop() else {
                    *schedule = snapshot;
                    return false;
                };
                schedule.unassign(self.year, window[stack.len()]);
                prev.chosen += 1;
                frame = prev;
            }
        }
        debug!(%target, tries, "window repair succeeded");
        true
    }
}
