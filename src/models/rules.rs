//! Rule configuration.
//!
//! Every tunable threshold the schedulers consult lives here, loaded once
//! per scheduling run and never mutated by the engine. Behavioral variants
//! are rule toggles on this object, not parallel code paths.

use std::collections::{HashMap, HashSet};

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use super::clinic::ClinicType;
use super::fellow::PgyLevel;

/// How the most senior tier participates in HF holiday blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeniorHolidayPolicy {
    /// Pgy6 joins the holiday pool like any other configured tier.
    GeneralEligibility,
    /// Pgy6 is considered only for the Independence Day block, and only
    /// when no other tier has an eligible fellow.
    July4EmergencyOnly,
}

/// Primary-call rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallRules {
    /// Minimum days between two call assignments for one fellow.
    pub min_spacing_days: i64,
    /// Forbid the same fellow holding Saturdays exactly 7 days apart.
    pub no_consecutive_saturdays: bool,
    /// Annual call quota per tier.
    pub quotas: HashMap<PgyLevel, u32>,
    /// Tier priority per weekday, Monday first (7 entries).
    pub weekday_priority: Vec<Vec<PgyLevel>>,
    /// Tier priority for weekends and holidays before the junior cutoff.
    pub weekend_priority: Vec<PgyLevel>,
    /// Month/day from which Pgy4 fellows take call at all.
    pub junior_call_start: (u32, u32),
    /// Month/day from which weekends and holidays are exclusively Pgy4.
    pub junior_weekend_cutoff: (u32, u32),
    /// Rotations whose fellows never take call.
    pub excluded_rotations: HashSet<String>,
    /// Per-rotation weekdays on which its fellows are call-ineligible.
    pub rotation_weekday_exclusions: HashMap<String, Vec<Weekday>>,
    /// Exclude fellows who would hold a specialty clinic the next day.
    pub pre_clinic_exclusion: bool,
}

impl CallRules {
    /// Tier priority order for a weekday.
    pub fn priority_for(&self, weekday: Weekday) -> &[PgyLevel] {
        let idx = weekday.num_days_from_monday() as usize;
        self.weekday_priority
            .get(idx)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Quota for a tier (0 when unconfigured).
    pub fn quota_for(&self, level: PgyLevel) -> u32 {
        self.quotas.get(&level).copied().unwrap_or(0)
    }
}

impl Default for CallRules {
    fn default() -> Self {
        let weekday = vec![PgyLevel::Pgy5, PgyLevel::Pgy6, PgyLevel::Pgy4];
        let midweek = vec![PgyLevel::Pgy6, PgyLevel::Pgy5, PgyLevel::Pgy4];
        Self {
            min_spacing_days: 4,
            no_consecutive_saturdays: true,
            quotas: HashMap::from([
                (PgyLevel::Pgy4, 40),
                (PgyLevel::Pgy5, 45),
                (PgyLevel::Pgy6, 40),
            ]),
            weekday_priority: vec![
                weekday.clone(), // Mon
                weekday.clone(), // Tue
                midweek,         // Wed
                weekday.clone(), // Thu
                weekday.clone(), // Fri
                weekday.clone(), // Sat (unused; weekend_priority applies)
                weekday,         // Sun (unused; weekend_priority applies)
            ],
            weekend_priority: vec![PgyLevel::Pgy5, PgyLevel::Pgy6],
            junior_call_start: (8, 1),
            junior_weekend_cutoff: (9, 1),
            excluded_rotations: HashSet::from(["NIGHTS".to_string()]),
            rotation_weekday_exclusions: HashMap::from([(
                "CATH".to_string(),
                vec![Weekday::Thu],
            )]),
            pre_clinic_exclusion: true,
        }
    }
}

/// Vacation-block solver rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VacationRules {
    /// Minimum block-index distance between a fellow's two vacation blocks.
    pub min_gap_blocks: u8,
    /// Maximum fellows on vacation in one block, across all tiers.
    pub max_per_block: u32,
    /// Vacation blocks granted per fellow.
    pub blocks_per_fellow: u8,
    /// Placement-try ceiling per solver attempt.
    pub attempt_limit: u32,
    /// Wall-clock budget per solver attempt, in milliseconds.
    pub time_budget_ms: u64,
}

impl Default for VacationRules {
    fn default() -> Self {
        Self {
            min_gap_blocks: 6,
            max_per_block: 2,
            blocks_per_fellow: 2,
            attempt_limit: 20_000,
            time_budget_ms: 1_000,
        }
    }
}

/// Weekend/holiday heart-failure coverage rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HfRules {
    /// Minimum days between two HF assignments for one fellow.
    pub min_spacing_days: i64,
    /// Annual weekend quota per tier.
    pub weekend_quotas: HashMap<PgyLevel, u32>,
    /// Tier whose quota is a hard cap even under relaxation.
    pub hard_cap_level: PgyLevel,
    /// Tiers eligible for holiday blocks (senior policy applies on top).
    pub holiday_levels: Vec<PgyLevel>,
    /// How Pgy6 participates in holiday blocks.
    pub senior_holiday_policy: SeniorHolidayPolicy,
    /// Rotation code that mandates one weekend per block.
    pub rotation: String,
    /// Rotations whose fellows never take HF coverage.
    pub excluded_rotations: HashSet<String>,
    /// Fair-distribution pass ceiling.
    pub max_passes: u32,
}

impl HfRules {
    /// Weekend quota for a tier (0 when unconfigured).
    pub fn quota_for(&self, level: PgyLevel) -> u32 {
        self.weekend_quotas.get(&level).copied().unwrap_or(0)
    }
}

impl Default for HfRules {
    fn default() -> Self {
        Self {
            min_spacing_days: 13,
            weekend_quotas: HashMap::from([
                (PgyLevel::Pgy4, 6),
                (PgyLevel::Pgy5, 8),
                (PgyLevel::Pgy6, 4),
            ]),
            hard_cap_level: PgyLevel::Pgy6,
            holiday_levels: vec![PgyLevel::Pgy5],
            senior_holiday_policy: SeniorHolidayPolicy::GeneralEligibility,
            rotation: super::rotation::HEART_FAILURE.to_string(),
            excluded_rotations: HashSet::from(["NIGHTS".to_string()]),
            max_passes: 4,
        }
    }
}

/// One specialty clinic's slot definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecialtyClinicRule {
    /// Which clinic this rule defines.
    pub clinic: ClinicType,
    /// Weekday the clinic runs.
    pub weekday: Weekday,
    /// Weeks of the month (1-5) the clinic runs.
    pub weeks_of_month: Vec<u8>,
    /// Rotations whose fellows may staff the clinic.
    pub rotations: HashSet<String>,
    /// Tiers that may staff the clinic.
    pub levels: Vec<PgyLevel>,
}

impl SpecialtyClinicRule {
    /// Whether the rule defines a slot on this date.
    pub fn applies_on(&self, date: chrono::NaiveDate) -> bool {
        use chrono::Datelike;
        date.weekday() == self.weekday
            && self
                .weeks_of_month
                .contains(&super::year::week_of_month(date))
    }
}

/// Clinic and ambulatory rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClinicRules {
    /// Specialty clinic slot definitions.
    pub specialty: Vec<SpecialtyClinicRule>,
    /// Weekdays on which general continuity clinic runs.
    pub general_weekdays: Vec<Weekday>,
    /// Rotations excluded from general clinic.
    pub general_excluded_rotations: HashSet<String>,
    /// Rotation codes scanned, in order, for the ambulatory fellow.
    pub ambulatory_rotation_priority: Vec<String>,
    /// Maximum ambulatory blocks per fellow per year.
    pub ambulatory_max: u32,
    /// Tiers that may serve as ambulatory fellow.
    pub ambulatory_levels: Vec<PgyLevel>,
}

impl Default for ClinicRules {
    fn default() -> Self {
        Self {
            specialty: vec![
                SpecialtyClinicRule {
                    clinic: ClinicType::HeartFailure,
                    weekday: Weekday::Mon,
                    weeks_of_month: vec![1, 2, 3, 4, 5],
                    rotations: HashSet::from(["HF".to_string(), "CONSULT".to_string()]),
                    levels: vec![PgyLevel::Pgy5, PgyLevel::Pgy6],
                },
                SpecialtyClinicRule {
                    clinic: ClinicType::Achd,
                    weekday: Weekday::Tue,
                    weeks_of_month: vec![1, 3],
                    rotations: HashSet::from(["ECHO".to_string(), "CONSULT".to_string()]),
                    levels: vec![PgyLevel::Pgy5, PgyLevel::Pgy6],
                },
                SpecialtyClinicRule {
                    clinic: ClinicType::Device,
                    weekday: Weekday::Wed,
                    weeks_of_month: vec![2, 4],
                    rotations: HashSet::from(["EP".to_string()]),
                    levels: vec![PgyLevel::Pgy5, PgyLevel::Pgy6],
                },
                SpecialtyClinicRule {
                    clinic: ClinicType::Ep,
                    weekday: Weekday::Thu,
                    weeks_of_month: vec![1, 2, 3, 4, 5],
                    rotations: HashSet::from(["EP".to_string()]),
                    levels: vec![PgyLevel::Pgy4, PgyLevel::Pgy5, PgyLevel::Pgy6],
                },
            ],
            general_weekdays: vec![
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
            ],
            general_excluded_rotations: HashSet::from(["NIGHTS".to_string(), "CCU".to_string()]),
            ambulatory_rotation_priority: vec![
                "ELECTIVE".to_string(),
                "ECHO".to_string(),
                "CONSULT".to_string(),
            ],
            ambulatory_max: 3,
            ambulatory_levels: vec![PgyLevel::Pgy6],
        }
    }
}

/// Complete rule configuration for one scheduling run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Primary-call rules.
    pub call: CallRules,
    /// Vacation-block solver rules.
    pub vacation: VacationRules,
    /// HF coverage rules.
    pub hf: HfRules,
    /// Clinic and ambulatory rules.
    pub clinic: ClinicRules,
}
