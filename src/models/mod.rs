//! Roster domain models.
//!
//! Value objects for the rostering engine. Schedule types are created by a
//! build operation and thereafter only replaced wholesale by edit
//! operations, never mutated in place, so validation always runs against a
//! complete candidate state.
//!
//! | Type | Role |
//! |------|------|
//! | `Fellow` | A rostered trainee with tier and preferences |
//! | `AcademicYear` | July-June calendar, holidays, half-month blocks |
//! | `RotationTable` | Fellow x block -> rotation code |
//! | `CallSchedule` | Day -> fellow primary call, with equity counts |
//! | `HfSchedule` | Weekend/holiday heart-failure coverage |
//! | `ClinicSchedule` | Daily clinic + block ambulatory assignments |
//! | `RuleConfig` | Every tunable threshold, loaded once per run |

mod call;
mod clinic;
mod fellow;
mod hf;
mod rotation;
mod rules;
mod year;

pub use call::{
    equity_category, CallAudit, CallSchedule, CountDrift, EquityCategory, QuotaExcess,
};
pub use clinic::{ClinicAssignment, ClinicSchedule, ClinicType};
pub use fellow::{Fellow, PgyLevel};
pub use hf::{HfSchedule, HolidayBlockAssignment};
pub use rotation::{RotationTable, HEART_FAILURE, VACATION};
pub use rules::{
    CallRules, ClinicRules, HfRules, RuleConfig, SeniorHolidayPolicy, SpecialtyClinicRule,
    VacationRules,
};
pub use year::{
    default_holidays, expand_holiday, is_weekend, week_of_month, weekend_start, AcademicYear,
    Holiday, HolidayBlock, BLOCKS_PER_YEAR,
};
