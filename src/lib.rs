//! Fellowship duty rostering engine.
//!
//! Builds a cardiology fellowship's annual duty roster: vacation blocks,
//! daily primary call, weekend and holiday heart-failure coverage, and
//! outpatient clinic staffing. Every scheduler is a pure, synchronous
//! transform; callers supply the roster, academic year, rotation table,
//! and rule configuration, and get back freshly built schedule values.
//!
//! # Modules
//!
//! - **`models`**: domain types such as `Fellow`, `AcademicYear`, `RotationTable`,
//!   `CallSchedule`, `HfSchedule`, `ClinicSchedule`, `RuleConfig`
//! - **`eligibility`**: per-date candidate pools and tier priority
//! - **`scheduler`**: the vacation solver, call scheduler and editor, HF
//!   coverage scheduler, and clinic scheduler
//! - **`validation`**: input integrity checks (duplicate IDs, quota gaps,
//!   dangling rotation references)
//! - **`store`**: the persistence boundary; absent or corrupt data loads
//!   as `None`
//!
//! # Pipeline
//!
//! Roster + rotation table + rules feed the `VacationSolver`, whose output
//! table feeds the `CallScheduler`; the resulting call schedule feeds the
//! `HfScheduler` and `ClinicScheduler` independently. Infeasible slots are
//! returned as data (uncovered days, missed mandatory weekends, clinic
//! gaps), never as errors.

pub mod eligibility;
pub mod models;
pub mod scheduler;
pub mod store;
pub mod validation;
