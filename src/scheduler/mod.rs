//! Roster schedulers.
//!
//! Four stages, each a pure transform of its inputs:
//!
//! 1. `VacationSolver` fills vacation blocks into the rotation table.
//! 2. `CallScheduler` builds the day-by-day primary call map;
//!    `CallEditor` validates and applies manual edits to it.
//! 3. `HfScheduler` covers weekends and holiday blocks with heart-failure
//!    duty, reading the call schedule.
//! 4. `ClinicScheduler` staffs specialty, general, and ambulatory clinics,
//!    also reading the call schedule.
//!
//! Stages 3 and 4 are independent of each other and can run in either
//! order. Infeasibility is data, not an error: every build outcome carries
//! its uncovered slots and diagnostics.

mod call;
mod call_edit;
mod clinic;
mod hf;
mod vacation;

pub use call::{CallBuildOutcome, CallScheduler};
pub use call_edit::{CallEditor, EditResult, SwapSuggestion};
pub use clinic::{ClinicBuildOutcome, ClinicGap, ClinicScheduler};
pub use hf::{HfBuildOutcome, HfEditResult, HfScheduler, MandatoryMiss};
pub use vacation::{VacationOutcome, VacationSolver};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AcademicYear, Fellow, PgyLevel, RotationTable, RuleConfig};
    use chrono::Duration;

    /// Runs the whole pipeline on a 12-fellow roster and checks the
    /// cross-stage invariants: nobody works through a vacation block, and
    /// HF or clinic duty never collides with primary call.
    #[test]
    fn test_pipeline_invariants() {
        let year = AcademicYear::new(2025).with_default_holidays();
        let prefs: [(u8, u8); 12] = [
            (0, 14),
            (1, 15),
            (2, 16),
            (3, 17),
            (4, 18),
            (5, 19),
            (6, 20),
            (7, 21),
            (2, 22),
            (3, 23),
            (4, 20),
            (5, 21),
        ];
        let mut roster = Vec::new();
        for (i, (level, prefix)) in [
            (PgyLevel::Pgy4, "j"),
            (PgyLevel::Pgy5, "m"),
            (PgyLevel::Pgy6, "s"),
        ]
        .into_iter()
        .enumerate()
        {
            for n in 1..=4usize {
                let (a, b) = prefs[i * 4 + n - 1];
                roster.push(
                    Fellow::new(format!("{prefix}{n}"), format!("{prefix}{n}"), level)
                        .with_vacation_prefs(vec![a, b]),
                );
            }
        }
        let rules = RuleConfig::default();

        let vacation = VacationSolver::new(&roster, &rules, &RotationTable::new())
            .with_seed(3)
            .solve();
        assert!(vacation.complete, "{:?}", vacation.diagnostics);

        let call = CallScheduler::new(&year, &roster, &vacation.table, &rules)
            .with_seed(3)
            .build();
        assert!(call.uncovered.len() <= 3, "{:?}", call.uncovered);
        for (date, fellow) in &call.schedule.days {
            assert!(
                !vacation.table.is_vacation_on(fellow, *date, &year),
                "{fellow} on call during vacation, {date}"
            );
        }
        assert!(call
            .schedule
            .audit(&year, &roster, &rules.call)
            .is_clean());

        let hf = HfScheduler::new(&year, &roster, &vacation.table, &call.schedule, &rules).build();
        for (saturday, fellow) in &hf.schedule.weekends {
            for offset in -1..=1 {
                let day = *saturday + Duration::days(offset);
                assert_ne!(
                    call.schedule.fellow_on(day),
                    Some(fellow.as_str()),
                    "{fellow} holds call and HF around {saturday}"
                );
            }
        }

        let clinic =
            ClinicScheduler::new(&year, &roster, &vacation.table, &call.schedule, &rules).build();
        for (date, assignments) in &clinic.schedule.days {
            let post_call = call.schedule.fellow_on(*date - Duration::days(1));
            for a in assignments {
                assert_ne!(post_call, Some(a.fellow.as_str()), "post-call clinic on {date}");
            }
        }
    }
}
