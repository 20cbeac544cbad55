//! Clinic schedule (solution) model.
//!
//! Day-level clinic assignments plus the block-level ambulatory-fellow
//! map. Built by the clinic scheduler; replaced wholesale on edit.

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use super::year::AcademicYear;

/// Kind of outpatient clinic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ClinicType {
    /// Heart-failure specialty clinic.
    HeartFailure,
    /// Adult congenital heart disease clinic.
    Achd,
    /// Device interrogation clinic.
    Device,
    /// Electrophysiology clinic.
    Ep,
    /// General continuity clinic.
    General,
}

impl ClinicType {
    /// Specialty clinic kinds (everything except general).
    pub const SPECIALTY: [ClinicType; 4] = [
        ClinicType::HeartFailure,
        ClinicType::Achd,
        ClinicType::Device,
        ClinicType::Ep,
    ];

    /// Whether this is a specialty (non-general) clinic.
    pub fn is_specialty(&self) -> bool {
        *self != ClinicType::General
    }
}

/// One fellow-to-clinic assignment on a day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClinicAssignment {
    /// Assigned fellow id.
    pub fellow: String,
    /// Clinic kind.
    pub clinic: ClinicType,
}

/// A complete clinic and ambulatory schedule.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClinicSchedule {
    /// Day -> clinic assignments (possibly several per day).
    pub days: BTreeMap<NaiveDate, Vec<ClinicAssignment>>,
    /// Fellow -> clinic kind -> assignment count.
    pub counts: HashMap<String, HashMap<ClinicType, u32>>,
    /// Block index -> ambulatory fellow id.
    pub ambulatory: BTreeMap<u8, String>,
    /// Fellow -> ambulatory block count.
    pub ambulatory_counts: HashMap<String, u32>,
}

impl ClinicSchedule {
    /// Creates an empty schedule.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a clinic assignment and updates the count maps.
    pub fn assign(&mut self, date: NaiveDate, fellow: impl Into<String>, clinic: ClinicType) {
        let fellow = fellow.into();
        self.days.entry(date).or_default().push(ClinicAssignment {
            fellow: fellow.clone(),
            clinic,
        });
        *self
            .counts
            .entry(fellow)
            .or_default()
            .entry(clinic)
            .or_insert(0) += 1;
    }

    /// Records an ambulatory-fellow block assignment. The block map is the
    /// sole representation of ambulatory duty: the fellow covers every day
    /// of the block, resolved per day through [`ambulatory_on`](Self::ambulatory_on)
    /// rather than expanded into `days`.
    pub fn assign_ambulatory(&mut self, block: u8, fellow: impl Into<String>) {
        let fellow = fellow.into();
        self.ambulatory.insert(block, fellow.clone());
        *self.ambulatory_counts.entry(fellow).or_insert(0) += 1;
    }

    /// Ambulatory fellow on duty for a date, resolved through the block map.
    pub fn ambulatory_on(&self, year: &AcademicYear, date: NaiveDate) -> Option<&str> {
        let block = year.block_of(date)?;
        self.ambulatory.get(&block).map(String::as_str)
    }

    /// Whether a fellow already holds any clinic on a day.
    pub fn has_clinic_on(&self, fellow: &str, date: NaiveDate) -> bool {
        self.days
            .get(&date)
            .is_some_and(|list| list.iter().any(|a| a.fellow == fellow))
    }

    /// Assignments of a given clinic kind on a day.
    pub fn assignment_on(&self, date: NaiveDate, clinic: ClinicType) -> Option<&ClinicAssignment> {
        self.days
            .get(&date)
            .and_then(|list| list.iter().find(|a| a.clinic == clinic))
    }

    /// Whether a fellow holds a specialty clinic during the Monday-Sunday
    /// calendar week containing `date`.
    pub fn has_specialty_in_week(&self, fellow: &str, date: NaiveDate) -> bool {
        let monday = date - Duration::days(i64::from(date.weekday().num_days_from_monday()));
        (0..7).any(|i| {
            let day = monday + Duration::days(i);
            self.days.get(&day).is_some_and(|list| {
                list.iter()
                    .any(|a| a.fellow == fellow && a.clinic.is_specialty())
            })
        })
    }

    /// Count of one clinic kind for a fellow.
    pub fn count_of(&self, fellow: &str, clinic: ClinicType) -> u32 {
        self.counts
            .get(fellow)
            .and_then(|m| m.get(&clinic))
            .copied()
            .unwrap_or(0)
    }

    /// Total specialty-clinic count for a fellow.
    pub fn specialty_total(&self, fellow: &str) -> u32 {
        self.counts
            .get(fellow)
            .map(|m| {
                m.iter()
                    .filter(|(c, _)| c.is_specialty())
                    .map(|(_, n)| *n)
                    .sum()
            })
            .unwrap_or(0)
    }

    /// Ambulatory block count for a fellow.
    pub fn ambulatory_count(&self, fellow: &str) -> u32 {
        self.ambulatory_counts.get(fellow).copied().unwrap_or(0)
    }
}
