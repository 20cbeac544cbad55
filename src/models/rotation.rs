//! Rotation-block assignments.
//!
//! Maps each fellow and half-month block to a rotation code. The table is
//! produced by the block-rotation builder and the vacation solver; every
//! other scheduler consumes it read-only.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::year::AcademicYear;

/// Rotation code for a vacation block.
pub const VACATION: &str = "VAC";
/// Rotation code for the heart-failure inpatient service.
pub const HEART_FAILURE: &str = "HF";

/// Fellow x block -> rotation code table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RotationTable {
    /// Per-fellow block assignments.
    by_fellow: HashMap<String, BTreeMap<u8, String>>,
}

impl RotationTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one assignment (builder form).
    pub fn with_assignment(
        mut self,
        fellow: impl Into<String>,
        block: u8,
        rotation: impl Into<String>,
    ) -> Self {
        self.set(fellow, block, rotation);
        self
    }

    /// Sets one assignment.
    pub fn set(&mut self, fellow: impl Into<String>, block: u8, rotation: impl Into<String>) {
        self.by_fellow
            .entry(fellow.into())
            .or_default()
            .insert(block, rotation.into());
    }

    /// Rotation code for a fellow during a block.
    pub fn get(&self, fellow: &str, block: u8) -> Option<&str> {
        self.by_fellow
            .get(fellow)
            .and_then(|blocks| blocks.get(&block))
            .map(String::as_str)
    }

    /// Rotation code for a fellow on a calendar date.
    pub fn rotation_on(&self, fellow: &str, date: NaiveDate, year: &AcademicYear) -> Option<&str> {
        year.block_of(date).and_then(|b| self.get(fellow, b))
    }

    /// Whether a fellow is on vacation during a block.
    pub fn is_vacation(&self, fellow: &str, block: u8) -> bool {
        self.get(fellow, block) == Some(VACATION)
    }

    /// Whether a fellow is on vacation on a calendar date.
    pub fn is_vacation_on(&self, fellow: &str, date: NaiveDate, year: &AcademicYear) -> bool {
        self.rotation_on(fellow, date, year) == Some(VACATION)
    }

    /// Fellow ids assigned to a rotation during a block.
    pub fn fellows_on(&self, rotation: &str, block: u8) -> Vec<&str> {
        let mut out: Vec<&str> = self
            .by_fellow
            .iter()
            .filter(|(_, blocks)| blocks.get(&block).map(String::as_str) == Some(rotation))
            .map(|(id, _)| id.as_str())
            .collect();
        out.sort_unstable();
        out
    }

    /// Blocks a fellow spends on a rotation, ascending.
    pub fn blocks_on(&self, fellow: &str, rotation: &str) -> Vec<u8> {
        self.by_fellow
            .get(fellow)
            .map(|blocks| {
                blocks
                    .iter()
                    .filter(|(_, r)| r.as_str() == rotation)
                    .map(|(b, _)| *b)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of assignments in the table.
    pub fn len(&self) -> usize {
        self.by_fellow.values().map(BTreeMap::len).sum()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fellows named anywhere in the table, sorted.
    pub fn fellows(&self) -> Vec<&str> {
        let mut out: Vec<&str> = self.by_fellow.keys().map(String::as_str).collect();
        out.sort_unstable();
        out
    }
}
