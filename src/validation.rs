//! Input validation for a scheduling run.
//!
//! Checks structural integrity of the roster, academic year, rotation
//! table, and rule configuration before any scheduler runs. Detects:
//! - Duplicate fellow IDs
//! - An empty roster
//! - Vacation preferences outside the block range
//! - Tiers present on the roster with no configured quota
//! - Rotation assignments for fellows not on the roster
//! - Holidays dated outside the academic year

use std::collections::HashSet;

use crate::models::{AcademicYear, Fellow, RotationTable, RuleConfig, BLOCKS_PER_YEAR};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two fellows share the same ID.
    DuplicateId,
    /// The roster has no fellows.
    EmptyRoster,
    /// A vacation preference names a block outside `0..BLOCKS_PER_YEAR`.
    InvalidVacationPreference,
    /// A roster tier has no call or HF quota configured.
    MissingQuota,
    /// The rotation table names a fellow not on the roster.
    UnknownRotationReference,
    /// A holiday is dated outside the academic year.
    HolidayOutOfYear,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates the input data for a scheduling run.
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_input(
    roster: &[Fellow],
    year: &AcademicYear,
    rotations: &RotationTable,
    rules: &RuleConfig,
) -> ValidationResult {
    let mut errors = Vec::new();

    if roster.is_empty() {
        errors.push(ValidationError::new(
            ValidationErrorKind::EmptyRoster,
            "roster has no fellows",
        ));
    }

    let mut ids = HashSet::new();
    for fellow in roster {
        if !ids.insert(fellow.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("duplicate fellow ID: {}", fellow.id),
            ));
        }
        for &block in &fellow.vacation_prefs {
            if block >= BLOCKS_PER_YEAR {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidVacationPreference,
                    format!(
                        "{} prefers vacation block {block}, outside 0..{BLOCKS_PER_YEAR}",
                        fellow.id
                    ),
                ));
            }
        }
    }

    let levels: HashSet<_> = roster.iter().map(|f| f.level).collect();
    for level in levels {
        if !rules.call.quotas.contains_key(&level) {
            errors.push(ValidationError::new(
                ValidationErrorKind::MissingQuota,
                format!("no call quota configured for {}", level.label()),
            ));
        }
        if !rules.hf.weekend_quotas.contains_key(&level) {
            errors.push(ValidationError::new(
                ValidationErrorKind::MissingQuota,
                format!("no HF weekend quota configured for {}", level.label()),
            ));
        }
    }

    for fellow in rotations.fellows() {
        if !ids.contains(fellow) {
            errors.push(ValidationError::new(
                ValidationErrorKind::UnknownRotationReference,
                format!("rotation table names unknown fellow '{fellow}'"),
            ));
        }
    }

    for holiday in &year.holidays {
        if !year.contains(holiday.date) {
            errors.push(ValidationError::new(
                ValidationErrorKind::HolidayOutOfYear,
                format!("holiday '{}' on {} is outside the year", holiday.name, holiday.date),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
