//! Fellow and seniority models.
//!
//! A fellow is a medical trainee rostered for one academic year. Fellows
//! are created by the setup layer and are immutable to the engine: every
//! scheduler reads the roster, none writes it.

use chrono::Weekday;
use serde::{Deserialize, Serialize};

/// Seniority tier of a fellow (post-graduate year).
///
/// Ordered: `Pgy4 < Pgy5 < Pgy6`. Pgy4 is the most junior tier and is
/// subject to the junior call-start and weekend-cutoff rules in
/// [`crate::models::CallRules`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PgyLevel {
    /// First-year fellow (most junior).
    Pgy4,
    /// Second-year fellow.
    Pgy5,
    /// Third-year fellow (most senior).
    Pgy6,
}

impl PgyLevel {
    /// All tiers, junior first.
    pub const ALL: [PgyLevel; 3] = [PgyLevel::Pgy4, PgyLevel::Pgy5, PgyLevel::Pgy6];

    /// Short display label.
    pub fn label(&self) -> &'static str {
        match self {
            PgyLevel::Pgy4 => "PGY-4",
            PgyLevel::Pgy5 => "PGY-5",
            PgyLevel::Pgy6 => "PGY-6",
        }
    }
}

/// A rostered fellow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fellow {
    /// Stable identifier (unique within a roster).
    pub id: String,
    /// Display name.
    pub name: String,
    /// Seniority tier for this academic year.
    pub level: PgyLevel,
    /// Ordered vacation-block preferences (block indices, most wanted first).
    pub vacation_prefs: Vec<u8>,
    /// Preferred weekday for general continuity clinic, if any.
    pub clinic_weekday: Option<Weekday>,
}

impl Fellow {
    /// Creates a fellow with no preferences.
    pub fn new(id: impl Into<String>, name: impl Into<String>, level: PgyLevel) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            level,
            vacation_prefs: Vec::new(),
            clinic_weekday: None,
        }
    }

    /// Sets the ordered vacation-block preferences.
    pub fn with_vacation_prefs(mut self, prefs: Vec<u8>) -> Self {
        self.vacation_prefs = prefs;
        self
    }

    /// Sets the preferred general-clinic weekday.
    pub fn with_clinic_weekday(mut self, weekday: Weekday) -> Self {
        self.clinic_weekday = Some(weekday);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordering() {
        assert!(PgyLevel::Pgy4 < PgyLevel::Pgy5);
        assert!(PgyLevel::Pgy5 < PgyLevel::Pgy6);
        assert_eq!(PgyLevel::ALL[0], PgyLevel::Pgy4);
    }

    #[test]
    fn test_fellow_builder() {
        let f = Fellow::new("f1", "Alice Chen", PgyLevel::Pgy5)
            .with_vacation_prefs(vec![3, 17])
            .with_clinic_weekday(Weekday::Tue);
        assert_eq!(f.id, "f1");
        assert_eq!(f.level.label(), "PGY-5");
        assert_eq!(f.vacation_prefs, vec![3, 17]);
        assert_eq!(f.clinic_weekday, Some(Weekday::Tue));
    }

    #[test]
    fn test_fellow_serde_round_trip() {
        let f = Fellow::new("f2", "Brook Patel", PgyLevel::Pgy4).with_vacation_prefs(vec![8]);
        let json = serde_json::to_string(&f).unwrap();
        let back: Fellow = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, "f2");
        assert_eq!(back.level, PgyLevel::Pgy4);
        assert_eq!(back.vacation_prefs, vec![8]);
    }
}
