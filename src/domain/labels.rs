use serde::{Deserialize, Serialize};
use std::fmt;

/// Label shown when the service returns a class outside the table.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Obesity categories, indexed by the classifier's class id.
///
/// Order matches the label encoding used when the model was trained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObesityLevel {
    InsufficientWeight,
    NormalWeight,
    ObesityTypeI,
    ObesityTypeII,
    ObesityTypeIII,
    OverweightLevelI,
    OverweightLevelII,
}

impl ObesityLevel {
    pub const ALL: [ObesityLevel; 7] = [
        ObesityLevel::InsufficientWeight,
        ObesityLevel::NormalWeight,
        ObesityLevel::ObesityTypeI,
        ObesityLevel::ObesityTypeII,
        ObesityLevel::ObesityTypeIII,
        ObesityLevel::OverweightLevelI,
        ObesityLevel::OverweightLevelII,
    ];

    pub fn from_index(index: i64) -> Option<Self> {
        usize::try_from(index)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
    }

    pub fn index(&self) -> u32 {
        *self as u32
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::InsufficientWeight => "Insufficient Weight",
            Self::NormalWeight => "Normal Weight",
            Self::ObesityTypeI => "Obesity Type I",
            Self::ObesityTypeII => "Obesity Type II",
            Self::ObesityTypeIII => "Obesity Type III",
            Self::OverweightLevelI => "Overweight Level I",
            Self::OverweightLevelII => "Overweight Level II",
        }
    }
}

impl fmt::Display for ObesityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Display label for a class index, `"Unknown"` when unmapped.
pub fn label_for(index: i64) -> &'static str {
    ObesityLevel::from_index(index)
        .map(|level| level.label())
        .unwrap_or(UNKNOWN_LABEL)
}

/// Number of entries in the label table.
pub fn num_labels() -> usize {
    ObesityLevel::ALL.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_total_over_known_classes() {
        let expected = [
            "Insufficient Weight",
            "Normal Weight",
            "Obesity Type I",
            "Obesity Type II",
            "Obesity Type III",
            "Overweight Level I",
            "Overweight Level II",
        ];
        for (i, label) in expected.iter().enumerate() {
            assert_eq!(label_for(i as i64), *label);
            assert_eq!(ObesityLevel::ALL[i].index(), i as u32);
        }
    }

    #[test]
    fn out_of_range_is_unknown() {
        assert_eq!(label_for(7), UNKNOWN_LABEL);
        assert_eq!(label_for(-1), UNKNOWN_LABEL);
        assert_eq!(label_for(i64::MAX), UNKNOWN_LABEL);
    }
}
