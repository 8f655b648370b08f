//! Core data model types for cellcheck.
//!
//! Questions, skill categories, difficulty levels, candidates and the
//! session phase enum shared by every other module.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Excel skill areas a question can cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillCategory {
    Formulas,
    PivotTables,
    DataAnalysis,
    Lookups,
    Macros,
    Charts,
    PowerQuery,
    ConditionalFormatting,
}

impl SkillCategory {
    /// All categories in rotation order.
    pub const ALL: [SkillCategory; 8] = [
        SkillCategory::Formulas,
        SkillCategory::PivotTables,
        SkillCategory::DataAnalysis,
        SkillCategory::Lookups,
        SkillCategory::Macros,
        SkillCategory::Charts,
        SkillCategory::PowerQuery,
        SkillCategory::ConditionalFormatting,
    ];

    /// Stable identifier used in config files and URLs.
    pub fn slug(&self) -> &'static str {
        match self {
            SkillCategory::Formulas => "formulas",
            SkillCategory::PivotTables => "pivot_tables",
            SkillCategory::DataAnalysis => "data_analysis",
            SkillCategory::Lookups => "lookups",
            SkillCategory::Macros => "macros",
            SkillCategory::Charts => "charts",
            SkillCategory::PowerQuery => "power_query",
            SkillCategory::ConditionalFormatting => "conditional_formatting",
        }
    }

    /// Human-readable name.
    pub fn display_name(&self) -> &'static str {
        match self {
            SkillCategory::Formulas => "Formulas & Functions",
            SkillCategory::PivotTables => "Pivot Tables",
            SkillCategory::DataAnalysis => "Data Analysis",
            SkillCategory::Lookups => "VLOOKUP & Lookups",
            SkillCategory::Macros => "Macros & VBA",
            SkillCategory::Charts => "Charts & Visualization",
            SkillCategory::PowerQuery => "Power Query & Power Pivot",
            SkillCategory::ConditionalFormatting => "Conditional Formatting",
        }
    }
}

impl fmt::Display for SkillCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for SkillCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        let normalized = wanted.to_lowercase().replace(['-', ' '], "_");
        SkillCategory::ALL
            .iter()
            .copied()
            .find(|c| c.slug() == normalized || c.display_name().eq_ignore_ascii_case(wanted))
            .or(match normalized.as_str() {
                "vlookup" | "lookup" => Some(SkillCategory::Lookups),
                "vba" => Some(SkillCategory::Macros),
                "pivot" => Some(SkillCategory::PivotTables),
                _ => None,
            })
            .ok_or_else(|| format!("unknown skill category: {s}"))
    }
}

/// Question difficulty, ordered from easiest to hardest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Expert,
}

impl Difficulty {
    /// Zero-based rank, used for distance ordering.
    pub fn rank(&self) -> u8 {
        match self {
            Difficulty::Easy => 0,
            Difficulty::Medium => 1,
            Difficulty::Hard => 2,
            Difficulty::Expert => 3,
        }
    }

    /// One level up, saturating at `Expert`.
    pub fn harder(&self) -> Difficulty {
        match self {
            Difficulty::Easy => Difficulty::Medium,
            Difficulty::Medium => Difficulty::Hard,
            Difficulty::Hard | Difficulty::Expert => Difficulty::Expert,
        }
    }

    /// One level down, saturating at `Easy`.
    pub fn easier(&self) -> Difficulty {
        match self {
            Difficulty::Easy | Difficulty::Medium => Difficulty::Easy,
            Difficulty::Hard => Difficulty::Medium,
            Difficulty::Expert => Difficulty::Hard,
        }
    }

    /// Absolute rank distance between two difficulty levels.
    pub fn distance(&self, other: Difficulty) -> u8 {
        self.rank().abs_diff(other.rank())
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "easy"),
            Difficulty::Medium => write!(f, "medium"),
            Difficulty::Hard => write!(f, "hard"),
            Difficulty::Expert => write!(f, "expert"),
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            "expert" => Ok(Difficulty::Expert),
            other => Err(format!("unknown difficulty: {other}")),
        }
    }
}

/// A single interview question drawn from the question bank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Unique identifier within the bank.
    pub id: String,
    /// The question as asked.
    pub text: String,
    pub category: SkillCategory,
    pub difficulty: Difficulty,
    /// Concepts a good answer should mention. Drives fallback scoring.
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Optional deeper question an interviewer could ask next.
    #[serde(default)]
    pub follow_up: Option<String>,
}

/// The person being assessed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    /// Self-described background, e.g. "financial analyst, 5 years".
    #[serde(default)]
    pub experience: Option<String>,
}

impl Candidate {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: None,
            experience: None,
        }
    }
}

/// Life-cycle stage of an interview session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Init,
    Questioning,
    Evaluating,
    Completed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Init => write!(f, "init"),
            Phase::Questioning => write!(f, "questioning"),
            Phase::Evaluating => write!(f, "evaluating"),
            Phase::Completed => write!(f, "completed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_parse() {
        assert_eq!(
            "formulas".parse::<SkillCategory>().unwrap(),
            SkillCategory::Formulas
        );
        assert_eq!(
            "Pivot Tables".parse::<SkillCategory>().unwrap(),
            SkillCategory::PivotTables
        );
        assert_eq!(
            "power-query".parse::<SkillCategory>().unwrap(),
            SkillCategory::PowerQuery
        );
        assert_eq!(
            "VLOOKUP & Lookups".parse::<SkillCategory>().unwrap(),
            SkillCategory::Lookups
        );
        assert_eq!(
            "vba".parse::<SkillCategory>().unwrap(),
            SkillCategory::Macros
        );
        assert!("cooking".parse::<SkillCategory>().is_err());
    }

    #[test]
    fn category_slug_roundtrips_through_parse() {
        for category in SkillCategory::ALL {
            assert_eq!(category.slug().parse::<SkillCategory>().unwrap(), category);
        }
    }

    #[test]
    fn difficulty_display_and_parse() {
        assert_eq!(Difficulty::Hard.to_string(), "hard");
        assert_eq!("EXPERT".parse::<Difficulty>().unwrap(), Difficulty::Expert);
        assert!("impossible".parse::<Difficulty>().is_err());
    }

    #[test]
    fn difficulty_steps_saturate() {
        assert_eq!(Difficulty::Medium.harder(), Difficulty::Hard);
        assert_eq!(Difficulty::Expert.harder(), Difficulty::Expert);
        assert_eq!(Difficulty::Hard.easier(), Difficulty::Medium);
        assert_eq!(Difficulty::Easy.easier(), Difficulty::Easy);
    }

    #[test]
    fn difficulty_distance() {
        assert_eq!(Difficulty::Easy.distance(Difficulty::Expert), 3);
        assert_eq!(Difficulty::Hard.distance(Difficulty::Medium), 1);
        assert_eq!(Difficulty::Medium.distance(Difficulty::Medium), 0);
    }

    #[test]
    fn phase_serializes_lowercase() {
        let json = serde_json::to_string(&Phase::Questioning).unwrap();
        assert_eq!(json, "\"questioning\"");
        assert!(Phase::Init < Phase::Completed);
    }
}
