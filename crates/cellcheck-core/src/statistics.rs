//! Score aggregation.
//!
//! Overall score policy: the mean score of each category present is
//! weighted by that category's importance,
//!
//!   overall = Σ(wᶜ · meanᶜ) / Σ(wᶜ)
//!
//! With a single category, or with all weights equal to 1.0 (the default)
//! and one answer per category, this is the plain mean of all answers.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::SkillCategory;

/// Per-category importance used when combining category means.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryWeights(BTreeMap<SkillCategory, f64>);

impl CategoryWeights {
    /// Weight 1.0 for every category.
    pub fn uniform() -> Self {
        Self(BTreeMap::new())
    }

    /// Set the weight for one category. Non-positive or non-finite weights
    /// are stored as 1.0.
    pub fn with(mut self, category: SkillCategory, weight: f64) -> Self {
        self.set(category, weight);
        self
    }

    pub fn set(&mut self, category: SkillCategory, weight: f64) {
        let weight = if weight.is_finite() && weight > 0.0 {
            weight
        } else {
            1.0
        };
        self.0.insert(category, weight);
    }

    pub fn get(&self, category: SkillCategory) -> f64 {
        // deserialized tables skip `set`, so sanitize here too
        self.0
            .get(&category)
            .copied()
            .filter(|w| w.is_finite() && *w > 0.0)
            .unwrap_or(1.0)
    }
}

impl Default for CategoryWeights {
    fn default() -> Self {
        Self::uniform()
    }
}

/// Aggregate for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub category: SkillCategory,
    /// Mean of the category's evaluation scores.
    pub mean: f64,
    /// Number of answers in this category.
    pub count: usize,
    /// Weight applied in the overall score.
    pub weight: f64,
}

/// Group `(category, score)` pairs into per-category means.
pub fn category_breakdown(
    scores: &[(SkillCategory, f64)],
    weights: &CategoryWeights,
) -> Vec<CategoryScore> {
    let mut grouped: BTreeMap<SkillCategory, (f64, usize)> = BTreeMap::new();
    for (category, score) in scores {
        let entry = grouped.entry(*category).or_insert((0.0, 0));
        entry.0 += score;
        entry.1 += 1;
    }

    grouped
        .into_iter()
        .map(|(category, (sum, count))| CategoryScore {
            category,
            mean: sum / count as f64,
            count,
            weight: weights.get(category),
        })
        .collect()
}

/// Weighted mean of category means. Returns 0.0 for no categories.
pub fn weighted_overall(breakdown: &[CategoryScore]) -> f64 {
    let total_weight: f64 = breakdown.iter().map(|c| c.weight).sum();
    if total_weight <= 0.0 {
        return 0.0;
    }
    breakdown.iter().map(|c| c.weight * c.mean).sum::<f64>() / total_weight
}

/// Round to two decimals for presentation.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Proficiency band derived from the overall score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Proficiency {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

impl Proficiency {
    /// ≥90 Expert, ≥75 Advanced, ≥60 Intermediate, else Beginner.
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            Proficiency::Expert
        } else if score >= 75.0 {
            Proficiency::Advanced
        } else if score >= 60.0 {
            Proficiency::Intermediate
        } else {
            Proficiency::Beginner
        }
    }

    pub fn recommendations(&self) -> &'static [&'static str] {
        match self {
            Proficiency::Beginner => &[
                "Start with Excel basics and core functions",
                "Practice with sample datasets",
                "Take an introductory Excel course",
            ],
            Proficiency::Intermediate => &[
                "Focus on advanced functions and data analysis",
                "Learn pivot tables and charts in depth",
                "Practice with real-world scenarios",
            ],
            Proficiency::Advanced | Proficiency::Expert => &[
                "Explore Power Query and the data model",
                "Consider an Excel certification",
                "Mentor others in Excel skills",
            ],
        }
    }
}

impl fmt::Display for Proficiency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Proficiency::Beginner => write!(f, "Beginner"),
            Proficiency::Intermediate => write!(f, "Intermediate"),
            Proficiency::Advanced => write!(f, "Advanced"),
            Proficiency::Expert => write!(f, "Expert"),
        }
    }
}
