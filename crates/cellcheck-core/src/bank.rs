//! The question bank: an ordered catalog of Excel interview questions.
//!
//! Session plans are drawn from the bank once, at session creation, so a
//! session never sees its questions change underneath it.

use std::collections::HashSet;

use crate::error::AssessmentError;
use crate::model::{Difficulty, Question, SkillCategory};

/// Ordered, immutable catalog of questions.
#[derive(Debug, Clone)]
pub struct QuestionBank {
    questions: Vec<Question>,
}

impl QuestionBank {
    /// Build a bank from explicit questions. Ids must be unique and keywords
    /// must not be blank.
    pub fn new(questions: Vec<Question>) -> Result<Self, AssessmentError> {
        let mut seen = HashSet::new();
        for q in &questions {
            if !seen.insert(q.id.as_str()) {
                return Err(AssessmentError::InvalidConfiguration(format!(
                    "duplicate question id: {}",
                    q.id
                )));
            }
            if q.text.trim().is_empty() {
                return Err(AssessmentError::InvalidConfiguration(format!(
                    "question {} has no text",
                    q.id
                )));
            }
            if q.keywords.iter().any(|k| k.trim().is_empty()) {
                return Err(AssessmentError::InvalidConfiguration(format!(
                    "question {} has a blank keyword",
                    q.id
                )));
            }
        }
        Ok(Self { questions })
    }

    /// The catalog shipped with cellcheck.
    pub fn builtin() -> Self {
        let questions = BUILTIN
            .iter()
            .map(|(id, category, difficulty, text, keywords)| Question {
                id: (*id).to_string(),
                text: (*text).to_string(),
                category: *category,
                difficulty: *difficulty,
                keywords: keywords.iter().map(|k| (*k).to_string()).collect(),
                follow_up: None,
            })
            .collect();
        Self { questions }
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn get(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    /// Categories that have at least one question, in rotation order.
    pub fn categories(&self) -> Vec<SkillCategory> {
        SkillCategory::ALL
            .into_iter()
            .filter(|c| self.questions.iter().any(|q| q.category == *c))
            .collect()
    }

    /// Pick `count` distinct questions for a session.
    ///
    /// Questions from `category` come first, closest difficulty first. The
    /// rest of the plan rotates through the remaining categories starting
    /// after `category`, taking each category's closest-difficulty question
    /// in turn.
    pub fn select(
        &self,
        category: SkillCategory,
        difficulty: Difficulty,
        count: usize,
    ) -> Result<Vec<Question>, AssessmentError> {
        if count == 0 {
            return Err(AssessmentError::InvalidConfiguration(
                "question count must be at least 1".into(),
            ));
        }
        if count > self.questions.len() {
            return Err(AssessmentError::InvalidConfiguration(format!(
                "question count {count} exceeds bank size {}",
                self.questions.len()
            )));
        }
        if !self.questions.iter().any(|q| q.category == category) {
            return Err(AssessmentError::InvalidConfiguration(format!(
                "no questions for category {}",
                category.slug()
            )));
        }

        let ranked = |cat: SkillCategory| -> Vec<&Question> {
            let mut qs: Vec<&Question> =
                self.questions.iter().filter(|q| q.category == cat).collect();
            // stable: equal distance keeps bank order
            qs.sort_by_key(|q| (q.difficulty.distance(difficulty), q.difficulty.rank()));
            qs
        };

        let mut plan: Vec<Question> = ranked(category).into_iter().take(count).cloned().collect();

        let start = SkillCategory::ALL
            .iter()
            .position(|c| *c == category)
            .unwrap_or(0);
        let mut others: Vec<std::vec::IntoIter<&Question>> = (1..SkillCategory::ALL.len())
            .map(|offset| SkillCategory::ALL[(start + offset) % SkillCategory::ALL.len()])
            .map(|c| ranked(c).into_iter())
            .collect();

        while plan.len() < count {
            let before = plan.len();
            for queue in others.iter_mut() {
                if plan.len() == count {
                    break;
                }
                if let Some(q) = queue.next() {
                    plan.push(q.clone());
                }
            }
            if plan.len() == before {
                break;
            }
        }

        Ok(plan)
    }
}

impl Default for QuestionBank {
    fn default() -> Self {
        Self::builtin()
    }
}

type BuiltinEntry = (
    &'static str,
    SkillCategory,
    Difficulty,
    &'static str,
    &'static [&'static str],
);

const BUILTIN: &[BuiltinEntry] = &[
    (
        "formulas-refs",
        SkillCategory::Formulas,
        Difficulty::Easy,
        "What is the difference between relative and absolute cell references, and when would you use each?",
        &["relative", "absolute", "$", "copy", "reference"],
    ),
    (
        "formulas-weighted-average",
        SkillCategory::Formulas,
        Difficulty::Medium,
        "How would you calculate a weighted average in Excel?",
        &["SUMPRODUCT", "SUM", "weights", "divide"],
    ),
    (
        "formulas-dynamic-arrays",
        SkillCategory::Formulas,
        Difficulty::Hard,
        "Describe how dynamic array formulas such as FILTER, UNIQUE and SORT change the way you build calculations.",
        &["FILTER", "UNIQUE", "SORT", "spill", "#"],
    ),
    (
        "pivot-basics",
        SkillCategory::PivotTables,
        Difficulty::Easy,
        "What is a pivot table and when would you use one?",
        &["summarize", "rows", "columns", "values", "filter"],
    ),
    (
        "pivot-multiple-values",
        SkillCategory::PivotTables,
        Difficulty::Medium,
        "How do you build a pivot table that shows both the sum and the average of sales per region?",
        &["value field settings", "sum", "average", "rows", "region"],
    ),
    (
        "pivot-calculated-fields",
        SkillCategory::PivotTables,
        Difficulty::Hard,
        "Explain calculated fields in pivot tables and a situation where they give misleading results.",
        &["calculated field", "sum", "ratio", "aggregate", "source data"],
    ),
    (
        "analysis-outliers",
        SkillCategory::DataAnalysis,
        Difficulty::Medium,
        "How would you approach analyzing a large dataset in Excel to identify trends and outliers?",
        &["sort", "filter", "average", "standard deviation", "chart"],
    ),
    (
        "analysis-what-if",
        SkillCategory::DataAnalysis,
        Difficulty::Hard,
        "Walk through how you would use Goal Seek, Scenario Manager or Data Tables for a what-if analysis.",
        &["goal seek", "scenario", "data table", "input", "output"],
    ),
    (
        "analysis-cleanup",
        SkillCategory::DataAnalysis,
        Difficulty::Easy,
        "What steps do you take to clean up messy imported data before analyzing it?",
        &["TRIM", "remove duplicates", "text to columns", "data validation"],
    ),
    (
        "lookup-vlookup",
        SkillCategory::Lookups,
        Difficulty::Easy,
        "How does VLOOKUP work and what does its last argument control?",
        &["lookup value", "table array", "column index", "exact match", "FALSE"],
    ),
    (
        "lookup-index-match",
        SkillCategory::Lookups,
        Difficulty::Medium,
        "Why do many analysts prefer INDEX/MATCH or XLOOKUP over VLOOKUP?",
        &["INDEX", "MATCH", "XLOOKUP", "left", "insert columns"],
    ),
    (
        "lookup-two-criteria",
        SkillCategory::Lookups,
        Difficulty::Hard,
        "How would you look up a value that depends on two criteria, such as product and month?",
        &["XLOOKUP", "INDEX", "MATCH", "concatenate", "array"],
    ),
    (
        "macros-recorder",
        SkillCategory::Macros,
        Difficulty::Easy,
        "What does the macro recorder do, and what are its limitations?",
        &["record", "VBA", "absolute", "relative", "edit"],
    ),
    (
        "macros-loop",
        SkillCategory::Macros,
        Difficulty::Medium,
        "Describe a VBA macro that loops over rows and highlights the ones meeting a condition.",
        &["For", "Next", "Cells", "If", "Interior"],
    ),
    (
        "macros-performance",
        SkillCategory::Macros,
        Difficulty::Expert,
        "A VBA macro runs slowly on 100,000 rows. How would you speed it up?",
        &["ScreenUpdating", "Calculation", "array", "Range", "Select"],
    ),
    (
        "charts-choice",
        SkillCategory::Charts,
        Difficulty::Easy,
        "How do you decide which chart type to use for a given dataset?",
        &["line", "bar", "pie", "trend", "comparison"],
    ),
    (
        "charts-dynamic",
        SkillCategory::Charts,
        Difficulty::Medium,
        "What is your approach to creating a chart that updates automatically when new data is added?",
        &["table", "dynamic range", "OFFSET", "named range"],
    ),
    (
        "charts-combo",
        SkillCategory::Charts,
        Difficulty::Hard,
        "How would you build a combo chart with a secondary axis, and when is that a bad idea?",
        &["secondary axis", "combo", "scale", "misleading"],
    ),
    (
        "pq-import",
        SkillCategory::PowerQuery,
        Difficulty::Medium,
        "How would you use Power Query to combine monthly files from a folder into one table?",
        &["folder", "combine", "append", "transform", "refresh"],
    ),
    (
        "pq-data-model",
        SkillCategory::PowerQuery,
        Difficulty::Hard,
        "Explain relationships in the Power Pivot data model and why you might write a DAX measure instead of a calculated column.",
        &["relationship", "DAX", "measure", "calculated column", "context"],
    ),
    (
        "pq-merge",
        SkillCategory::PowerQuery,
        Difficulty::Expert,
        "Compare the join kinds available when merging queries in Power Query.",
        &["left outer", "inner", "anti", "full outer", "merge"],
    ),
    (
        "cf-basics",
        SkillCategory::ConditionalFormatting,
        Difficulty::Easy,
        "How would you highlight all values above a threshold in a column?",
        &["conditional formatting", "greater than", "highlight", "rule"],
    ),
    (
        "cf-formula-rule",
        SkillCategory::ConditionalFormatting,
        Difficulty::Medium,
        "How do you use a formula-based conditional formatting rule to shade an entire row?",
        &["formula", "$", "row", "rule", "apply to"],
    ),
    (
        "cf-manage",
        SkillCategory::ConditionalFormatting,
        Difficulty::Hard,
        "A workbook has become slow because of conditional formatting. How do you diagnose and fix it?",
        &["manage rules", "range", "duplicate", "volatile", "stop if true"],
    ),
];
