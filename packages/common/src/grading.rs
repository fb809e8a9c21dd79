//! Rubric grading math: aggregates, letter grades and transcript totals.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of rubric rows that make up a full evaluation of one document.
pub const REQUIRED_CRITERIA: u64 = 6;

/// The rubric an evaluation is expected to cover. Names are informational;
/// grades are stored against whatever criterion string the evaluator sends.
pub const RUBRIC_CRITERIA: [&str; 6] = [
    "Problem Definition",
    "Literature Review",
    "Methodology",
    "Implementation",
    "Documentation",
    "Innovation",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
pub enum LetterGrade {
    #[serde(rename = "A")]
    A,
    #[serde(rename = "A-")]
    AMinus,
    #[serde(rename = "B+")]
    BPlus,
    #[serde(rename = "B")]
    B,
    #[serde(rename = "B-")]
    BMinus,
    #[serde(rename = "C+")]
    CPlus,
    #[serde(rename = "C")]
    C,
    #[serde(rename = "C-")]
    CMinus,
    #[serde(rename = "F")]
    F,
}

/// Inclusive lower bounds, checked in descending order.
const THRESHOLDS: [(f64, LetterGrade); 8] = [
    (85.0, LetterGrade::A),
    (80.0, LetterGrade::AMinus),
    (75.0, LetterGrade::BPlus),
    (70.0, LetterGrade::B),
    (65.0, LetterGrade::BMinus),
    (60.0, LetterGrade::CPlus),
    (55.0, LetterGrade::C),
    (50.0, LetterGrade::CMinus),
];

impl LetterGrade {
    pub fn from_percentage(percentage: f64) -> Self {
        THRESHOLDS
            .iter()
            .find(|(floor, _)| percentage >= *floor)
            .map(|(_, letter)| *letter)
            .unwrap_or(Self::F)
    }

    pub fn gpa(&self) -> f64 {
        match self {
            Self::A => 4.0,
            Self::AMinus => 3.7,
            Self::BPlus => 3.3,
            Self::B => 3.0,
            Self::BMinus => 2.7,
            Self::CPlus => 2.3,
            Self::C => 2.0,
            Self::CMinus => 1.7,
            Self::F => 0.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::AMinus => "A-",
            Self::BPlus => "B+",
            Self::B => "B",
            Self::BMinus => "B-",
            Self::CPlus => "C+",
            Self::C => "C",
            Self::CMinus => "C-",
            Self::F => "F",
        }
    }
}

impl fmt::Display for LetterGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Summed score of a set of grade rows.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Aggregate {
    pub total_score: f64,
    pub total_max_score: f64,
    pub percentage: f64,
    pub letter: LetterGrade,
    pub gpa: f64,
}

impl Aggregate {
    /// Builds an aggregate from `(score, max_score)` pairs.
    pub fn from_scores<I>(scores: I) -> Self
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let (total_score, total_max_score) = scores
            .into_iter()
            .fold((0.0, 0.0), |(s, m), (score, max)| (s + score, m + max));
        Self::from_totals(total_score, total_max_score)
    }

    pub fn from_totals(total_score: f64, total_max_score: f64) -> Self {
        let percentage = if total_max_score > 0.0 {
            total_score / total_max_score * 100.0
        } else {
            0.0
        };
        let letter = LetterGrade::from_percentage(percentage);
        Self {
            total_score,
            total_max_score,
            percentage,
            letter,
            gpa: letter.gpa(),
        }
    }
}

/// Overall figures for a student transcript.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct TranscriptTotals {
    pub overall_total_score: f64,
    pub overall_max_score: f64,
    pub overall_percentage: f64,
    pub overall_grade: LetterGrade,
    /// Mean of the per-document GPAs, not the GPA of the overall percentage.
    pub overall_gpa: f64,
}

impl TranscriptTotals {
    /// Combines per-document aggregates. Documents without released grades
    /// must not be passed in.
    pub fn from_documents(documents: &[Aggregate]) -> Self {
        let overall = Aggregate::from_totals(
            documents.iter().map(|a| a.total_score).sum(),
            documents.iter().map(|a| a.total_max_score).sum(),
        );
        let overall_gpa = if documents.is_empty() {
            0.0
        } else {
            documents.iter().map(|a| a.gpa).sum::<f64>() / documents.len() as f64
        };
        Self {
            overall_total_score: overall.total_score,
            overall_max_score: overall.total_max_score,
            overall_percentage: overall.percentage,
            overall_grade: overall.letter,
            overall_gpa,
        }
    }
}

/// Checks a single rubric row before it is stored.
pub fn validate_score(criterion: &str, score: f64, max_score: f64) -> Result<(), String> {
    if criterion.trim().is_empty() {
        return Err("Rubric criterion must not be empty".into());
    }
    if !max_score.is_finite() || max_score <= 0.0 {
        return Err("Max score must be greater than zero".into());
    }
    if !score.is_finite() || score < 0.0 || score > max_score {
        return Err(format!("Score must be between 0 and {max_score}"));
    }
    Ok(())
}
