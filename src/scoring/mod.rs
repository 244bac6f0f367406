// Scoring Engine
// Validates raw criterion inputs and aggregates them into category and clip totals.

pub mod validator;
pub mod aggregator;
pub mod distribute;


use serde::{Deserialize, Serialize};

use crate::bareme::{Criterion, CriterionType};

pub use aggregator::{
    calculate_score, category_score, criterion_numeric_score, has_any_criterion_score,
    is_note_complete, progress_stats, round_score, ProgressStats,
};
pub use distribute::distribute_category_score;
pub use validator::{validate_criterion_value, ValidationResult};

/// A recorded criterion value.
///
/// Serialized untagged so persisted files keep the plain `number | string | boolean` shape.
/// [`ScoreValue::coerce_for`] converts raw input into the shape the criterion type expects:
/// a number for numeric/slider, a boolean for boolean, a string for select/text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScoreValue {
    Number(f64),
    Bool(bool),
    Text(String),
}

impl ScoreValue {
    /// Empty string counts as "no value"
    pub fn is_empty(&self) -> bool {
        matches!(self, ScoreValue::Text(s) if s.trim().is_empty())
    }

    /// Finite number, parsing numeric text (`,` accepted as decimal point)
    pub fn as_number(&self) -> Option<f64> {
        match self {
            ScoreValue::Number(n) if n.is_finite() => Some(*n),
            ScoreValue::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return None;
                }
                trimmed.replace(',', ".").parse::<f64>().ok().filter(|n| n.is_finite())
            }
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ScoreValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ScoreValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Convert raw input into the criterion's value shape when it unambiguously fits.
    /// Inputs that do not fit are returned unchanged so the validator can reject them.
    pub fn coerce_for(self, criterion: &Criterion) -> ScoreValue {
        if self.is_empty() {
            return self;
        }
        match criterion.criterion_type {
            CriterionType::Numeric | CriterionType::Slider => match self.as_number() {
                Some(n) => ScoreValue::Number(n),
                None => self,
            },
            CriterionType::Boolean => match &self {
                ScoreValue::Text(s) if s.trim() == "true" => ScoreValue::Bool(true),
                ScoreValue::Text(s) if s.trim() == "false" => ScoreValue::Bool(false),
                _ => self,
            },
            CriterionType::Select | CriterionType::Text => match self {
                ScoreValue::Number(n) => ScoreValue::Text(format_number(n)),
                other => other,
            },
        }
    }
}

impl From<f64> for ScoreValue {
    fn from(value: f64) -> Self {
        ScoreValue::Number(value)
    }
}

impl From<bool> for ScoreValue {
    fn from(value: bool) -> Self {
        ScoreValue::Bool(value)
    }
}

impl From<&str> for ScoreValue {
    fn from(value: &str) -> Self {
        ScoreValue::Text(value.to_string())
    }
}

impl From<String> for ScoreValue {
    fn from(value: String) -> Self {
        ScoreValue::Text(value)
    }
}

impl std::fmt::Display for ScoreValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScoreValue::Number(n) => write!(f, "{}", format_number(*n)),
            ScoreValue::Bool(b) => write!(f, "{}", b),
            ScoreValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// `8` rather than `8.0`, `7.5` stays `7.5`
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// A judge's recorded value for one criterion on one clip.
/// Validity and error list always come from the same validator run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CriterionScore {
    criterion_id: String,
    value: ScoreValue,
    is_valid: bool,
    validation_errors: Vec<String>,
}

impl CriterionScore {
    /// Validate `value` against `criterion` and record the outcome
    pub fn evaluate(criterion: &Criterion, value: ScoreValue) -> Self {
        let validation = validate_criterion_value(Some(&value), criterion);
        Self {
            criterion_id: criterion.id.clone(),
            value,
            is_valid: validation.is_valid,
            validation_errors: validation.errors,
        }
    }

    /// Rebuild a persisted score; validation messages are not persisted
    pub fn restored(criterion_id: impl Into<String>, value: ScoreValue, is_valid: bool) -> Self {
        Self {
            criterion_id: criterion_id.into(),
            value,
            is_valid,
            validation_errors: Vec::new(),
        }
    }

    pub fn criterion_id(&self) -> &str {
        &self.criterion_id
    }

    pub fn value(&self) -> &ScoreValue {
        &self.value
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    pub fn validation_errors(&self) -> &[String] {
        &self.validation_errors
    }
}

/// Borrowed view of one recorded score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreEntry<'a> {
    pub value: &'a ScoreValue,
    pub is_valid: bool,
}

/// Anything that records per-criterion scores: the local judge's notes,
/// persisted note data and imported judges' notes all aggregate the same way.
pub trait ScoreSheet {
    fn score_entry(&self, criterion_id: &str) -> Option<ScoreEntry<'_>>;
}

impl<T: ScoreSheet + ?Sized> ScoreSheet for &T {
    fn score_entry(&self, criterion_id: &str) -> Option<ScoreEntry<'_>> {
        (**self).score_entry(criterion_id)
    }
}
