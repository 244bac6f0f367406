// Criterion value validation
// Pure check of one value against its criterion's type and bounds.

use serde::{Deserialize, Serialize};

use super::{format_number, ScoreValue};
use crate::bareme::{Criterion, CriterionType};

pub const MSG_REQUIRED: &str = "criterion is required";
pub const MSG_NOT_A_NUMBER: &str = "value must be a number";
pub const MSG_NOT_A_BOOLEAN: &str = "value must be true or false";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

impl ValidationResult {
    fn from_errors(errors: Vec<String>) -> Self {
        Self { is_valid: errors.is_empty(), errors }
    }
}

/// Validate a value (`None` = not provided) against a criterion.
///
/// Range checks only apply to bounds the criterion actually defines. Values reaching
/// the note store are clamped first, so range errors only surface when this is called
/// on unclamped input (e.g. imported judge files).
pub fn validate_criterion_value(value: Option<&ScoreValue>, criterion: &Criterion) -> ValidationResult {
    let value = match value {
        Some(v) if !v.is_empty() => v,
        _ => {
            let errors = if criterion.required { vec![MSG_REQUIRED.to_string()] } else { Vec::new() };
            return ValidationResult::from_errors(errors);
        }
    };

    let mut errors = Vec::new();
    match criterion.criterion_type {
        CriterionType::Numeric | CriterionType::Slider => match value.as_number() {
            None => errors.push(MSG_NOT_A_NUMBER.to_string()),
            Some(n) => {
                if let Some(min) = criterion.min.filter(|m| m.is_finite()) {
                    if n < min {
                        errors.push(format!("minimum: {}", format_number(min)));
                    }
                }
                if let Some(max) = criterion.max.filter(|m| m.is_finite()) {
                    if n > max {
                        errors.push(format!("maximum: {}", format_number(max)));
                    }
                }
            }
        },
        CriterionType::Boolean => {
            if value.as_bool().is_none() {
                errors.push(MSG_NOT_A_BOOLEAN.to_string());
            }
        }
        CriterionType::Select => {
            if let Some(options) = criterion.options.as_ref() {
                let member = value.as_text().map(|t| options.iter().any(|o| o == t)).unwrap_or(false);
                if !member {
                    errors.push(format!("value must be one of: {}", options.join(", ")));
                }
            }
        }
        CriterionType::Text => {}
    }

    ValidationResult::from_errors(errors)
}
