// Rubric ("bareme") model
// Typed, range-constrained criteria grouped into categories.

pub mod official;
pub mod parse;
pub mod registry;
pub mod storage;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constants::{
    CATEGORY_COLOR_PRESETS, DEFAULT_CATEGORY, DEFAULT_CRITERION_MAX, DEFAULT_CRITERION_MIN,
    DEFAULT_CRITERION_STEP, DEFAULT_CRITERION_WEIGHT,
};
use crate::error::{NotationError, Result};

pub use parse::parse_bareme;
pub use registry::BaremeRegistry;

/// How a criterion is graded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CriterionType {
    #[default]
    Numeric,
    Slider,
    Boolean,
    Select,
    Text,
}

impl CriterionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CriterionType::Numeric => "numeric",
            CriterionType::Slider => "slider",
            CriterionType::Boolean => "boolean",
            CriterionType::Select => "select",
            CriterionType::Text => "text",
        }
    }

    /// Parse a type name, `None` for anything unknown
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim() {
            "numeric" => Some(CriterionType::Numeric),
            "slider" => Some(CriterionType::Slider),
            "boolean" => Some(CriterionType::Boolean),
            "select" => Some(CriterionType::Select),
            "text" => Some(CriterionType::Text),
            _ => None,
        }
    }

    /// Numeric and slider criteria carry a number that contributes to totals
    pub fn is_numeric(&self) -> bool {
        matches!(self, CriterionType::Numeric | CriterionType::Slider)
    }
}

fn default_weight() -> f64 {
    DEFAULT_CRITERION_WEIGHT
}

/// A single gradable dimension of a rubric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Criterion {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type", default)]
    pub criterion_type: CriterionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default = "default_weight")]
    pub weight: f64,
}

impl Criterion {
    /// Required numeric criterion on `[0, max]` with the default step and weight
    pub fn numeric(id: impl Into<String>, name: impl Into<String>, max: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            criterion_type: CriterionType::Numeric,
            min: Some(DEFAULT_CRITERION_MIN),
            max: Some(max),
            step: Some(DEFAULT_CRITERION_STEP),
            options: None,
            required: true,
            category: None,
            weight: DEFAULT_CRITERION_WEIGHT,
        }
    }

    /// Criterion of any type with every bound left unspecified
    pub fn of_type(id: impl Into<String>, name: impl Into<String>, criterion_type: CriterionType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            criterion_type,
            min: None,
            max: None,
            step: None,
            options: None,
            required: false,
            category: None,
            weight: DEFAULT_CRITERION_WEIGHT,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn with_step(mut self, step: f64) -> Self {
        self.step = Some(step);
        self
    }

    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = Some(options.into_iter().map(Into::into).collect());
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Lower bound, defaulting to 0
    pub fn min_value(&self) -> f64 {
        self.min.filter(|v| v.is_finite()).unwrap_or(DEFAULT_CRITERION_MIN)
    }

    /// Upper bound, defaulting to 10
    pub fn max_value(&self) -> f64 {
        self.max.filter(|v| v.is_finite()).unwrap_or(DEFAULT_CRITERION_MAX)
    }

    /// Increment, defaulting to 0.5
    pub fn step_value(&self) -> f64 {
        self.step.filter(|v| v.is_finite() && *v > 0.0).unwrap_or(DEFAULT_CRITERION_STEP)
    }

    /// Category label used for grouping; blank or missing falls into the default bucket
    pub fn category_label(&self) -> &str {
        match self.category.as_deref().map(str::trim) {
            Some(category) if !category.is_empty() => category,
            _ => DEFAULT_CATEGORY,
        }
    }

    /// Contribution of this criterion to the rubric total
    pub fn max_points(&self) -> f64 {
        self.max_value() * self.weight
    }

    /// Clamp a number into the bounds the criterion defines; a missing bound leaves that side open
    pub fn clamp(&self, value: f64) -> f64 {
        let min = self.min.filter(|v| v.is_finite());
        let max = self.max.filter(|v| v.is_finite());
        if let (Some(min), Some(max)) = (min, max) {
            if min > max {
                return value;
            }
        }
        let value = min.map_or(value, |min| value.max(min));
        max.map_or(value, |max| value.min(max))
    }

    /// Check the structural invariants: `min <= max`, `step > 0`
    pub fn check(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(NotationError::InvalidBareme(format!(
                "criterion '{}' has an empty id",
                self.name
            )));
        }
        if let (Some(min), Some(max)) = (self.min, self.max) {
            if min > max {
                return Err(NotationError::InvalidBareme(format!(
                    "criterion '{}': min {} is greater than max {}",
                    self.id, min, max
                )));
            }
        }
        if let Some(step) = self.step {
            if !(step > 0.0) {
                return Err(NotationError::InvalidBareme(format!(
                    "criterion '{}': step must be positive",
                    self.id
                )));
            }
        }
        if !self.weight.is_finite() {
            return Err(NotationError::InvalidBareme(format!(
                "criterion '{}': weight must be finite",
                self.id
            )));
        }
        Ok(())
    }
}

/// Criteria sharing a category, in rubric order
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryGroup {
    pub category: String,
    pub criteria: Vec<Criterion>,
    pub total_max: f64,
    pub color: String,
}

/// Sum of `max * weight` over all criteria
pub fn compute_total_points(criteria: &[Criterion]) -> f64 {
    criteria.iter().map(Criterion::max_points).sum()
}

/// Accept only `#rrggbb`; anything else yields the fallback
pub fn sanitize_color(color: Option<&str>, fallback: &str) -> String {
    let Some(color) = color.map(str::trim) else {
        return fallback.to_string();
    };
    let valid = color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit());
    if valid {
        color.to_string()
    } else {
        fallback.to_string()
    }
}

fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Serialized form; total points are recomputed when read back
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BaremeRecord {
    id: String,
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    is_official: bool,
    #[serde(default)]
    hide_totals_until_all_scored: bool,
    #[serde(default)]
    criteria: Vec<Criterion>,
    #[serde(default)]
    category_colors: BTreeMap<String, String>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    updated_at: Option<String>,
}

impl From<BaremeRecord> for Bareme {
    fn from(record: BaremeRecord) -> Self {
        let now = now_rfc3339();
        let total_points = compute_total_points(&record.criteria);
        Bareme {
            id: record.id,
            name: record.name,
            description: record.description,
            is_official: record.is_official,
            hide_totals_until_all_scored: record.hide_totals_until_all_scored,
            criteria: record.criteria,
            category_colors: record.category_colors,
            total_points,
            created_at: record.created_at.unwrap_or_else(|| now.clone()),
            updated_at: record.updated_at.unwrap_or(now),
        }
    }
}

/// A rubric: ordered criteria plus metadata.
///
/// Value object: edits go through [`Bareme::with_criteria`], which yields a new version
/// with a recomputed `total_points` and a fresh `updated_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "BaremeRecord")]
pub struct Bareme {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub is_official: bool,
    pub hide_totals_until_all_scored: bool,
    criteria: Vec<Criterion>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub category_colors: BTreeMap<String, String>,
    total_points: f64,
    pub created_at: String,
    pub updated_at: String,
}

impl Bareme {
    pub fn new(id: impl Into<String>, name: impl Into<String>, criteria: Vec<Criterion>) -> Self {
        let now = now_rfc3339();
        let total_points = compute_total_points(&criteria);
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            is_official: false,
            hide_totals_until_all_scored: false,
            criteria,
            category_colors: BTreeMap::new(),
            total_points,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// The built-in official AMV rubric
    pub fn official() -> Self {
        official::official_bareme()
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_category_color(mut self, category: impl Into<String>, color: impl Into<String>) -> Self {
        self.category_colors.insert(category.into(), color.into());
        self
    }

    /// New version of this rubric with different criteria
    pub fn with_criteria(&self, criteria: Vec<Criterion>) -> Self {
        let mut next = self.clone();
        next.total_points = compute_total_points(&criteria);
        next.criteria = criteria;
        next.updated_at = now_rfc3339();
        next
    }

    pub fn criteria(&self) -> &[Criterion] {
        &self.criteria
    }

    pub fn total_points(&self) -> f64 {
        self.total_points
    }

    pub fn criterion(&self, criterion_id: &str) -> Option<&Criterion> {
        self.criteria.iter().find(|c| c.id == criterion_id)
    }

    /// Category labels in first-appearance order
    pub fn categories(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for criterion in &self.criteria {
            let label = criterion.category_label();
            if !out.iter().any(|c| c == label) {
                out.push(label.to_string());
            }
        }
        out
    }

    /// Criteria belonging to one category (the default bucket included)
    pub fn criteria_in_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a Criterion> + 'a {
        self.criteria.iter().filter(move |c| c.category_label() == category)
    }

    /// Display color for a category, falling back to the rotating palette
    pub fn category_color(&self, category: &str, index: usize) -> String {
        let fallback = CATEGORY_COLOR_PRESETS[index % CATEGORY_COLOR_PRESETS.len()];
        sanitize_color(self.category_colors.get(category).map(String::as_str), fallback)
    }

    /// Criteria grouped by category, in first-appearance order
    pub fn category_groups(&self) -> Vec<CategoryGroup> {
        let mut groups: Vec<CategoryGroup> = Vec::new();
        for criterion in &self.criteria {
            let label = criterion.category_label();
            match groups.iter_mut().find(|g| g.category == label) {
                Some(group) => {
                    group.total_max += criterion.max_points();
                    group.criteria.push(criterion.clone());
                }
                None => {
                    let color = self.category_color(label, groups.len());
                    groups.push(CategoryGroup {
                        category: label.to_string(),
                        criteria: vec![criterion.clone()],
                        total_max: criterion.max_points(),
                        color,
                    });
                }
            }
        }
        groups
    }

    /// Structural check of every criterion plus id uniqueness
    pub fn check(&self) -> Result<()> {
        if self.id.trim().is_empty() || self.name.trim().is_empty() {
            return Err(NotationError::InvalidBareme("bareme id and name are required".to_string()));
        }
        for (index, criterion) in self.criteria.iter().enumerate() {
            criterion.check()?;
            if self.criteria[..index].iter().any(|c| c.id == criterion.id) {
                return Err(NotationError::InvalidBareme(format!(
                    "duplicate criterion id '{}'",
                    criterion.id
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn technique() -> Bareme {
        Bareme::new(
            "tech",
            "Technique",
            vec![
                Criterion::numeric("rythme", "Rythme", 10.0).with_category("Technique"),
                Criterion::numeric("sync", "Sync", 5.0).with_category("Technique").with_weight(2.0),
                Criterion::of_type("comment", "Commentaire", CriterionType::Text),
            ],
        )
    }

    #[test]
    fn test_total_points_uses_weight_and_default_max() {
        // 10*1 + 5*2 + default max 10 for the text criterion
        assert_eq!(technique().total_points(), 30.0);
    }

    #[test]
    fn test_with_criteria_recomputes_total() {
        let base = technique();
        let next = base.with_criteria(vec![Criterion::numeric("a", "A", 4.0)]);
        assert_eq!(next.total_points(), 4.0);
        assert_eq!(next.id, base.id);
        assert_eq!(base.total_points(), 30.0);
    }

    #[test]
    fn test_category_groups_default_bucket_and_order() {
        let groups = technique().category_groups();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].category, "Technique");
        assert_eq!(groups[0].criteria.len(), 2);
        assert_eq!(groups[0].total_max, 20.0);
        assert_eq!(groups[1].category, DEFAULT_CATEGORY);
        assert_eq!(groups[0].color, CATEGORY_COLOR_PRESETS[0]);
        assert_eq!(groups[1].color, CATEGORY_COLOR_PRESETS[1]);
    }

    #[test]
    fn test_category_color_sanitized() {
        let bareme = technique()
            .with_category_color("Technique", "#ABCDEF")
            .with_category_color(DEFAULT_CATEGORY, "red");
        let groups = bareme.category_groups();
        assert_eq!(groups[0].color, "#ABCDEF");
        assert_eq!(groups[1].color, CATEGORY_COLOR_PRESETS[1]);
    }

    #[test]
    fn test_check_rejects_inverted_bounds() {
        let bad = Criterion::numeric("x", "X", 1.0).with_min(5.0);
        assert!(bad.check().is_err());
        let zero_step = Criterion::numeric("y", "Y", 1.0).with_step(0.0);
        assert!(zero_step.check().is_err());
    }

    #[test]
    fn test_check_rejects_duplicate_ids() {
        let bareme = Bareme::new(
            "dup",
            "Dup",
            vec![Criterion::numeric("a", "A", 1.0), Criterion::numeric("a", "B", 1.0)],
        );
        assert!(bareme.check().is_err());
    }

    #[test]
    fn test_deserialize_recomputes_total_points() {
        let json = r#"{
            "id": "x", "name": "X", "totalPoints": 999,
            "criteria": [{"id": "a", "name": "A", "type": "numeric", "max": 5, "required": true, "weight": 3}]
        }"#;
        let bareme: Bareme = serde_json::from_str(json).unwrap();
        assert_eq!(bareme.total_points(), 15.0);
        assert!(!bareme.is_official);
    }
}
