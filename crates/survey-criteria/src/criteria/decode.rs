//! Storage-boundary decoding of criteria documents.
//!
//! Stored criteria sets are operator-authored and may predate the typed model:
//! thresholds and weights stored as strings, booleans as `"yes"`, lists as
//! comma-separated text, condition names the evaluator has never supported.
//! This module turns such documents into a [`CriteriaSet`], degrading unknown
//! conditions to [`Condition::Unsupported`] and rejecting sets whose logic
//! type or threshold cannot be trusted.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use super::domain::{
    Condition, CriteriaSet, CriteriaSetId, Criterion, CriterionId, ExpectedValue, LogicType,
};
use super::evaluation::ConfigurationError;

/// Failure decoding a stored criteria document.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("criteria document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

/// Loosely typed criteria set as persisted by the admin tooling.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriteriaDocument {
    #[serde(default, alias = "_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub logic_type: Option<String>,
    #[serde(default)]
    pub passing_threshold: Option<Value>,
    #[serde(default)]
    pub criteria: Vec<CriterionDocument>,
    #[serde(default)]
    pub is_active: Option<Value>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Loosely typed criterion inside a [`CriteriaDocument`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriterionDocument {
    #[serde(default, alias = "_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub question_id: String,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub expected_value: Option<Value>,
    #[serde(default)]
    pub required: Option<Value>,
    #[serde(default)]
    pub weight: Option<Value>,
    #[serde(default)]
    pub description: String,
}

impl CriteriaDocument {
    pub fn from_json_str(raw: &str) -> Result<Self, DecodeError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Convert into the typed model. A missing logic type is preserved as
    /// `None` so that evaluation reports it; an unknown one is rejected here.
    pub fn into_criteria_set(self) -> Result<CriteriaSet, ConfigurationError> {
        let id = self
            .id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .ok_or(ConfigurationError::MissingCriteriaSetId)?;

        let logic_type = match self.logic_type.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                LogicType::parse(raw)
                    .ok_or_else(|| ConfigurationError::UnknownLogicType(raw.to_string()))?,
            ),
        };

        let passing_threshold = decode_threshold(self.passing_threshold.as_ref())?;

        let mut seen = HashSet::new();
        let mut criteria = Vec::with_capacity(self.criteria.len());
        for (index, document) in self.criteria.into_iter().enumerate() {
            let criterion = document.into_criterion(index);
            if !seen.insert(criterion.id.clone()) {
                return Err(ConfigurationError::DuplicateCriterionId(criterion.id.0));
            }
            criteria.push(criterion);
        }

        Ok(CriteriaSet {
            id: CriteriaSetId(id),
            name: self.name,
            description: self.description,
            logic_type,
            passing_threshold,
            criteria,
            is_active: self.is_active.as_ref().map(truthy).unwrap_or(true),
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl TryFrom<CriteriaDocument> for CriteriaSet {
    type Error = ConfigurationError;

    fn try_from(value: CriteriaDocument) -> Result<Self, Self::Error> {
        value.into_criteria_set()
    }
}

impl CriterionDocument {
    fn into_criterion(self, index: usize) -> Criterion {
        let id = self
            .id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| format!("criterion-{}", index + 1));

        Criterion {
            id: CriterionId(id),
            question_id: self.question_id.trim().to_string(),
            condition: Condition::from(self.condition.unwrap_or_default()),
            expected_value: self
                .expected_value
                .as_ref()
                .map(decode_expected_value)
                .unwrap_or_default(),
            required: self.required.as_ref().map(truthy).unwrap_or(false),
            weight: self.weight.as_ref().map(decode_weight).unwrap_or(1.0),
            description: self.description,
        }
    }
}

/// Parse a criteria document straight from JSON text.
pub fn decode_criteria_set(raw: &str) -> Result<CriteriaSet, DecodeError> {
    Ok(CriteriaDocument::from_json_str(raw)?.into_criteria_set()?)
}

/// Parse a JSON array of criteria documents, as used for seeding a store.
pub fn decode_criteria_sets(raw: &str) -> Result<Vec<CriteriaSet>, DecodeError> {
    let documents: Vec<CriteriaDocument> = serde_json::from_str(raw)?;
    documents
        .into_iter()
        .map(|document| document.into_criteria_set().map_err(DecodeError::from))
        .collect()
}

fn decode_threshold(value: Option<&Value>) -> Result<u8, ConfigurationError> {
    let raw = match value {
        None | Some(Value::Null) => return Ok(0),
        Some(Value::String(text)) if text.trim().is_empty() => return Ok(0),
        Some(Value::Number(number)) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|float| float.round() as i64)),
        Some(Value::String(text)) => text
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|float| float.is_finite())
            .map(|float| float.round() as i64),
        Some(_) => None,
    };

    match raw {
        Some(threshold) if (0..=100).contains(&threshold) => Ok(threshold as u8),
        Some(threshold) => Err(ConfigurationError::ThresholdOutOfRange(threshold)),
        None => Err(ConfigurationError::InvalidThreshold(
            value.map(Value::to_string).unwrap_or_default(),
        )),
    }
}

fn decode_expected_value(value: &Value) -> ExpectedValue {
    match value {
        Value::Number(number) => number
            .as_f64()
            .map(ExpectedValue::Number)
            .unwrap_or_else(|| ExpectedValue::Text(number.to_string())),
        Value::String(text) => ExpectedValue::Text(text.clone()),
        Value::Array(items) => ExpectedValue::List(items.iter().map(scalar_text).collect()),
        Value::Bool(flag) => ExpectedValue::Text(flag.to_string()),
        Value::Null | Value::Object(_) => ExpectedValue::default(),
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn decode_weight(value: &Value) -> f64 {
    let weight = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    weight
        .filter(|weight| weight.is_finite() && *weight > 0.0)
        .unwrap_or(0.0)
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().map(|n| n != 0.0).unwrap_or(false),
        Value::String(text) => matches!(
            text.trim().to_ascii_lowercase().as_str(),
            "true" | "yes" | "y" | "1"
        ),
        _ => false,
    }
}
