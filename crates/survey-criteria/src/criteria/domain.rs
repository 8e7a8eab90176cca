use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifier wrapper for stored criteria sets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CriteriaSetId(pub String);

impl fmt::Display for CriteriaSetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a criterion, unique within its set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CriterionId(pub String);

impl fmt::Display for CriterionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Aggregation strategy combining individual criterion outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicType {
    AllRequired,
    ThresholdBased,
    WeightedScore,
    AnyRequired,
}

impl LogicType {
    pub fn label(&self) -> &'static str {
        match self {
            LogicType::AllRequired => "all_required",
            LogicType::ThresholdBased => "threshold_based",
            LogicType::WeightedScore => "weighted_score",
            LogicType::AnyRequired => "any_required",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "all_required" => Some(Self::AllRequired),
            "threshold_based" => Some(Self::ThresholdBased),
            "weighted_score" => Some(Self::WeightedScore),
            "any_required" => Some(Self::AnyRequired),
            _ => None,
        }
    }

    /// Whether `passing_threshold` participates in the verdict.
    pub fn uses_threshold(&self) -> bool {
        matches!(self, LogicType::ThresholdBased | LogicType::WeightedScore)
    }
}

/// Comparison applied between a respondent answer and the expected value.
///
/// `Unsupported` only ever comes out of decoding stored documents whose
/// condition string is not recognised; it never matches.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Condition {
    Equals,
    NotEquals,
    Contains,
    NotContains,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    InList,
    NotInList,
    Unsupported(String),
}

impl Condition {
    pub fn label(&self) -> &str {
        match self {
            Condition::Equals => "equals",
            Condition::NotEquals => "not_equals",
            Condition::Contains => "contains",
            Condition::NotContains => "not_contains",
            Condition::GreaterThan => "greater_than",
            Condition::GreaterThanOrEqual => "greater_than_or_equal",
            Condition::LessThan => "less_than",
            Condition::LessThanOrEqual => "less_than_or_equal",
            Condition::InList => "in_list",
            Condition::NotInList => "not_in_list",
            Condition::Unsupported(raw) => raw,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Condition::Unsupported(_))
    }
}

impl From<String> for Condition {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "equals" => Self::Equals,
            "not_equals" => Self::NotEquals,
            "contains" => Self::Contains,
            "not_contains" => Self::NotContains,
            "greater_than" => Self::GreaterThan,
            "greater_than_or_equal" => Self::GreaterThanOrEqual,
            "less_than" => Self::LessThan,
            "less_than_or_equal" => Self::LessThanOrEqual,
            "in_list" => Self::InList,
            "not_in_list" => Self::NotInList,
            _ => Self::Unsupported(value),
        }
    }
}

impl From<Condition> for String {
    fn from(value: Condition) -> Self {
        value.label().to_string()
    }
}

/// Comparison operand authored on a criterion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExpectedValue {
    Number(f64),
    Text(String),
    List(Vec<String>),
}

impl ExpectedValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn list<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

impl Default for ExpectedValue {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

/// One rule within a criteria set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Criterion {
    pub id: CriterionId,
    pub question_id: String,
    pub condition: Condition,
    #[serde(default)]
    pub expected_value: ExpectedValue,
    #[serde(default)]
    pub required: bool,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default)]
    pub description: String,
}

fn default_weight() -> f64 {
    1.0
}

/// Named, reusable rule configuration evaluated against respondent answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriteriaSet {
    pub id: CriteriaSetId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub logic_type: Option<LogicType>,
    #[serde(default)]
    pub passing_threshold: u8,
    #[serde(default)]
    pub criteria: Vec<Criterion>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_active() -> bool {
    true
}

impl CriteriaSet {
    pub fn criterion_ids(&self) -> impl Iterator<Item = &CriterionId> {
        self.criteria.iter().map(|criterion| &criterion.id)
    }
}

/// Answer submitted for a single question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Bool(bool),
    Number(f64),
    Text(String),
    /// Selections of a multi-select question.
    Multiple(Vec<String>),
}

impl AnswerValue {
    /// Textual rendering used by the string-based conditions.
    pub fn as_text(&self) -> String {
        match self {
            AnswerValue::Bool(value) => value.to_string(),
            AnswerValue::Number(value) => value.to_string(),
            AnswerValue::Text(value) => value.clone(),
            AnswerValue::Multiple(values) => values.join(", "),
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            AnswerValue::Text(value) => value.trim().is_empty(),
            AnswerValue::Multiple(values) => values.iter().all(|value| value.trim().is_empty()),
            AnswerValue::Bool(_) | AnswerValue::Number(_) => false,
        }
    }

    /// Lenient conversion from a submitted JSON value.
    ///
    /// `null` and objects carry no answer. Arrays keep their scalar members as
    /// selections.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(flag) => Some(Self::Bool(*flag)),
            Value::Number(number) => number.as_f64().map(Self::Number),
            Value::String(text) => Some(Self::Text(text.clone())),
            Value::Array(items) => Some(Self::Multiple(
                items.iter().filter_map(selection_text).collect(),
            )),
            Value::Null | Value::Object(_) => None,
        }
    }
}

fn selection_text(item: &Value) -> Option<String> {
    match item {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

impl From<&str> for AnswerValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for AnswerValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for AnswerValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for AnswerValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Respondent answers keyed by question identifier.
///
/// Decoding never fails on an individual answer: entries without a usable
/// value are dropped and therefore count as unanswered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, Value>",
    into = "BTreeMap<String, AnswerValue>"
)]
pub struct ResponseSet(BTreeMap<String, AnswerValue>);

impl ResponseSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, question_id: impl Into<String>, answer: impl Into<AnswerValue>) {
        self.0.insert(question_id.into(), answer.into());
    }

    pub fn with(mut self, question_id: impl Into<String>, answer: impl Into<AnswerValue>) -> Self {
        self.insert(question_id, answer);
        self
    }

    /// Answer for a question, treating blank text as unanswered.
    pub fn answer(&self, question_id: &str) -> Option<&AnswerValue> {
        self.0.get(question_id).filter(|answer| !answer.is_blank())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<BTreeMap<String, Value>> for ResponseSet {
    fn from(raw: BTreeMap<String, Value>) -> Self {
        raw.into_iter()
            .filter_map(|(question_id, value)| {
                AnswerValue::from_json(&value).map(|answer| (question_id, answer))
            })
            .collect()
    }
}

impl From<ResponseSet> for BTreeMap<String, AnswerValue> {
    fn from(responses: ResponseSet) -> Self {
        responses.0
    }
}

impl FromIterator<(String, AnswerValue)> for ResponseSet {
    fn from_iter<T: IntoIterator<Item = (String, AnswerValue)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
