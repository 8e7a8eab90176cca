use super::common::*;
use crate::criteria::decode::{decode_criteria_set, decode_criteria_sets, DecodeError};
use crate::criteria::domain::{AnswerValue, Condition, ExpectedValue, LogicType, ResponseSet};
use crate::criteria::{evaluate, ConfigurationError, EvaluationStatus};

#[test]
fn legacy_document_decodes_with_loose_types() {
    let raw = r#"{
        "_id": "65f0c0ffee",
        "name": "Legacy screener",
        "logicType": "Threshold_Based",
        "passingThreshold": "50",
        "isActive": "yes",
        "criteria": [
            { "_id": "a", "questionId": " q1 ", "condition": "in_list",
              "expectedValue": ["Red", "Blue"], "required": "true", "weight": "2" },
            { "questionId": "q2", "condition": "starts_with", "expectedValue": "x" },
            { "questionId": "q3", "condition": "greater_than", "expectedValue": 18 }
        ]
    }"#;

    let set = decode_criteria_set(raw).expect("decodes");

    assert_eq!(set.id.0, "65f0c0ffee");
    assert_eq!(set.logic_type, Some(LogicType::ThresholdBased));
    assert_eq!(set.passing_threshold, 50);
    assert!(set.is_active);

    let first = &set.criteria[0];
    assert_eq!(first.question_id, "q1");
    assert_eq!(first.condition, Condition::InList);
    assert_eq!(first.expected_value, ExpectedValue::list(["Red", "Blue"]));
    assert!(first.required);
    assert_eq!(first.weight, 2.0);

    assert_eq!(set.criteria[1].id.0, "criterion-2");
    assert_eq!(
        set.criteria[1].condition,
        Condition::Unsupported("starts_with".to_string())
    );
    assert_eq!(set.criteria[2].expected_value, ExpectedValue::Number(18.0));
    assert_eq!(set.criteria[2].weight, 1.0);
}

#[test]
fn unknown_logic_type_is_rejected_at_decode() {
    let raw = r#"{ "id": "s1", "logicType": "majority", "criteria": [] }"#;

    match decode_criteria_set(raw) {
        Err(DecodeError::Configuration(ConfigurationError::UnknownLogicType(value))) => {
            assert_eq!(value, "majority");
        }
        other => panic!("expected unknown logic type, got {other:?}"),
    }
}

#[test]
fn missing_logic_type_survives_decode_and_fails_evaluation() {
    let raw = r#"{ "id": "s1", "logicType": "  ", "criteria": [] }"#;

    let set = decode_criteria_set(raw).expect("decodes");
    assert!(set.logic_type.is_none());
    assert_eq!(
        evaluate(&set, &ResponseSet::new()),
        Err(ConfigurationError::MissingLogicType)
    );
}

#[test]
fn duplicate_criterion_ids_are_rejected() {
    let raw = r#"{ "id": "s1", "logicType": "all_required", "criteria": [
        { "id": "c1", "questionId": "q1", "condition": "equals", "expectedValue": "a" },
        { "id": "c1", "questionId": "q2", "condition": "equals", "expectedValue": "b" }
    ] }"#;

    match decode_criteria_set(raw) {
        Err(DecodeError::Configuration(ConfigurationError::DuplicateCriterionId(id))) => {
            assert_eq!(id, "c1");
        }
        other => panic!("expected duplicate id error, got {other:?}"),
    }
}

#[test]
fn missing_set_id_is_rejected() {
    let raw = r#"{ "name": "anonymous", "logicType": "all_required" }"#;

    assert!(matches!(
        decode_criteria_set(raw),
        Err(DecodeError::Configuration(
            ConfigurationError::MissingCriteriaSetId
        ))
    ));
}

#[test]
fn malformed_json_reports_a_json_error() {
    assert!(matches!(
        decode_criteria_set("{ not json"),
        Err(DecodeError::Json(_))
    ));
}

#[test]
fn seed_arrays_decode_every_document() {
    let raw = serde_json::to_string(&vec![
        screener_document_json("seed-a"),
        screener_document_json("seed-b"),
    ])
    .expect("serializes");

    let sets = decode_criteria_sets(&raw).expect("decodes");

    assert_eq!(sets.len(), 2);
    assert_eq!(sets[1].id.0, "seed-b");
    assert_eq!(sets[0].criteria.len(), 2);
}

#[test]
fn decoded_unsupported_condition_evaluates_as_failed() {
    let raw = r#"{ "id": "s1", "logicType": "any_required", "criteria": [
        { "id": "c1", "questionId": "q1", "condition": "sounds_like",
          "expectedValue": "smith", "required": true }
    ] }"#;
    let set = decode_criteria_set(raw).expect("decodes");

    let result = evaluate(&set, &ResponseSet::new().with("q1", "smith")).expect("evaluates");

    assert_eq!(result.status, EvaluationStatus::Fail);
    assert_eq!(result.criteria_failed, ids(&["c1"]));
}

#[test]
fn typed_sets_round_trip_condition_labels() {
    let set = criteria_set(
        LogicType::AllRequired,
        0,
        vec![criterion(
            "c1",
            "q1",
            Condition::GreaterThanOrEqual,
            ExpectedValue::Number(21.0),
        )],
    );

    let value = serde_json::to_value(&set).expect("serializes");

    assert_eq!(value["criteria"][0]["condition"], "greater_than_or_equal");
    assert_eq!(value["criteria"][0]["questionId"], "q1");
    assert_eq!(value["logicType"], "all_required");
}

#[test]
fn criteria_without_expected_value_never_qualify() {
    let raw = r#"{ "id": "s1", "logicType": "all_required", "criteria": [
        { "id": "c1", "questionId": "q1", "condition": "contains", "required": true },
        { "id": "c2", "questionId": "q1", "condition": "not_contains",
          "expectedValue": null, "required": true },
        { "id": "c3", "questionId": "q1", "condition": "equals",
          "expectedValue": { "nested": true }, "required": true }
    ] }"#;
    let set = decode_criteria_set(raw).expect("decodes");

    let result = evaluate(&set, &ResponseSet::new().with("q1", "anything")).expect("evaluates");

    assert_eq!(result.status, EvaluationStatus::Fail);
    assert_eq!(result.score, 0);
    assert_eq!(result.criteria_failed, ids(&["c1", "c2", "c3"]));
}

#[test]
fn response_sets_drop_null_answers_and_keep_selections() {
    let responses: ResponseSet = serde_json::from_str(
        r#"{ "skipped": null, "owns_home": "Yes", "colours": ["Red", 7, null], "meta": {} }"#,
    )
    .expect("responses decode");

    assert_eq!(responses.len(), 2);
    assert!(responses.answer("skipped").is_none());
    assert!(responses.answer("meta").is_none());
    assert_eq!(
        responses.answer("colours"),
        Some(&AnswerValue::Multiple(vec!["Red".to_string(), "7".to_string()]))
    );

    let value = serde_json::to_value(&responses).expect("serializes");
    assert_eq!(value["colours"], serde_json::json!(["Red", "7"]));
}
