use super::super::domain::{AnswerValue, Condition, Criterion, ExpectedValue, ResponseSet};

/// Whether a single criterion is satisfied by the respondent's answers.
///
/// A missing or blank answer never matches, whatever the condition polarity.
pub(crate) fn criterion_matches(criterion: &Criterion, responses: &ResponseSet) -> bool {
    match responses.answer(&criterion.question_id) {
        Some(answer) => condition_holds(&criterion.condition, answer, &criterion.expected_value),
        None => false,
    }
}

pub(crate) fn condition_holds(
    condition: &Condition,
    answer: &AnswerValue,
    expected: &ExpectedValue,
) -> bool {
    // A blank operand makes the rule unusable in either polarity.
    if compares_text(condition) && operand_is_blank(expected) {
        return false;
    }

    match condition {
        Condition::Equals => equals(answer, expected),
        Condition::NotEquals => !equals(answer, expected),
        Condition::Contains => contains(answer, expected),
        Condition::NotContains => !contains(answer, expected),
        Condition::GreaterThan => compare(answer, expected, |lhs, rhs| lhs > rhs),
        Condition::GreaterThanOrEqual => compare(answer, expected, |lhs, rhs| lhs >= rhs),
        Condition::LessThan => compare(answer, expected, |lhs, rhs| lhs < rhs),
        Condition::LessThanOrEqual => compare(answer, expected, |lhs, rhs| lhs <= rhs),
        Condition::InList => in_list(answer, expected),
        Condition::NotInList => !in_list(answer, expected),
        Condition::Unsupported(_) => false,
    }
}

fn compares_text(condition: &Condition) -> bool {
    matches!(
        condition,
        Condition::Equals
            | Condition::NotEquals
            | Condition::Contains
            | Condition::NotContains
            | Condition::InList
            | Condition::NotInList
    )
}

fn operand_is_blank(expected: &ExpectedValue) -> bool {
    match expected {
        ExpectedValue::Number(value) => !value.is_finite(),
        ExpectedValue::Text(value) => value.trim().is_empty(),
        ExpectedValue::List(_) => list_members(expected).is_empty(),
    }
}

fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Normalized answer values; one per selection for multi-select answers.
fn answer_values(answer: &AnswerValue) -> Vec<String> {
    match answer {
        AnswerValue::Multiple(values) => values
            .iter()
            .map(|value| normalize(value))
            .filter(|value| !value.is_empty())
            .collect(),
        other => vec![normalize(&other.as_text())],
    }
}

/// Text equality, or numeric equality when both sides parse as numbers, so
/// `18`, `"18"` and `"18.0"` agree however the answer was transported.
fn same_value(lhs: &str, rhs: &str) -> bool {
    if lhs == rhs {
        return true;
    }
    match (parse_number(lhs), parse_number(rhs)) {
        (Some(lhs), Some(rhs)) => lhs == rhs,
        _ => false,
    }
}

fn equals(answer: &AnswerValue, expected: &ExpectedValue) -> bool {
    if let AnswerValue::Multiple(_) = answer {
        // The selection set must be exactly the expected members.
        let mut selected = answer_values(answer);
        let mut wanted = list_members(expected);
        selected.sort();
        selected.dedup();
        wanted.sort();
        wanted.dedup();
        return selected == wanted;
    }

    let operand = match expected {
        ExpectedValue::List(_) => list_members(expected).join(","),
        ExpectedValue::Number(value) => value.to_string(),
        ExpectedValue::Text(value) => normalize(value),
    };
    same_value(&normalize(&answer.as_text()), &operand)
}

/// Substring match; list operands match when any member is contained.
fn contains(answer: &AnswerValue, expected: &ExpectedValue) -> bool {
    let needles = match expected {
        ExpectedValue::List(_) => list_members(expected),
        ExpectedValue::Number(value) => vec![value.to_string()],
        ExpectedValue::Text(value) => vec![normalize(value)],
    };
    answer_values(answer).iter().any(|haystack| {
        needles
            .iter()
            .any(|needle| !needle.is_empty() && haystack.contains(needle.as_str()))
    })
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

fn answer_number(answer: &AnswerValue) -> Option<f64> {
    match answer {
        AnswerValue::Number(value) => Some(*value).filter(|value| value.is_finite()),
        AnswerValue::Text(value) => parse_number(value),
        AnswerValue::Bool(_) | AnswerValue::Multiple(_) => None,
    }
}

fn expected_number(expected: &ExpectedValue) -> Option<f64> {
    match expected {
        ExpectedValue::Number(value) => Some(*value).filter(|value| value.is_finite()),
        ExpectedValue::Text(value) => parse_number(value),
        ExpectedValue::List(_) => None,
    }
}

fn compare(answer: &AnswerValue, expected: &ExpectedValue, op: fn(f64, f64) -> bool) -> bool {
    match (answer_number(answer), expected_number(expected)) {
        (Some(lhs), Some(rhs)) => op(lhs, rhs),
        _ => false,
    }
}

/// Normalized members of the expected list; text operands are comma separated.
pub(crate) fn list_members(expected: &ExpectedValue) -> Vec<String> {
    let raw: Vec<String> = match expected {
        ExpectedValue::List(values) => values.clone(),
        ExpectedValue::Text(value) => value.split(',').map(str::to_string).collect(),
        ExpectedValue::Number(value) => vec![value.to_string()],
    };

    raw.iter()
        .map(|member| normalize(member))
        .filter(|member| !member.is_empty())
        .collect()
}

/// Membership test; a multi-select answer matches when any selection is listed.
fn in_list(answer: &AnswerValue, expected: &ExpectedValue) -> bool {
    let members = list_members(expected);
    answer_values(answer)
        .iter()
        .any(|value| members.iter().any(|member| same_value(value, member)))
}
