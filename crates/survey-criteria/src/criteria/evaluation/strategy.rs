use super::super::domain::{Criterion, LogicType};
use super::EvaluationDetails;

/// Counts gathered from the per-criterion outcomes of one evaluation.
#[derive(Debug, Default)]
pub(crate) struct Tally {
    pub total: usize,
    pub matched: usize,
    pub required_total: usize,
    pub required_met: usize,
    pub total_weight: f64,
    pub matched_weight: f64,
}

impl Tally {
    pub(crate) fn record(&mut self, criterion: &Criterion, matched: bool) {
        let weight = sanitize_weight(criterion.weight);
        self.total += 1;
        self.total_weight += weight;
        if criterion.required {
            self.required_total += 1;
        }
        if matched {
            self.matched += 1;
            self.matched_weight += weight;
            if criterion.required {
                self.required_met += 1;
            }
        }
    }
}

pub(crate) struct Verdict {
    pub passed: bool,
    pub score: u8,
    pub message: String,
}

fn sanitize_weight(weight: f64) -> f64 {
    if weight.is_finite() && weight > 0.0 {
        weight
    } else {
        0.0
    }
}

/// Rounds `part / whole` to a whole percentage, half away from zero.
pub(crate) fn percentage(part: f64, whole: f64) -> u8 {
    if whole <= 0.0 || !whole.is_finite() {
        return 0;
    }
    ((part / whole) * 100.0).round().clamp(0.0, 100.0) as u8
}

pub(crate) fn decide(logic_type: LogicType, passing_threshold: u8, tally: &Tally) -> Verdict {
    if tally.total == 0 {
        return Verdict {
            passed: false,
            score: 0,
            message: "no criteria configured; failing closed".to_string(),
        };
    }

    let threshold = passing_threshold.min(100);
    let count_score = percentage(tally.matched as f64, tally.total as f64);

    match logic_type {
        LogicType::AllRequired => {
            let missed = tally.required_total - tally.required_met;
            if missed == 0 {
                Verdict {
                    passed: true,
                    score: count_score,
                    message: format!(
                        "all {} required criteria met ({} of {} overall, score {}%)",
                        tally.required_total, tally.matched, tally.total, count_score
                    ),
                }
            } else {
                Verdict {
                    passed: false,
                    score: count_score,
                    message: format!(
                        "{} of {} required criteria not met (score {}%)",
                        missed, tally.required_total, count_score
                    ),
                }
            }
        }
        LogicType::AnyRequired => {
            let (passed, message) = if tally.required_total > 0 {
                let passed = tally.required_met > 0;
                let message = if passed {
                    format!(
                        "{} of {} required criteria met (score {}%)",
                        tally.required_met, tally.required_total, count_score
                    )
                } else {
                    format!(
                        "none of {} required criteria met (score {}%)",
                        tally.required_total, count_score
                    )
                };
                (passed, message)
            } else {
                let passed = tally.matched > 0;
                let message = if passed {
                    format!(
                        "{} of {} criteria met (score {}%)",
                        tally.matched, tally.total, count_score
                    )
                } else {
                    format!("none of {} criteria met (score 0%)", tally.total)
                };
                (passed, message)
            };
            Verdict {
                passed,
                score: count_score,
                message,
            }
        }
        LogicType::ThresholdBased => threshold_verdict("score", count_score, threshold),
        LogicType::WeightedScore => {
            let score = percentage(tally.matched_weight, tally.total_weight);
            threshold_verdict("weighted score", score, threshold)
        }
    }
}

fn threshold_verdict(label: &str, score: u8, threshold: u8) -> Verdict {
    let passed = score >= threshold;
    let relation = if passed { "meets" } else { "is below" };
    Verdict {
        passed,
        score,
        message: format!("{label} {score}% {relation} passing threshold {threshold}%"),
    }
}

pub(crate) fn details(
    logic_type: LogicType,
    passing_threshold: u8,
    tally: &Tally,
) -> EvaluationDetails {
    EvaluationDetails {
        logic_type,
        passing_threshold: logic_type
            .uses_threshold()
            .then_some(passing_threshold.min(100)),
        required_total: tally.required_total,
        required_met: tally.required_met,
        matched_weight: tally.matched_weight,
        total_weight: tally.total_weight,
    }
}
