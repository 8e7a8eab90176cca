use crate::infra::{InMemoryCriteriaSetRepository, InMemoryEvaluationLog};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use survey_criteria::criteria::{
    CriteriaDocument, CriteriaService, EvaluationResult, ResponseBatchImporter, ResponseSet,
};
use survey_criteria::error::AppError;

#[derive(Args, Debug)]
pub(crate) struct EvaluateArgs {
    /// Criteria document (JSON) to evaluate against
    #[arg(long)]
    pub(crate) criteria: PathBuf,
    /// Single respondent's answers as a JSON object keyed by question id
    #[arg(long, conflicts_with = "responses_csv", required_unless_present = "responses_csv")]
    pub(crate) responses: Option<PathBuf>,
    /// Survey export with one respondent per row and one question per column
    #[arg(long)]
    pub(crate) responses_csv: Option<PathBuf>,
    /// Pretty-print the JSON output
    #[arg(long)]
    pub(crate) pretty: bool,
}

/// One line of evaluate output.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RespondentVerdict {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) respondent_id: Option<String>,
    pub(crate) result: EvaluationResult,
}

pub(crate) enum ResponseSource {
    Single(ResponseSet),
    Batch(Vec<(String, ResponseSet)>),
}

pub(crate) fn run_evaluate(args: EvaluateArgs) -> Result<(), AppError> {
    let EvaluateArgs {
        criteria,
        responses,
        responses_csv,
        pretty,
    } = args;

    let raw_criteria = std::fs::read_to_string(&criteria)?;
    let source = match (responses, responses_csv) {
        (_, Some(path)) => ResponseSource::Batch(
            ResponseBatchImporter::from_path(path)?
                .into_iter()
                .map(|row| (row.respondent_id, row.responses))
                .collect(),
        ),
        (Some(path), None) => {
            let raw = std::fs::read_to_string(path)?;
            ResponseSource::Single(serde_json::from_str(&raw)?)
        }
        (None, None) => ResponseSource::Single(ResponseSet::new()),
    };

    let verdicts = evaluate_source(&raw_criteria, source)?;
    let rendered = if pretty {
        serde_json::to_string_pretty(&verdicts)?
    } else {
        serde_json::to_string(&verdicts)?
    };
    println!("{rendered}");
    Ok(())
}

/// Evaluates every respondent in `source` against the criteria document in `raw_criteria`.
/// Activation flags are ignored: the command is for trying documents out.
pub(crate) fn evaluate_source(
    raw_criteria: &str,
    source: ResponseSource,
) -> Result<Vec<RespondentVerdict>, AppError> {
    let document = CriteriaDocument::from_json_str(raw_criteria)?;
    let service = CriteriaService::new(
        Arc::new(InMemoryCriteriaSetRepository::default()),
        Arc::new(InMemoryEvaluationLog::default()),
    );

    let respondents = match source {
        ResponseSource::Single(responses) => vec![(None, responses)],
        ResponseSource::Batch(rows) => rows
            .into_iter()
            .map(|(id, responses)| (Some(id), responses))
            .collect(),
    };

    respondents
        .into_iter()
        .map(|(respondent_id, responses)| {
            let result = service.test(document.clone(), &responses)?;
            Ok(RespondentVerdict {
                respondent_id,
                result,
            })
        })
        .collect()
}
