use std::io::Read;
use std::path::Path;

use serde::Serialize;

use super::domain::{AnswerValue, ResponseSet};

const RESPONDENT_COLUMNS: [&str; 3] = ["respondent_id", "respondentid", "respondent"];

#[derive(Debug, thiserror::Error)]
pub enum ResponseImportError {
    #[error("failed to read response export: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid response CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("response CSV has no question columns")]
    NoQuestionColumns,
}

/// One respondent's answers read from a batch export.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RespondentResponses {
    pub respondent_id: String,
    pub responses: ResponseSet,
}

/// Reads survey exports where each row is a respondent and each column a question.
pub struct ResponseBatchImporter;

impl ResponseBatchImporter {
    pub fn from_path<P: AsRef<Path>>(
        path: P,
    ) -> Result<Vec<RespondentResponses>, ResponseImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(
        reader: R,
    ) -> Result<Vec<RespondentResponses>, ResponseImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader
            .headers()?
            .iter()
            .map(|header| header.replace('\u{feff}', "").trim().to_string())
            .collect();

        let respondent_column = headers
            .iter()
            .position(|header| RESPONDENT_COLUMNS.contains(&header.to_ascii_lowercase().as_str()));

        let question_count = headers
            .iter()
            .enumerate()
            .filter(|(index, header)| Some(*index) != respondent_column && !header.is_empty())
            .count();
        if question_count == 0 {
            return Err(ResponseImportError::NoQuestionColumns);
        }

        let mut batch = Vec::new();
        for (row_index, record) in csv_reader.records().enumerate() {
            let record = record?;
            let respondent_id = respondent_column
                .and_then(|column| record.get(column))
                .filter(|value| !value.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| format!("row-{}", row_index + 1));

            let responses = headers
                .iter()
                .enumerate()
                .filter(|(index, header)| Some(*index) != respondent_column && !header.is_empty())
                .filter_map(|(index, header)| {
                    record
                        .get(index)
                        .filter(|value| !value.is_empty())
                        .map(|value| (header.clone(), AnswerValue::Text(value.to_string())))
                })
                .collect::<ResponseSet>();

            batch.push(RespondentResponses {
                respondent_id,
                responses,
            });
        }

        Ok(batch)
    }
}
