//! Respondent qualification against operator-authored criteria sets.
//!
//! [`evaluate`] is the pure core: it takes a [`CriteriaSet`] and a respondent's
//! [`ResponseSet`] and produces an [`EvaluationResult`]. Everything else here is
//! the plumbing a caller needs around it: decoding stored documents, importing
//! response batches, storage traits, the service facade and its HTTP router.

pub mod decode;
pub mod domain;
pub(crate) mod evaluation;
pub mod import;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use decode::{decode_criteria_set, decode_criteria_sets, CriteriaDocument, DecodeError};
pub use domain::{
    AnswerValue, Condition, CriteriaSet, CriteriaSetId, Criterion, CriterionId, ExpectedValue,
    LogicType, ResponseSet,
};
pub use evaluation::{
    evaluate, ConfigurationError, EvaluationDetails, EvaluationResult, EvaluationStatus,
};
pub use import::{RespondentResponses, ResponseBatchImporter, ResponseImportError};
pub use repository::{
    CriteriaSetRepository, CriteriaSetSummary, EvaluationLog, EvaluationLogError,
    EvaluationRecord, RepositoryError,
};
pub use router::criteria_router;
pub use service::{CriteriaService, CriteriaServiceError};
