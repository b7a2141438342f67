//! Shared error types for the services crate.

use thiserror::Error;

use exam_core::model::QuestionId;
use gateway::GatewayError;

/// Errors emitted by the exam session controller.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExamError {
    #[error("no exam is active")]
    NotActive,

    #[error("exam already submitted")]
    AlreadySubmitted,

    #[error("question {0} is not part of the loaded exam")]
    UnknownQuestion(QuestionId),

    #[error("session state lock poisoned")]
    Poisoned,

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}
