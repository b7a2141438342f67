mod exam;
mod ids;
mod question;

pub use exam::{
    AnswerDetail, AnswerSubmission, DEFAULT_DURATION_SECS, ExamInfo, ExamPaper, ExamResult,
};
pub use ids::{OptionId, ParseIdError, QuestionId};
pub use question::{Choice, Question, QuestionError};
