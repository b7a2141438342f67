use chrono::{DateTime, Utc};

use crate::model::ids::{OptionId, QuestionId};
use crate::model::question::Question;

/// Fallback exam duration when the upstream payload carries no usable
/// `total_time` (one hour).
pub const DEFAULT_DURATION_SECS: u32 = 3600;

//
// ─── EXAM INFO ─────────────────────────────────────────────────────────────────
//

/// Exam-level metadata reported alongside the question list.
///
/// `total_time` is in minutes, as delivered by the upstream API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamInfo {
    pub questions_count: u32,
    pub total_marks: u32,
    pub total_time: u32,
    pub time_for_each_question: u32,
    pub mark_per_each_answer: u32,
    pub instruction: String,
}

//
// ─── EXAM PAPER ────────────────────────────────────────────────────────────────
//

/// A fetched question set plus its metadata, in exam display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamPaper {
    pub questions: Vec<Question>,
    pub info: Option<ExamInfo>,
}

impl ExamPaper {
    /// Exam duration in seconds.
    ///
    /// Uses `info.total_time` (minutes) when present and non-zero, otherwise
    /// falls back to [`DEFAULT_DURATION_SECS`].
    #[must_use]
    pub fn duration_secs(&self) -> u32 {
        match &self.info {
            Some(info) if info.total_time > 0 => info.total_time.saturating_mul(60),
            _ => DEFAULT_DURATION_SECS,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

//
// ─── SUBMISSION ────────────────────────────────────────────────────────────────
//

/// One entry of the submit payload.
///
/// The payload carries every loaded question; unanswered ones submit with
/// `selected_option_id = None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerSubmission {
    pub question_id: QuestionId,
    pub selected_option_id: Option<OptionId>,
}

//
// ─── RESULT ────────────────────────────────────────────────────────────────────
//

/// Per-question grading detail returned by the remote grader.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerDetail {
    pub question_id: QuestionId,
    pub selected_option_id: Option<OptionId>,
    pub correct_option_id: OptionId,
    pub is_correct: bool,
}

/// Graded exam outcome. Grading is owned entirely by the remote API; this is
/// a read-only record of what it returned.
#[derive(Debug, Clone, PartialEq)]
pub struct ExamResult {
    pub attempt_id: String,
    pub score: f64,
    pub correct: u32,
    pub wrong: u32,
    pub not_attended: u32,
    pub submitted_at: Option<DateTime<Utc>>,
    pub details: Vec<AnswerDetail>,
}
