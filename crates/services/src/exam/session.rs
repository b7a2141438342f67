use chrono::{DateTime, Utc};
use std::fmt;

use exam_core::model::{AnswerSubmission, ExamInfo, ExamPaper, OptionId, Question, QuestionId};
use exam_core::{AnswerLedger, CountdownTimer, Cursor, QuestionStatus};

use crate::error::ExamError;
use super::progress::ExamProgress;

//
// ─── EXAM SESSION ──────────────────────────────────────────────────────────────
//

/// In-memory state for one exam attempt.
///
/// Composes the question list with the answer ledger, the navigation cursor
/// and the countdown timer. The exam starts as soon as the paper is loaded;
/// the session stops accepting mutations once submitted.
pub struct ExamSession {
    questions: Vec<Question>,
    info: Option<ExamInfo>,
    ledger: AnswerLedger,
    cursor: Cursor,
    timer: CountdownTimer,
    started: bool,
    submitted: bool,
    started_at: DateTime<Utc>,
}

impl ExamSession {
    /// Start a session from a fetched paper.
    ///
    /// The cursor starts at 0 but the first question only counts as visited
    /// once it is navigated to or acted on. `started_at` should come from
    /// the services layer clock to keep time deterministic.
    #[must_use]
    pub fn new(paper: ExamPaper, started_at: DateTime<Utc>) -> Self {
        let duration = paper.duration_secs();
        let ExamPaper { questions, info } = paper;
        let count = questions.len();
        Self {
            questions,
            info,
            ledger: AnswerLedger::new(),
            cursor: Cursor::new(count),
            timer: CountdownTimer::new(duration),
            started: true,
            submitted: false,
            started_at,
        }
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn info(&self) -> Option<&ExamInfo> {
        self.info.as_ref()
    }

    #[must_use]
    pub fn ledger(&self) -> &AnswerLedger {
        &self.ledger
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.cursor.index()
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.cursor.index())
    }

    #[must_use]
    pub fn remaining_secs(&self) -> u32 {
        self.timer.remaining_secs()
    }

    #[must_use]
    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.started && !self.submitted
    }

    fn guard_known(&self, question_id: QuestionId) -> Result<(), ExamError> {
        if self.questions.iter().any(|q| q.id() == question_id) {
            Ok(())
        } else {
            Err(ExamError::UnknownQuestion(question_id))
        }
    }

    fn guard_active(&self) -> Result<(), ExamError> {
        if self.submitted {
            return Err(ExamError::AlreadySubmitted);
        }
        Ok(())
    }

    /// Record (or replace) the selected option for a question.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::UnknownQuestion` for ids outside the loaded list
    /// and `ExamError::AlreadySubmitted` after submission.
    pub fn select_answer(
        &mut self,
        question_id: QuestionId,
        option: Option<OptionId>,
    ) -> Result<(), ExamError> {
        self.guard_active()?;
        self.guard_known(question_id)?;
        self.ledger.record_answer(question_id, option);
        Ok(())
    }

    /// Flip the review mark for a question, returning the new mark state.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::UnknownQuestion` for ids outside the loaded list
    /// and `ExamError::AlreadySubmitted` after submission.
    pub fn toggle_review(&mut self, question_id: QuestionId) -> Result<bool, ExamError> {
        self.guard_active()?;
        self.guard_known(question_id)?;
        Ok(self.ledger.toggle_review_mark(question_id))
    }

    /// Null out the selection for one question, keeping visit/mark flags.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::AlreadySubmitted` after submission.
    pub fn clear_answer(&mut self, question_id: QuestionId) -> Result<(), ExamError> {
        self.guard_active()?;
        self.ledger.clear_answer(question_id);
        Ok(())
    }

    /// Null out every selection, keeping visit/mark flags.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::AlreadySubmitted` after submission.
    pub fn clear_all_answers(&mut self) -> Result<(), ExamError> {
        self.guard_active()?;
        self.ledger.clear_all();
        Ok(())
    }

    /// Jump to a question by index; out-of-range requests are ignored.
    ///
    /// A successful move marks the target question visited.
    pub fn go_to(&mut self, index: usize) -> Option<usize> {
        let moved = self.cursor.go_to(index)?;
        self.visit_current();
        Some(moved)
    }

    /// Move to the next question; a no-op at the last one.
    pub fn next(&mut self) -> Option<usize> {
        let moved = self.cursor.next()?;
        self.visit_current();
        Some(moved)
    }

    /// Move to the previous question; a no-op at the first one.
    pub fn previous(&mut self) -> Option<usize> {
        let moved = self.cursor.previous()?;
        self.visit_current();
        Some(moved)
    }

    fn visit_current(&mut self) {
        if let Some(question) = self.questions.get(self.cursor.index()) {
            self.ledger.visit(question.id());
        }
    }

    /// Consume one elapsed second while the session is active.
    ///
    /// Returns `true` exactly once, when the countdown expires. Ticks after
    /// submission decrement nothing.
    #[must_use]
    pub fn tick(&mut self) -> bool {
        if !self.is_active() {
            return false;
        }
        self.timer.tick()
    }

    /// Seal the session after a successful submission.
    pub fn mark_submitted(&mut self) {
        self.submitted = true;
        self.started = false;
    }

    #[must_use]
    pub fn status(&self, question_id: QuestionId) -> QuestionStatus {
        self.ledger.status(question_id)
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.ledger.answered_count()
    }

    #[must_use]
    pub fn marked_count(&self) -> usize {
        self.ledger.marked_count()
    }

    #[must_use]
    pub fn not_visited_count(&self) -> usize {
        self.ledger
            .not_visited_count(self.questions.iter().map(Question::id))
    }

    /// Returns a summary of the current session progress.
    #[must_use]
    pub fn progress(&self) -> ExamProgress {
        ExamProgress::from_session(self)
    }

    /// Build the submit payload: one entry per loaded question, in exam
    /// order, with `None` for unanswered ones.
    #[must_use]
    pub fn submission_payload(&self) -> Vec<AnswerSubmission> {
        self.questions
            .iter()
            .map(|question| AnswerSubmission {
                question_id: question.id(),
                selected_option_id: self.ledger.selected(question.id()),
            })
            .collect()
    }
}

impl fmt::Debug for ExamSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExamSession")
            .field("questions_len", &self.questions.len())
            .field("current", &self.cursor.index())
            .field("answered", &self.ledger.answered_count())
            .field("remaining_secs", &self.timer.remaining_secs())
            .field("started", &self.started)
            .field("submitted", &self.submitted)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
