use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, warn};

use exam_core::model::{ExamResult, OptionId, Question, QuestionId};
use exam_core::{AnswerLedger, Clock, QuestionStatus};
use gateway::ExamGateway;

use crate::error::ExamError;
use super::progress::ExamProgress;
use super::session::ExamSession;
use super::view::{PaletteCell, palette};

//
// ─── PHASES & OUTCOMES ─────────────────────────────────────────────────────────
//

/// Lifecycle phase of the exam controller.
///
/// A failed submit does not leave `Active`: the error is surfaced through
/// [`ExamController::last_error`] and the user may retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExamPhase {
    Unloaded,
    Loading,
    Active,
    Submitted,
    Failed,
}

/// Outcome of a submit attempt that did not error.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Answers were accepted; the graded result is stored on the controller.
    Completed(ExamResult),
    /// Another submit was already in flight; this call was a no-op.
    Ignored,
    /// The session was reset while the request was in flight; the response
    /// was discarded.
    Stale,
}

//
// ─── CONTROLLER STATE ──────────────────────────────────────────────────────────
//

struct ControllerState {
    phase: ExamPhase,
    session: Option<ExamSession>,
    result: Option<ExamResult>,
    last_error: Option<String>,
    generation: u64,
    submit_in_flight: bool,
}

impl ControllerState {
    fn new() -> Self {
        Self {
            phase: ExamPhase::Unloaded,
            session: None,
            result: None,
            last_error: None,
            generation: 0,
            submit_in_flight: false,
        }
    }

    fn active_session(&mut self) -> Result<&mut ExamSession, ExamError> {
        match self.phase {
            ExamPhase::Active => self.session.as_mut().ok_or(ExamError::NotActive),
            ExamPhase::Submitted => Err(ExamError::AlreadySubmitted),
            _ => Err(ExamError::NotActive),
        }
    }
}

//
// ─── CONTROLLER ────────────────────────────────────────────────────────────────
//

/// Orchestrates one exam attempt against the remote gateway.
///
/// All session state lives behind a shared handle so clones observe the same
/// attempt; the lock is never held across an await. Every in-flight network
/// call is tagged with the session generation and its response is discarded
/// if the session was reset in the meantime.
#[derive(Clone)]
pub struct ExamController {
    clock: Clock,
    gateway: Arc<dyn ExamGateway>,
    state: Arc<Mutex<ControllerState>>,
}

impl ExamController {
    #[must_use]
    pub fn new(clock: Clock, gateway: Arc<dyn ExamGateway>) -> Self {
        Self {
            clock,
            gateway,
            state: Arc::new(Mutex::new(ControllerState::new())),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, ControllerState>, ExamError> {
        self.state.lock().map_err(|_| ExamError::Poisoned)
    }

    /// Fetch the question set and start the exam.
    ///
    /// Any previous session is discarded before the fetch; the exam starts
    /// as soon as the paper arrives. A reset racing the fetch wins: the
    /// stale paper is dropped.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::Gateway` when the fetch fails; the controller is
    /// left in the `Failed` phase and `load()` may be called again.
    pub async fn load(&self) -> Result<(), ExamError> {
        let generation = {
            let mut state = self.lock()?;
            state.phase = ExamPhase::Loading;
            state.session = None;
            state.result = None;
            state.last_error = None;
            state.submit_in_flight = false;
            state.generation += 1;
            state.generation
        };

        let fetched = self.gateway.fetch_exam().await;

        let mut state = self.lock()?;
        if state.generation != generation {
            debug!("discarding stale question fetch");
            return Ok(());
        }

        match fetched {
            Ok(paper) => {
                debug!(questions = paper.questions.len(), "exam loaded");
                state.session = Some(ExamSession::new(paper, self.clock.now()));
                state.phase = ExamPhase::Active;
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "question fetch failed");
                state.phase = ExamPhase::Failed;
                state.last_error = Some(err.to_string());
                Err(err.into())
            }
        }
    }

    /// Record (or replace) the selected option for a question.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::NotActive`/`AlreadySubmitted` outside the active
    /// phase and `ExamError::UnknownQuestion` for unloaded ids.
    pub fn select_answer(
        &self,
        question_id: QuestionId,
        option: Option<OptionId>,
    ) -> Result<(), ExamError> {
        self.lock()?.active_session()?.select_answer(question_id, option)
    }

    /// Flip the review mark for a question, returning the new mark state.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::NotActive`/`AlreadySubmitted` outside the active
    /// phase and `ExamError::UnknownQuestion` for unloaded ids.
    pub fn toggle_review(&self, question_id: QuestionId) -> Result<bool, ExamError> {
        self.lock()?.active_session()?.toggle_review(question_id)
    }

    /// Null out the selection for one question.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::NotActive`/`AlreadySubmitted` outside the active
    /// phase.
    pub fn clear_answer(&self, question_id: QuestionId) -> Result<(), ExamError> {
        self.lock()?.active_session()?.clear_answer(question_id)
    }

    /// Null out every selection.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::NotActive`/`AlreadySubmitted` outside the active
    /// phase.
    pub fn clear_all_answers(&self) -> Result<(), ExamError> {
        self.lock()?.active_session()?.clear_all_answers()
    }

    /// Jump to a question by index. Out-of-range requests are ignored and
    /// report `None`.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::NotActive`/`AlreadySubmitted` outside the active
    /// phase.
    pub fn go_to(&self, index: usize) -> Result<Option<usize>, ExamError> {
        Ok(self.lock()?.active_session()?.go_to(index))
    }

    /// Move to the next question; a no-op at the last one.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::NotActive`/`AlreadySubmitted` outside the active
    /// phase.
    pub fn next(&self) -> Result<Option<usize>, ExamError> {
        Ok(self.lock()?.active_session()?.next())
    }

    /// Move to the previous question; a no-op at the first one.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::NotActive`/`AlreadySubmitted` outside the active
    /// phase.
    pub fn previous(&self) -> Result<Option<usize>, ExamError> {
        Ok(self.lock()?.active_session()?.previous())
    }

    /// Consume one elapsed second; on expiry triggers the submit path once.
    ///
    /// Ticks outside the active phase (or after teardown) are no-ops. A tick
    /// observing zero while a submit is already in flight does not start a
    /// second submission.
    ///
    /// # Errors
    ///
    /// Propagates submit failures when the expiry-forced submission fails;
    /// the session stays active and manual resubmission remains possible.
    pub async fn tick(&self) -> Result<Option<SubmitOutcome>, ExamError> {
        let expired = {
            let mut state = self.lock()?;
            match (state.phase, state.session.as_mut()) {
                (ExamPhase::Active, Some(session)) => session.tick(),
                _ => false,
            }
        };

        if !expired {
            return Ok(None);
        }
        debug!("exam time expired, forcing submission");
        self.submit().await.map(Some)
    }

    /// Submit the answers for grading.
    ///
    /// Builds the payload from every loaded question (unanswered ones are
    /// included with no selection). At most one submission runs at a time: a
    /// re-entrant call while one is in flight returns
    /// [`SubmitOutcome::Ignored`]. On failure the session stays active with
    /// the ledger untouched, so the user can retry.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::Gateway` when the remote call fails,
    /// `ExamError::NotActive` before a load, and
    /// `ExamError::AlreadySubmitted` after a successful submission.
    pub async fn submit(&self) -> Result<SubmitOutcome, ExamError> {
        let (payload, generation) = {
            let mut state = self.lock()?;
            if state.submit_in_flight {
                debug!("ignoring re-entrant submit");
                return Ok(SubmitOutcome::Ignored);
            }
            let payload = state.active_session()?.submission_payload();
            state.submit_in_flight = true;
            (payload, state.generation)
        };

        let outcome = self.gateway.submit_answers(&payload).await;

        let mut state = self.lock()?;
        if state.generation != generation {
            debug!("discarding stale submit response");
            return Ok(SubmitOutcome::Stale);
        }
        state.submit_in_flight = false;

        match outcome {
            Ok(result) => {
                if let Some(session) = state.session.as_mut() {
                    session.mark_submitted();
                }
                state.phase = ExamPhase::Submitted;
                state.result = Some(result.clone());
                state.last_error = None;
                Ok(SubmitOutcome::Completed(result))
            }
            Err(err) => {
                warn!(error = %err, "answer submission failed");
                state.last_error = Some(err.to_string());
                Err(err.into())
            }
        }
    }

    /// Tear down the session (logout, navigation away, fresh load).
    ///
    /// Late-arriving responses from before the reset are discarded, and
    /// subsequent ticks are no-ops.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::Poisoned` if the state lock is unavailable.
    pub fn reset(&self) -> Result<(), ExamError> {
        let mut state = self.lock()?;
        state.phase = ExamPhase::Unloaded;
        state.session = None;
        state.result = None;
        state.last_error = None;
        state.submit_in_flight = false;
        state.generation += 1;
        Ok(())
    }

    // ─── Read-only views ───────────────────────────────────────────────────

    /// Current lifecycle phase.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::Poisoned` if the state lock is unavailable.
    pub fn phase(&self) -> Result<ExamPhase, ExamError> {
        Ok(self.lock()?.phase)
    }

    /// Last user-visible failure message, if any.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::Poisoned` if the state lock is unavailable.
    pub fn last_error(&self) -> Result<Option<String>, ExamError> {
        Ok(self.lock()?.last_error.clone())
    }

    /// Graded result of a completed attempt.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::Poisoned` if the state lock is unavailable.
    pub fn result(&self) -> Result<Option<ExamResult>, ExamError> {
        Ok(self.lock()?.result.clone())
    }

    /// Progress counters for the loaded session.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::NotActive` when nothing is loaded.
    pub fn progress(&self) -> Result<ExamProgress, ExamError> {
        let state = self.lock()?;
        state
            .session
            .as_ref()
            .map(ExamSession::progress)
            .ok_or(ExamError::NotActive)
    }

    /// Palette cells for the loaded session.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::NotActive` when nothing is loaded.
    pub fn palette(&self) -> Result<Vec<PaletteCell>, ExamError> {
        let state = self.lock()?;
        state
            .session
            .as_ref()
            .map(palette)
            .ok_or(ExamError::NotActive)
    }

    /// Snapshot of the answer ledger, for inspection and tests.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::NotActive` when nothing is loaded.
    pub fn ledger(&self) -> Result<AnswerLedger, ExamError> {
        let state = self.lock()?;
        state
            .session
            .as_ref()
            .map(|session| session.ledger().clone())
            .ok_or(ExamError::NotActive)
    }

    /// The question under the cursor.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::NotActive` when nothing is loaded.
    pub fn current_question(&self) -> Result<Option<Question>, ExamError> {
        let state = self.lock()?;
        state
            .session
            .as_ref()
            .map(|session| session.current_question().cloned())
            .ok_or(ExamError::NotActive)
    }

    /// Palette status for one question.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::NotActive` when nothing is loaded.
    pub fn status(&self, question_id: QuestionId) -> Result<QuestionStatus, ExamError> {
        let state = self.lock()?;
        state
            .session
            .as_ref()
            .map(|session| session.status(question_id))
            .ok_or(ExamError::NotActive)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use exam_core::model::{AnswerSubmission, Choice, ExamInfo, ExamPaper};
    use exam_core::time::fixed_now;
    use gateway::InMemoryGateway;

    fn build_question(id: u64) -> Question {
        let choices = vec![
            Choice::new(OptionId::new(id * 10 + 1), "A").unwrap(),
            Choice::new(OptionId::new(id * 10 + 2), "B").unwrap(),
        ];
        Question::new(QuestionId::new(id), format!("Q{id}"), choices, None, None).unwrap()
    }

    fn build_paper(ids: &[u64], total_time: Option<u32>) -> ExamPaper {
        ExamPaper {
            questions: ids.iter().copied().map(build_question).collect(),
            info: total_time.map(|minutes| ExamInfo {
                questions_count: ids.len() as u32,
                total_marks: ids.len() as u32,
                total_time: minutes,
                time_for_each_question: 60,
                mark_per_each_answer: 1,
                instruction: String::new(),
            }),
        }
    }

    fn build_result() -> ExamResult {
        ExamResult {
            attempt_id: "hist-1".into(),
            score: 1.0,
            correct: 1,
            wrong: 0,
            not_attended: 2,
            submitted_at: None,
            details: Vec::new(),
        }
    }

    fn build_controller(
        ids: &[u64],
        total_time: Option<u32>,
    ) -> (ExamController, InMemoryGateway) {
        let gateway = InMemoryGateway::new(build_paper(ids, total_time), build_result());
        let controller =
            ExamController::new(Clock::fixed(fixed_now()), Arc::new(gateway.clone()));
        (controller, gateway)
    }

    #[tokio::test]
    async fn load_starts_the_exam() {
        let (controller, _gateway) = build_controller(&[10, 20, 30], None);
        controller.load().await.unwrap();

        assert_eq!(controller.phase().unwrap(), ExamPhase::Active);
        let progress = controller.progress().unwrap();
        assert_eq!(progress.total, 3);
        assert_eq!(progress.remaining_secs, 3600);
    }

    #[tokio::test]
    async fn load_failure_enters_failed_phase_and_retry_recovers() {
        let (controller, gateway) = build_controller(&[10], None);
        gateway.fail_next_fetch().unwrap();

        assert!(controller.load().await.is_err());
        assert_eq!(controller.phase().unwrap(), ExamPhase::Failed);
        assert!(controller.last_error().unwrap().is_some());
        assert!(controller.progress().is_err());

        controller.load().await.unwrap();
        assert_eq!(controller.phase().unwrap(), ExamPhase::Active);
        assert_eq!(controller.last_error().unwrap(), None);
    }

    #[tokio::test]
    async fn actions_require_an_active_exam() {
        let (controller, _gateway) = build_controller(&[10], None);
        assert!(matches!(
            controller.select_answer(QuestionId::new(10), Some(OptionId::new(101))),
            Err(ExamError::NotActive)
        ));
        assert!(matches!(controller.next(), Err(ExamError::NotActive)));
    }

    #[tokio::test]
    async fn submit_sends_every_question() {
        let (controller, gateway) = build_controller(&[10, 20, 30], None);
        controller.load().await.unwrap();
        controller
            .select_answer(QuestionId::new(20), Some(OptionId::new(201)))
            .unwrap();

        let outcome = controller.submit().await.unwrap();
        assert!(matches!(outcome, SubmitOutcome::Completed(_)));
        assert_eq!(controller.phase().unwrap(), ExamPhase::Submitted);

        let submissions = gateway.submissions().unwrap();
        assert_eq!(submissions.len(), 1);
        assert_eq!(
            submissions[0],
            vec![
                AnswerSubmission {
                    question_id: QuestionId::new(10),
                    selected_option_id: None,
                },
                AnswerSubmission {
                    question_id: QuestionId::new(20),
                    selected_option_id: Some(OptionId::new(201)),
                },
                AnswerSubmission {
                    question_id: QuestionId::new(30),
                    selected_option_id: None,
                },
            ]
        );
    }

    #[tokio::test]
    async fn failed_submit_keeps_session_active_and_ledger_intact() {
        let (controller, gateway) = build_controller(&[10, 20], None);
        controller.load().await.unwrap();
        controller
            .select_answer(QuestionId::new(10), Some(OptionId::new(101)))
            .unwrap();
        controller.toggle_review(QuestionId::new(20)).unwrap();
        let ledger_before = controller.ledger().unwrap();

        gateway.fail_next_submit().unwrap();
        assert!(controller.submit().await.is_err());

        assert_eq!(controller.phase().unwrap(), ExamPhase::Active);
        assert!(controller.last_error().unwrap().is_some());
        assert_eq!(controller.ledger().unwrap(), ledger_before);

        let outcome = controller.submit().await.unwrap();
        assert!(matches!(outcome, SubmitOutcome::Completed(_)));
        assert_eq!(controller.ledger().unwrap(), ledger_before);
    }

    #[tokio::test]
    async fn second_submit_after_success_is_rejected() {
        let (controller, _gateway) = build_controller(&[10], None);
        controller.load().await.unwrap();
        controller.submit().await.unwrap();

        assert!(matches!(
            controller.submit().await,
            Err(ExamError::AlreadySubmitted)
        ));
    }

    #[tokio::test]
    async fn expiry_forces_a_single_submission() {
        let (controller, gateway) = build_controller(&[10], Some(1));
        controller.load().await.unwrap();

        let mut completed = 0;
        for _ in 0..60 {
            if let Some(SubmitOutcome::Completed(_)) = controller.tick().await.unwrap() {
                completed += 1;
            }
        }
        assert_eq!(completed, 1);
        assert_eq!(controller.phase().unwrap(), ExamPhase::Submitted);

        // ticks after submission are no-ops
        assert_eq!(controller.tick().await.unwrap(), None);
        assert_eq!(gateway.submissions().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failed_expiry_submit_allows_manual_retry() {
        let (controller, gateway) = build_controller(&[10], Some(1));
        controller.load().await.unwrap();
        gateway.fail_next_submit().unwrap();

        let mut tick_errors = 0;
        for _ in 0..60 {
            if controller.tick().await.is_err() {
                tick_errors += 1;
            }
        }
        assert_eq!(tick_errors, 1);
        assert_eq!(controller.phase().unwrap(), ExamPhase::Active);

        // the expiry signal is one-shot: no further auto-submit attempts
        assert_eq!(controller.tick().await.unwrap(), None);
        assert!(gateway.submissions().unwrap().is_empty());

        let outcome = controller.submit().await.unwrap();
        assert!(matches!(outcome, SubmitOutcome::Completed(_)));
    }

    #[tokio::test]
    async fn reset_tears_down_the_session() {
        let (controller, _gateway) = build_controller(&[10], None);
        controller.load().await.unwrap();
        controller.reset().unwrap();

        assert_eq!(controller.phase().unwrap(), ExamPhase::Unloaded);
        assert!(controller.progress().is_err());
        assert_eq!(controller.tick().await.unwrap(), None);
    }

    #[tokio::test]
    async fn navigation_moves_and_visits() {
        let (controller, _gateway) = build_controller(&[10, 20, 30], None);
        controller.load().await.unwrap();

        assert_eq!(controller.next().unwrap(), Some(1));
        assert_eq!(controller.go_to(2).unwrap(), Some(2));
        assert_eq!(controller.next().unwrap(), None);
        assert_eq!(controller.go_to(9).unwrap(), None);

        assert_eq!(
            controller.status(QuestionId::new(20)).unwrap(),
            QuestionStatus::NotAnswered
        );
        assert_eq!(
            controller.status(QuestionId::new(10)).unwrap(),
            QuestionStatus::NotVisited
        );
        let question = controller.current_question().unwrap().unwrap();
        assert_eq!(question.id(), QuestionId::new(30));
    }
}
