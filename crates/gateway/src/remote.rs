use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use exam_core::model::{AnswerSubmission, ExamPaper, ExamResult};

use crate::token::TokenPair;

/// Errors surfaced by gateway adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GatewayError {
    #[error("authentication required")]
    Unauthorized,

    #[error("no access token available")]
    MissingToken,

    #[error("request rejected: {0}")]
    Rejected(String),

    #[error("request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("malformed response: {0}")]
    Decode(String),

    #[error("store error: {0}")]
    Store(String),
}

//
// ─── AUTH TYPES ────────────────────────────────────────────────────────────────
//

/// Account profile as reported by the auth endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub mobile: String,
    pub qualification: String,
    pub profile_image: Option<String>,
}

/// Authenticated identity: the profile plus the issued token pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub user: UserProfile,
    pub tokens: TokenPair,
}

/// Outcome of a successful OTP verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OtpOutcome {
    /// Known account; tokens were issued.
    Registered(AuthSession),
    /// OTP accepted but no profile exists yet; the caller must create one.
    NeedsProfile,
}

/// Fields for registering a new account after OTP verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProfile {
    pub mobile: String,
    pub name: String,
    pub email: String,
    pub qualification: String,
    pub profile_image: Option<ProfileImage>,
}

/// Raw image upload attached to profile creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileImage {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

//
// ─── GATEWAY CONTRACTS ─────────────────────────────────────────────────────────
//

/// Remote exam endpoints: question fetch and answer submission.
///
/// Correctness grading is owned entirely by the remote side; this contract
/// only moves data.
#[async_trait]
pub trait ExamGateway: Send + Sync {
    /// Fetch the question set and exam metadata.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` on transport failures, auth failures, or a
    /// rejected (`success = false`) response.
    async fn fetch_exam(&self) -> Result<ExamPaper, GatewayError>;

    /// Submit the final answers, one entry per loaded question.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` on transport failures, auth failures, or a
    /// rejected response.
    async fn submit_answers(
        &self,
        answers: &[AnswerSubmission],
    ) -> Result<ExamResult, GatewayError>;
}

/// Remote auth endpoints. Token refresh is a plain endpoint call for
/// out-of-band re-authentication; there is no transparent retry-on-401.
#[async_trait]
pub trait AuthGateway: Send + Sync {
    /// Request an OTP for the given local mobile number.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` on transport failures or a rejected response.
    async fn send_otp(&self, mobile: &str) -> Result<(), GatewayError>;

    /// Verify an OTP. Issues tokens for known accounts; new accounts must
    /// create a profile first.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Rejected` for an invalid OTP, or other
    /// `GatewayError` values on transport failures.
    async fn verify_otp(&self, mobile: &str, otp: &str) -> Result<OtpOutcome, GatewayError>;

    /// Register a profile for a freshly verified mobile number.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` on transport failures or a rejected response.
    async fn create_profile(&self, profile: &NewProfile) -> Result<AuthSession, GatewayError>;

    /// Exchange the refresh token for a new access token.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` on transport failures or a rejected response.
    async fn refresh(&self, refresh_token: &str) -> Result<String, GatewayError>;

    /// Invalidate the server-side session and clear stored tokens.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` on transport failures.
    async fn logout(&self) -> Result<(), GatewayError>;
}

//
// ─── IN-MEMORY GATEWAY ─────────────────────────────────────────────────────────
//

#[derive(Default)]
struct InMemoryState {
    paper: Option<ExamPaper>,
    result: Option<ExamResult>,
    fail_next_fetch: bool,
    fail_next_submit: bool,
    submissions: Vec<Vec<AnswerSubmission>>,
}

/// Scripted exam gateway for testing and prototyping.
///
/// Returns the configured paper/result and records every submitted payload.
/// One-shot failure injection covers the load-failure and submit-retry
/// paths without a network.
#[derive(Clone, Default)]
pub struct InMemoryGateway {
    state: Arc<Mutex<InMemoryState>>,
}

impl InMemoryGateway {
    #[must_use]
    pub fn new(paper: ExamPaper, result: ExamResult) -> Self {
        Self {
            state: Arc::new(Mutex::new(InMemoryState {
                paper: Some(paper),
                result: Some(result),
                ..InMemoryState::default()
            })),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, InMemoryState>, GatewayError> {
        self.state
            .lock()
            .map_err(|e| GatewayError::Store(e.to_string()))
    }

    /// Make the next `fetch_exam` call fail once.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Store` if the scripted state is unavailable.
    pub fn fail_next_fetch(&self) -> Result<(), GatewayError> {
        self.lock()?.fail_next_fetch = true;
        Ok(())
    }

    /// Make the next `submit_answers` call fail once.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Store` if the scripted state is unavailable.
    pub fn fail_next_submit(&self) -> Result<(), GatewayError> {
        self.lock()?.fail_next_submit = true;
        Ok(())
    }

    /// Every payload received by `submit_answers`, in call order.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Store` if the scripted state is unavailable.
    pub fn submissions(&self) -> Result<Vec<Vec<AnswerSubmission>>, GatewayError> {
        Ok(self.lock()?.submissions.clone())
    }
}

#[async_trait]
impl ExamGateway for InMemoryGateway {
    async fn fetch_exam(&self) -> Result<ExamPaper, GatewayError> {
        let mut state = self.lock()?;
        if state.fail_next_fetch {
            state.fail_next_fetch = false;
            return Err(GatewayError::Rejected("simulated fetch failure".into()));
        }
        state
            .paper
            .clone()
            .ok_or_else(|| GatewayError::Rejected("no paper configured".into()))
    }

    async fn submit_answers(
        &self,
        answers: &[AnswerSubmission],
    ) -> Result<ExamResult, GatewayError> {
        let mut state = self.lock()?;
        if state.fail_next_submit {
            state.fail_next_submit = false;
            return Err(GatewayError::Rejected("simulated submit failure".into()));
        }
        state.submissions.push(answers.to_vec());
        state
            .result
            .clone()
            .ok_or_else(|| GatewayError::Rejected("no result configured".into()))
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use exam_core::model::{Choice, OptionId, Question, QuestionId};

    fn build_paper() -> ExamPaper {
        let choices = vec![
            Choice::new(OptionId::new(1), "A").unwrap(),
            Choice::new(OptionId::new(2), "B").unwrap(),
        ];
        let question = Question::new(QuestionId::new(10), "Q", choices, None, None).unwrap();
        ExamPaper {
            questions: vec![question],
            info: None,
        }
    }

    fn build_result() -> ExamResult {
        ExamResult {
            attempt_id: "hist-1".into(),
            score: 1.0,
            correct: 1,
            wrong: 0,
            not_attended: 0,
            submitted_at: None,
            details: Vec::new(),
        }
    }

    #[tokio::test]
    async fn returns_scripted_paper_and_result() {
        let gateway = InMemoryGateway::new(build_paper(), build_result());

        let paper = gateway.fetch_exam().await.unwrap();
        assert_eq!(paper.questions.len(), 1);

        let submission = vec![AnswerSubmission {
            question_id: QuestionId::new(10),
            selected_option_id: Some(OptionId::new(1)),
        }];
        let result = gateway.submit_answers(&submission).await.unwrap();
        assert_eq!(result.attempt_id, "hist-1");
        assert_eq!(gateway.submissions().unwrap(), vec![submission]);
    }

    #[tokio::test]
    async fn fetch_failure_fires_once() {
        let gateway = InMemoryGateway::new(build_paper(), build_result());
        gateway.fail_next_fetch().unwrap();

        assert!(gateway.fetch_exam().await.is_err());
        assert!(gateway.fetch_exam().await.is_ok());
    }

    #[tokio::test]
    async fn failed_submit_records_nothing() {
        let gateway = InMemoryGateway::new(build_paper(), build_result());
        gateway.fail_next_submit().unwrap();

        let submission = vec![AnswerSubmission {
            question_id: QuestionId::new(10),
            selected_option_id: None,
        }];
        assert!(gateway.submit_answers(&submission).await.is_err());
        assert!(gateway.submissions().unwrap().is_empty());

        gateway.submit_answers(&submission).await.unwrap();
        assert_eq!(gateway.submissions().unwrap().len(), 1);
    }
}
