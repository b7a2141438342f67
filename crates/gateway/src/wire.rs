//! Wire DTOs and their normalization into the domain model.
//!
//! The upstream payload is normalized here and nowhere else: `question_id`
//! becomes the single canonical identifier, missing marks default to 1, and
//! malformed entries are dropped rather than failing the whole load.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use url::Url;

use exam_core::model::{
    AnswerDetail, AnswerSubmission, Choice, ExamInfo, ExamPaper, ExamResult, OptionId, Question,
    QuestionId,
};

use crate::remote::GatewayError;

//
// ─── QUESTION LIST ─────────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
pub struct QuestionListDto {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub questions: Vec<QuestionDto>,
    #[serde(default)]
    pub questions_count: Option<u32>,
    #[serde(default)]
    pub total_marks: Option<u32>,
    #[serde(default)]
    pub total_time: Option<u32>,
    #[serde(default)]
    pub time_for_each_question: Option<u32>,
    #[serde(default)]
    pub mark_per_each_answer: Option<u32>,
    #[serde(default)]
    pub instruction: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct QuestionDto {
    #[serde(default)]
    pub question_id: Option<u64>,
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub options: Vec<OptionDto>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub marks: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct OptionDto {
    pub id: u64,
    pub option: String,
}

/// Normalize a question-list response into an [`ExamPaper`].
///
/// Entries without a `question_id`, with an empty option list, or failing
/// domain validation are dropped with a warning; a `success = false`
/// response is a rejection.
///
/// # Errors
///
/// Returns `GatewayError::Rejected` when the server flags the response as
/// unsuccessful.
pub fn paper_from_dto(dto: QuestionListDto) -> Result<ExamPaper, GatewayError> {
    if !dto.success {
        return Err(GatewayError::Rejected(
            dto.message.unwrap_or_else(|| "question fetch failed".into()),
        ));
    }

    let QuestionListDto {
        questions: entries,
        questions_count,
        total_marks,
        total_time,
        time_for_each_question,
        mark_per_each_answer,
        instruction,
        ..
    } = dto;

    let mut questions = Vec::with_capacity(entries.len());
    for entry in entries {
        match question_from_dto(entry) {
            Some(question) => questions.push(question),
            None => warn!("dropping malformed question entry"),
        }
    }

    let any_present = questions_count.is_some()
        || total_marks.is_some()
        || total_time.is_some()
        || time_for_each_question.is_some()
        || mark_per_each_answer.is_some()
        || instruction.is_some();
    let info = any_present.then(|| ExamInfo {
        questions_count: questions_count.unwrap_or_default(),
        total_marks: total_marks.unwrap_or_default(),
        total_time: total_time.unwrap_or_default(),
        time_for_each_question: time_for_each_question.unwrap_or_default(),
        mark_per_each_answer: mark_per_each_answer.unwrap_or_default(),
        instruction: instruction.unwrap_or_default(),
    });

    Ok(ExamPaper { questions, info })
}

fn question_from_dto(dto: QuestionDto) -> Option<Question> {
    let id = QuestionId::new(dto.question_id?);
    let prompt = dto.question?;

    let mut choices = Vec::with_capacity(dto.options.len());
    for option in dto.options {
        choices.push(Choice::new(OptionId::new(option.id), option.option).ok()?);
    }

    let image = dto.image.as_deref().and_then(|raw| match Url::parse(raw) {
        Ok(url) => Some(url),
        Err(_) => {
            warn!(image = raw, "ignoring unparseable question image reference");
            None
        }
    });

    Question::new(id, prompt, choices, image, dto.marks).ok()
}

//
// ─── SUBMISSION ────────────────────────────────────────────────────────────────
//

#[derive(Debug, Serialize)]
pub struct AnswerEntryDto {
    pub question_id: u64,
    pub selected_option_id: Option<u64>,
}

impl AnswerEntryDto {
    #[must_use]
    pub fn from_submission(submission: &AnswerSubmission) -> Self {
        Self {
            question_id: submission.question_id.value(),
            selected_option_id: submission.selected_option_id.map(|id| id.value()),
        }
    }
}

/// Serialize the submit payload as the JSON array the upstream form field
/// expects.
///
/// # Errors
///
/// Returns `GatewayError::Decode` if serialization fails.
pub fn answers_json(answers: &[AnswerSubmission]) -> Result<String, GatewayError> {
    let entries: Vec<AnswerEntryDto> = answers.iter().map(AnswerEntryDto::from_submission).collect();
    serde_json::to_string(&entries).map_err(|e| GatewayError::Decode(e.to_string()))
}

#[derive(Debug, Deserialize)]
pub struct SubmitResponseDto {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub exam_history_id: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub correct: Option<u32>,
    #[serde(default)]
    pub wrong: Option<u32>,
    #[serde(default)]
    pub not_attended: Option<u32>,
    #[serde(default)]
    pub submitted_at: Option<String>,
    #[serde(default)]
    pub details: Vec<AnswerDetailDto>,
}

#[derive(Debug, Deserialize)]
pub struct AnswerDetailDto {
    pub question_id: u64,
    #[serde(default)]
    pub selected_option_id: Option<u64>,
    pub correct_option_id: u64,
    pub is_correct: bool,
}

/// Normalize a submit response into an [`ExamResult`].
///
/// # Errors
///
/// Returns `GatewayError::Rejected` for a `success = false` response and
/// `GatewayError::Decode` when the attempt identifier is missing.
pub fn result_from_dto(dto: SubmitResponseDto) -> Result<ExamResult, GatewayError> {
    if !dto.success {
        return Err(GatewayError::Rejected(
            dto.message.unwrap_or_else(|| "answer submission failed".into()),
        ));
    }

    let attempt_id = dto
        .exam_history_id
        .ok_or_else(|| GatewayError::Decode("missing exam_history_id".into()))?;

    let submitted_at = dto.submitted_at.as_deref().and_then(parse_timestamp);

    let details = dto
        .details
        .into_iter()
        .map(|d| AnswerDetail {
            question_id: QuestionId::new(d.question_id),
            selected_option_id: d.selected_option_id.map(OptionId::new),
            correct_option_id: OptionId::new(d.correct_option_id),
            is_correct: d.is_correct,
        })
        .collect();

    Ok(ExamResult {
        attempt_id,
        score: dto.score.unwrap_or_default(),
        correct: dto.correct.unwrap_or_default(),
        wrong: dto.wrong.unwrap_or_default(),
        not_attended: dto.not_attended.unwrap_or_default(),
        submitted_at,
        details,
    })
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(ts) => Some(ts.with_timezone(&Utc)),
        Err(_) => {
            warn!(timestamp = raw, "ignoring unparseable submitted_at");
            None
        }
    }
}

//
// ─── AUTH ──────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
pub struct StatusDto {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

impl StatusDto {
    /// Convert a bare success/message response into a unit result.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Rejected` carrying the server message when
    /// `success` is false.
    pub fn into_result(self) -> Result<(), GatewayError> {
        if self.success {
            Ok(())
        } else {
            Err(GatewayError::Rejected(
                self.message.unwrap_or_else(|| "request failed".into()),
            ))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UserDto {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub mobile: String,
    pub qualification: String,
    #[serde(default)]
    pub profile_image: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyOtpDto {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub login: bool,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub user: Option<UserDto>,
}

#[derive(Debug, Deserialize)]
pub struct CreateProfileDto {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub user: Option<UserDto>,
}

#[derive(Debug, Deserialize)]
pub struct RefreshDto {
    #[serde(default)]
    pub access_token: Option<String>,
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
