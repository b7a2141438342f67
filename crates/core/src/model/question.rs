use std::collections::HashSet;

use thiserror::Error;
use url::Url;

use crate::model::ids::{OptionId, QuestionId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question prompt cannot be empty")]
    EmptyPrompt,

    #[error("question must have at least one option")]
    NoChoices,

    #[error("duplicate option id {0} within question")]
    DuplicateChoiceId(OptionId),

    #[error("choice text cannot be empty")]
    EmptyChoiceText,

    #[error("invalid image reference: {0}")]
    InvalidImage(String),
}

//
// ─── CHOICE ────────────────────────────────────────────────────────────────────
//

/// A single selectable option of a multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    id: OptionId,
    text: String,
}

impl Choice {
    /// Build a choice, rejecting empty display text.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::EmptyChoiceText` if `text` is blank.
    pub fn new(id: OptionId, text: impl Into<String>) -> Result<Self, QuestionError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(QuestionError::EmptyChoiceText);
        }
        Ok(Self { id, text })
    }

    #[must_use]
    pub fn id(&self) -> OptionId {
        self.id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// One exam question with its ordered option list.
///
/// Immutable once loaded for a session; option ids are unique within the
/// question and the option order is the display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    prompt: String,
    choices: Vec<Choice>,
    image: Option<Url>,
    marks: u32,
}

impl Question {
    /// Default point value when the upstream payload carries none.
    pub const DEFAULT_MARKS: u32 = 1;

    /// Validate and build a question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::EmptyPrompt` for a blank prompt,
    /// `QuestionError::NoChoices` for an empty option list, and
    /// `QuestionError::DuplicateChoiceId` when two options share an id.
    pub fn new(
        id: QuestionId,
        prompt: impl Into<String>,
        choices: Vec<Choice>,
        image: Option<Url>,
        marks: Option<u32>,
    ) -> Result<Self, QuestionError> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(QuestionError::EmptyPrompt);
        }
        if choices.is_empty() {
            return Err(QuestionError::NoChoices);
        }

        let mut seen = HashSet::with_capacity(choices.len());
        for choice in &choices {
            if !seen.insert(choice.id()) {
                return Err(QuestionError::DuplicateChoiceId(choice.id()));
            }
        }

        Ok(Self {
            id,
            prompt,
            choices,
            image,
            marks: marks.unwrap_or(Self::DEFAULT_MARKS),
        })
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn choices(&self) -> &[Choice] {
        &self.choices
    }

    #[must_use]
    pub fn image(&self) -> Option<&Url> {
        self.image.as_ref()
    }

    #[must_use]
    pub fn marks(&self) -> u32 {
        self.marks
    }

    /// Returns true if `option_id` belongs to this question.
    #[must_use]
    pub fn has_choice(&self, option_id: OptionId) -> bool {
        self.choices.iter().any(|c| c.id() == option_id)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn build_choices() -> Vec<Choice> {
        vec![
            Choice::new(OptionId::new(1), "Harappa").unwrap(),
            Choice::new(OptionId::new(2), "Lothal").unwrap(),
        ]
    }

    #[test]
    fn question_defaults_to_one_mark() {
        let q = Question::new(
            QuestionId::new(10),
            "First excavated Indus site?",
            build_choices(),
            None,
            None,
        )
        .unwrap();

        assert_eq!(q.marks(), 1);
        assert_eq!(q.choices().len(), 2);
    }

    #[test]
    fn question_keeps_explicit_marks() {
        let q = Question::new(QuestionId::new(10), "Q", build_choices(), None, Some(4)).unwrap();
        assert_eq!(q.marks(), 4);
    }

    #[test]
    fn question_rejects_empty_prompt() {
        let err =
            Question::new(QuestionId::new(10), "   ", build_choices(), None, None).unwrap_err();
        assert!(matches!(err, QuestionError::EmptyPrompt));
    }

    #[test]
    fn question_rejects_empty_option_list() {
        let err = Question::new(QuestionId::new(10), "Q", Vec::new(), None, None).unwrap_err();
        assert!(matches!(err, QuestionError::NoChoices));
    }

    #[test]
    fn question_rejects_duplicate_option_ids() {
        let choices = vec![
            Choice::new(OptionId::new(7), "A").unwrap(),
            Choice::new(OptionId::new(7), "B").unwrap(),
        ];
        let err = Question::new(QuestionId::new(10), "Q", choices, None, None).unwrap_err();
        assert!(matches!(err, QuestionError::DuplicateChoiceId(id) if id == OptionId::new(7)));
    }

    #[test]
    fn choice_rejects_blank_text() {
        let err = Choice::new(OptionId::new(1), "  ").unwrap_err();
        assert!(matches!(err, QuestionError::EmptyChoiceText));
    }

    #[test]
    fn has_choice_checks_membership() {
        let q = Question::new(QuestionId::new(10), "Q", build_choices(), None, None).unwrap();
        assert!(q.has_choice(OptionId::new(1)));
        assert!(!q.has_choice(OptionId::new(99)));
    }
}
