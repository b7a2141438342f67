use exam_core::QuestionStatus;
use exam_core::model::QuestionId;

use super::session::ExamSession;

/// One cell of the question palette.
///
/// Presentation-agnostic: no colors, no formatted strings. The UI maps
/// status and `is_current` to whatever styling it wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaletteCell {
    pub index: usize,
    pub question_id: QuestionId,
    pub status: QuestionStatus,
    pub is_current: bool,
}

/// Palette cells for every loaded question, in exam order.
#[must_use]
pub fn palette(session: &ExamSession) -> Vec<PaletteCell> {
    session
        .questions()
        .iter()
        .enumerate()
        .map(|(index, question)| PaletteCell {
            index,
            question_id: question.id(),
            status: session.status(question.id()),
            is_current: index == session.current_index(),
        })
        .collect()
}
