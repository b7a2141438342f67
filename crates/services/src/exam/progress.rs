use super::session::ExamSession;

/// Aggregated view of exam progress, useful for UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamProgress {
    pub total: usize,
    pub answered: usize,
    pub marked: usize,
    pub not_visited: usize,
    pub remaining_secs: u32,
    pub is_submitted: bool,
}

impl ExamProgress {
    #[must_use]
    pub fn from_session(session: &ExamSession) -> Self {
        Self {
            total: session.total_questions(),
            answered: session.answered_count(),
            marked: session.marked_count(),
            not_visited: session.not_visited_count(),
            remaining_secs: session.remaining_secs(),
            is_submitted: session.is_submitted(),
        }
    }
}
