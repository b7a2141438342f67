//! Per-question answer/visit/mark bookkeeping for an exam session.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use crate::model::{OptionId, QuestionId};

//
// ─── STATUS ────────────────────────────────────────────────────────────────────
//

/// Palette classification for a question, derived from its answer record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionStatus {
    NotVisited,
    AnsweredMarked,
    Answered,
    Marked,
    NotAnswered,
}

impl fmt::Display for QuestionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            QuestionStatus::NotVisited => "not-visited",
            QuestionStatus::AnsweredMarked => "answered-marked",
            QuestionStatus::Answered => "answered",
            QuestionStatus::Marked => "marked",
            QuestionStatus::NotAnswered => "not-answered",
        };
        write!(f, "{label}")
    }
}

//
// ─── ANSWER RECORD ─────────────────────────────────────────────────────────────
//

/// Response state for a single question.
///
/// Created lazily the first time a question is displayed, answered, or
/// marked; at most one record exists per question id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerRecord {
    selected: Option<OptionId>,
    marked_for_review: bool,
    visited: bool,
}

impl AnswerRecord {
    fn unanswered() -> Self {
        Self {
            selected: None,
            marked_for_review: false,
            visited: true,
        }
    }

    #[must_use]
    pub fn selected(&self) -> Option<OptionId> {
        self.selected
    }

    #[must_use]
    pub fn marked_for_review(&self) -> bool {
        self.marked_for_review
    }

    #[must_use]
    pub fn visited(&self) -> bool {
        self.visited
    }

    #[must_use]
    pub fn is_answered(&self) -> bool {
        self.selected.is_some()
    }
}

//
// ─── LEDGER ────────────────────────────────────────────────────────────────────
//

/// Mapping from question identity to response state.
///
/// The ledger does not know the master question list; ids outside the loaded
/// list are tolerated here and guarded one layer up. The set of marked ids is
/// kept consistent with the per-record flag on every mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerLedger {
    records: HashMap<QuestionId, AnswerRecord>,
    marked: BTreeSet<QuestionId>,
}

impl AnswerLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert the record for `question_id`, setting the selected option.
    ///
    /// Marks the question visited; the review mark is left unchanged.
    pub fn record_answer(&mut self, question_id: QuestionId, selected: Option<OptionId>) {
        let record = self
            .records
            .entry(question_id)
            .or_insert_with(AnswerRecord::unanswered);
        record.selected = selected;
        record.visited = true;
    }

    /// Set the review mark explicitly, creating the record when absent.
    pub fn set_review_mark(&mut self, question_id: QuestionId, marked: bool) {
        let record = self
            .records
            .entry(question_id)
            .or_insert_with(AnswerRecord::unanswered);
        record.marked_for_review = marked;
        record.visited = true;

        if marked {
            self.marked.insert(question_id);
        } else {
            self.marked.remove(&question_id);
        }
    }

    /// Flip the review mark, creating an unanswered record when absent.
    ///
    /// Returns the mark state after the toggle.
    pub fn toggle_review_mark(&mut self, question_id: QuestionId) -> bool {
        let currently = self
            .records
            .get(&question_id)
            .is_some_and(AnswerRecord::marked_for_review);
        self.set_review_mark(question_id, !currently);
        !currently
    }

    /// Idempotently mark a question as visited, creating the record if absent.
    pub fn visit(&mut self, question_id: QuestionId) {
        self.records
            .entry(question_id)
            .or_insert_with(AnswerRecord::unanswered)
            .visited = true;
    }

    /// Null out the selection for one question.
    ///
    /// `visited` and the review mark are preserved; absent records are left
    /// absent.
    pub fn clear_answer(&mut self, question_id: QuestionId) {
        if let Some(record) = self.records.get_mut(&question_id) {
            record.selected = None;
        }
    }

    /// Null out the selection on every existing record, preserving flags.
    pub fn clear_all(&mut self) {
        for record in self.records.values_mut() {
            record.selected = None;
        }
    }

    #[must_use]
    pub fn record(&self, question_id: QuestionId) -> Option<&AnswerRecord> {
        self.records.get(&question_id)
    }

    #[must_use]
    pub fn selected(&self, question_id: QuestionId) -> Option<OptionId> {
        self.records.get(&question_id).and_then(AnswerRecord::selected)
    }

    /// Palette status for a question, in the exact classification order:
    /// not-visited, answered-marked, answered, marked, not-answered.
    #[must_use]
    pub fn status(&self, question_id: QuestionId) -> QuestionStatus {
        let Some(record) = self.records.get(&question_id) else {
            return QuestionStatus::NotVisited;
        };
        if !record.visited {
            return QuestionStatus::NotVisited;
        }

        match (record.is_answered(), record.marked_for_review) {
            (true, true) => QuestionStatus::AnsweredMarked,
            (true, false) => QuestionStatus::Answered,
            (false, true) => QuestionStatus::Marked,
            (false, false) => QuestionStatus::NotAnswered,
        }
    }

    /// Number of records holding a non-null selection.
    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.records.values().filter(|r| r.is_answered()).count()
    }

    /// Number of records currently marked for review.
    #[must_use]
    pub fn marked_count(&self) -> usize {
        self.marked.len()
    }

    /// Questions from the master list with no record or `visited = false`.
    #[must_use]
    pub fn not_visited_count<I>(&self, question_ids: I) -> usize
    where
        I: IntoIterator<Item = QuestionId>,
    {
        question_ids
            .into_iter()
            .filter(|id| !self.records.get(id).is_some_and(AnswerRecord::visited))
            .count()
    }

    /// Ids currently marked for review, in ascending id order.
    #[must_use]
    pub fn marked_ids(&self) -> &BTreeSet<QuestionId> {
        &self.marked
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn qid(id: u64) -> QuestionId {
        QuestionId::new(id)
    }

    fn oid(id: u64) -> OptionId {
        OptionId::new(id)
    }

    #[test]
    fn record_answer_creates_visited_record() {
        let mut ledger = AnswerLedger::new();
        ledger.record_answer(qid(20), Some(oid(201)));

        let record = ledger.record(qid(20)).unwrap();
        assert_eq!(record.selected(), Some(oid(201)));
        assert!(record.visited());
        assert!(!record.marked_for_review());
    }

    #[test]
    fn record_answer_preserves_review_mark() {
        let mut ledger = AnswerLedger::new();
        ledger.set_review_mark(qid(20), true);
        ledger.record_answer(qid(20), Some(oid(201)));

        assert!(ledger.record(qid(20)).unwrap().marked_for_review());
        assert_eq!(ledger.marked_count(), 1);
    }

    #[test]
    fn toggle_twice_restores_original_mark() {
        let mut ledger = AnswerLedger::new();
        assert!(ledger.toggle_review_mark(qid(30)));
        assert!(!ledger.toggle_review_mark(qid(30)));

        let record = ledger.record(qid(30)).unwrap();
        assert!(!record.marked_for_review());
        assert!(record.visited());
        assert!(ledger.marked_ids().is_empty());
    }

    #[test]
    fn marked_set_tracks_record_flags() {
        let mut ledger = AnswerLedger::new();
        ledger.set_review_mark(qid(1), true);
        ledger.set_review_mark(qid(2), true);
        ledger.set_review_mark(qid(1), false);

        assert_eq!(ledger.marked_count(), 1);
        assert!(ledger.marked_ids().contains(&qid(2)));
        assert!(!ledger.record(qid(1)).unwrap().marked_for_review());
    }

    #[test]
    fn clear_answer_preserves_flags() {
        let mut ledger = AnswerLedger::new();
        ledger.record_answer(qid(1), Some(oid(11)));
        ledger.set_review_mark(qid(1), true);

        ledger.clear_answer(qid(1));

        let record = ledger.record(qid(1)).unwrap();
        assert_eq!(record.selected(), None);
        assert!(record.visited());
        assert!(record.marked_for_review());
    }

    #[test]
    fn clear_answer_does_not_create_records() {
        let mut ledger = AnswerLedger::new();
        ledger.clear_answer(qid(5));
        assert!(ledger.is_empty());
    }

    #[test]
    fn clear_all_nulls_every_selection() {
        let mut ledger = AnswerLedger::new();
        ledger.record_answer(qid(1), Some(oid(11)));
        ledger.record_answer(qid(2), Some(oid(22)));
        ledger.set_review_mark(qid(2), true);

        ledger.clear_all();

        assert_eq!(ledger.answered_count(), 0);
        assert_eq!(ledger.marked_count(), 1);
        assert!(ledger.record(qid(1)).unwrap().visited());
    }

    #[test]
    fn visit_is_idempotent() {
        let mut ledger = AnswerLedger::new();
        ledger.visit(qid(10));
        ledger.visit(qid(10));

        assert_eq!(ledger.len(), 1);
        let record = ledger.record(qid(10)).unwrap();
        assert!(record.visited());
        assert_eq!(record.selected(), None);
    }

    #[test]
    fn status_classification_order() {
        let mut ledger = AnswerLedger::new();
        assert_eq!(ledger.status(qid(1)), QuestionStatus::NotVisited);

        ledger.visit(qid(1));
        assert_eq!(ledger.status(qid(1)), QuestionStatus::NotAnswered);

        ledger.set_review_mark(qid(1), true);
        assert_eq!(ledger.status(qid(1)), QuestionStatus::Marked);

        ledger.record_answer(qid(1), Some(oid(11)));
        assert_eq!(ledger.status(qid(1)), QuestionStatus::AnsweredMarked);

        ledger.set_review_mark(qid(1), false);
        assert_eq!(ledger.status(qid(1)), QuestionStatus::Answered);
    }

    #[test]
    fn derived_counts_for_three_question_scenario() {
        // ids [10, 20, 30]: answer 20 with option 201, mark 30 for review.
        let mut ledger = AnswerLedger::new();
        ledger.record_answer(qid(20), Some(oid(201)));
        ledger.toggle_review_mark(qid(30));

        assert_eq!(ledger.answered_count(), 1);
        assert_eq!(ledger.marked_count(), 1);
        assert_eq!(
            ledger.not_visited_count([qid(10), qid(20), qid(30)]),
            1
        );
    }

    #[test]
    fn answered_count_matches_status_classification() {
        let mut ledger = AnswerLedger::new();
        let ids = [qid(1), qid(2), qid(3), qid(4)];
        ledger.record_answer(qid(1), Some(oid(11)));
        ledger.record_answer(qid(2), Some(oid(21)));
        ledger.set_review_mark(qid(2), true);
        ledger.visit(qid(3));

        let by_status = ids
            .iter()
            .filter(|id| {
                matches!(
                    ledger.status(**id),
                    QuestionStatus::Answered | QuestionStatus::AnsweredMarked
                )
            })
            .count();
        assert_eq!(by_status, ledger.answered_count());
    }

    #[test]
    fn status_labels_are_kebab_case() {
        assert_eq!(QuestionStatus::AnsweredMarked.to_string(), "answered-marked");
        assert_eq!(QuestionStatus::NotVisited.to_string(), "not-visited");
    }
}
