// src/session/ledger.rs

use crate::models::session::AnswerRecord;

/// Index-aligned record of the answers given during a session.
///
/// Slot `i` always belongs to question `i`. Slots are created lazily, so the
/// backing vector grows up to the highest recorded index and never past
/// `capacity`.
#[derive(Debug, Clone, Default)]
pub struct AnswerLedger {
    capacity: usize,
    entries: Vec<Option<AnswerRecord>>,
}

impl AnswerLedger {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Vec::new(),
        }
    }

    /// Writes or overwrites the answer at `index`. Returns `false` when `index`
    /// is outside the quiz; nothing is written in that case.
    pub fn record(&mut self, index: usize, selected_text: &str, time_spent_ms: u64) -> bool {
        if index >= self.capacity {
            return false;
        }
        if self.entries.len() <= index {
            self.entries.resize(index + 1, None);
        }
        self.entries[index] = Some(AnswerRecord {
            selected_option_text: selected_text.to_string(),
            time_spent_ms,
        });
        true
    }

    pub fn get(&self, index: usize) -> Option<&AnswerRecord> {
        self.entries.get(index).and_then(Option::as_ref)
    }

    pub fn is_answered(&self, index: usize) -> bool {
        self.get(index).is_some()
    }

    /// Recorded slots so far, holes included.
    pub fn all(&self) -> &[Option<AnswerRecord>] {
        &self.entries
    }

    /// One slot per question, unanswered ones as `None`.
    pub fn padded(&self) -> Vec<Option<AnswerRecord>> {
        let mut slots = self.entries.clone();
        slots.resize(self.capacity, None);
        slots
    }

    pub fn answered_count(&self) -> usize {
        self.entries.iter().filter(|slot| slot.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_is_lazy_and_aligned() {
        let mut ledger = AnswerLedger::new(5);
        assert!(ledger.all().is_empty());

        assert!(ledger.record(2, "C", 900));
        assert_eq!(ledger.all().len(), 3);
        assert!(!ledger.is_answered(0));
        assert!(!ledger.is_answered(1));
        assert_eq!(ledger.get(2).unwrap().selected_option_text, "C");
    }

    #[test]
    fn test_out_of_range_is_rejected() {
        let mut ledger = AnswerLedger::new(2);
        assert!(!ledger.record(2, "X", 10));
        assert!(ledger.all().is_empty());
    }

    #[test]
    fn test_overwrite_touches_only_its_slot() {
        let mut ledger = AnswerLedger::new(3);
        ledger.record(0, "A", 100);
        ledger.record(1, "B", 200);
        ledger.record(2, "C", 300);

        let before = ledger.all().to_vec();
        ledger.record(1, "B2", 400);

        assert_eq!(ledger.all()[0], before[0]);
        assert_eq!(ledger.all()[2], before[2]);
        assert_eq!(
            ledger.get(1),
            Some(&AnswerRecord { selected_option_text: "B2".to_string(), time_spent_ms: 400 })
        );
        assert_eq!(ledger.answered_count(), 3);
    }

    #[test]
    fn test_out_of_order_writes() {
        let mut ledger = AnswerLedger::new(3);
        ledger.record(2, "C", 300);
        ledger.record(0, "A", 500);

        assert!(ledger.is_answered(0));
        assert!(!ledger.is_answered(1));
        assert!(ledger.is_answered(2));
    }

    #[test]
    fn test_padded_has_one_slot_per_question() {
        let mut ledger = AnswerLedger::new(4);
        ledger.record(1, "B", 10);

        let padded = ledger.padded();
        assert_eq!(padded.len(), 4);
        assert!(padded[0].is_none() && padded[2].is_none() && padded[3].is_none());
    }
}
