// src/session/combo.rs

/// Consecutive-correct streak within one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ComboTracker {
    count: u32,
    max: u32,
}

impl ComboTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds the most recently recorded answer into the streak.
    pub fn observe(&mut self, correct: bool) {
        self.count = if correct { self.count + 1 } else { 0 };
        self.max = self.max.max(self.count);
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn max(&self) -> u32 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correct_wrong_correct() {
        let mut combo = ComboTracker::new();

        combo.observe(true);
        assert_eq!((combo.count(), combo.max()), (1, 1));
        combo.observe(false);
        assert_eq!((combo.count(), combo.max()), (0, 1));
        combo.observe(true);
        assert_eq!((combo.count(), combo.max()), (1, 1));
    }

    #[test]
    fn test_max_equals_highest_count_seen() {
        let answers = [true, true, true, false, true, true, false, false, true];
        let mut combo = ComboTracker::new();
        let mut highest = 0;
        let mut previous_max = 0;

        for correct in answers {
            combo.observe(correct);
            highest = highest.max(combo.count());
            assert!(combo.max() >= previous_max);
            previous_max = combo.max();
        }

        assert_eq!(combo.max(), highest);
        assert_eq!(combo.max(), 3);
    }
}
