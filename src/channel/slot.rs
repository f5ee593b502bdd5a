use super::Outcome;

/// In-memory, write-once outcome cell.
///
/// The first [`fill`](Slot::fill) wins; later writes are rejected so a consumer can read
/// the same outcome any number of times.
#[derive(Debug, Clone)]
pub struct Slot<T> {
    value: Option<Outcome<T>>,
}

impl<T> Slot<T> {
    /// An unfilled slot.
    pub fn empty() -> Self {
        Self { value: None }
    }

    /// A slot that already holds `outcome`.
    pub fn filled(outcome: Outcome<T>) -> Self {
        Self {
            value: Some(outcome),
        }
    }

    /// Stores `outcome` unless the slot is already filled. Returns whether it was stored.
    pub fn fill(&mut self, outcome: Outcome<T>) -> bool {
        if self.value.is_some() {
            return false;
        }
        self.value = Some(outcome);
        true
    }

    /// The stored outcome, if any.
    pub fn get(&self) -> Option<&Outcome<T>> {
        self.value.as_ref()
    }
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TaskError;

    #[test]
    fn test_first_write_wins() {
        let mut slot = Slot::empty();
        assert_eq!(slot.get(), None);
        assert!(slot.fill(Outcome::Success(1)));
        assert!(!slot.fill(Outcome::Failure(TaskError::fail("late"))));
        assert_eq!(slot.get(), Some(&Outcome::Success(1)));
    }

    #[test]
    fn test_reads_are_repeatable() {
        let slot = Slot::filled(Outcome::<u8>::Failure(TaskError::Canceled));
        assert_eq!(slot.get(), slot.get());
    }
}
