/// A speculative value applied ahead of server confirmation.
///
/// Holds the value it replaced; `rollback` puts it back, `commit` drops it.
#[derive(Debug)]
#[must_use = "an optimistic update must be committed or rolled back"]
pub struct Optimistic<T> {
    snapshot: T,
}

impl<T> Optimistic<T> {
    /// Swaps `speculative` into `slot` and remembers the previous value.
    pub fn apply(slot: &mut T, speculative: T) -> Self {
        let snapshot = std::mem::replace(slot, speculative);
        Self { snapshot }
    }

    pub fn snapshot(&self) -> &T {
        &self.snapshot
    }

    pub fn rollback(self, slot: &mut T) {
        *slot = self.snapshot;
    }

    /// Keeps the speculative value and returns the replaced one.
    pub fn commit(self) -> T {
        self.snapshot
    }
}

impl<T: Clone> Optimistic<T> {
    /// Clones `slot`, lets `f` edit it in place and remembers the original.
    pub fn modify<F: FnOnce(&mut T)>(slot: &mut T, f: F) -> Self {
        let snapshot = slot.clone();
        f(slot);
        Self { snapshot }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn rollback_restores_snapshot() {
        let mut ids = vec![1, 2, 3];
        let pending = Optimistic::apply(&mut ids, vec![3, 1, 2]);
        assert_eq!(ids, vec![3, 1, 2]);
        pending.rollback(&mut ids);
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn commit_keeps_speculative_value() {
        let mut done = false;
        let pending = Optimistic::modify(&mut done, |d| *d = !*d);
        assert!(done);
        assert!(!pending.commit());
        assert!(done);
    }
}
