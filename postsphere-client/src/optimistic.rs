/// Where an optimistic change stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionState {
    /// Applied locally, server has not answered yet
    Pending,
    /// Server accepted it
    Committed,
    /// Server rejected it and the snapshot was restored
    Reverted,
}

/// A local change applied ahead of server confirmation.
///
/// `apply` mutates the target right away and keeps a snapshot of the value
/// before the change. The owner must finish with exactly one of
/// [`commit`](Optimistic::commit) or [`revert`](Optimistic::revert).
#[derive(Debug)]
#[must_use = "an optimistic change must be committed or reverted"]
pub struct Optimistic<T: Clone> {
    snapshot: T,
    state: ActionState,
}

impl<T: Clone> Optimistic<T> {
    pub fn apply(target: &mut T, change: impl FnOnce(&mut T)) -> Self {
        let snapshot = target.clone();
        change(target);
        Self {
            snapshot,
            state: ActionState::Pending,
        }
    }

    pub fn state(&self) -> ActionState {
        self.state
    }

    /// Value before the change
    pub fn snapshot(&self) -> &T {
        &self.snapshot
    }

    pub fn commit(mut self) -> ActionState {
        self.state = ActionState::Committed;
        self.state
    }

    pub fn revert(mut self, target: &mut T) -> ActionState {
        *target = self.snapshot.clone();
        self.state = ActionState::Reverted;
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_keeps_change() {
        let mut count = 5;
        let change = Optimistic::apply(&mut count, |c| *c += 1);
        assert_eq!(change.state(), ActionState::Pending);
        assert_eq!(*change.snapshot(), 5);
        assert_eq!(count, 6);

        assert_eq!(change.commit(), ActionState::Committed);
        assert_eq!(count, 6);
    }

    #[test]
    fn test_revert_restores_snapshot() {
        let mut flags = (false, 0);
        let change = Optimistic::apply(&mut flags, |f| {
            f.0 = true;
            f.1 += 1;
        });
        assert_eq!(flags, (true, 1));

        assert_eq!(change.revert(&mut flags), ActionState::Reverted);
        assert_eq!(flags, (false, 0));
    }
}
