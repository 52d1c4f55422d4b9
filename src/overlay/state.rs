#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Uninitialized,
    Active,
    Terminated,
}

impl SyncState {
    pub fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }

    pub fn is_terminated(self) -> bool {
        matches!(self, Self::Terminated)
    }
}

pub fn can_transition(from: SyncState, to: SyncState) -> bool {
    matches!(
        (from, to),
        (SyncState::Uninitialized, SyncState::Active)
            | (SyncState::Uninitialized, SyncState::Terminated)
            | (SyncState::Active, SyncState::Active)
            | (SyncState::Active, SyncState::Terminated)
    )
}
