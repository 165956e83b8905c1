use crate::db_types::Assignment;

/// Fired once per session, when its pixel assignment is first recorded. Replays of the same notification do not
/// fire it again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelAssignedEvent {
    pub assignment: Assignment,
}

impl PixelAssignedEvent {
    pub fn new(assignment: Assignment) -> Self {
        Self { assignment }
    }
}
