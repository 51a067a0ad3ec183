//! Template lifecycle state.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a workflow template.
///
/// `Draft → Active` requires the full declared part count; `Active → Draft` is
/// always allowed; `Deleted` is terminal and cascades to every owned part and
/// assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateState {
    /// Being assembled or withdrawn; any part count.
    Draft,
    /// Released for use; owns exactly its declared parts.
    Active,
    /// Removed together with everything it owned.
    Deleted,
}

impl TemplateState {
    /// Returns `true` if no further transition is possible.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Deleted)
    }

    /// Returns `true` if the state machine has an edge from `self` to `to`.
    ///
    /// Staying in the same live state is allowed (a patch that leaves
    /// `isActive` unchanged). The part-count precondition for activation is
    /// checked separately by [`validate_activation`](crate::validate::validate_activation).
    #[must_use]
    pub fn can_transition_to(&self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::Draft, Self::Draft)
                | (Self::Draft, Self::Active)
                | (Self::Draft, Self::Deleted)
                | (Self::Active, Self::Active)
                | (Self::Active, Self::Draft)
                | (Self::Active, Self::Deleted)
        )
    }
}

impl std::fmt::Display for TemplateState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Draft => write!(f, "draft"),
            Self::Active => write!(f, "active"),
            Self::Deleted => write!(f, "deleted"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_deleted_is_terminal() {
        assert!(TemplateState::Deleted.is_terminal());
        assert!(!TemplateState::Draft.is_terminal());
        assert!(!TemplateState::Active.is_terminal());
    }

    #[test]
    fn valid_transitions() {
        assert!(TemplateState::Draft.can_transition_to(TemplateState::Active));
        assert!(TemplateState::Active.can_transition_to(TemplateState::Draft));
        assert!(TemplateState::Draft.can_transition_to(TemplateState::Deleted));
        assert!(TemplateState::Active.can_transition_to(TemplateState::Deleted));
    }

    #[test]
    fn deleted_has_no_outgoing_edges() {
        assert!(!TemplateState::Deleted.can_transition_to(TemplateState::Draft));
        assert!(!TemplateState::Deleted.can_transition_to(TemplateState::Active));
        assert!(!TemplateState::Deleted.can_transition_to(TemplateState::Deleted));
    }

    #[test]
    fn display_is_lowercase() {
        assert_eq!(TemplateState::Draft.to_string(), "draft");
        assert_eq!(TemplateState::Active.to_string(), "active");
        assert_eq!(TemplateState::Deleted.to_string(), "deleted");
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&TemplateState::Active).unwrap();
        assert_eq!(json, "\"active\"");
    }
}
