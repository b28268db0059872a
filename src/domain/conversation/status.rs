//! Conversation status lifecycle.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::StateMachine;

/// The lifecycle status of a conversation.
///
/// A conversation starts `Active` and leaves it at most once; every other
/// status is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConversationStatus {
    /// Still collecting information.
    #[default]
    Active,

    /// Every field was collected.
    Completed,

    /// Handed off to a human.
    Escalated,

    /// Turn processing failed and the conversation was abandoned.
    Failed,
}

impl ConversationStatus {
    /// Returns true if the conversation accepts new user turns.
    pub fn accepts_turns(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// Returns the wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Escalated => "escalated",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for ConversationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl StateMachine for ConversationStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use ConversationStatus::*;
        matches!(
            (self, target),
            (Active, Completed) | (Active, Escalated) | (Active, Failed)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use ConversationStatus::*;
        match self {
            Active => vec![Completed, Escalated, Failed],
            Completed | Escalated | Failed => vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [ConversationStatus; 4] = [
        ConversationStatus::Active,
        ConversationStatus::Completed,
        ConversationStatus::Escalated,
        ConversationStatus::Failed,
    ];

    #[test]
    fn default_status_is_active() {
        assert_eq!(ConversationStatus::default(), ConversationStatus::Active);
    }

    #[test]
    fn serializes_to_snake_case() {
        let json = serde_json::to_string(&ConversationStatus::Escalated).unwrap();
        assert_eq!(json, "\"escalated\"");
    }

    #[test]
    fn only_active_accepts_turns() {
        for status in ALL {
            assert_eq!(status.accepts_turns(), status == ConversationStatus::Active);
        }
    }

    #[test]
    fn terminal_statuses_cannot_return_to_active() {
        for status in ALL.into_iter().filter(|s| *s != ConversationStatus::Active) {
            assert!(status.is_terminal());
            assert!(status.transition_to(ConversationStatus::Active).is_err());
        }
    }

    #[test]
    fn active_can_reach_every_terminal_status() {
        let active = ConversationStatus::Active;
        assert!(active.can_transition_to(&ConversationStatus::Completed));
        assert!(active.can_transition_to(&ConversationStatus::Escalated));
        assert!(active.can_transition_to(&ConversationStatus::Failed));
        assert!(!active.can_transition_to(&ConversationStatus::Active));
    }

    #[test]
    fn valid_transitions_matches_can_transition_to() {
        for status in ALL {
            for target in status.valid_transitions() {
                assert!(
                    status.can_transition_to(&target),
                    "can_transition_to should return true for {:?} -> {:?}",
                    status,
                    target
                );
            }
        }
    }
}
