//! Connection lifecycle state machine

use crate::{Error, Result};

/// Connection lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No session was ever established (initial state, or the dial failed)
    Uninitialized,

    /// Dial succeeded, session handle is usable
    Live,

    /// Session released
    Closed,
}

impl ConnectionState {
    /// Check if transition is valid
    pub fn can_transition_to(&self, next: ConnectionState) -> bool {
        use ConnectionState::*;

        // Closing is permitted from every state, including Closed, so a
        // repeated close stays a no-op instead of an error.
        matches!((self, next), (Uninitialized, Live) | (_, Closed))
    }

    /// Transition to new state
    pub fn transition(&mut self, next: ConnectionState) -> Result<()> {
        if !self.can_transition_to(next) {
            return Err(Error::InvalidState {
                expected: format!("valid transition from {:?}", self),
                actual: format!("{:?}", next),
            });
        }
        *self = next;
        Ok(())
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "uninitialized"),
            Self::Live => write!(f, "live"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dial_transition() {
        let mut state = ConnectionState::Uninitialized;
        assert!(state.transition(ConnectionState::Live).is_ok());
        assert_eq!(state, ConnectionState::Live);
    }

    #[test]
    fn test_close_from_any_state() {
        for start in [
            ConnectionState::Uninitialized,
            ConnectionState::Live,
            ConnectionState::Closed,
        ] {
            let mut state = start;
            assert!(state.transition(ConnectionState::Closed).is_ok());
        }
    }

    #[test]
    fn test_closed_cannot_revive() {
        let mut state = ConnectionState::Closed;
        assert!(state.transition(ConnectionState::Live).is_err());
    }

    #[test]
    fn test_live_cannot_go_back() {
        let mut state = ConnectionState::Live;
        assert!(state.transition(ConnectionState::Uninitialized).is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(ConnectionState::Uninitialized.to_string(), "uninitialized");
        assert_eq!(ConnectionState::Live.to_string(), "live");
        assert_eq!(ConnectionState::Closed.to_string(), "closed");
    }
}
