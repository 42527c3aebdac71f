//! The session FSM (§4.7): `Connecting -> Bound -> Draining -> Closed`.
//!
//! A session that never identifies itself goes straight to `Closed`; one
//! that identifies is `Bound` for the life of the connection, then
//! `Draining` while its registry/presence entries are torn down, then
//! `Closed`.

use chat_common::{traits::fsm::FiniteStateMachine, UserId};

/// Sealed to keep the state structs from being constructed outside a
/// [`SessionState::transition`] call.
mod sealed {
    pub trait Sealed {}
}

pub trait SessionMarker: sealed::Sealed + std::fmt::Debug {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connecting;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bound {
    pub user_id: UserId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draining {
    pub user_id: UserId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Closed;

impl sealed::Sealed for Connecting {}
impl sealed::Sealed for Bound {}
impl sealed::Sealed for Draining {}
impl sealed::Sealed for Closed {}

impl SessionMarker for Connecting {}
impl SessionMarker for Bound {}
impl SessionMarker for Draining {}
impl SessionMarker for Closed {}

/// What drives a transition. The handshake and the transport loop are the
/// only two inputs this chart reacts to; every other inbound event
/// (`send_message`, `message_delivered`) is handled without a state change.
#[derive(Debug, Clone)]
pub enum SessionInput {
    Identified(UserId),
    HandshakeRejected,
    TransportClosed,
    DrainComplete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Connecting(Connecting),
    Bound(Bound),
    Draining(Draining),
    Closed(Closed),
}

impl Default for SessionState {
    fn default() -> Self {
        Self::Connecting(Connecting)
    }
}

impl SessionState {
    #[must_use]
    pub const fn user_id(&self) -> Option<&UserId> {
        match self {
            Self::Bound(Bound { user_id }) | Self::Draining(Draining { user_id }) => Some(user_id),
            Self::Connecting(_) | Self::Closed(_) => None,
        }
    }

    #[must_use]
    pub const fn is_closed(&self) -> bool {
        matches!(self, Self::Closed(_))
    }
}

impl FiniteStateMachine for SessionState {
    type Input = SessionInput;
    type Context = ();

    fn transition(self, input: Self::Input, _context: &mut Self::Context) -> Self {
        match (self, input) {
            (Self::Connecting(_), SessionInput::Identified(user_id)) => Self::Bound(Bound { user_id }),
            (Self::Connecting(_), SessionInput::HandshakeRejected | SessionInput::TransportClosed) => {
                Self::Closed(Closed)
            }
            (Self::Bound(Bound { user_id }), SessionInput::TransportClosed) => {
                Self::Draining(Draining { user_id })
            }
            (Self::Draining(_), SessionInput::DrainComplete) => Self::Closed(Closed),
            (state, _) => state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connecting_to_bound_on_identify() {
        let state = SessionState::default();
        let state = state.transition(SessionInput::Identified(UserId::new("u_alice")), &mut ());
        assert_eq!(state.user_id(), Some(&UserId::new("u_alice")));
        assert!(matches!(state, SessionState::Bound(_)));
    }

    #[test]
    fn connecting_to_closed_on_rejected_handshake() {
        let state = SessionState::default();
        let state = state.transition(SessionInput::HandshakeRejected, &mut ());
        assert!(state.is_closed());
    }

    #[test]
    fn bound_to_draining_to_closed_carries_the_user_id() {
        let state = SessionState::Bound(Bound {
            user_id: UserId::new("u_alice"),
        });
        let state = state.transition(SessionInput::TransportClosed, &mut ());
        assert_eq!(state.user_id(), Some(&UserId::new("u_alice")));
        assert!(matches!(state, SessionState::Draining(_)));

        let state = state.transition(SessionInput::DrainComplete, &mut ());
        assert!(state.is_closed());
    }

    #[test]
    fn unmatched_input_is_a_no_op() {
        let state = SessionState::default();
        let state = state.transition(SessionInput::DrainComplete, &mut ());
        assert!(matches!(state, SessionState::Connecting(_)));
    }
}
