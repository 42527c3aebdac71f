//! A finite state machine transitions by value: `self` is consumed and a
//! (possibly different) state is returned, with any side-effect-free context
//! mutation happening through `context`. Keeping transitions pure is what
//! lets the session gateway's state chart be tested without a socket.

pub trait FiniteStateMachine: Sized {
    type Input;
    type Context;

    #[must_use]
    fn transition(self, input: Self::Input, context: &mut Self::Context) -> Self;
}
