//! Conversation session state machine
//!
//! Pure transitions in the Elm style: `transition(state, context, event)`
//! yields the next state plus the effects the runtime must carry out.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::{Effect, Notice};
pub use event::Event;
pub use state::{Message, SessionContext, SessionSnapshot, SessionState};
pub use transition::{transition, TransitionError, TransitionResult};
