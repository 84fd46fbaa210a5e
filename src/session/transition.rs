//! Pure state transition function

use super::{Effect, Event, Notice, SessionContext, SessionState};
use crate::attachment::{self, AttachmentError};
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: SessionState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: SessionState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }
}

/// Reasons an event is refused. A refused event changes nothing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("A reply is still pending, wait for it or cancel before sending again")]
    Busy,
    #[error("Nothing to send")]
    EmptyMessage,
    #[error(transparent)]
    UnsupportedAttachment(#[from] AttachmentError),
    #[error("Discarded result from superseded request (epoch {epoch})")]
    StaleResult { epoch: u64 },
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

impl TransitionError {
    /// Stale results are expected after a reset and are not shown to the user
    pub fn is_user_facing(&self) -> bool {
        !matches!(self, TransitionError::StaleResult { .. })
    }

    pub fn to_notice(&self) -> Notice {
        match self {
            TransitionError::UnsupportedAttachment(err) => {
                let AttachmentError::UnsupportedType { name, .. } = err;
                Notice::AttachmentRejected {
                    name: name.clone(),
                    reason: err.hint().to_string(),
                }
            }
            other => Notice::Rejected {
                reason: other.to_string(),
            },
        }
    }
}

/// Pure transition function
///
/// Given the same inputs it always produces the same outputs and performs
/// no I/O. Ids, timestamps and network calls are left to the runtime.
pub fn transition(
    state: &SessionState,
    context: &SessionContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        // ============================================================
        // Submitting a turn
        // ============================================================
        (SessionState::Sending { .. }, Event::Submit { .. }) => Err(TransitionError::Busy),

        (SessionState::Idle | SessionState::Error { .. }, Event::Submit { text }) => {
            let staged = context.attachment.as_ref();
            if text.trim().is_empty() && staged.is_none() {
                return Err(TransitionError::EmptyMessage);
            }

            let content = match staged {
                Some(file) => format!("{text}{}", file.annotation()),
                None => text,
            };
            let epoch = context.epoch + 1;

            Ok(TransitionResult::new(SessionState::Sending { epoch }).with_effects([
                Effect::append_user_message(content),
                Effect::ClearAttachment,
                Effect::AdvanceEpoch,
                Effect::RequestCompletion { epoch },
            ]))
        }

        // ============================================================
        // Completion results
        // ============================================================
        (SessionState::Sending { epoch: current }, Event::CompletionSucceeded { epoch, reply })
            if *current == epoch =>
        {
            Ok(TransitionResult::new(SessionState::Idle).with_effect(Effect::append_reply(reply)))
        }

        (SessionState::Sending { epoch: current }, Event::CompletionFailed { epoch, error })
            if *current == epoch =>
        {
            Ok(TransitionResult::new(SessionState::Error {
                message: error.message.clone(),
                kind: error.kind,
            })
            .with_effect(Effect::Notify(Notice::CompletionFailed {
                kind: error.kind,
                message: error.message,
            })))
        }

        // Any other result belongs to a request that was reset or cancelled
        (_, Event::CompletionSucceeded { epoch, .. } | Event::CompletionFailed { epoch, .. }) => {
            Err(TransitionError::StaleResult { epoch })
        }

        // ============================================================
        // Attachment slot
        // ============================================================
        // The submitted file already left the slot, so the next one may be
        // staged while the reply is pending
        (_, Event::SelectAttachment { file }) => match attachment::validate(file)? {
            Some(file) => {
                let name = file.name.clone();
                Ok(TransitionResult::new(state.clone()).with_effects([
                    Effect::StageAttachment(file),
                    Effect::Notify(Notice::AttachmentStaged { name }),
                ]))
            }
            // Nothing picked: the slot stays as it was
            None => Ok(TransitionResult::new(state.clone())),
        },

        (_, Event::RemoveAttachment) => {
            Ok(TransitionResult::new(state.clone()).with_effect(Effect::ClearAttachment))
        }

        // ============================================================
        // Reset and cancellation
        // ============================================================
        (_, Event::NewChat) => {
            let abort = state.is_sending().then_some(Effect::AbortCompletion);
            Ok(TransitionResult::new(SessionState::Idle)
                .with_effects(abort)
                .with_effects([
                    Effect::ClearHistory,
                    Effect::ClearAttachment,
                    Effect::AdvanceEpoch,
                ]))
        }

        (SessionState::Sending { .. }, Event::Cancel) => Ok(TransitionResult::new(
            SessionState::Idle,
        )
        .with_effects([Effect::AbortCompletion, Effect::AdvanceEpoch])),

        (_, Event::Cancel) => Err(TransitionError::InvalidTransition(
            "No request in flight to cancel".to_string(),
        )),
    }
}
