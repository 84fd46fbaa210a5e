//! Property-based tests for the session state machine
//!
//! A small model applies effects the way the runtime does, so invariants on
//! history and the attachment slot can be checked over random event
//! sequences.

use super::transition::*;
use super::*;
use crate::attachment::Attachment;
use crate::llm::{LlmError, Reply, Role};
use proptest::prelude::*;

// ============================================================================
// Model
// ============================================================================

#[derive(Debug, Clone, Default)]
struct Model {
    state: SessionState,
    context: SessionContext,
    history: Vec<(Role, String)>,
}

impl Model {
    /// Apply an event, returning whether it was accepted
    fn apply(&mut self, event: Event) -> bool {
        let Ok(result) = transition(&self.state, &self.context, event) else {
            return false;
        };
        self.state = result.new_state;
        for effect in result.effects {
            match effect {
                Effect::AppendMessage { role, content, .. } => self.history.push((role, content)),
                Effect::ClearHistory => self.history.clear(),
                Effect::StageAttachment(file) => self.context.attachment = Some(file),
                Effect::ClearAttachment => self.context.attachment = None,
                Effect::AdvanceEpoch => self.context.epoch += 1,
                Effect::RequestCompletion { .. } | Effect::AbortCompletion | Effect::Notify(_) => {}
            }
        }
        true
    }

    fn in_flight_epoch(&self) -> Option<u64> {
        match self.state {
            SessionState::Sending { epoch } => Some(epoch),
            _ => None,
        }
    }
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_attachment() -> impl Strategy<Value = Attachment> {
    (
        "[a-z]{1,8}\\.(pdf|txt|png|docx)",
        prop_oneof![
            Just("application/pdf".to_string()),
            Just("text/plain".to_string()),
            Just("image/png".to_string()),
            Just("application/msword".to_string()),
        ],
        0u64..10_000,
    )
        .prop_map(|(name, mime, size)| Attachment::new(name, mime, size))
}

/// Operations a user or the network can perform
#[derive(Debug, Clone)]
enum Op {
    Submit(String),
    Select(Option<Attachment>),
    Remove,
    NewChat,
    Cancel,
    Succeed,
    Fail,
    /// A result tagged with an epoch that is not in flight
    Stale(bool),
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => prop_oneof![Just(String::new()), Just("  ".to_string()), "[a-zA-Z ]{1,20}"]
            .prop_map(Op::Submit),
        2 => proptest::option::of(arb_attachment()).prop_map(Op::Select),
        1 => Just(Op::Remove),
        1 => Just(Op::NewChat),
        1 => Just(Op::Cancel),
        2 => Just(Op::Succeed),
        1 => Just(Op::Fail),
        1 => any::<bool>().prop_map(Op::Stale),
    ]
}

fn to_event(model: &Model, op: Op) -> Option<Event> {
    Some(match op {
        Op::Submit(text) => Event::submit(text),
        Op::Select(file) => Event::SelectAttachment { file },
        Op::Remove => Event::RemoveAttachment,
        Op::NewChat => Event::NewChat,
        Op::Cancel => Event::Cancel,
        Op::Succeed => Event::CompletionSucceeded {
            epoch: model.in_flight_epoch()?,
            reply: Reply::new("reply", vec![]),
        },
        Op::Fail => Event::CompletionFailed {
            epoch: model.in_flight_epoch()?,
            error: LlmError::network("down"),
        },
        Op::Stale(success) => {
            // Every epoch at or below the current one, other than the one in flight, is stale
            let epoch = model.context.epoch.saturating_sub(1);
            if Some(epoch) == model.in_flight_epoch() {
                return None;
            }
            if success {
                Event::CompletionSucceeded {
                    epoch,
                    reply: Reply::new("stale", vec![]),
                }
            } else {
                Event::CompletionFailed {
                    epoch,
                    error: LlmError::network("stale"),
                }
            }
        }
    })
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Outside of a reset, history only ever grows and earlier entries never change
    #[test]
    fn prop_history_append_only(ops in proptest::collection::vec(arb_op(), 0..40)) {
        let mut model = Model::default();
        for op in ops {
            let is_reset = matches!(op, Op::NewChat);
            let Some(event) = to_event(&model, op) else { continue };
            let before = model.history.clone();
            model.apply(event);
            if !is_reset {
                prop_assert!(model.history.len() >= before.len());
                prop_assert_eq!(&model.history[..before.len()], &before[..]);
            }
        }
    }

    /// Length is 2 per successful round trip plus 1 per failed one
    #[test]
    fn prop_history_length_counts(ops in proptest::collection::vec(arb_op(), 0..40)) {
        let mut model = Model::default();
        let (mut succeeded, mut failed, mut pending) = (0usize, 0usize, 0usize);
        for op in ops {
            let kind = op.clone();
            let Some(event) = to_event(&model, op) else { continue };
            let accepted = model.apply(event);
            match kind {
                Op::NewChat => { succeeded = 0; failed = 0; pending = 0; }
                Op::Submit(_) if accepted => pending += 1,
                Op::Succeed if accepted => { pending -= 1; succeeded += 1; }
                Op::Fail if accepted => { pending -= 1; failed += 1; }
                // A cancelled request keeps its user turn, like a failure
                Op::Cancel if accepted => { pending -= 1; failed += 1; }
                _ => {}
            }
            prop_assert_eq!(model.history.len(), 2 * succeeded + failed + pending);
        }
    }

    /// At most one request in flight: submit is refused while sending
    #[test]
    fn prop_no_concurrent_sends(ops in proptest::collection::vec(arb_op(), 0..40)) {
        let mut model = Model::default();
        for op in ops {
            let Some(event) = to_event(&model, op) else { continue };
            if model.state.is_sending() && matches!(event, Event::Submit { .. }) {
                let result = transition(&model.state, &model.context, event);
                prop_assert_eq!(result.unwrap_err(), TransitionError::Busy);
            } else {
                model.apply(event);
            }
        }
    }

    /// A rejected attachment never enters the slot
    #[test]
    fn prop_rejected_attachment_never_staged(
        ops in proptest::collection::vec(arb_op(), 0..20),
        candidate in arb_attachment(),
    ) {
        let mut model = Model::default();
        for op in ops {
            if let Some(event) = to_event(&model, op) {
                model.apply(event);
            }
        }
        let before = model.context.attachment.clone();
        let accepted = model.apply(Event::select_attachment(candidate.clone()));
        if accepted {
            prop_assert!(crate::attachment::validate(Some(candidate.clone())).is_ok());
            prop_assert_eq!(model.context.attachment, Some(candidate));
        } else {
            prop_assert_eq!(model.context.attachment, before);
        }
    }

    /// New chat always lands in the empty idle session
    #[test]
    fn prop_new_chat_resets(ops in proptest::collection::vec(arb_op(), 0..40)) {
        let mut model = Model::default();
        for op in ops {
            if let Some(event) = to_event(&model, op) {
                model.apply(event);
            }
        }
        prop_assert!(model.apply(Event::NewChat));
        prop_assert_eq!(&model.state, &SessionState::Idle);
        prop_assert!(model.history.is_empty());
        prop_assert!(model.context.attachment.is_none());
    }

    /// Results of requests issued before a reset never change the session
    #[test]
    fn prop_stale_results_ignored(
        before in proptest::collection::vec(arb_op(), 0..20),
        after in proptest::collection::vec(arb_op(), 0..20),
        success in any::<bool>(),
    ) {
        let mut model = Model::default();
        for op in before {
            if let Some(event) = to_event(&model, op) {
                model.apply(event);
            }
        }
        let pre_reset_epochs = 0..=model.context.epoch;
        model.apply(Event::NewChat);
        for op in after {
            if let Some(event) = to_event(&model, op) {
                model.apply(event);
            }
        }

        for epoch in pre_reset_epochs {
            let snapshot = (model.state.clone(), model.history.clone());
            let event = if success {
                Event::CompletionSucceeded { epoch, reply: Reply::new("late", vec![]) }
            } else {
                Event::CompletionFailed { epoch, error: LlmError::network("late") }
            };
            prop_assert!(!model.apply(event));
            prop_assert_eq!((model.state.clone(), model.history.clone()), snapshot);
        }
    }
}
