//! Send planning: which command goes out next.
//!
//! The planner is a pure function of the session's VMTP flag, the message
//! shape and the outcome of the step just taken. It keeps no state between
//! messages, so a rejected extension command only affects the message being
//! sent.
//!
//! ```text
//! Metadata(0) ─▶ … ─▶ Metadata(n-1) ─┐   (any rejection skips ahead)
//!                                    ▼
//!        ┌──────── BulkRecipients ◀──┤ vmtp && recipients > 1
//!        │ accepted      │ rejected  │
//!        │               ▼           ▼
//!        │            Sender ─▶ Recipient(0) ─▶ … ─▶ Recipient(n-1)
//!        ▼                                                 │
//!     Payload ◀────────────────────────────────────────────┘
//! ```

/// Counts the planner decides on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageShape {
    /// Number of recipients (at least one).
    pub recipients: usize,
    /// Number of metadata entries.
    pub metadata: usize,
}

/// One command of a send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// `METADATA` for the entry at this position in iteration order.
    Metadata(usize),
    /// `VECMAIL` declaring sender and all recipients.
    BulkRecipients,
    /// `MAIL FROM`.
    Sender,
    /// `RCPT TO` for the recipient at this position.
    Recipient(usize),
    /// `DATA` and the message content.
    Payload,
}

/// What to do after a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Next {
    /// Issue this step.
    Issue(Step),
    /// The given step was rejected and the send cannot continue.
    Abort(Step),
    /// The message was accepted.
    Complete,
}

/// How the recipients of a message were declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Path {
    /// A single accepted `VECMAIL`.
    Extended,
    /// `MAIL FROM` followed by one `RCPT TO` per recipient.
    Base,
}

/// Returns the first step of a send.
#[must_use]
pub const fn first_step(supports_extension: bool, shape: MessageShape) -> Step {
    if supports_extension && shape.metadata > 0 {
        Step::Metadata(0)
    } else {
        envelope_step(supports_extension, shape)
    }
}

/// Decides what follows `step`, given whether the server accepted it.
#[must_use]
pub const fn next_step(
    supports_extension: bool,
    shape: MessageShape,
    step: Step,
    accepted: bool,
) -> Next {
    match (step, accepted) {
        (Step::Metadata(i), true) if i + 1 < shape.metadata => Next::Issue(Step::Metadata(i + 1)),
        (Step::Metadata(_), _) => Next::Issue(envelope_step(supports_extension, shape)),
        (Step::BulkRecipients, true) => Next::Issue(Step::Payload),
        (Step::BulkRecipients, false) => Next::Issue(Step::Sender),
        (Step::Sender, true) => Next::Issue(Step::Recipient(0)),
        (Step::Recipient(i), true) if i + 1 < shape.recipients => {
            Next::Issue(Step::Recipient(i + 1))
        }
        (Step::Recipient(_), true) => Next::Issue(Step::Payload),
        (Step::Payload, true) => Next::Complete,
        (Step::Sender | Step::Recipient(_) | Step::Payload, false) => Next::Abort(step),
    }
}

const fn envelope_step(supports_extension: bool, shape: MessageShape) -> Step {
    if supports_extension && shape.recipients > 1 {
        Step::BulkRecipients
    } else {
        Step::Sender
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const fn shape(recipients: usize, metadata: usize) -> MessageShape {
        MessageShape {
            recipients,
            metadata,
        }
    }

    /// Walks the planner with a scripted accept/reject answer per step.
    fn walk(
        supports: bool,
        shape: MessageShape,
        mut accept: impl FnMut(Step) -> bool,
    ) -> (Vec<Step>, Next) {
        let mut steps = Vec::new();
        let mut step = first_step(supports, shape);
        loop {
            steps.push(step);
            match next_step(supports, shape, step, accept(step)) {
                Next::Issue(next) => step = next,
                end => return (steps, end),
            }
        }
    }

    #[test]
    fn bulk_accepted_skips_recipients() {
        let (steps, end) = walk(true, shape(3, 0), |_| true);
        assert_eq!(steps, vec![Step::BulkRecipients, Step::Payload]);
        assert_eq!(end, Next::Complete);
    }

    #[test]
    fn no_extension_uses_base_sequence() {
        let (steps, end) = walk(false, shape(3, 2), |_| true);
        assert_eq!(
            steps,
            vec![
                Step::Sender,
                Step::Recipient(0),
                Step::Recipient(1),
                Step::Recipient(2),
                Step::Payload,
            ]
        );
        assert_eq!(end, Next::Complete);
    }

    #[test]
    fn bulk_rejected_falls_back() {
        let (steps, end) = walk(true, shape(3, 0), |s| s != Step::BulkRecipients);
        assert_eq!(
            steps,
            vec![
                Step::BulkRecipients,
                Step::Sender,
                Step::Recipient(0),
                Step::Recipient(1),
                Step::Recipient(2),
                Step::Payload,
            ]
        );
        assert_eq!(end, Next::Complete);
    }

    #[test]
    fn single_recipient_never_bulk() {
        let (steps, _) = walk(true, shape(1, 0), |_| true);
        assert_eq!(steps, vec![Step::Sender, Step::Recipient(0), Step::Payload]);
    }

    #[test]
    fn first_metadata_rejection_stops_metadata() {
        let (steps, end) = walk(true, shape(3, 2), |s| s != Step::Metadata(0));
        assert_eq!(
            steps,
            vec![Step::Metadata(0), Step::BulkRecipients, Step::Payload]
        );
        assert_eq!(end, Next::Complete);
    }

    #[test]
    fn metadata_rejection_does_not_force_recipient_fallback() {
        let (steps, _) = walk(true, shape(1, 3), |s| s != Step::Metadata(1));
        assert_eq!(
            steps,
            vec![
                Step::Metadata(0),
                Step::Metadata(1),
                Step::Sender,
                Step::Recipient(0),
                Step::Payload,
            ]
        );
    }

    #[test]
    fn rejected_recipient_aborts() {
        let (steps, end) = walk(false, shape(3, 0), |s| s != Step::Recipient(1));
        assert_eq!(
            steps,
            vec![Step::Sender, Step::Recipient(0), Step::Recipient(1)]
        );
        assert_eq!(end, Next::Abort(Step::Recipient(1)));
    }

    #[test]
    fn rejected_sender_aborts() {
        let (steps, end) = walk(true, shape(2, 0), |s| {
            !matches!(s, Step::BulkRecipients | Step::Sender)
        });
        assert_eq!(steps, vec![Step::BulkRecipients, Step::Sender]);
        assert_eq!(end, Next::Abort(Step::Sender));
    }

    #[test]
    fn rejected_payload_aborts() {
        let (_, end) = walk(false, shape(1, 0), |s| s != Step::Payload);
        assert_eq!(end, Next::Abort(Step::Payload));
    }

    fn any_shape() -> impl Strategy<Value = MessageShape> {
        (1usize..8, 0usize..5).prop_map(|(r, m)| shape(r, m))
    }

    proptest! {
        #[test]
        fn without_extension_only_base_steps(shape in any_shape(), rejects in prop::collection::vec(any::<bool>(), 16)) {
            let mut answers = rejects.into_iter().cycle();
            let (steps, _) = walk(false, shape, |_| answers.next().unwrap_or(true));
            prop_assert!(steps
                .iter()
                .all(|s| !matches!(s, Step::Metadata(_) | Step::BulkRecipients)));
        }

        #[test]
        fn payload_issued_once_when_everything_accepted(supports in any::<bool>(), shape in any_shape()) {
            let (steps, end) = walk(supports, shape, |_| true);
            prop_assert_eq!(steps.iter().filter(|s| **s == Step::Payload).count(), 1);
            prop_assert_eq!(end, Next::Complete);
        }

        #[test]
        fn recipients_declared_in_order_after_fallback(shape in any_shape(), metadata_ok in any::<bool>()) {
            let (steps, _) = walk(true, shape, |s| match s {
                Step::BulkRecipients => false,
                Step::Metadata(_) => metadata_ok,
                _ => true,
            });
            let declared: Vec<usize> = steps
                .iter()
                .filter_map(|s| match s {
                    Step::Recipient(i) => Some(*i),
                    _ => None,
                })
                .collect();
            prop_assert_eq!(declared, (0..shape.recipients).collect::<Vec<_>>());
            prop_assert_eq!(steps.iter().filter(|s| **s == Step::Sender).count(), 1);
        }

        #[test]
        fn bulk_only_with_several_recipients(supports in any::<bool>(), shape in any_shape()) {
            let (steps, _) = walk(supports, shape, |_| true);
            let bulk = steps.contains(&Step::BulkRecipients);
            prop_assert_eq!(bulk, supports && shape.recipients > 1);
            if bulk {
                prop_assert!(!steps.iter().any(|s| matches!(s, Step::Recipient(_))));
            }
        }
    }
}
