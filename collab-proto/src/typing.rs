//! Typing-state transitions emitted by the composer.

use crate::frame::ControlFrame;
use crate::models::UserId;

/// A typing-state transition for the selected partner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypingSignal {
    /// The user began typing.
    Start,
    /// The user stopped typing (idle timeout or send).
    Stop,
}

impl TypingSignal {
    /// Builds the control frame announcing this transition.
    #[must_use]
    pub const fn to_frame(self, sender_id: UserId, receiver_id: UserId) -> ControlFrame {
        match self {
            Self::Start => ControlFrame::TypingStart {
                sender_id,
                receiver_id,
            },
            Self::Stop => ControlFrame::TypingStop {
                sender_id,
                receiver_id,
            },
        }
    }
}
