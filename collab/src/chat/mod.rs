//! Chat layer: realtime socket, message list, roster, composer debounce and
//! the view state that ties them together.

pub mod channel;
pub mod composer;
pub mod roster;
pub mod store;
pub mod view;

pub use channel::{ChannelError, ChannelEvent, ChatChannel};
pub use composer::TypingDebounce;
pub use store::{Author, ChatLine, DELETED_PLACEHOLDER, MessageList};
pub use view::{ChatView, FrameEffect};
