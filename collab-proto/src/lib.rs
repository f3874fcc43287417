//! Shared protocol definitions for the collab chat wire format.

pub mod codec;
pub mod frame;
pub mod models;
pub mod presence;
pub mod typing;
