//! Chat-platform collaborator boundary.
//!
//! The engine never talks to a chat platform directly; everything it needs
//! (notification delivery, membership lookup, history paging) goes through
//! the [`ChatPlatform`] trait implemented by a platform-specific client.

pub mod error;
pub mod platform;

pub use error::ChatError;
pub use platform::ChatPlatform;
pub use platform::HistoryMessage;
