//! Streaming relay bridge.
//!
//! Turns the callback-driven event flow of a [`ChatSession`](crate::session::ChatSession)
//! into an ordered [`FrameStream`] that an HTTP handler can write out as
//! Server-Sent Events.

mod bridge;
mod classifier;
mod frame;

pub use bridge::{FrameStream, start};
pub use classifier::{Classification, EventClassifier, StandardClassifier};
pub use frame::Frame;
