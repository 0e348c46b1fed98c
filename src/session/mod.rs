//! Session module wrapping the engine in an async actor.
//!
//! Each live game session runs in its own tokio task with an mpsc inbox.
//! External inputs from the transport and fires from the countdown timer
//! are funneled into one sequential stream, so exactly one event is in
//! flight per session at any time. Sessions share no mutable state and may
//! run concurrently with each other.

pub mod actor;

pub use actor::{SessionActor, SessionHandle, SessionMessage};
