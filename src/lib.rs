//! # Trivia Engine
//!
//! A turn-based trivia game session engine built around a closed finite state
//! machine (FSM) and an async actor model.
//!
//! This library is the authoritative core for a live, multi-party trivia
//! competition. It owns game state, arbitrates which participant may act,
//! runs countdown timers that auto-advance the game when nobody responds, and
//! fans out broadcastable state snapshots. Transport, authentication, and
//! rendering are external collaborators: the engine consumes abstract input
//! events and produces abstract broadcast messages.
//!
//! ## Architecture
//!
//! A game session moves through eight distinct phases:
//!
//! - **NotStarted**: waiting for the moderator to start the game
//! - **SelectQuestion**: the active player (or moderator) picks a board cell
//! - **ConfirmRead**: the moderator reads the question aloud
//! - **AwaitJudgment**: the answer timer runs while the picker answers
//! - **AwaitBuzz**: any unspent player may claim the question
//! - **AwaitBuzzJudgment**: the buzzing player's answer is judged
//! - **RoundContinue**: turn rotation before the next pick
//! - **GameOver**: terminal, no further input accepted
//!
//! ## Core Modules
//!
//! - [`game`]: state machine, session model, rounds, timer, and wire messages
//! - [`session`]: per-session actor serializing inputs and timer fires
//!
//! ## Example
//!
//! ```
//! use trivia_engine::{EngineConfig, GameDescription, GameEngine};
//! use tokio::sync::mpsc;
//!
//! let description = GameDescription {
//!     name: "demo".into(),
//!     rounds: vec![],
//! };
//! let (fires, _rx) = mpsc::unbounded_channel();
//! let engine = GameEngine::new(description, EngineConfig::default(), fires);
//! assert!(engine.get_update().is_some());
//! ```

/// Core game logic, session model, and state machine.
pub mod game;
pub use game::{
    Broadcast, EngineConfig, EngineError, GameDescription, GameEngine, Input, InputAction, Phase,
    constants::{self, DEFAULT_ANSWER_SECS, DEFAULT_BUZZ_SECS, MODERATOR},
};

/// Per-session actor wrapping the engine behind a serialized inbox.
pub mod session;
pub use session::{SessionActor, SessionHandle, SessionMessage};
