//! Trivia game engine - core FSM and game logic.
//!
//! This module provides the foundational game implementation including:
//! - Closed phase enum with per-phase input handlers
//! - Session model (player registry + polymorphic rounds)
//! - Cancelable countdown timer with generation-guarded fires
//! - Broadcast envelopes and input event types

pub mod constants;
pub mod description;
pub mod engine;
pub mod messages;
pub mod model;
pub mod round;
pub mod timer;

pub use description::{
    CellDescription, CellKind, ColumnDescription, GameDescription, RoundDescription,
};
pub use engine::{EngineConfig, EngineError, GameEngine, Phase};
pub use messages::{
    AnswerEnvelope, BoardSnapshot, BoardState, Broadcast, Input, InputAction, ModelSnapshot,
    PlayerSnapshot, RoundSnapshot, UpdateEnvelope, UpdatePayload,
};
pub use model::{Player, PlayerRegistry, SessionModel};
pub use round::{BoardRound, EndOfGame, LightState, NotStarted, RenderSnapshot, Round, RoundStyle};
pub use timer::{Timer, TimerEvent, TimerFire};
