//! Wire-facing message types: input events handed in by the transport and
//! broadcast envelopes fanned out to listeners.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::description::CellKind;
use super::engine::Phase;
use super::round::{LightState, RoundStyle};

/// An input event handed to the engine by the transport layer.
///
/// The transport maps its own connection identities to `actor_id` and is
/// responsible for authenticating which participant is the moderator; the
/// engine trusts the identity it is given.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Input {
    #[serde(flatten)]
    pub action: InputAction,

    #[serde(default, rename = "actorId", skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<String>,
}

impl Input {
    #[must_use]
    pub fn new(action: InputAction, actor: impl Into<String>) -> Self {
        Self {
            action,
            actor_id: Some(actor.into()),
        }
    }

    /// An input with no acting participant, e.g. a synthetic timer expiry.
    #[must_use]
    pub fn system(action: InputAction) -> Self {
        Self {
            action,
            actor_id: None,
        }
    }
}

/// Recognized input actions. Anything else deserializes to [`Unknown`] and
/// is ignored by the engine so untyped clients stay forward compatible.
///
/// [`Unknown`]: InputAction::Unknown
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(tag = "action", content = "data", rename_all = "snake_case")]
pub enum InputAction {
    Start,
    Select { col: usize, row: usize },
    Continue,
    Back,
    Accept,
    Reject,
    Buzz,
    Expire,
    SetScore { name: String, score: i64 },
    NextRound,
    PrevRound,
    RemovePlayer { name: String },
    EnablePlayer { name: String },
    DisablePlayer { name: String },
    #[serde(other)]
    Unknown,
}

/// A message delivered to session listeners.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Broadcast {
    /// The game has started.
    StartGame,

    /// A countdown began.
    StartTimer { data: TimerStart },

    /// One second elapsed on the running countdown.
    UpdateTimer { data: TimerUpdate },

    /// The countdown was abandoned without a judgment.
    StopTimer,

    /// Full session snapshot after a state change.
    UpdateModel(UpdateEnvelope),

    /// Private moderator notification carrying the answer text.
    ProvideAnswer(AnswerEnvelope),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct TimerStart {
    pub time: u32,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerUpdate {
    pub start_time: u32,
    pub current_time: u32,
    pub progress_percent: u32,
}

/// Envelope for an `update_model` broadcast.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEnvelope {
    /// 16 hex chars of randomness identifying this update.
    pub id_hash: String,
    pub timestamp: DateTime<Utc>,
    pub data: UpdatePayload,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UpdatePayload {
    pub model: ModelSnapshot,
    pub state: Phase,

    /// Extra fields merged into the payload for a specific transition.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Envelope for a private `provide_answer` notification.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerEnvelope {
    pub id_hash: String,
    pub timestamp: DateTime<Utc>,
    pub data: AnswerPayload,
}

impl AnswerEnvelope {
    #[must_use]
    pub fn new(answer: impl Into<String>) -> Self {
        Self {
            id_hash: random_id_hash(),
            timestamp: Utc::now(),
            data: AnswerPayload {
                answer: answer.into(),
            },
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct AnswerPayload {
    pub answer: String,
}

/// Deep-copied, serialization-ready rendering of session state.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ModelSnapshot {
    pub players: Vec<PlayerSnapshot>,
    pub round: RoundSnapshot,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSnapshot {
    pub name: String,
    pub score: i64,
    pub enabled: bool,
    pub light_state: LightState,
}

/// Round fragment of a model snapshot.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RoundSnapshot {
    /// Not-started and end-of-game rounds carry only their style tag.
    Marker(RoundMarker),
    Board(BoardSnapshot),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct RoundMarker {
    pub style: RoundStyle,
}

/// Sub-state of a board round within a question cycle.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BoardState {
    Board,
    Question,
    Reveal,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardSnapshot {
    pub style: RoundStyle,
    pub state: BoardState,

    /// Name of the current-turn player, or the empty string when blank.
    pub current_player: String,
    pub categories: Vec<String>,
    pub values: Vec<Vec<i64>>,
    pub spent: Vec<Vec<bool>>,
    pub spent_players: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub col: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row: Option<usize>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<CellKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
}

/// 8 random bytes rendered as 16 hex characters.
#[must_use]
pub fn random_id_hash() -> String {
    format!("{:016x}", rand::random::<u64>())
}
