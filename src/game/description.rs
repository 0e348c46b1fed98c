//! Authored game definitions.
//!
//! A [`GameDescription`] is the static content a session is created from:
//! an ordered list of rounds, each holding the question grid for a board
//! round. Content authoring and persistence live outside this crate; the
//! engine only deserializes and plays what it is given.

use serde::{Deserialize, Serialize};

/// A complete authored game: the rounds to be played in order.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct GameDescription {
    /// Display name of the game.
    #[serde(default)]
    pub name: String,

    /// Rounds in play order. A terminal end-of-game round is appended
    /// automatically when the session model is built.
    pub rounds: Vec<RoundDescription>,
}

impl GameDescription {
    /// Parse a game description from its JSON representation.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

/// A single authored round.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoundDescription {
    /// A board round: a grid of questions organized by category (column)
    /// and value (row).
    Categorical { columns: Vec<ColumnDescription> },
}

/// One category column of a board round.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ColumnDescription {
    /// Category heading shown above the column.
    pub category: String,

    /// Cells from the top row down, typically in ascending value order.
    pub cells: Vec<CellDescription>,
}

/// A single question cell.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct CellDescription {
    pub question: String,
    pub answer: String,

    /// Points awarded for a correct answer. Half of this is deducted for a
    /// wrong buzz.
    pub value: i64,

    /// How the question content should be presented.
    #[serde(default)]
    pub kind: CellKind,
}

/// Presentation kind of a question cell.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CellKind {
    #[default]
    Text,
    Image,
    Audio,
}
