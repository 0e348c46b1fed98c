//! Polymorphic round model.
//!
//! Rounds are a closed enum dispatching a shared snapshot capability via
//! `enum_dispatch`. Board-specific operations (spent cells, buzz
//! arbitration) are plain methods on [`BoardRound`], reached through a
//! pattern match on [`Round`].

use enum_dispatch::enum_dispatch;
use serde::Serialize;

use super::description::ColumnDescription;
use super::engine::EngineError;
use super::messages::{BoardSnapshot, BoardState, RoundMarker, RoundSnapshot};
use super::model::PlayerRegistry;

/// Wire tag identifying the round format.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum RoundStyle {
    #[serde(rename = "ns")]
    NotStarted,
    #[serde(rename = "j")]
    Board,
    #[serde(rename = "end")]
    EndOfGame,
}

/// Derived display state of a player card in a snapshot.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LightState {
    Normal,
    Highlight,
    Dim,
}

/// Shared capability of every round variant: describe itself and render
/// its snapshot fragment.
#[enum_dispatch]
pub trait RenderSnapshot {
    fn style(&self) -> RoundStyle;
    fn render(&self, registry: &PlayerRegistry) -> RoundSnapshot;
    fn light_state(&self, name: &str) -> LightState;
}

/// Placeholder round before the game starts.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct NotStarted;

impl RenderSnapshot for NotStarted {
    fn style(&self) -> RoundStyle {
        RoundStyle::NotStarted
    }

    fn render(&self, _registry: &PlayerRegistry) -> RoundSnapshot {
        RoundSnapshot::Marker(RoundMarker {
            style: RoundStyle::NotStarted,
        })
    }

    fn light_state(&self, _name: &str) -> LightState {
        LightState::Normal
    }
}

/// Terminal round. Accepts no further mutation.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct EndOfGame;

impl RenderSnapshot for EndOfGame {
    fn style(&self) -> RoundStyle {
        RoundStyle::EndOfGame
    }

    fn render(&self, _registry: &PlayerRegistry) -> RoundSnapshot {
        RoundSnapshot::Marker(RoundMarker {
            style: RoundStyle::EndOfGame,
        })
    }

    fn light_state(&self, _name: &str) -> LightState {
        LightState::Normal
    }
}

/// The active round variant.
#[enum_dispatch(RenderSnapshot)]
#[derive(Debug)]
pub enum Round {
    NotStarted(NotStarted),
    Board(BoardRound),
    EndOfGame(EndOfGame),
}

/// Display sub-state of a board round within one question cycle.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum BoardDisplay {
    Board,
    Question { col: usize, row: usize },
    Reveal { col: usize, row: usize },
}

/// A grid of question cells organized by category (column) and value (row),
/// plus the buzz-arbitration state for the selected question.
#[derive(Debug)]
pub struct BoardRound {
    columns: Vec<ColumnDescription>,

    /// Parallel spent matrix. Monotonic: once a cell is true it never
    /// resets within the round.
    spent: Vec<Vec<bool>>,

    /// Players who have used their attempt on the selected question.
    spent_players: Vec<String>,

    /// Current-turn player, blank between removal and the next rotation.
    current_player: Option<String>,

    display: BoardDisplay,
}

impl BoardRound {
    #[must_use]
    pub fn new(columns: Vec<ColumnDescription>) -> Self {
        let spent = columns
            .iter()
            .map(|column| vec![false; column.cells.len()])
            .collect();
        Self {
            columns,
            spent,
            spent_players: Vec::new(),
            current_player: None,
            display: BoardDisplay::Board,
        }
    }

    /// Validate a grid coordinate. Out-of-range indices are a programming
    /// contract violation, not a business rejection.
    fn check_bounds(&self, col: usize, row: usize) -> Result<(), EngineError> {
        if col >= self.columns.len() || row >= self.columns[col].cells.len() {
            return Err(EngineError::CellOutOfBounds { col, row });
        }
        Ok(())
    }

    pub fn is_spent(&self, col: usize, row: usize) -> Result<bool, EngineError> {
        self.check_bounds(col, row)?;
        Ok(self.spent[col][row])
    }

    /// The selected cell, if the round is showing a question or a reveal.
    #[must_use]
    pub fn selected(&self) -> Option<(usize, usize)> {
        match self.display {
            BoardDisplay::Board => None,
            BoardDisplay::Question { col, row } | BoardDisplay::Reveal { col, row } => {
                Some((col, row))
            }
        }
    }

    /// Return to board display: front of the registry becomes current and
    /// per-question spent players are cleared. Spent cells persist.
    pub fn set_board_state(&mut self, registry: &PlayerRegistry) {
        self.current_player = registry.active().map(|p| p.name.clone());
        self.spent_players.clear();
        self.display = BoardDisplay::Board;
    }

    /// Enter question display for a cell. The front of the registry becomes
    /// the current (picking) player.
    pub fn set_question_state(
        &mut self,
        col: usize,
        row: usize,
        registry: &PlayerRegistry,
    ) -> Result<(), EngineError> {
        self.check_bounds(col, row)?;
        self.current_player = registry.active().map(|p| p.name.clone());
        self.spent_players.clear();
        self.display = BoardDisplay::Question { col, row };
        Ok(())
    }

    /// Reveal the answer for the selected cell, permanently spending it.
    /// No-op when no cell is selected.
    pub fn set_reveal_state(&mut self, registry: &PlayerRegistry) {
        let Some((col, row)) = self.selected() else {
            return;
        };
        self.spent[col][row] = true;
        self.current_player = registry.active().map(|p| p.name.clone());
        self.spent_players.clear();
        self.display = BoardDisplay::Reveal { col, row };
    }

    /// Mark the current player as having used their attempt on the selected
    /// question. No-op outside question display or without a current player.
    pub fn set_player_spent(&mut self) {
        if !matches!(self.display, BoardDisplay::Question { .. }) {
            return;
        }
        let Some(name) = self.current_player.clone() else {
            return;
        };
        if !self.is_player_spent(&name) {
            self.spent_players.push(name);
        }
    }

    #[must_use]
    pub fn is_player_spent(&self, name: &str) -> bool {
        self.spent_players.iter().any(|spent| spent == name)
    }

    #[must_use]
    pub fn current_player(&self) -> Option<&str> {
        self.current_player.as_deref()
    }

    /// Make a registered player current, e.g. after winning the buzz.
    pub fn set_current_player(&mut self, name: &str, registry: &PlayerRegistry) -> bool {
        if !registry.contains(name) {
            return false;
        }
        self.current_player = Some(name.to_string());
        true
    }

    pub fn clear_current_player(&mut self) {
        self.current_player = None;
    }

    /// True when the named player is registered and still unspent for the
    /// selected question.
    #[must_use]
    pub fn can_buzz(&self, name: &str, registry: &PlayerRegistry) -> bool {
        registry.contains(name) && !self.is_player_spent(name)
    }

    /// Enabled players who have not used their attempt on the selected
    /// question.
    #[must_use]
    pub fn count_unspent_players(&self, registry: &PlayerRegistry) -> usize {
        registry
            .iter()
            .filter(|player| player.enabled && !self.is_player_spent(&player.name))
            .count()
    }

    /// Patch the current-player pointer after a registry removal. An unspent
    /// current player hands the turn to the next enabled player; a spent one
    /// leaves the turn blank until the next rotation.
    pub fn remove_player(&mut self, name: &str, registry: &PlayerRegistry) {
        if self.current_player.as_deref() != Some(name) {
            return;
        }
        if self.is_player_spent(name) {
            self.current_player = None;
        } else {
            self.current_player = registry.first_enabled().map(|p| p.name.clone());
        }
    }

    /// Answer text of the selected cell.
    #[must_use]
    pub fn answer(&self) -> Option<&str> {
        let (col, row) = self.selected()?;
        Some(self.columns[col].cells[row].answer.as_str())
    }

    /// Point value of the selected cell.
    #[must_use]
    pub fn value(&self) -> Option<i64> {
        let (col, row) = self.selected()?;
        Some(self.columns[col].cells[row].value)
    }
}

impl RenderSnapshot for BoardRound {
    fn style(&self) -> RoundStyle {
        RoundStyle::Board
    }

    fn render(&self, _registry: &PlayerRegistry) -> RoundSnapshot {
        let selected = self.selected();
        let cell = selected.map(|(col, row)| &self.columns[col].cells[row]);
        let state = match self.display {
            BoardDisplay::Board => BoardState::Board,
            BoardDisplay::Question { .. } => BoardState::Question,
            BoardDisplay::Reveal { .. } => BoardState::Reveal,
        };

        RoundSnapshot::Board(BoardSnapshot {
            style: RoundStyle::Board,
            state,
            current_player: self.current_player.clone().unwrap_or_default(),
            categories: self
                .columns
                .iter()
                .map(|column| column.category.clone())
                .collect(),
            values: self
                .columns
                .iter()
                .map(|column| column.cells.iter().map(|cell| cell.value).collect())
                .collect(),
            spent: self.spent.clone(),
            spent_players: self.spent_players.clone(),
            col: selected.map(|(col, _)| col),
            row: selected.map(|(_, row)| row),
            kind: cell.map(|cell| cell.kind),
            question: cell.map(|cell| cell.question.clone()),
            answer: match self.display {
                BoardDisplay::Reveal { .. } => cell.map(|cell| cell.answer.clone()),
                _ => None,
            },
        })
    }

    fn light_state(&self, name: &str) -> LightState {
        if self.current_player.as_deref() == Some(name) {
            LightState::Highlight
        } else if self.is_player_spent(name) {
            LightState::Dim
        } else {
            LightState::Normal
        }
    }
}
