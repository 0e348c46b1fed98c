//! Session model: the player registry and round selection.

use serde::{Deserialize, Serialize};

use super::description::{GameDescription, RoundDescription};
use super::messages::{ModelSnapshot, PlayerSnapshot};
use super::round::{BoardRound, EndOfGame, NotStarted, RenderSnapshot, Round};

/// A participant in the session.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Player {
    /// Unique within the session.
    pub name: String,

    /// May go negative from buzz penalties.
    pub score: i64,

    /// Disabled players are skipped by rotation and cannot win the buzz.
    pub enabled: bool,
}

impl Player {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            score: 0,
            enabled: true,
        }
    }
}

/// Ordered, rotating collection of players.
///
/// The front of the sequence is always the active (current-turn) player;
/// rotation is circular and skips disabled players.
#[derive(Debug, Default)]
pub struct PlayerRegistry {
    players: std::collections::VecDeque<Player>,
}

impl PlayerRegistry {
    /// Add a player with zero score. Idempotent: an existing player with the
    /// same name is returned unchanged.
    pub fn add(&mut self, name: &str) -> &Player {
        if let Some(index) = self.players.iter().position(|p| p.name == name) {
            return &self.players[index];
        }
        self.players.push_back(Player::new(name));
        &self.players[self.players.len() - 1]
    }

    /// Remove and return the named player.
    pub fn remove(&mut self, name: &str) -> Option<Player> {
        let index = self.players.iter().position(|p| p.name == name)?;
        self.players.remove(index)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.name == name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// The current-turn player, i.e. the front of the sequence.
    #[must_use]
    pub fn active(&self) -> Option<&Player> {
        self.players.front()
    }

    /// The first enabled player counting from the front.
    #[must_use]
    pub fn first_enabled(&self) -> Option<&Player> {
        self.players.iter().find(|p| p.enabled)
    }

    /// Move the front player to the back until an enabled player is at the
    /// front. Always advances at least one position. No-op when the registry
    /// is empty or no player is enabled.
    pub fn rotate_active(&mut self) {
        if !self.players.iter().any(|p| p.enabled) {
            return;
        }
        loop {
            self.players.rotate_left(1);
            if self.players.front().is_some_and(|p| p.enabled) {
                break;
            }
        }
    }

    /// Enable or disable a player. Returns false when no such player exists.
    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> bool {
        match self.get_mut(name) {
            Some(player) => {
                player.enabled = enabled;
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn is_enabled(&self, name: &str) -> bool {
        self.get(name).is_some_and(|p| p.enabled)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.players.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.players.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    #[must_use]
    pub fn enabled_count(&self) -> usize {
        self.players.iter().filter(|p| p.enabled).count()
    }
}

/// Aggregates the player registry with the round sequence and the round
/// pointer. `round_index == None` means the game has not started.
#[derive(Debug)]
pub struct SessionModel {
    registry: PlayerRegistry,
    rounds: Vec<Round>,
    round_index: Option<usize>,
}

impl SessionModel {
    /// Build the session model from an authored game. A terminal end-of-game
    /// round is appended after the authored rounds.
    #[must_use]
    pub fn new(description: GameDescription) -> Self {
        let mut rounds: Vec<Round> = description
            .rounds
            .into_iter()
            .map(|round| match round {
                RoundDescription::Categorical { columns } => {
                    Round::Board(BoardRound::new(columns))
                }
            })
            .collect();
        rounds.push(Round::EndOfGame(EndOfGame));

        Self {
            registry: PlayerRegistry::default(),
            rounds,
            round_index: None,
        }
    }

    #[must_use]
    pub fn registry(&self) -> &PlayerRegistry {
        &self.registry
    }

    #[must_use]
    pub fn round_index(&self) -> Option<usize> {
        self.round_index
    }

    /// The active round, or the not-started marker before the first round.
    #[must_use]
    pub fn round(&self) -> &Round {
        static NOT_STARTED_ROUND: Round = Round::NotStarted(NotStarted);
        match self.round_index {
            Some(index) => &self.rounds[index],
            None => &NOT_STARTED_ROUND,
        }
    }

    /// The active board round together with the registry, for callers that
    /// mutate round state while consulting player order.
    pub fn board_parts(&mut self) -> (Option<&mut BoardRound>, &PlayerRegistry) {
        let board = match self.round_index {
            Some(index) => match &mut self.rounds[index] {
                Round::Board(board) => Some(board),
                _ => None,
            },
            None => None,
        };
        (board, &self.registry)
    }

    #[must_use]
    pub fn board(&self) -> Option<&BoardRound> {
        match self.round_index {
            Some(index) => match &self.rounds[index] {
                Round::Board(board) => Some(board),
                _ => None,
            },
            None => None,
        }
    }

    /// Point the session at a round. Out-of-range indices leave the pointer
    /// unchanged.
    pub fn set_round(&mut self, index: usize) -> bool {
        if index < self.rounds.len() {
            self.round_index = Some(index);
            true
        } else {
            false
        }
    }

    pub fn next_round(&mut self) -> bool {
        let next = self.round_index.map_or(0, |index| index + 1);
        self.set_round(next)
    }

    pub fn prev_round(&mut self) -> bool {
        match self.round_index {
            Some(index) if index > 0 => self.set_round(index - 1),
            _ => false,
        }
    }

    /// Reset the active board round to board display, making the front of
    /// the registry current and clearing per-question spent players.
    pub fn reset_board(&mut self) {
        let (board, registry) = self.board_parts();
        if let Some(board) = board {
            board.set_board_state(registry);
        }
    }

    /// Add a player, keeping existing players unchanged on a name collision.
    pub fn add_player(&mut self, name: &str) -> &Player {
        self.registry.add(name)
    }

    #[must_use]
    pub fn player(&self, name: &str) -> Option<&Player> {
        self.registry.get(name)
    }

    pub fn player_mut(&mut self, name: &str) -> Option<&mut Player> {
        self.registry.get_mut(name)
    }

    /// Remove a player from the registry, then let the active round patch
    /// its current-player pointer if the removed player held the turn.
    pub fn remove_player(&mut self, name: &str) -> Option<Player> {
        let removed = self.registry.remove(name)?;
        if let Some(index) = self.round_index
            && let Round::Board(board) = &mut self.rounds[index]
        {
            board.remove_player(name, &self.registry);
        }
        Some(removed)
    }

    pub fn rotate_active(&mut self) {
        self.registry.rotate_active();
    }

    /// Render the full model fragment of a broadcast snapshot. Light states
    /// are derived from the active round at render time.
    #[must_use]
    pub fn render(&self) -> ModelSnapshot {
        let round = self.round();
        let players = self
            .registry
            .iter()
            .map(|player| PlayerSnapshot {
                name: player.name.clone(),
                score: player.score,
                enabled: player.enabled,
                light_state: round.light_state(&player.name),
            })
            .collect();
        ModelSnapshot {
            players,
            round: round.render(&self.registry),
        }
    }
}
