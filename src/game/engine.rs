//! The game engine: a closed phase enum with per-phase input handlers.
//!
//! The engine receives input events, enforces per-phase authorization and
//! accepted-action rules, mutates the session model, drives the countdown
//! timer, and fans broadcast snapshots out to registered listeners.
//! Unauthorized or business-invalid inputs are silent no-ops; contract
//! violations (bad grid indices, unknown player names in moderator
//! commands) surface as [`EngineError`] for the transport to report
//! per connection.

use std::collections::HashMap;

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::sync::mpsc;

use super::constants::{DEFAULT_ANSWER_SECS, DEFAULT_BUZZ_SECS, MODERATOR};
use super::description::GameDescription;
use super::messages::{
    AnswerEnvelope, Broadcast, Input, InputAction, TimerStart, TimerUpdate, UpdateEnvelope,
    UpdatePayload, random_id_hash,
};
use super::model::SessionModel;
use super::round::{RenderSnapshot, RoundStyle};
use super::timer::{Timer, TimerEvent, TimerFire};

/// Errors surfaced from input handling.
///
/// These are programming-contract violations, distinct from the silent
/// no-ops used for unauthorized or business-invalid inputs.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum EngineError {
    #[error("cell ({col}, {row}) is outside the board")]
    CellOutOfBounds { col: usize, row: usize },
    #[error("no such player: {0}")]
    UnknownPlayer(String),
    #[error("session is closed")]
    SessionClosed,
}

/// Session phases. The integer tags are the wire representation.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[repr(u8)]
pub enum Phase {
    NotStarted = 0,
    SelectQuestion = 4,
    ConfirmRead = 5,
    AwaitJudgment = 6,
    AwaitBuzz = 7,
    AwaitBuzzJudgment = 8,
    RoundContinue = 9,
    GameOver = 10,
}

impl Phase {
    #[must_use]
    pub const fn tag(self) -> u8 {
        self as u8
    }
}

impl Serialize for Phase {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.tag())
    }
}

/// Engine configuration, threaded in at construction time.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EngineConfig {
    /// Seconds allowed for answering a selected question.
    pub answer_secs: u32,

    /// Seconds the buzz window stays open.
    pub buzz_secs: u32,

    /// Whether the current-turn player may pick questions themselves, or
    /// only the moderator.
    pub allow_player_pick: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            answer_secs: DEFAULT_ANSWER_SECS,
            buzz_secs: DEFAULT_BUZZ_SECS,
            allow_player_pick: false,
        }
    }
}

/// A single game session's state machine.
///
/// The engine itself is synchronous: every call runs to completion before
/// the next one, and the owning [`SessionActor`] funnels external inputs
/// and timer fires into one sequential stream.
///
/// [`SessionActor`]: crate::session::SessionActor
pub struct GameEngine {
    config: EngineConfig,
    phase: Phase,
    model: SessionModel,
    timer: Timer,
    listeners: HashMap<String, mpsc::UnboundedSender<Broadcast>>,
    last_update: Option<UpdateEnvelope>,
}

impl GameEngine {
    /// Create an engine for an authored game. Timer fires are sent into
    /// `fires`; the caller must feed them back via
    /// [`GameEngine::handle_timer_fire`].
    #[must_use]
    pub fn new(
        description: GameDescription,
        config: EngineConfig,
        fires: mpsc::UnboundedSender<TimerFire>,
    ) -> Self {
        let mut engine = Self {
            config,
            phase: Phase::NotStarted,
            model: SessionModel::new(description),
            timer: Timer::new(fires),
            listeners: HashMap::new(),
            last_update: None,
        };
        engine.update_state(None, Map::new());
        engine
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn model(&self) -> &SessionModel {
        &self.model
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Register a delivery sink for a participant. Replaces any previous
    /// sink registered under the same identity.
    pub fn add_listener(&mut self, participant: &str, sender: mpsc::UnboundedSender<Broadcast>) {
        log::debug!("listener {participant} registered");
        self.listeners.insert(participant.to_string(), sender);
    }

    pub fn remove_listener(&mut self, participant: &str) {
        log::debug!("listener {participant} removed");
        self.listeners.remove(participant);
    }

    /// Add a player to the session and re-broadcast the model. Idempotent
    /// for an already-present name.
    pub fn join_player(&mut self, name: &str) {
        log::info!("player {name} joined");
        self.model.add_player(name);
        self.update_state(None, Map::new());
    }

    /// Deliver a message to every registered listener. `None` re-sends the
    /// last update snapshot. Listeners whose sink is closed are dropped
    /// without affecting the others.
    pub fn broadcast(&mut self, message: Option<Broadcast>) {
        let message = match message {
            Some(message) => message,
            None => match self.get_update() {
                Some(message) => message,
                None => return,
            },
        };
        self.listeners.retain(|participant, sender| {
            if sender.send(message.clone()).is_err() {
                log::debug!("listener {participant} disconnected, removing");
                false
            } else {
                true
            }
        });
    }

    /// Deliver a message to a single participant.
    pub fn notify(&mut self, participant: &str, message: Broadcast) {
        if let Some(sender) = self.listeners.get(participant)
            && sender.send(message).is_err()
        {
            log::debug!("listener {participant} disconnected, removing");
            self.listeners.remove(participant);
        }
    }

    /// Re-render the last update snapshot from current model state, reusing
    /// the last envelope metadata. Side-effect free.
    #[must_use]
    pub fn get_update(&self) -> Option<Broadcast> {
        let last = self.last_update.as_ref()?;
        Some(Broadcast::UpdateModel(UpdateEnvelope {
            id_hash: last.id_hash.clone(),
            timestamp: last.timestamp,
            data: UpdatePayload {
                model: self.model.render(),
                state: self.phase,
                extra: last.data.extra.clone(),
            },
        }))
    }

    /// Process one input event to completion.
    pub fn on_input(&mut self, input: Input) -> Result<(), EngineError> {
        log::debug!(
            "phase {:?}: input {:?} from {:?}",
            self.phase,
            input.action,
            input.actor_id
        );
        let moderator = input.actor_id.as_deref() == Some(MODERATOR);
        let Input { action, actor_id } = input;

        match action {
            InputAction::SetScore { name, score } if moderator => {
                let player = self
                    .model
                    .player_mut(&name)
                    .ok_or_else(|| EngineError::UnknownPlayer(name.clone()))?;
                player.score = score;
                self.update_state(None, Map::new());
                Ok(())
            }
            InputAction::NextRound if moderator => {
                self.model.next_round();
                self.start_round();
                Ok(())
            }
            InputAction::PrevRound if moderator => {
                self.model.prev_round();
                self.start_round();
                Ok(())
            }
            InputAction::RemovePlayer { name } if moderator => {
                if self.model.remove_player(&name).is_some() {
                    log::info!("player {name} removed");
                    self.update_state(None, Map::new());
                }
                Ok(())
            }
            InputAction::EnablePlayer { name } if moderator => {
                if self.model_set_enabled(&name, true) {
                    self.update_state(None, Map::new());
                }
                Ok(())
            }
            InputAction::DisablePlayer { name } if moderator => {
                if self.model_set_enabled(&name, false) {
                    self.update_state(None, Map::new());
                }
                Ok(())
            }
            action => self.dispatch(action, actor_id.as_deref()),
        }
    }

    /// Process a fire from the countdown task. Fires from a canceled
    /// countdown are discarded, which makes cancellation race free.
    pub fn handle_timer_fire(&mut self, fire: TimerFire) -> Result<(), EngineError> {
        if !self.timer.is_current(&fire) {
            log::debug!("discarding stale timer fire {fire:?}");
            return Ok(());
        }
        match fire.event {
            TimerEvent::Tick { remaining } => {
                let start = self.timer.start_seconds();
                self.broadcast(Some(Broadcast::UpdateTimer {
                    data: TimerUpdate {
                        start_time: start,
                        current_time: remaining,
                        progress_percent: if start == 0 { 0 } else { remaining * 100 / start },
                    },
                }));
                Ok(())
            }
            TimerEvent::Expired => {
                self.timer.stop();
                self.on_input(Input::system(InputAction::Expire))
            }
        }
    }

    fn model_set_enabled(&mut self, name: &str, enabled: bool) -> bool {
        match self.model.player_mut(name) {
            Some(player) => {
                player.enabled = enabled;
                true
            }
            None => false,
        }
    }

    fn dispatch(&mut self, action: InputAction, actor: Option<&str>) -> Result<(), EngineError> {
        match self.phase {
            Phase::NotStarted => self.on_not_started(action, actor),
            Phase::SelectQuestion => self.on_select_question(action, actor),
            Phase::ConfirmRead => self.on_confirm_read(action, actor),
            Phase::AwaitJudgment => self.on_await_judgment(action),
            Phase::AwaitBuzz => self.on_await_buzz(action, actor),
            Phase::AwaitBuzzJudgment => self.on_await_buzz_judgment(action),
            Phase::RoundContinue => self.on_round_continue(action),
            // Terminal: no accepted inputs.
            Phase::GameOver => Ok(()),
        }
    }

    fn on_not_started(
        &mut self,
        action: InputAction,
        actor: Option<&str>,
    ) -> Result<(), EngineError> {
        if let InputAction::Start = action {
            if actor != Some(MODERATOR) || self.model.registry().is_empty() {
                return Ok(());
            }
            self.broadcast(Some(Broadcast::StartGame));
            self.model.set_round(0);
            self.start_round();
        }
        Ok(())
    }

    fn on_select_question(
        &mut self,
        action: InputAction,
        actor: Option<&str>,
    ) -> Result<(), EngineError> {
        let InputAction::Select { col, row } = action else {
            return Ok(());
        };

        let active = self.model.registry().active().map(|p| p.name.as_str());
        let allowed = actor == Some(MODERATOR)
            || (self.config.allow_player_pick && actor.is_some() && actor == active);
        if !allowed {
            return Ok(());
        }

        let (Some(board), registry) = self.model.board_parts() else {
            return Ok(());
        };
        if board.is_spent(col, row)? {
            return Ok(());
        }
        board.set_question_state(col, row, registry)?;
        board.set_player_spent();
        let answer = board.answer().unwrap_or_default().to_string();

        self.update_state(Some(Phase::ConfirmRead), Map::new());
        self.notify(MODERATOR, Broadcast::ProvideAnswer(AnswerEnvelope::new(answer)));
        Ok(())
    }

    fn on_confirm_read(
        &mut self,
        action: InputAction,
        actor: Option<&str>,
    ) -> Result<(), EngineError> {
        match action {
            InputAction::Continue if actor == Some(MODERATOR) => {
                self.update_state(Some(Phase::AwaitJudgment), Map::new());
                self.start_timer(self.config.answer_secs);
            }
            InputAction::Back if actor == Some(MODERATOR) => {
                self.model.reset_board();
                self.update_state(Some(Phase::SelectQuestion), Map::new());
            }
            _ => {}
        }
        Ok(())
    }

    fn on_await_judgment(&mut self, action: InputAction) -> Result<(), EngineError> {
        match action {
            InputAction::Accept => {
                let (Some(board), registry) = self.model.board_parts() else {
                    return Ok(());
                };
                let Some(current) = board.current_player().map(str::to_string) else {
                    return Ok(());
                };
                let value = board.value().unwrap_or(0);
                board.set_reveal_state(registry);
                if let Some(player) = self.model.player_mut(&current) {
                    player.score += value;
                }
                self.stop_timer();
                self.update_state(Some(Phase::RoundContinue), Map::new());
            }
            InputAction::Reject => self.reject_current(0),
            // Running out of time on the first answer carries no penalty;
            // the moderator still judges it.
            InputAction::Expire => {}
            _ => {}
        }
        Ok(())
    }

    fn on_await_buzz(
        &mut self,
        action: InputAction,
        actor: Option<&str>,
    ) -> Result<(), EngineError> {
        match action {
            InputAction::Buzz => {
                let Some(actor) = actor else {
                    return Ok(());
                };
                let (Some(board), registry) = self.model.board_parts() else {
                    return Ok(());
                };
                if !board.can_buzz(actor, registry) {
                    return Ok(());
                }
                board.set_current_player(actor, registry);
                board.set_player_spent();
                self.start_timer(self.config.answer_secs);
                self.update_state(Some(Phase::AwaitBuzzJudgment), Map::new());
            }
            InputAction::Expire => {
                self.broadcast(Some(Broadcast::StopTimer));
                let (Some(board), registry) = self.model.board_parts() else {
                    return Ok(());
                };
                board.set_reveal_state(registry);
                self.update_state(Some(Phase::RoundContinue), Map::new());
            }
            _ => {}
        }
        Ok(())
    }

    fn on_await_buzz_judgment(&mut self, action: InputAction) -> Result<(), EngineError> {
        match action {
            InputAction::Accept => {
                let (Some(board), registry) = self.model.board_parts() else {
                    return Ok(());
                };
                let Some(current) = board.current_player().map(str::to_string) else {
                    return Ok(());
                };
                let value = board.value().unwrap_or(0);
                board.set_reveal_state(registry);
                if let Some(player) = self.model.player_mut(&current) {
                    player.score += value;
                }
                self.stop_timer();
                self.update_state(Some(Phase::RoundContinue), Map::new());
            }
            // Half the question's value is the penalty for a wrong buzz.
            InputAction::Reject => self.reject_current(2),
            InputAction::Expire => {}
            _ => {}
        }
        Ok(())
    }

    fn on_round_continue(&mut self, action: InputAction) -> Result<(), EngineError> {
        if let InputAction::Continue = action {
            self.model.rotate_active();
            self.model.reset_board();
            self.update_state(Some(Phase::SelectQuestion), Map::new());
        }
        Ok(())
    }

    /// Shared rejection path: spend the current player, apply the penalty
    /// (`value / penalty_divisor`, skipped when the divisor is zero), then
    /// either reopen the buzz window or reveal and move on.
    fn reject_current(&mut self, penalty_divisor: i64) {
        let (Some(board), registry) = self.model.board_parts() else {
            return;
        };
        let current = board.current_player().map(str::to_string);
        let value = board.value().unwrap_or(0);
        board.set_player_spent();
        board.clear_current_player();
        let unspent = board.count_unspent_players(registry);
        if unspent == 0 {
            board.set_reveal_state(registry);
        }

        if penalty_divisor != 0
            && let Some(current) = current
            && let Some(player) = self.model.player_mut(&current)
        {
            player.score -= value / penalty_divisor;
        }

        self.stop_timer();
        if unspent > 0 {
            self.start_timer(self.config.buzz_secs);
            self.update_state(Some(Phase::AwaitBuzz), Map::new());
        } else {
            self.update_state(Some(Phase::RoundContinue), Map::new());
        }
    }

    /// Begin the round the model currently points at.
    fn start_round(&mut self) {
        match self.model.round().style() {
            RoundStyle::Board => {
                self.model.reset_board();
                self.update_state(Some(Phase::SelectQuestion), Map::new());
            }
            RoundStyle::EndOfGame => {
                self.update_state(Some(Phase::GameOver), Map::new());
            }
            // Only reachable by round navigation before the game starts.
            RoundStyle::NotStarted => {}
        }
    }

    fn start_timer(&mut self, seconds: u32) {
        if self.timer.start(seconds) {
            log::debug!("timer started: {seconds}s");
            self.broadcast(Some(Broadcast::StartTimer {
                data: TimerStart { time: seconds },
            }));
        }
    }

    fn stop_timer(&mut self) {
        self.timer.stop();
    }

    /// Set the phase (when given), render a fresh snapshot, retain it as
    /// the last update, and broadcast it.
    fn update_state(&mut self, phase: Option<Phase>, extra: Map<String, Value>) {
        if let Some(phase) = phase {
            self.phase = phase;
        }
        let envelope = UpdateEnvelope {
            id_hash: random_id_hash(),
            timestamp: chrono::Utc::now(),
            data: UpdatePayload {
                model: self.model.render(),
                state: self.phase,
                extra,
            },
        };
        self.last_update = Some(envelope.clone());
        self.broadcast(Some(Broadcast::UpdateModel(envelope)));
    }
}
