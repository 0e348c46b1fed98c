//! Session actor with async message handling.

use tokio::sync::{mpsc, oneshot};

use crate::game::{
    Broadcast, EngineConfig, EngineError, GameDescription, GameEngine, Input, TimerFire,
};

/// Messages that can be sent to a [`SessionActor`].
#[derive(Debug)]
pub enum SessionMessage {
    /// An input event from the transport. The result reports contract
    /// violations so the transport can notify the offending connection.
    Input {
        input: Input,
        response: oneshot::Sender<Result<(), EngineError>>,
    },

    /// Add a participant to the game.
    JoinPlayer { name: String },

    /// Register a delivery sink for a participant.
    AddListener {
        participant: String,
        sender: mpsc::UnboundedSender<Broadcast>,
    },

    /// Remove a participant's delivery sink.
    RemoveListener { participant: String },

    /// Fan a message out to all listeners; `None` re-sends the last update
    /// snapshot, e.g. to bring a reconnecting client current.
    Broadcast { message: Option<Broadcast> },

    /// Fetch the last update snapshot, re-rendered from current state.
    GetUpdate {
        response: oneshot::Sender<Option<Broadcast>>,
    },

    /// Shut the session down.
    Close,
}

/// Handle for sending messages to a running session.
#[derive(Clone, Debug)]
pub struct SessionHandle {
    sender: mpsc::Sender<SessionMessage>,
}

impl SessionHandle {
    /// Submit an input event and wait for it to be processed.
    pub async fn on_input(&self, input: Input) -> Result<(), EngineError> {
        let (response, receiver) = oneshot::channel();
        self.sender
            .send(SessionMessage::Input { input, response })
            .await
            .map_err(|_| EngineError::SessionClosed)?;
        receiver.await.map_err(|_| EngineError::SessionClosed)?
    }

    pub async fn join_player(&self, name: &str) -> Result<(), EngineError> {
        self.send(SessionMessage::JoinPlayer {
            name: name.to_string(),
        })
        .await
    }

    pub async fn add_listener(
        &self,
        participant: &str,
        sender: mpsc::UnboundedSender<Broadcast>,
    ) -> Result<(), EngineError> {
        self.send(SessionMessage::AddListener {
            participant: participant.to_string(),
            sender,
        })
        .await
    }

    pub async fn remove_listener(&self, participant: &str) -> Result<(), EngineError> {
        self.send(SessionMessage::RemoveListener {
            participant: participant.to_string(),
        })
        .await
    }

    /// Fan a message out to all listeners; `None` re-sends the last update.
    pub async fn broadcast(&self, message: Option<Broadcast>) -> Result<(), EngineError> {
        self.send(SessionMessage::Broadcast { message }).await
    }

    pub async fn get_update(&self) -> Result<Option<Broadcast>, EngineError> {
        let (response, receiver) = oneshot::channel();
        self.send(SessionMessage::GetUpdate { response }).await?;
        receiver.await.map_err(|_| EngineError::SessionClosed)
    }

    pub async fn close(&self) -> Result<(), EngineError> {
        self.send(SessionMessage::Close).await
    }

    async fn send(&self, message: SessionMessage) -> Result<(), EngineError> {
        self.sender
            .send(message)
            .await
            .map_err(|_| EngineError::SessionClosed)
    }
}

/// Actor owning one game session.
///
/// External messages and timer fires are processed one at a time in a
/// single `select!` loop, which gives the engine the serialization it
/// requires: a timer expiry and an externally arriving input can never
/// interleave.
pub struct SessionActor {
    engine: GameEngine,
    inbox: mpsc::Receiver<SessionMessage>,
    fires: mpsc::UnboundedReceiver<TimerFire>,
    closed: bool,
}

impl SessionActor {
    /// Create a session actor and a handle for sending messages to it.
    #[must_use]
    pub fn new(description: GameDescription, config: EngineConfig) -> (Self, SessionHandle) {
        let (sender, inbox) = mpsc::channel(100);
        let (fire_sender, fires) = mpsc::unbounded_channel();
        let engine = GameEngine::new(description, config, fire_sender);

        let actor = Self {
            engine,
            inbox,
            fires,
            closed: false,
        };
        (actor, SessionHandle { sender })
    }

    /// Create and spawn a session, returning its handle.
    pub fn spawn(description: GameDescription, config: EngineConfig) -> SessionHandle {
        let (actor, handle) = Self::new(description, config);
        tokio::spawn(actor.run());
        handle
    }

    /// Run the session event loop until closed or all handles drop.
    pub async fn run(mut self) {
        log::info!("session starting");

        loop {
            tokio::select! {
                message = self.inbox.recv() => match message {
                    Some(message) => {
                        self.handle_message(message);
                        if self.closed {
                            break;
                        }
                    }
                    None => break,
                },

                Some(fire) = self.fires.recv() => {
                    if let Err(e) = self.engine.handle_timer_fire(fire) {
                        log::error!("timer fire failed: {e}");
                    }
                }
            }
        }

        log::info!("session closed");
    }

    fn handle_message(&mut self, message: SessionMessage) {
        match message {
            SessionMessage::Input { input, response } => {
                let result = self.engine.on_input(input);
                if let Err(e) = &result {
                    log::warn!("input rejected: {e}");
                }
                let _ = response.send(result);
            }

            SessionMessage::JoinPlayer { name } => {
                self.engine.join_player(&name);
            }

            SessionMessage::AddListener {
                participant,
                sender,
            } => {
                self.engine.add_listener(&participant, sender);
            }

            SessionMessage::RemoveListener { participant } => {
                self.engine.remove_listener(&participant);
            }

            SessionMessage::Broadcast { message } => {
                self.engine.broadcast(message);
            }

            SessionMessage::GetUpdate { response } => {
                let _ = response.send(self.engine.get_update());
            }

            SessionMessage::Close => {
                self.closed = true;
            }
        }
    }
}
