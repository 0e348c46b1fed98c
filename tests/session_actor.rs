//! Session actor integration: serialized input handling, listener fan-out,
//! and countdown-driven auto-advance under paused tokio time.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;
use trivia_engine::game::{
    Broadcast, CellDescription, CellKind, ColumnDescription, EngineConfig, EngineError,
    GameDescription, Input, InputAction, Phase, RoundDescription,
};
use trivia_engine::{MODERATOR, SessionActor};

fn description() -> GameDescription {
    GameDescription {
        name: "integration".to_string(),
        rounds: vec![RoundDescription::Categorical {
            columns: vec![ColumnDescription {
                category: "Geography".to_string(),
                cells: vec![
                    CellDescription {
                        question: "largest ocean".to_string(),
                        answer: "the Pacific".to_string(),
                        value: 100,
                        kind: CellKind::Text,
                    },
                    CellDescription {
                        question: "longest river".to_string(),
                        answer: "the Nile".to_string(),
                        value: 200,
                        kind: CellKind::Text,
                    },
                ],
            }],
        }],
    }
}

fn moderator(action: InputAction) -> Input {
    Input::new(action, MODERATOR)
}

async fn recv(rx: &mut mpsc::UnboundedReceiver<Broadcast>) -> Broadcast {
    timeout(Duration::from_secs(60), rx.recv())
        .await
        .expect("timed out waiting for a broadcast")
        .expect("session dropped the listener")
}

/// Receive until an `update_model` broadcast in the wanted phase arrives,
/// returning every message seen along the way.
async fn recv_until_state(
    rx: &mut mpsc::UnboundedReceiver<Broadcast>,
    phase: Phase,
) -> Vec<Broadcast> {
    let mut seen = Vec::new();
    loop {
        let message = recv(rx).await;
        let done = matches!(
            &message,
            Broadcast::UpdateModel(envelope) if envelope.data.state == phase
        );
        seen.push(message);
        if done {
            return seen;
        }
    }
}

#[tokio::test(start_paused = true)]
async fn joins_and_starts_fan_out_to_listeners() {
    let handle = SessionActor::spawn(description(), EngineConfig::default());
    let (tx, mut rx) = mpsc::unbounded_channel();
    handle.add_listener("Adam", tx).await.unwrap();

    handle.join_player("Adam").await.unwrap();
    let joined = recv(&mut rx).await;
    match joined {
        Broadcast::UpdateModel(envelope) => {
            assert_eq!(envelope.data.state, Phase::NotStarted);
            assert_eq!(envelope.data.model.players.len(), 1);
            assert_eq!(envelope.id_hash.len(), 16);
        }
        other => panic!("expected update_model, got {other:?}"),
    }

    handle.on_input(moderator(InputAction::Start)).await.unwrap();
    assert!(matches!(recv(&mut rx).await, Broadcast::StartGame));
    let seen = recv_until_state(&mut rx, Phase::SelectQuestion).await;
    assert_eq!(seen.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn broadcast_none_resends_the_last_update() {
    let handle = SessionActor::spawn(description(), EngineConfig::default());
    let (tx, mut rx) = mpsc::unbounded_channel();

    handle.join_player("Adam").await.unwrap();
    handle.add_listener("Adam", tx).await.unwrap();

    let last = handle.get_update().await.unwrap().expect("snapshot exists");
    handle.broadcast(None).await.unwrap();
    assert_eq!(recv(&mut rx).await, last);
}

#[tokio::test(start_paused = true)]
async fn removed_listeners_stop_receiving() {
    let handle = SessionActor::spawn(description(), EngineConfig::default());
    let (tx, mut rx) = mpsc::unbounded_channel();
    handle.add_listener("Adam", tx).await.unwrap();

    handle.join_player("Adam").await.unwrap();
    assert!(matches!(recv(&mut rx).await, Broadcast::UpdateModel(_)));

    handle.remove_listener("Adam").await.unwrap();
    handle.on_input(moderator(InputAction::Start)).await.unwrap();

    // The actor processed the start before answering this round trip, so
    // its broadcasts have already been fanned out.
    assert!(handle.get_update().await.unwrap().is_some());
    assert!(rx.try_recv().is_err(), "removed listener must not receive");
}

#[tokio::test(start_paused = true)]
async fn buzz_window_expires_without_input() {
    let config = EngineConfig {
        answer_secs: 2,
        buzz_secs: 2,
        allow_player_pick: false,
    };
    let handle = SessionActor::spawn(description(), config);
    let (tx, mut rx) = mpsc::unbounded_channel();
    handle.add_listener(MODERATOR, tx).await.unwrap();

    handle.join_player("Adam").await.unwrap();
    handle.join_player("Beth").await.unwrap();
    handle.on_input(moderator(InputAction::Start)).await.unwrap();
    handle
        .on_input(moderator(InputAction::Select { col: 0, row: 1 }))
        .await
        .unwrap();
    handle
        .on_input(moderator(InputAction::Continue))
        .await
        .unwrap();
    handle
        .on_input(moderator(InputAction::Reject))
        .await
        .unwrap();

    // Nobody buzzes: the countdown ticks down and the session advances on
    // its own, revealing the answer.
    let seen = recv_until_state(&mut rx, Phase::RoundContinue).await;
    assert!(
        seen.iter()
            .any(|m| matches!(m, Broadcast::StartTimer { data } if data.time == 2)),
        "buzz countdown should have been announced"
    );
    assert!(
        seen.iter()
            .any(|m| matches!(m, Broadcast::UpdateTimer { .. })),
        "countdown ticks should have been broadcast"
    );
    assert!(
        seen.iter().any(|m| matches!(m, Broadcast::StopTimer)),
        "expiry should stop the countdown"
    );
}

#[tokio::test(start_paused = true)]
async fn moderator_receives_the_answer_privately() {
    let handle = SessionActor::spawn(description(), EngineConfig::default());
    let (host_tx, mut host_rx) = mpsc::unbounded_channel();
    let (player_tx, mut player_rx) = mpsc::unbounded_channel();
    handle.add_listener(MODERATOR, host_tx).await.unwrap();
    handle.add_listener("Adam", player_tx).await.unwrap();

    handle.join_player("Adam").await.unwrap();
    handle.on_input(moderator(InputAction::Start)).await.unwrap();
    handle
        .on_input(moderator(InputAction::Select { col: 0, row: 0 }))
        .await
        .unwrap();

    let mut host_saw_answer = None;
    while host_saw_answer.is_none() {
        if let Broadcast::ProvideAnswer(envelope) = recv(&mut host_rx).await {
            host_saw_answer = Some(envelope.data.answer);
        }
    }
    assert_eq!(host_saw_answer.as_deref(), Some("the Pacific"));

    // The contestant only ever sees model updates.
    recv_until_state(&mut player_rx, Phase::ConfirmRead)
        .await
        .iter()
        .for_each(|message| {
            assert!(!matches!(message, Broadcast::ProvideAnswer(_)));
        });
}

#[tokio::test(start_paused = true)]
async fn contract_violations_surface_to_the_caller() {
    let handle = SessionActor::spawn(description(), EngineConfig::default());
    handle.join_player("Adam").await.unwrap();
    handle.on_input(moderator(InputAction::Start)).await.unwrap();

    let result = handle
        .on_input(moderator(InputAction::Select { col: 7, row: 7 }))
        .await;
    assert_eq!(result, Err(EngineError::CellOutOfBounds { col: 7, row: 7 }));

    // The session keeps serving other participants afterwards.
    handle
        .on_input(moderator(InputAction::Select { col: 0, row: 0 }))
        .await
        .unwrap();
}

#[tokio::test(start_paused = true)]
async fn closed_sessions_reject_further_input() {
    let handle = SessionActor::spawn(description(), EngineConfig::default());
    handle.join_player("Adam").await.unwrap();
    handle.close().await.unwrap();

    let result = handle.on_input(moderator(InputAction::Start)).await;
    assert_eq!(result, Err(EngineError::SessionClosed));
}
