//! Cancelable countdown used to auto-advance the game.
//!
//! A countdown runs as a spawned task that sends one fire per elapsed
//! second into the session's fire channel, then a terminal expiry fire.
//! Every fire carries the generation it was scheduled under; stopping the
//! countdown bumps the generation so already-scheduled fires are discarded
//! by the engine. This makes cancellation race free even when a fire is
//! delivered concurrently with an external input.

use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{Duration, sleep},
};

/// A single scheduled fire from the countdown task.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TimerFire {
    pub generation: u64,
    pub event: TimerEvent,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TimerEvent {
    /// One second elapsed; `remaining` seconds are left.
    Tick { remaining: u32 },

    /// The countdown ran out. Sent exactly once per countdown.
    Expired,
}

/// Countdown handle owned by the engine. At most one countdown is live per
/// session; starting a new one implicitly cancels the previous one.
#[derive(Debug)]
pub struct Timer {
    fires: mpsc::UnboundedSender<TimerFire>,
    generation: u64,
    start_seconds: u32,
    task: Option<JoinHandle<()>>,
}

impl Timer {
    #[must_use]
    pub fn new(fires: mpsc::UnboundedSender<TimerFire>) -> Self {
        Self {
            fires,
            generation: 0,
            start_seconds: 0,
            task: None,
        }
    }

    /// Begin a countdown of `seconds`, canceling any running countdown.
    /// Returns false (scheduling nothing) for a zero duration.
    ///
    /// Must be called within a tokio runtime.
    pub fn start(&mut self, seconds: u32) -> bool {
        if seconds == 0 {
            return false;
        }
        self.stop();
        self.start_seconds = seconds;

        let generation = self.generation;
        let fires = self.fires.clone();
        self.task = Some(tokio::spawn(async move {
            let mut remaining = i64::from(seconds);
            loop {
                sleep(Duration::from_secs(1)).await;
                remaining -= 1;
                if remaining >= 0 {
                    let tick = TimerFire {
                        generation,
                        event: TimerEvent::Tick {
                            remaining: remaining as u32,
                        },
                    };
                    if fires.send(tick).is_err() {
                        return;
                    }
                } else {
                    let _ = fires.send(TimerFire {
                        generation,
                        event: TimerEvent::Expired,
                    });
                    return;
                }
            }
        }));
        true
    }

    /// Cancel the running countdown. Idempotent; fires already in flight
    /// become stale and are discarded via [`Timer::is_current`].
    pub fn stop(&mut self) {
        self.generation += 1;
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    /// Duration the current countdown was started with.
    #[must_use]
    pub fn start_seconds(&self) -> u32 {
        self.start_seconds
    }

    /// True when the fire belongs to the live countdown rather than a
    /// canceled one.
    #[must_use]
    pub fn is_current(&self, fire: &TimerFire) -> bool {
        fire.generation == self.generation
    }
}
