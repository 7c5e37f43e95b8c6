//! Runs a [`SpinSession`] on tokio.
//!
//! The driver owns the session, the in-flight fetch and the settle timer.
//! Dropping the fetch future aborts the request; dropping the `Sleep` clears
//! the timer. User input arrives over an mpsc channel and progress is
//! published on a watch channel.

use std::future::Future;
use std::pin::Pin;

use futures::future::BoxFuture;
use pokeslot_core::{Command, Counters, Outcome, Phase, Renderer, SpinSession, Transition};
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::time::Sleep;
use tracing::debug;

use crate::client::{ClientError, OutcomeSource};

const COMMAND_BUFFER: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UserCommand {
    Spin,
    SetBet(f64),
    SetAutoplay(bool),
    Shutdown,
}

/// Published after every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverStatus {
    pub phase: Phase,
    /// Spin cycles that ended, by settlement or by a failed fetch.
    pub completed: u64,
    pub counters: Counters,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("spin driver has stopped")]
pub struct DriverClosed;

pub struct SpinDriver<S, R> {
    session: SpinSession<R>,
    source: S,
    commands: mpsc::Receiver<UserCommand>,
    status: watch::Sender<DriverStatus>,
    completed: u64,
}

/// Cloneable front for a running driver.
#[derive(Debug, Clone)]
pub struct DriverHandle {
    commands: mpsc::Sender<UserCommand>,
    status: watch::Receiver<DriverStatus>,
}

impl<S, R> SpinDriver<S, R>
where
    S: OutcomeSource,
    R: Renderer,
{
    pub fn new(session: SpinSession<R>, source: S) -> (Self, DriverHandle) {
        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_BUFFER);
        let initial = DriverStatus {
            phase: session.phase(),
            completed: 0,
            counters: session.ledger().into(),
        };
        let (status_tx, status_rx) = watch::channel(initial);
        let driver = Self {
            session,
            source,
            commands: cmd_rx,
            status: status_tx,
            completed: 0,
        };
        let handle = DriverHandle {
            commands: cmd_tx,
            status: status_rx,
        };
        (driver, handle)
    }

    /// Runs until [`UserCommand::Shutdown`] or until every handle is dropped,
    /// then hands the closed session back.
    pub async fn run(mut self) -> SpinSession<R> {
        let mut inflight: Option<BoxFuture<'static, Result<Outcome, ClientError>>> = None;
        let mut timer: Option<Pin<Box<Sleep>>> = None;

        loop {
            let transition: Transition = tokio::select! {
                cmd = self.commands.recv() => match cmd {
                    Some(UserCommand::Spin) => self.session.trigger_spin(),
                    Some(UserCommand::SetBet(value)) => {
                        self.session.update_bet(value).map(|_| None)
                    }
                    Some(UserCommand::SetAutoplay(enabled)) => {
                        self.session.set_autoplay(enabled);
                        Ok(None)
                    }
                    Some(UserCommand::Shutdown) | None => {
                        self.session.shutdown();
                        break;
                    }
                },
                result = next_in(&mut inflight) => {
                    inflight = None;
                    match result {
                        Ok(outcome) => self.session.on_outcome(outcome),
                        Err(err) => {
                            let transition = self.session.on_fetch_failed(&err);
                            self.completed += 1;
                            transition
                        }
                    }
                },
                () = next_in(&mut timer) => {
                    timer = None;
                    let transition = self.session.on_settle_timer();
                    self.completed += 1;
                    transition
                },
            };

            match transition {
                Ok(Some(Command::Fetch)) => inflight = Some(self.source.fetch()),
                Ok(Some(Command::StartSettleTimer(after))) => {
                    timer = Some(Box::pin(tokio::time::sleep(after)))
                }
                Ok(Some(Command::Cancel)) => {
                    inflight = None;
                    timer = None;
                }
                Ok(None) => {}
                Err(err) => debug!(%err, "command ignored"),
            }
            self.publish();
        }

        // In-flight fetch and timer are dropped here.
        drop(inflight);
        drop(timer);
        self.publish();
        self.session
    }

    fn publish(&self) {
        self.status.send_replace(DriverStatus {
            phase: self.session.phase(),
            completed: self.completed,
            counters: self.session.ledger().into(),
        });
    }
}

/// Awaits the future in `slot`, or never resolves if the slot is empty.
async fn next_in<F: Future + Unpin>(slot: &mut Option<F>) -> F::Output {
    match slot {
        Some(fut) => fut.await,
        None => std::future::pending().await,
    }
}

impl DriverHandle {
    pub async fn send(&self, cmd: UserCommand) -> Result<(), DriverClosed> {
        self.commands.send(cmd).await.map_err(|_| DriverClosed)
    }

    pub async fn spin(&self) -> Result<(), DriverClosed> {
        self.send(UserCommand::Spin).await
    }

    pub async fn set_bet(&self, value: f64) -> Result<(), DriverClosed> {
        self.send(UserCommand::SetBet(value)).await
    }

    pub async fn set_autoplay(&self, enabled: bool) -> Result<(), DriverClosed> {
        self.send(UserCommand::SetAutoplay(enabled)).await
    }

    pub async fn shutdown(&self) -> Result<(), DriverClosed> {
        self.send(UserCommand::Shutdown).await
    }

    pub fn status(&self) -> DriverStatus {
        *self.status.borrow()
    }

    /// Waits until `pred` holds for the published status.
    pub async fn wait_for(
        &mut self,
        pred: impl FnMut(&DriverStatus) -> bool,
    ) -> Result<DriverStatus, DriverClosed> {
        let status = self.status.wait_for(pred).await.map_err(|_| DriverClosed)?;
        Ok(*status)
    }

    /// Starts a spin from idle and waits for it, and any bonus or autoplay
    /// spins it chains into, to finish.
    pub async fn spin_and_wait(&mut self) -> Result<DriverStatus, DriverClosed> {
        let before = self.status().completed;
        self.spin().await?;
        self.wait_for(|s| {
            s.completed > before && !matches!(s.phase, Phase::Requesting | Phase::Rendering)
        })
        .await
    }
}
