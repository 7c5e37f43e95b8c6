//! Spin cycle state machine.
//!
//! [`SpinSession`] does no IO and owns no timers. Each transition returns at
//! most one [`Command`] telling the driver what to do next (fetch an outcome,
//! arm the settle timer, or cancel both); the driver reports back through
//! [`SpinSession::on_outcome`], [`SpinSession::on_fetch_failed`] and
//! [`SpinSession::on_settle_timer`].
//!
//! ```text
//! Idle --trigger_spin--> Requesting --on_outcome--> Rendering --on_settle_timer--> Idle
//!                             |                                    |
//!                             +--on_fetch_failed--> Idle           +--bonus/autoplay--> Requesting
//! ```
//!
//! Any transition requested from the wrong phase fails with
//! [`SessionError::InvalidState`] and leaves the session untouched, so there is
//! never more than one spin in flight and an outcome settles at most once.

use std::fmt;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    config::{ConfigError, SessionConfig},
    ledger::{ScoreLedger, Settlement},
    outcome::Outcome,
    paytable::Paytable,
    render::Renderer,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Requesting,
    Rendering,
    /// Shut down; every further transition is rejected.
    Closed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::Requesting => "requesting",
            Phase::Rendering => "rendering",
            Phase::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Whether the current cycle was paid for or is a free bonus spin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpinKind {
    Paid,
    Bonus,
}

/// Work the driver must carry out after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Fetch,
    StartSettleTimer(Duration),
    /// Abort the in-flight fetch and clear the settle timer.
    Cancel,
}

#[derive(Debug, Error, PartialEq)]
pub enum SessionError {
    #[error("cannot {action} while {phase}")]
    InvalidState { action: &'static str, phase: Phase },
    #[error("bet must be a finite number, got {0}")]
    InvalidBet(f64),
}

pub type Transition = Result<Option<Command>, SessionError>;

pub struct SpinSession<R> {
    config: SessionConfig,
    paytable: Paytable,
    ledger: ScoreLedger,
    renderer: R,
    phase: Phase,
    kind: SpinKind,
    pending: Option<Outcome>,
    autoplay: bool,
    staked: i64,
}

impl<R: Renderer> SpinSession<R> {
    pub fn new(config: SessionConfig, renderer: R) -> Result<Self, ConfigError> {
        Self::with_paytable(config, Paytable::classic(), renderer)
    }

    pub fn with_paytable(
        config: SessionConfig,
        paytable: Paytable,
        renderer: R,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let ledger = ScoreLedger::new(config.initial_coins, config.initial_bet);
        let autoplay = config.autoplay;
        let mut session = Self {
            config,
            paytable,
            ledger,
            renderer,
            phase: Phase::Idle,
            kind: SpinKind::Paid,
            pending: None,
            autoplay,
            staked: 0,
        };
        session.renderer.update_counters(&session.ledger);
        session.renderer.set_spin_enabled(true);
        Ok(session)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Kind of the spin in flight, or of the last one if idle.
    pub fn kind(&self) -> SpinKind {
        self.kind
    }

    pub fn ledger(&self) -> &ScoreLedger {
        &self.ledger
    }

    pub fn pending(&self) -> Option<&Outcome> {
        self.pending.as_ref()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn autoplay(&self) -> bool {
        self.autoplay
    }

    /// Read only when a spin settles.
    pub fn set_autoplay(&mut self, enabled: bool) {
        self.autoplay = enabled;
    }

    /// Starts a paid spin. The stake leaves the balance immediately.
    pub fn trigger_spin(&mut self) -> Transition {
        self.expect_phase(Phase::Idle, "start a spin")?;
        Ok(Some(self.begin(SpinKind::Paid)))
    }

    pub fn on_outcome(&mut self, outcome: Outcome) -> Transition {
        self.expect_phase(Phase::Requesting, "accept an outcome")?;
        self.renderer.render_board(outcome.board());
        self.pending = Some(outcome);
        self.phase = Phase::Rendering;
        Ok(Some(Command::StartSettleTimer(self.config.settle_delay())))
    }

    pub fn on_fetch_failed(&mut self, error: &dyn fmt::Display) -> Transition {
        self.expect_phase(Phase::Requesting, "report a failed fetch")?;
        warn!(kind = ?self.kind, %error, "outcome request failed");
        if self.config.refund_on_failure && self.staked > 0 {
            self.ledger.refund(self.staked);
        }
        self.staked = 0;
        self.phase = Phase::Idle;
        self.renderer.show_error(&format!("spin failed: {error}"));
        self.renderer.update_counters(&self.ledger);
        self.renderer.set_spin_enabled(true);
        Ok(None)
    }

    /// Applies the pending outcome and decides what happens next: a bonus
    /// outcome starts a free spin and skips autoplay for this cycle; otherwise
    /// autoplay, if enabled, starts the next paid spin.
    pub fn on_settle_timer(&mut self) -> Transition {
        self.expect_phase(Phase::Rendering, "settle")?;
        let Some(outcome) = self.pending.take() else {
            return Err(self.invalid("settle"));
        };
        let settlement = self.ledger.settle(&outcome, &self.paytable);
        self.staked = 0;
        self.phase = Phase::Idle;
        self.log_settlement(&settlement);
        self.renderer.update_counters(&self.ledger);

        if outcome.bonus() {
            return Ok(Some(self.begin(SpinKind::Bonus)));
        }
        if self.autoplay {
            return Ok(Some(self.begin(SpinKind::Paid)));
        }
        self.renderer.set_spin_enabled(true);
        Ok(None)
    }

    /// Rounds and clamps `value` to the configured bet range. Idle only.
    pub fn update_bet(&mut self, value: f64) -> Result<i64, SessionError> {
        self.expect_phase(Phase::Idle, "change the bet")?;
        if !value.is_finite() {
            return Err(SessionError::InvalidBet(value));
        }
        let bet = (value.round() as i64).clamp(self.config.min_bet, self.config.max_bet);
        self.ledger.set_bet(bet);
        self.renderer.update_counters(&self.ledger);
        Ok(bet)
    }

    /// Closes the session from any phase. Returns [`Command::Cancel`] when a
    /// spin was in flight; its stake is not refunded.
    pub fn shutdown(&mut self) -> Option<Command> {
        let in_flight = matches!(self.phase, Phase::Requesting | Phase::Rendering);
        if self.phase == Phase::Closed {
            return None;
        }
        self.pending = None;
        self.staked = 0;
        self.phase = Phase::Closed;
        self.renderer.set_spin_enabled(false);
        info!(in_flight, "spin session closed");
        in_flight.then_some(Command::Cancel)
    }

    pub fn into_parts(self) -> (ScoreLedger, R) {
        (self.ledger, self.renderer)
    }

    fn begin(&mut self, kind: SpinKind) -> Command {
        self.staked = match kind {
            SpinKind::Paid => self.ledger.stake(),
            SpinKind::Bonus => 0,
        };
        self.kind = kind;
        self.phase = Phase::Requesting;
        debug!(?kind, stake = self.staked, "spin requested");
        self.renderer.set_spin_enabled(false);
        self.renderer.play_spin_animation(self.config.settle_delay());
        Command::Fetch
    }

    fn expect_phase(&self, expected: Phase, action: &'static str) -> Result<(), SessionError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(self.invalid(action))
        }
    }

    fn invalid(&self, action: &'static str) -> SessionError {
        SessionError::InvalidState {
            action,
            phase: self.phase,
        }
    }

    fn log_settlement(&self, settlement: &Settlement) {
        info!(
            kind = ?self.kind,
            payout = settlement.payout,
            small_win = settlement.small_win,
            big_win = settlement.big_win,
            bonus = settlement.bonus,
            coins = self.ledger.coins(),
            "spin settled"
        );
    }
}
