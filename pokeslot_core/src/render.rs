//! The outward-facing rendering contract.
//!
//! A session calls into its [`Renderer`] at fixed transition points: the spin
//! animation starts when a request goes out, the board is drawn when the
//! outcome arrives, counters refresh after settlement. How any of that looks is
//! up to the implementation.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::{ledger::ScoreLedger, outcome::Board, symbols::SymbolCode};

pub trait Renderer {
    fn render_board(&mut self, board: &Board);
    fn play_spin_animation(&mut self, duration: Duration);
    fn update_counters(&mut self, ledger: &ScoreLedger);

    /// Spin button availability; disabled while a spin is in flight.
    fn set_spin_enabled(&mut self, _enabled: bool) {}

    fn show_error(&mut self, _message: &str) {}
}

/// Snapshot of ledger counters as handed to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Counters {
    pub small_wins: u64,
    pub big_wins: u64,
    pub bonuses: u64,
    pub coins: i64,
    pub earnings: i64,
    pub bet: i64,
}

impl From<&ScoreLedger> for Counters {
    fn from(ledger: &ScoreLedger) -> Self {
        Self {
            small_wins: ledger.small_wins(),
            big_wins: ledger.big_wins(),
            bonuses: ledger.bonuses(),
            coins: ledger.coins(),
            earnings: ledger.earnings(),
            bet: ledger.bet(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderEvent {
    Board(Vec<Vec<SymbolCode>>),
    Animation(Duration),
    Counters(Counters),
    SpinEnabled(bool),
    Error(String),
}

/// Headless renderer that records every call. Clones share one log.
#[derive(Debug, Clone, Default)]
pub struct RecordingRenderer {
    events: Arc<Mutex<Vec<RenderEvent>>>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<RenderEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last_counters(&self) -> Option<Counters> {
        self.events().into_iter().rev().find_map(|e| match e {
            RenderEvent::Counters(c) => Some(c),
            _ => None,
        })
    }

    pub fn boards_rendered(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, RenderEvent::Board(_)))
            .count()
    }

    fn push(&self, event: RenderEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

impl Renderer for RecordingRenderer {
    fn render_board(&mut self, board: &Board) {
        self.push(RenderEvent::Board(board.rows().to_vec()));
    }

    fn play_spin_animation(&mut self, duration: Duration) {
        self.push(RenderEvent::Animation(duration));
    }

    fn update_counters(&mut self, ledger: &ScoreLedger) {
        self.push(RenderEvent::Counters(ledger.into()));
    }

    fn set_spin_enabled(&mut self, enabled: bool) {
        self.push(RenderEvent::SpinEnabled(enabled));
    }

    fn show_error(&mut self, message: &str) {
        self.push(RenderEvent::Error(message.to_string()));
    }
}
