use serde::{Deserialize, Serialize};

use crate::outcome::Outcome;

/// Bet multipliers paid on settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paytable {
    pub small_win_multiplier: i64,
    pub big_win_multiplier: i64,
}

impl Paytable {
    pub fn classic() -> Self {
        Self {
            small_win_multiplier: 2,
            big_win_multiplier: 5,
        }
    }

    /// Total winnings for `outcome` at `bet`; flags add up independently.
    pub fn payout(&self, outcome: &Outcome, bet: i64) -> i64 {
        let mut total = 0;
        if outcome.small_win() {
            total += bet * self.small_win_multiplier;
        }
        if outcome.big_win() {
            total += bet * self.big_win_multiplier;
        }
        total
    }
}

impl Default for Paytable {
    fn default() -> Self {
        Self::classic()
    }
}
