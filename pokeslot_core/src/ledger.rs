use crate::{outcome::Outcome, paytable::Paytable};

/// Score counters for one game. Only the owning session mutates them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreLedger {
    small_wins: u64,
    big_wins: u64,
    bonuses: u64,
    coins: i64,
    earnings: i64,
    bet: i64,
}

/// What a single settlement changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settlement {
    pub payout: i64,
    pub small_win: bool,
    pub big_win: bool,
    pub bonus: bool,
}

impl ScoreLedger {
    pub fn new(coins: i64, bet: i64) -> Self {
        Self {
            small_wins: 0,
            big_wins: 0,
            bonuses: 0,
            coins,
            earnings: 0,
            bet,
        }
    }

    pub fn small_wins(&self) -> u64 {
        self.small_wins
    }

    pub fn big_wins(&self) -> u64 {
        self.big_wins
    }

    pub fn bonuses(&self) -> u64 {
        self.bonuses
    }

    pub fn coins(&self) -> i64 {
        self.coins
    }

    pub fn earnings(&self) -> i64 {
        self.earnings
    }

    pub fn bet(&self) -> i64 {
        self.bet
    }

    /// Debits the current bet; returns the amount taken.
    pub(crate) fn stake(&mut self) -> i64 {
        self.coins -= self.bet;
        self.earnings -= self.bet;
        self.bet
    }

    pub(crate) fn refund(&mut self, amount: i64) {
        self.coins += amount;
        self.earnings += amount;
    }

    pub(crate) fn set_bet(&mut self, bet: i64) {
        self.bet = bet;
    }

    pub(crate) fn settle(&mut self, outcome: &Outcome, paytable: &Paytable) -> Settlement {
        if outcome.small_win() {
            self.small_wins += 1;
        }
        if outcome.big_win() {
            self.big_wins += 1;
        }
        if outcome.bonus() {
            self.bonuses += 1;
        }
        let payout = paytable.payout(outcome, self.bet);
        self.coins += payout;
        self.earnings += payout;
        Settlement {
            payout,
            small_win: outcome.small_win(),
            big_win: outcome.big_win(),
            bonus: outcome.bonus(),
        }
    }
}
