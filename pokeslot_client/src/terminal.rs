use std::io::{self, Write};
use std::time::Duration;

use pokeslot_core::{Board, Renderer, ScoreLedger, Tile};

/// Plain-text renderer for the terminal front-end.
pub struct TerminalRenderer<W> {
    out: W,
}

impl TerminalRenderer<io::Stdout> {
    pub fn stdout() -> Self {
        Self { out: io::stdout() }
    }
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    // Terminal output is best effort; a closed pipe must not stop the game.
    fn line(&mut self, text: &str) {
        let _ = writeln!(self.out, "{text}");
    }
}

fn tile_label(code: u8) -> String {
    match Tile::from_code(code) {
        Some(tile) => tile.name().to_string(),
        None => format!("#{code}"),
    }
}

impl<W: Write> Renderer for TerminalRenderer<W> {
    fn render_board(&mut self, board: &Board) {
        for row in board.rows() {
            let cells: Vec<String> = row
                .iter()
                .map(|&c| format!("{:^12}", tile_label(c)))
                .collect();
            self.line(&format!("|{}|", cells.join("|")));
        }
    }

    fn play_spin_animation(&mut self, duration: Duration) {
        self.line(&format!("spinning... ({} ms)", duration.as_millis()));
    }

    fn update_counters(&mut self, ledger: &ScoreLedger) {
        self.line(&format!(
            "small {} | big {} | bonus {} | coins {} | earnings {} | bet {}",
            ledger.small_wins(),
            ledger.big_wins(),
            ledger.bonuses(),
            ledger.coins(),
            ledger.earnings(),
            ledger.bet()
        ));
    }

    fn show_error(&mut self, message: &str) {
        self.line(&format!("error: {message}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_tiles_and_counters() {
        let mut renderer = TerminalRenderer::new(Vec::new());
        let board = Board::new(vec![vec![2, 2, 9]]).unwrap();
        renderer.render_board(&board);
        renderer.update_counters(&ScoreLedger::new(10_000, 50));
        let text = String::from_utf8(renderer.into_inner()).unwrap();
        assert!(text.contains("pikachu"));
        assert!(text.contains("#9"));
        assert!(text.contains("coins 10000"));
        assert!(text.contains("bet 50"));
    }
}
