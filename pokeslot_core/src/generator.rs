use crate::{
    config::{ConfigError, GeneratorConfig},
    outcome::{Board, Outcome},
    rng::{ProvablyFairRng, RandomSource},
    symbols::SymbolSet,
};

/// Produces boards and classifies them. All randomness comes from `R`.
#[derive(Debug, Clone)]
pub struct OutcomeGenerator<R> {
    config: GeneratorConfig,
    symbols: SymbolSet,
    rng: R,
}

impl<R: RandomSource> OutcomeGenerator<R> {
    pub fn new(config: GeneratorConfig, rng: R) -> Result<Self, ConfigError> {
        config.validate()?;
        let symbols = config.symbols();
        Ok(Self {
            config,
            symbols,
            rng,
        })
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn symbols(&self) -> &SymbolSet {
        &self.symbols
    }

    /// Fills the board cell by cell, then draws the bonus flag last.
    pub fn generate(&mut self) -> Outcome {
        let board = fill_board(
            &mut self.rng,
            self.config.rows,
            self.config.columns,
            &self.symbols,
        );
        let bonus = self.rng.next_unit() < self.config.bonus_probability;
        Outcome::classify(board, bonus)
    }
}

/// Uniform draw over the whole symbol set for every cell, row by row.
/// `rows`, `columns` and `symbols` must be non-empty.
pub fn fill_board<R: RandomSource + ?Sized>(
    rng: &mut R,
    rows: usize,
    columns: usize,
    symbols: &SymbolSet,
) -> Board {
    let grid = (0..rows)
        .map(|_| {
            (0..columns)
                .map(|_| symbols.code_at(rng.next_index(symbols.len())))
                .collect()
        })
        .collect();
    Board::from_grid(grid)
}

/// Convenience: one outcome from provably-fair seeds.
pub fn generate_with_seeds(
    server_seed: &str,
    client_seed: &str,
    nonce: u64,
    config: &GeneratorConfig,
) -> Result<Outcome, ConfigError> {
    let rng = ProvablyFairRng::new(server_seed, client_seed, nonce);
    let mut generator = OutcomeGenerator::new(config.clone(), rng.stream())?;
    Ok(generator.generate())
}

/// Recomputes the outcome for the seeds and compares it with `expected`.
pub fn verify_outcome(
    server_seed: &str,
    client_seed: &str,
    nonce: u64,
    config: &GeneratorConfig,
    expected: &Outcome,
) -> bool {
    generate_with_seeds(server_seed, client_seed, nonce, config)
        .map(|actual| &actual == expected)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::EntropySource;

    #[test]
    fn test_generate_deterministic() {
        let config = GeneratorConfig::default();
        let a = generate_with_seeds("server", "client", 1, &config).unwrap();
        let b = generate_with_seeds("server", "client", 1, &config).unwrap();
        assert_eq!(a, b);
        assert!(verify_outcome("server", "client", 1, &config, &a));
    }

    #[test]
    fn board_has_configured_shape() {
        let config = GeneratorConfig {
            rows: 3,
            columns: 5,
            ..Default::default()
        };
        let mut generator = OutcomeGenerator::new(config, EntropySource::seeded(1)).unwrap();
        let outcome = generator.generate();
        assert_eq!(outcome.board().row_count(), 3);
        assert_eq!(outcome.board().column_count(), 5);
    }

    #[test]
    fn invalid_config_is_refused() {
        let config = GeneratorConfig {
            columns: 0,
            ..Default::default()
        };
        assert!(OutcomeGenerator::new(config, EntropySource::seeded(1)).is_err());
    }

    #[test]
    fn single_symbol_fills_everything() {
        let config = GeneratorConfig {
            rows: 2,
            columns: 2,
            symbol_count: 1,
            bonus_probability: 0.0,
        };
        let mut generator = OutcomeGenerator::new(config, EntropySource::seeded(5)).unwrap();
        let outcome = generator.generate();
        assert!(outcome.board().cells().all(|c| c == 1));
        // Four of one symbol is neither a pair nor a triple.
        assert!(!outcome.small_win() && !outcome.big_win());
    }
}
