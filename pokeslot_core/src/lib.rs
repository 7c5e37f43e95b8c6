pub mod config;
pub mod generator;
pub mod ledger;
pub mod outcome;
pub mod paytable;
pub mod render;
pub mod rng;
pub mod session;
pub mod symbols;

pub use crate::config::{ConfigError, GeneratorConfig, SessionConfig};
pub use crate::generator::{fill_board, generate_with_seeds, verify_outcome, OutcomeGenerator};
pub use crate::ledger::{ScoreLedger, Settlement};
pub use crate::outcome::{classify_wins, Board, Outcome, OutcomeError};
pub use crate::paytable::Paytable;
pub use crate::render::{Counters, RecordingRenderer, RenderEvent, Renderer};
pub use crate::rng::{
    derive_floats, derive_hash_hex, EntropySource, FairStream, ProvablyFairRng, RandomSource,
};
pub use crate::session::{Command, Phase, SessionError, SpinKind, SpinSession, Transition};
pub use crate::symbols::{SymbolCode, SymbolSet, Tile};
