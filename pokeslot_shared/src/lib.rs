use chrono::{DateTime, Utc};
use pokeslot_core::{Board, Outcome, OutcomeError, SymbolCode};
use serde::{Deserialize, Serialize};

/// Body of `GET|POST /spin`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SpinResponse {
    pub board: Vec<Vec<SymbolCode>>,
    pub small_win: bool,
    pub big_win: bool,
    pub bonus: bool,
}

impl From<Outcome> for SpinResponse {
    fn from(outcome: Outcome) -> Self {
        let small_win = outcome.small_win();
        let big_win = outcome.big_win();
        let bonus = outcome.bonus();
        Self {
            board: outcome.into_board().into_rows(),
            small_win,
            big_win,
            bonus,
        }
    }
}

impl TryFrom<SpinResponse> for Outcome {
    type Error = OutcomeError;

    fn try_from(resp: SpinResponse) -> Result<Self, Self::Error> {
        let board = Board::new(resp.board)?;
        Outcome::from_parts(board, resp.small_win, resp.big_win, resp.bonus)
    }
}

/// Optional query on `/spin`.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct SpinQuery {
    pub client_seed: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct VerifyResponse {
    pub server_seed_hash: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AdminSetParamsRequest {
    pub bonus_probability: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SpinLogEntry {
    pub id: i64,
    pub ts: DateTime<Utc>,
    pub client_seed: String,
    pub nonce: i64,
    pub server_seed_hash: String,
    pub board: Vec<Vec<SymbolCode>>,
    pub small_win: bool,
    pub big_win: bool,
    pub bonus: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_shape_uses_camel_case() {
        let json = r#"{"board":[[1,1,4]],"smallWin":true,"bigWin":false,"bonus":false}"#;
        let resp: SpinResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.board, vec![vec![1, 1, 4]]);
        assert!(resp.small_win);
        assert_eq!(serde_json::to_string(&resp).unwrap(), json);
    }

    #[test]
    fn decoding_checks_outcome_invariants() {
        let ragged = SpinResponse {
            board: vec![vec![1, 2, 3], vec![4]],
            small_win: false,
            big_win: false,
            bonus: false,
        };
        assert!(matches!(
            Outcome::try_from(ragged),
            Err(OutcomeError::RaggedRow { row: 1, .. })
        ));

        let lying = SpinResponse {
            board: vec![vec![1, 2, 3]],
            small_win: false,
            big_win: true,
            bonus: false,
        };
        assert!(matches!(
            Outcome::try_from(lying),
            Err(OutcomeError::InconsistentFlags { .. })
        ));

        let good = SpinResponse {
            board: vec![vec![3, 3, 3]],
            small_win: false,
            big_win: true,
            bonus: true,
        };
        let outcome = Outcome::try_from(good.clone()).unwrap();
        assert!(outcome.bonus());
        assert_eq!(SpinResponse::from(outcome), good);
    }
}
