use std::str::FromStr;

use chrono::Utc;
use pokeslot_core::{derive_hash_hex, Outcome};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use tracing::info;

// Schema lives in migrations/.

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StoredParams {
    pub server_seed: String,
    pub server_seed_hash: String,
    pub bonus_probability: f64,
    pub nonce: i64,
}

pub async fn connect(url: &str) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
    // Every connection to an in-memory database gets its own copy, so keep
    // exactly one alive for the life of the pool.
    let pool = if url.contains(":memory:") {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?
    } else {
        SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?
    };
    Ok(pool)
}

/// Runs migrations and makes sure the single params row exists with a hash
/// that matches its seed.
pub async fn init_db(db: &SqlitePool, bonus_probability: f64) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(db).await?;

    let existing = sqlx::query_as::<_, StoredParams>(
        "SELECT server_seed, server_seed_hash, bonus_probability, nonce FROM params WHERE id = 1",
    )
    .fetch_optional(db)
    .await?;

    match existing {
        None => {
            let seed = hex::encode(rand::random::<[u8; 32]>());
            let hash = derive_hash_hex(seed.as_bytes());
            sqlx::query(
                "INSERT INTO params (id, server_seed, server_seed_hash, bonus_probability, nonce) \
                 VALUES (1, ?, ?, ?, 0)",
            )
            .bind(&seed)
            .bind(&hash)
            .bind(bonus_probability)
            .execute(db)
            .await?;
            info!(server_seed_hash = %hash, "generated new server seed");
        }
        Some(p) => {
            let hash = derive_hash_hex(p.server_seed.as_bytes());
            if p.server_seed_hash != hash {
                sqlx::query("UPDATE params SET server_seed_hash = ? WHERE id = 1")
                    .bind(&hash)
                    .execute(db)
                    .await?;
            }
        }
    }
    Ok(())
}

pub async fn get_params(pool: &SqlitePool) -> anyhow::Result<StoredParams> {
    let row = sqlx::query_as::<_, StoredParams>(
        "SELECT server_seed, server_seed_hash, bonus_probability, nonce FROM params WHERE id = 1",
    )
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// Allocates the next nonce atomically and returns the params it belongs to.
pub async fn next_nonce(pool: &SqlitePool) -> anyhow::Result<StoredParams> {
    let row = sqlx::query_as::<_, StoredParams>(
        "UPDATE params SET nonce = nonce + 1 WHERE id = 1 \
         RETURNING server_seed, server_seed_hash, bonus_probability, nonce",
    )
    .fetch_one(pool)
    .await?;
    Ok(row)
}

pub async fn set_bonus_probability(
    pool: &SqlitePool,
    bonus_probability: f64,
) -> anyhow::Result<()> {
    sqlx::query("UPDATE params SET bonus_probability = ? WHERE id = 1")
        .bind(bonus_probability)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn log_spin(
    pool: &SqlitePool,
    client_seed: &str,
    params: &StoredParams,
    outcome: &Outcome,
) -> anyhow::Result<()> {
    let board_json = serde_json::to_string(outcome.board())?;
    let ts = Utc::now().to_rfc3339();
    sqlx::query(
        "INSERT INTO spins \
         (ts, client_seed, nonce, server_seed_hash, board_json, small_win, big_win, bonus) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(ts)
    .bind(client_seed)
    .bind(params.nonce)
    .bind(&params.server_seed_hash)
    .bind(board_json)
    .bind(outcome.small_win())
    .bind(outcome.big_win())
    .bind(outcome.bonus())
    .execute(pool)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn init_creates_params_once() {
        let db = connect("sqlite::memory:").await.unwrap();
        init_db(&db, 0.25).await.unwrap();
        let first = get_params(&db).await.unwrap();
        assert_eq!(first.nonce, 0);
        assert_eq!(first.bonus_probability, 0.25);
        assert_eq!(first.server_seed_hash, derive_hash_hex(first.server_seed.as_bytes()));

        init_db(&db, 0.5).await.unwrap();
        let second = get_params(&db).await.unwrap();
        assert_eq!(second.server_seed, first.server_seed);
        assert_eq!(second.bonus_probability, 0.25);
    }

    #[tokio::test]
    async fn nonces_increase() {
        let db = connect("sqlite::memory:").await.unwrap();
        init_db(&db, 0.1).await.unwrap();
        assert_eq!(next_nonce(&db).await.unwrap().nonce, 1);
        assert_eq!(next_nonce(&db).await.unwrap().nonce, 2);
        assert_eq!(get_params(&db).await.unwrap().nonce, 2);
    }
}
