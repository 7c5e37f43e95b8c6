use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use axum_extra::TypedHeader;
use pokeslot_core::{GeneratorConfig, OutcomeGenerator, ProvablyFairRng};
use pokeslot_shared::{AdminSetParamsRequest, SpinQuery, SpinResponse, VerifyResponse};
use sqlx::SqlitePool;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{debug, error, info};

use crate::db;

/// Static layout consumed by the rendering front-end.
pub const GUI_LAYOUT: &str = include_str!("../resources/gui.json");

const DEFAULT_CLIENT_SEED: &str = "anonymous";

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub api_key: String,
    /// Board shape and symbol count; the bonus probability comes from the db.
    pub generator: GeneratorConfig,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/spin", get(route_spin).post(route_spin))
        .route("/GUI", get(route_gui))
        .route("/verify", get(route_verify))
        .route("/admin/set-params", post(route_admin_set_params))
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

fn internal(err: impl std::fmt::Display) -> StatusCode {
    error!(%err, "request failed");
    StatusCode::INTERNAL_SERVER_ERROR
}

async fn route_spin(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SpinQuery>,
) -> Result<Json<SpinResponse>, StatusCode> {
    let client_seed = query
        .client_seed
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_CLIENT_SEED.to_string());
    let params = db::next_nonce(&state.db).await.map_err(internal)?;

    let config = GeneratorConfig {
        bonus_probability: params.bonus_probability,
        ..state.generator.clone()
    };
    let rng = ProvablyFairRng::new(&params.server_seed, &client_seed, params.nonce as u64);
    let mut generator = OutcomeGenerator::new(config, rng.stream()).map_err(internal)?;
    let outcome = generator.generate();

    db::log_spin(&state.db, &client_seed, &params, &outcome)
        .await
        .map_err(internal)?;
    debug!(
        nonce = params.nonce,
        small_win = outcome.small_win(),
        big_win = outcome.big_win(),
        bonus = outcome.bonus(),
        "outcome generated"
    );

    Ok(Json(SpinResponse::from(outcome)))
}

async fn route_gui() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/json")], GUI_LAYOUT)
}

async fn route_verify(
    State(state): State<Arc<AppState>>,
) -> Result<Json<VerifyResponse>, StatusCode> {
    let p = db::get_params(&state.db).await.map_err(internal)?;
    Ok(Json(VerifyResponse {
        server_seed_hash: p.server_seed_hash,
    }))
}

async fn route_admin_set_params(
    State(state): State<Arc<AppState>>,
    TypedHeader(axum_extra::headers::Authorization(bearer)): TypedHeader<
        axum_extra::headers::Authorization<axum_extra::headers::authorization::Bearer>,
    >,
    Json(req): Json<AdminSetParamsRequest>,
) -> Result<StatusCode, StatusCode> {
    if bearer.token() != state.api_key {
        return Err(StatusCode::UNAUTHORIZED);
    }
    if !(0.0..=1.0).contains(&req.bonus_probability) {
        return Err(StatusCode::BAD_REQUEST);
    }
    db::set_bonus_probability(&state.db, req.bonus_probability)
        .await
        .map_err(internal)?;
    info!(bonus_probability = req.bonus_probability, "params updated");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::Request,
    };
    use pokeslot_core::{verify_outcome, Outcome};
    use tower::ServiceExt;

    async fn app() -> (Router, SqlitePool) {
        let db = db::connect("sqlite::memory:").await.unwrap();
        db::init_db(&db, 0.1).await.unwrap();
        let state = Arc::new(AppState {
            db: db.clone(),
            api_key: "test-key".into(),
            generator: GeneratorConfig::default(),
        });
        (router(state), db)
    }

    async fn body_json<T: serde::de::DeserializeOwned>(resp: axum::response::Response) -> T {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn set_params(token: &str, p: f64) -> Request<Body> {
        Request::post("/admin/set-params")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(format!(r#"{{"bonus_probability": {p}}}"#)))
            .unwrap()
    }

    #[tokio::test]
    async fn spin_returns_valid_outcome_on_get_and_post() {
        let (app, _db) = app().await;
        for method in ["GET", "POST"] {
            let req = Request::builder()
                .method(method)
                .uri("/spin")
                .body(Body::empty())
                .unwrap();
            let resp = app.clone().oneshot(req).await.unwrap();
            assert_eq!(resp.status(), StatusCode::OK);
            let body: SpinResponse = body_json(resp).await;
            assert_eq!(body.board.len(), 1);
            assert_eq!(body.board[0].len(), 3);
            assert!(body.board[0].iter().all(|c| (1..=6).contains(c)));
            Outcome::try_from(body).expect("classification consistent");
        }
    }

    #[tokio::test]
    async fn spins_are_logged_and_verifiable() {
        let (app, db) = app().await;
        let resp = app
            .oneshot(
                Request::get("/spin?client_seed=alice")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body: SpinResponse = body_json(resp).await;
        let outcome = Outcome::try_from(body).unwrap();

        let params = db::get_params(&db).await.unwrap();
        assert_eq!(params.nonce, 1);
        let config = GeneratorConfig {
            bonus_probability: params.bonus_probability,
            ..Default::default()
        };
        assert!(verify_outcome(&params.server_seed, "alice", 1, &config, &outcome));

        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM spins WHERE client_seed = 'alice'")
                .fetch_one(&db)
                .await
                .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn gui_layout_is_served_verbatim() {
        let (app, _db) = app().await;
        let resp = app
            .oneshot(Request::get("/GUI").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
        let served: serde_json::Value = body_json(resp).await;
        let expected: serde_json::Value = serde_json::from_str(GUI_LAYOUT).unwrap();
        assert_eq!(served, expected);
    }

    #[tokio::test]
    async fn verify_reports_seed_hash() {
        let (app, db) = app().await;
        let resp = app
            .oneshot(Request::get("/verify").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body: VerifyResponse = body_json(resp).await;
        assert_eq!(
            body.server_seed_hash,
            db::get_params(&db).await.unwrap().server_seed_hash
        );
    }

    #[tokio::test]
    async fn admin_requires_token_and_valid_probability() {
        let (app, _db) = app().await;
        let resp = app.clone().oneshot(set_params("wrong", 0.5)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let resp = app.clone().oneshot(set_params("test-key", 1.5)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn admin_probability_drives_bonus() {
        let (app, _db) = app().await;
        let resp = app.clone().oneshot(set_params("test-key", 1.0)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        for _ in 0..10 {
            let resp = app
                .clone()
                .oneshot(Request::get("/spin").body(Body::empty()).unwrap())
                .await
                .unwrap();
            let body: SpinResponse = body_json(resp).await;
            assert!(body.bonus);
        }

        app.clone().oneshot(set_params("test-key", 0.0)).await.unwrap();
        for _ in 0..10 {
            let resp = app
                .clone()
                .oneshot(Request::get("/spin").body(Body::empty()).unwrap())
                .await
                .unwrap();
            let body: SpinResponse = body_json(resp).await;
            assert!(!body.bonus);
        }
    }
}
