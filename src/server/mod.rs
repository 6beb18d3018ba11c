use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::store::{League, LeagueStore, PlayerStore, StoreError};

/// Build the full router: score lookup, win recording and the league table.
pub fn router(store: Arc<dyn PlayerStore>) -> Router {
    Router::new()
        .route(
            "/players/:name",
            get(show_score::<dyn PlayerStore>).post(process_win),
        )
        .route("/league", get(league_handler::<dyn PlayerStore>))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(store)
}

/// Build a router for stores that cannot record wins. `POST /players/:name`
/// answers 405.
pub fn read_only_router(store: Arc<dyn LeagueStore>) -> Router {
    Router::new()
        .route("/players/:name", get(show_score::<dyn LeagueStore>))
        .route("/league", get(league_handler::<dyn LeagueStore>))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(store)
}

/// GET /players/:name
async fn show_score<S>(State(store): State<Arc<S>>, Path(name): Path<String>) -> Response
where
    S: LeagueStore + ?Sized,
{
    match store.get_player_score(&name).await {
        Ok(Some(score)) => (StatusCode::OK, score.to_string()).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "0").into_response(),
        Err(e) => storage_failure(e).into_response(),
    }
}

/// POST /players/:name
async fn process_win(
    State(store): State<Arc<dyn PlayerStore>>,
    Path(name): Path<String>,
) -> Result<StatusCode, (StatusCode, String)> {
    store
        .record_win(&name)
        .await
        .map(|_| StatusCode::ACCEPTED)
        .map_err(storage_failure)
}

/// GET /league
async fn league_handler<S>(
    State(store): State<Arc<S>>,
) -> Result<Json<League>, (StatusCode, String)>
where
    S: LeagueStore + ?Sized,
{
    store.get_league().await.map(Json).map_err(storage_failure)
}

async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

fn storage_failure(e: StoreError) -> (StatusCode, String) {
    let message = e.to_string();
    error!("Storage failure: {:#}", anyhow::Error::from(e));
    (StatusCode::INTERNAL_SERVER_ERROR, message)
}
