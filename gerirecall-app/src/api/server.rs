use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::routes::{
    add_card, delete_card, due_cards, export, get_card, new_cards, reset_card, review_card, stats,
    AppState,
};
use crate::SharedScheduler;

pub fn router(sched: SharedScheduler) -> Router {
    let state = AppState { sched };

    Router::new()
        .route("/cards", post(add_card))
        .route("/cards/due", get(due_cards))
        .route("/cards/new", get(new_cards))
        .route("/cards/:id", get(get_card).delete(delete_card))
        .route("/cards/:id/review", post(review_card))
        .route("/cards/:id/reset", post(reset_card))
        .route("/stats", get(stats))
        .route("/export", get(export))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

pub async fn run(sched: SharedScheduler, addr: SocketAddr) -> anyhow::Result<()> {
    let app = router(sched);
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "serving api");
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
