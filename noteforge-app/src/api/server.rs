use axum::{
    routing::{get, post},
    Router,
};
use noteforge_core::{Forge, Settings};
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::routes::{
    generate, list_notes, list_sets, mark_mastered, public_set, reforge, set_cards, set_progress,
    AppState,
};

pub fn router(forge: Arc<Forge>, settings: Settings) -> Router {
    let state = Arc::new(AppState { forge, settings });

    Router::new()
        .route("/notes", get(list_notes))
        .route("/notes/:id/generate", post(generate))
        .route("/sets", get(list_sets))
        .route("/sets/:id/cards", get(set_cards))
        .route("/sets/:id/progress", get(set_progress))
        .route("/sets/:id/reforge", post(reforge))
        .route("/cards/:id/mastered", post(mark_mastered))
        .route("/public/sets/:id", get(public_set))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

pub async fn run(forge: Arc<Forge>, settings: Settings, addr: SocketAddr) -> anyhow::Result<()> {
    let app = router(forge, settings);
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "api listening");
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
