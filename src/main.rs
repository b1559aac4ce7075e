mod classify;
mod config;
mod db;
mod error;
mod handlers;
mod models;
mod performance;
mod services;
mod stanza;
mod state;
mod validation;
mod vocabulary;

use clap::Parser;
use config::Config;
use db::Db;
use ntex::web;
use ntex_cors::Cors;
use state::AppState;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[ntex::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "match_ratings=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::parse();
    let db = Db::open(&config.database_path).map_err(std::io::Error::other)?;
    let state = Arc::new(AppState::new(db, config.settings()).map_err(std::io::Error::other)?);
    tracing::info!(
        gametypes = state.vocabulary.gametypes.len(),
        weapons = state.vocabulary.weapons.len(),
        medals = state.vocabulary.medals.len(),
        "vocabulary loaded"
    );

    // Stale ratings must not be served, so a failed backfill aborts startup.
    if state.settings.run_post_process {
        let processed = services::rating::backfill(&state.db).map_err(std::io::Error::other)?;
        tracing::info!(processed, "backfill finished");
    }

    tracing::info!(host = %config.host, port = config.port, "match rating server starting");

    web::HttpServer::new(move || {
        web::App::new()
            .state(state.clone())
            .wrap(
                Cors::new()
                    .allowed_origin("*")
                    .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                    .allowed_headers(vec!["Content-Type"])
                    .max_age(3600)
                    .finish(),
            )
            .route("/api/health", web::get().to(health))
            // Ingest
            .route("/api/submit", web::post().to(handlers::submission::submit_report))
            .route("/api/submit/parsed", web::post().to(handlers::submission::submit_parsed_report))
            // Ratings
            .route("/api/ratings/{gametype}/{page}", web::get().to(handlers::ratings::get_leaderboard))
            .route("/api/player/{steam_id}", web::get().to(handlers::ratings::get_player))
            .route("/api/balance/{ids}", web::get().to(handlers::ratings::get_balance))
            // Matches
            .route("/api/scoreboard/{match_id}", web::get().to(handlers::scoreboard::get_scoreboard))
    })
    .bind(format!("{}:{}", config.host, config.port))?
    .run()
    .await
}

async fn health() -> web::HttpResponse {
    web::HttpResponse::Ok().json(&serde_json::json!({
        "ok": true,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
