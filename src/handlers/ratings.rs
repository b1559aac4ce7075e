use crate::error::AppError;
use crate::models::leaderboard::LeaderboardPath;
use crate::services::{leaderboard, player};
use crate::state::AppState;
use ntex::web::{self, HttpResponse};
use std::sync::Arc;

pub async fn get_leaderboard(
    state: web::types::State<Arc<AppState>>,
    path: web::types::Path<LeaderboardPath>,
) -> Result<HttpResponse, AppError> {
    let page = leaderboard::get_leaderboard(&state, &path.gametype, path.page)?;
    Ok(HttpResponse::Ok().json(&page))
}

pub async fn get_player(
    state: web::types::State<Arc<AppState>>,
    path: web::types::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let steam_id = path.into_inner();
    let profile = player::get_player_profile(&state, steam_id)?;
    Ok(HttpResponse::Ok().json(&profile))
}

pub async fn get_balance(
    state: web::types::State<Arc<AppState>>,
    path: web::types::Path<String>,
) -> Result<HttpResponse, AppError> {
    let steam_ids = player::parse_steam_ids(&path.into_inner())?;
    let ratings = player::get_for_balance_plugin(&state, &steam_ids)?;
    Ok(HttpResponse::Ok().json(&ratings))
}
