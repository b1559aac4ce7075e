use crate::error::AppError;
use crate::services::scoreboard as service;
use crate::state::AppState;
use ntex::web::{self, HttpResponse};
use std::sync::Arc;

pub async fn get_scoreboard(
    state: web::types::State<Arc<AppState>>,
    path: web::types::Path<String>,
) -> Result<HttpResponse, AppError> {
    let match_id = path.into_inner();
    let scoreboard = service::get_scoreboard(&state, &match_id)?;
    Ok(HttpResponse::Ok().json(&scoreboard))
}
