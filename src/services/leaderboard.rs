use crate::error::AppError;
use crate::models::leaderboard::*;
use crate::state::AppState;
use crate::validation;
use rusqlite::params;

/// Players need this many rated matches in a gametype to be ranked.
pub const MIN_RATED_MATCHES: i64 = 10;

fn with_default_skin(model: String) -> String {
    if model.contains('/') {
        model
    } else {
        format!("{}/default", model)
    }
}

pub fn get_leaderboard(state: &AppState, gametype: &str, page: i64) -> Result<LeaderboardPage, AppError> {
    let gametype_id = state
        .vocabulary
        .gametype_id(gametype)
        .ok_or_else(|| AppError::Rejected(format!("gametype is not supported: {}", gametype)))?;
    let page = validation::validate_page(page)?;
    let per_page = state.settings.player_count_per_page;
    let offset = per_page
        .checked_mul(page)
        .filter(|offset| *offset < i64::MAX)
        .ok_or_else(|| AppError::BadRequest(format!("page out of range: {}", page)))?;

    state.db.with_conn(|conn| {
        let eligible: i64 = conn.query_row(
            "SELECT COUNT(*) FROM gametype_ratings WHERE gametype_id = ?1 AND n >= ?2",
            params![gametype_id, MIN_RATED_MATCHES],
            |row| row.get(0),
        )?;

        let mut stmt = conn.prepare(
            "SELECT p.steam_id, p.name, p.model, gr.rating, gr.n
             FROM gametype_ratings gr
             JOIN players p ON p.steam_id = gr.steam_id
             WHERE gr.gametype_id = ?1 AND gr.n >= ?2
             ORDER BY gr.rating DESC
             LIMIT ?3 OFFSET ?4",
        )?;
        let rows = stmt.query_map(
            params![gametype_id, MIN_RATED_MATCHES, per_page, offset],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, f64>(3)?,
                    row.get::<_, i64>(4)?,
                ))
            },
        )?;

        let mut response = Vec::new();
        let mut rank = offset + 1;
        for row in rows {
            let (steam_id, name, model, rating, n) = row?;
            response.push(LeaderboardEntry {
                id: steam_id.to_string(),
                name,
                model: with_default_skin(model),
                rating,
                n,
                rank,
            });
            rank += 1;
        }

        Ok(LeaderboardPage {
            ok: true,
            response,
            page_count: (eligible + per_page - 1) / per_page,
        })
    })
}
