use crate::error::AppError;
use crate::models::player::*;
use crate::services::rating::{round2, RATING_WINDOW};
use crate::state::AppState;
use rusqlite::{params, OptionalExtension};
use std::collections::BTreeMap;

pub fn get_player_profile(state: &AppState, steam_id: i64) -> Result<PlayerProfileResponse, AppError> {
    state.db.with_conn(|conn| {
        let (name, model): (String, String) = conn
            .query_row(
                "SELECT name, model FROM players WHERE steam_id = ?1",
                params![steam_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?
            .ok_or_else(|| AppError::NotFound("player not found".into()))?;

        let mut ratings = BTreeMap::new();
        for (gametype, gametype_id) in &state.vocabulary.gametypes {
            let current: Option<(Option<f64>, i64)> = conn
                .query_row(
                    "SELECT rating, n FROM gametype_ratings WHERE steam_id = ?1 AND gametype_id = ?2",
                    params![steam_id, gametype_id],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;
            let Some((rating, n)) = current else {
                continue;
            };

            let mut stmt = conn.prepare(
                "SELECT match_id, timestamp, old_rating FROM (
                     SELECT m.match_id, m.timestamp, s.old_rating
                     FROM matches m
                     JOIN scoreboards s ON s.match_id = m.match_id
                     WHERE s.old_rating IS NOT NULL AND s.steam_id = ?1 AND m.gametype_id = ?2
                     ORDER BY m.timestamp DESC
                     LIMIT ?3
                 ) ORDER BY timestamp ASC",
            )?;
            let rows = stmt.query_map(params![steam_id, gametype_id, RATING_WINDOW], |row| {
                Ok(HistoryEntry {
                    match_id: row.get(0)?,
                    timestamp: row.get(1)?,
                    rating: round2(row.get(2)?),
                })
            })?;
            let mut history = Vec::new();
            for row in rows {
                history.push(row?);
            }

            ratings.insert(
                gametype.clone(),
                GametypeRating {
                    rating: rating.map(round2),
                    n,
                    history,
                },
            );
        }

        Ok(PlayerProfileResponse {
            ok: true,
            player: PlayerProfile {
                id: steam_id.to_string(),
                name,
                model,
                ratings,
            },
        })
    })
}

/// Ratings of the given players in the shape the server balance plugin reads.
pub fn get_for_balance_plugin(state: &AppState, steam_ids: &[i64]) -> Result<BalanceResponse, AppError> {
    state.db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT gt.gametype_short, gr.rating, gr.n
             FROM gametype_ratings gr
             JOIN gametypes gt ON gt.gametype_id = gr.gametype_id
             WHERE gr.steam_id = ?1 AND gr.rating IS NOT NULL",
        )?;

        let mut players = Vec::new();
        for steam_id in steam_ids {
            let rows = stmt.query_map(params![steam_id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?, row.get::<_, i64>(2)?))
            })?;
            let mut ratings = BTreeMap::new();
            for row in rows {
                let (gametype, rating, n) = row?;
                ratings.insert(
                    gametype,
                    BalanceRating {
                        games: n,
                        elo: round2(rating),
                    },
                );
            }
            if !ratings.is_empty() {
                players.push(BalancePlayer {
                    steamid: steam_id.to_string(),
                    ratings,
                });
            }
        }

        Ok(BalanceResponse {
            ok: true,
            players,
            deactivated: Vec::new(),
        })
    })
}

/// Parses the `id+id+id` list used by the balance endpoint.
pub fn parse_steam_ids(raw: &str) -> Result<Vec<i64>, AppError> {
    let mut ids = Vec::new();
    for part in raw.split('+').filter(|part| !part.is_empty()) {
        let id: i64 = part
            .trim()
            .parse()
            .map_err(|_| AppError::BadRequest(format!("invalid steam id: {}", part)))?;
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    Ok(ids)
}
