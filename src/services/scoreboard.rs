use crate::error::AppError;
use crate::models::scoreboard::*;
use crate::state::AppState;
use rusqlite::{params, OptionalExtension};

pub fn get_scoreboard(state: &AppState, match_id: &str) -> Result<Scoreboard, AppError> {
    state.db.with_conn(|conn| {
        let summary = conn
            .query_row(
                "SELECT g.gametype_short, f.factory_short, mm.map_name,
                        m.team1_score, m.team2_score, m.timestamp, m.duration
                 FROM matches m
                 JOIN gametypes g ON g.gametype_id = m.gametype_id
                 JOIN factories f ON f.factory_id = m.factory_id
                 JOIN maps mm ON mm.map_id = m.map_id
                 WHERE m.match_id = ?1",
                params![match_id],
                |row| {
                    Ok(MatchSummary {
                        gametype: row.get(0)?,
                        factory: row.get(1)?,
                        map: row.get(2)?,
                        team1_score: row.get(3)?,
                        team2_score: row.get(4)?,
                        timestamp: row.get(5)?,
                        duration: row.get(6)?,
                    })
                },
            )
            .optional()?
            .ok_or_else(|| AppError::NotFound("match not found".into()))?;

        let mut player_stats = PlayerStatsTables::default();

        // A player who switched teams has one row per team; report the sums.
        let mut stmt = conn.prepare(
            "SELECT sw.steam_id, w.weapon_short, SUM(sw.frags), SUM(sw.hits), SUM(sw.shots)
             FROM scoreboards_weapons sw
             JOIN weapons w ON w.weapon_id = sw.weapon_id
             WHERE sw.match_id = ?1
             GROUP BY sw.steam_id, w.weapon_short",
        )?;
        let rows = stmt.query_map(params![match_id], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                [row.get::<_, i64>(2)?, row.get::<_, i64>(3)?, row.get::<_, i64>(4)?],
            ))
        })?;
        for row in rows {
            let (steam_id, weapon, totals) = row?;
            player_stats
                .weapons
                .entry(steam_id.to_string())
                .or_default()
                .insert(weapon, totals);
        }

        let mut stmt = conn.prepare(
            "SELECT sm.steam_id, md.medal_short, SUM(sm.count)
             FROM scoreboards_medals sm
             JOIN medals md ON md.medal_id = sm.medal_id
             WHERE sm.match_id = ?1
             GROUP BY sm.steam_id, md.medal_short",
        )?;
        let rows = stmt.query_map(params![match_id], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?, row.get::<_, i64>(2)?))
        })?;
        for row in rows {
            let (steam_id, medal, count) = row?;
            player_stats
                .medals
                .entry(steam_id.to_string())
                .or_default()
                .insert(medal, count);
        }

        Ok(Scoreboard {
            ok: true,
            summary,
            player_stats,
        })
    })
}
