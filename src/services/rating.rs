//! Folds scored matches into rolling per-gametype player ratings.

use crate::db::Db;
use crate::error::{expect_one_row, AppError};
use rusqlite::{params, Connection};

/// Number of most recent rated matches averaged into a rating.
pub const RATING_WINDOW: i64 = 50;

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Current rating of a player, creating an unrated row on first sight.
fn player_rating(conn: &Connection, steam_id: i64, gametype_id: i64) -> Result<Option<f64>, AppError> {
    conn.execute(
        "INSERT INTO gametype_ratings (steam_id, gametype_id, rating, n) VALUES (?1, ?2, NULL, 0)
         ON CONFLICT (steam_id, gametype_id) DO NOTHING",
        params![steam_id, gametype_id],
    )?;
    Ok(conn.query_row(
        "SELECT rating FROM gametype_ratings WHERE steam_id = ?1 AND gametype_id = ?2",
        params![steam_id, gametype_id],
        |row| row.get(0),
    )?)
}

fn window_average(conn: &Connection, steam_id: i64, gametype_id: i64, match_id: &str) -> Result<f64, AppError> {
    let average: Option<f64> = conn.query_row(
        "SELECT AVG(rating) FROM (
             SELECT s.match_rating AS rating
             FROM matches m
             JOIN scoreboards s ON s.match_id = m.match_id
             WHERE s.steam_id = ?1
               AND m.gametype_id = ?2
               AND (m.post_processed = 1 OR m.match_id = ?3)
               AND s.match_rating IS NOT NULL
             ORDER BY m.timestamp DESC
             LIMIT ?4
         )",
        params![steam_id, gametype_id, match_id, RATING_WINDOW],
        |row| row.get(0),
    )?;
    average.ok_or_else(|| {
        AppError::Consistency(format!(
            "no rated matches in window for player {} in match {}",
            steam_id, match_id
        ))
    })
}

/// Updates the rating of every rated participant of `match_id` and marks the
/// match post-processed. Must run inside the caller's transaction; any error
/// leaves it to be rolled back.
pub fn post_process(conn: &Connection, match_id: &str, gametype_id: i64) -> Result<(), AppError> {
    let mut stmt = conn.prepare(
        "SELECT steam_id, team, match_rating FROM scoreboards
         WHERE match_rating IS NOT NULL AND match_id = ?1",
    )?;
    let rows = stmt.query_map(params![match_id], |row| {
        Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?, row.get::<_, f64>(2)?))
    })?;
    let mut scored = Vec::new();
    for row in rows {
        scored.push(row?);
    }

    for (steam_id, team, match_rating) in scored {
        let old_rating = player_rating(conn, steam_id, gametype_id)?;

        let affected = conn.execute(
            "UPDATE scoreboards SET old_rating = ?1 WHERE match_id = ?2 AND steam_id = ?3 AND team = ?4",
            params![old_rating, match_id, steam_id, team],
        )?;
        expect_one_row(affected, "recording old rating")?;

        let new_rating = match old_rating {
            None => round2(match_rating),
            Some(_) => window_average(conn, steam_id, gametype_id, match_id)?,
        };

        let affected = conn.execute(
            "UPDATE gametype_ratings SET rating = ?1, n = n + 1 WHERE steam_id = ?2 AND gametype_id = ?3",
            params![new_rating, steam_id, gametype_id],
        )?;
        expect_one_row(affected, "updating player rating")?;

        tracing::debug!(match_id, steam_id, ?old_rating, new_rating, "rating updated");
    }

    let affected = conn.execute(
        "UPDATE matches SET post_processed = 1 WHERE match_id = ?1 AND post_processed = 0",
        params![match_id],
    )?;
    expect_one_row(affected, "marking match post-processed")?;
    Ok(())
}

/// Matches still waiting for post-processing, oldest first.
pub fn pending_matches(conn: &Connection) -> Result<Vec<(String, i64, i64)>, AppError> {
    let mut stmt = conn.prepare(
        "SELECT match_id, gametype_id, timestamp FROM matches
         WHERE post_processed = 0 ORDER BY timestamp ASC",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?, row.get::<_, i64>(2)?))
    })?;

    let mut pending = Vec::new();
    for row in rows {
        pending.push(row?);
    }
    Ok(pending)
}

/// Post-processes every pending match in chronological order, committing
/// each one separately so an interrupted run resumes where it stopped.
pub fn backfill(db: &Db) -> Result<usize, AppError> {
    let pending = db.with_conn(pending_matches)?;
    if pending.is_empty() {
        return Ok(0);
    }
    tracing::info!(count = pending.len(), "post-processing pending matches");

    for (match_id, gametype_id, timestamp) in &pending {
        let started = chrono::DateTime::from_timestamp(*timestamp, 0)
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| timestamp.to_string());
        tracing::info!(match_id = %match_id, started = %started, "running post process");
        db.with_tx(|tx| post_process(tx, match_id, *gametype_id))?;
    }
    Ok(pending.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::OptionalExtension;

    const CTF: i64 = 2;

    fn is_post_processed(conn: &Connection, match_id: &str) -> Result<Option<bool>, AppError> {
        Ok(conn
            .query_row(
                "SELECT post_processed FROM matches WHERE match_id = ?1",
                params![match_id],
                |row| row.get::<_, i64>(0),
            )
            .optional()?
            .map(|flag| flag != 0))
    }

    fn seed_player(conn: &Connection, steam_id: i64) {
        conn.execute(
            "INSERT OR IGNORE INTO players (steam_id, name, model) VALUES (?1, 'p', 'sarge')",
            params![steam_id],
        )
        .unwrap();
    }

    fn seed_match(conn: &Connection, match_id: &str, timestamp: i64, ratings: &[(i64, Option<f64>)]) {
        conn.execute("INSERT OR IGNORE INTO maps (map_id, map_name) VALUES (1, 'campgrounds')", [])
            .unwrap();
        conn.execute("INSERT OR IGNORE INTO factories (factory_id, factory_short) VALUES (1, 'ctf')", [])
            .unwrap();
        conn.execute(
            "INSERT INTO matches (match_id, gametype_id, factory_id, map_id, timestamp, duration)
             VALUES (?1, ?2, 1, 1, ?3, 1200)",
            params![match_id, CTF, timestamp],
        )
        .unwrap();
        for (steam_id, rating) in ratings {
            seed_player(conn, *steam_id);
            conn.execute(
                "INSERT INTO scoreboards (match_id, steam_id, team, match_rating, alive_time)
                 VALUES (?1, ?2, 1, ?3, 1200)",
                params![match_id, steam_id, rating],
            )
            .unwrap();
        }
    }

    fn rating_of(conn: &Connection, steam_id: i64) -> (Option<f64>, i64) {
        conn.query_row(
            "SELECT rating, n FROM gametype_ratings WHERE steam_id = ?1 AND gametype_id = ?2",
            params![steam_id, CTF],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap()
    }

    #[test]
    fn test_first_match_sets_rating() {
        let db = Db::open_in_memory().unwrap();
        db.with_tx(|tx| {
            seed_match(tx, "m1", 100, &[(1, Some(60.0)), (2, None)]);
            post_process(tx, "m1", CTF)
        })
        .unwrap();

        db.with_conn(|conn| {
            assert_eq!(rating_of(conn, 1), (Some(60.0), 1));
            let unrated: i64 = conn.query_row(
                "SELECT COUNT(*) FROM gametype_ratings WHERE steam_id = 2",
                [],
                |row| row.get(0),
            )?;
            assert_eq!(unrated, 0);
            assert_eq!(is_post_processed(conn, "m1")?, Some(true));
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_second_match_averages_window() {
        let db = Db::open_in_memory().unwrap();
        db.with_tx(|tx| {
            seed_match(tx, "m1", 100, &[(1, Some(60.0))]);
            post_process(tx, "m1", CTF)?;
            seed_match(tx, "m2", 200, &[(1, Some(80.0))]);
            post_process(tx, "m2", CTF)
        })
        .unwrap();

        db.with_conn(|conn| {
            assert_eq!(rating_of(conn, 1), (Some(70.0), 2));
            let old: Option<f64> = conn.query_row(
                "SELECT old_rating FROM scoreboards WHERE match_id = 'm2' AND steam_id = 1",
                [],
                |row| row.get(0),
            )?;
            assert_eq!(old, Some(60.0));
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_pending_matches_stay_out_of_window() {
        let db = Db::open_in_memory().unwrap();
        db.with_tx(|tx| {
            seed_match(tx, "m1", 100, &[(1, Some(60.0))]);
            post_process(tx, "m1", CTF)?;
            // m2 is newer but never post-processed
            seed_match(tx, "m2", 300, &[(1, Some(1000.0))]);
            seed_match(tx, "m3", 200, &[(1, Some(80.0))]);
            post_process(tx, "m3", CTF)
        })
        .unwrap();

        db.with_conn(|conn| {
            assert_eq!(rating_of(conn, 1), (Some(70.0), 2));
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_window_holds_fifty_matches() {
        let db = Db::open_in_memory().unwrap();
        db.with_tx(|tx| {
            seed_match(tx, "m0", 0, &[(1, Some(1000.0))]);
            post_process(tx, "m0", CTF)?;
            for i in 1..=50 {
                let id = format!("m{}", i);
                seed_match(tx, &id, i, &[(1, Some(10.0))]);
                post_process(tx, &id, CTF)?;
            }
            Ok(())
        })
        .unwrap();

        db.with_conn(|conn| {
            assert_eq!(rating_of(conn, 1), (Some(10.0), 51));
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_processing_twice_is_rejected() {
        let db = Db::open_in_memory().unwrap();
        db.with_tx(|tx| {
            seed_match(tx, "m1", 100, &[(1, Some(60.0))]);
            post_process(tx, "m1", CTF)
        })
        .unwrap();

        let again = db.with_tx(|tx| post_process(tx, "m1", CTF));
        assert!(matches!(again, Err(AppError::Consistency(_))));
        db.with_conn(|conn| {
            // the failed second pass was rolled back
            assert_eq!(rating_of(conn, 1), (Some(60.0), 1));
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_backfill_runs_in_chronological_order_and_skips_processed() {
        let db = Db::open_in_memory().unwrap();
        db.with_tx(|tx| {
            seed_match(tx, "late", 300, &[(1, Some(90.0))]);
            seed_match(tx, "early", 100, &[(1, Some(30.0))]);
            Ok(())
        })
        .unwrap();

        assert_eq!(backfill(&db).unwrap(), 2);
        db.with_conn(|conn| {
            assert_eq!(rating_of(conn, 1), (Some(60.0), 2));
            let first_old: Option<f64> = conn.query_row(
                "SELECT old_rating FROM scoreboards WHERE match_id = 'late'",
                [],
                |row| row.get(0),
            )?;
            assert_eq!(first_old, Some(30.0));
            Ok(())
        })
        .unwrap();

        assert_eq!(backfill(&db).unwrap(), 0);
        db.with_conn(|conn| {
            assert_eq!(rating_of(conn, 1), (Some(60.0), 2));
            Ok(())
        })
        .unwrap();
    }
}
