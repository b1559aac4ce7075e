use crate::classify;
use crate::error::AppError;
use crate::models::report::{MatchReport, ReportInput, StanzaBlock, SubmissionResult};
use crate::performance::{self, Gametype, PlayerStats};
use crate::services::rating;
use crate::stanza;
use crate::state::AppState;
use crate::validation::{self, optional_int, required_int, required_str};
use rusqlite::{params, Connection};

const TEAM_SCORE_KEYS: &[&str] = &["scoreboard-rounds", "scoreboard-caps", "scoreboard-score"];

enum Outcome {
    Stored { post_processed: bool },
    Rejected(String),
}

pub fn submit_match(state: &AppState, input: ReportInput) -> SubmissionResult {
    let mut report = match input {
        ReportInput::Raw(body) => stanza::parse(&body),
        ReportInput::Parsed(report) => report,
    };
    classify::classify(&mut report);
    let match_id = report.meta("I").map(str::to_string);

    match store_match(state, &report) {
        Ok(Outcome::Stored { post_processed }) => {
            tracing::info!(
                match_id = ?match_id,
                gametype = report.meta("G"),
                players = report.players.len(),
                post_processed,
                "match stored"
            );
            SubmissionResult {
                ok: true,
                message: if post_processed { "done" } else { "skipped post processing" }.into(),
                match_id,
            }
        }
        Ok(Outcome::Rejected(message)) => {
            tracing::warn!(match_id = ?match_id, %message, "match rejected");
            SubmissionResult {
                ok: false,
                message,
                match_id,
            }
        }
        Err(e) => {
            tracing::error!(match_id = ?match_id, error = %e, "match submission failed");
            SubmissionResult {
                ok: false,
                message: e.to_string(),
                match_id,
            }
        }
    }
}

/// Turns a stanza-format body into a submission input.
pub fn decode_raw(body: &[u8]) -> Result<ReportInput, SubmissionResult> {
    std::str::from_utf8(body)
        .map(|text| ReportInput::Raw(text.to_string()))
        .map_err(|e| rejected(format!("report is not valid UTF-8: {}", e)))
}

/// Turns a JSON-encoded `MatchReport` body into a submission input.
pub fn decode_parsed(body: &[u8]) -> Result<ReportInput, SubmissionResult> {
    serde_json::from_slice::<MatchReport>(body)
        .map(ReportInput::Parsed)
        .map_err(|e| rejected(format!("report is not a valid match report: {}", e)))
}

/// A failure that happened before the report could be read.
pub fn rejected(message: String) -> SubmissionResult {
    tracing::warn!(%message, "report rejected");
    SubmissionResult {
        ok: false,
        message,
        match_id: None,
    }
}

fn store_match(state: &AppState, report: &MatchReport) -> Result<Outcome, AppError> {
    let match_id = required_str(&report.meta, "I")?;
    let gametype_short = required_str(&report.meta, "G")?;

    let Some(gametype_id) = state.vocabulary.gametype_id(gametype_short) else {
        return Ok(Outcome::Rejected(format!(
            "gametype is not accepted: {}",
            gametype_short
        )));
    };
    let gametype = Gametype::from_short(gametype_short)?;

    let factory = required_str(&report.meta, "O")?;
    let map = required_str(&report.meta, "M")?.to_lowercase();
    let timestamp = required_int(&report.meta, "1")?;
    validation::validate_timestamp(timestamp)?;
    let duration = required_int(&report.meta, "D")?;
    let [team1_score, team2_score] = team_scores(&report.teams)?;
    let run_post_process = state.settings.run_post_process;

    state.db.with_tx(|tx| {
        let factory_id = factory_id(tx, factory)?;
        let map_id = map_id(tx, &map)?;

        // Rows start pending; only the rating updater flips the flag.
        tx.execute(
            "INSERT INTO matches (match_id, gametype_id, factory_id, map_id, timestamp, duration,
             team1_score, team2_score, post_processed)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0)",
            params![
                match_id,
                gametype_id,
                factory_id,
                map_id,
                timestamp,
                duration,
                team1_score,
                team2_score,
            ],
        )?;

        for player in &report.players {
            store_player(tx, state, match_id, gametype, player)?;
        }

        if run_post_process {
            rating::post_process(tx, match_id, gametype_id)?;
        }
        Ok(Outcome::Stored {
            post_processed: run_post_process,
        })
    })
}

/// Final score of each team. Each team stanza may carry any of the score
/// keys; the last one present wins.
fn team_scores(teams: &[StanzaBlock]) -> Result<[Option<i64>; 2], AppError> {
    let mut scores = [None, None];
    for team in teams {
        let index = validation::team_index(team)?;
        for key in TEAM_SCORE_KEYS {
            if let Some(score) = optional_int(team, key)? {
                scores[index] = Some(score);
            }
        }
    }
    Ok(scores)
}

fn store_player(
    conn: &Connection,
    state: &AppState,
    match_id: &str,
    gametype: Gametype,
    player: &StanzaBlock,
) -> Result<(), AppError> {
    let steam_id = required_int(player, "P")?;
    let team = optional_int(player, "t")?.unwrap_or(0);
    let name = required_str(player, "n")?;
    let model = required_str(player, "playermodel")?;

    conn.execute(
        "INSERT INTO players (steam_id, name, model) VALUES (?1, ?2, ?3)
         ON CONFLICT (steam_id) DO UPDATE SET name = excluded.name, model = excluded.model",
        params![steam_id, name, model],
    )?;

    let stats = PlayerStats::from_block(player)?;
    let match_rating = performance::match_rating(gametype, &stats)?;
    conn.execute(
        "INSERT INTO scoreboards (match_id, steam_id, match_rating, alive_time, team)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![match_id, steam_id, match_rating, stats.alive_time, team],
    )?;

    for (weapon, weapon_id) in &state.vocabulary.weapons {
        conn.execute(
            "INSERT INTO scoreboards_weapons (match_id, steam_id, team, weapon_id, frags, hits, shots)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                match_id,
                steam_id,
                team,
                weapon_id,
                required_int(player, &format!("acc-{}-frags", weapon))?,
                required_int(player, &format!("acc-{}-cnt-hit", weapon))?,
                required_int(player, &format!("acc-{}-cnt-fired", weapon))?,
            ],
        )?;
    }

    for (medal, medal_id) in &state.vocabulary.medals {
        conn.execute(
            "INSERT INTO scoreboards_medals (match_id, steam_id, team, medal_id, count)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                match_id,
                steam_id,
                team,
                medal_id,
                required_int(player, &format!("medal-{}", medal))?,
            ],
        )?;
    }
    Ok(())
}

fn factory_id(conn: &Connection, factory: &str) -> Result<i64, AppError> {
    Ok(conn.query_row(
        "INSERT INTO factories (factory_short) VALUES (?1)
         ON CONFLICT (factory_short) DO UPDATE SET factory_short = excluded.factory_short
         RETURNING factory_id",
        params![factory],
        |row| row.get(0),
    )?)
}

fn map_id(conn: &Connection, map: &str) -> Result<i64, AppError> {
    Ok(conn.query_row(
        "INSERT INTO maps (map_name) VALUES (?1)
         ON CONFLICT (map_name) DO UPDATE SET map_name = excluded.map_name
         RETURNING map_id",
        params![map],
        |row| row.get(0),
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Db;

    #[test]
    fn test_get_or_create_returns_same_id() {
        let db = Db::open_in_memory().unwrap();
        db.with_tx(|tx| {
            let first = map_id(tx, "campgrounds")?;
            let other = map_id(tx, "bloodrun")?;
            assert_eq!(map_id(tx, "campgrounds")?, first);
            assert_ne!(first, other);
            assert_eq!(factory_id(tx, "ctf")?, factory_id(tx, "ctf")?);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_team_scores_take_last_present_key() {
        let team = |pairs: &[(&str, &str)]| -> StanzaBlock {
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect()
        };
        let teams = vec![
            team(&[("Q", "team#2"), ("scoreboard-caps", "3"), ("scoreboard-score", "9")]),
            team(&[("Q", "team#1"), ("scoreboard-rounds", "4")]),
        ];
        assert_eq!(team_scores(&teams).unwrap(), [Some(4), Some(9)]);
        assert_eq!(team_scores(&[]).unwrap(), [None, None]);
    }

    #[test]
    fn test_decode_raw_rejects_invalid_utf8() {
        let result = decode_raw(b"I match\nG \xff\xfe").unwrap_err();
        assert!(!result.ok);
        assert!(result.message.starts_with("report is not valid UTF-8"));
        assert_eq!(result.match_id, None);

        let input = decode_raw(b"I match\nG ctf").unwrap();
        assert!(matches!(input, ReportInput::Raw(body) if body == "I match\nG ctf"));
    }

    #[test]
    fn test_decode_parsed_reports_malformed_json() {
        let result = decode_parsed(br#"{"game_meta": "#).unwrap_err();
        assert!(!result.ok);
        assert!(result.message.starts_with("report is not a valid match report"));

        let body = br#"{"game_meta": {"I": "m1", "G": "ctf"}, "teams": [], "players": [{"P": "7"}]}"#;
        match decode_parsed(body).unwrap() {
            ReportInput::Parsed(report) => {
                assert_eq!(report.meta("I"), Some("m1"));
                assert_eq!(report.players.len(), 1);
            }
            ReportInput::Raw(_) => panic!("expected a parsed report"),
        }
    }
}
