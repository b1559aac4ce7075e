//! Per-match performance score of a single player.

use crate::classify::INSTAGIB_MARKER;
use crate::error::AppError;
use crate::models::report::StanzaBlock;
use crate::validation::required_int;

/// Players alive for less than this many seconds are not rated.
pub const MIN_ALIVE_TIME_TO_RATE: i64 = 60 * 10;

/// Alive time the formulas are normalized to.
const REFERENCE_ALIVE_TIME: f64 = 1200.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gametype {
    AttackDefend,
    CaptureTheFlag,
    TeamDeathmatch,
}

impl Gametype {
    /// Resolves a gametype short code, instagib variants included, to the
    /// formula that scores it.
    pub fn from_short(short: &str) -> Result<Self, AppError> {
        let base = short.strip_prefix(INSTAGIB_MARKER).unwrap_or(short);
        match base {
            "ad" => Ok(Gametype::AttackDefend),
            "ctf" => Ok(Gametype::CaptureTheFlag),
            "tdm" => Ok(Gametype::TeamDeathmatch),
            _ => Err(AppError::Config(format!("no rating formula for gametype {}", short))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerStats {
    pub alive_time: i64,
    pub score: i64,
    pub damage_dealt: i64,
    pub damage_taken: i64,
    pub frags: i64,
    pub deaths: i64,
    pub captures: i64,
    pub win: bool,
}

impl PlayerStats {
    pub fn from_block(player: &StanzaBlock) -> Result<Self, AppError> {
        Ok(PlayerStats {
            alive_time: required_int(player, "alivetime")?,
            score: required_int(player, "scoreboard-score")?,
            damage_dealt: required_int(player, "scoreboard-pushes")?,
            damage_taken: required_int(player, "scoreboard-destroyed")?,
            frags: required_int(player, "scoreboard-kills")?,
            deaths: required_int(player, "scoreboard-deaths")?,
            captures: required_int(player, "medal-captures")?,
            win: player.contains_key("win"),
        })
    }
}

/// Returns `None` when the player was not alive long enough to be rated.
pub fn match_rating(gametype: Gametype, stats: &PlayerStats) -> Result<Option<f64>, AppError> {
    if stats.alive_time < MIN_ALIVE_TIME_TO_RATE {
        return Ok(None);
    }
    let time_factor = REFERENCE_ALIVE_TIME / stats.alive_time as f64;

    let dealt = stats.damage_dealt as f64;
    let taken = stats.damage_taken as f64;
    let frags = stats.frags as f64;

    let rating = match gametype {
        Gametype::AttackDefend => (dealt / 100.0 + frags + stats.captures as f64) * time_factor,
        Gametype::CaptureTheFlag => {
            if stats.damage_taken == 0 {
                return Err(AppError::Arithmetic(
                    "division by zero: player took no damage".into(),
                ));
            }
            let win = if stats.win { 1.0 } else { 0.0 };
            (dealt / taken * (stats.score as f64 + dealt / 20.0) * time_factor + win * 300.0) / 2.35
        }
        Gametype::TeamDeathmatch => {
            (0.5 * (frags - stats.deaths as f64) + 0.004 * (dealt - taken) + 0.003 * dealt)
                * time_factor
        }
    };
    Ok(Some(rating))
}
