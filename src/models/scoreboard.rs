use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Serialize)]
pub struct MatchSummary {
    pub gametype: String,
    pub factory: String,
    pub map: String,
    pub team1_score: Option<i64>,
    pub team2_score: Option<i64>,
    pub timestamp: i64,
    pub duration: i64,
}

#[derive(Debug, Default, Serialize)]
pub struct PlayerStatsTables {
    /// steam id -> weapon -> [frags, hits, shots]
    pub weapons: BTreeMap<String, BTreeMap<String, [i64; 3]>>,
    /// steam id -> medal -> count
    pub medals: BTreeMap<String, BTreeMap<String, i64>>,
}

#[derive(Debug, Serialize)]
pub struct Scoreboard {
    pub ok: bool,
    pub summary: MatchSummary,
    pub player_stats: PlayerStatsTables,
}
