use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Serialize)]
pub struct HistoryEntry {
    pub match_id: String,
    pub timestamp: i64,
    pub rating: f64,
}

#[derive(Debug, Serialize)]
pub struct GametypeRating {
    pub rating: Option<f64>,
    pub n: i64,
    pub history: Vec<HistoryEntry>,
}

#[derive(Debug, Serialize)]
pub struct PlayerProfile {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub model: String,
    #[serde(flatten)]
    pub ratings: BTreeMap<String, GametypeRating>,
}

#[derive(Debug, Serialize)]
pub struct PlayerProfileResponse {
    pub ok: bool,
    pub player: PlayerProfile,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BalanceRating {
    pub games: i64,
    pub elo: f64,
}

#[derive(Debug, Serialize)]
pub struct BalancePlayer {
    pub steamid: String,
    #[serde(flatten)]
    pub ratings: BTreeMap<String, BalanceRating>,
}

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub ok: bool,
    pub players: Vec<BalancePlayer>,
    pub deactivated: Vec<String>,
}
