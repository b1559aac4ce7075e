use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct LeaderboardEntry {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub model: String,
    pub rating: f64,
    pub n: i64,
    pub rank: i64,
}

#[derive(Debug, Serialize)]
pub struct LeaderboardPage {
    pub ok: bool,
    pub response: Vec<LeaderboardEntry>,
    pub page_count: i64,
}

#[derive(Debug, Deserialize)]
pub struct LeaderboardPath {
    pub gametype: String,
    pub page: i64,
}
