use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Key/value pairs accumulated for one team or one player.
pub type StanzaBlock = BTreeMap<String, String>;

/// Structured form of one end-of-match report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchReport {
    #[serde(rename = "game_meta")]
    pub meta: BTreeMap<String, String>,
    #[serde(default)]
    pub teams: Vec<StanzaBlock>,
    #[serde(default)]
    pub players: Vec<StanzaBlock>,
}

impl MatchReport {
    pub fn meta(&self, key: &str) -> Option<&str> {
        self.meta.get(key).map(String::as_str)
    }
}

/// What the ingest endpoint accepts: raw report text or a report that was
/// already parsed upstream.
#[derive(Debug, Clone)]
pub enum ReportInput {
    Raw(String),
    Parsed(MatchReport),
}

#[derive(Debug, Serialize)]
pub struct SubmissionResult {
    pub ok: bool,
    pub message: String,
    pub match_id: Option<String>,
}
