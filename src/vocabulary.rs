use crate::error::AppError;
use rusqlite::Connection;
use std::collections::BTreeMap;

/// Closed reference vocabularies, short name to id. Loaded once at startup
/// and shared read-only.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    pub gametypes: BTreeMap<String, i64>,
    pub weapons: BTreeMap<String, i64>,
    pub medals: BTreeMap<String, i64>,
}

impl Vocabulary {
    pub fn load(conn: &Connection) -> Result<Self, AppError> {
        Ok(Vocabulary {
            gametypes: load_table(conn, "SELECT gametype_short, gametype_id FROM gametypes")?,
            weapons: load_table(conn, "SELECT weapon_short, weapon_id FROM weapons")?,
            medals: load_table(conn, "SELECT medal_short, medal_id FROM medals")?,
        })
    }

    pub fn gametype_id(&self, short: &str) -> Option<i64> {
        self.gametypes.get(short).copied()
    }
}

fn load_table(conn: &Connection, sql: &str) -> Result<BTreeMap<String, i64>, AppError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?;

    let mut table = BTreeMap::new();
    for row in rows {
        let (short, id) = row?;
        table.insert(short, id);
    }
    Ok(table)
}
