use crate::config::Settings;
use crate::db::Db;
use crate::vocabulary::Vocabulary;

pub struct AppState {
    pub db: Db,
    pub vocabulary: Vocabulary,
    pub settings: Settings,
}

impl AppState {
    pub fn new(db: Db, settings: Settings) -> Result<Self, crate::error::AppError> {
        let vocabulary = db.with_conn(Vocabulary::load)?;
        Ok(AppState {
            db,
            vocabulary,
            settings,
        })
    }
}
