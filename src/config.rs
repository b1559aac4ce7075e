use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "match-ratings",
    about = "Ingests end-of-match reports and serves per-gametype player ratings"
)]
pub struct Config {
    /// SQLite database file
    #[arg(long, env = "DATABASE_PATH", default_value = "ratings.db")]
    pub database_path: String,

    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "PORT", default_value_t = 3001)]
    pub port: u16,

    /// Fold submitted matches into ratings right away. When off, matches are
    /// stored as pending and picked up by the next startup backfill with this
    /// switched on.
    #[arg(
        long,
        env = "RUN_POST_PROCESS",
        default_value_t = true,
        action = clap::ArgAction::Set
    )]
    pub run_post_process: bool,

    /// Leaderboard page size
    #[arg(long, env = "PLAYER_COUNT_PER_PAGE", default_value_t = 10, value_parser = clap::value_parser!(i64).range(1..))]
    pub player_count_per_page: i64,

    /// Largest accepted submission body, in bytes
    #[arg(long, env = "MAX_REPORT_SIZE", default_value_t = 1024 * 1024, value_parser = clap::value_parser!(u64).range(1..))]
    pub max_report_size: u64,
}

/// Runtime policy shared with request handlers.
#[derive(Debug, Clone, Copy)]
pub struct Settings {
    pub run_post_process: bool,
    pub player_count_per_page: i64,
    pub max_report_size: usize,
}

impl Config {
    pub fn settings(&self) -> Settings {
        Settings {
            run_post_process: self.run_post_process,
            player_count_per_page: self.player_count_per_page,
            max_report_size: usize::try_from(self.max_report_size).unwrap_or(usize::MAX),
        }
    }
}
