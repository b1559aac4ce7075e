pub mod leaderboard;
pub mod player;
pub mod report;
pub mod scoreboard;
