pub mod leaderboard;
pub mod player;
pub mod rating;
pub mod scoreboard;
pub mod submission;
