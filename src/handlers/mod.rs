pub mod ratings;
pub mod scoreboard;
pub mod submission;
