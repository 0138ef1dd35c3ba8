pub mod auth;
pub mod leaderboard;
pub mod live;
pub mod matches;
