pub mod account;
pub mod active_session;
pub mod create_session;
pub mod dashboard;
pub mod debug;
pub mod history;
pub mod leaderboard;
pub mod login;
pub mod settings;
pub mod signup;
