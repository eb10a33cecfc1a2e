pub mod daily_stat;
pub mod login_session;
