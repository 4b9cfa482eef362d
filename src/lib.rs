pub mod ai;
pub mod chat;
pub mod config;
pub mod locale;
pub mod session;
pub mod types;
pub mod ui;
