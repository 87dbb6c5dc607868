pub mod config;
pub mod lifecycle;
pub mod logs;
pub mod status;
pub mod watch;
