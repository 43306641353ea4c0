pub mod analyze;
pub mod cli;
pub mod config;
pub mod core;
pub mod engine;
pub mod exit;
pub mod identity;
pub mod logs;
pub mod platform;
pub mod report;
pub mod ui;
