pub mod analyze;
pub mod commands;
pub mod config;
pub mod health;
pub mod models;
pub mod robot;
