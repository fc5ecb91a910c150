pub mod api;
pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod content;
pub mod database;
pub mod error;
pub mod files;
pub mod posts;
pub mod social;
pub mod telemetry;
pub mod users;
pub mod utils;
