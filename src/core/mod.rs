pub mod auth;
mod config;
pub mod db;

pub use config::{AppConfig, MAX_SESSION_TTL_HOURS};
