pub mod api;
pub mod app_state;
pub mod config;
pub mod db;
pub mod middleware;
pub mod services;
pub mod utils;
