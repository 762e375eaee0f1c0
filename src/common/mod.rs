pub mod app_state;
pub mod error;
pub mod models;
