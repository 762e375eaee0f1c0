pub mod db;
pub mod error;
pub mod game_question;
pub mod handlers;
pub mod hints;
pub mod memory;
pub mod models;
pub mod prize;
pub mod service;
pub mod session;
pub mod store;
