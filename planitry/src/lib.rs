//! Planitry library
//!
//! Local persistence for the ingredient inventory, grocery list and saved
//! recipes, plus the client for the recipe search API.

pub mod app;
pub mod config;
pub mod database;
pub mod error;
pub mod models;
pub mod services;
pub mod storage;

pub use app::AppState;
pub use error::{AppError, NetworkError, Result};
