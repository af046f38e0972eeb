//! Mash Notes core library
//!
//! Note storage, attachment handling, search and statistics for the Mash
//! Notes journal. The binary and the integration tests drive it through
//! [`app::AppState`].

pub mod app;
pub mod config;
pub mod database;
pub mod error;
pub mod services;
