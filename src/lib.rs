// src/lib.rs

//! pressping: press release watcher library

pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod utils;
