// src/lib.rs

//! Imoview to RD Station sync library

pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod utils;
