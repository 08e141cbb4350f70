// src/lib.rs

//! Prediction index builder and browsing client runtime

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod notify;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
