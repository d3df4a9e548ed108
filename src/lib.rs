// src/lib.rs

pub mod auth;
pub mod blog;
pub mod cache;
pub mod config;
pub mod errors;
pub mod server;
pub mod storage;
pub mod users;
