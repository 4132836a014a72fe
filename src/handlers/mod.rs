// src/handlers/mod.rs

pub mod attempts;
pub mod auth;
pub mod progress;
pub mod students;
pub mod trends;
