// src/analytics/mod.rs

pub mod blueprint;
pub mod deep_dive;
pub mod progress;
pub mod reconcile;
pub mod trends;
