// src/content/mod.rs

pub mod store;
pub mod tree;
