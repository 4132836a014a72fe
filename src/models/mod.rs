// src/models/mod.rs

pub mod course;
pub mod result;
pub mod staff;
pub mod student;
