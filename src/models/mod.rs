// src/models/mod.rs

pub mod participant;
pub mod quiz;
pub mod session;
