// src/handlers/mod.rs
pub mod company;
pub mod dcf;
pub mod error;
