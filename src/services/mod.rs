// src/services/mod.rs
pub mod cache;
pub mod dcf;
pub mod iex;
pub mod statements;
