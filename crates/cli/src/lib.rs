pub mod engine;
pub mod commands;
