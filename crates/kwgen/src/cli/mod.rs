//! Command implementations.

pub mod config;
pub mod embed;
pub mod interactive;
pub mod models;
pub mod process;
