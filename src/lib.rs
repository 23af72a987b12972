pub mod app;
pub mod cli;
pub mod commands;
pub mod config;
pub mod conversation;
pub mod core;
pub mod providers;
pub mod store;
pub mod telegram;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;
