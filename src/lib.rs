pub mod agent;
pub mod api;
pub mod browser;
pub mod cli;
pub mod config;
pub mod errors;
pub mod jobs;
pub mod llm;
pub mod models;
pub mod scrapers;
pub mod utils;

#[cfg(test)]
mod testing;
